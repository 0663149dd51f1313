//! Paragraph-aware chunking with sliding character overlap.
//!
//! The chunker splits input on newline boundaries, discards whitespace-only paragraphs, and
//! greedily packs paragraphs into buffers bounded by `max_chars`. When a paragraph would
//! overflow the buffer, the buffer is closed as a chunk and the next buffer is seeded with
//! the last `overlap` characters of the closed chunk so context survives the boundary.
//!
//! A single paragraph longer than `max_chars` is emitted whole as its own chunk; the
//! chunker never splits mid-paragraph.

/// A bounded segment of a document's text, ordered by `sequence_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position of the chunk within its document.
    pub sequence_index: usize,
    /// Chunk text, non-empty after trimming.
    pub text: String,
}

/// Split `text` into overlapping paragraph-aligned chunks.
///
/// Returns an empty vector when the input has no non-whitespace content. Never fails.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<Chunk> {
    let paragraphs = text
        .split('\n')
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty());

    let mut bodies: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for paragraph in paragraphs {
        if buffer.chars().count() + paragraph.chars().count() + 1 <= max_chars {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(paragraph);
        } else {
            let seed = char_tail(&buffer, overlap).to_string();
            if !buffer.is_empty() {
                bodies.push(std::mem::take(&mut buffer));
            }
            buffer = format!("{seed}\n{paragraph}").trim().to_string();
        }
    }

    if !buffer.is_empty() {
        bodies.push(buffer);
    }

    bodies
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            sequence_index: index + 1,
            text,
        })
        .collect()
}

/// Last `overlap` characters of `text`, respecting UTF-8 boundaries.
fn char_tail(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    let char_count = text.chars().count();
    if char_count <= overlap {
        return text;
    }
    let start = text
        .char_indices()
        .nth(char_count - overlap)
        .map(|(offset, _)| offset)
        .unwrap_or(0);
    &text[start..]
}
