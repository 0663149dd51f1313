//! Controlled vocabulary of contractual risk tags.
//!
//! The slug set defined here is the single source of truth for validation across the
//! pipeline: the classifier embeds it verbatim in its instruction and every tag persisted
//! to the index must be a member. The vocabulary is fixed at compile time; there is no
//! runtime mutation.

use std::collections::HashSet;

/// A single allowed risk tag: a stable slug plus the human-readable description shown to
/// the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDefinition {
    /// Stable identifier stored in the index and matched in queries.
    pub slug: &'static str,
    /// One-line description embedded in the classifier instruction.
    pub description: &'static str,
}

/// The closed set of clause risk tags, grouped by category.
pub const TAG_VOCAB: &[TagDefinition] = &[
    // Liability / Indemnity
    TagDefinition {
        slug: "liability_unlimited",
        description: "Unlimited liability or no cap",
    },
    TagDefinition {
        slug: "indemnity_broad",
        description: "Indemnify/defend/hold harmless (one-sided or broad)",
    },
    TagDefinition {
        slug: "exclude_conseq_damages",
        description: "Excludes consequential/indirect damages",
    },
    // Termination
    TagDefinition {
        slug: "termination_convenience",
        description: "Termination for convenience / without cause",
    },
    TagDefinition {
        slug: "termination_immediate",
        description: "Immediate termination rights",
    },
    TagDefinition {
        slug: "termination_without_cause",
        description: "Termination without cause",
    },
    // Renewal / Duration
    TagDefinition {
        slug: "auto_renewal",
        description: "Auto-renewal or evergreen term",
    },
    TagDefinition {
        slug: "perpetual_term",
        description: "Perpetual term",
    },
    TagDefinition {
        slug: "minimum_term",
        description: "Minimum locked-in term",
    },
    // Payment / Penalties
    TagDefinition {
        slug: "holdover_double_rent",
        description: "Holdover damages 2x monthly rent",
    },
    TagDefinition {
        slug: "late_payment_penalty",
        description: "Late fees/penalties",
    },
    TagDefinition {
        slug: "interest_free_deposit",
        description: "Interest-free security deposit",
    },
    // Confidentiality / Data
    TagDefinition {
        slug: "confidentiality_perpetual",
        description: "Perpetual confidentiality",
    },
    TagDefinition {
        slug: "data_sharing_third_parties",
        description: "Broad third-party data sharing",
    },
    TagDefinition {
        slug: "breach_notice_hours",
        description: "Breach notice within X hours (24/48/72)",
    },
    // IP / Ownership
    TagDefinition {
        slug: "ip_assignment",
        description: "Assignment of IP / all rights",
    },
    TagDefinition {
        slug: "royalty_free_license",
        description: "Royalty-free perpetual license",
    },
    // Disputes / Governing Law
    TagDefinition {
        slug: "mandatory_arbitration",
        description: "Binding/mandatory arbitration",
    },
    TagDefinition {
        slug: "exclusive_jurisdiction",
        description: "Exclusive jurisdiction",
    },
    TagDefinition {
        slug: "governing_law_clause",
        description: "Governing law clause",
    },
    // Usage restrictions (rental)
    TagDefinition {
        slug: "no_subletting",
        description: "No subletting",
    },
    TagDefinition {
        slug: "use_restriction_residential",
        description: "Residential use only",
    },
    // Misc
    TagDefinition {
        slug: "notwithstanding_clause",
        description: "Contains 'notwithstanding'",
    },
    TagDefinition {
        slug: "best_efforts_clause",
        description: "Contains 'best efforts'",
    },
    TagDefinition {
        slug: "sole_discretion",
        description: "At its sole discretion",
    },
];

/// Validation whitelist over [`TAG_VOCAB`].
#[derive(Debug, Clone)]
pub struct TagVocabulary {
    slugs: HashSet<&'static str>,
}

impl TagVocabulary {
    /// Build the whitelist from the compile-time vocabulary.
    pub fn new() -> Self {
        Self {
            slugs: TAG_VOCAB.iter().map(|tag| tag.slug).collect(),
        }
    }

    /// Report whether `slug` is a member of the vocabulary.
    pub fn contains(&self, slug: &str) -> bool {
        self.slugs.contains(slug)
    }

    /// Definitions in declaration order, for prompt assembly.
    pub fn definitions(&self) -> &'static [TagDefinition] {
        TAG_VOCAB
    }
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_accepts_known_slugs() {
        let vocabulary = TagVocabulary::new();
        assert!(vocabulary.contains("auto_renewal"));
        assert!(vocabulary.contains("mandatory_arbitration"));
        assert!(vocabulary.contains("sole_discretion"));
    }

    #[test]
    fn vocabulary_rejects_unknown_slugs() {
        let vocabulary = TagVocabulary::new();
        assert!(!vocabulary.contains("made_up_tag"));
        assert!(!vocabulary.contains(""));
        assert!(!vocabulary.contains("AUTO_RENEWAL"));
    }

    #[test]
    fn slugs_are_unique() {
        let mut seen = HashSet::new();
        for tag in TAG_VOCAB {
            assert!(seen.insert(tag.slug), "duplicate slug: {}", tag.slug);
        }
        assert_eq!(seen.len(), TAG_VOCAB.len());
    }
}
