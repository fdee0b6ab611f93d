//! Configuration options for a reconciliation run.

use serde::{Deserialize, Serialize};

/// Similarity function used to compare two normalized names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    /// Plain Indel ratio of the processed strings.
    Ratio,
    /// Ratio after sorting the tokens of both strings.
    TokenSortRatio,
    /// Best ratio over the shared tokens and each side's remainder.
    #[default]
    TokenSetRatio,
}

/// What to do when a reference list repeats a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later entries replace earlier ones (each replacement is logged).
    #[default]
    LastWins,
    /// Fail the load on the first repeated code.
    Reject,
}

/// Options for one automatic matching stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageOptions {
    /// A candidate is accepted when its score is strictly greater than this.
    pub threshold: u8,
    pub scorer: Scorer,
}

/// Options controlling the matching pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileOptions {
    /// Automatic stage against the local curated list.
    pub local: StageOptions,
    /// Automatic stage against the external dictionary.
    pub dictionary: StageOptions,
    /// Local candidates offered during interactive resolution.
    pub local_candidates: usize,
    /// Dictionary candidates offered during interactive resolution.
    pub dictionary_candidates: usize,
    /// Scorer for the single best-overall dictionary candidate.
    pub best_dictionary_scorer: Scorer,
    /// Scorer for the ranked candidate lists.
    pub candidate_scorer: Scorer,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            local: StageOptions {
                threshold: 80,
                scorer: Scorer::TokenSetRatio,
            },
            dictionary: StageOptions {
                threshold: 70,
                scorer: Scorer::TokenSortRatio,
            },
            local_candidates: 2,
            dictionary_candidates: 6,
            best_dictionary_scorer: Scorer::TokenSortRatio,
            candidate_scorer: Scorer::TokenSetRatio,
            duplicate_policy: DuplicatePolicy::LastWins,
        }
    }
}

impl ReconcileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_threshold(mut self, threshold: u8) -> Self {
        self.local.threshold = threshold;
        self
    }

    pub fn with_dictionary_threshold(mut self, threshold: u8) -> Self {
        self.dictionary.threshold = threshold;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Number of the best-overall dictionary candidate in the operator menu.
    pub fn best_dictionary_choice(&self) -> usize {
        self.local_candidates + 1
    }
}
