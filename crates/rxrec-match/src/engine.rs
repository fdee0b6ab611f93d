//! Best-match extraction and threshold partitioning.

use std::time::Instant;

use tracing::{debug, info};

use rxrec_model::{Match, MatchScore, ReferenceMap, Scorer, SourceRecord, StageOptions};

use crate::score::score;

/// A reference entry scored against a query name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMatch {
    /// Normalized name of the reference entry.
    pub matched_name: String,
    pub score: u8,
    pub code: String,
}

/// Best-scoring entry of `reference` for `name`.
///
/// Returns `None` for an empty map. On equal scores the entry that comes
/// first in map order wins.
pub fn extract_best_reference_match(
    name: &str,
    reference: &ReferenceMap,
    scorer: Scorer,
) -> Option<ReferenceMatch> {
    let mut best: Option<ReferenceMatch> = None;
    for entry in reference.iter() {
        let value = score(scorer, name, &entry.normalized_name);
        if best.as_ref().is_none_or(|current| value > current.score) {
            best = Some(ReferenceMatch {
                matched_name: entry.normalized_name.clone(),
                score: value,
                code: entry.reference_code.clone(),
            });
        }
    }
    best
}

/// Up to `limit` entries of `reference` for `name`, highest score first.
///
/// Entries with equal scores keep their map order.
pub fn extract_top_matches(
    name: &str,
    reference: &ReferenceMap,
    scorer: Scorer,
    limit: usize,
) -> Vec<ReferenceMatch> {
    if limit == 0 {
        return Vec::new();
    }
    let mut scored: Vec<ReferenceMatch> = reference
        .iter()
        .map(|entry| ReferenceMatch {
            matched_name: entry.normalized_name.clone(),
            score: score(scorer, name, &entry.normalized_name),
            code: entry.reference_code.clone(),
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// Result of an automatic matching stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutcome {
    /// Records whose best candidate scored above the threshold.
    pub good: Vec<Match>,
    /// Records left for the next stage, in input order.
    pub remainder: Vec<SourceRecord>,
}

impl StageOutcome {
    /// Number of records the stage was given.
    pub fn total(&self) -> usize {
        self.good.len() + self.remainder.len()
    }
}

/// Partition `records` by whether their best candidate scores strictly above
/// `threshold`.
///
/// Records with no candidate at all (empty reference map) go to the
/// remainder. Every input record ends up in exactly one side.
pub fn extract_good_matches(
    records: &[SourceRecord],
    reference: &ReferenceMap,
    threshold: u8,
    scorer: Scorer,
) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    for record in records {
        match extract_best_reference_match(&record.normalized_name, reference, scorer) {
            Some(best) if best.score > threshold => {
                debug!(
                    source_code = %record.source_code,
                    reference_code = %best.code,
                    score = best.score,
                    "automatic match"
                );
                outcome.good.push(Match::new(
                    record,
                    best.code,
                    best.matched_name,
                    MatchScore::Auto(best.score),
                ));
            }
            _ => outcome.remainder.push(record.clone()),
        }
    }
    outcome
}

/// One automatic stage: a reference vocabulary plus its threshold and scorer.
#[derive(Debug, Clone, Copy)]
pub struct StageMatcher<'a> {
    reference: &'a ReferenceMap,
    options: StageOptions,
}

impl<'a> StageMatcher<'a> {
    pub fn new(reference: &'a ReferenceMap, options: StageOptions) -> Self {
        Self { reference, options }
    }

    pub fn reference(&self) -> &ReferenceMap {
        self.reference
    }

    /// Run the stage over `records`.
    pub fn run(&self, records: &[SourceRecord]) -> StageOutcome {
        let start = Instant::now();
        let outcome = extract_good_matches(
            records,
            self.reference,
            self.options.threshold,
            self.options.scorer,
        );
        info!(
            system = %self.reference.system(),
            threshold = self.options.threshold,
            input = records.len(),
            matched = outcome.good.len(),
            remaining = outcome.remainder.len(),
            duration_ms = start.elapsed().as_millis(),
            "automatic stage complete"
        );
        outcome
    }
}
