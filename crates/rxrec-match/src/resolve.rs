//! Operator-driven resolution of records the automatic stages left unmatched.
//!
//! For each record the operator sees a numbered menu:
//!
//! - `1..=L`: best local candidates (L = `local_candidates`)
//! - `L + 1`: the single best dictionary candidate by the best-dictionary scorer
//! - `L + 2..`: the ranked dictionary candidates
//!
//! `0` declines every candidate. Input that is not a number, or a number with
//! no menu entry, is rejected and asked again. Terminal I/O sits behind
//! [`CandidatePresenter`] and [`ChoiceReader`] so the loop can be driven by a
//! script.

use std::fmt;
use std::io;

use tracing::{debug, info};

use rxrec_model::{Match, MatchScore, ReconcileOptions, ReferenceMap, SourceRecord};

use crate::engine::{ReferenceMatch, extract_best_reference_match, extract_top_matches};
use crate::error::{MatchError, Result};

/// Where a menu candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    Local,
    BestDictionary,
    Dictionary,
}

/// One numbered entry of the operator menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based menu number.
    pub number: usize,
    pub origin: CandidateOrigin,
    /// Normalized reference name.
    pub name: String,
    pub code: String,
    /// Full reference name, shown for local candidates.
    pub detail: Option<String>,
}

/// Numbered candidates offered for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateMenu {
    pub candidates: Vec<Candidate>,
}

impl CandidateMenu {
    /// Candidate with the given menu number.
    pub fn get(&self, number: usize) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.number == number)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Why an operator answer was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotANumber,
    OutOfRange(i64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => f.write_str("not a valid input"),
            Self::OutOfRange(number) => write!(f, "{number} is not one of the listed options"),
        }
    }
}

/// A valid operator answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// `0`: none of the candidates fit.
    Decline,
    /// A listed candidate was picked.
    Choose(Candidate),
}

/// Interpret one line of operator input against `menu`.
pub fn parse_choice(input: &str, menu: &CandidateMenu) -> std::result::Result<Decision, Rejection> {
    let number: i64 = input.trim().parse().map_err(|_| Rejection::NotANumber)?;
    if number == 0 {
        return Ok(Decision::Decline);
    }
    usize::try_from(number)
        .ok()
        .and_then(|n| menu.get(n))
        .map(|candidate| Decision::Choose(candidate.clone()))
        .ok_or(Rejection::OutOfRange(number))
}

/// Shows records and candidates to the operator.
pub trait CandidatePresenter {
    /// Show a record and its menu before asking for a choice.
    fn present(&mut self, record: &SourceRecord, menu: &CandidateMenu) -> io::Result<()>;

    /// Report a rejected answer before asking again.
    fn rejected(&mut self, input: &str, rejection: &Rejection) -> io::Result<()>;

    /// Confirm the recorded choice.
    fn chosen(&mut self, record: &SourceRecord, candidate: &Candidate) -> io::Result<()>;
}

/// Supplies operator answers, one line at a time.
pub trait ChoiceReader {
    /// Next answer, or `None` once input is exhausted.
    fn read_choice(&mut self) -> io::Result<Option<String>>;
}

/// Snapshot handed to the checkpoint callback after each decision.
#[derive(Debug, Clone, Copy)]
pub struct ResolveProgress<'a> {
    /// Operator-chosen matches so far, including any resumed ones.
    pub matches: &'a [Match],
    /// Records the operator declined.
    pub skipped: &'a [SourceRecord],
    /// Records not yet shown.
    pub pending: &'a [SourceRecord],
}

/// Result of a resolution session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub matches: Vec<Match>,
    pub skipped: Vec<SourceRecord>,
    /// Records never decided because input ran out.
    pub pending: Vec<SourceRecord>,
    /// Input ended before every record was decided.
    pub interrupted: bool,
}

impl ResolveOutcome {
    /// Records still without a match: declined ones, then undecided ones.
    pub fn unmatched(&self) -> Vec<SourceRecord> {
        self.skipped.iter().chain(&self.pending).cloned().collect()
    }
}

/// Builds candidate menus and runs the decision loop.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    local: &'a ReferenceMap,
    dictionary: &'a ReferenceMap,
    options: &'a ReconcileOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(
        local: &'a ReferenceMap,
        dictionary: &'a ReferenceMap,
        options: &'a ReconcileOptions,
    ) -> Self {
        Self {
            local,
            dictionary,
            options,
        }
    }

    /// Candidate menu for one record.
    pub fn menu_for(&self, record: &SourceRecord) -> CandidateMenu {
        let name = &record.normalized_name;
        let mut candidates = Vec::new();

        let local = extract_top_matches(
            name,
            self.local,
            self.options.candidate_scorer,
            self.options.local_candidates,
        );
        for (idx, found) in local.into_iter().enumerate() {
            let detail = self
                .local
                .get(&found.code)
                .map(|entry| entry.display_name.clone());
            candidates.push(candidate(idx + 1, CandidateOrigin::Local, found, detail));
        }

        let best_number = self.options.best_dictionary_choice();
        if let Some(best) =
            extract_best_reference_match(name, self.dictionary, self.options.best_dictionary_scorer)
        {
            candidates.push(candidate(best_number, CandidateOrigin::BestDictionary, best, None));
        }

        let ranked = extract_top_matches(
            name,
            self.dictionary,
            self.options.candidate_scorer,
            self.options.dictionary_candidates,
        );
        for (idx, found) in ranked.into_iter().enumerate() {
            candidates.push(candidate(
                best_number + 1 + idx,
                CandidateOrigin::Dictionary,
                found,
                None,
            ));
        }

        CandidateMenu { candidates }
    }

    /// Ask the operator about each record in turn.
    ///
    /// `prior` holds matches recorded by an earlier, interrupted session and
    /// is extended rather than replaced. `checkpoint` runs after every
    /// decision. When the reader runs dry the session stops and the current
    /// record stays pending.
    pub fn resolve<P, R, F>(
        &self,
        records: &[SourceRecord],
        prior: Vec<Match>,
        prior_skipped: Vec<SourceRecord>,
        presenter: &mut P,
        reader: &mut R,
        mut checkpoint: F,
    ) -> Result<ResolveOutcome>
    where
        P: CandidatePresenter + ?Sized,
        R: ChoiceReader + ?Sized,
        F: FnMut(ResolveProgress<'_>) -> Result<()>,
    {
        let mut matches = prior;
        let mut skipped = prior_skipped;
        let total = records.len();

        for (idx, record) in records.iter().enumerate() {
            let menu = self.menu_for(record);
            presenter.present(record, &menu).map_err(MatchError::Prompt)?;

            let decision = loop {
                let Some(input) = reader.read_choice().map_err(MatchError::Prompt)? else {
                    info!(decided = idx, remaining = total - idx, "operator input ended");
                    return Ok(ResolveOutcome {
                        matches,
                        skipped,
                        pending: records[idx..].to_vec(),
                        interrupted: true,
                    });
                };
                match parse_choice(&input, &menu) {
                    Ok(decision) => break decision,
                    Err(rejection) => {
                        debug!(input = %input, %rejection, "rejected operator input");
                        presenter
                            .rejected(&input, &rejection)
                            .map_err(MatchError::Prompt)?;
                    }
                }
            };

            match decision {
                Decision::Choose(choice) => {
                    presenter.chosen(record, &choice).map_err(MatchError::Prompt)?;
                    matches.push(Match::new(
                        record,
                        choice.code.clone(),
                        choice.name.clone(),
                        MatchScore::Chosen,
                    ));
                }
                Decision::Decline => skipped.push(record.clone()),
            }

            checkpoint(ResolveProgress {
                matches: &matches,
                skipped: &skipped,
                pending: &records[idx + 1..],
            })?;
        }

        Ok(ResolveOutcome {
            matches,
            skipped,
            pending: Vec::new(),
            interrupted: false,
        })
    }
}

fn candidate(
    number: usize,
    origin: CandidateOrigin,
    found: ReferenceMatch,
    detail: Option<String>,
) -> Candidate {
    Candidate {
        number,
        origin,
        name: found.matched_name,
        code: found.code,
        detail,
    }
}
