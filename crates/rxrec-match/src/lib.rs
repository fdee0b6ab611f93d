#![deny(unsafe_code)]

//! Fuzzy matching of drug names against reference vocabularies.
//!
//! The pipeline pieces, in the order a run uses them:
//!
//! - [`normalize`]: cleaning functions for source, local and dictionary names
//! - [`score`]: similarity scorers returning integers in `0..=100`
//! - [`engine`]: best-match extraction and threshold partitioning
//! - [`resolve`]: operator-driven resolution of what the automatic stages left
//! - [`checkpoint`]: CSV snapshots that let an interrupted run resume

pub mod checkpoint;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod resolve;
pub mod score;

pub use checkpoint::{CheckpointStore, ChoiceProgress, Stage};
pub use engine::{
    ReferenceMatch, StageMatcher, StageOutcome, extract_best_reference_match,
    extract_good_matches, extract_top_matches,
};
pub use error::{MatchError, Result};
pub use normalize::{clean_local_name, clean_reference_name, clean_source_name};
pub use resolve::{
    Candidate, CandidateMenu, CandidateOrigin, CandidatePresenter, ChoiceReader, Decision,
    Rejection, ResolveOutcome, ResolveProgress, Resolver, parse_choice,
};
pub use score::{full_process, ratio, score};
