//! Run controller for a reconciliation run.
//!
//! Stages, in order:
//!
//! 1. load the primary list and both reference vocabularies
//! 2. automatic match against the local list
//! 3. automatic match against the dictionary
//! 4. operator resolution of what is left
//!
//! Each automatic stage is skipped when its checkpoint files exist and every
//! stage before it was skipped too. The operator stage resumes from its
//! in-progress files, trimmed to the records this run actually left over.
//! Stage N's unmatched records are stage N+1's input.

use std::collections::HashSet;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use rxrec_ingest::{load_dictionary, load_local_reference, load_source_records};
use rxrec_match::{
    CandidatePresenter, CheckpointStore, ChoiceProgress, ChoiceReader, ResolveProgress, Resolver,
    Stage, StageMatcher, StageOutcome, clean_local_name, clean_reference_name, clean_source_name,
};
use rxrec_model::{Match, ReferenceMap, SourceRecord, StageOptions};

use crate::config::ReconcileConfig;

/// Terminal endpoints for the operator stage.
pub struct Operator<'a> {
    pub presenter: &'a mut dyn CandidatePresenter,
    pub reader: &'a mut dyn ChoiceReader,
}

/// Outcome of one automatic stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub input: usize,
    pub matches: Vec<Match>,
    pub remaining: usize,
    /// Loaded from checkpoint files instead of computed.
    pub resumed: bool,
}

/// Outcome of the operator stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceReport {
    /// Records shown during this session.
    pub input: usize,
    /// Every operator match so far, including resumed ones.
    pub matches: Vec<Match>,
    pub skipped: usize,
    pub pending: usize,
    pub interrupted: bool,
    /// Continued an earlier, interrupted session.
    pub resumed: bool,
}

/// Counts and matches of a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub source_records: usize,
    pub local: StageReport,
    pub dictionary: StageReport,
    /// `None` when the operator stage was not run.
    pub choice: Option<ChoiceReport>,
}

impl RunReport {
    pub fn matched(&self) -> usize {
        self.local.matches.len()
            + self.dictionary.matches.len()
            + self.choice.as_ref().map_or(0, |choice| choice.matches.len())
    }

    pub fn unmatched(&self) -> usize {
        match &self.choice {
            Some(choice) => choice.skipped + choice.pending,
            None => self.dictionary.remaining,
        }
    }

    pub fn interrupted(&self) -> bool {
        self.choice.as_ref().is_some_and(|choice| choice.interrupted)
    }
}

struct Inputs {
    records: Vec<SourceRecord>,
    local: ReferenceMap,
    dictionary: ReferenceMap,
}

fn load_inputs(config: &ReconcileConfig) -> Result<Inputs> {
    let span = info_span!("load");
    let _guard = span.enter();
    let start = Instant::now();
    let policy = config.matching.duplicate_policy;

    let records = load_source_records(&config.source, &config.source_layout, clean_source_name)
        .with_context(|| format!("load source list {}", config.source.display()))?;
    let local = load_local_reference(&config.local, &config.local_layout, clean_local_name, policy)
        .with_context(|| format!("load local list {}", config.local.display()))?;
    let dictionary = load_dictionary(
        &config.dictionary,
        &config.dictionary_layout,
        clean_reference_name,
        policy,
    )
    .with_context(|| format!("load dictionary {}", config.dictionary.display()))?;

    info!(
        records = records.len(),
        local = local.len(),
        dictionary = dictionary.len(),
        duration_ms = start.elapsed().as_millis(),
        "inputs loaded"
    );
    Ok(Inputs {
        records,
        local,
        dictionary,
    })
}

/// Run an automatic stage or pick it up from its checkpoint.
///
/// A checkpoint is only trusted when `input` itself came from checkpoints.
fn automatic_stage(
    store: &CheckpointStore,
    stage: Stage,
    reference: &ReferenceMap,
    options: StageOptions,
    input: &[SourceRecord],
    upstream_resumed: bool,
) -> Result<(StageReport, Vec<SourceRecord>)> {
    let span = info_span!("stage", stage = stage.as_str());
    let _guard = span.enter();

    let found = store.has_stage(stage);
    if found && !upstream_resumed {
        warn!("earlier stage was recomputed, ignoring checkpoint");
    }
    let (outcome, resumed) = if found && upstream_resumed {
        let outcome = StageOutcome {
            good: store.load_matches(stage)?,
            remainder: store.load_unmatched(stage)?,
        };
        info!(
            matches = %store.matches_path(stage).display(),
            unmatched = %store.unmatched_path(stage).display(),
            "checkpoint found, skipping stage"
        );
        (outcome, true)
    } else {
        let outcome = StageMatcher::new(reference, options).run(input);
        store
            .save_stage(stage, &outcome)
            .with_context(|| format!("save {} checkpoint", stage.as_str()))?;
        (outcome, false)
    };

    let report = StageReport {
        stage,
        input: outcome.total(),
        matches: outcome.good,
        remaining: outcome.remainder.len(),
        resumed,
    };
    Ok((report, outcome.remainder))
}

/// Restrict earlier operator progress to the records left over by this run.
///
/// Progress about records that an automatic stage has since matched is
/// dropped, and leftover records the earlier session never saw are queued
/// after its pending ones.
fn align_progress(progress: ChoiceProgress, remainder: Vec<SourceRecord>) -> ChoiceProgress {
    let left: HashSet<String> = remainder.iter().map(|r| r.source_code.clone()).collect();
    let before = progress.matches.len() + progress.skipped.len() + progress.pending.len();

    let matches: Vec<_> = progress
        .matches
        .into_iter()
        .filter(|m| left.contains(&m.source_code))
        .collect();
    let skipped: Vec<_> = progress
        .skipped
        .into_iter()
        .filter(|r| left.contains(&r.source_code))
        .collect();
    let mut pending: Vec<_> = progress
        .pending
        .into_iter()
        .filter(|r| left.contains(&r.source_code))
        .collect();

    let seen: HashSet<String> = matches
        .iter()
        .map(|m| m.source_code.clone())
        .chain(skipped.iter().map(|r| r.source_code.clone()))
        .chain(pending.iter().map(|r| r.source_code.clone()))
        .collect();
    let kept = seen.len();
    let mut added = 0usize;
    for record in remainder {
        if !seen.contains(&record.source_code) {
            pending.push(record);
            added += 1;
        }
    }

    if kept != before || added > 0 {
        warn!(
            dropped = before - kept,
            added, "operator progress did not match this run's leftovers, realigned"
        );
    }
    ChoiceProgress {
        matches,
        skipped,
        pending,
    }
}

fn choice_stage(
    store: &CheckpointStore,
    inputs: &Inputs,
    config: &ReconcileConfig,
    remainder: Vec<SourceRecord>,
    operator: Operator<'_>,
) -> Result<ChoiceReport> {
    let span = info_span!("stage", stage = "choice");
    let _guard = span.enter();

    let (records, prior, prior_skipped, resumed) = match store.load_progress()? {
        Some(progress) => {
            let progress = align_progress(progress, remainder);
            store.save_progress(&ResolveProgress {
                matches: &progress.matches,
                skipped: &progress.skipped,
                pending: &progress.pending,
            })?;
            info!(
                pending = progress.pending.len(),
                chosen = progress.matches.len(),
                skipped = progress.skipped.len(),
                "resuming operator session"
            );
            (progress.pending, progress.matches, progress.skipped, true)
        }
        None => (remainder, Vec::new(), Vec::new(), false),
    };
    info!(remaining = records.len(), "records left for the operator");

    let resolver = Resolver::new(&inputs.local, &inputs.dictionary, &config.matching);
    let outcome = resolver.resolve(
        &records,
        prior,
        prior_skipped,
        operator.presenter,
        operator.reader,
        |progress: ResolveProgress<'_>| store.save_progress(&progress),
    )?;

    if outcome.interrupted {
        warn!(
            pending = outcome.pending.len(),
            "operator input ended; rerun to continue where this session stopped"
        );
    } else {
        store
            .save_final(&outcome.matches, &outcome.unmatched())
            .context("save final results")?;
    }

    Ok(ChoiceReport {
        input: records.len(),
        skipped: outcome.skipped.len(),
        pending: outcome.pending.len(),
        matches: outcome.matches,
        interrupted: outcome.interrupted,
        resumed,
    })
}

/// Run the whole reconciliation. Without an operator the run stops after the
/// automatic stages.
pub fn run_reconcile(config: &ReconcileConfig, operator: Option<Operator<'_>>) -> Result<RunReport> {
    let span = info_span!("reconcile", source = %config.source.display());
    let _guard = span.enter();

    let inputs = load_inputs(config)?;
    let store = CheckpointStore::new(&config.output_dir, &config.intermediates_dir);

    let (local, after_local) = automatic_stage(
        &store,
        Stage::LocalAuto,
        &inputs.local,
        config.matching.local,
        &inputs.records,
        true,
    )?;
    let (dictionary, after_dictionary) = automatic_stage(
        &store,
        Stage::DictionaryAuto,
        &inputs.dictionary,
        config.matching.dictionary,
        &after_local,
        local.resumed,
    )?;

    let choice = match operator {
        Some(operator) => Some(choice_stage(
            &store,
            &inputs,
            config,
            after_dictionary,
            operator,
        )?),
        None => None,
    };

    Ok(RunReport {
        source_records: inputs.records.len(),
        local,
        dictionary,
        choice,
    })
}
