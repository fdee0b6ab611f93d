//! CSV checkpoints for resumable runs.
//!
//! Every stage writes its matches and its unmatched records; the next
//! invocation skips any stage whose files are already on disk. Files are
//! overwritten whole and carry a header row.
//!
//! # Layout
//!
//! ```text
//! <output>/matches-local-auto.csv              <intermediates>/unmatched-local-auto.csv
//! <output>/matches-dictionary-auto.csv         <intermediates>/unmatched-dictionary-auto.csv
//! <intermediates>/choice-matches.csv           in-progress operator choices
//! <intermediates>/choice-skipped.csv           in-progress declined records
//! <intermediates>/choice-pending.csv           in-progress records not yet shown
//! <output>/matches-choice.csv                  final operator choices
//! <output>/unmatched.csv                       final unmatched records
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use rxrec_model::{Match, SourceRecord};

use crate::engine::StageOutcome;
use crate::error::{MatchError, Result};
use crate::resolve::ResolveProgress;

/// An automatic matching stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LocalAuto,
    DictionaryAuto,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalAuto => "local-auto",
            Self::DictionaryAuto => "dictionary-auto",
        }
    }
}

/// In-progress state of an interrupted resolution session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceProgress {
    pub matches: Vec<Match>,
    pub skipped: Vec<SourceRecord>,
    pub pending: Vec<SourceRecord>,
}

/// Location of every checkpoint file of a run.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    output_dir: PathBuf,
    intermediates_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(output_dir: impl Into<PathBuf>, intermediates_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            intermediates_dir: intermediates_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn intermediates_dir(&self) -> &Path {
        &self.intermediates_dir
    }

    pub fn matches_path(&self, stage: Stage) -> PathBuf {
        self.output_dir.join(format!("matches-{}.csv", stage.as_str()))
    }

    pub fn unmatched_path(&self, stage: Stage) -> PathBuf {
        self.intermediates_dir
            .join(format!("unmatched-{}.csv", stage.as_str()))
    }

    pub fn choice_matches_path(&self) -> PathBuf {
        self.intermediates_dir.join("choice-matches.csv")
    }

    pub fn choice_skipped_path(&self) -> PathBuf {
        self.intermediates_dir.join("choice-skipped.csv")
    }

    pub fn choice_pending_path(&self) -> PathBuf {
        self.intermediates_dir.join("choice-pending.csv")
    }

    pub fn final_choice_path(&self) -> PathBuf {
        self.output_dir.join("matches-choice.csv")
    }

    pub fn final_unmatched_path(&self) -> PathBuf {
        self.output_dir.join("unmatched.csv")
    }

    /// Whether both files of `stage` exist.
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.matches_path(stage).is_file() && self.unmatched_path(stage).is_file()
    }

    /// Persist the result of an automatic stage.
    pub fn save_stage(&self, stage: Stage, outcome: &StageOutcome) -> Result<()> {
        write_rows(&self.matches_path(stage), &outcome.good)?;
        write_rows(&self.unmatched_path(stage), &outcome.remainder)
    }

    /// Load a stage's matches.
    pub fn load_matches(&self, stage: Stage) -> Result<Vec<Match>> {
        read_rows(&self.matches_path(stage))
    }

    /// Load a stage's unmatched records (the next stage's input).
    pub fn load_unmatched(&self, stage: Stage) -> Result<Vec<SourceRecord>> {
        read_rows(&self.unmatched_path(stage))
    }

    /// Persist resolution progress after a decision.
    pub fn save_progress(&self, progress: &ResolveProgress<'_>) -> Result<()> {
        write_rows(&self.choice_matches_path(), progress.matches)?;
        write_rows(&self.choice_skipped_path(), progress.skipped)?;
        write_rows(&self.choice_pending_path(), progress.pending)
    }

    /// Load the progress of an interrupted session, if there is one.
    ///
    /// A session exists when the pending file exists; missing companion
    /// files count as empty.
    pub fn load_progress(&self) -> Result<Option<ChoiceProgress>> {
        let pending_path = self.choice_pending_path();
        if !pending_path.is_file() {
            return Ok(None);
        }
        Ok(Some(ChoiceProgress {
            matches: read_rows_if_present(&self.choice_matches_path())?,
            skipped: read_rows_if_present(&self.choice_skipped_path())?,
            pending: read_rows(&pending_path)?,
        }))
    }

    /// Persist the final operator matches and the records left unmatched.
    pub fn save_final(&self, matches: &[Match], unmatched: &[SourceRecord]) -> Result<()> {
        write_rows(&self.final_choice_path(), matches)?;
        write_rows(&self.final_unmatched_path(), unmatched)
    }
}

/// A row type stored in checkpoint files.
///
/// The header is written explicitly so that an empty file still names its
/// columns.
trait CheckpointRow: Serialize + DeserializeOwned {
    const HEADER: &'static [&'static str];
}

impl CheckpointRow for SourceRecord {
    const HEADER: &'static [&'static str] =
        &["source_code", "display_name", "attribute", "normalized_name"];
}

impl CheckpointRow for Match {
    const HEADER: &'static [&'static str] = &[
        "source_code",
        "display_name",
        "attribute",
        "reference_code",
        "matched_name",
        "score",
    ];
}

fn write_rows<T: CheckpointRow>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| MatchError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let write_err = |source: csv::Error| MatchError::CheckpointWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    if rows.is_empty() {
        writer.write_record(T::HEADER).map_err(write_err)?;
    }
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    writer.flush().map_err(|e| write_err(e.into()))?;
    debug!(path = %path.display(), rows = rows.len(), "checkpoint written");
    Ok(())
}

fn read_rows<T: CheckpointRow>(path: &Path) -> Result<Vec<T>> {
    let read_err = |source: csv::Error| MatchError::CheckpointRead {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(read_err)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(read_err)?;
    debug!(path = %path.display(), rows = rows.len(), "checkpoint loaded");
    Ok(rows)
}

fn read_rows_if_present<T: CheckpointRow>(path: &Path) -> Result<Vec<T>> {
    if path.is_file() {
        read_rows(path)
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_paths_follow_layout() {
        let store = CheckpointStore::new("out", "work");
        assert_eq!(
            store.matches_path(Stage::LocalAuto),
            Path::new("out/matches-local-auto.csv")
        );
        assert_eq!(
            store.unmatched_path(Stage::DictionaryAuto),
            Path::new("work/unmatched-dictionary-auto.csv")
        );
        assert_eq!(store.final_unmatched_path(), Path::new("out/unmatched.csv"));
    }
}
