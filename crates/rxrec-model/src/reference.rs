//! Reference vocabularies keyed by code.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::options::DuplicatePolicy;

/// The vocabulary a reference entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSystem {
    /// Local curated drug list.
    Local,
    /// External concept dictionary.
    Dictionary,
}

impl ReferenceSystem {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dictionary => "dictionary",
        }
    }
}

impl fmt::Display for ReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a reference vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub reference_code: String,
    /// Cleaned name used for fuzzy comparison.
    pub normalized_name: String,
    /// Name as it appears in the reference source.
    pub display_name: String,
}

impl ReferenceEntry {
    pub fn new(
        reference_code: impl Into<String>,
        normalized_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            reference_code: reference_code.into(),
            normalized_name: normalized_name.into(),
            display_name: display_name.into(),
        }
    }
}

/// Reference entries de-duplicated by code, in first-insertion order.
///
/// Under [`DuplicatePolicy::LastWins`] a repeated code replaces the earlier
/// entry in place, so the code keeps the position where it first appeared.
#[derive(Debug, Clone)]
pub struct ReferenceMap {
    system: ReferenceSystem,
    entries: Vec<ReferenceEntry>,
    index: HashMap<String, usize>,
}

impl ReferenceMap {
    /// Create an empty map for a reference system.
    pub fn new(system: ReferenceSystem) -> Self {
        Self {
            system,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a map from entries, applying `policy` to repeated codes.
    pub fn build(
        system: ReferenceSystem,
        entries: impl IntoIterator<Item = ReferenceEntry>,
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        let mut map = Self::new(system);
        let mut overwritten = 0usize;
        for entry in entries {
            if map.insert(entry, policy)? {
                overwritten += 1;
            }
        }
        if overwritten > 0 {
            warn!(
                system = %system,
                overwritten,
                kept = map.len(),
                "duplicate reference codes replaced by later entries"
            );
        }
        Ok(map)
    }

    /// Insert an entry. Returns `true` when an existing code was replaced.
    pub fn insert(&mut self, entry: ReferenceEntry, policy: DuplicatePolicy) -> Result<bool> {
        match self.index.get(&entry.reference_code) {
            Some(&position) => match policy {
                DuplicatePolicy::Reject => Err(ModelError::DuplicateReferenceCode {
                    code: entry.reference_code,
                    system: self.system.to_string(),
                }),
                DuplicatePolicy::LastWins => {
                    warn!(
                        system = %self.system,
                        code = %entry.reference_code,
                        previous = %self.entries[position].normalized_name,
                        replacement = %entry.normalized_name,
                        "duplicate reference code, keeping the later entry"
                    );
                    self.entries[position] = entry;
                    Ok(true)
                }
            },
            None => {
                self.index
                    .insert(entry.reference_code.clone(), self.entries.len());
                self.entries.push(entry);
                Ok(false)
            }
        }
    }

    pub fn system(&self) -> ReferenceSystem {
        self.system
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in map order.
    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.iter()
    }

    /// Look up an entry by code.
    pub fn get(&self, code: &str) -> Option<&ReferenceEntry> {
        self.index.get(code).map(|&position| &self.entries[position])
    }
}
