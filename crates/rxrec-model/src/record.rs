//! Source records and the matches produced for them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ModelError;

/// One row of the primary list being reconciled.
///
/// `normalized_name` is derived from `display_name` when the row is loaded
/// and is only used for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// External identifier, unique within the primary list.
    pub source_code: String,
    /// Name as it appears in the primary list.
    pub display_name: String,
    /// Free attribute column carried through unchanged (e.g. route or mode of administration).
    pub attribute: String,
    /// Cleaned name used for fuzzy comparison.
    pub normalized_name: String,
}

impl SourceRecord {
    pub fn new(
        source_code: impl Into<String>,
        display_name: impl Into<String>,
        attribute: impl Into<String>,
        normalized_name: impl Into<String>,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            display_name: display_name.into(),
            attribute: attribute.into(),
            normalized_name: normalized_name.into(),
        }
    }
}

/// Similarity score attached to a [`Match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScore {
    /// Automatic match with an integer similarity in `0..=100`.
    Auto(u8),
    /// Match chosen by the operator; no automated score applies.
    Chosen,
}

impl MatchScore {
    /// Sentinel written for operator-chosen matches.
    pub const CHOSEN_SENTINEL: &'static str = "-";

    /// Numeric score, if this is an automatic match.
    pub fn value(self) -> Option<u8> {
        match self {
            Self::Auto(score) => Some(score),
            Self::Chosen => None,
        }
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto(score) => write!(f, "{score}"),
            Self::Chosen => f.write_str(Self::CHOSEN_SENTINEL),
        }
    }
}

impl FromStr for MatchScore {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == Self::CHOSEN_SENTINEL {
            return Ok(Self::Chosen);
        }
        match trimmed.parse::<u8>() {
            Ok(score) if score <= 100 => Ok(Self::Auto(score)),
            _ => Err(ModelError::InvalidScore {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for MatchScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MatchScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Association of one source record with one reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub source_code: String,
    pub display_name: String,
    pub attribute: String,
    pub reference_code: String,
    /// Normalized name of the reference entry that was matched.
    pub matched_name: String,
    pub score: MatchScore,
}

impl Match {
    /// Build a match for `record` against a reference code and name.
    pub fn new(
        record: &SourceRecord,
        reference_code: impl Into<String>,
        matched_name: impl Into<String>,
        score: MatchScore,
    ) -> Self {
        Self {
            source_code: record.source_code.clone(),
            display_name: record.display_name.clone(),
            attribute: record.attribute.clone(),
            reference_code: reference_code.into(),
            matched_name: matched_name.into(),
            score,
        }
    }
}
