//! Data model for medication list reconciliation.
//!
//! Records flow through the pipeline without being mutated:
//!
//! - [`SourceRecord`]: one row of the primary list being reconciled
//! - [`ReferenceEntry`] / [`ReferenceMap`]: a reference vocabulary keyed by code
//! - [`Match`]: the association of a source record with a reference entry
//! - [`ReconcileOptions`]: thresholds, scorers and limits for a run

pub mod error;
pub mod options;
pub mod record;
pub mod reference;

pub use error::{ModelError, Result};
pub use options::{DuplicatePolicy, ReconcileOptions, Scorer, StageOptions};
pub use record::{Match, MatchScore, SourceRecord};
pub use reference::{ReferenceEntry, ReferenceMap, ReferenceSystem};
