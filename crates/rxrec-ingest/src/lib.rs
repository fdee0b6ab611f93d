//! Loaders for reconciliation inputs.
//!
//! # Features
//!
//! - **CSV Loading**: read delimited files, dropping blank rows and the header row
//! - **Source Records**: turn primary-list rows into [`SourceRecord`]s
//! - **Local Reference**: build a [`ReferenceMap`] from the local drug list
//! - **Dictionary**: build a [`ReferenceMap`] from a JSON concept export
//!
//! Column positions and field names are described by layout types so the
//! same loaders work for differently shaped exports.
//!
//! [`SourceRecord`]: rxrec_model::SourceRecord
//! [`ReferenceMap`]: rxrec_model::ReferenceMap

mod delimited;
mod error;
mod json;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use delimited::{
    LocalLayout, SourceLayout, clean_csv_rows, load_local_reference, load_source_records,
    read_csv_rows,
};

// === Dictionary ===
pub use json::{DictionaryItem, DictionaryLayout, load_dictionary, read_dictionary};
