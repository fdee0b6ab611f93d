//! Concept dictionary loading from a JSON export.
//!
//! The export is a JSON array of objects. Each object carries an identifier
//! (number or string) and a display name; every other field is ignored.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use rxrec_model::{DuplicatePolicy, ReferenceEntry, ReferenceMap, ReferenceSystem};

use crate::error::{IngestError, Result};

/// Field names and code prefix of the dictionary export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DictionaryLayout {
    pub id_field: String,
    pub name_field: String,
    /// Prepended to each identifier to form the reference code.
    pub code_prefix: String,
}

impl Default for DictionaryLayout {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            name_field: "display_name".to_string(),
            code_prefix: "CIEL:".to_string(),
        }
    }
}

/// One dictionary concept with its prefixed code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryItem {
    pub code: String,
    pub display_name: String,
}

fn field_text(item: &Map<String, Value>, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Read the dictionary export.
pub fn read_dictionary(path: &Path, layout: &DictionaryLayout) -> Result<Vec<DictionaryItem>> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let raw: Vec<Map<String, Value>> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| IngestError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    raw.iter()
        .enumerate()
        .map(|(index, item)| {
            let missing = |field: &str| IngestError::MissingField {
                path: path.to_path_buf(),
                index,
                field: field.to_string(),
            };
            let id = field_text(item, &layout.id_field).ok_or_else(|| missing(&layout.id_field))?;
            let display_name =
                field_text(item, &layout.name_field).ok_or_else(|| missing(&layout.name_field))?;
            Ok(DictionaryItem {
                code: format!("{}{}", layout.code_prefix, id),
                display_name,
            })
        })
        .collect()
}

/// Load the dictionary export into a map of code to cleaned name.
pub fn load_dictionary(
    path: &Path,
    layout: &DictionaryLayout,
    clean: impl Fn(&str) -> String,
    policy: DuplicatePolicy,
) -> Result<ReferenceMap> {
    let items = read_dictionary(path, layout)?;
    let entries = items
        .into_iter()
        .map(|item| ReferenceEntry::new(item.code, clean(&item.display_name), item.display_name));
    let map = ReferenceMap::build(ReferenceSystem::Dictionary, entries, policy).map_err(
        |source| IngestError::Reference {
            path: path.to_path_buf(),
            source,
        },
    )?;
    debug!(path = %path.display(), entries = map.len(), "loaded dictionary");
    Ok(map)
}
