//! CSV loading for the primary list and the local reference list.

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rxrec_model::{DuplicatePolicy, ReferenceEntry, ReferenceMap, ReferenceSystem, SourceRecord};

use crate::error::{IngestError, Result};

/// Column positions of the primary drug list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceLayout {
    pub code_column: usize,
    pub name_column: usize,
    pub attribute_column: usize,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            code_column: 0,
            name_column: 1,
            attribute_column: 2,
        }
    }
}

/// Column positions of the local reference drug list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalLayout {
    pub code_column: usize,
    pub name_column: usize,
}

impl Default for LocalLayout {
    fn default() -> Self {
        Self {
            code_column: 3,
            name_column: 2,
        }
    }
}

/// Read every row of a CSV file, header included.
///
/// Rows may have differing lengths; layout checks happen when rows are
/// turned into records.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(
            record
                .iter()
                .map(|value| value.trim_start_matches('\u{feff}').to_string())
                .collect(),
        );
    }
    Ok(rows)
}

/// Drop fully blank rows, then the single header row.
pub fn clean_csv_rows(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    rows.into_iter()
        .filter(|row| row.iter().any(|value| !value.trim().is_empty()))
        .skip(1)
        .collect()
}

fn column<'a>(row: &'a [String], column: usize, row_number: usize, path: &Path) -> Result<&'a str> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            row: row_number,
            column,
        })
}

/// Load the primary list, deriving each record's normalized name with `clean`.
pub fn load_source_records(
    path: &Path,
    layout: &SourceLayout,
    clean: impl Fn(&str) -> String,
) -> Result<Vec<SourceRecord>> {
    let rows = clean_csv_rows(read_csv_rows(path)?);
    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        let code = column(row, layout.code_column, row_number, path)?;
        let name = column(row, layout.name_column, row_number, path)?;
        let attribute = column(row, layout.attribute_column, row_number, path)?;
        records.push(SourceRecord::new(code, name, attribute, clean(name)));
    }
    debug!(path = %path.display(), records = records.len(), "loaded source records");
    Ok(records)
}

/// Load the local reference list into a map of code to cleaned name.
pub fn load_local_reference(
    path: &Path,
    layout: &LocalLayout,
    clean: impl Fn(&str) -> String,
    policy: DuplicatePolicy,
) -> Result<ReferenceMap> {
    let rows = clean_csv_rows(read_csv_rows(path)?);
    let mut entries = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        let code = column(row, layout.code_column, row_number, path)?;
        let name = column(row, layout.name_column, row_number, path)?;
        entries.push(ReferenceEntry::new(code, clean(name), name));
    }
    let map = ReferenceMap::build(ReferenceSystem::Local, entries, policy).map_err(|source| {
        IngestError::Reference {
            path: path.to_path_buf(),
            source,
        }
    })?;
    debug!(path = %path.display(), entries = map.len(), "loaded local reference list");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn clean_rows_drops_blank_rows_and_one_header() {
        let rows = vec![
            row(&["", ""]),
            row(&["code", "name"]),
            row(&["  ", ""]),
            row(&["S1", "Aspirin"]),
            row(&["S2", "Ibuprofeno"]),
        ];
        let cleaned = clean_csv_rows(rows);
        assert_eq!(cleaned, vec![row(&["S1", "Aspirin"]), row(&["S2", "Ibuprofeno"])]);
    }

    #[test]
    fn clean_rows_of_header_only_is_empty() {
        assert!(clean_csv_rows(vec![row(&["code", "name"])]).is_empty());
        assert!(clean_csv_rows(Vec::new()).is_empty());
    }

    #[test]
    fn default_layouts() {
        assert_eq!(SourceLayout::default().name_column, 1);
        assert_eq!(LocalLayout::default().code_column, 3);
    }
}
