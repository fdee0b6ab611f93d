use std::fs;
use std::path::{Path, PathBuf};

use rxrec_ingest::{
    DictionaryLayout, IngestError, LocalLayout, SourceLayout, load_dictionary,
    load_local_reference, load_source_records, read_csv_rows, read_dictionary,
};
use rxrec_model::DuplicatePolicy;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn lower(name: &str) -> String {
    name.to_lowercase()
}

#[test]
fn loads_source_records_without_header_or_blank_rows() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "meds.csv",
        "codigo,nombre,via\n\nS1,\"Acetaminophen, 500 MG Tablet\",oral\nS2,Ibuprofeno,oral\n",
    );

    let records = load_source_records(&path, &SourceLayout::default(), lower).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_code, "S1");
    assert_eq!(records[0].display_name, "Acetaminophen, 500 MG Tablet");
    assert_eq!(records[0].attribute, "oral");
    assert_eq!(records[0].normalized_name, "acetaminophen, 500 mg tablet");
    assert_eq!(records[1].normalized_name, "ibuprofeno");
}

#[test]
fn short_row_is_reported_with_its_position() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "meds.csv", "code,name,attr\nS1,Aspirin,oral\nS2,Naproxen\n");

    let err = load_source_records(&path, &SourceLayout::default(), lower).unwrap_err();

    match err {
        IngestError::MissingColumn { row, column, .. } => {
            assert_eq!(row, 2);
            assert_eq!(column, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_file_not_found() {
    let err = read_csv_rows(Path::new("/definitely/not/here.csv")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn local_reference_uses_layout_and_keeps_display_name() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "local.csv",
        "group,form,name,concept\n\
         x,tab,Acetaminophen 500mg,A1\n\
         x,tab,Ibuprofen 200mg,B2\n\
         x,tab,Acetaminophen 325mg,A1\n",
    );

    let map = load_local_reference(
        &path,
        &LocalLayout::default(),
        lower,
        DuplicatePolicy::LastWins,
    )
    .unwrap();

    assert_eq!(map.len(), 2);
    let a1 = map.get("A1").unwrap();
    assert_eq!(a1.display_name, "Acetaminophen 325mg");
    assert_eq!(a1.normalized_name, "acetaminophen 325mg");
}

#[test]
fn local_reference_rejects_duplicates_when_asked() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "local.csv", "a,b,name,code\n,,X,C1\n,,Y,C1\n");

    let err = load_local_reference(&path, &LocalLayout::default(), lower, DuplicatePolicy::Reject)
        .unwrap_err();

    assert!(matches!(err, IngestError::Reference { .. }));
}

#[test]
fn dictionary_prefixes_codes() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "dictionary.json",
        r#"[
            {"id": 71617, "display_name": "Acetaminophen", "class": "Drug"},
            {"id": "1065", "display_name": "Yes"}
        ]"#,
    );

    let items = read_dictionary(&path, &DictionaryLayout::default()).unwrap();
    assert_eq!(items[0].code, "CIEL:71617");
    assert_eq!(items[1].code, "CIEL:1065");

    let map = load_dictionary(&path, &DictionaryLayout::default(), lower, DuplicatePolicy::LastWins)
        .unwrap();
    assert_eq!(map.get("CIEL:71617").unwrap().normalized_name, "acetaminophen");
}

#[test]
fn dictionary_item_without_name_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "dictionary.json", r#"[{"id": 1}]"#);

    let err = read_dictionary(&path, &DictionaryLayout::default()).unwrap_err();

    assert_eq!(
        err.to_string(),
        format!("item 0 of {} has no usable 'display_name' field", path.display())
    );
}

#[test]
fn malformed_dictionary_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "dictionary.json", r#"{"id": 1, "display_name": "x"}"#);

    let err = read_dictionary(&path, &DictionaryLayout::default()).unwrap_err();

    assert!(matches!(err, IngestError::JsonParse { .. }));
}
