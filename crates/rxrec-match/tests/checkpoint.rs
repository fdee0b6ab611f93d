use std::fs;

use rxrec_match::{CheckpointStore, ResolveProgress, Stage, StageOutcome};
use rxrec_model::{Match, MatchScore, SourceRecord};
use tempfile::TempDir;

fn record(code: &str, name: &str) -> SourceRecord {
    SourceRecord::new(code, name, "oral", name.to_lowercase())
}

fn store(dir: &TempDir) -> CheckpointStore {
    CheckpointStore::new(dir.path().join("output"), dir.path().join("intermediates"))
}

#[test]
fn stage_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let matched = record("S1", "Aspirin");
    let outcome = StageOutcome {
        good: vec![Match::new(&matched, "A1", "aspirin", MatchScore::Auto(100))],
        remainder: vec![record("S2", "Levotiroxina, 100 mcg")],
    };

    assert!(!store.has_stage(Stage::LocalAuto));
    store.save_stage(Stage::LocalAuto, &outcome).unwrap();

    assert!(store.has_stage(Stage::LocalAuto));
    assert!(!store.has_stage(Stage::DictionaryAuto));
    assert_eq!(store.load_matches(Stage::LocalAuto).unwrap(), outcome.good);
    assert_eq!(store.load_unmatched(Stage::LocalAuto).unwrap(), outcome.remainder);
}

#[test]
fn stage_needs_both_files() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store
        .save_stage(Stage::DictionaryAuto, &StageOutcome::default())
        .unwrap();
    fs::remove_file(store.unmatched_path(Stage::DictionaryAuto)).unwrap();

    assert!(!store.has_stage(Stage::DictionaryAuto));
}

#[test]
fn files_carry_a_header_row() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let chosen = Match::new(&record("S1", "Aspirin"), "CIEL:71617", "aspirin", MatchScore::Chosen);

    store.save_final(&[chosen], &[]).unwrap();

    let text = fs::read_to_string(store.final_choice_path()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("source_code,display_name,attribute,reference_code,matched_name,score")
    );
    assert_eq!(lines.next(), Some("S1,Aspirin,oral,CIEL:71617,aspirin,-"));
    assert!(store.final_unmatched_path().is_file());
}

#[test]
fn progress_is_absent_until_saved() {
    let dir = TempDir::new().unwrap();
    assert!(store(&dir).load_progress().unwrap().is_none());
}

#[test]
fn progress_keeps_skipped_and_pending_apart() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let matches = vec![Match::new(&record("S1", "Aspirin"), "L1", "aspirin", MatchScore::Chosen)];
    let skipped = vec![record("S2", "Zzz")];
    let pending = vec![record("S3", "Losartan"), record("S4", "Omeprazol")];

    store
        .save_progress(&ResolveProgress {
            matches: &matches,
            skipped: &skipped,
            pending: &pending,
        })
        .unwrap();

    let progress = store.load_progress().unwrap().unwrap();
    assert_eq!(progress.matches, matches);
    assert_eq!(progress.skipped, skipped);
    assert_eq!(progress.pending, pending);
}

#[test]
fn unreadable_checkpoint_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.save_stage(Stage::LocalAuto, &StageOutcome::default()).unwrap();
    fs::write(store.matches_path(Stage::LocalAuto), "source_code,score\nS1,high\n").unwrap();

    assert!(store.load_matches(Stage::LocalAuto).is_err());
}

#[test]
fn empty_files_still_name_their_columns() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.save_final(&[], &[]).unwrap();

    let text = fs::read_to_string(store.final_unmatched_path()).unwrap();
    assert_eq!(text.trim_end(), "source_code,display_name,attribute,normalized_name");
    assert!(store.load_progress().unwrap().is_none());
}
