//! Tests for the single-slot draft file: round trips, partial drafts, and
//! the degrade-to-defaults path for corrupt or missing content.

use api_lib::draft::DraftStore;
use tempfile::TempDir;
use valentine_core::domain::LetterContent;

fn store_in(dir: &TempDir) -> DraftStore {
    DraftStore::new(dir.path().join("valentine-letter.json"))
}

#[test]
fn saved_draft_round_trips() {
    let dir = TempDir::new().unwrap();
    let drafts = store_in(&dir);

    let mut letter = LetterContent::default();
    letter.recipient = "Alex".to_string();
    letter.body = "meet me at the fountain".to_string();

    drafts.save(&letter);
    assert_eq!(drafts.load(), letter);
}

#[test]
fn missing_draft_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let drafts = store_in(&dir);
    assert_eq!(drafts.load(), LetterContent::default());
}

#[test]
fn corrupt_draft_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("valentine-letter.json");
    std::fs::write(&path, "{not json at all").unwrap();

    let drafts = DraftStore::new(path);
    assert_eq!(drafts.load(), LetterContent::default());
}

#[test]
fn partial_draft_merges_over_the_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("valentine-letter.json");
    std::fs::write(&path, r#"{"recipient":"Alex"}"#).unwrap();

    let drafts = DraftStore::new(path);
    let loaded = drafts.load();
    assert_eq!(loaded.recipient, "Alex");
    assert_eq!(loaded.signature, LetterContent::default().signature);
}

#[test]
fn last_writer_wins() {
    let dir = TempDir::new().unwrap();
    let drafts = store_in(&dir);

    let mut first = LetterContent::default();
    first.recipient = "Alex".to_string();
    drafts.save(&first);

    let mut second = LetterContent::default();
    second.recipient = "Sam".to_string();
    drafts.save(&second);

    assert_eq!(drafts.load().recipient, "Sam");
}
