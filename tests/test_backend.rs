use std::sync::Arc;
use std::time::Duration;

use quiz_shooter::backend::*;
use quiz_shooter::config::Settings;
use quiz_shooter::error::GameError;
use quiz_shooter::remote::{RemoteClient, RemoteEvent};

const WAIT: Duration = Duration::from_secs(5);

fn entry(id: &str, score: u32, level: u32) -> LeaderboardEntry {
    LeaderboardEntry {
        student_id: id.to_string(),
        score,
        level,
        updated_at: 0,
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

#[test]
fn student_ids_are_five_digits() {
    assert!(validate_student_id("12345"));
    assert!(validate_student_id("00001"));
    assert!(!validate_student_id("1234"));
    assert!(!validate_student_id("123456"));
    assert!(!validate_student_id("12a45"));
    assert!(!validate_student_id(""));
}

#[test]
fn question_validation() {
    assert!(Question::new("1 + 1", ["1", "2", "3", "4"], 1).validate().is_ok());

    let mut short = Question::new("1 + 1", ["1", "2", "3", "4"], 1);
    short.options.pop();
    assert!(matches!(short.validate(), Err(GameError::InvalidQuestion(_))));

    let mut bad_answer = Question::new("1 + 1", ["1", "2", "3", "4"], 1);
    bad_answer.answer = 4;
    assert!(bad_answer.validate().is_err());
}

#[test]
fn built_in_bank_is_valid() {
    let questions = default_questions();
    assert_eq!(questions.len(), 10);
    for q in &questions {
        assert!(q.validate().is_ok(), "{:?}", q);
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

#[test]
fn rank_overall_and_within_class() {
    let entries = vec![
        entry("12301", 500, 5),
        entry("45601", 400, 4),
        entry("12302", 300, 4),
        entry("12303", 300, 6),
    ];
    let ranks = rank_of(&entries, "12302");
    assert_eq!(ranks.overall, Some(3));
    // Same class, same score: the higher level ranks first.
    assert_eq!(ranks.class, Some(3));

    let ranks = rank_of(&entries, "45601");
    assert_eq!(ranks.overall, Some(2));
    assert_eq!(ranks.class, Some(1));
}

#[test]
fn rank_of_unknown_student() {
    let entries = vec![entry("12301", 500, 5)];
    assert_eq!(rank_of(&entries, "99999"), Ranks::default());
}

// ── In-memory store ───────────────────────────────────────────────────────────

#[test]
fn only_a_better_score_replaces_an_entry() {
    let backend = MemoryBackend::new(Store::default());
    backend.submit_score("12345", 100, 2).unwrap();
    let kept = backend.submit_score("12345", 50, 1).unwrap();
    assert_eq!((kept.score, kept.level), (100, 2));

    let raised = backend.submit_score("12345", 200, 3).unwrap();
    assert_eq!((raised.score, raised.level), (200, 3));
    assert_eq!(backend.fetch_leaderboard(10).unwrap().len(), 1);
}

#[test]
fn leaderboard_order_and_limit() {
    let backend = MemoryBackend::new(Store::default());
    backend.submit_score("11111", 100, 1).unwrap();
    backend.submit_score("22222", 100, 1).unwrap();
    backend.submit_score("33333", 300, 2).unwrap();

    let ids: Vec<String> = backend
        .fetch_leaderboard(10)
        .unwrap()
        .into_iter()
        .map(|e| e.student_id)
        .collect();
    // Ties go to whoever got there first.
    assert_eq!(ids, vec!["33333", "11111", "22222"]);

    assert_eq!(backend.fetch_leaderboard(2).unwrap().len(), 2);
}

#[test]
fn delete_and_clear() {
    let backend = MemoryBackend::new(Store::seeded());
    backend.submit_score("11111", 100, 1).unwrap();
    backend.submit_score("22222", 200, 1).unwrap();

    assert!(backend.delete_entry("11111").unwrap());
    assert!(!backend.delete_entry("11111").unwrap());
    assert_eq!(backend.fetch_leaderboard(10).unwrap().len(), 1);

    backend.clear_leaderboard().unwrap();
    assert!(backend.fetch_leaderboard(10).unwrap().is_empty());
    assert_eq!(backend.fetch_questions().unwrap().len(), 10);
}

// ── JSON file store ───────────────────────────────────────────────────────────

#[test]
fn file_store_seeds_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let backend = FileBackend::open(&path).unwrap();
    assert_eq!(backend.fetch_questions().unwrap().len(), 10);
    backend.submit_score("12345", 420, 3).unwrap();
    drop(backend);

    let reopened = FileBackend::open(&path).unwrap();
    let board = reopened.fetch_leaderboard(10).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].student_id, "12345");
    assert_eq!(board[0].score, 420);
}

#[test]
fn file_store_skips_malformed_questions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(
        &path,
        r#"{
            "questions": [
                {"question": "2 + 2", "options": ["3", "4", "5", "6"], "answer": 1},
                {"question": "broken", "options": ["1", "2", "3"], "answer": 0}
            ]
        }"#,
    )
    .unwrap();

    let backend = FileBackend::open(&path).unwrap();
    let questions = backend.fetch_questions().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question, "2 + 2");
}

#[test]
fn file_store_rejects_corrupt_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(FileBackend::open(&path), Err(GameError::Json(_))));
}

#[test]
fn leaderboard_uses_camel_case_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let backend = FileBackend::open(&path).unwrap();
    backend.submit_score("12345", 10, 1).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"studentId\""));
    assert!(text.contains("\"updatedAt\""));
}

// ── Offline ───────────────────────────────────────────────────────────────────

#[test]
fn offline_reports_backend_errors() {
    let err = Offline.fetch_questions().unwrap_err();
    assert!(matches!(err, GameError::Backend(_)));
    assert_eq!(err.to_string(), "Backend error: backend unavailable");
}

#[test]
fn offline_fails_everything() {
    let backend = Offline;
    assert!(backend.fetch_questions().is_err());
    assert!(backend.submit_score("12345", 1, 1).is_err());
    assert!(backend.fetch_leaderboard(10).is_err());
    assert!(backend.delete_entry("12345").is_err());
    assert!(backend.clear_leaderboard().is_err());
}

// ── RemoteClient ──────────────────────────────────────────────────────────────

#[test]
fn remote_fetches_questions() {
    let client = RemoteClient::new(Arc::new(MemoryBackend::new(Store::seeded())));
    client.request_questions();
    match client.wait(WAIT) {
        Some(RemoteEvent::Questions(qs)) => assert_eq!(qs.len(), 10),
        other => panic!("unexpected {:?}", other),
    }
    assert!(client.poll().is_empty());
}

#[test]
fn remote_submits_then_ranks() {
    let backend = Arc::new(MemoryBackend::new(Store::default()));
    backend.submit_score("12399", 900, 5).unwrap();
    let client = RemoteClient::new(backend.clone());

    client.submit_and_rank("12345", 100, 2, 500);
    let Some(RemoteEvent::Standings(Some(standings))) = client.wait(WAIT) else {
        panic!("expected standings");
    };
    assert_eq!(standings.entries.len(), 2);
    assert_eq!(standings.ranks.overall, Some(2));
    assert_eq!(standings.ranks.class, Some(2));
    assert_eq!(backend.fetch_leaderboard(10).unwrap()[1].score, 100);
}

/// Answers question fetches at once but takes a while to store a score.
struct SlowSubmit(MemoryBackend);

impl Backend for SlowSubmit {
    fn fetch_questions(&self) -> quiz_shooter::error::Result<Vec<Question>> {
        self.0.fetch_questions()
    }

    fn submit_score(
        &self,
        student_id: &str,
        score: u32,
        level: u32,
    ) -> quiz_shooter::error::Result<LeaderboardEntry> {
        std::thread::sleep(Duration::from_millis(200));
        self.0.submit_score(student_id, score, level)
    }

    fn fetch_leaderboard(&self, limit: usize) -> quiz_shooter::error::Result<Vec<LeaderboardEntry>> {
        self.0.fetch_leaderboard(limit)
    }

    fn delete_entry(&self, student_id: &str) -> quiz_shooter::error::Result<bool> {
        self.0.delete_entry(student_id)
    }

    fn clear_leaderboard(&self) -> quiz_shooter::error::Result<()> {
        self.0.clear_leaderboard()
    }
}

#[test]
fn waiting_for_standings_skips_question_results() {
    let backend = Arc::new(SlowSubmit(MemoryBackend::new(Store::seeded())));
    let client = RemoteClient::new(backend.clone());
    client.request_questions();
    client.submit_and_rank("12345", 300, 3, 500);

    let standings = client.wait_for_standings(WAIT).expect("standings before the deadline");
    let standings = standings.expect("leaderboard reachable");
    assert_eq!(standings.ranks.overall, Some(1));
    assert_eq!(backend.fetch_leaderboard(10).unwrap()[0].score, 300);
}

#[test]
fn waiting_for_standings_gives_up_at_the_deadline() {
    let client = RemoteClient::new(Arc::new(MemoryBackend::new(Store::seeded())));
    client.request_questions();
    assert_eq!(client.wait_for_standings(Duration::from_millis(300)), None);
}

#[test]
fn remote_falls_back_when_offline() {
    let client = RemoteClient::new(Arc::new(Offline));
    client.request_questions();
    assert_eq!(client.wait(WAIT), Some(RemoteEvent::Questions(Vec::new())));

    client.submit_and_rank("12345", 100, 2, 500);
    assert_eq!(client.wait(WAIT), Some(RemoteEvent::Standings(None)));

    client.submit_and_rank("12345", 100, 2, 500);
    assert_eq!(client.wait_for_standings(WAIT), Some(None));
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[test]
fn empty_settings_use_defaults() {
    let settings = Settings::from_json("{}").unwrap();
    let defaults = Settings::default();
    assert_eq!(settings, defaults);
    assert_eq!(settings.frame_ms, 33);
    assert_eq!(settings.bounds().width, 800.0);
    assert_eq!(settings.bounds().height, 600.0);
}

#[test]
fn partial_settings_override() {
    let settings = Settings::from_json(r#"{"frame_ms": 16, "leaderboard_limit": 50}"#).unwrap();
    assert_eq!(settings.frame_ms, 16);
    assert_eq!(settings.leaderboard_limit, 50);
    assert_eq!(settings.playfield_width, 800.0);
}

#[test]
fn invalid_settings_are_rejected() {
    assert!(matches!(
        Settings::from_json(r#"{"playfield_width": 100}"#),
        Err(GameError::Config(_))
    ));
    assert!(matches!(
        Settings::from_json(r#"{"frame_ms": 0}"#),
        Err(GameError::Config(_))
    ));
    assert!(matches!(
        Settings::from_json("[1, 2"),
        Err(GameError::Json(_))
    ));
}

#[test]
fn settings_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"playfield_height": 900}"#).unwrap();
    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(settings.playfield_height, 900.0);

    assert!(matches!(
        Settings::from_file(dir.path().join("missing.json")),
        Err(GameError::Io(_))
    ));
}
