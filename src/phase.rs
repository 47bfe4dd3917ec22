//! Level/phase state machine.
//!
//! ```text
//! Playing ──score ≥ goal──▶ LevelComplete ──enter station──▶ Quiz ──3 rounds──▶ Upgrading
//!    ▲  │                                                                         │
//!    │  └──health ≤ 0 / idle / quit──▶ GameOver                                   │
//!    └──────────────────────────────── continue ◀─────────────────────────────────┘
//! Playing ⇄ Paused
//! ```
//!
//! Every timer belongs to the phase value that owns it, so replacing the
//! phase discards any timer the old phase was running.

use log::{info, warn};
use rand::Rng;

use crate::backend::Question;
use crate::entities::{GameState, Session};
use crate::quiz::{apply_quiz_reward, Quiz, QuizStep, UpgradeSummary, QUIZ_ROUNDS};

pub const INACTIVITY_LIMIT_MS: f32 = 180_000.0;
pub const INACTIVITY_WARNING_MS: f32 = 150_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOverReason {
    Destroyed,
    Inactive,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Playing,
    Paused,
    LevelComplete,
    Quiz(Quiz),
    Upgrading(UpgradeSummary),
    GameOver(GameOverReason),
}

/// Score needed to clear `level`: `100 · level²`.
pub fn calculate_level_goal(level: u32) -> u32 {
    level * level * 100
}

// ── Checks run from the tick ─────────────────────────────────────────────────

/// Advance the idle clock.  Raises the warning once, and reports game over
/// when the limit is exceeded.
pub fn track_inactivity(state: &mut GameState, moved: bool, dt: f32) -> Option<GameOverReason> {
    if moved {
        state.idle_ms = 0.0;
        state.inactivity_warning = false;
        return None;
    }
    state.idle_ms += dt;
    if state.idle_ms > INACTIVITY_LIMIT_MS {
        state.inactivity_warning = false;
        return Some(GameOverReason::Inactive);
    }
    if state.idle_ms > INACTIVITY_WARNING_MS && !state.inactivity_warning {
        state.inactivity_warning = true;
        warn!("no movement for {:.0}s", state.idle_ms / 1000.0);
    }
    None
}

/// End-of-tick check: level clear wins over death.
pub fn check_phase(session: &mut Session) -> bool {
    if session.state.score >= session.state.level_goal {
        info!(
            "level {} complete with {} points",
            session.state.level, session.state.score
        );
        session.phase = Phase::LevelComplete;
        true
    } else if session.state.health <= 0 {
        game_over(session, GameOverReason::Destroyed);
        true
    } else {
        false
    }
}

pub fn game_over(session: &mut Session, reason: GameOverReason) {
    info!(
        "game over ({:?}) at level {} with {} points",
        reason, session.state.level, session.state.score
    );
    session.state.health = session.state.health.max(0);
    session.phase = Phase::GameOver(reason);
}

// ── Player-driven transitions ────────────────────────────────────────────────

/// Playing ⇄ Paused.  Resuming restarts the idle clock.
pub fn toggle_pause(session: &mut Session) -> bool {
    match session.phase {
        Phase::Playing => {
            session.phase = Phase::Paused;
            true
        }
        Phase::Paused => {
            session.phase = Phase::Playing;
            session.state.idle_ms = 0.0;
            session.state.inactivity_warning = false;
            true
        }
        _ => false,
    }
}

/// LevelComplete → Quiz.  With no questions loaded the station skips
/// straight to the upgrade, scored as zero correct.
pub fn enter_station(session: &mut Session, rng: &mut impl Rng) -> bool {
    if session.phase != Phase::LevelComplete {
        return false;
    }
    match Quiz::start(&mut session.pool, rng) {
        Some(quiz) => session.phase = Phase::Quiz(quiz),
        None => {
            warn!("question bank is empty; skipping the station quiz");
            let summary = apply_quiz_reward(&mut session.state, 0, 0);
            session.phase = Phase::Upgrading(summary);
        }
    }
    true
}

/// Install a freshly fetched question bank.  While a station quiz is
/// running the bank is staged so no question repeats within the station.
pub fn load_questions(session: &mut Session, questions: Vec<Question>) {
    if matches!(session.phase, Phase::Quiz(_)) {
        info!("staging {} questions until the station closes", questions.len());
        session.pool.stage(questions);
    } else {
        session.pool.replace(questions);
    }
}

/// Answer the current round.  Returns whether it was correct, or `None`
/// if no question is awaiting an answer.
pub fn answer_question(session: &mut Session, choice: usize) -> Option<bool> {
    match &mut session.phase {
        Phase::Quiz(quiz) => quiz.answer(Some(choice)),
        _ => None,
    }
}

/// Drive the timers of the non-playing phases.
pub fn advance_timers(session: &mut Session, dt: f32, rng: &mut impl Rng) {
    let Phase::Quiz(quiz) = &mut session.phase else {
        return;
    };
    match quiz.advance(dt, &mut session.pool, rng) {
        QuizStep::Pending | QuizStep::NextRound => {}
        QuizStep::TimedOut => info!("quiz round {} timed out", quiz.round),
        QuizStep::Finished => {
            let correct = quiz.correct;
            let asked = quiz.round;
            finish_quiz(session, correct, asked);
        }
    }
}

fn finish_quiz(session: &mut Session, correct: u32, asked: u32) {
    let summary = apply_quiz_reward(&mut session.state, correct, asked);
    info!(
        "station upgrade: {}/{} correct, level {}, attack {}, max health {}",
        correct, QUIZ_ROUNDS, summary.level, summary.attack, summary.max_health
    );
    session.phase = Phase::Upgrading(summary);
}

/// Upgrading → Playing on the next level, with a cleared field.
pub fn continue_to_next_level(session: &mut Session) -> bool {
    if !matches!(session.phase, Phase::Upgrading(_)) {
        return false;
    }
    let state = &mut session.state;
    state.level_goal = calculate_level_goal(state.level);
    state.level_score = 0;
    state.boss_spawned = false;
    state.idle_ms = 0.0;
    state.inactivity_warning = false;
    session.enemies.clear();
    session.bullets.clear();
    session.enemy_bullets.clear();
    session.spawn_timer_ms = 0.0;
    session.phase = Phase::Playing;
    info!("level {} begins, goal {}", session.state.level, session.state.level_goal);
    true
}

/// Abandon the session from any live phase.  Returns `false` if it was
/// already over, so the caller submits the score only once.
pub fn quit(session: &mut Session) -> bool {
    if matches!(session.phase, Phase::GameOver(_)) {
        return false;
    }
    game_over(session, GameOverReason::Quit);
    true
}
