//! The space-station quiz: a question pool drawn without replacement, the
//! three timed rounds, and the upgrade paid out at the end.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::backend::Question;
use crate::entities::GameState;
use crate::phase::calculate_level_goal;

pub const QUIZ_ROUNDS: u32 = 3;
pub const ROUND_TIME_MS: f32 = 20_000.0;
/// How long the right/wrong verdict stays up before the next round.
pub const FEEDBACK_MS: f32 = 1500.0;

pub const MAX_HEALTH_BOOST: i32 = 10;
pub const ATTACK_BOOST: i32 = 5;

// ── Question pool ────────────────────────────────────────────────────────────

/// Shuffled deck of questions.  No question repeats until every question has
/// been drawn; the deck is then reshuffled in full.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuestionPool {
    all: Vec<Question>,
    unused: Vec<Question>,
    /// A bank that arrived mid-station; swapped in when the next quiz starts.
    staged: Option<Vec<Question>>,
}

impl QuestionPool {
    pub fn new(questions: Vec<Question>) -> Self {
        QuestionPool {
            all: questions,
            unused: Vec::new(),
            staged: None,
        }
    }

    /// Swap in a freshly fetched bank; the deck starts over.
    pub fn replace(&mut self, questions: Vec<Question>) {
        self.all = questions;
        self.unused.clear();
        self.staged = None;
    }

    /// Hold a new bank back so the running station keeps its deck.
    pub fn stage(&mut self, questions: Vec<Question>) {
        self.staged = Some(questions);
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Swap in a staged bank, if any.  Returns whether the deck changed.
    pub fn apply_staged(&mut self) -> bool {
        match self.staged.take() {
            Some(questions) => {
                self.replace(questions);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Questions left before the next reshuffle.
    pub fn remaining(&self) -> usize {
        self.unused.len()
    }

    pub fn draw(&mut self, rng: &mut impl Rng) -> Option<Question> {
        if self.all.is_empty() {
            return None;
        }
        if self.unused.is_empty() {
            self.unused = self.all.clone();
            self.unused.shuffle(rng);
        }
        self.unused.pop()
    }
}

// ── Rounds ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum RoundState {
    /// Waiting for an answer; the countdown is running.
    Asking { remaining_ms: f32 },
    /// Verdict on screen.  `chosen` is `None` when the clock ran out.
    Feedback {
        correct: bool,
        chosen: Option<usize>,
        remaining_ms: f32,
    },
}

/// What advancing the quiz clock produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizStep {
    Pending,
    TimedOut,
    NextRound,
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quiz {
    /// 1-based round number.
    pub round: u32,
    pub correct: u32,
    pub question: Question,
    pub state: RoundState,
}

impl Quiz {
    /// Begin round one, or `None` if there is nothing to ask.  A staged
    /// bank takes effect here, never between rounds.
    pub fn start(pool: &mut QuestionPool, rng: &mut impl Rng) -> Option<Quiz> {
        pool.apply_staged();
        pool.draw(rng).map(|question| Quiz {
            round: 1,
            correct: 0,
            question,
            state: RoundState::Asking {
                remaining_ms: ROUND_TIME_MS,
            },
        })
    }

    /// Lock in an answer.  Only the first answer of a round counts; later
    /// ones return `None`.  `None` as a choice means the clock ran out.
    pub fn answer(&mut self, choice: Option<usize>) -> Option<bool> {
        if !matches!(self.state, RoundState::Asking { .. }) {
            return None;
        }
        let correct = choice == Some(self.question.answer);
        if correct {
            self.correct += 1;
        }
        self.state = RoundState::Feedback {
            correct,
            chosen: choice,
            remaining_ms: FEEDBACK_MS,
        };
        Some(correct)
    }

    /// Advance the round clock by `dt`.
    pub fn advance(&mut self, dt: f32, pool: &mut QuestionPool, rng: &mut impl Rng) -> QuizStep {
        match &mut self.state {
            RoundState::Asking { remaining_ms } => {
                *remaining_ms -= dt;
                if *remaining_ms <= 0.0 {
                    self.answer(None);
                    QuizStep::TimedOut
                } else {
                    QuizStep::Pending
                }
            }
            RoundState::Feedback { remaining_ms, .. } => {
                *remaining_ms -= dt;
                if *remaining_ms > 0.0 {
                    return QuizStep::Pending;
                }
                if self.round >= QUIZ_ROUNDS {
                    return QuizStep::Finished;
                }
                match pool.draw(rng) {
                    Some(question) => {
                        self.round += 1;
                        self.question = question;
                        self.state = RoundState::Asking {
                            remaining_ms: ROUND_TIME_MS,
                        };
                        QuizStep::NextRound
                    }
                    None => QuizStep::Finished,
                }
            }
        }
    }

    /// Seconds left on the current question, rounded up, for display.
    pub fn seconds_left(&self) -> u32 {
        match self.state {
            RoundState::Asking { remaining_ms } => (remaining_ms.max(0.0) / 1000.0).ceil() as u32,
            RoundState::Feedback { .. } => 0,
        }
    }
}

// ── Reward ───────────────────────────────────────────────────────────────────

/// What the upgrade screen reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpgradeSummary {
    pub correct: u32,
    pub level: u32,
    pub attack: i32,
    pub max_health: i32,
    pub health_restored: i32,
}

/// Percentage of the new maximum health restored for `correct` answers.
pub fn restore_percent(correct: u32) -> i32 {
    match correct {
        0 => 0,
        1 => 30,
        2 => 60,
        _ => 100,
    }
}

/// Pay out the station upgrade and advance to the next level.
pub fn apply_quiz_reward(state: &mut GameState, correct: u32, asked: u32) -> UpgradeSummary {
    state.correct_answers += correct;
    state.total_questions += asked;

    state.max_health += MAX_HEALTH_BOOST;
    let before = state.health;
    let gain = state.max_health * restore_percent(correct) / 100;
    state.health = (state.health + gain).min(state.max_health);

    state.attack += ATTACK_BOOST;
    state.level += 1;
    state.level_goal = calculate_level_goal(state.level);

    UpgradeSummary {
        correct,
        level: state.level,
        attack: state.attack,
        max_health: state.max_health,
        health_restored: state.health - before,
    }
}
