mod display;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use log::{error, info, warn};
use rand::thread_rng;

use quiz_shooter::backend::{validate_student_id, Backend, FileBackend, Offline, STUDENT_ID_LEN};
use quiz_shooter::compute::{init_session, reset_session, tick, FrameInput};
use quiz_shooter::config::Settings;
use quiz_shooter::entities::{Character, Session};
use quiz_shooter::error::Result;
use quiz_shooter::motion::Movement;
use quiz_shooter::phase::{self, Phase};
use quiz_shooter::quiz::QuestionPool;
use quiz_shooter::remote::{RemoteClient, RemoteEvent};

use display::{Results, Screen};

/// Longest simulated step.  A stalled terminal must not teleport enemies.
const MAX_FRAME_DT_MS: f32 = 100.0;

/// How long an interrupted session waits for its score to be stored.
const SUBMIT_GRACE: Duration = Duration::from_secs(2);

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 4 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 4;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

/// Movement vector from whichever direction keys are live this frame.
fn held_movement(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> Movement {
    let axis = |neg: &[KeyCode], pos: &[KeyCode]| {
        let mut v = 0.0;
        if any_held(key_frame, neg, frame) {
            v -= 1.0;
        }
        if any_held(key_frame, pos, frame) {
            v += 1.0;
        }
        v
    };
    let x = axis(
        &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
        &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
    );
    let y = axis(
        &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')],
        &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')],
    );
    Movement::new(x, y)
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// The terminal belongs to the game, so log records go to a file next to
/// the data file.  `RUST_LOG` picks the level as usual.
fn init_logging(settings: &Settings) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let path = settings.data_file.with_extension("log");
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start {
        student_id: String,
        character: Character,
    },
    Quit,
}

const CHARACTERS: [(Character, &str, Color); 3] = [
    (Character::BlueEagle, "Blue Eagle", Color::Blue),
    (Character::GreenShark, "Green Shark", Color::Green),
    (Character::RedDragon, "Red Dragon", Color::Red),
];

fn draw_menu<W: Write>(out: &mut W, student_id: &str, notice: &str) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;
    let left = cx.saturating_sub(16);

    let title = "★  SPACE  STATION  SHOOTER  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(7),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    out.queue(cursor::MoveTo(left, cy.saturating_sub(5)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print(format!(
        "Student ID ({} digits): {}{}",
        STUDENT_ID_LEN,
        student_id,
        "_".repeat(STUDENT_ID_LEN.saturating_sub(student_id.len()))
    )))?;

    out.queue(cursor::MoveTo(left, cy.saturating_sub(3)))?;
    out.queue(Print("Choose your ship:"))?;
    for (i, (_, name, color)) in CHARACTERS.iter().enumerate() {
        let row = cy.saturating_sub(2) + i as u16;
        out.queue(cursor::MoveTo(left, row))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{}] ", i + 1)))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(format!("▲ {}", name)))?;
    }

    out.queue(cursor::MoveTo(left, cy + 2))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("Reach the score goal, then answer 3 questions"))?;
    out.queue(cursor::MoveTo(left, cy + 3))?;
    out.queue(Print("at the space station to upgrade your ship."))?;
    out.queue(cursor::MoveTo(left, cy + 5))?;
    out.queue(Print("Type your ID, pick a ship with 1-3   ESC : Quit"))?;

    if !notice.is_empty() {
        out.queue(cursor::MoveTo(left, cy + 7))?;
        out.queue(style::SetForegroundColor(Color::Red))?;
        out.queue(Print(notice))?;
    }

    out.queue(style::ResetColor)?;
    out.flush()
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    last_id: &str,
) -> std::io::Result<MenuResult> {
    let mut student_id = last_id.to_string();
    let mut notice = "";

    loop {
        draw_menu(out, &student_id, notice)?;

        // Block until the user makes a choice
        let (code, modifiers) = match rx.recv() {
            Ok(Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                modifiers,
                ..
            })) => (code, modifiers),
            Ok(_) => continue,
            // Input thread gone: nothing more can be typed.
            Err(_) => return Ok(MenuResult::Quit),
        };
        match code {
            KeyCode::Esc => return Ok(MenuResult::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(MenuResult::Quit);
            }
            KeyCode::Backspace => {
                student_id.pop();
                notice = "";
            }
            // Digits go to the id until it is full; afterwards 1-3 pick a ship.
            KeyCode::Char(c) if c.is_ascii_digit() && student_id.len() < STUDENT_ID_LEN => {
                student_id.push(c);
                notice = "";
            }
            KeyCode::Char(c @ '1'..='3') => {
                if !validate_student_id(&student_id) {
                    notice = "Enter a valid 5-digit student ID first";
                    continue;
                }
                let (character, _, _) = CHARACTERS[(c as u8 - b'1') as usize];
                return Ok(MenuResult::Start {
                    student_id,
                    character,
                });
            }
            KeyCode::Char(_) | KeyCode::Enter => {
                if !validate_student_id(&student_id) {
                    notice = "Student ID must be exactly 5 digits";
                }
            }
            _ => {}
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

enum LoopExit {
    Menu,
    Quit,
}

/// Standings are only taken once this session has submitted; a late answer
/// to an earlier session's submission is dropped.
fn apply_remote(
    session: &mut Session,
    results: &mut Results,
    submitted: bool,
    events: Vec<RemoteEvent>,
) {
    for event in events {
        match event {
            RemoteEvent::Questions(questions) => {
                if questions.is_empty() {
                    warn!("no questions available; stations will skip the quiz");
                } else {
                    phase::load_questions(session, questions);
                }
            }
            RemoteEvent::Standings(_) if !submitted => {}
            RemoteEvent::Standings(Some(standings)) => *results = Results::Board(standings),
            RemoteEvent::Standings(None) => *results = Results::LocalOnly,
        }
    }
}

fn submit_final_score(remote: &RemoteClient, session: &Session, settings: &Settings) {
    let state = &session.state;
    remote.submit_and_rank(
        &state.student_id,
        state.score,
        state.level,
        settings.leaderboard_limit,
    );
}

/// Input model: a `key_frame` map records the frame number of the last
/// press/repeat event for every key, and each frame the keys that are still
/// "fresh" (within `HOLD_WINDOW` frames) make up the movement vector.
/// One-shot actions (special attack, pause, answers) fire on the press
/// event itself.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut Session,
    rx: &mpsc::Receiver<Event>,
    remote: &RemoteClient,
    settings: &Settings,
) -> std::io::Result<LoopExit> {
    let mut rng = thread_rng();
    let frame_period = Duration::from_millis(settings.frame_ms);

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last = Instant::now();
    let mut results = Results::Pending;
    let mut submitted = false;

    loop {
        let frame_start = Instant::now();
        let dt = (frame_start.duration_since(last).as_secs_f32() * 1000.0).min(MAX_FRAME_DT_MS);
        last = frame_start;
        frame += 1;

        apply_remote(session, &mut results, submitted, remote.poll());

        // ── Drain all pending input events (non-blocking) ─────────────────────
        let mut special_attack = false;
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = ev
            else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code.clone(), frame);
                    match code {
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            if phase::quit(session) {
                                submit_final_score(remote, session, settings);
                                if remote.wait_for_standings(SUBMIT_GRACE).is_none() {
                                    warn!("score submission still pending at exit");
                                }
                            }
                            return Ok(LoopExit::Quit);
                        }
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            if !phase::quit(session) {
                                return Ok(LoopExit::Quit);
                            }
                        }
                        KeyCode::Char(' ') => special_attack = true,
                        KeyCode::Char('p') | KeyCode::Char('P') => {
                            phase::toggle_pause(session);
                        }
                        KeyCode::Char('e') | KeyCode::Char('E') => {
                            phase::enter_station(session, &mut rng);
                        }
                        KeyCode::Char('c') | KeyCode::Char('C') => {
                            phase::continue_to_next_level(session);
                        }
                        KeyCode::Enter => {
                            if !phase::enter_station(session, &mut rng) {
                                phase::continue_to_next_level(session);
                            }
                        }
                        KeyCode::Char(c @ '1'..='4') => {
                            phase::answer_question(session, (c as u8 - b'1') as usize);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R')
                            if matches!(session.phase, Phase::GameOver(_)) =>
                        {
                            reset_session(session, &mut rng);
                            results = Results::Pending;
                            submitted = false;
                            key_frame.clear();
                        }
                        KeyCode::Char('m') | KeyCode::Char('M')
                            if matches!(session.phase, Phase::GameOver(_)) =>
                        {
                            return Ok(LoopExit::Menu);
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code.clone(), frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        if session.is_playing() {
            let input = FrameInput {
                movement: held_movement(&key_frame, frame),
                special_attack,
            };
            tick(session, &input, dt, &mut rng);
        } else {
            phase::advance_timers(session, dt, &mut rng);
        }

        if !submitted && matches!(session.phase, Phase::GameOver(_)) {
            submit_final_score(remote, session, settings);
            submitted = true;
        }

        let (cols, rows) = terminal::size()?;
        display::render(out, session, Screen { cols, rows }, &results)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_period {
            thread::sleep(frame_period - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let (settings, config_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    init_logging(&settings);
    if let Some(e) = config_error {
        error!("invalid settings, using defaults: {}", e);
    }

    let backend: Arc<dyn Backend> = match FileBackend::open(&settings.data_file) {
        Ok(store) => {
            info!("using data file {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            error!(
                "cannot open {}: {}; playing offline",
                settings.data_file.display(),
                e
            );
            Arc::new(Offline)
        }
    };
    let remote = RemoteClient::new(backend);
    remote.request_questions();

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, &remote, &settings);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.map_err(Into::into)
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    remote: &RemoteClient,
    settings: &Settings,
) -> std::io::Result<()> {
    let mut rng = thread_rng();
    let mut pool = QuestionPool::default();
    let mut last_id = String::new();

    loop {
        match show_menu(out, rx, &last_id)? {
            MenuResult::Quit => break,
            MenuResult::Start {
                student_id,
                character,
            } => {
                info!("{} starts with {:?}", student_id, character);
                let mut session = init_session(
                    settings.bounds(),
                    &student_id,
                    character,
                    std::mem::take(&mut pool),
                    &mut rng,
                );
                let exit = game_loop(out, &mut session, rx, remote, settings)?;

                // Keep whatever bank arrived for the next session.
                pool = session.pool;
                last_id = student_id;

                if let LoopExit::Quit = exit {
                    break;
                }
            }
        }
    }
    Ok(())
}
