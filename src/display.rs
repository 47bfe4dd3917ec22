//! Rendering layer: all terminal output lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! session.  No game logic is performed; world coordinates are scaled onto
//! the terminal grid and translated into crossterm commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use quiz_shooter::ability::{FIRE_RATE_STACK_CAP, RADIUS_STACK_CAP, SPEED_STACK_CAP};
use quiz_shooter::backend::OPTION_COUNT;
use quiz_shooter::entities::{
    BasicKind, Bullet, BulletOwner, Character, Enemy, EnemyKind, GameState, Hitbox, PowerupKind,
    Session, Tint,
};
use quiz_shooter::phase::{GameOverReason, Phase, INACTIVITY_LIMIT_MS};
use quiz_shooter::quiz::{Quiz, RoundState, UpgradeSummary, QUIZ_ROUNDS};
use quiz_shooter::remote::Standings;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_BORDER_HIT: Color = Color::Red;
const C_HUD: Color = Color::Yellow;
const C_HUD_HEALTH: Color = Color::Red;
const C_HUD_SHIELD: Color = Color::Cyan;
const C_STAR: Color = Color::DarkGrey;
const C_BULLET_PLAYER: Color = Color::Cyan;
const C_HINT: Color = Color::DarkGrey;
const C_BOSS: Color = Color::DarkRed;

/// Rows taken by the HUD, the two border bars and the hint line.
const CHROME_ROWS: u16 = 4;
const LEADERBOARD_ROWS: usize = 5;

/// Terminal size for this frame.
#[derive(Clone, Copy, Debug)]
pub struct Screen {
    pub cols: u16,
    pub rows: u16,
}

impl Screen {
    fn field_cols(&self) -> f32 {
        self.cols.saturating_sub(2).max(1) as f32
    }

    fn field_rows(&self) -> f32 {
        self.rows.saturating_sub(CHROME_ROWS).max(1) as f32
    }

    /// Terminal cell for a world position, or `None` outside the playfield.
    fn cell(&self, session: &Session, x: f32, y: f32) -> Option<(u16, u16)> {
        if x < 0.0 || y < 0.0 || x >= session.bounds.width || y >= session.bounds.height {
            return None;
        }
        let col = 1 + (x / session.bounds.width * self.field_cols()) as u16;
        let row = 2 + (y / session.bounds.height * self.field_rows()) as u16;
        Some((col, row))
    }

    fn cells_wide(&self, session: &Session, w: f32) -> usize {
        ((w / session.bounds.width * self.field_cols()).round() as usize).max(1)
    }
}

/// What the game-over screen knows about the leaderboard.
#[derive(Clone, Debug)]
pub enum Results {
    Pending,
    /// The leaderboard could not be reached.
    LocalOnly,
    Board(Standings),
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    session: &Session,
    screen: Screen,
    results: &Results,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, session, screen)?;
    draw_hud(out, &session.state, screen)?;

    for star in &session.stars {
        if let Some((col, row)) = screen.cell(session, star.x, star.y) {
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(style::SetForegroundColor(C_STAR))?;
            out.queue(Print(if star.size > 2.0 { "·" } else { "." }))?;
        }
    }
    for powerup in &session.powerups {
        if let Some((col, row)) = screen.cell(session, powerup.x, powerup.y) {
            let (sym, color) = powerup_glyph(powerup.kind);
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(style::SetForegroundColor(color))?;
            out.queue(Print(sym))?;
        }
    }
    for enemy in &session.enemies {
        draw_enemy(out, session, screen, enemy)?;
    }
    for bullet in session.bullets.iter().chain(&session.enemy_bullets) {
        draw_bullet(out, session, screen, bullet)?;
    }
    draw_player(out, session, screen)?;
    draw_controls_hint(out, &session.phase, screen)?;

    match &session.phase {
        Phase::Playing => {
            if session.state.inactivity_warning {
                draw_inactivity_warning(out, &session.state, screen)?;
            }
        }
        Phase::Paused => draw_pause(out, &session.state, screen)?,
        Phase::LevelComplete => draw_level_complete(out, &session.state, screen)?,
        Phase::Quiz(quiz) => draw_quiz(out, quiz, screen)?,
        Phase::Upgrading(summary) => draw_upgrade(out, summary, screen)?,
        Phase::GameOver(reason) => draw_game_over(out, &session.state, *reason, results, screen)?,
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, screen.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, session: &Session, screen: Screen) -> std::io::Result<()> {
    let w = screen.cols as usize;
    let h = screen.rows;

    let color = if session.state.damage_flash_ms > 0.0 {
        C_BORDER_HIT
    } else {
        C_BORDER
    };
    out.queue(style::SetForegroundColor(color))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(screen.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn gauge(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn draw_hud<W: Write>(out: &mut W, state: &GameState, screen: Screen) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD))?;
    out.queue(Print(format!(
        "Lv {:<2} Score {:>6}/{:<6} ATK {:<3}",
        state.level, state.score, state.level_goal, state.attack
    )))?;

    out.queue(style::SetForegroundColor(C_HUD_HEALTH))?;
    out.queue(Print(format!(
        " HP {:>3}/{:<3}",
        state.displayed_health(),
        state.max_health
    )))?;
    if state.shield > 0 {
        out.queue(style::SetForegroundColor(C_HUD_SHIELD))?;
        out.queue(Print(format!(" SH {:>2}", state.shield)))?;
    }

    let special = if state.special_attack_ready {
        format!("SP [{}] READY", gauge(1.0, 10))
    } else {
        format!(
            "SP [{}] {:>3.1}s",
            gauge(state.special_attack_charge(), 10),
            state.special_attack_cooldown / 1000.0
        )
    };
    let quiz = format!("Quiz {}/{}  ", state.correct_answers, state.total_questions);
    let right = format!("{}{}", quiz, special);
    let rx = screen.cols.saturating_sub(right.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print(&quiz))?;
    out.queue(style::SetForegroundColor(if state.special_attack_ready {
        Color::Green
    } else {
        Color::DarkYellow
    }))?;
    out.queue(Print(&special))?;
    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn character_color(character: Character) -> Color {
    match character {
        Character::BlueEagle => Color::Blue,
        Character::GreenShark => Color::Green,
        Character::RedDragon => Color::Red,
    }
}

fn draw_player<W: Write>(out: &mut W, session: &Session, screen: Screen) -> std::io::Result<()> {
    let p = &session.player;
    // Blink while the grace window runs.
    if p.invulnerable && (p.invulnerable_ms / 100.0) as u32 % 2 == 1 {
        return Ok(());
    }
    let (cx, _) = p.center();
    let Some((col, row)) = screen.cell(session, cx, p.y) else {
        return Ok(());
    };
    let color = if session.state.shield > 0 {
        C_HUD_SHIELD
    } else {
        character_color(p.character)
    };
    out.queue(style::SetForegroundColor(color))?;
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(Print("▲"))?;
    if row + 1 < screen.rows.saturating_sub(2) {
        out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row + 1))?;
        out.queue(Print("/█\\"))?;
    }
    Ok(())
}

fn basic_glyph(kind: BasicKind) -> (&'static str, Color) {
    match kind {
        BasicKind::Scout => ("«▼»", Color::Green),
        BasicKind::Raider => ("(◎)", Color::Red),
        BasicKind::Striker => ("<V>", Color::Yellow),
    }
}

fn draw_enemy<W: Write>(
    out: &mut W,
    session: &Session,
    screen: Screen,
    enemy: &Enemy,
) -> std::io::Result<()> {
    let (cx, cy) = enemy.rect().center();
    let Some((col, row)) = screen.cell(session, cx, cy) else {
        return Ok(());
    };
    match enemy.kind {
        EnemyKind::Basic(kind) => {
            let (sym, color) = basic_glyph(kind);
            out.queue(style::SetForegroundColor(color))?;
            out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
            out.queue(Print(sym))?;
        }
        EnemyKind::Assault(kind) => {
            let (sym, _) = basic_glyph(kind);
            out.queue(style::SetForegroundColor(Color::Magenta))?;
            out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
            out.queue(Print(sym))?;
        }
        EnemyKind::Special => {
            out.queue(style::SetForegroundColor(Color::Magenta))?;
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(Print("✦"))?;
        }
        EnemyKind::Boss => {
            let cells = screen.cells_wide(session, enemy.width).max(8);
            let left = col.saturating_sub(cells as u16 / 2).max(1);
            let inner = cells.saturating_sub(2);
            out.queue(style::SetForegroundColor(C_BOSS))?;
            out.queue(cursor::MoveTo(left, row))?;
            out.queue(Print(format!("╔{}╗", "═".repeat(inner))))?;
            out.queue(cursor::MoveTo(left, row + 1))?;
            out.queue(Print(format!("╚{:^width$}╝", "BOSS", width = inner)))?;
            let fraction = enemy.health.max(0) as f32 / enemy.max_health.max(1) as f32;
            out.queue(cursor::MoveTo(left, row.saturating_sub(1).max(2)))?;
            out.queue(style::SetForegroundColor(Color::Red))?;
            out.queue(Print(gauge(fraction, cells)))?;
        }
    }
    Ok(())
}

fn draw_bullet<W: Write>(
    out: &mut W,
    session: &Session,
    screen: Screen,
    bullet: &Bullet,
) -> std::io::Result<()> {
    let (cx, cy) = bullet.rect().center();
    let Some((col, row)) = screen.cell(session, cx, cy) else {
        return Ok(());
    };
    let (sym, color) = match (bullet.owner, bullet.tint) {
        (BulletOwner::Player, _) => ("║", C_BULLET_PLAYER),
        (BulletOwner::Enemy, Tint::Boss) => ("●", Color::Red),
        (BulletOwner::Enemy, Tint::Special) => ("↓", Color::Magenta),
        (BulletOwner::Enemy, Tint::Enemy(kind)) => ("↓", basic_glyph(kind).1),
        (BulletOwner::Enemy, Tint::Player) => ("↓", C_BULLET_PLAYER),
    };
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(sym))?;
    Ok(())
}

/// Symbols:
///   ◎  (magenta) AttackRadius: wider special attack
///   !  (cyan)    FireRate:     faster auto-fire
///   ♥  (red)     Heal:         +30 health
///   ◈  (blue)    Shield:       50-point shield
///   »  (green)   Speed:        faster ship
fn powerup_glyph(kind: PowerupKind) -> (&'static str, Color) {
    match kind {
        PowerupKind::AttackRadius => ("◎", Color::Magenta),
        PowerupKind::FireRate => ("!", Color::Cyan),
        PowerupKind::Heal => ("♥", Color::Red),
        PowerupKind::Shield => ("◈", Color::Blue),
        PowerupKind::Speed => ("»", Color::Green),
    }
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, phase: &Phase, screen: Screen) -> std::io::Result<()> {
    let hint = match phase {
        Phase::Playing | Phase::Paused => {
            "←↑↓→ / WASD : Move   SPACE : Special   P : Pause   Q : Quit"
        }
        Phase::LevelComplete => "E / ENTER : Enter station   Q : Quit",
        Phase::Quiz(_) => "1-4 : Answer   Q : Quit",
        Phase::Upgrading(_) => "C / ENTER : Continue   Q : Quit",
        Phase::GameOver(_) => "R : Play again   M : Menu   Q : Exit",
    };
    out.queue(cursor::MoveTo(1, screen.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(hint))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

/// Draw a vertically centred block of lines, each centred horizontally.
fn draw_panel<W: Write>(out: &mut W, lines: &[(String, Color)], screen: Screen) -> std::io::Result<()> {
    let cx = screen.cols / 2;
    let start_row = (screen.rows / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}

fn banner(title: &str, color: Color) -> Vec<(String, Color)> {
    let inner = title.chars().count() + 8;
    vec![
        (format!("╔{}╗", "═".repeat(inner)), color),
        (format!("║{:^width$}║", title, width = inner), color),
        (format!("╚{}╝", "═".repeat(inner)), color),
    ]
}

fn draw_inactivity_warning<W: Write>(
    out: &mut W,
    state: &GameState,
    screen: Screen,
) -> std::io::Result<()> {
    let left = ((INACTIVITY_LIMIT_MS - state.idle_ms).max(0.0) / 1000.0).ceil();
    let msg = format!("⚠ No movement detected: disconnecting in {:.0}s ⚠", left);
    out.queue(cursor::MoveTo(
        (screen.cols / 2).saturating_sub(msg.chars().count() as u16 / 2),
        3,
    ))?;
    out.queue(style::SetForegroundColor(Color::Yellow))?;
    out.queue(Print(msg))?;
    Ok(())
}

fn draw_pause<W: Write>(out: &mut W, state: &GameState, screen: Screen) -> std::io::Result<()> {
    let mut lines = banner("PAUSED", Color::Cyan);
    lines.push((
        format!(
            "Radius {}/{}   Fire rate {}/{}   Speed {}/{}",
            state.radius_stack,
            RADIUS_STACK_CAP,
            state.fire_rate_stack,
            FIRE_RATE_STACK_CAP,
            state.speed_stack,
            SPEED_STACK_CAP
        ),
        Color::White,
    ));
    lines.push((String::new(), Color::White));
    for (kind, desc) in [
        (PowerupKind::AttackRadius, "wider special attack"),
        (PowerupKind::FireRate, "faster auto-fire"),
        (PowerupKind::Heal, "restore 30 health"),
        (PowerupKind::Shield, "50-point shield"),
        (PowerupKind::Speed, "faster ship"),
    ] {
        let (sym, _) = powerup_glyph(kind);
        lines.push((format!("{} {:<22}", sym, desc), Color::DarkGrey));
    }
    lines.push((String::new(), Color::White));
    lines.push(("P - Resume   Q - Quit".to_string(), Color::White));
    draw_panel(out, &lines, screen)
}

fn draw_level_complete<W: Write>(
    out: &mut W,
    state: &GameState,
    screen: Screen,
) -> std::io::Result<()> {
    let mut lines = banner(&format!("LEVEL {} CLEAR", state.level), Color::Green);
    lines.push((format!("Score: {}", state.score), Color::Yellow));
    lines.push((
        "Dock at the space station to upgrade your ship".to_string(),
        Color::White,
    ));
    lines.push(("E / ENTER - Enter station".to_string(), Color::White));
    draw_panel(out, &lines, screen)
}

fn draw_quiz<W: Write>(out: &mut W, quiz: &Quiz, screen: Screen) -> std::io::Result<()> {
    let mut lines = banner(
        &format!("SPACE STATION  Question {}/{}", quiz.round, QUIZ_ROUNDS),
        Color::Cyan,
    );
    lines.push((quiz.question.question.clone(), Color::White));
    lines.push((String::new(), Color::White));

    let (verdict, chosen) = match quiz.state {
        RoundState::Asking { .. } => (None, None),
        RoundState::Feedback {
            correct, chosen, ..
        } => (Some(correct), chosen),
    };
    for (i, option) in quiz.question.options.iter().take(OPTION_COUNT).enumerate() {
        let color = match verdict {
            None => Color::White,
            Some(_) if i == quiz.question.answer => Color::Green,
            Some(_) if chosen == Some(i) => Color::Red,
            Some(_) => Color::DarkGrey,
        };
        lines.push((format!("[{}] {:<20}", i + 1, option), color));
    }
    lines.push((String::new(), Color::White));
    let status = match (verdict, chosen) {
        (None, _) => (format!("Time left: {:>2}s", quiz.seconds_left()), Color::Yellow),
        (Some(true), _) => ("Correct!".to_string(), Color::Green),
        (Some(false), None) => ("Time's up!".to_string(), Color::Red),
        (Some(false), Some(_)) => ("Wrong!".to_string(), Color::Red),
    };
    lines.push(status);
    lines.push((format!("Correct so far: {}", quiz.correct), Color::DarkGrey));
    draw_panel(out, &lines, screen)
}

fn draw_upgrade<W: Write>(out: &mut W, summary: &UpgradeSummary, screen: Screen) -> std::io::Result<()> {
    let mut lines = banner("UPGRADE COMPLETE", Color::Green);
    lines.push((
        format!("{}/{} answers correct", summary.correct, QUIZ_ROUNDS),
        Color::Yellow,
    ));
    lines.push((format!("Next level: {}", summary.level), Color::White));
    lines.push((format!("Attack: {}", summary.attack), Color::White));
    lines.push((
        format!(
            "Max health: {} (+{} restored)",
            summary.max_health, summary.health_restored
        ),
        Color::White,
    ));
    lines.push((String::new(), Color::White));
    lines.push(("C / ENTER - Continue".to_string(), Color::White));
    draw_panel(out, &lines, screen)
}

fn draw_game_over<W: Write>(
    out: &mut W,
    state: &GameState,
    reason: GameOverReason,
    results: &Results,
    screen: Screen,
) -> std::io::Result<()> {
    let title = match reason {
        GameOverReason::Destroyed => "GAME  OVER",
        GameOverReason::Inactive => "DISCONNECTED: INACTIVE",
        GameOverReason::Quit => "MISSION ABORTED",
    };
    let mut lines = banner(title, Color::Red);
    lines.push((
        format!("Final Score: {:>6}   Level: {}", state.score, state.level),
        Color::Yellow,
    ));
    lines.push((
        format!(
            "Quiz: {}/{} correct",
            state.correct_answers, state.total_questions
        ),
        Color::White,
    ));
    lines.push((String::new(), Color::White));

    match results {
        Results::Pending => lines.push(("Submitting score...".to_string(), Color::DarkGrey)),
        Results::LocalOnly => lines.push((
            "Leaderboard unavailable: local result only".to_string(),
            Color::DarkGrey,
        )),
        Results::Board(standings) => {
            let rank = |r: Option<usize>| r.map_or("-".to_string(), |r| format!("#{}", r));
            lines.push((
                format!(
                    "Rank {}   Class rank {}",
                    rank(standings.ranks.overall),
                    rank(standings.ranks.class)
                ),
                Color::Cyan,
            ));
            for (i, entry) in standings.entries.iter().take(LEADERBOARD_ROWS).enumerate() {
                let color = if entry.student_id == state.student_id {
                    Color::Yellow
                } else {
                    Color::White
                };
                lines.push((
                    format!(
                        "{:>2}. {:<6} {:>7}  Lv {:<2}",
                        i + 1,
                        entry.student_id,
                        entry.score,
                        entry.level
                    ),
                    color,
                ));
            }
        }
    }
    lines.push((String::new(), Color::White));
    lines.push(("R - Play Again  M - Menu  Q - Exit".to_string(), Color::White));
    draw_panel(out, &lines, screen)
}
