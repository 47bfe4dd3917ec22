//! Session construction and the per-frame tick.
//!
//! `tick` runs one simulation step to completion in a fixed order:
//! input (idle clock, special attack) → stars → spawn → enemies → enemy
//! bullets → player → player bullets → powerups → collisions → status →
//! special-attack cooldown → phase check.
//! Collisions therefore always see this tick's positions.  All randomness
//! comes through `rng` so callers control determinism.

use rand::Rng;

use crate::ability::{update_special_attack, use_special_attack};
use crate::combat::{collect_powerups, resolve_collisions};
use crate::entities::{Bounds, Character, GameState, Player, Session};
use crate::motion::{
    create_stars, update_bullets, update_enemies, update_player, update_powerups, update_stars,
    Movement, PlayerCommand,
};
use crate::phase::{check_phase, game_over, track_inactivity, GameOverReason, Phase};
use crate::quiz::QuestionPool;
use crate::spawn::{shoot, spawn_enemy};

/// One regular spawn per second of play.
pub const SPAWN_INTERVAL_MS: f32 = 1000.0;

const PLAYER_WIDTH: f32 = 50.0;
const PLAYER_HEIGHT: f32 = 60.0;
const PLAYER_BOTTOM_MARGIN: f32 = 80.0;
pub const PLAYER_SPEED: f32 = 5.0;
pub const PLAYER_SHOOT_INTERVAL_MS: f32 = 500.0;

/// Input sampled for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub movement: Movement,
    /// The special-attack key was pressed since the last frame.
    pub special_attack: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep looping.
    Continue,
    LevelComplete,
    GameOver(GameOverReason),
    /// The session is not in the playing phase; nothing was simulated.
    Idle,
}

// ── Constructors ─────────────────────────────────────────────────────────────

pub fn create_player(bounds: &Bounds, character: Character) -> Player {
    Player {
        x: bounds.width / 2.0 - PLAYER_WIDTH / 2.0,
        y: bounds.height - PLAYER_BOTTOM_MARGIN,
        width: PLAYER_WIDTH,
        height: PLAYER_HEIGHT,
        speed: PLAYER_SPEED,
        shoot_cooldown: 0.0,
        shoot_interval: PLAYER_SHOOT_INTERVAL_MS,
        invulnerable: false,
        invulnerable_ms: 0.0,
        character,
    }
}

/// A fresh session on level 1, already in the playing phase.
pub fn init_session(
    bounds: Bounds,
    student_id: &str,
    character: Character,
    pool: QuestionPool,
    rng: &mut impl Rng,
) -> Session {
    Session {
        state: GameState::new(student_id, character),
        player: create_player(&bounds, character),
        enemies: Vec::new(),
        bullets: Vec::new(),
        enemy_bullets: Vec::new(),
        powerups: Vec::new(),
        stars: create_stars(&bounds, rng),
        phase: Phase::Playing,
        bounds,
        pool,
        spawn_timer_ms: 0.0,
    }
}

/// Start over with the same student, ship and question bank.  Used on
/// restart and when leaving the leaderboard.
pub fn reset_session(session: &mut Session, rng: &mut impl Rng) {
    let pool = std::mem::take(&mut session.pool);
    let student_id = std::mem::take(&mut session.state.student_id);
    *session = init_session(
        session.bounds,
        &student_id,
        session.state.character,
        pool,
        rng,
    );
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Clamp health for display and run the cosmetic damage-flash timer.
fn sync_status(state: &mut GameState, dt: f32) {
    state.health = state.health.max(0);
    state.damage_flash_ms = (state.damage_flash_ms - dt).max(0.0);
}

/// Advance the simulation by `dt` milliseconds.
pub fn tick(
    session: &mut Session,
    input: &FrameInput,
    dt: f32,
    rng: &mut impl Rng,
) -> TickOutcome {
    if session.phase != Phase::Playing {
        return TickOutcome::Idle;
    }

    // ── 1. Input ─────────────────────────────────────────────────────────────
    if let Some(reason) = track_inactivity(&mut session.state, !input.movement.is_idle(), dt) {
        game_over(session, reason);
        return TickOutcome::GameOver(reason);
    }
    if input.special_attack {
        use_special_attack(session, rng);
    }
    session.state.play_time_ms += dt;

    update_stars(&mut session.stars, dt, &session.bounds, rng);

    // ── 2. Spawn ─────────────────────────────────────────────────────────────
    session.spawn_timer_ms += dt;
    if session.spawn_timer_ms >= SPAWN_INTERVAL_MS {
        spawn_enemy(
            &session.bounds,
            &mut session.state,
            &session.player,
            &mut session.enemies,
            rng,
        );
        session.spawn_timer_ms = 0.0;
    }

    // ── 3. Motion ────────────────────────────────────────────────────────────
    update_enemies(session, dt, rng);
    update_bullets(&mut session.enemy_bullets, dt, &session.bounds);

    let command = update_player(&mut session.player, input.movement, dt, &session.bounds);
    if command == Some(PlayerCommand::Fire) {
        shoot(&session.player, &mut session.bullets, session.state.attack);
    }
    update_bullets(&mut session.bullets, dt, &session.bounds);

    update_powerups(&mut session.powerups, dt, &session.bounds);
    collect_powerups(session);

    // ── 4. Combat & status ───────────────────────────────────────────────────
    resolve_collisions(session, rng);
    sync_status(&mut session.state, dt);
    update_special_attack(&mut session.state, dt);

    // ── 5. Phase check ───────────────────────────────────────────────────────
    if check_phase(session) {
        return match session.phase {
            Phase::GameOver(reason) => TickOutcome::GameOver(reason),
            _ => TickOutcome::LevelComplete,
        };
    }
    TickOutcome::Continue
}
