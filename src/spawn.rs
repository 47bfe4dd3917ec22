//! Entity factories.
//!
//! Every factory appends to the collection it is given and draws all of its
//! randomness from the injected RNG, so a seeded RNG makes spawns
//! reproducible in tests.

use log::info;
use rand::Rng;

use crate::entities::{
    BasicKind, Bounds, Bullet, BulletMotion, BulletOwner, Enemy, EnemyKind, GameState, Player,
    Powerup, PowerupKind, Tint,
};

// ── Tunables ─────────────────────────────────────────────────────────────────

pub const ENEMY_SIZE: f32 = 40.0;
pub const BOSS_SIZE: f32 = 120.0;
const BOSS_Y: f32 = 20.0;
pub const BOSS_LEVEL_INTERVAL: u32 = 5;
pub const BOSS_HEALTH_MULTIPLIER: i32 = 5;
const BOSS_SHOOT_INTERVAL_MS: f32 = 2000.0;

pub const BASE_ENEMY_HEALTH: i32 = 20;
pub const HEALTH_PER_LEVEL: i32 = 10;
pub const BASE_ENEMY_SPEED: f32 = 2.0;
pub const SPEED_PER_LEVEL: f32 = 0.3;
pub const BASE_ENEMY_POINTS: u32 = 10;
pub const POINTS_PER_LEVEL: u32 = 5;

/// Special (star) enemies: 3 in 20.
const SPECIAL_NUMERATOR: u32 = 3;
const SPECIAL_DENOMINATOR: u32 = 20;
const SPECIAL_LANES: [f32; 3] = [0.2, 0.5, 0.8];
pub const SPECIAL_SWAY_SPEED: f32 = 1.5;

const SHOOT_INTERVAL_FLOOR_MS: f32 = 600.0;

pub const ASSAULT_INTERVAL_MS: f32 = 30_000.0;
/// Rows of the squad, top row first; the single ship leads the charge.
pub const ASSAULT_ROWS: [usize; 3] = [3, 2, 1];
const ASSAULT_SPACING: f32 = 50.0;

pub const PLAYER_BULLET_WIDTH: f32 = 5.0;
pub const PLAYER_BULLET_HEIGHT: f32 = 15.0;
pub const PLAYER_BULLET_SPEED: f32 = 10.0;

const ENEMY_BULLET_WIDTH: f32 = 4.0;
const ENEMY_BULLET_HEIGHT: f32 = 10.0;
const ENEMY_BULLET_SPEED: f32 = 5.0;
pub const ENEMY_BULLET_DAMAGE: i32 = 10;

const BOSS_BULLET_SIZE: f32 = 8.0;
const BOSS_BULLET_SPEED: f32 = 4.0;
pub const BOSS_BULLET_DAMAGE: i32 = 20;
/// Fan offsets from straight down, in degrees.
const BOSS_FAN_DEGREES: [f32; 5] = [-45.0, -22.5, 0.0, 22.5, 45.0];

pub const POWERUP_SIZE: f32 = 24.0;
pub const POWERUP_LIFETIME_MS: f32 = 8000.0;

// ── Level scaling ────────────────────────────────────────────────────────────

pub fn enemy_health_for(level: u32) -> i32 {
    BASE_ENEMY_HEALTH + (level.saturating_sub(1) as i32) * HEALTH_PER_LEVEL
}

pub fn enemy_speed_for(level: u32) -> f32 {
    BASE_ENEMY_SPEED + level.saturating_sub(1) as f32 * SPEED_PER_LEVEL
}

pub fn enemy_points_for(level: u32) -> u32 {
    BASE_ENEMY_POINTS + level.saturating_sub(1) * POINTS_PER_LEVEL
}

pub fn boss_health_for(level: u32) -> i32 {
    enemy_health_for(level) * BOSS_HEALTH_MULTIPLIER
}

fn roll_shoot_timers(level: u32, rng: &mut impl Rng) -> (f32, f32) {
    let cooldown = rng.gen_range(1000.0_f32..3000.0);
    let interval = rng.gen_range(2000.0_f32..4000.0) - level.saturating_sub(1) as f32 * 200.0;
    (cooldown, interval.max(SHOOT_INTERVAL_FLOOR_MS))
}

/// A fresh enemy of the given non-boss kind, stats scaled to `level`.
fn build_enemy(kind: EnemyKind, x: f32, y: f32, level: u32, rng: &mut impl Rng) -> Enemy {
    let health = enemy_health_for(level);
    let (shoot_cooldown, shoot_interval) = roll_shoot_timers(level, rng);
    let (horizontal_speed, horizontal_direction) = match kind {
        EnemyKind::Special => (
            SPECIAL_SWAY_SPEED,
            if rng.gen_bool(0.5) { 1 } else { -1 },
        ),
        _ => (0.0, 0),
    };
    Enemy {
        x,
        y,
        width: ENEMY_SIZE,
        height: ENEMY_SIZE,
        health,
        max_health: health,
        speed: enemy_speed_for(level),
        horizontal_speed,
        horizontal_direction,
        origin_x: x,
        kind,
        points: enemy_points_for(level),
        shoot_cooldown,
        shoot_interval,
        drop_powerup: kind == EnemyKind::Special,
    }
}

// ── Enemies ──────────────────────────────────────────────────────────────────

/// Whether the assault clock has run out.
pub fn assault_due(state: &GameState) -> bool {
    state.play_time_ms - state.last_assault_ms >= ASSAULT_INTERVAL_MS
}

/// One regular spawn call.
///
/// Priority: the level's boss (on every fifth level, once), then an assault
/// squad when its clock has run out, otherwise a single enemy.
pub fn spawn_enemy(
    bounds: &Bounds,
    state: &mut GameState,
    player: &Player,
    enemies: &mut Vec<Enemy>,
    rng: &mut impl Rng,
) {
    if state.level % BOSS_LEVEL_INTERVAL == 0 && !state.boss_spawned {
        spawn_boss(bounds, state.level, enemies);
        state.boss_spawned = true;
        info!("boss spawned on level {}", state.level);
        return;
    }

    if assault_due(state) {
        let (center_x, _) = player.center();
        spawn_assault_squad(bounds, state.level, center_x, enemies, rng);
        state.last_assault_ms = state.play_time_ms;
        return;
    }

    let y = -ENEMY_SIZE;
    if rng.gen_ratio(SPECIAL_NUMERATOR, SPECIAL_DENOMINATOR) {
        let lane = SPECIAL_LANES[rng.gen_range(0..SPECIAL_LANES.len())];
        let x = bounds.width * lane - ENEMY_SIZE / 2.0;
        enemies.push(build_enemy(EnemyKind::Special, x, y, state.level, rng));
    } else {
        let basic = BasicKind::ALL[rng.gen_range(0..BasicKind::ALL.len())];
        let x = rng.gen_range(0.0_f32..(bounds.width - ENEMY_SIZE).max(1.0));
        enemies.push(build_enemy(EnemyKind::Basic(basic), x, y, state.level, rng));
    }
}

/// Always pushes exactly one boss, top-centre.
pub fn spawn_boss(bounds: &Bounds, level: u32, enemies: &mut Vec<Enemy>) {
    let health = boss_health_for(level);
    let x = bounds.width / 2.0 - BOSS_SIZE / 2.0;
    enemies.push(Enemy {
        x,
        y: BOSS_Y,
        width: BOSS_SIZE,
        height: BOSS_SIZE,
        health,
        max_health: health,
        speed: 0.0,
        horizontal_speed: 2.0 + level.saturating_sub(1) as f32 * 0.2,
        horizontal_direction: 1,
        origin_x: x,
        kind: EnemyKind::Boss,
        points: level * 100,
        shoot_cooldown: BOSS_SHOOT_INTERVAL_MS,
        shoot_interval: BOSS_SHOOT_INTERVAL_MS,
        drop_powerup: false,
    });
}

/// Six ships in a 3-2-1 inverted triangle above the screen, centred on
/// `center_x`, sharing one random basic hull and falling at double speed.
pub fn spawn_assault_squad(
    bounds: &Bounds,
    level: u32,
    center_x: f32,
    enemies: &mut Vec<Enemy>,
    rng: &mut impl Rng,
) {
    let basic = BasicKind::ALL[rng.gen_range(0..BasicKind::ALL.len())];
    let rows = ASSAULT_ROWS.len();
    let max_x = (bounds.width - ENEMY_SIZE).max(0.0);

    for (row, &count) in ASSAULT_ROWS.iter().enumerate() {
        // The last row sits just above the top edge; earlier rows stack above it.
        let y = -ENEMY_SIZE - (rows - 1 - row) as f32 * ASSAULT_SPACING;
        let row_width = (count - 1) as f32 * ASSAULT_SPACING;
        for slot in 0..count {
            let cx = center_x - row_width / 2.0 + slot as f32 * ASSAULT_SPACING;
            let x = (cx - ENEMY_SIZE / 2.0).clamp(0.0, max_x);
            let mut enemy = build_enemy(EnemyKind::Assault(basic), x, y, level, rng);
            enemy.speed *= 2.0;
            enemies.push(enemy);
        }
    }
    info!("assault squad launched at x={:.0} on level {}", center_x, level);
}

// ── Projectiles ──────────────────────────────────────────────────────────────

/// One upward bullet from the nose of the ship.
pub fn shoot(player: &Player, bullets: &mut Vec<Bullet>, damage: i32) {
    bullets.push(Bullet {
        x: player.x + player.width / 2.0 - PLAYER_BULLET_WIDTH / 2.0,
        y: player.y,
        width: PLAYER_BULLET_WIDTH,
        height: PLAYER_BULLET_HEIGHT,
        motion: BulletMotion::Vertical(-PLAYER_BULLET_SPEED),
        damage,
        owner: BulletOwner::Player,
        tint: Tint::Player,
    });
}

/// A single straight shot from under the enemy.
pub fn enemy_shoot(enemy: &Enemy, enemy_bullets: &mut Vec<Bullet>) {
    let tint = match enemy.kind {
        EnemyKind::Basic(b) | EnemyKind::Assault(b) => Tint::Enemy(b),
        EnemyKind::Special => Tint::Special,
        EnemyKind::Boss => Tint::Boss,
    };
    enemy_bullets.push(Bullet {
        x: enemy.x + enemy.width / 2.0 - ENEMY_BULLET_WIDTH / 2.0,
        y: enemy.y + enemy.height,
        width: ENEMY_BULLET_WIDTH,
        height: ENEMY_BULLET_HEIGHT,
        motion: BulletMotion::Vertical(ENEMY_BULLET_SPEED),
        damage: ENEMY_BULLET_DAMAGE,
        owner: BulletOwner::Enemy,
        tint,
    });
}

/// Five bullets fanned across 90 degrees below the boss.
pub fn boss_shoot(enemy: &Enemy, enemy_bullets: &mut Vec<Bullet>) {
    for offset in BOSS_FAN_DEGREES {
        let rad = (90.0 + offset).to_radians();
        enemy_bullets.push(Bullet {
            x: enemy.x + enemy.width / 2.0 - BOSS_BULLET_SIZE / 2.0,
            y: enemy.y + enemy.height,
            width: BOSS_BULLET_SIZE,
            height: BOSS_BULLET_SIZE,
            motion: BulletMotion::Vector {
                vx: rad.cos() * BOSS_BULLET_SPEED,
                vy: rad.sin() * BOSS_BULLET_SPEED,
            },
            damage: BOSS_BULLET_DAMAGE,
            owner: BulletOwner::Enemy,
            tint: Tint::Boss,
        });
    }
}

// ── Loot ─────────────────────────────────────────────────────────────────────

pub fn drop_powerup(x: f32, y: f32, powerups: &mut Vec<Powerup>, rng: &mut impl Rng) {
    let kind = PowerupKind::ALL[rng.gen_range(0..PowerupKind::ALL.len())];
    powerups.push(Powerup {
        x,
        y,
        width: POWERUP_SIZE,
        height: POWERUP_SIZE,
        kind,
        duration_ms: POWERUP_LIFETIME_MS,
    });
}
