//! Per-tick motion and lifecycle for every entity category.
//!
//! Speeds are expressed per 16 ms frame, so every updater scales by
//! `dt / FRAME_UNIT_MS`.  Removal always walks collections back to front so
//! no element is skipped.

use rand::Rng;

use crate::combat::award_kill;
use crate::entities::{Bounds, Bullet, BulletMotion, EnemyKind, Player, Powerup, Session, Star};
use crate::spawn::{boss_shoot, enemy_shoot};

pub const FRAME_UNIT_MS: f32 = 16.0;

const SPECIAL_FLIP_CHANCE: f64 = 0.02;
/// How far a special enemy may sway from where it spawned.
pub const SPECIAL_SWAY_RANGE: f32 = 60.0;
const POWERUP_DRIFT: f32 = 2.0;
const STAR_DENSITY: f32 = 2000.0;

/// Normalized movement request for one frame.  Components lie in `-1..=1`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Movement {
    pub x: f32,
    pub y: f32,
}

impl Movement {
    pub fn new(x: f32, y: f32) -> Self {
        let len = (x * x + y * y).sqrt();
        if len > 1.0 {
            Movement { x: x / len, y: y / len }
        } else {
            Movement { x, y }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// What the player step asks its caller to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Fire,
}

// ── Enemies ──────────────────────────────────────────────────────────────────

/// Move, fire and retire every enemy.
///
/// Each enemy decrements its shoot cooldown exactly once.  Enemies past the
/// bottom edge leave without reward; enemies at zero health are removed here
/// exactly once, paying out their points and optional drop.
pub fn update_enemies(session: &mut Session, dt: f32, rng: &mut impl Rng) {
    let Session {
        enemies,
        enemy_bullets,
        powerups,
        state,
        bounds,
        ..
    } = session;
    let step = dt / FRAME_UNIT_MS;

    for i in (0..enemies.len()).rev() {
        let e = &mut enemies[i];

        match e.kind {
            EnemyKind::Boss => {
                e.x += e.horizontal_speed * step * e.horizontal_direction as f32;
                if e.x <= 0.0 {
                    e.x = 0.0;
                    e.horizontal_direction = 1;
                } else if e.x + e.width >= bounds.width {
                    e.x = bounds.width - e.width;
                    e.horizontal_direction = -1;
                }
            }
            EnemyKind::Special => {
                if rng.gen_bool(SPECIAL_FLIP_CHANCE) {
                    e.horizontal_direction = -e.horizontal_direction;
                }
                e.x += e.horizontal_speed * step * e.horizontal_direction as f32;
                let offset = e.x - e.origin_x;
                if offset.abs() > SPECIAL_SWAY_RANGE {
                    e.x = e.origin_x + SPECIAL_SWAY_RANGE * offset.signum();
                    e.horizontal_direction = -e.horizontal_direction;
                }
                e.x = e.x.clamp(0.0, (bounds.width - e.width).max(0.0));
                e.y += e.speed * step;
            }
            // Assault members carry their doubled speed from the factory.
            EnemyKind::Assault(_) | EnemyKind::Basic(_) => {
                e.y += e.speed * step;
            }
        }

        e.shoot_cooldown -= dt;
        if e.shoot_cooldown <= 0.0 {
            match e.kind {
                EnemyKind::Boss => boss_shoot(e, enemy_bullets),
                _ => enemy_shoot(e, enemy_bullets),
            }
            e.shoot_cooldown = e.shoot_interval;
        }

        if e.y > bounds.height {
            enemies.remove(i);
        } else if e.health <= 0 {
            let dead = enemies.remove(i);
            award_kill(state, &dead, powerups, rng);
        }
    }
}

// ── Projectiles ──────────────────────────────────────────────────────────────

fn off_field(b: &Bullet, bounds: &Bounds) -> bool {
    b.y + b.height < 0.0 || b.y > bounds.height || b.x + b.width < 0.0 || b.x > bounds.width
}

/// Advance bullets of either owner and drop those that left the playfield.
pub fn update_bullets(bullets: &mut Vec<Bullet>, dt: f32, bounds: &Bounds) {
    let step = dt / FRAME_UNIT_MS;
    for i in (0..bullets.len()).rev() {
        let b = &mut bullets[i];
        match b.motion {
            BulletMotion::Vertical(speed) => b.y += speed * step,
            BulletMotion::Vector { vx, vy } => {
                b.x += vx * step;
                b.y += vy * step;
            }
        }
        if off_field(b, bounds) {
            bullets.remove(i);
        }
    }
}

// ── Player ───────────────────────────────────────────────────────────────────

/// Tick the grace window, move by the input vector and run auto-fire.
pub fn update_player(
    player: &mut Player,
    movement: Movement,
    dt: f32,
    bounds: &Bounds,
) -> Option<PlayerCommand> {
    if player.invulnerable {
        player.invulnerable_ms -= dt;
        if player.invulnerable_ms <= 0.0 {
            player.invulnerable = false;
            player.invulnerable_ms = 0.0;
        }
    }

    let step = dt / FRAME_UNIT_MS;
    player.x += movement.x * player.speed * step;
    player.y += movement.y * player.speed * step;
    player.x = player.x.clamp(0.0, (bounds.width - player.width).max(0.0));
    player.y = player.y.clamp(0.0, (bounds.height - player.height).max(0.0));

    player.shoot_cooldown -= dt;
    if player.shoot_cooldown <= 0.0 {
        player.shoot_cooldown = player.shoot_interval;
        Some(PlayerCommand::Fire)
    } else {
        None
    }
}

// ── Powerups ─────────────────────────────────────────────────────────────────

pub fn update_powerups(powerups: &mut Vec<Powerup>, dt: f32, bounds: &Bounds) {
    let step = dt / FRAME_UNIT_MS;
    for i in (0..powerups.len()).rev() {
        let p = &mut powerups[i];
        p.duration_ms -= dt;
        p.y += POWERUP_DRIFT * step;
        if p.duration_ms <= 0.0 || p.y > bounds.height {
            powerups.remove(i);
        }
    }
}

// ── Star field ───────────────────────────────────────────────────────────────

pub fn create_stars(bounds: &Bounds, rng: &mut impl Rng) -> Vec<Star> {
    let count = (bounds.width * bounds.height / STAR_DENSITY) as usize;
    (0..count)
        .map(|_| Star {
            x: rng.gen_range(0.0..bounds.width.max(1.0)),
            y: rng.gen_range(0.0..bounds.height.max(1.0)),
            size: rng.gen_range(1.0..3.0),
            speed: rng.gen_range(0.1..0.6),
        })
        .collect()
}

pub fn update_stars(stars: &mut [Star], dt: f32, bounds: &Bounds, rng: &mut impl Rng) {
    let step = dt / FRAME_UNIT_MS;
    for star in stars.iter_mut() {
        star.y += star.speed * step;
        if star.y > bounds.height {
            star.y = 0.0;
            star.x = rng.gen_range(0.0..bounds.width.max(1.0));
        }
    }
}
