//! Collision and combat resolution.
//!
//! Three independent AABB sweeps run once per tick, after all motion:
//! player bullets against enemies, enemy bullets against the player, and
//! enemy hulls against the player.  Entity counts are in the tens, so plain
//! nested scans are enough.

use log::debug;
use rand::Rng;

use crate::ability::apply_powerup_effect;
use crate::entities::{Enemy, GameState, Hitbox, Player, Powerup, PowerupKind, Session};
use crate::spawn::drop_powerup;

/// Hull-to-hull ramming damage, whatever the enemy type.
pub const COLLIDE_DAMAGE: i32 = 20;
pub const INVULNERABLE_MS: f32 = 1000.0;
pub const DAMAGE_FLASH_MS: f32 = 300.0;

/// How an incoming hit on the player was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitResult {
    /// The shield took it (overflow may have reached health).
    Absorbed,
    /// Health took it and the grace window started.
    Damaged,
    /// The player is inside a grace window.
    Ignored,
}

impl HitResult {
    pub fn processed(&self) -> bool {
        !matches!(self, HitResult::Ignored)
    }
}

/// Tally of one collision pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombatReport {
    pub enemies_destroyed: u32,
    pub player_hits: u32,
}

// ── Shared rules ─────────────────────────────────────────────────────────────

/// Shield first; otherwise health, but only outside the grace window.
/// Shield absorption never starts a grace window.
pub fn apply_player_damage(state: &mut GameState, player: &mut Player, damage: i32) -> HitResult {
    if state.shield > 0 {
        state.shield -= damage;
        if state.shield < 0 {
            state.health += state.shield;
            state.shield = 0;
        }
        state.health = state.health.max(0);
        HitResult::Absorbed
    } else if !player.invulnerable {
        state.health = (state.health - damage).max(0);
        player.invulnerable = true;
        player.invulnerable_ms = INVULNERABLE_MS;
        state.damage_flash_ms = DAMAGE_FLASH_MS;
        HitResult::Damaged
    } else {
        HitResult::Ignored
    }
}

/// Pay out a destroyed enemy: points, level points, and its drop if it has one.
pub fn award_kill(
    state: &mut GameState,
    enemy: &Enemy,
    powerups: &mut Vec<Powerup>,
    rng: &mut impl Rng,
) {
    if enemy.drop_powerup {
        drop_powerup(enemy.x, enemy.y, powerups, rng);
    }
    state.score += enemy.points;
    state.level_score += enemy.points;
}

// ── Sweeps ───────────────────────────────────────────────────────────────────

/// Pick up every powerup the ship touches and apply its effect.
pub fn collect_powerups(session: &mut Session) -> Vec<PowerupKind> {
    let mut collected = Vec::new();
    let player_rect = session.player.rect();
    for i in (0..session.powerups.len()).rev() {
        if session.powerups[i].rect().overlaps(&player_rect) {
            let p = session.powerups.remove(i);
            apply_powerup_effect(&mut session.state, &mut session.player, p.kind);
            collected.push(p.kind);
        }
    }
    collected
}

/// Run the three combat sweeps in order.
pub fn resolve_collisions(session: &mut Session, rng: &mut impl Rng) -> CombatReport {
    let mut report = CombatReport::default();
    let Session {
        state,
        player,
        enemies,
        bullets,
        enemy_bullets,
        powerups,
        ..
    } = session;

    // 1) Player bullets × enemies: a bullet is spent on the first enemy it touches.
    for i in (0..bullets.len()).rev() {
        let bullet_rect = bullets[i].rect();
        for j in (0..enemies.len()).rev() {
            if !bullet_rect.overlaps(&enemies[j].rect()) {
                continue;
            }
            let bullet = bullets.remove(i);
            enemies[j].health -= bullet.damage;
            if enemies[j].health <= 0 {
                let dead = enemies.remove(j);
                award_kill(state, &dead, powerups, rng);
                report.enemies_destroyed += 1;
            }
            break;
        }
    }

    // 2) Enemy bullets × player: an overlapping bullet is always consumed.
    let player_rect = player.rect();
    for i in (0..enemy_bullets.len()).rev() {
        if enemy_bullets[i].rect().overlaps(&player_rect) {
            let bullet = enemy_bullets.remove(i);
            if apply_player_damage(state, player, bullet.damage).processed() {
                report.player_hits += 1;
            }
        }
    }

    // 3) Enemy hulls × player.
    for i in (0..enemies.len()).rev() {
        if !enemies[i].rect().overlaps(&player_rect) {
            continue;
        }
        if !apply_player_damage(state, player, COLLIDE_DAMAGE).processed() {
            continue;
        }
        report.player_hits += 1;

        // Bosses soak the ram; anything else is destroyed by it.
        if enemies[i].kind.is_boss() {
            enemies[i].health -= COLLIDE_DAMAGE;
            if enemies[i].health > 0 {
                continue;
            }
        }
        let dead = enemies.remove(i);
        award_kill(state, &dead, powerups, rng);
        report.enemies_destroyed += 1;
    }

    if report != CombatReport::default() {
        debug!(
            "collisions: {} destroyed, {} hits taken, health {}",
            report.enemies_destroyed, report.player_hits, state.health
        );
    }
    report
}
