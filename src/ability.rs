//! Special attack and powerup effects.

use log::info;
use rand::Rng;

use crate::combat::award_kill;
use crate::entities::{GameState, Hitbox, Player, PowerupKind, Session, BASE_SPECIAL_RADIUS};
use crate::spawn::enemy_health_for;

// ── Stacking rules ───────────────────────────────────────────────────────────

pub const RADIUS_BOOST: f32 = 50.0;
pub const RADIUS_STACK_CAP: u32 = 3;
pub const FIRE_RATE_BOOST_MS: f32 = 100.0;
pub const FIRE_RATE_STACK_CAP: u32 = 3;
pub const MIN_SHOOT_INTERVAL_MS: f32 = 50.0;
pub const HEAL_AMOUNT: i32 = 30;
pub const SHIELD_AMOUNT: i32 = 50;
pub const SPEED_BOOST: f32 = 3.0;
pub const SPEED_STACK_CAP: u32 = 5;

/// Outcome of a special-attack request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpecialAttackReport {
    pub enemies_destroyed: u32,
    pub bullets_cleared: u32,
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Damage dealt by the special attack: triple attack, but always enough to
/// kill an ordinary enemy of the current level.
pub fn special_attack_damage(state: &GameState) -> i32 {
    (state.attack * 3).max(enemy_health_for(state.level) + 1)
}

/// Fire the special attack if it is ready.
///
/// Every non-boss enemy whose centre lies within the radius of the ship's
/// centre takes the damage; every enemy bullet inside the radius is removed.
/// Returns `None` while the attack is cooling down.
pub fn use_special_attack(
    session: &mut Session,
    rng: &mut impl Rng,
) -> Option<SpecialAttackReport> {
    if !session.state.special_attack_ready {
        return None;
    }
    let Session {
        state,
        player,
        enemies,
        enemy_bullets,
        powerups,
        ..
    } = session;

    let mut report = SpecialAttackReport::default();
    let radius = state.special_attack_radius;
    let damage = special_attack_damage(state);
    let origin = player.center();

    for i in (0..enemies.len()).rev() {
        let enemy = &mut enemies[i];
        if enemy.kind.is_boss() {
            continue;
        }
        if distance(enemy.rect().center(), origin) <= radius {
            enemy.health -= damage;
            if enemy.health <= 0 {
                let dead = enemies.remove(i);
                award_kill(state, &dead, powerups, rng);
                report.enemies_destroyed += 1;
            }
        }
    }

    let before = enemy_bullets.len();
    enemy_bullets.retain(|b| distance(b.rect().center(), origin) > radius);
    report.bullets_cleared = (before - enemy_bullets.len()) as u32;

    state.special_attack_ready = false;
    state.special_attack_cooldown = state.special_attack_max_cooldown;
    info!(
        "special attack: radius {:.0}, damage {}, {} destroyed, {} bullets cleared",
        radius, damage, report.enemies_destroyed, report.bullets_cleared
    );
    Some(report)
}

/// Count the cooldown down; the attack is ready again at zero.
pub fn update_special_attack(state: &mut GameState, dt: f32) {
    if state.special_attack_ready {
        return;
    }
    state.special_attack_cooldown -= dt;
    if state.special_attack_cooldown <= 0.0 {
        state.special_attack_ready = true;
        state.special_attack_cooldown = 0.0;
    }
}

// ── Powerups ─────────────────────────────────────────────────────────────────

/// Apply a picked-up powerup.  Radius, fire-rate and speed boosts are
/// permanent and stop stacking at their caps.
pub fn apply_powerup_effect(state: &mut GameState, player: &mut Player, kind: PowerupKind) {
    match kind {
        PowerupKind::AttackRadius => {
            if state.radius_stack < RADIUS_STACK_CAP {
                state.radius_stack += 1;
                state.special_attack_radius =
                    BASE_SPECIAL_RADIUS + state.radius_stack as f32 * RADIUS_BOOST;
            }
        }
        PowerupKind::FireRate => {
            if state.fire_rate_stack < FIRE_RATE_STACK_CAP {
                state.fire_rate_stack += 1;
                player.shoot_interval =
                    (player.shoot_interval - FIRE_RATE_BOOST_MS).max(MIN_SHOOT_INTERVAL_MS);
            }
        }
        PowerupKind::Heal => {
            state.health = (state.health + HEAL_AMOUNT).min(state.max_health);
        }
        PowerupKind::Shield => {
            state.shield_max = SHIELD_AMOUNT;
            state.shield = SHIELD_AMOUNT;
        }
        PowerupKind::Speed => {
            if state.speed_stack < SPEED_STACK_CAP {
                state.speed_stack += 1;
                player.speed += SPEED_BOOST;
            }
        }
    }
    info!(
        "powerup {:?}: radius {:.0}, interval {:.0}ms, speed {:.1}, health {}, shield {}",
        kind,
        state.special_attack_radius,
        player.shoot_interval,
        player.speed,
        state.health,
        state.shield
    );
}
