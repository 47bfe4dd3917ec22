use quiz_shooter::combat::*;
use quiz_shooter::compute::init_session;
use quiz_shooter::entities::*;
use quiz_shooter::quiz::QuestionPool;
use quiz_shooter::spawn::spawn_boss;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_session() -> Session {
    init_session(
        Bounds {
            width: 800.0,
            height: 600.0,
        },
        "12345",
        Character::BlueEagle,
        QuestionPool::default(),
        &mut seeded_rng(),
    )
}

fn enemy_at(x: f32, y: f32, health: i32) -> Enemy {
    Enemy {
        x,
        y,
        width: 40.0,
        height: 40.0,
        health,
        max_health: health,
        speed: 2.0,
        horizontal_speed: 0.0,
        horizontal_direction: 0,
        origin_x: x,
        kind: EnemyKind::Basic(BasicKind::Scout),
        points: 10,
        shoot_cooldown: 1000.0,
        shoot_interval: 1000.0,
        drop_powerup: false,
    }
}

fn bullet_at(x: f32, y: f32, owner: BulletOwner, damage: i32) -> Bullet {
    Bullet {
        x,
        y,
        width: 5.0,
        height: 15.0,
        motion: BulletMotion::Vertical(0.0),
        damage,
        owner,
        tint: match owner {
            BulletOwner::Player => Tint::Player,
            BulletOwner::Enemy => Tint::Special,
        },
    }
}

/// A point well inside the player's hull.
fn on_player(s: &Session) -> (f32, f32) {
    (s.player.x + 10.0, s.player.y + 10.0)
}

// ── apply_player_damage ───────────────────────────────────────────────────────

#[test]
fn shield_absorbs_and_overflows_into_health() {
    let mut s = make_session();
    s.state.shield = 30;
    let result = apply_player_damage(&mut s.state, &mut s.player, 50);

    assert_eq!(result, HitResult::Absorbed);
    assert_eq!(s.state.shield, 0);
    assert_eq!(s.state.health, 80);
    assert!(!s.player.invulnerable);
}

#[test]
fn shield_fully_absorbs_small_hits() {
    let mut s = make_session();
    s.state.shield = 50;
    apply_player_damage(&mut s.state, &mut s.player, 20);
    assert_eq!(s.state.shield, 30);
    assert_eq!(s.state.health, 100);
}

#[test]
fn health_damage_starts_grace_window() {
    let mut s = make_session();
    let result = apply_player_damage(&mut s.state, &mut s.player, 10);

    assert_eq!(result, HitResult::Damaged);
    assert_eq!(s.state.health, 90);
    assert!(s.player.invulnerable);
    assert_relative_eq!(s.player.invulnerable_ms, INVULNERABLE_MS);
    assert_relative_eq!(s.state.damage_flash_ms, DAMAGE_FLASH_MS);
}

#[test]
fn grace_window_ignores_hits() {
    let mut s = make_session();
    s.player.invulnerable = true;
    let result = apply_player_damage(&mut s.state, &mut s.player, 10);

    assert_eq!(result, HitResult::Ignored);
    assert!(!result.processed());
    assert_eq!(s.state.health, 100);
}

#[test]
fn health_never_goes_negative() {
    let mut s = make_session();
    s.state.health = 5;
    apply_player_damage(&mut s.state, &mut s.player, 20);
    assert_eq!(s.state.health, 0);

    let mut s = make_session();
    s.state.health = 5;
    s.state.shield = 10;
    apply_player_damage(&mut s.state, &mut s.player, 50);
    assert_eq!(s.state.health, 0);
    assert_eq!(s.state.shield, 0);
}

// ── Player bullets × enemies ──────────────────────────────────────────────────

#[test]
fn bullet_hits_at_most_one_enemy() {
    let mut s = make_session();
    s.enemies.push(enemy_at(100.0, 100.0, 20));
    s.enemies.push(enemy_at(100.0, 100.0, 20));
    s.bullets.push(bullet_at(110.0, 110.0, BulletOwner::Player, 10));

    let report = resolve_collisions(&mut s, &mut seeded_rng());
    assert!(s.bullets.is_empty());
    assert_eq!(report.enemies_destroyed, 0);
    let total: i32 = s.enemies.iter().map(|e| e.health).sum();
    assert_eq!(total, 30);
}

#[test]
fn lethal_bullet_destroys_and_pays() {
    let mut s = make_session();
    let mut e = enemy_at(100.0, 100.0, 10);
    e.drop_powerup = true;
    s.enemies.push(e);
    s.bullets.push(bullet_at(110.0, 110.0, BulletOwner::Player, 10));

    let report = resolve_collisions(&mut s, &mut seeded_rng());
    assert_eq!(report.enemies_destroyed, 1);
    assert!(s.enemies.is_empty());
    assert_eq!(s.state.score, 10);
    assert_eq!(s.state.level_score, 10);
    assert_eq!(s.powerups.len(), 1);
}

#[test]
fn bullets_that_miss_survive() {
    let mut s = make_session();
    s.enemies.push(enemy_at(100.0, 100.0, 20));
    s.bullets.push(bullet_at(300.0, 100.0, BulletOwner::Player, 10));
    resolve_collisions(&mut s, &mut seeded_rng());
    assert_eq!(s.bullets.len(), 1);
    assert_eq!(s.enemies[0].health, 20);
}

// ── Enemy bullets × player ────────────────────────────────────────────────────

#[test]
fn enemy_bullet_damages_player() {
    let mut s = make_session();
    let (x, y) = on_player(&s);
    s.enemy_bullets.push(bullet_at(x, y, BulletOwner::Enemy, 10));

    let report = resolve_collisions(&mut s, &mut seeded_rng());
    assert_eq!(report.player_hits, 1);
    assert!(s.enemy_bullets.is_empty());
    assert_eq!(s.state.health, 90);
}

#[test]
fn enemy_bullet_consumed_during_grace_window() {
    let mut s = make_session();
    s.player.invulnerable = true;
    let (x, y) = on_player(&s);
    s.enemy_bullets.push(bullet_at(x, y, BulletOwner::Enemy, 10));

    let report = resolve_collisions(&mut s, &mut seeded_rng());
    assert_eq!(report.player_hits, 0);
    assert!(s.enemy_bullets.is_empty());
    assert_eq!(s.state.health, 100);
}

#[test]
fn second_bullet_same_tick_is_ignored() {
    let mut s = make_session();
    let (x, y) = on_player(&s);
    s.enemy_bullets.push(bullet_at(x, y, BulletOwner::Enemy, 10));
    s.enemy_bullets.push(bullet_at(x + 5.0, y, BulletOwner::Enemy, 10));

    resolve_collisions(&mut s, &mut seeded_rng());
    assert!(s.enemy_bullets.is_empty());
    assert_eq!(s.state.health, 90);
}

// ── Hull collisions ───────────────────────────────────────────────────────────

#[test]
fn ramming_an_enemy_destroys_it() {
    let mut s = make_session();
    let (x, y) = on_player(&s);
    s.enemies.push(enemy_at(x, y, 20));

    let report = resolve_collisions(&mut s, &mut seeded_rng());
    assert_eq!(report.enemies_destroyed, 1);
    assert_eq!(report.player_hits, 1);
    assert!(s.enemies.is_empty());
    assert_eq!(s.state.health, 100 - COLLIDE_DAMAGE);
    assert_eq!(s.state.score, 10);
}

#[test]
fn boss_survives_a_ram() {
    let mut s = make_session();
    spawn_boss(&s.bounds, 5, &mut s.enemies);
    let (x, y) = on_player(&s);
    s.enemies[0].x = x - 60.0;
    s.enemies[0].y = y - 60.0;

    let report = resolve_collisions(&mut s, &mut seeded_rng());
    assert_eq!(report.enemies_destroyed, 0);
    assert_eq!(s.enemies.len(), 1);
    assert_eq!(s.enemies[0].health, 300 - COLLIDE_DAMAGE);
    assert_eq!(s.state.health, 100 - COLLIDE_DAMAGE);
    assert_eq!(s.state.score, 0);
}

#[test]
fn no_ram_damage_during_grace_window() {
    let mut s = make_session();
    s.player.invulnerable = true;
    let (x, y) = on_player(&s);
    s.enemies.push(enemy_at(x, y, 20));

    resolve_collisions(&mut s, &mut seeded_rng());
    assert_eq!(s.enemies.len(), 1);
    assert_eq!(s.state.health, 100);
}

// ── Powerup pickup ────────────────────────────────────────────────────────────

#[test]
fn touching_a_powerup_applies_it() {
    let mut s = make_session();
    s.state.health = 50;
    let (x, y) = on_player(&s);
    s.powerups.push(Powerup {
        x,
        y,
        width: 24.0,
        height: 24.0,
        kind: PowerupKind::Heal,
        duration_ms: 8000.0,
    });
    s.powerups.push(Powerup {
        x: 0.0,
        y: 0.0,
        width: 24.0,
        height: 24.0,
        kind: PowerupKind::Shield,
        duration_ms: 8000.0,
    });

    let collected = collect_powerups(&mut s);
    assert_eq!(collected, vec![PowerupKind::Heal]);
    assert_eq!(s.powerups.len(), 1);
    assert_eq!(s.state.health, 80);
}

#[test]
fn award_kill_without_drop() {
    let mut s = make_session();
    let e = enemy_at(0.0, 0.0, 0);
    award_kill(&mut s.state, &e, &mut s.powerups, &mut seeded_rng());
    assert_eq!(s.state.score, 10);
    assert!(s.powerups.is_empty());
}
