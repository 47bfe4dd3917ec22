use quiz_shooter::compute::{create_player, init_session};
use quiz_shooter::entities::*;
use quiz_shooter::motion::*;
use quiz_shooter::quiz::QuestionPool;
use quiz_shooter::spawn::spawn_boss;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bounds() -> Bounds {
    Bounds {
        width: 800.0,
        height: 600.0,
    }
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_session() -> Session {
    init_session(
        bounds(),
        "12345",
        Character::BlueEagle,
        QuestionPool::default(),
        &mut seeded_rng(),
    )
}

fn enemy(kind: EnemyKind, x: f32, y: f32) -> Enemy {
    Enemy {
        x,
        y,
        width: 40.0,
        height: 40.0,
        health: 20,
        max_health: 20,
        speed: 2.0,
        horizontal_speed: 0.0,
        horizontal_direction: 0,
        origin_x: x,
        kind,
        points: 10,
        shoot_cooldown: 1.0e9,
        shoot_interval: 1000.0,
        drop_powerup: false,
    }
}

fn bullet(x: f32, y: f32, motion: BulletMotion) -> Bullet {
    Bullet {
        x,
        y,
        width: 4.0,
        height: 10.0,
        motion,
        damage: 10,
        owner: BulletOwner::Enemy,
        tint: Tint::Special,
    }
}

// ── Movement ──────────────────────────────────────────────────────────────────

#[test]
fn diagonal_movement_is_normalized() {
    let m = Movement::new(1.0, 1.0);
    assert_relative_eq!(m.x.hypot(m.y), 1.0, epsilon = 1e-6);
    assert!(!m.is_idle());
    assert!(Movement::default().is_idle());
}

#[test]
fn partial_movement_is_kept() {
    let m = Movement::new(0.5, 0.0);
    assert_relative_eq!(m.x, 0.5);
}

// ── Enemies ───────────────────────────────────────────────────────────────────

#[test]
fn basic_enemy_falls_by_speed_per_frame_unit() {
    let mut s = make_session();
    s.enemies.push(enemy(EnemyKind::Basic(BasicKind::Scout), 100.0, 100.0));
    update_enemies(&mut s, FRAME_UNIT_MS * 2.0, &mut seeded_rng());
    assert_relative_eq!(s.enemies[0].y, 104.0);
    assert_relative_eq!(s.enemies[0].x, 100.0);
}

#[test]
fn boss_reverses_at_right_edge() {
    let mut s = make_session();
    spawn_boss(&s.bounds, 1, &mut s.enemies);
    s.enemies[0].x = 800.0 - 120.0 - 1.0;
    s.enemies[0].horizontal_direction = 1;

    update_enemies(&mut s, 16.0, &mut seeded_rng());
    let boss = &s.enemies[0];
    assert_relative_eq!(boss.x, 680.0);
    assert_eq!(boss.horizontal_direction, -1);
    assert_relative_eq!(boss.y, 20.0); // patrols, never descends
}

#[test]
fn boss_reverses_at_left_edge() {
    let mut s = make_session();
    spawn_boss(&s.bounds, 1, &mut s.enemies);
    s.enemies[0].x = 1.0;
    s.enemies[0].horizontal_direction = -1;

    update_enemies(&mut s, 16.0, &mut seeded_rng());
    assert_relative_eq!(s.enemies[0].x, 0.0);
    assert_eq!(s.enemies[0].horizontal_direction, 1);
}

#[test]
fn special_enemy_sways_within_range() {
    let mut s = make_session();
    let mut e = enemy(EnemyKind::Special, 380.0, 100.0);
    e.speed = 0.0;
    e.horizontal_speed = 1.5;
    e.horizontal_direction = 1;
    s.enemies.push(e);

    let mut rng = seeded_rng();
    for _ in 0..500 {
        update_enemies(&mut s, 16.0, &mut rng);
        let e = &s.enemies[0];
        assert!((e.x - e.origin_x).abs() <= SPECIAL_SWAY_RANGE + 1e-3);
    }
}

#[test]
fn cooldown_decrements_once_per_tick() {
    let mut s = make_session();
    let mut e = enemy(EnemyKind::Basic(BasicKind::Raider), 100.0, 100.0);
    e.shoot_cooldown = 100.0;
    s.enemies.push(e);

    update_enemies(&mut s, 16.0, &mut seeded_rng());
    assert_relative_eq!(s.enemies[0].shoot_cooldown, 84.0);
    assert!(s.enemy_bullets.is_empty());

    update_enemies(&mut s, 100.0, &mut seeded_rng());
    assert_eq!(s.enemy_bullets.len(), 1);
    assert_relative_eq!(s.enemies[0].shoot_cooldown, 1000.0);
}

#[test]
fn boss_cooldown_fires_a_fan() {
    let mut s = make_session();
    spawn_boss(&s.bounds, 5, &mut s.enemies);
    s.enemies[0].shoot_cooldown = 10.0;
    update_enemies(&mut s, 16.0, &mut seeded_rng());
    assert_eq!(s.enemy_bullets.len(), 5);
}

#[test]
fn enemy_off_bottom_leaves_without_reward() {
    let mut s = make_session();
    s.enemies.push(enemy(EnemyKind::Basic(BasicKind::Striker), 100.0, 599.0));
    update_enemies(&mut s, 16.0, &mut seeded_rng());
    assert!(s.enemies.is_empty());
    assert_eq!(s.state.score, 0);
    assert_eq!(s.state.level_score, 0);
}

#[test]
fn dead_enemy_removed_once_and_paid() {
    let mut s = make_session();
    let mut e = enemy(EnemyKind::Special, 100.0, 100.0);
    e.health = 0;
    e.drop_powerup = true;
    s.enemies.push(e);
    s.enemies.push(enemy(EnemyKind::Basic(BasicKind::Scout), 300.0, 100.0));

    let mut rng = seeded_rng();
    update_enemies(&mut s, 16.0, &mut rng);
    assert_eq!(s.enemies.len(), 1);
    assert_eq!(s.state.score, 10);
    assert_eq!(s.state.level_score, 10);
    assert_eq!(s.powerups.len(), 1);

    update_enemies(&mut s, 16.0, &mut rng);
    assert_eq!(s.state.score, 10);
}

// ── Bullets ───────────────────────────────────────────────────────────────────

#[test]
fn bullets_leave_through_any_edge() {
    let mut bullets = vec![
        bullet(100.0, -20.0, BulletMotion::Vertical(-10.0)),
        bullet(100.0, 595.0, BulletMotion::Vertical(10.0)),
        bullet(798.0, 300.0, BulletMotion::Vector { vx: 4.0, vy: 0.0 }),
        bullet(400.0, 300.0, BulletMotion::Vertical(5.0)),
    ];
    update_bullets(&mut bullets, 16.0, &bounds());
    assert_eq!(bullets.len(), 1);
    assert_relative_eq!(bullets[0].y, 305.0);
}

#[test]
fn angled_bullet_moves_on_both_axes() {
    let mut bullets = vec![bullet(400.0, 300.0, BulletMotion::Vector { vx: -2.0, vy: 3.0 })];
    update_bullets(&mut bullets, 32.0, &bounds());
    assert_relative_eq!(bullets[0].x, 396.0);
    assert_relative_eq!(bullets[0].y, 306.0);
}

// ── Player ────────────────────────────────────────────────────────────────────

#[test]
fn player_moves_and_clamps() {
    let mut p = create_player(&bounds(), Character::BlueEagle);
    let start = p.x;
    update_player(&mut p, Movement::new(1.0, 0.0), 16.0, &bounds());
    assert_relative_eq!(p.x, start + 5.0);

    p.x = 1.0;
    p.y = 1.0;
    update_player(&mut p, Movement::new(-1.0, 0.0), 16.0, &bounds());
    update_player(&mut p, Movement::new(0.0, -1.0), 16.0, &bounds());
    assert_relative_eq!(p.x, 0.0);
    assert_relative_eq!(p.y, 0.0);

    p.x = 799.0;
    update_player(&mut p, Movement::new(1.0, 0.0), 16.0, &bounds());
    assert_relative_eq!(p.x, 800.0 - p.width);
}

#[test]
fn player_auto_fires_on_interval() {
    let mut p = create_player(&bounds(), Character::BlueEagle);
    let idle = Movement::default();
    assert_eq!(
        update_player(&mut p, idle, 16.0, &bounds()),
        Some(PlayerCommand::Fire)
    );
    assert_relative_eq!(p.shoot_cooldown, p.shoot_interval);
    assert_eq!(update_player(&mut p, idle, 16.0, &bounds()), None);
    assert_eq!(
        update_player(&mut p, idle, 500.0, &bounds()),
        Some(PlayerCommand::Fire)
    );
}

#[test]
fn grace_window_expires() {
    let mut p = create_player(&bounds(), Character::BlueEagle);
    p.invulnerable = true;
    p.invulnerable_ms = 10.0;
    update_player(&mut p, Movement::default(), 16.0, &bounds());
    assert!(!p.invulnerable);
    assert_relative_eq!(p.invulnerable_ms, 0.0);
}

// ── Powerups & stars ──────────────────────────────────────────────────────────

fn powerup(y: f32, duration_ms: f32) -> Powerup {
    Powerup {
        x: 100.0,
        y,
        width: 24.0,
        height: 24.0,
        kind: PowerupKind::Heal,
        duration_ms,
    }
}

#[test]
fn powerups_expire_or_drift_away() {
    let mut powerups = vec![powerup(100.0, 10.0), powerup(599.0, 5000.0), powerup(100.0, 5000.0)];
    update_powerups(&mut powerups, 16.0, &bounds());
    assert_eq!(powerups.len(), 1);
    assert_relative_eq!(powerups[0].y, 102.0);
    assert_relative_eq!(powerups[0].duration_ms, 4984.0);
}

#[test]
fn stars_wrap_to_the_top() {
    let mut rng = seeded_rng();
    let mut stars = create_stars(&bounds(), &mut rng);
    assert_eq!(stars.len(), 240);
    stars[0].y = 599.9;
    stars[0].speed = 1.0;
    update_stars(&mut stars, 16.0, &bounds(), &mut rng);
    assert_relative_eq!(stars[0].y, 0.0);
    for s in &stars {
        assert!(s.y >= 0.0 && s.y <= 600.0);
    }
}
