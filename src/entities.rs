//! All game entity types: plain data plus the geometry helpers every
//! subsystem shares.  Behaviour lives in `spawn`, `motion`, `combat`,
//! `ability`, `phase` and `compute`.

use crate::phase::Phase;
use crate::quiz::QuestionPool;

// ── Starting values ──────────────────────────────────────────────────────────

pub const STARTING_HEALTH: i32 = 100;
pub const STARTING_ATTACK: i32 = 10;
pub const BASE_SPECIAL_RADIUS: f32 = 200.0;
pub const SPECIAL_MAX_COOLDOWN_MS: f32 = 5000.0;

// ── Geometry ─────────────────────────────────────────────────────────────────

/// Size of the playfield in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned rectangle, top-left anchored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Strict AABB overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Anything that occupies a rectangle on the playfield.
pub trait Hitbox {
    fn rect(&self) -> Rect;
}

macro_rules! impl_hitbox {
    ($($t:ty),*) => {
        $(impl Hitbox for $t {
            fn rect(&self) -> Rect {
                Rect { x: self.x, y: self.y, w: self.width, h: self.height }
            }
        })*
    };
}

// ── Enemies ──────────────────────────────────────────────────────────────────

/// The three ordinary hull types (basic-0, basic-1, basic-2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Scout,
    Raider,
    Striker,
}

impl BasicKind {
    pub const ALL: [BasicKind; 3] = [BasicKind::Scout, BasicKind::Raider, BasicKind::Striker];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    /// Falls straight down.
    Basic(BasicKind),
    /// Star-shaped drifter that sways sideways and always carries a powerup.
    Special,
    /// Patrols along the top edge and fires fans; immune to the special attack.
    Boss,
    /// Member of a fast-falling assault squad.
    Assault(BasicKind),
}

impl EnemyKind {
    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyKind::Boss)
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// May dip below zero for the remainder of the tick that killed it.
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub horizontal_speed: f32,
    /// One of -1, 0, 1.
    pub horizontal_direction: i8,
    /// Spawn x; special enemies sway around it.
    pub origin_x: f32,
    pub kind: EnemyKind,
    pub points: u32,
    pub shoot_cooldown: f32,
    pub shoot_interval: f32,
    pub drop_powerup: bool,
}

// ── Projectiles ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletOwner {
    Player,
    Enemy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BulletMotion {
    /// Straight line along y; positive is downward.
    Vertical(f32),
    /// Angled shot (boss fans).
    Vector { vx: f32, vy: f32 },
}

/// Cosmetic colour tag carried over from the shooter that fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tint {
    Player,
    Enemy(BasicKind),
    Special,
    Boss,
}

#[derive(Clone, Debug)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub motion: BulletMotion,
    pub damage: i32,
    pub owner: BulletOwner,
    pub tint: Tint,
}

// ── Powerups ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerupKind {
    /// Permanently widens the special attack.
    AttackRadius,
    /// Permanently shortens the auto-fire interval.
    FireRate,
    Heal,
    Shield,
    /// Permanently raises ship speed.
    Speed,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 5] = [
        PowerupKind::AttackRadius,
        PowerupKind::FireRate,
        PowerupKind::Heal,
        PowerupKind::Shield,
        PowerupKind::Speed,
    ];
}

#[derive(Clone, Debug)]
pub struct Powerup {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: PowerupKind,
    /// Remaining lifetime.
    pub duration_ms: f32,
}

// ── Player & background ──────────────────────────────────────────────────────

/// Ship skin picked on the menu.  Cosmetic only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Character {
    BlueEagle,
    GreenShark,
    RedDragon,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub shoot_cooldown: f32,
    pub shoot_interval: f32,
    pub invulnerable: bool,
    pub invulnerable_ms: f32,
    pub character: Character,
}

impl Player {
    pub fn center(&self) -> (f32, f32) {
        self.rect().center()
    }
}

#[derive(Clone, Debug)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub speed: f32,
}

impl_hitbox!(Enemy, Bullet, Powerup, Player);

// ── Session-wide game state ──────────────────────────────────────────────────

/// Scalar progress and stats for one play session.
#[derive(Clone, Debug)]
pub struct GameState {
    pub student_id: String,
    pub character: Character,
    pub level: u32,
    pub score: u32,
    /// Points earned since the current level began.
    pub level_score: u32,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub level_goal: u32,

    pub special_attack_ready: bool,
    pub special_attack_cooldown: f32,
    pub special_attack_max_cooldown: f32,
    pub special_attack_radius: f32,
    pub radius_stack: u32,
    pub fire_rate_stack: u32,
    pub speed_stack: u32,

    pub shield: i32,
    pub shield_max: i32,

    /// Correct answers over the whole session.
    pub correct_answers: u32,
    /// Questions asked over the whole session.
    pub total_questions: u32,

    pub boss_spawned: bool,

    /// Milliseconds of unpaused play; drives the assault clock.
    pub play_time_ms: f32,
    pub last_assault_ms: f32,

    pub damage_flash_ms: f32,
    /// Milliseconds since the last movement input.
    pub idle_ms: f32,
    pub inactivity_warning: bool,
}

impl GameState {
    pub fn new(student_id: &str, character: Character) -> Self {
        GameState {
            student_id: student_id.to_string(),
            character,
            level: 1,
            score: 0,
            level_score: 0,
            health: STARTING_HEALTH,
            max_health: STARTING_HEALTH,
            attack: STARTING_ATTACK,
            level_goal: crate::phase::calculate_level_goal(1),
            special_attack_ready: true,
            special_attack_cooldown: 0.0,
            special_attack_max_cooldown: SPECIAL_MAX_COOLDOWN_MS,
            special_attack_radius: BASE_SPECIAL_RADIUS,
            radius_stack: 0,
            fire_rate_stack: 0,
            speed_stack: 0,
            shield: 0,
            shield_max: 0,
            correct_answers: 0,
            total_questions: 0,
            boss_spawned: false,
            play_time_ms: 0.0,
            last_assault_ms: 0.0,
            damage_flash_ms: 0.0,
            idle_ms: 0.0,
            inactivity_warning: false,
        }
    }

    /// Health as it may be shown or persisted.
    pub fn displayed_health(&self) -> i32 {
        self.health.max(0)
    }

    /// Special-attack charge in `0.0..=1.0` for the HUD gauge.
    pub fn special_attack_charge(&self) -> f32 {
        if self.special_attack_ready {
            1.0
        } else {
            (1.0 - self.special_attack_cooldown / self.special_attack_max_cooldown).clamp(0.0, 1.0)
        }
    }
}

// ── Master session ───────────────────────────────────────────────────────────

/// Everything owned by one play session.  Every subsystem receives this
/// (or a field of it) by `&mut`; there is no other mutable game state.
#[derive(Clone, Debug)]
pub struct Session {
    pub state: GameState,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    /// Player bullets.
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub powerups: Vec<Powerup>,
    pub stars: Vec<Star>,
    pub phase: Phase,
    pub bounds: Bounds,
    pub pool: QuestionPool,
    /// Time accumulated towards the next regular spawn.
    pub spawn_timer_ms: f32,
}

impl Session {
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }
}
