pub const GRID_COUNT: i32 = 26;
pub const MIN_GRID_SIZE: i32 = 8;
pub const MAX_GRID_SIZE: i32 = 64;
pub const INITIAL_LENGTH: usize = 3;
pub const MIN_LENGTH: usize = 3;
pub const SELF_COLLISION_SKIP: usize = 3;
pub const MAX_SPAWN_ATTEMPTS: usize = 100;

pub const BASE_TICK_RATE: f64 = 10.0;
pub const MIN_TICK_RATE: f64 = 1.0;

pub const HAZARD_SPAWN_CHANCE: f64 = 0.25;
pub const HAZARD_LIFETIME_TICKS: u32 = 100;
pub const SPEED_EFFECT_TICKS: u32 = 300;

pub const MAZE_DENSITY: f64 = 0.05;
pub const MAZE_REGEN_INTERVAL: u32 = 150;
pub const MAZE_HEAD_BUFFER: i32 = 2;

pub const PORTAL_CAP: usize = 2;
pub const PORTAL_SPAWN_INTERVAL: u32 = 60;
pub const PORTAL_LIFETIME_TICKS: u32 = 200;

pub const SPECIAL_FOOD_BURST: usize = 10;
