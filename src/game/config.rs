use super::constants::{GRID_COUNT, MAX_GRID_SIZE, MIN_GRID_SIZE};
use super::evolution::EvolutionTable;
use super::fruit::FruitTable;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSpeed {
    VerySlow,
    #[default]
    Normal,
    Fast,
}

impl GameSpeed {
    pub fn multiplier(self) -> f64 {
        match self {
            GameSpeed::VerySlow => 0.5,
            GameSpeed::Normal => 1.0,
            GameSpeed::Fast => 1.5,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "very_slow" | "very-slow" | "slow" => Some(GameSpeed::VerySlow),
            "normal" => Some(GameSpeed::Normal),
            "fast" => Some(GameSpeed::Fast),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            GameSpeed::VerySlow => 0,
            GameSpeed::Normal => 1,
            GameSpeed::Fast => 2,
        }
    }

    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(GameSpeed::VerySlow),
            1 => Some(GameSpeed::Normal),
            2 => Some(GameSpeed::Fast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub grid_size: i32,
    pub wrap_around: bool,
    pub ghost_mode: bool,
    pub maze_mode: bool,
    pub portal_mode: bool,
    pub rainbow_skin: bool,
    pub reversed_controls: bool,
    pub infinite_length: bool,
    pub double_food: bool,
    pub speed: GameSpeed,
    pub allow_tier_regression: bool,
    pub seed: Option<u64>,
    #[serde(skip)]
    pub fruits: FruitTable,
    #[serde(skip)]
    pub tiers: EvolutionTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_COUNT,
            wrap_around: true,
            ghost_mode: false,
            maze_mode: false,
            portal_mode: false,
            rainbow_skin: false,
            reversed_controls: false,
            infinite_length: false,
            double_food: false,
            speed: GameSpeed::Normal,
            allow_tier_regression: true,
            seed: None,
            fruits: FruitTable::default(),
            tiers: EvolutionTable::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_speed(mut self, speed: GameSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub fn sanitized(mut self) -> Self {
        self.grid_size = self.grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        self
    }
}
