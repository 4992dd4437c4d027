use crate::game::config::{GameSpeed, SessionConfig};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
pub const MAX_LEADERBOARD_LIMIT: i64 = 50;

#[derive(Debug, Clone)]
pub struct ServerConfig {
  pub port: u16,
  pub database_url: String,
  pub default_speed: GameSpeed,
  pub leaderboard_limit: i64,
}

impl ServerConfig {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let port = lookup("PORT")
      .and_then(|value| value.trim().parse().ok())
      .unwrap_or(DEFAULT_PORT);

    let database_url = lookup("DATABASE_URL")
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
      .unwrap_or_else(default_database_url);

    let default_speed = match lookup("DEFAULT_GAME_SPEED") {
      Some(value) => GameSpeed::parse(&value).unwrap_or_else(|| {
        tracing::warn!(value = %value, "unknown DEFAULT_GAME_SPEED, using normal");
        GameSpeed::Normal
      }),
      None => GameSpeed::Normal,
    };

    let leaderboard_limit = lookup("LEADERBOARD_LIMIT")
      .and_then(|value| value.trim().parse::<i64>().ok())
      .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
      .clamp(1, MAX_LEADERBOARD_LIMIT);

    Self {
      port,
      database_url,
      default_speed,
      leaderboard_limit,
    }
  }

  pub fn session_defaults(&self) -> SessionConfig {
    SessionConfig::default().with_speed(self.default_speed)
  }
}

fn default_database_url() -> String {
  let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
  let default_path = base.join("data").join("leaderboard.db");
  format!("sqlite://{}", default_path.display())
}
