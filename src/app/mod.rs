pub mod config;
pub mod scores;
