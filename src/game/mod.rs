pub mod config;
pub mod constants;
pub mod evolution;
pub mod food;
pub mod fruit;
pub mod grid;
pub mod maze;
pub mod portal;
pub mod room;
pub mod session;
pub mod snake;
pub mod types;
