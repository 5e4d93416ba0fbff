//! Idle Forge: item forging and progression for an incremental RPG.
//!
//! The engines live in the member crates (`items`, `forge`, `player`, `save`);
//! this crate wires them into a playable session.

pub mod config;
pub mod session;

pub use crate::config::GameConfig;
pub use crate::session::{GameSession, SessionError, Startup};
