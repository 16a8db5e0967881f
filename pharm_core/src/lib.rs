#![forbid(unsafe_code)]

//! Core domain model and game logic for PharmQuest, a community-pharmacy
//! practice game.
//!
//! This crate provides:
//! - Domain types (medications, prescriptions, scenarios, stages)
//! - Built-in catalog and authored content
//! - Session state and the stage state machine
//! - Scenario resolver and validation mini-game
//! - Stage desks (receiving, typing, picking, dispensing) and the `Game` driver

pub mod types;
pub mod error;
pub mod catalog;
pub mod scenarios;
pub mod content;
pub mod abbreviations;
pub mod config;
pub mod logging;
pub mod state;
pub mod progression;
pub mod engine;
pub mod validation;
pub mod allergy;
pub mod receiving;
pub mod typing;
pub mod picking;
pub mod dispensing;
pub mod game;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use content::{build_default_content, get_default_content};
pub use config::{Config, Reward, RewardsConfig};
pub use state::{SessionSnapshot, SessionState};
pub use progression::Rank;
pub use engine::{resolve, Continuation, Resolution};
pub use validation::{submit_validation, ValidationOutcome};
pub use game::{Game, Transition};
