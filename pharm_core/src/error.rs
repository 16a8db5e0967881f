//! Error types for the pharm_core library.
//!
//! Only data-integrity and usage faults are errors. A wrong answer from the
//! player is an ordinary result carried in a `Consequence` or outcome value.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pharm_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authored content failed its integrity checks
    #[error("Content validation error: {0}")]
    ContentValidation(String),

    /// The chosen option has no consequence in the scenario
    #[error("Option '{option_id}' has no consequence in scenario '{scenario_id}'")]
    InvalidOption {
        scenario_id: String,
        option_id: String,
    },

    /// A prescription marked invalid carries no reason
    #[error("Prescription '{0}' is marked invalid but has no invalid reason")]
    MissingInvalidReason(String),

    /// Prescription id not present in the content library
    #[error("Unknown prescription: {0}")]
    UnknownPrescription(String),

    /// Medication id not present in the catalog
    #[error("Unknown medication: {0}")]
    UnknownMedication(String),

    /// Year selector outside 1..=3
    #[error("Invalid year: {0} (expected 1, 2 or 3)")]
    InvalidYear(u8),

    /// No level authored for the year/chapter pair
    #[error("No level for year {year} chapter {chapter}")]
    UnknownLevel { year: u8, chapter: u32 },

    /// An operation needed the active prescription but none is loaded
    #[error("No active prescription in session")]
    NoActivePrescription,

    /// The validation mini-game was used on a scenario prescription
    #[error("Prescription '{0}' carries a scenario; resolve it instead of validating")]
    ScenarioPresent(String),

    /// A scenario decision was requested on a prescription without one
    #[error("Prescription '{0}' has no scenario")]
    NoScenario(String),

    /// A stage operation was called outside its stage
    #[error("Operation requires stage {expected}, session is at {actual}")]
    WrongStage {
        expected: crate::Stage,
        actual: crate::Stage,
    },
}
