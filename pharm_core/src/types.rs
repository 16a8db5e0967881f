//! Core domain types for the pharmacy practice game.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medications and counseling questions (catalog records)
//! - Prescriptions, scenarios and their consequences (authored content)
//! - Stages, years and levels (progression)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Medication Types
// ============================================================================

/// Physical form a medication is supplied in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DosageForm {
    Tablet,
    Capsule,
    Liquid,
    Syrup,
    Topical,
    Inhaler,
    Injection,
}

impl DosageForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DosageForm::Tablet => "tablet",
            DosageForm::Capsule => "capsule",
            DosageForm::Liquid => "liquid",
            DosageForm::Syrup => "syrup",
            DosageForm::Topical => "topical",
            DosageForm::Inhaler => "inhaler",
            DosageForm::Injection => "injection",
        }
    }

    /// Liquids are measured in ml rather than counted
    pub fn is_liquid(&self) -> bool {
        matches!(self, DosageForm::Liquid | DosageForm::Syrup)
    }
}

impl fmt::Display for DosageForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DosageForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tablet" | "tab" => Ok(DosageForm::Tablet),
            "capsule" | "cap" => Ok(DosageForm::Capsule),
            "liquid" => Ok(DosageForm::Liquid),
            "syrup" => Ok(DosageForm::Syrup),
            "topical" => Ok(DosageForm::Topical),
            "inhaler" => Ok(DosageForm::Inhaler),
            "injection" => Ok(DosageForm::Injection),
            other => Err(format!("unknown dosage form '{}'", other)),
        }
    }
}

/// Therapeutic shelf a medication is stocked under
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MedicationCategory {
    Analgesic,
    Gastrointestinal,
    Cardiovascular,
    Respiratory,
    Antimicrobial,
    Endocrine,
    Neurological,
}

/// A medication record from the catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub generic_name: String,
    pub brand_name: Option<String>,
    pub strength: String,
    pub dosage_form: DosageForm,
    pub category: MedicationCategory,
    pub drug_class: String,
    pub mechanism_of_action: String,
    pub common_uses: Vec<String>,
    pub side_effects: Vec<String>,
    pub counseling_points: Vec<String>,
    pub packing_unit: Option<String>,
    pub storage: String,
    pub warnings: Vec<String>,
}

impl Medication {
    /// Display name, e.g. "Ibuprofen 200mg (Nurofen)"
    pub fn display_name(&self) -> String {
        match &self.brand_name {
            Some(brand) => format!("{} {} ({})", self.generic_name, self.strength, brand),
            None => format!("{} {}", self.generic_name, self.strength),
        }
    }
}

/// Topic a counseling question covers
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionCategory {
    Indication,
    Dosage,
    SideEffects,
    Storage,
    Warnings,
}

/// A multiple-choice counseling question bound to one medication
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CounselingQuestion {
    pub id: String,
    pub medication_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
    pub category: QuestionCategory,
}

// ============================================================================
// Scenario Types
// ============================================================================

/// Kind of professional action an option represents (icon choice only)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PharmacistAction {
    AcceptRx,
    CallDoctor,
    RefuseRx,
    AskPatient,
    CheckReferences,
}

/// One choice offered at a scenario decision point
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub text: String,
    pub action: PharmacistAction,
}

/// Authored outcome bound to one scenario option
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Consequence {
    pub outcome: String,
    pub patient_reaction: String,
    pub score_impact: i64,
    pub rx_points_impact: i64,
    pub is_correct: bool,
    pub explanation: String,
    #[serde(default)]
    pub should_skip_remaining_stages: bool,
}

/// A branching decision point attached to a prescription
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub situation: String,
    pub question: String,
    pub options: Vec<DecisionOption>,
    /// Model answer; hint metadata only, `Consequence::is_correct` decides
    pub correct_action: String,
    pub consequences: BTreeMap<String, Consequence>,
}

// ============================================================================
// Prescription Types
// ============================================================================

/// Why a prescription must not be dispensed as written
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidReason {
    MissingSignature,
    ExpiredDate,
    IncompleteDosage,
    PatientMismatch,
    IllegibleHandwriting,
    MissingDate,
    AllergyConflict,
    DrugInteraction,
}

impl InvalidReason {
    pub const ALL: [InvalidReason; 8] = [
        InvalidReason::MissingSignature,
        InvalidReason::ExpiredDate,
        InvalidReason::IncompleteDosage,
        InvalidReason::PatientMismatch,
        InvalidReason::IllegibleHandwriting,
        InvalidReason::MissingDate,
        InvalidReason::AllergyConflict,
        InvalidReason::DrugInteraction,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            InvalidReason::MissingSignature => "missing-signature",
            InvalidReason::ExpiredDate => "expired-date",
            InvalidReason::IncompleteDosage => "incomplete-dosage",
            InvalidReason::PatientMismatch => "patient-mismatch",
            InvalidReason::IllegibleHandwriting => "illegible-handwriting",
            InvalidReason::MissingDate => "missing-date",
            InvalidReason::AllergyConflict => "allergy-conflict",
            InvalidReason::DrugInteraction => "drug-interaction",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for InvalidReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        InvalidReason::ALL
            .into_iter()
            .find(|r| r.code() == wanted)
            .ok_or_else(|| format!("unknown invalid reason '{}'", s))
    }
}

/// One medication order on a prescription
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrescriptionItem {
    pub medication_id: String,
    pub quantity: u32,
    pub dosage_instruction: String,
    /// Frequency abbreviation, possibly alternatives joined by "or"
    pub frequency: String,
    pub duration: Option<String>,
    pub special_instructions: Option<String>,
}

/// An authored prescription fixture, never mutated at runtime
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub patient_name: String,
    pub patient_ic: String,
    pub patient_address: Option<String>,
    pub patient_dob: Option<NaiveDate>,
    pub patient_allergies: Vec<String>,
    pub doctor_name: String,
    pub doctor_mcr: Option<String>,
    pub doctor_signature: bool,
    pub clinic_address: Option<String>,
    pub date: Option<NaiveDate>,
    pub medications: Vec<PrescriptionItem>,
    pub is_valid: bool,
    pub invalid_reason: Option<InvalidReason>,
    pub scenario: Option<Scenario>,
}

// ============================================================================
// Progression Types
// ============================================================================

/// One of the four fixed phases of a level, in play order
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Receiving,
    Typing,
    Picking,
    Dispensing,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Receiving,
        Stage::Typing,
        Stage::Picking,
        Stage::Dispensing,
    ];

    /// Following stage within a level; `None` after dispensing
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Receiving => Some(Stage::Typing),
            Stage::Typing => Some(Stage::Picking),
            Stage::Picking => Some(Stage::Dispensing),
            Stage::Dispensing => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Receiving => "receiving",
            Stage::Typing => "typing",
            Stage::Picking => "picking",
            Stage::Dispensing => "dispensing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage completion record for the current level
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageProgress {
    pub receiving: bool,
    pub typing: bool,
    pub picking: bool,
    pub dispensing: bool,
}

impl StageProgress {
    pub fn is_complete(&self, stage: Stage) -> bool {
        match stage {
            Stage::Receiving => self.receiving,
            Stage::Typing => self.typing,
            Stage::Picking => self.picking,
            Stage::Dispensing => self.dispensing,
        }
    }

    pub(crate) fn mark(&mut self, stage: Stage) {
        match stage {
            Stage::Receiving => self.receiving = true,
            Stage::Typing => self.typing = true,
            Stage::Picking => self.picking = true,
            Stage::Dispensing => self.dispensing = true,
        }
    }
}

/// Curriculum year the player is practicing
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub enum YearLevel {
    One,
    Two,
    Three,
}

impl YearLevel {
    pub fn number(self) -> u8 {
        match self {
            YearLevel::One => 1,
            YearLevel::Two => 2,
            YearLevel::Three => 3,
        }
    }
}

impl TryFrom<u8> for YearLevel {
    type Error = crate::Error;

    fn try_from(value: u8) -> crate::Result<Self> {
        match value {
            1 => Ok(YearLevel::One),
            2 => Ok(YearLevel::Two),
            3 => Ok(YearLevel::Three),
            other => Err(crate::Error::InvalidYear(other)),
        }
    }
}

impl From<YearLevel> for u8 {
    fn from(year: YearLevel) -> u8 {
        year.number()
    }
}

impl fmt::Display for YearLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Year {}", self.number())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

/// A chapter in a year's curriculum, bound to one prescription
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub year: YearLevel,
    pub chapter: u32,
    pub title: String,
    pub description: String,
    pub prescription_id: String,
    pub difficulty: Difficulty,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Read-only medication and counseling-question lookup
#[derive(Clone, Debug)]
pub struct Catalog {
    pub medications: HashMap<String, Medication>,
    pub questions: Vec<CounselingQuestion>,
}

/// Authored scenarios, prescriptions and the level table
#[derive(Clone, Debug)]
pub struct ContentLibrary {
    pub scenarios: HashMap<String, Scenario>,
    pub prescriptions: HashMap<String, Prescription>,
    pub levels: Vec<Level>,
}
