//! Built-in prescriptions and the level table.
//!
//! Prescriptions are immutable fixtures. Integrity is checked once when the
//! content is validated and again when a prescription is put into play, so an
//! authoring mistake surfaces as an error instead of a silent misgrade.

use crate::scenarios::{self, build_default_scenarios};
use crate::types::*;
use crate::{Error, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Cached default content - built once and reused across all operations
static DEFAULT_CONTENT: Lazy<ContentLibrary> = Lazy::new(build_default_content);

/// Get a reference to the cached default content library
pub fn get_default_content() -> &'static ContentLibrary {
    &DEFAULT_CONTENT
}

impl Prescription {
    /// Medication ids the picking stage must collect, in display order
    pub fn required_medication_ids(&self) -> Vec<&str> {
        self.medications
            .iter()
            .map(|m| m.medication_id.as_str())
            .collect()
    }

    /// First-use integrity check
    pub fn check_integrity(&self) -> Result<()> {
        match (self.is_valid, self.invalid_reason) {
            (false, None) => return Err(Error::MissingInvalidReason(self.id.clone())),
            (true, Some(reason)) => {
                return Err(Error::ContentValidation(format!(
                    "Prescription '{}' is marked valid but carries invalid reason '{}'",
                    self.id, reason
                )))
            }
            _ => {}
        }

        if let Some(scenario) = &self.scenario {
            let errors = scenario.validate();
            if !errors.is_empty() {
                return Err(Error::ContentValidation(errors.join("; ")));
            }
        }

        Ok(())
    }

    /// Validate the prescription against the catalog
    ///
    /// Returns a list of problems, or empty Vec if the fixture is sound.
    pub fn validate(&self, catalog: &Catalog) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = self.check_integrity() {
            errors.push(e.to_string());
        }
        if self.medications.is_empty() {
            errors.push(format!("Prescription '{}' has no medications", self.id));
        }
        for item in &self.medications {
            if catalog.lookup_medication(&item.medication_id).is_none() {
                errors.push(format!(
                    "Prescription '{}' references non-existent medication '{}'",
                    self.id, item.medication_id
                ));
            }
            if item.quantity == 0 {
                errors.push(format!(
                    "Prescription '{}': '{}' has zero quantity",
                    self.id, item.medication_id
                ));
            }
        }

        errors
    }
}

impl ContentLibrary {
    pub fn prescription(&self, id: &str) -> Option<&Prescription> {
        self.prescriptions.get(id)
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.get(id)
    }

    pub fn level(&self, year: YearLevel, chapter: u32) -> Option<&Level> {
        self.levels
            .iter()
            .find(|l| l.year == year && l.chapter == chapter)
    }

    /// Levels of one year in chapter order
    pub fn levels_for_year(&self, year: YearLevel) -> Vec<&Level> {
        let mut levels: Vec<_> = self.levels.iter().filter(|l| l.year == year).collect();
        levels.sort_by_key(|l| l.chapter);
        levels
    }

    /// Prescription a level is played with, checked for integrity
    pub fn prescription_for_level(&self, level: &Level) -> Result<&Prescription> {
        let rx = self
            .prescription(&level.prescription_id)
            .ok_or_else(|| Error::UnknownPrescription(level.prescription_id.clone()))?;
        rx.check_integrity()?;
        Ok(rx)
    }

    /// Validate all authored content for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self, catalog: &Catalog) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, scenario) in &self.scenarios {
            if id != &scenario.id {
                errors.push(format!(
                    "Scenario key '{}' doesn't match scenario.id '{}'",
                    id, scenario.id
                ));
            }
            errors.extend(scenario.validate());
        }

        for (id, rx) in &self.prescriptions {
            if id != &rx.id {
                errors.push(format!(
                    "Prescription key '{}' doesn't match prescription.id '{}'",
                    id, rx.id
                ));
            }
            errors.extend(rx.validate(catalog));
        }

        let mut level_ids = HashSet::new();
        let mut chapters: BTreeMap<YearLevel, Vec<u32>> = BTreeMap::new();
        for level in &self.levels {
            if !level_ids.insert(level.id.as_str()) {
                errors.push(format!("Duplicate level id '{}'", level.id));
            }
            if !self.prescriptions.contains_key(&level.prescription_id) {
                errors.push(format!(
                    "Level '{}' references non-existent prescription '{}'",
                    level.id, level.prescription_id
                ));
            }
            chapters.entry(level.year).or_default().push(level.chapter);
        }

        // Chapters are played 1, 2, 3... so gaps would end a year early
        for (year, mut numbers) in chapters {
            numbers.sort_unstable();
            let expected: Vec<u32> = (1..=numbers.len() as u32).collect();
            if numbers != expected {
                errors.push(format!(
                    "{} chapters are not numbered 1..={}: {:?}",
                    year,
                    expected.len(),
                    numbers
                ));
            }
        }

        errors
    }
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn item(
    medication_id: &str,
    quantity: u32,
    dosage_instruction: &str,
    frequency: &str,
    duration: Option<&str>,
    special_instructions: Option<&str>,
) -> PrescriptionItem {
    PrescriptionItem {
        medication_id: medication_id.into(),
        quantity,
        dosage_instruction: dosage_instruction.into(),
        frequency: frequency.into(),
        duration: duration.map(Into::into),
        special_instructions: special_instructions.map(Into::into),
    }
}

fn build_prescriptions(scenarios: &HashMap<String, Scenario>) -> Vec<Prescription> {
    let attach = |id: &str| scenarios.get(id).cloned();

    vec![
        // Valid: ibuprofen for a patient allergic to paracetamol
        Prescription {
            id: "rx-001".into(),
            patient_name: "Mr Tan Ah Beng".into(),
            patient_ic: "S0248566J".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec!["Paracetamol".into()],
            doctor_name: "Dr William Tan".into(),
            doctor_mcr: Some("M12345A".into()),
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 2, 2),
            medications: vec![item("med-002", 1, "1 tab", "bd", Some("40 tabs"), Some("prn"))],
            is_valid: true,
            invalid_reason: None,
            scenario: None,
        },
        // Valid: three medications
        Prescription {
            id: "rx-002".into(),
            patient_name: "Muhammad Imran".into(),
            patient_ic: "G4500872F".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec![],
            doctor_name: "Dr Chan Yew Chan".into(),
            doctor_mcr: None,
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 4, 11),
            medications: vec![
                item("med-003b", 1, "1 tab", "bd", Some("1/52"), None),
                item("med-005", 1, "1 tab", "on", Some("1/52"), Some("prn")),
                item("med-006", 10, "10ml", "tds", Some("1/52"), Some("prn")),
            ],
            is_valid: true,
            invalid_reason: None,
            scenario: None,
        },
        // Invalid: patient allergic to the prescribed paracetamol
        Prescription {
            id: "rx-003".into(),
            patient_name: "Mr Tan Ah Beng".into(),
            patient_ic: "S0248566J".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec!["Paracetamol".into()],
            doctor_name: "Dr William Tan".into(),
            doctor_mcr: Some("M12345A".into()),
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 2, 2),
            medications: vec![item("med-001b", 2, "2 tabs", "qds", Some("40 tabs"), Some("prn"))],
            is_valid: false,
            invalid_reason: Some(InvalidReason::AllergyConflict),
            scenario: attach(scenarios::RX3_ALLERGY),
        },
        // Invalid: antacid without a duration
        Prescription {
            id: "rx-004".into(),
            patient_name: "Sivanathan Ramasamy".into(),
            patient_ic: "S8023455I".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec![],
            doctor_name: "Dr Ang Ah Ang".into(),
            doctor_mcr: None,
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 11, 28),
            medications: vec![
                item("med-007", 2, "2 puffs", "tds", Some("2 inhalers"), Some("prn")),
                item("med-004", 1, "1 tab", "tds", None, Some("prn")),
            ],
            is_valid: false,
            invalid_reason: Some(InvalidReason::IncompleteDosage),
            scenario: attach(scenarios::RX4_DURATION),
        },
        Prescription {
            id: "rx-005".into(),
            patient_name: "Sarah Tan".into(),
            patient_ic: "S1234567A".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec![],
            doctor_name: "Dr Lee Ming".into(),
            doctor_mcr: None,
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 10, 20),
            medications: vec![item("med-001", 2, "2 tabs", "tds", Some("5 days"), Some("prn"))],
            is_valid: true,
            invalid_reason: None,
            scenario: None,
        },
        Prescription {
            id: "rx-006".into(),
            patient_name: "John Lim".into(),
            patient_ic: "S9876543B".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec!["Penicillin".into()],
            doctor_name: "Dr Wong".into(),
            doctor_mcr: None,
            doctor_signature: false,
            clinic_address: None,
            date: date(2025, 10, 20),
            medications: vec![item("med-002", 1, "1 tab", "bd", Some("7 days"), None)],
            is_valid: false,
            invalid_reason: Some(InvalidReason::MissingSignature),
            scenario: None,
        },
        Prescription {
            id: "rx-007".into(),
            patient_name: "Mary Chen".into(),
            patient_ic: "S5555555C".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec![],
            doctor_name: "Dr Tan".into(),
            doctor_mcr: None,
            doctor_signature: true,
            clinic_address: None,
            date: date(2024, 8, 15),
            medications: vec![item("med-008", 1, "1 cap", "om", Some("30 days"), None)],
            is_valid: false,
            invalid_reason: Some(InvalidReason::ExpiredDate),
            scenario: None,
        },
        // Record says penicillin allergy, patient says none
        Prescription {
            id: "rx-008".into(),
            patient_name: "Lim Mei Ling".into(),
            patient_ic: "S7712345D".into(),
            patient_address: Some("Blk 123 Ang Mo Kio Ave 3".into()),
            patient_dob: date(1977, 3, 14),
            patient_allergies: vec!["Penicillin".into()],
            doctor_name: "Dr Chan Yew Chan".into(),
            doctor_mcr: None,
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 9, 3),
            medications: vec![item("med-003", 1, "1 tab", "tds", Some("1/52"), None)],
            is_valid: false,
            invalid_reason: Some(InvalidReason::AllergyConflict),
            scenario: attach(scenarios::ALLERGY_CONFLICT),
        },
        // IC digits transposed on the prescription
        Prescription {
            id: "rx-009".into(),
            patient_name: "Sarah Tan".into(),
            patient_ic: "S1234576A".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec![],
            doctor_name: "Dr Lee Ming".into(),
            doctor_mcr: None,
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 10, 20),
            medications: vec![item("med-009", 1, "1 tab", "on", Some("1/52"), None)],
            is_valid: false,
            invalid_reason: Some(InvalidReason::PatientMismatch),
            scenario: attach(scenarios::IDENTITY_MISMATCH),
        },
        // Unsigned, patient has just come from the clinic
        Prescription {
            id: "rx-010".into(),
            patient_name: "Ahmad Rahman".into(),
            patient_ic: "S6654321E".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec![],
            doctor_name: "Dr Wong".into(),
            doctor_mcr: None,
            doctor_signature: false,
            clinic_address: Some("Toa Payoh Family Clinic".into()),
            date: date(2025, 10, 20),
            medications: vec![item("med-004", 1, "1 tab", "tds", Some("1/52"), Some("prn"))],
            is_valid: false,
            invalid_reason: Some(InvalidReason::MissingSignature),
            scenario: attach(scenarios::MISSING_SIGNATURE),
        },
        // Messy but genuine signature
        Prescription {
            id: "rx-011".into(),
            patient_name: "Grace Ong".into(),
            patient_ic: "S8801234F".into(),
            patient_address: None,
            patient_dob: None,
            patient_allergies: vec![],
            doctor_name: "Dr Lee Ming".into(),
            doctor_mcr: None,
            doctor_signature: true,
            clinic_address: None,
            date: date(2025, 10, 20),
            medications: vec![
                item("med-007", 2, "2 puffs", "qds or prn", Some("1 inhaler"), None),
                item("med-009", 1, "1 tab", "om", Some("1/12"), None),
            ],
            is_valid: true,
            invalid_reason: None,
            scenario: attach(scenarios::SIGNATURE_CHECK),
        },
    ]
}

fn level(
    id: &str,
    year: YearLevel,
    chapter: u32,
    title: &str,
    description: &str,
    prescription_id: &str,
    difficulty: Difficulty,
) -> Level {
    Level {
        id: id.into(),
        year,
        chapter,
        title: title.into(),
        description: description.into(),
        prescription_id: prescription_id.into(),
        difficulty,
    }
}

#[rustfmt::skip]
fn build_levels() -> Vec<Level> {
    use Difficulty::*;
    use YearLevel::*;

    vec![
        level("level-1-1", One, 1, "First Day Fundamentals", "Learn the basics of prescription validation", "rx-005", Basic),
        level("level-1-2", One, 2, "Spot the Missing Signature", "Identify invalid prescriptions", "rx-006", Basic),
        level("level-1-3", One, 3, "Date Detective", "Check prescription dates carefully", "rx-007", Basic),
        level("level-1-4", One, 4, "Allergy Alert", "Watch out for patient allergies", "rx-001", Basic),
        level("level-2-1", Two, 1, "Multiple Medications", "Handle prescriptions with multiple drugs", "rx-002", Intermediate),
        level("level-2-2", Two, 2, "Incomplete Information", "Identify missing prescription details", "rx-004", Intermediate),
        level("level-2-3", Two, 3, "Who Is This For?", "Match both patient identifiers", "rx-009", Intermediate),
        level("level-2-4", Two, 4, "Fresh From the Clinic", "Handle an unsigned prescription without turning the patient away", "rx-010", Intermediate),
        level("level-3-1", Three, 1, "Allergy Conflict", "Critical thinking - patient allergic to prescribed medication", "rx-003", Advanced),
        level("level-3-2", Three, 2, "Complex Multi-Drug Therapy", "Manage respiratory and infection treatments", "rx-002", Advanced),
        level("level-3-3", Three, 3, "Records Versus Recall", "Resolve a conflict between the allergy record and the patient", "rx-008", Advanced),
        level("level-3-4", Three, 4, "Doctor's Handwriting", "Verify a barely legible signature", "rx-011", Advanced),
    ]
}

/// Builds the default content library
///
/// **Note**: For production use, prefer `get_default_content()`.
pub fn build_default_content() -> ContentLibrary {
    let scenarios: HashMap<String, Scenario> = build_default_scenarios()
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();

    let prescriptions = build_prescriptions(&scenarios)
        .into_iter()
        .map(|rx| (rx.id.clone(), rx))
        .collect();

    ContentLibrary {
        scenarios,
        prescriptions,
        levels: build_levels(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;

    #[test]
    fn test_default_content_validates() {
        let content = build_default_content();
        let errors = content.validate(get_default_catalog());
        assert!(
            errors.is_empty(),
            "Default content has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_invalid_reason_present_iff_invalid() {
        let content = get_default_content();
        for rx in content.prescriptions.values() {
            assert_eq!(rx.is_valid, rx.invalid_reason.is_none(), "{}", rx.id);
        }
    }

    #[test]
    fn test_scenario_correct_action_is_own_option() {
        let content = get_default_content();
        for rx in content.prescriptions.values() {
            if let Some(s) = &rx.scenario {
                assert!(s.option(&s.correct_action).is_some(), "{}", rx.id);
            }
        }
    }

    #[test]
    fn test_levels_for_year_in_chapter_order() {
        let content = get_default_content();
        for year in [YearLevel::One, YearLevel::Two, YearLevel::Three] {
            let chapters: Vec<_> = content
                .levels_for_year(year)
                .iter()
                .map(|l| l.chapter)
                .collect();
            assert_eq!(chapters, vec![1, 2, 3, 4], "{}", year);
        }
        assert_eq!(
            content.level(YearLevel::One, 3).unwrap().prescription_id,
            "rx-007"
        );
        assert!(content.level(YearLevel::One, 5).is_none());
    }

    #[test]
    fn test_missing_invalid_reason_fails_on_first_use() {
        let mut content = build_default_content();
        content
            .prescriptions
            .get_mut("rx-006")
            .unwrap()
            .invalid_reason = None;

        let level = content.level(YearLevel::One, 2).unwrap().clone();
        let err = content.prescription_for_level(&level).unwrap_err();
        assert!(matches!(err, Error::MissingInvalidReason(ref id) if id == "rx-006"));

        let errors = content.validate(get_default_catalog());
        assert_eq!(errors.len(), 1, "{:?}", errors);
    }

    #[test]
    fn test_validate_reports_dangling_references() {
        let mut content = build_default_content();
        content.levels.push(level(
            "level-1-9",
            YearLevel::One,
            9,
            "Ghost",
            "",
            "rx-404",
            Difficulty::Basic,
        ));
        content
            .prescriptions
            .get_mut("rx-005")
            .unwrap()
            .medications
            .push(item("med-404", 1, "1 tab", "om", None, None));

        let errors = content.validate(get_default_catalog());
        assert!(errors.iter().any(|e| e.contains("rx-404")), "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("med-404")), "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("Year 1 chapters")), "{:?}", errors);
    }

    #[test]
    fn test_unknown_prescription_for_level() {
        let content = get_default_content();
        let ghost = level("x", YearLevel::Two, 1, "", "", "rx-404", Difficulty::Basic);
        assert!(matches!(
            content.prescription_for_level(&ghost),
            Err(Error::UnknownPrescription(_))
        ));
    }
}
