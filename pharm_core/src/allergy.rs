//! Allergy screening.
//!
//! A prescribed medication conflicts when its generic name contains one of
//! the patient's recorded allergies, ignoring case. Cross-sensitivities
//! (e.g. a penicillin allergy against amoxicillin) are not inferred; those
//! cases are taught through authored scenarios.

use crate::state::SessionState;
use crate::types::{Catalog, Prescription};
use crate::Result;
use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AllergyConflict {
    pub medication_id: String,
    pub generic_name: String,
    pub allergy: String,
}

/// Every medication/allergy pair that matches
///
/// Medications missing from the catalog and blank allergy entries are
/// skipped.
pub fn find_allergy_conflicts(rx: &Prescription, catalog: &Catalog) -> Vec<AllergyConflict> {
    let allergies: Vec<(&str, String)> = rx
        .patient_allergies
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| (a, a.to_lowercase()))
        .collect();

    let mut conflicts = Vec::new();
    for item in &rx.medications {
        let Some(med) = catalog.lookup_medication(&item.medication_id) else {
            tracing::warn!(
                prescription = %rx.id,
                medication = %item.medication_id,
                "Medication not in catalog, skipped in allergy screen"
            );
            continue;
        };
        let generic = med.generic_name.to_lowercase();
        for (raw, lowered) in &allergies {
            if generic.contains(lowered.as_str()) {
                conflicts.push(AllergyConflict {
                    medication_id: med.id.clone(),
                    generic_name: med.generic_name.clone(),
                    allergy: raw.to_string(),
                });
            }
        }
    }
    conflicts
}

pub fn has_allergy_conflict(rx: &Prescription, catalog: &Catalog) -> bool {
    !find_allergy_conflicts(rx, catalog).is_empty()
}

/// Screen the active prescription and raise the session gate on a match
///
/// A clean screen never lowers a flag that is already set.
pub fn screen_session(
    session: &mut SessionState,
    catalog: &Catalog,
) -> Result<Vec<AllergyConflict>> {
    let conflicts = find_allergy_conflicts(session.require_prescription()?, catalog);
    if !conflicts.is_empty() {
        session.set_allergy_conflict_detected(true);
    }
    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::content::get_default_content;
    use crate::types::YearLevel;

    fn rx(id: &str) -> Prescription {
        get_default_content().prescription(id).unwrap().clone()
    }

    #[test]
    fn test_paracetamol_allergy_is_caught() {
        let conflicts = find_allergy_conflicts(&rx("rx-003"), get_default_catalog());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].medication_id, "med-001b");
        assert_eq!(conflicts[0].allergy, "Paracetamol");
    }

    #[test]
    fn test_match_ignores_case() {
        let mut r = rx("rx-005");
        r.patient_allergies = vec!["PARACET".into()];
        assert!(has_allergy_conflict(&r, get_default_catalog()));
    }

    #[test]
    fn test_unrelated_allergy_is_clear() {
        // Paracetamol allergy, Ibuprofen prescribed
        assert!(!has_allergy_conflict(&rx("rx-001"), get_default_catalog()));
    }

    #[test]
    fn test_cross_sensitivity_not_inferred() {
        assert!(!has_allergy_conflict(&rx("rx-008"), get_default_catalog()));
    }

    #[test]
    fn test_blank_allergy_entries_ignored() {
        let mut r = rx("rx-005");
        r.patient_allergies = vec!["".into(), "   ".into()];
        assert!(!has_allergy_conflict(&r, get_default_catalog()));
    }

    #[test]
    fn test_screen_session_sets_flag() {
        let mut s = SessionState::new(YearLevel::Three);
        s.begin_level(rx("rx-003"));

        let conflicts = screen_session(&mut s, get_default_catalog()).unwrap();

        assert_eq!(conflicts.len(), 1);
        assert!(s.allergy_conflict_detected());
    }

    #[test]
    fn test_screen_session_clean_keeps_flag() {
        let mut s = SessionState::new(YearLevel::One);
        s.begin_level(rx("rx-005"));
        s.set_allergy_conflict_detected(true);

        assert!(screen_session(&mut s, get_default_catalog())
            .unwrap()
            .is_empty());
        assert!(s.allergy_conflict_detected());
    }
}
