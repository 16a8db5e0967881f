//! Default catalog of medications and counseling questions.
//!
//! The catalog is read-only reference data. Lookups return `Option` so the
//! front end can render a "not found" fallback instead of failing.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builds the default catalog with the built-in dispensary stock
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalogs.
pub fn build_default_catalog() -> Catalog {
    let mut medications = HashMap::new();

    let stock = vec![
        // ====================================================================
        // Analgesics
        // ====================================================================
        Medication {
            id: "med-001".into(),
            generic_name: "Paracetamol".into(),
            brand_name: Some("Panadol".into()),
            strength: "500mg".into(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Analgesic,
            drug_class: "Analgesic/Antipyretic".into(),
            mechanism_of_action: "Inhibits prostaglandin synthesis in the CNS".into(),
            common_uses: strings(&["Pain relief", "Fever reduction"]),
            side_effects: strings(&["Rare: liver damage with overdose", "Allergic reactions"]),
            counseling_points: strings(&[
                "This is for your pain and fever",
                "Take this only when necessary",
                "Do not exceed recommended dose",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature, away from moisture".into(),
            warnings: strings(&[
                "Do not use if allergic to paracetamol",
                "Avoid alcohol while taking this medication",
            ]),
        },
        Medication {
            id: "med-001b".into(),
            generic_name: "Paracetamol".into(),
            brand_name: None,
            strength: "500mg".into(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Analgesic,
            drug_class: "Analgesic/Antipyretic".into(),
            mechanism_of_action: "Inhibits prostaglandin synthesis in the CNS".into(),
            common_uses: strings(&["Pain relief", "Fever reduction"]),
            side_effects: strings(&["Rare: liver damage with overdose", "Allergic reactions"]),
            counseling_points: strings(&[
                "This is for your pain and fever",
                "Take this only when necessary",
                "Do not exceed 4000mg per day",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature, away from moisture".into(),
            warnings: strings(&[
                "Do not use if allergic to paracetamol",
                "Avoid alcohol while taking this medication",
            ]),
        },
        Medication {
            id: "med-002".into(),
            generic_name: "Ibuprofen".into(),
            brand_name: Some("Nurofen".into()),
            strength: "200mg".into(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Analgesic,
            drug_class: "NSAID (Non-Steroidal Anti-Inflammatory Drug)".into(),
            mechanism_of_action: "Inhibits COX enzymes, reducing prostaglandin production".into(),
            common_uses: strings(&["Pain relief", "Inflammation reduction", "Fever reduction"]),
            side_effects: strings(&["Stomach upset", "Heartburn", "Dizziness"]),
            counseling_points: strings(&[
                "This is for your pain and fever",
                "Take this only when necessary",
                "Take with food to reduce stomach upset",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature".into(),
            warnings: strings(&[
                "Not suitable during pregnancy (third trimester)",
                "Avoid with blood thinners",
            ]),
        },
        // ====================================================================
        // Anti-infectives
        // ====================================================================
        Medication {
            id: "med-003".into(),
            generic_name: "Amoxicillin".into(),
            brand_name: Some("Amoxil".into()),
            strength: "250mg".into(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Antimicrobial,
            drug_class: "Penicillin Antibiotic".into(),
            mechanism_of_action: "Inhibits bacterial cell wall synthesis".into(),
            common_uses: strings(&[
                "Bacterial infections",
                "Respiratory tract infections",
                "Urinary tract infections",
            ]),
            side_effects: strings(&["Diarrhea", "Nausea", "Rash", "Allergic reactions"]),
            counseling_points: strings(&[
                "This is for your infection",
                "Complete the course",
                "Take with or without food",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature".into(),
            warnings: strings(&[
                "Inform doctor if allergic to penicillin",
                "This can cause drowsiness",
            ]),
        },
        Medication {
            id: "med-003b".into(),
            generic_name: "Amoxicillin".into(),
            brand_name: None,
            strength: "500mg".into(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Antimicrobial,
            drug_class: "Penicillin Antibiotic".into(),
            mechanism_of_action: "Inhibits bacterial cell wall synthesis".into(),
            common_uses: strings(&["Bacterial infections", "Respiratory tract infections"]),
            side_effects: strings(&["Diarrhea", "Nausea", "Rash"]),
            counseling_points: strings(&[
                "This is for your infection",
                "Complete the course",
                "Do not stop even if feeling better",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature".into(),
            warnings: strings(&["Report any rash immediately", "This can cause drowsiness"]),
        },
        // ====================================================================
        // Gastrointestinal
        // ====================================================================
        Medication {
            id: "med-004".into(),
            generic_name: "Antacid".into(),
            brand_name: Some("Gaviscon".into()),
            strength: String::new(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Gastrointestinal,
            drug_class: "Antacid".into(),
            mechanism_of_action: "Neutralizes stomach acid".into(),
            common_uses: strings(&["Heartburn", "Indigestion", "Acid reflux"]),
            side_effects: strings(&["Constipation", "Diarrhea", "Chalky taste"]),
            counseling_points: strings(&[
                "This is to protect your stomach",
                "Chew the tablet before swallowing",
                "Take after meals or when symptoms occur",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature".into(),
            warnings: strings(&[
                "Do not take continuously for more than 2 weeks without consulting doctor",
            ]),
        },
        Medication {
            id: "med-008".into(),
            generic_name: "Omeprazole".into(),
            brand_name: Some("Losec".into()),
            strength: "20mg".into(),
            dosage_form: DosageForm::Capsule,
            category: MedicationCategory::Gastrointestinal,
            drug_class: "Proton Pump Inhibitor (PPI)".into(),
            mechanism_of_action: "Blocks the H+/K+ ATPase pump in gastric parietal cells".into(),
            common_uses: strings(&["Gastric ulcers", "GERD", "Acid reflux"]),
            side_effects: strings(&["Headache", "Nausea", "Diarrhea"]),
            counseling_points: strings(&[
                "Take before breakfast for best effect",
                "Swallow whole, do not crush or chew",
                "May take 1-4 days to feel full effect",
            ]),
            packing_unit: Some("cap".into()),
            storage: "Store in original container, protected from moisture".into(),
            warnings: strings(&["Long-term use may affect bone density"]),
        },
        // ====================================================================
        // Respiratory
        // ====================================================================
        Medication {
            id: "med-005".into(),
            generic_name: "Chlorpheniramine".into(),
            brand_name: None,
            strength: "4mg".into(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Respiratory,
            drug_class: "Antihistamine".into(),
            mechanism_of_action: "H1 receptor antagonist, blocks histamine effects".into(),
            common_uses: strings(&["Allergic rhinitis", "Runny nose", "Allergies"]),
            side_effects: strings(&["Drowsiness", "Dry mouth", "Fatigue"]),
            counseling_points: strings(&[
                "This is for runny nose",
                "This may cause drowsiness. Do not drive.",
                "Take only when necessary",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature".into(),
            warnings: strings(&[
                "Avoid alcohol as it may increase drowsiness",
                "Do not take continuously for more than 5 days in a row",
            ]),
        },
        Medication {
            id: "med-006".into(),
            generic_name: "Dextromethorphan".into(),
            brand_name: None,
            strength: "15mg/5ml".into(),
            dosage_form: DosageForm::Syrup,
            category: MedicationCategory::Respiratory,
            drug_class: "Cough Suppressant".into(),
            mechanism_of_action: "Acts on the cough center in the brain".into(),
            common_uses: strings(&["Dry cough", "Cough suppression"]),
            side_effects: strings(&["Drowsiness", "Dizziness", "Nausea"]),
            counseling_points: strings(&[
                "This is for cough",
                "Use when necessary",
                "Shake well before use",
            ]),
            packing_unit: Some("btl".into()),
            storage: "Store at room temperature".into(),
            warnings: strings(&[
                "Do not exceed recommended dose",
                "Avoid with other cough medications",
            ]),
        },
        Medication {
            id: "med-007".into(),
            generic_name: "Salbutamol".into(),
            brand_name: Some("Ventolin".into()),
            strength: "100mcg".into(),
            dosage_form: DosageForm::Inhaler,
            category: MedicationCategory::Respiratory,
            drug_class: "Short-acting Beta-2 Agonist".into(),
            mechanism_of_action: "Relaxes bronchial smooth muscle via beta-2 receptors".into(),
            common_uses: strings(&["Asthma", "Bronchospasm", "COPD"]),
            side_effects: strings(&["Tremor", "Increased heart rate", "Headache"]),
            counseling_points: strings(&[
                "This is to open your airways",
                "Use when necessary",
                "Shake the canister before inhaling",
            ]),
            packing_unit: Some("pc".into()),
            storage: "Store at room temperature, do not puncture or burn".into(),
            warnings: strings(&["If needing more than usual, consult doctor immediately"]),
        },
        Medication {
            id: "med-009".into(),
            generic_name: "Cetirizine".into(),
            brand_name: Some("Zyrtec".into()),
            strength: "10mg".into(),
            dosage_form: DosageForm::Tablet,
            category: MedicationCategory::Respiratory,
            drug_class: "Antihistamine".into(),
            mechanism_of_action: "H1 receptor antagonist, blocks histamine effects".into(),
            common_uses: strings(&["Allergic rhinitis", "Urticaria", "Allergies"]),
            side_effects: strings(&["Drowsiness", "Dry mouth", "Fatigue"]),
            counseling_points: strings(&[
                "May cause drowsiness",
                "Take once daily",
                "Can be taken with or without food",
            ]),
            packing_unit: Some("tab".into()),
            storage: "Store at room temperature".into(),
            warnings: strings(&["Avoid alcohol as it may increase drowsiness"]),
        },
    ];

    for medication in stock {
        medications.insert(medication.id.clone(), medication);
    }

    Catalog {
        medications,
        questions: build_counseling_questions(),
    }
}

fn question(
    id: &str,
    medication_id: &str,
    text: &str,
    options: &[&str],
    correct_answer: usize,
    explanation: &str,
    category: QuestionCategory,
) -> CounselingQuestion {
    CounselingQuestion {
        id: id.into(),
        medication_id: medication_id.into(),
        question: text.into(),
        options: strings(options),
        correct_answer,
        explanation: explanation.into(),
        category,
    }
}

fn build_counseling_questions() -> Vec<CounselingQuestion> {
    use QuestionCategory::*;

    vec![
        // Paracetamol
        question(
            "q-001",
            "med-001",
            "What is this medication for?",
            &[
                "This is for your pain and fever",
                "This is for diabetes",
                "This is for your infection",
                "This is for diarrhoea",
            ],
            0,
            "Paracetamol is used to treat pain and reduce fever.",
            Indication,
        ),
        question(
            "q-002",
            "med-001",
            "How should the patient take this medication?",
            &[
                "Complete the course",
                "Take this only when necessary",
                "Take with meals only",
                "Take before bedtime",
            ],
            1,
            "Paracetamol should be taken only when necessary for pain or fever.",
            Dosage,
        ),
        question(
            "q-001b",
            "med-001b",
            "What is this medication for?",
            &[
                "This is for your pain and fever",
                "This is for diabetes",
                "This is for your infection",
                "This is for diarrhoea",
            ],
            0,
            "Paracetamol is used to treat pain and reduce fever.",
            Indication,
        ),
        question(
            "q-002b",
            "med-001b",
            "What is the maximum daily dose to mention?",
            &[
                "Do not exceed 1000mg per day",
                "There is no maximum",
                "Do not exceed 4000mg per day",
                "Do not exceed 10000mg per day",
            ],
            2,
            "Adults should not exceed 4000mg of paracetamol in 24 hours.",
            Warnings,
        ),
        // Ibuprofen
        question(
            "q-003",
            "med-002",
            "What is this medication for?",
            &[
                "This is for your pain and fever",
                "This is for diabetes",
                "This is for your infection",
                "This is for diarrhoea",
            ],
            0,
            "Ibuprofen is a pain reliever and fever reducer.",
            Indication,
        ),
        question(
            "q-004",
            "med-002",
            "How should the patient take this medication?",
            &[
                "Complete the course",
                "This can cause red eyes",
                "Take this only when necessary",
                "This can cause hearing loss",
            ],
            2,
            "Ibuprofen should be taken only when necessary for pain or fever.",
            Dosage,
        ),
        // Amoxicillin 250mg
        question(
            "q-005",
            "med-003",
            "What is this medication for?",
            &[
                "This is for diabetes",
                "This is for your infection",
                "This is for depression",
                "This is for giddiness",
            ],
            1,
            "Amoxicillin is an antibiotic used to treat bacterial infections.",
            Indication,
        ),
        question(
            "q-006",
            "med-003",
            "What is important to tell the patient about this medication?",
            &[
                "Complete the course",
                "This can cause red eyes",
                "Take only when necessary",
                "This can cause hearing loss",
            ],
            0,
            "It is crucial to complete the full course of antibiotics even if feeling better.",
            Dosage,
        ),
        question(
            "q-006b",
            "med-003",
            "What side effect should you warn the patient about?",
            &[
                "This can cause drowsiness",
                "This can cause red eyes",
                "This can cause hearing loss",
                "This causes weight gain",
            ],
            0,
            "Amoxicillin can cause drowsiness in some patients.",
            SideEffects,
        ),
        // Amoxicillin 500mg
        question(
            "q-007",
            "med-003b",
            "What is this medication for?",
            &[
                "This is for your infection",
                "This is for diabetes",
                "This is for depression",
                "This is for giddiness",
            ],
            0,
            "Amoxicillin is an antibiotic used to treat bacterial infections.",
            Indication,
        ),
        question(
            "q-009",
            "med-003b",
            "How should the patient take this antibiotic?",
            &[
                "Stop when feeling better",
                "Take only when necessary",
                "Skip doses if side effects occur",
                "Complete the course",
            ],
            3,
            "Always complete the full course of antibiotics to prevent resistance.",
            Dosage,
        ),
        // Antacid
        question(
            "q-010",
            "med-004",
            "What is this medication for?",
            &[
                "This is to protect your stomach",
                "This is for your constipation",
                "This is for diarrhoea",
                "This is for cough",
            ],
            0,
            "Antacids neutralize stomach acid and protect the stomach lining.",
            Indication,
        ),
        question(
            "q-011",
            "med-004",
            "How should the patient take this medication?",
            &[
                "This may cause drowsiness",
                "Chew the tablet before swallowing",
                "Complete the course of this medication",
                "Avoid high protein food",
            ],
            1,
            "Antacid tablets should be chewed thoroughly before swallowing for best effect.",
            Dosage,
        ),
        // Chlorpheniramine
        question(
            "q-012",
            "med-005",
            "What is this medication for?",
            &[
                "This is for runny nose",
                "This is for your blocked nose",
                "This is for the inflammation in your sinus",
                "This is to help you sleep",
            ],
            0,
            "Chlorpheniramine is an antihistamine used to treat runny nose and allergies.",
            Indication,
        ),
        question(
            "q-013",
            "med-005",
            "What important warning should you give?",
            &[
                "This is a non-drowsy tablet",
                "This may cause drowsiness. Do not drive.",
                "This is for the pain",
                "Take with grapefruit juice",
            ],
            1,
            "Chlorpheniramine can cause drowsiness, so patients should avoid driving or operating machinery.",
            Warnings,
        ),
        // Dextromethorphan
        question(
            "q-015",
            "med-006",
            "What is this medication for?",
            &[
                "This is for runny nose",
                "This is for pain",
                "This is for cough",
                "This is for constipation",
            ],
            2,
            "Dextromethorphan is a cough suppressant.",
            Indication,
        ),
        question(
            "q-016",
            "med-006",
            "How should the patient take this medication?",
            &[
                "Use when necessary",
                "This may cause sleep loss",
                "Complete the course of this medication",
                "Take with meals only",
            ],
            0,
            "Dextromethorphan should be used when necessary for cough symptoms.",
            Dosage,
        ),
        // Salbutamol
        question(
            "q-017",
            "med-007",
            "What is this medication for?",
            &[
                "This is to open your airways",
                "This is to reduce inflammation in your airways",
                "Rinse your mouth after using",
                "Do not use a spacer with this",
            ],
            0,
            "Salbutamol is a bronchodilator that opens the airways to make breathing easier.",
            Indication,
        ),
        question(
            "q-018",
            "med-007",
            "How should the patient use this inhaler?",
            &[
                "Use regularly",
                "Do not shake the canister before inhaling",
                "Use when necessary",
            ],
            2,
            "Salbutamol is a reliever inhaler used when necessary for breathing difficulties.",
            Dosage,
        ),
        // Omeprazole
        question(
            "q-020",
            "med-008",
            "When should this medication be taken?",
            &["After dinner", "Before breakfast", "With meals", "At bedtime"],
            1,
            "Omeprazole is best taken before breakfast for optimal acid suppression.",
            Dosage,
        ),
        question(
            "q-021",
            "med-008",
            "How should the capsule be taken?",
            &[
                "Swallow whole, do not crush or chew",
                "Chew thoroughly",
                "Dissolve in water",
                "Open capsule and mix with food",
            ],
            0,
            "Omeprazole capsules contain enteric-coated granules and must be swallowed whole.",
            Dosage,
        ),
        // Cetirizine
        question(
            "q-022",
            "med-009",
            "What warning should you give about this medication?",
            &[
                "Always causes severe drowsiness",
                "Never causes drowsiness",
                "May cause drowsiness, avoid driving if affected",
                "Must avoid all activities",
            ],
            2,
            "Cetirizine may cause drowsiness in some patients, affecting ability to drive.",
            Warnings,
        ),
        question(
            "q-023",
            "med-009",
            "How often should this medication be taken?",
            &[
                "Take once daily",
                "Take three times daily",
                "Take only when necessary",
                "Take twice daily",
            ],
            0,
            "Cetirizine is typically taken once daily for allergy relief.",
            Dosage,
        ),
    ]
}

impl Catalog {
    /// Look up a medication by id; `None` is a normal lookup miss
    pub fn lookup_medication(&self, id: &str) -> Option<&Medication> {
        self.medications.get(id)
    }

    /// Counseling questions for a medication, in authored order
    pub fn questions_for_medication(&self, medication_id: &str) -> Vec<&CounselingQuestion> {
        self.questions
            .iter()
            .filter(|q| q.medication_id == medication_id)
            .collect()
    }

    /// Look up a single counseling question by id
    pub fn lookup_question(&self, id: &str) -> Option<&CounselingQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// All medications on one shelf, sorted by id for stable display
    pub fn medications_by_category(&self, category: MedicationCategory) -> Vec<&Medication> {
        let mut meds: Vec<_> = self
            .medications
            .values()
            .filter(|m| m.category == category)
            .collect();
        meds.sort_by(|a, b| a.id.cmp(&b.id));
        meds
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, medication) in &self.medications {
            if id.is_empty() || medication.id.is_empty() {
                errors.push("Medication has empty ID".to_string());
            }
            if id != &medication.id {
                errors.push(format!(
                    "Medication key '{}' doesn't match medication.id '{}'",
                    id, medication.id
                ));
            }
            if medication.generic_name.is_empty() {
                errors.push(format!("Medication '{}' has empty generic name", id));
            }
        }

        for q in &self.questions {
            if !self.medications.contains_key(&q.medication_id) {
                errors.push(format!(
                    "Question '{}' references non-existent medication '{}'",
                    q.id, q.medication_id
                ));
            }
            if q.correct_answer >= q.options.len() {
                errors.push(format!(
                    "Question '{}': correct answer {} out of range ({} options)",
                    q.id,
                    q.correct_answer,
                    q.options.len()
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id.as_str()) {
                errors.push(format!("Duplicate question id '{}'", q.id));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.medications.len(), 11);
        assert!(!catalog.questions.is_empty());
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let catalog = get_default_catalog();
        let ibuprofen = catalog.lookup_medication("med-002").unwrap();
        assert_eq!(ibuprofen.generic_name, "Ibuprofen");
        assert_eq!(ibuprofen.display_name(), "Ibuprofen 200mg (Nurofen)");

        assert!(catalog.lookup_medication("med-999").is_none());
        assert!(catalog.lookup_medication("").is_none());
    }

    #[test]
    fn test_questions_for_medication() {
        let catalog = get_default_catalog();
        let questions = catalog.questions_for_medication("med-003");
        assert_eq!(questions.len(), 3);
        assert!(questions.iter().all(|q| q.medication_id == "med-003"));

        assert!(catalog.questions_for_medication("med-999").is_empty());
    }

    #[test]
    fn test_every_medication_has_counseling_questions() {
        let catalog = get_default_catalog();
        for id in catalog.medications.keys() {
            assert!(
                !catalog.questions_for_medication(id).is_empty(),
                "Medication {} has no counseling questions",
                id
            );
        }
    }

    #[test]
    fn test_medications_by_category_sorted() {
        let catalog = get_default_catalog();
        let respiratory = catalog.medications_by_category(MedicationCategory::Respiratory);
        let ids: Vec<_> = respiratory.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["med-005", "med-006", "med-007", "med-009"]);

        assert!(catalog
            .medications_by_category(MedicationCategory::Endocrine)
            .is_empty());
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_validate_reports_dangling_question() {
        let mut catalog = build_default_catalog();
        catalog.questions.push(question(
            "q-x",
            "med-missing",
            "?",
            &["a"],
            3,
            "",
            QuestionCategory::Dosage,
        ));
        let errors = catalog.validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }
}
