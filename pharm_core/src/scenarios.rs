//! Authored decision scenarios and their integrity rules.
//!
//! Every option of a scenario must map to exactly one consequence. The
//! `correct_action` is the model answer shown as a hint; whether a given
//! choice counts as correct is decided by its consequence alone.

use crate::types::*;
use std::collections::{BTreeMap, BTreeSet};

pub const ALLERGY_CONFLICT: &str = "scenario-allergy-conflict";
pub const EXPIRED_RX: &str = "scenario-expired-rx";
pub const MISSING_SIGNATURE: &str = "scenario-missing-sig";
pub const IDENTITY_MISMATCH: &str = "scenario-identity-mismatch";
pub const INCOMPLETE_DOSAGE: &str = "scenario-incomplete-dosage";
pub const RX3_ALLERGY: &str = "scenario-rx3-allergy";
pub const RX4_DURATION: &str = "scenario-rx4-duration";
pub const IDENTITY_VERIFICATION: &str = "scenario-identity-verification";
pub const SIGNATURE_CHECK: &str = "scenario-signature-check";

impl Scenario {
    /// Consequence bound to an option id, if any
    pub fn consequence(&self, option_id: &str) -> Option<&Consequence> {
        self.consequences.get(option_id)
    }

    pub fn option(&self, option_id: &str) -> Option<&DecisionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// The option flagged as the model answer
    pub fn model_answer(&self) -> Option<&DecisionOption> {
        self.option(&self.correct_action)
    }

    /// Check the scenario's authoring invariants
    ///
    /// Returns a list of problems, or empty Vec if the scenario is sound.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.options.is_empty() {
            errors.push(format!("Scenario '{}' has no options", self.id));
        }

        let mut option_ids = BTreeSet::new();
        for option in &self.options {
            if !option_ids.insert(option.id.as_str()) {
                errors.push(format!(
                    "Scenario '{}' has duplicate option id '{}'",
                    self.id, option.id
                ));
            }
        }

        let consequence_ids: BTreeSet<&str> =
            self.consequences.keys().map(String::as_str).collect();

        for missing in option_ids.difference(&consequence_ids) {
            errors.push(format!(
                "Scenario '{}': option '{}' has no consequence",
                self.id, missing
            ));
        }
        for extra in consequence_ids.difference(&option_ids) {
            errors.push(format!(
                "Scenario '{}': consequence '{}' matches no option",
                self.id, extra
            ));
        }

        if !option_ids.contains(self.correct_action.as_str()) {
            errors.push(format!(
                "Scenario '{}': correct action '{}' is not one of its options",
                self.id, self.correct_action
            ));
        }

        errors
    }
}

struct Choice {
    option: DecisionOption,
    consequence: Consequence,
}

#[allow(clippy::too_many_arguments)]
fn choice(
    id: &str,
    text: &str,
    action: PharmacistAction,
    outcome: &str,
    patient_reaction: &str,
    (score_impact, rx_points_impact): (i64, i64),
    is_correct: bool,
    explanation: &str,
) -> Choice {
    Choice {
        option: DecisionOption {
            id: id.into(),
            text: text.into(),
            action,
        },
        consequence: Consequence {
            outcome: outcome.into(),
            patient_reaction: patient_reaction.into(),
            score_impact,
            rx_points_impact,
            is_correct,
            explanation: explanation.into(),
            should_skip_remaining_stages: false,
        },
    }
}

impl Choice {
    /// A correct answer that settles the whole case at the counter
    fn ends_level(mut self) -> Self {
        self.consequence.should_skip_remaining_stages = true;
        self
    }
}

fn scenario(
    id: &str,
    situation: &str,
    question: &str,
    correct_action: &str,
    choices: Vec<Choice>,
) -> Scenario {
    let mut options = Vec::with_capacity(choices.len());
    let mut consequences = BTreeMap::new();
    for c in choices {
        consequences.insert(c.option.id.clone(), c.consequence);
        options.push(c.option);
    }

    Scenario {
        id: id.into(),
        situation: situation.into(),
        question: question.into(),
        options,
        correct_action: correct_action.into(),
        consequences,
    }
}

/// All built-in scenarios
pub fn build_default_scenarios() -> Vec<Scenario> {
    use PharmacistAction::*;

    vec![
        scenario(
            ALLERGY_CONFLICT,
            "The patient says they have NO drug allergies, but the system shows an allergy to Penicillin. The prescription contains Amoxicillin (a penicillin antibiotic).",
            "What action should you take?",
            "verify",
            vec![
                choice(
                    "proceed",
                    "Proceed with dispensing - patient said no allergies",
                    AcceptRx,
                    "You dispensed the medication. The patient had an allergic reaction and was hospitalized!",
                    "Patient suffers severe allergic reaction",
                    (-100, -50),
                    false,
                    "NEVER dispense when there is an allergy conflict. Always verify with the patient first. Patient safety is paramount!",
                ),
                choice(
                    "verify",
                    "Ask patient to verify the allergy record",
                    AskPatient,
                    "You asked the patient about the Penicillin allergy. Patient remembers: \"Oh yes! I forgot about that. I broke out in rashes last time.\"",
                    "Patient thanks you for being thorough",
                    (100, 50),
                    true,
                    "Excellent! You prevented a potentially dangerous allergic reaction. Always verify discrepancies between patient statements and records.",
                ),
                choice(
                    "call",
                    "Call the doctor to clarify",
                    CallDoctor,
                    "You called the doctor. They confirmed the patient has a penicillin allergy and prescribed an alternative antibiotic.",
                    "Patient appreciates your diligence",
                    (80, 40),
                    true,
                    "Good decision! Calling the doctor is appropriate when there are allergy conflicts. However, asking the patient first would be faster.",
                ),
                choice(
                    "refuse",
                    "Refuse to dispense due to allergy conflict",
                    RefuseRx,
                    "You refused without investigating. The patient left confused and frustrated. Later you found out it was a data entry error - patient has no allergies.",
                    "Patient leaves unhappy and goes to another pharmacy",
                    (-50, -20),
                    false,
                    "Always investigate before refusing. Ask the patient first to verify the allergy record.",
                ),
            ],
        ),
        scenario(
            EXPIRED_RX,
            "The prescription is dated 8 months ago (valid for 6 months only). The patient says: \"The doctor told me I can refill this anytime.\"",
            "What should you do?",
            "explain",
            vec![
                choice(
                    "dispense",
                    "Dispense it - patient says doctor approved",
                    AcceptRx,
                    "You dispensed medication on an expired prescription. The pharmacy failed an audit and received a warning from the regulatory board.",
                    "Patient is happy but you violated regulations",
                    (-80, -40),
                    false,
                    "Expired prescriptions are invalid regardless of what the patient claims. Always follow regulations.",
                ),
                choice(
                    "explain",
                    "Explain to patient that Rx is expired, suggest visiting doctor",
                    AskPatient,
                    "You politely explained the 6-month validity rule and suggested the patient get a new prescription. Patient understood and scheduled a doctor visit.",
                    "Patient initially frustrated but appreciates the explanation",
                    (100, 50),
                    true,
                    "Perfect! Clear communication about regulations while being helpful. You maintained compliance and patient relations.",
                ),
                choice(
                    "call-verify",
                    "Call doctor to verify if refill is still valid",
                    CallDoctor,
                    "Doctor confirmed the medication is still needed but issued a new prescription. Patient received medication after slight delay.",
                    "Patient appreciates the thorough service",
                    (90, 45),
                    true,
                    "Good approach! Calling the doctor can help, but explaining to the patient first is more efficient.",
                ),
                choice(
                    "refuse-firm",
                    "Refuse outright - prescription is expired",
                    RefuseRx,
                    "You refused without explanation. Patient left angry and complained about poor service.",
                    "Patient storms out and posts negative review",
                    (-30, -15),
                    false,
                    "While refusing is correct, you need to explain WHY and offer a solution. Good customer service matters!",
                ),
            ],
        ),
        scenario(
            MISSING_SIGNATURE,
            "The prescription has all required information but the doctor signature field is blank. Patient says: \"I was just at the clinic 10 minutes ago, the doctor must have forgotten to sign.\"",
            "What is the appropriate action?",
            "call-clinic",
            vec![
                choice(
                    "dispense-trust",
                    "Dispense - patient just came from clinic, it's clearly valid",
                    AcceptRx,
                    "You dispensed without a signature. It turned out to be a forged prescription. You are held liable.",
                    "Patient leaves with medication (potential fraud)",
                    (-150, -80),
                    false,
                    "CRITICAL ERROR! A prescription without a signature is INVALID, period. This is a legal requirement to prevent fraud.",
                ),
                choice(
                    "call-clinic",
                    "Call the clinic to verify and ask doctor to sign",
                    CallDoctor,
                    "You called the clinic. Doctor confirmed the prescription and authorized you to dispense while they send a signed copy via email. Crisis averted!",
                    "Patient waits patiently and thanks you",
                    (120, 60),
                    true,
                    "Excellent! You followed protocol while being practical. Verifying with the clinic is the best approach.",
                ),
                choice(
                    "ask-return",
                    "Ask patient to return to clinic for signature",
                    AskPatient,
                    "Patient returned to clinic, got signature, came back. Everything resolved but patient was inconvenienced.",
                    "Patient slightly annoyed but understands",
                    (60, 30),
                    true,
                    "This works but is less efficient. Calling the clinic first could have saved the patient a trip.",
                ),
                choice(
                    "refuse-nosig",
                    "Refuse - no signature means invalid prescription",
                    RefuseRx,
                    "You refused without offering solutions. Patient left frustrated and went to another pharmacy who called the clinic for verification.",
                    "Patient leaves angry and doesn't return",
                    (-20, -10),
                    false,
                    "While you're right about the invalid signature, you should offer to help by calling the clinic. Always try to solve the problem!",
                ),
            ],
        ),
        scenario(
            IDENTITY_MISMATCH,
            "Patient IC on card: S1234567A. Prescription shows: S1234576A (digits transposed). Patient name matches perfectly.",
            "What do you do?",
            "verify-patient",
            vec![
                choice(
                    "proceed-name",
                    "Proceed - name matches, likely a typo",
                    AcceptRx,
                    "You dispensed to the wrong patient! Two patients have the same name. The medication was meant for someone else.",
                    "Wrong patient receives wrong medication",
                    (-120, -70),
                    false,
                    "CRITICAL ERROR! IC number is a unique identifier for a reason. Two people can have the same name, never skip IC verification!",
                ),
                choice(
                    "verify-patient",
                    "Ask patient to verify the correct IC number",
                    AskPatient,
                    "Patient confirmed their IC ends in 67A. You caught a doctor's typo error and prevented wrong patient medication error!",
                    "Patient appreciates your attention to detail",
                    (110, 55),
                    true,
                    "Perfect! Two identifiers (name AND IC) must always match. You caught a critical error!",
                ),
                choice(
                    "call-check",
                    "Call doctor to verify the correct IC",
                    CallDoctor,
                    "Doctor confirmed it was a typo and corrected it. Good catch but took longer than needed.",
                    "Patient waits but appreciates thoroughness",
                    (80, 40),
                    true,
                    "Good approach, but asking the patient first would be faster. The patient has their IC card right there!",
                ),
                choice(
                    "refuse-mismatch",
                    "Refuse - IC numbers don't match exactly",
                    RefuseRx,
                    "You refused without investigating. Patient left confused and had to return to the doctor.",
                    "Patient frustrated by the inconvenience",
                    (-40, -20),
                    false,
                    "While being cautious is good, simply asking the patient to verify could have resolved this quickly.",
                ),
            ],
        ),
        scenario(
            INCOMPLETE_DOSAGE,
            "The prescription says \"Amoxicillin 500mg capsule, 1 cap tds\" but duration is missing. Patient says: \"Doctor said take it for 7 days.\"",
            "How should you handle this?",
            "call-confirm",
            vec![
                choice(
                    "trust-patient",
                    "Add 7 days based on patient information",
                    AcceptRx,
                    "You added 7 days. Later found out doctor actually prescribed 5 days. Patient took antibiotics for too long, increasing resistance risk.",
                    "Patient followed your instructions (incorrect duration)",
                    (-90, -45),
                    false,
                    "Never add information to a prescription based on patient statement alone. Missing info requires doctor verification.",
                ),
                choice(
                    "call-confirm",
                    "Call doctor to confirm the 7-day duration",
                    CallDoctor,
                    "Doctor confirmed 7 days and sent an updated prescription via email. You correctly followed protocol!",
                    "Patient waits but appreciates proper procedure",
                    (100, 50),
                    true,
                    "Excellent! Incomplete prescriptions require doctor clarification. Antibiotic duration is critical - never guess!",
                ),
                choice(
                    "ask-verify",
                    "Ask patient if they have clinic notes or discharge summary",
                    AskPatient,
                    "Patient checked their phone - doctor sent them a message saying \"7 days course\". You called to confirm anyway, which was correct.",
                    "Patient shows phone message, you verify with doctor",
                    (90, 45),
                    true,
                    "Good thinking to check for documentation, but you should still call the doctor for missing prescription info.",
                ),
                choice(
                    "refuse-incomplete",
                    "Refuse - prescription is incomplete",
                    RefuseRx,
                    "You refused without helping. Patient had to return to clinic during work hours, losing time and money.",
                    "Patient very frustrated, leaves negative review",
                    (-50, -25),
                    false,
                    "While the prescription IS incomplete, a good pharmacist would call the doctor to resolve it rather than just refusing.",
                ),
            ],
        ),
        scenario(
            RX3_ALLERGY,
            "The prescription works for Paracetamol 500mg. Patient record shows allergy to Paracetamol. Remarks: \"Patient is allergic to Paracetamol... give the dr a call - intervention\".",
            "You found that the patient is allergic to the prescribed medication. What should you do?",
            "call-doctor-alternative",
            vec![
                choice(
                    "dispense-anyway",
                    "Dispense anyway - doctor knows best",
                    AcceptRx,
                    "You dispensed Paracetamol to an allergic patient. Patient developed severe allergic reaction (anaphylaxis) and was rushed to ER. You are held professionally liable!",
                    "Patient suffers life-threatening allergic reaction",
                    (-200, -100),
                    false,
                    "CRITICAL WARNING: The patient is allergic to Paracetamol! Check the \"Allergies\" field on the Patient Card. Dispensing this could be fatal!",
                ),
                choice(
                    "call-doctor-alternative",
                    "Call doctor to request alternative medication",
                    CallDoctor,
                    "You called the doctor. Doctor confirmed: \"Patient is allergic to Paracetamol, so cannot proceed.\" An alternative was prescribed.",
                    "Patient grateful you prevented a dangerous situation",
                    (150, 75),
                    true,
                    "Model Answer: \"Patient is allergic to Paracetamol, so cannot proceed. (In such instances, usually the staff has to give the dr a call - intervention)\"",
                )
                .ends_level(),
                choice(
                    "ask-patient-confirm",
                    "Ask patient about their Paracetamol allergy",
                    AskPatient,
                    "Patient confirmed: \"Yes, I get terrible rashes from Paracetamol.\" You then refused to dispense and told patient to contact the doctor. Good catch!",
                    "Patient appreciates your diligence",
                    (100, 50),
                    true,
                    "Good verification, but there is a safer and faster way. Hint: Since the allergy is confirmed in the records, calling the doctor for an alternative is the standard procedure.",
                ),
                choice(
                    "refuse-unsafe",
                    "Refuse to dispense - unsafe for patient",
                    RefuseRx,
                    "You refused without helping arrange an alternative. Patient had to make another doctor appointment, delaying treatment.",
                    "Patient left without pain relief, frustrated",
                    (20, 10),
                    false,
                    "Refusing is safe but not helpful. Hint: The patient needs medication. Call the doctor to get a safe alternative instead.",
                ),
            ],
        ),
        scenario(
            RX4_DURATION,
            "Prescription for Antacid tablet, 1 tab tds prn. The duration/quantity field shows \"(missing)\". Remarks: \"1/12\".",
            "The prescription is missing the duration information. What is your action?",
            "call-verify-duration",
            vec![
                choice(
                    "dispense-standard",
                    "Dispense standard 1-month supply - it's a common medication",
                    AcceptRx,
                    "You dispensed 1 month supply without authorization. Doctor only intended 1 week. Patient overused the medication, leading to adverse effects. Pharmacy audit flagged this error.",
                    "Patient took medication as you advised (too long)",
                    (-100, -50),
                    false,
                    "Wait! Look at the \"Duration\" field for the Antacid. It says \"(missing)\". Check the Remarks field or call the doctor to confirm the intended duration.",
                ),
                choice(
                    "call-verify-duration",
                    "Call the prescribing doctor to get the missing duration",
                    CallDoctor,
                    "You called the clinic. Doctor specified \"1/12\" (1 month). You updated the prescription and dispensed correctly.",
                    "Patient waits briefly but receives proper medication",
                    (120, 60),
                    true,
                    "Model Answer: \"1/12\" (1 month). Incomplete prescriptions require prescriber clarification.",
                ),
                choice(
                    "ask-patient-duration",
                    "Ask patient how long they need the medication",
                    AskPatient,
                    "Patient said \"I don't know, how much should I take?\" You realized patient input isn't sufficient and called the doctor anyway.",
                    "Patient doesn't know, waits while you verify",
                    (60, 30),
                    false,
                    "Patients often don't know the clinical details. Hint: If information is missing from the prescription, the doctor is the only one who can officially clarify it.",
                ),
                choice(
                    "refuse-incomplete-rx",
                    "Refuse - prescription is incomplete",
                    RefuseRx,
                    "You refused without attempting to help. Patient left frustrated and had to return to the clinic during work hours.",
                    "Patient very unhappy, leaves negative review",
                    (-60, -30),
                    false,
                    "Refusing closes the door on the patient. Hint: You can solve this! Call the doctor to get the missing details and help the patient.",
                ),
            ],
        ),
        scenario(
            IDENTITY_VERIFICATION,
            "You have TWO patients in the system with the name \"Tan Ah Beng\". One is S0248566J (age 40), the other is S8765432B (age 65). The prescription shows name \"Mr Tan Ah Beng\" but IC is partially illegible.",
            "How do you verify you have the correct patient?",
            "check-both-ids",
            vec![
                choice(
                    "assume-younger",
                    "Assume it's the younger patient (more common)",
                    AcceptRx,
                    "You dispensed to the wrong Tan Ah Beng! The medication was for the 65-year-old with heart condition. The 40-year-old took medication he didn't need. Critical error!",
                    "Wrong patient received wrong medication",
                    (-150, -80),
                    false,
                    "NEVER assume! Two identifiers (name AND IC) must ALWAYS match. This is a fundamental safety requirement.",
                ),
                choice(
                    "check-both-ids",
                    "Ask patient to show IC card and verify the exact number",
                    AskPatient,
                    "Patient showed IC card: S0248566J. You verified both name and IC match, dispensed correctly. Standard proper procedure followed!",
                    "Patient cooperates, no delay",
                    (100, 50),
                    true,
                    "Perfect! Always verify TWO identifiers. Simply asking to see the patient's IC card resolves this instantly.",
                ),
                choice(
                    "call-clinic-verify",
                    "Call the clinic to verify which patient",
                    CallDoctor,
                    "You called the clinic and verified. Correct approach but took extra time when patient had their IC card right there.",
                    "Patient waits while you make unnecessary call",
                    (60, 30),
                    true,
                    "This works but is inefficient. The patient has their IC card - just ask to see it!",
                ),
                choice(
                    "refuse-unclear",
                    "Refuse - IC number is illegible",
                    RefuseRx,
                    "You refused without asking patient for their IC. Patient frustrated when they had their card ready to show.",
                    "Patient leaves annoyed",
                    (-40, -20),
                    false,
                    "Simply asking the patient to verify their IC would have resolved this immediately. Don't refuse without trying to verify first.",
                ),
            ],
        ),
        scenario(
            SIGNATURE_CHECK,
            "The prescription has what looks like a signature, but it's very messy and barely legible. You can't clearly read the doctor's name from the signature. The printed doctor name says \"Dr. Lee Ming\".",
            "What should you do about the unclear signature?",
            "call-verify-signature",
            vec![
                choice(
                    "accept-has-signature",
                    "Accept it - there is a signature present",
                    AcceptRx,
                    "You accepted the prescription. Later discovered it was a forged prescription using a stamp. Pharmacy received regulatory warning for inadequate verification.",
                    "Person obtains controlled medication illegally",
                    (-120, -60),
                    false,
                    "Illegible signatures should always be verified with the clinic, especially for new or controlled medications. Forgeries do happen!",
                ),
                choice(
                    "call-verify-signature",
                    "Call the clinic to verify the prescription is genuine",
                    CallDoctor,
                    "You called the clinic. Receptionist confirmed Dr. Lee did see this patient today and the prescription is genuine. Doctor just has messy handwriting!",
                    "Patient waits patiently, appreciates thoroughness",
                    (110, 55),
                    true,
                    "Excellent! When in doubt, verify. Better to be cautious than to accept a potentially forged prescription.",
                ),
                choice(
                    "ask-patient-clinic",
                    "Ask patient if they came directly from Dr. Lee's clinic",
                    AskPatient,
                    "Patient confirmed they just came from the clinic. You still felt unsure and called to verify anyway. Good instinct!",
                    "Patient confirms, you verify anyway",
                    (80, 40),
                    true,
                    "Good, but patient confirmation isn't sufficient for signature verification. Calling the clinic is the right action.",
                ),
                choice(
                    "refuse-illegible",
                    "Refuse - signature is illegible",
                    RefuseRx,
                    "You refused a genuine prescription because of the doctor's messy handwriting. Patient upset and had to return to clinic.",
                    "Patient very frustrated",
                    (-50, -25),
                    false,
                    "Calling to verify would have been better than outright refusing. Many doctors have messy signatures!",
                ),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(id: &str) -> Scenario {
        build_default_scenarios()
            .into_iter()
            .find(|s| s.id == id)
            .unwrap()
    }

    #[test]
    fn test_consequence_keys_equal_option_ids() {
        for s in build_default_scenarios() {
            let options: BTreeSet<_> = s.options.iter().map(|o| o.id.clone()).collect();
            let keys: BTreeSet<_> = s.consequences.keys().cloned().collect();
            assert_eq!(options, keys, "scenario {}", s.id);
        }
    }

    #[test]
    fn test_default_scenarios_validate() {
        for s in build_default_scenarios() {
            let errors = s.validate();
            assert!(errors.is_empty(), "{}: {:?}", s.id, errors);
            assert!(s.model_answer().is_some());
        }
    }

    #[test]
    fn test_only_rx3_allergy_ends_level() {
        for s in build_default_scenarios() {
            let skipping: Vec<_> = s
                .consequences
                .iter()
                .filter(|(_, c)| c.should_skip_remaining_stages)
                .map(|(id, _)| id.as_str())
                .collect();
            if s.id == RX3_ALLERGY {
                assert_eq!(skipping, vec!["call-doctor-alternative"]);
            } else {
                assert!(skipping.is_empty(), "{} skips: {:?}", s.id, skipping);
            }
        }
    }

    #[test]
    fn test_validate_reports_missing_and_extra_consequences() {
        let mut s = find(ALLERGY_CONFLICT);
        let verify = s.consequences.remove("verify").unwrap();
        s.consequences.insert("ghost".into(), verify);

        let errors = s.validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("'verify' has no consequence")));
        assert!(errors.iter().any(|e| e.contains("'ghost' matches no option")));
    }

    #[test]
    fn test_validate_reports_unknown_correct_action() {
        let mut s = find(EXPIRED_RX);
        s.correct_action = "shrug".into();
        let errors = s.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("correct action 'shrug'"));
    }

    #[test]
    fn test_correctness_is_authored_not_derived() {
        // A non-model answer may still be correct, and a positive delta may
        // still be incorrect.
        let s = find(RX4_DURATION);
        let asked = s.consequence("ask-patient-duration").unwrap();
        assert!(!asked.is_correct);
        assert!(asked.score_impact > 0);

        let a = find(ALLERGY_CONFLICT);
        assert_ne!(a.correct_action, "call");
        assert!(a.consequence("call").unwrap().is_correct);
    }
}
