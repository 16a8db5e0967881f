//! Valid/invalid call for prescriptions without an authored scenario.
//!
//! The player declares the prescription valid, or invalid with a reason.
//! Naming the specific defect pays more than a plain "valid" verdict.

use crate::config::{Reward, RewardsConfig};
use crate::engine::Continuation;
use crate::state::SessionState;
use crate::types::InvalidReason;
use crate::{Error, Result};
use serde::Serialize;

/// Graded validation call
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub is_correct: bool,
    /// Zero on a wrong call
    pub reward: Reward,
    pub feedback: String,
    /// Never `LevelComplete`
    pub continuation: Continuation,
}

/// Grade the player's validity call against the active prescription
///
/// A call of "invalid" with no reason is a wrong call, not an error.
pub fn submit_validation(
    session: &mut SessionState,
    rewards: &RewardsConfig,
    declared_valid: bool,
    declared_reason: Option<InvalidReason>,
) -> Result<ValidationOutcome> {
    let rx = session.require_prescription()?;
    if rx.scenario.is_some() {
        return Err(Error::ScenarioPresent(rx.id.clone()));
    }
    if !rx.is_valid && rx.invalid_reason.is_none() {
        return Err(Error::MissingInvalidReason(rx.id.clone()));
    }

    let rx_id = rx.id.clone();
    let expected_reason = rx.invalid_reason;

    let outcome = match (rx.is_valid, declared_valid) {
        (true, true) => ValidationOutcome {
            is_correct: true,
            reward: rewards.validation_verdict,
            feedback: "Correct. The prescription is complete and can be processed.".into(),
            continuation: Continuation::AdvanceStage,
        },
        (true, false) => ValidationOutcome {
            is_correct: false,
            reward: Reward::new(0, 0),
            feedback: "Look again. Every required field on this prescription is in order.".into(),
            continuation: Continuation::Retry,
        },
        (false, true) => ValidationOutcome {
            is_correct: false,
            reward: Reward::new(0, 0),
            feedback: "This prescription has a problem that must be caught before dispensing."
                .into(),
            continuation: Continuation::Retry,
        },
        (false, false) if declared_reason.is_some() && declared_reason == expected_reason => {
            ValidationOutcome {
                is_correct: true,
                reward: rewards.validation_reason,
                feedback: format!(
                    "Correct. The prescription is invalid: {}.",
                    describe(declared_reason)
                ),
                continuation: Continuation::AdvanceStage,
            }
        }
        (false, false) => ValidationOutcome {
            is_correct: false,
            reward: Reward::new(0, 0),
            feedback: format!(
                "It is invalid, but not because of {}.",
                describe(declared_reason)
            ),
            continuation: Continuation::Retry,
        },
    };

    session.apply_deltas(outcome.reward.score, outcome.reward.rx_points);
    if outcome.is_correct && expected_reason == Some(InvalidReason::AllergyConflict) {
        session.set_allergy_conflict_detected(false);
    }

    tracing::info!(
        session = %session.id(),
        prescription = %rx_id,
        declared_valid,
        declared_reason = ?declared_reason,
        correct = outcome.is_correct,
        "Validation submitted"
    );

    Ok(outcome)
}

fn describe(reason: Option<InvalidReason>) -> String {
    match reason {
        Some(r) => r.code().replace('-', " "),
        None => "an unnamed reason".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::get_default_content;
    use crate::types::YearLevel;

    fn session_with(rx_id: &str) -> SessionState {
        let mut s = SessionState::new(YearLevel::One);
        s.begin_level(get_default_content().prescription(rx_id).unwrap().clone());
        s
    }

    #[test]
    fn test_expired_rx_with_right_reason() {
        let mut s = session_with("rx-007");
        let rewards = RewardsConfig::default();

        let out =
            submit_validation(&mut s, &rewards, false, Some(InvalidReason::ExpiredDate)).unwrap();

        assert!(out.is_correct);
        assert_eq!(out.continuation, Continuation::AdvanceStage);
        assert_eq!(s.score(), 80);
        assert_eq!(s.rx_points(), 40);
    }

    #[test]
    fn test_expired_rx_with_wrong_reason() {
        let mut s = session_with("rx-007");
        let rewards = RewardsConfig::default();

        let out = submit_validation(
            &mut s,
            &rewards,
            false,
            Some(InvalidReason::MissingSignature),
        )
        .unwrap();

        assert!(!out.is_correct);
        assert_eq!(out.reward, Reward::new(0, 0));
        assert_eq!(out.continuation, Continuation::Retry);
        assert_eq!(s.score(), 0);
        assert_eq!(s.rx_points(), 0);
    }

    #[test]
    fn test_invalid_without_reason_is_wrong() {
        let mut s = session_with("rx-007");
        let out = submit_validation(&mut s, &RewardsConfig::default(), false, None).unwrap();
        assert!(!out.is_correct);
    }

    #[test]
    fn test_valid_rx_declared_invalid_is_always_wrong() {
        let rewards = RewardsConfig::default();
        for reason in InvalidReason::ALL.into_iter().map(Some).chain([None]) {
            let mut s = session_with("rx-005");
            let out = submit_validation(&mut s, &rewards, false, reason).unwrap();
            assert!(!out.is_correct, "{:?}", reason);
            assert_eq!(s.score(), 0);
        }
    }

    #[test]
    fn test_valid_rx_declared_valid() {
        let mut s = session_with("rx-005");
        let out = submit_validation(&mut s, &RewardsConfig::default(), true, None).unwrap();
        assert!(out.is_correct);
        assert_eq!(out.reward, Reward::new(50, 30));
        assert_eq!(s.rx_points(), 30);
    }

    #[test]
    fn test_scenario_prescription_is_rejected() {
        let mut s = session_with("rx-008");
        let err = submit_validation(&mut s, &RewardsConfig::default(), true, None).unwrap_err();
        assert!(matches!(err, Error::ScenarioPresent(ref id) if id == "rx-008"));
    }

    #[test]
    fn test_no_prescription() {
        let mut s = SessionState::new(YearLevel::One);
        let err = submit_validation(&mut s, &RewardsConfig::default(), true, None).unwrap_err();
        assert!(matches!(err, Error::NoActivePrescription));
    }

    #[test]
    fn test_invalid_fixture_without_reason_is_an_error() {
        let mut rx = get_default_content().prescription("rx-007").unwrap().clone();
        rx.invalid_reason = None;
        let mut s = SessionState::new(YearLevel::One);
        s.begin_level(rx);

        let err = submit_validation(&mut s, &RewardsConfig::default(), false, None).unwrap_err();
        assert!(matches!(err, Error::MissingInvalidReason(_)));
    }

    #[test]
    fn test_correct_allergy_call_clears_flag() {
        let mut rx = get_default_content().prescription("rx-003").unwrap().clone();
        rx.scenario = None;
        let mut s = SessionState::new(YearLevel::One);
        s.begin_level(rx);
        s.set_allergy_conflict_detected(true);

        let out = submit_validation(
            &mut s,
            &RewardsConfig::default(),
            false,
            Some(InvalidReason::AllergyConflict),
        )
        .unwrap();

        assert!(out.is_correct);
        assert!(!s.allergy_conflict_detected());
    }
}
