//! Scenario resolver.
//!
//! Maps a chosen option to its authored consequence, applies the deltas and
//! tells the caller how play continues. The resolver never moves the stage;
//! `Game::apply` (or any other front end) acts on the [`Continuation`].

use crate::state::SessionState;
use crate::types::{Consequence, Scenario};
use crate::{Error, Result};
use serde::Serialize;

/// What the caller should do after showing an outcome
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    /// Move to the next stage
    AdvanceStage,
    /// Stay; discard partial investigation and try again
    Retry,
    /// The prescription stops here; skip to the next chapter
    LevelComplete,
}

impl Continuation {
    /// Derived from correctness and the skip flag only
    pub fn for_consequence(consequence: &Consequence) -> Continuation {
        match (consequence.is_correct, consequence.should_skip_remaining_stages) {
            (true, true) => Continuation::LevelComplete,
            (true, false) => Continuation::AdvanceStage,
            (false, _) => Continuation::Retry,
        }
    }
}

/// A resolved decision
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Resolution {
    pub option_id: String,
    pub consequence: Consequence,
    pub continuation: Continuation,
}

/// Resolve the player's choice in a scenario
///
/// Unknown option ids fail with [`Error::InvalidOption`] and leave the
/// session untouched.
pub fn resolve(
    session: &mut SessionState,
    scenario: &Scenario,
    option_id: &str,
) -> Result<Resolution> {
    let consequence = scenario
        .consequence(option_id)
        .ok_or_else(|| Error::InvalidOption {
            scenario_id: scenario.id.clone(),
            option_id: option_id.to_string(),
        })?;

    session.apply_deltas(consequence.score_impact, consequence.rx_points_impact);
    let continuation = Continuation::for_consequence(consequence);

    tracing::info!(
        session = %session.id(),
        scenario = %scenario.id,
        option = option_id,
        correct = consequence.is_correct,
        ?continuation,
        "Scenario resolved"
    );

    Ok(Resolution {
        option_id: option_id.to_string(),
        consequence: consequence.clone(),
        continuation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::get_default_content;
    use crate::scenarios::{self, build_default_scenarios};
    use crate::types::YearLevel;

    fn scenario(id: &str) -> Scenario {
        get_default_content().scenario(id).unwrap().clone()
    }

    #[test]
    fn test_allergy_conflict_verify_is_rewarded() {
        let mut s = SessionState::new(YearLevel::One);
        let sc = scenario(scenarios::ALLERGY_CONFLICT);

        let res = resolve(&mut s, &sc, "verify").unwrap();

        assert!(res.consequence.is_correct);
        assert_eq!(res.continuation, Continuation::AdvanceStage);
        assert_eq!(s.score(), 100);
        assert_eq!(s.rx_points(), 50);
    }

    #[test]
    fn test_allergy_conflict_proceed_is_penalised() {
        let mut s = SessionState::new(YearLevel::One);
        let sc = scenario(scenarios::ALLERGY_CONFLICT);

        let res = resolve(&mut s, &sc, "proceed").unwrap();

        assert!(!res.consequence.is_correct);
        assert_eq!(res.continuation, Continuation::Retry);
        assert_eq!(s.score(), -100);
        assert_eq!(s.rx_points(), -50);
    }

    #[test]
    fn test_skip_flag_completes_level() {
        let mut s = SessionState::new(YearLevel::Three);
        let sc = scenario(scenarios::RX3_ALLERGY);

        let res = resolve(&mut s, &sc, "call-doctor-alternative").unwrap();

        assert_eq!(res.continuation, Continuation::LevelComplete);
        assert_eq!(s.score(), 150);
        assert_eq!(s.rx_points(), 75);
    }

    #[test]
    fn test_positive_delta_can_still_be_incorrect() {
        let mut s = SessionState::new(YearLevel::Two);
        let sc = scenario(scenarios::RX4_DURATION);

        let res = resolve(&mut s, &sc, "ask-patient-duration").unwrap();

        assert!(!res.consequence.is_correct);
        assert_eq!(res.continuation, Continuation::Retry);
        assert_eq!(s.score(), 60);
    }

    #[test]
    fn test_unknown_option_does_not_mutate() {
        let mut s = SessionState::new(YearLevel::One);
        let sc = scenario(scenarios::ALLERGY_CONFLICT);

        let err = resolve(&mut s, &sc, "shrug").unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidOption { ref option_id, .. } if option_id == "shrug"
        ));
        assert_eq!(s.score(), 0);
        assert_eq!(s.rx_points(), 0);
    }

    #[test]
    fn test_resolve_applies_exactly_the_authored_consequence() {
        for sc in build_default_scenarios() {
            for option in &sc.options {
                let mut s = SessionState::new(YearLevel::One);
                let res = resolve(&mut s, &sc, &option.id).unwrap();
                let authored = &sc.consequences[&option.id];

                assert_eq!(&res.consequence, authored, "{}/{}", sc.id, option.id);
                assert_eq!(s.score(), authored.score_impact);
                assert_eq!(s.rx_points(), authored.rx_points_impact);
                assert_eq!(s.stage(), crate::Stage::Receiving);
            }
        }
    }

    #[test]
    fn test_continuation_mapping() {
        let mut c = Consequence {
            outcome: String::new(),
            patient_reaction: String::new(),
            score_impact: 0,
            rx_points_impact: 0,
            is_correct: false,
            explanation: String::new(),
            should_skip_remaining_stages: true,
        };
        assert_eq!(Continuation::for_consequence(&c), Continuation::Retry);
        c.is_correct = true;
        assert_eq!(Continuation::for_consequence(&c), Continuation::LevelComplete);
        c.should_skip_remaining_stages = false;
        assert_eq!(Continuation::for_consequence(&c), Continuation::AdvanceStage);
    }
}
