//! Stage state machine and rank ladder.
//!
//! A level walks receiving → typing → picking → dispensing. Advancing out
//! of dispensing rolls over into the next chapter at receiving with a clean
//! progress record. Rank is derived from lifetime rx points, never stored.

use crate::state::SessionState;
use crate::types::{Stage, StageProgress};
use serde::Serialize;
use std::fmt;

/// Title shown for the player's rx-point total
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    PharmacyTrainee,
    JuniorPharmacist,
    Pharmacist,
    SeniorPharmacist,
    ChiefPharmacist,
}

impl Rank {
    pub fn for_points(rx_points: i64) -> Rank {
        match rx_points {
            p if p < 100 => Rank::PharmacyTrainee,
            p if p < 300 => Rank::JuniorPharmacist,
            p if p < 600 => Rank::Pharmacist,
            p if p < 1000 => Rank::SeniorPharmacist,
            _ => Rank::ChiefPharmacist,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Rank::PharmacyTrainee => "Pharmacy Trainee",
            Rank::JuniorPharmacist => "Junior Pharmacist",
            Rank::Pharmacist => "Pharmacist",
            Rank::SeniorPharmacist => "Senior Pharmacist",
            Rank::ChiefPharmacist => "Chief Pharmacist",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl SessionState {
    /// Move to the next stage and return it
    ///
    /// From dispensing this starts the next chapter: level is incremented,
    /// stage returns to receiving and all progress flags are cleared.
    pub fn advance(&mut self) -> Stage {
        match self.stage.next() {
            Some(next) => {
                tracing::debug!(
                    session = %self.id,
                    from = %self.stage,
                    to = %next,
                    "Stage advanced"
                );
                self.stage = next;
            }
            None => {
                self.level += 1;
                self.stage = Stage::Receiving;
                self.progress = StageProgress::default();
                tracing::info!(session = %self.id, level = self.level, "Level rolled over");
            }
        }
        self.stage
    }

    /// Restart the current level from receiving
    ///
    /// Level score is zeroed; level and rx points are kept.
    pub fn reset(&mut self) {
        self.stage = Stage::Receiving;
        self.score = 0;
        self.progress = StageProgress::default();
        self.selected_medications.clear();
        self.allergy_conflict_detected = false;
        tracing::debug!(session = %self.id, level = self.level, "Session reset");
    }

    /// Idempotent; does not move the stage
    pub fn mark_stage_complete(&mut self, stage: Stage) {
        self.progress.mark(stage);
    }

    /// End the chapter early after a scenario that stops the prescription
    pub fn complete_level(&mut self) {
        self.level += 1;
        self.stage = Stage::Receiving;
        self.progress = StageProgress::default();
        tracing::info!(session = %self.id, level = self.level, "Level completed early");
    }

    /// Send the prescription back to receiving without losing the level
    ///
    /// Used from picking when an allergy block means the conflict has to be
    /// resolved at the counter first.
    pub fn return_to_receiving(&mut self) {
        self.stage = Stage::Receiving;
        tracing::debug!(session = %self.id, "Returned to receiving");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::YearLevel;

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(Rank::for_points(-50), Rank::PharmacyTrainee);
        assert_eq!(Rank::for_points(0), Rank::PharmacyTrainee);
        assert_eq!(Rank::for_points(99), Rank::PharmacyTrainee);
        assert_eq!(Rank::for_points(100), Rank::JuniorPharmacist);
        assert_eq!(Rank::for_points(299), Rank::JuniorPharmacist);
        assert_eq!(Rank::for_points(300), Rank::Pharmacist);
        assert_eq!(Rank::for_points(600), Rank::SeniorPharmacist);
        assert_eq!(Rank::for_points(999), Rank::SeniorPharmacist);
        assert_eq!(Rank::for_points(1000), Rank::ChiefPharmacist);
        assert_eq!(Rank::ChiefPharmacist.to_string(), "Chief Pharmacist");
    }

    #[test]
    fn test_advance_walks_stages_then_rolls_over() {
        let mut s = SessionState::new(YearLevel::One);
        assert_eq!(s.advance(), Stage::Typing);
        assert_eq!(s.advance(), Stage::Picking);
        assert_eq!(s.advance(), Stage::Dispensing);
        assert_eq!(s.level(), 1);

        s.mark_stage_complete(Stage::Dispensing);
        assert_eq!(s.advance(), Stage::Receiving);
        assert_eq!(s.level(), 2);
        assert_eq!(s.stage_progress(), StageProgress::default());
    }

    #[test]
    fn test_reset_zeroes_score_keeps_points_and_level() {
        let mut s = SessionState::new(YearLevel::One);
        s.apply_deltas(50, 30);
        s.advance();
        s.advance();
        s.mark_stage_complete(Stage::Receiving);
        s.set_allergy_conflict_detected(true);

        s.reset();

        assert_eq!(s.stage(), Stage::Receiving);
        assert_eq!(s.level(), 1);
        assert_eq!(s.rx_points(), 30);
        assert_eq!(s.score(), 0);
        assert!(!s.allergy_conflict_detected());
        assert!(!s.stage_progress().is_complete(Stage::Receiving));
    }

    #[test]
    fn test_mark_stage_complete_is_idempotent() {
        let mut s = SessionState::new(YearLevel::One);
        s.mark_stage_complete(Stage::Typing);
        let once = s.stage_progress();
        s.mark_stage_complete(Stage::Typing);
        assert_eq!(s.stage_progress(), once);
        assert!(once.typing);
        assert!(!once.receiving);
        assert_eq!(s.stage(), Stage::Receiving);
    }

    #[test]
    fn test_complete_level_skips_remaining_stages() {
        let mut s = SessionState::new(YearLevel::Three);
        s.mark_stage_complete(Stage::Receiving);
        s.complete_level();
        assert_eq!(s.level(), 2);
        assert_eq!(s.stage(), Stage::Receiving);
        assert!(!s.stage_progress().receiving);
    }

    #[test]
    fn test_return_to_receiving_only_moves_stage() {
        let mut s = SessionState::new(YearLevel::One);
        s.apply_deltas(20, 10);
        s.mark_stage_complete(Stage::Receiving);
        s.advance();
        s.advance();
        s.set_allergy_conflict_detected(true);

        s.return_to_receiving();

        assert_eq!(s.stage(), Stage::Receiving);
        assert_eq!(s.level(), 1);
        assert_eq!(s.score(), 20);
        assert!(s.stage_progress().receiving);
        assert!(s.allergy_conflict_detected());
    }
}
