//! In-memory session state for one player.
//!
//! Fields are private: the stage machine (`progression`), the scenario
//! resolver (`engine`), the validation mini-game and the stage desks are the
//! only writers. The presentation layer reads a [`SessionSnapshot`].

use crate::progression::Rank;
use crate::types::{Prescription, Stage, StageProgress, YearLevel};
use serde::Serialize;
use uuid::Uuid;

/// Mutable state of a play session
#[derive(Clone, Debug)]
pub struct SessionState {
    pub(crate) id: Uuid,
    pub(crate) year: YearLevel,
    pub(crate) stage: Stage,
    pub(crate) level: u32,
    pub(crate) score: i64,
    pub(crate) rx_points: i64,
    pub(crate) prescription: Option<Prescription>,
    pub(crate) selected_medications: Vec<String>,
    pub(crate) allergy_conflict_detected: bool,
    pub(crate) progress: StageProgress,
}

/// Plain-data view of the session for display
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub year: u8,
    pub level: u32,
    pub stage: Stage,
    pub score: i64,
    pub rx_points: i64,
    pub rank: Rank,
    pub prescription_id: Option<String>,
    pub selected_medications: Vec<String>,
    pub allergy_conflict_detected: bool,
    pub stage_progress: StageProgress,
}

impl SessionState {
    /// Fresh session at chapter 1 of `year`, no prescription loaded
    pub fn new(year: YearLevel) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, %year, "New session");
        Self {
            id,
            year,
            stage: Stage::Receiving,
            level: 1,
            score: 0,
            rx_points: 0,
            prescription: None,
            selected_medications: Vec::new(),
            allergy_conflict_detected: false,
            progress: StageProgress::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn year(&self) -> YearLevel {
        self.year
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn rx_points(&self) -> i64 {
        self.rx_points
    }

    pub fn rank(&self) -> Rank {
        Rank::for_points(self.rx_points)
    }

    pub fn prescription(&self) -> Option<&Prescription> {
        self.prescription.as_ref()
    }

    pub fn selected_medications(&self) -> &[String] {
        &self.selected_medications
    }

    pub fn allergy_conflict_detected(&self) -> bool {
        self.allergy_conflict_detected
    }

    pub fn stage_progress(&self) -> StageProgress {
        self.progress
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            year: self.year.number(),
            level: self.level,
            stage: self.stage,
            score: self.score,
            rx_points: self.rx_points,
            rank: self.rank(),
            prescription_id: self.prescription.as_ref().map(|rx| rx.id.clone()),
            selected_medications: self.selected_medications.clone(),
            allergy_conflict_detected: self.allergy_conflict_detected,
            stage_progress: self.progress,
        }
    }

    /// Raise or clear the allergy gate for the rest of the level
    pub fn set_allergy_conflict_detected(&mut self, detected: bool) {
        if self.allergy_conflict_detected != detected {
            tracing::info!(session = %self.id, detected, "Allergy conflict flag changed");
        }
        self.allergy_conflict_detected = detected;
    }

    /// Add or remove a medication from the picking basket
    pub fn toggle_medication(&mut self, medication_id: &str) {
        if let Some(pos) = self
            .selected_medications
            .iter()
            .position(|id| id == medication_id)
        {
            self.selected_medications.remove(pos);
        } else {
            self.selected_medications.push(medication_id.to_string());
        }
    }

    pub fn clear_selected_medications(&mut self) {
        self.selected_medications.clear();
    }

    /// Switch curriculum year; chapter counter restarts at 1
    pub fn set_year(&mut self, year: YearLevel) {
        self.year = year;
        self.level = 1;
        self.reset();
    }

    /// Put a level's prescription into play with a clean level score
    pub fn begin_level(&mut self, prescription: Prescription) {
        tracing::info!(
            session = %self.id,
            level = self.level,
            prescription = %prescription.id,
            "Level started"
        );
        self.prescription = Some(prescription);
        self.stage = Stage::Receiving;
        self.score = 0;
        self.selected_medications.clear();
        self.allergy_conflict_detected = false;
        self.progress = StageProgress::default();
    }

    /// Apply signed score and rx-point deltas; no floors
    pub(crate) fn apply_deltas(&mut self, score: i64, rx_points: i64) {
        self.score += score;
        self.rx_points += rx_points;
        tracing::debug!(
            session = %self.id,
            score_delta = score,
            points_delta = rx_points,
            score = self.score,
            rx_points = self.rx_points,
            "Applied deltas"
        );
    }

    pub(crate) fn require_prescription(&self) -> crate::Result<&Prescription> {
        self.prescription
            .as_ref()
            .ok_or(crate::Error::NoActivePrescription)
    }

    pub(crate) fn require_stage(&self, expected: Stage) -> crate::Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(crate::Error::WrongStage {
                expected,
                actual: self.stage,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::get_default_content;

    #[test]
    fn test_new_session_defaults() {
        let s = SessionState::new(YearLevel::Two);
        assert_eq!(s.year(), YearLevel::Two);
        assert_eq!(s.stage(), Stage::Receiving);
        assert_eq!(s.level(), 1);
        assert_eq!(s.score(), 0);
        assert_eq!(s.rx_points(), 0);
        assert_eq!(s.rank(), Rank::PharmacyTrainee);
        assert!(s.prescription().is_none());
        assert!(!s.allergy_conflict_detected());
    }

    #[test]
    fn test_toggle_medication() {
        let mut s = SessionState::new(YearLevel::One);
        s.toggle_medication("med-001");
        s.toggle_medication("med-002");
        assert_eq!(s.selected_medications(), ["med-001", "med-002"]);
        s.toggle_medication("med-001");
        assert_eq!(s.selected_medications(), ["med-002"]);
        s.clear_selected_medications();
        assert!(s.selected_medications().is_empty());
    }

    #[test]
    fn test_begin_level_clears_level_state_keeps_points() {
        let mut s = SessionState::new(YearLevel::One);
        s.apply_deltas(120, 70);
        s.set_allergy_conflict_detected(true);
        s.toggle_medication("med-001");

        let rx = get_default_content().prescription("rx-005").unwrap().clone();
        s.begin_level(rx);

        assert_eq!(s.score(), 0);
        assert_eq!(s.rx_points(), 70);
        assert!(!s.allergy_conflict_detected());
        assert!(s.selected_medications().is_empty());
        assert_eq!(s.snapshot().prescription_id.as_deref(), Some("rx-005"));
    }

    #[test]
    fn test_negative_totals_are_kept() {
        let mut s = SessionState::new(YearLevel::One);
        s.apply_deltas(-200, -100);
        assert_eq!(s.score(), -200);
        assert_eq!(s.rx_points(), -100);
        assert_eq!(s.rank(), Rank::PharmacyTrainee);
    }

    #[test]
    fn test_snapshot_serializes() {
        let s = SessionState::new(YearLevel::Three);
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["year"], 3);
        assert_eq!(json["stage"], "receiving");
        assert_eq!(json["rank"], "pharmacy_trainee");
        assert_eq!(json["stage_progress"]["typing"], false);
    }

    #[test]
    fn test_require_stage() {
        let s = SessionState::new(YearLevel::One);
        assert!(s.require_stage(Stage::Receiving).is_ok());
        assert!(matches!(
            s.require_stage(Stage::Picking),
            Err(crate::Error::WrongStage {
                expected: Stage::Picking,
                actual: Stage::Receiving
            })
        ));
        assert!(matches!(
            s.require_prescription(),
            Err(crate::Error::NoActivePrescription)
        ));
    }
}
