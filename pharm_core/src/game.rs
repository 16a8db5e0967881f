//! Play-session orchestrator.
//!
//! `Game` owns the session, the per-stage desks and the reward table, and
//! borrows the static catalog and content. Player actions go through it;
//! outcomes come back as values and the front end calls [`Game::apply`]
//! with the continuation once the player has read the result.

use crate::allergy::AllergyConflict;
use crate::config::{Config, RewardsConfig};
use crate::dispensing::{self, AnswerFeedback, DispensingCounter};
use crate::engine::{self, Continuation, Resolution};
use crate::picking::{self, PickOutcome};
use crate::receiving::{FieldFinding, ReceivingDesk, ReceivingField};
use crate::state::{SessionSnapshot, SessionState};
use crate::typing::{LabelDraft, LabelOutcome, TypingDesk};
use crate::types::*;
use crate::validation::{self, ValidationOutcome};
use crate::{Error, Result};
use serde::Serialize;

/// Where play stands after a continuation is applied
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    Stayed { stage: Stage },
    NextStage { stage: Stage },
    NextLevel { chapter: u32, prescription_id: String },
    YearComplete,
}

pub struct Game<'a> {
    catalog: &'a Catalog,
    content: &'a ContentLibrary,
    rewards: RewardsConfig,
    session: SessionState,
    receiving: ReceivingDesk,
    typing: TypingDesk,
    counter: DispensingCounter,
    year_complete: bool,
}

impl<'a> Game<'a> {
    pub fn new(catalog: &'a Catalog, content: &'a ContentLibrary, config: &Config) -> Result<Self> {
        let year = YearLevel::try_from(config.game.default_year)?;
        Ok(Self {
            catalog,
            content,
            rewards: config.rewards.clone(),
            session: SessionState::new(year),
            receiving: ReceivingDesk::new(),
            typing: TypingDesk::new(),
            counter: DispensingCounter::new(),
            year_complete: false,
        })
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn content(&self) -> &'a ContentLibrary {
        self.content
    }

    pub fn rewards(&self) -> &RewardsConfig {
        &self.rewards
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn receiving(&self) -> &ReceivingDesk {
        &self.receiving
    }

    pub fn typing(&self) -> &TypingDesk {
        &self.typing
    }

    pub fn counter(&self) -> &DispensingCounter {
        &self.counter
    }

    pub fn is_year_complete(&self) -> bool {
        self.year_complete
    }

    /// Level being played, from the content table
    pub fn current_level(&self) -> Option<&'a Level> {
        self.content
            .level(self.session.year(), self.session.level())
    }

    /// Begin `year` at chapter 1
    pub fn start_year(&mut self, year: YearLevel) -> Result<Transition> {
        tracing::info!(session = %self.session.id(), %year, "Starting year");
        self.session.set_year(year);
        self.year_complete = false;
        let transition = self.load_current_level()?;
        if transition == Transition::YearComplete {
            return Err(Error::UnknownLevel {
                year: year.number(),
                chapter: 1,
            });
        }
        Ok(transition)
    }

    /// Act on a continuation returned by any outcome
    ///
    /// Nothing leaves picking while the allergy flag is up; the only way
    /// out is [`Game::return_to_receiving`].
    pub fn apply(&mut self, continuation: Continuation) -> Result<Transition> {
        let stage = self.session.stage();
        if stage == Stage::Picking
            && self.session.allergy_conflict_detected()
            && continuation != Continuation::Retry
        {
            tracing::warn!(
                session = %self.session.id(),
                ?continuation,
                "Allergy conflict unresolved, staying at picking"
            );
            return Ok(Transition::Stayed { stage });
        }
        match continuation {
            Continuation::Retry => {
                if stage == Stage::Receiving {
                    self.receiving.discard_investigation();
                }
                Ok(Transition::Stayed { stage })
            }
            Continuation::AdvanceStage => {
                self.session.mark_stage_complete(stage);
                let next = self.session.advance();
                if stage == Stage::Dispensing {
                    self.load_current_level()
                } else {
                    Ok(Transition::NextStage { stage: next })
                }
            }
            Continuation::LevelComplete => {
                self.session.mark_stage_complete(stage);
                self.session.complete_level();
                self.load_current_level()
            }
        }
    }

    /// Leave to the menu; the level restarts from receiving
    pub fn abort_to_menu(&mut self) {
        self.session.reset();
        self.reset_desks();
    }

    fn reset_desks(&mut self) {
        self.receiving = ReceivingDesk::new();
        self.typing = TypingDesk::new();
        self.counter = DispensingCounter::new();
    }

    fn load_current_level(&mut self) -> Result<Transition> {
        self.reset_desks();
        let Some(level) = self.current_level() else {
            tracing::info!(
                session = %self.session.id(),
                year = %self.session.year(),
                "Year complete"
            );
            self.year_complete = true;
            return Ok(Transition::YearComplete);
        };
        let rx = self.content.prescription_for_level(level)?;
        self.session.begin_level(rx.clone());
        Ok(Transition::NextLevel {
            chapter: level.chapter,
            prescription_id: rx.id.clone(),
        })
    }

    // Receiving

    pub fn verify_identity(&mut self) -> Result<()> {
        self.receiving.verify_identity(&self.session)
    }

    pub fn check_allergies(&mut self) -> Result<Vec<AllergyConflict>> {
        self.receiving.check_allergies(&mut self.session, self.catalog)
    }

    pub fn begin_investigation(&mut self) -> Result<bool> {
        self.receiving
            .begin_investigation(&mut self.session, &self.rewards)
    }

    pub fn check_field(&mut self, field: ReceivingField) -> Result<FieldFinding> {
        self.receiving
            .check_field(&mut self.session, &self.rewards, field)
    }

    /// Answer the active prescription's scenario
    ///
    /// A correct answer to an allergy-conflict scenario also settles the
    /// conflict raised at the counter.
    pub fn decide(&mut self, option_id: &str) -> Result<Resolution> {
        self.session.require_stage(Stage::Receiving)?;
        let rx = self.session.require_prescription()?;
        let scenario = rx
            .scenario
            .clone()
            .ok_or_else(|| Error::NoScenario(rx.id.clone()))?;
        let allergy_case = rx.invalid_reason == Some(InvalidReason::AllergyConflict);

        let resolution = engine::resolve(&mut self.session, &scenario, option_id)?;
        if allergy_case && resolution.consequence.is_correct {
            self.session.set_allergy_conflict_detected(false);
        }
        Ok(resolution)
    }

    pub fn validate(
        &mut self,
        declared_valid: bool,
        declared_reason: Option<InvalidReason>,
    ) -> Result<ValidationOutcome> {
        self.session.require_stage(Stage::Receiving)?;
        validation::submit_validation(
            &mut self.session,
            &self.rewards,
            declared_valid,
            declared_reason,
        )
    }

    // Typing

    pub fn current_item(&self) -> Result<Option<&PrescriptionItem>> {
        self.typing.current_item(&self.session)
    }

    pub fn print_label(&mut self, draft: LabelDraft) -> Result<LabelOutcome> {
        self.typing
            .print_label(&mut self.session, self.catalog, &self.rewards, draft)
    }

    pub fn recheck_label(&mut self) -> Result<bool> {
        self.typing.recheck(&mut self.session, &self.rewards)
    }

    pub fn insist_label(&mut self) -> Option<Continuation> {
        self.typing.insist()
    }

    // Picking

    pub fn shelf(&self) -> Result<Vec<(MedicationCategory, Vec<&'a Medication>)>> {
        picking::shelf(&self.session, self.catalog)
    }

    pub fn toggle_medication(&mut self, medication_id: &str) {
        self.session.toggle_medication(medication_id);
    }

    pub fn clear_selected_medications(&mut self) {
        self.session.clear_selected_medications();
    }

    pub fn submit_picking(&mut self) -> Result<PickOutcome> {
        picking::submit_selection(&mut self.session, &self.rewards)
    }

    /// The way out of a blocked picking stage
    ///
    /// Every desk starts over, so labels are typed again on the way back.
    pub fn return_to_receiving(&mut self) {
        self.session.return_to_receiving();
        self.reset_desks();
    }

    // Dispensing

    pub fn counseling_questions(&self) -> Result<Vec<&'a CounselingQuestion>> {
        dispensing::counseling_questions(&self.session, self.catalog)
    }

    pub fn answer_question(&mut self, question_id: &str, choice: usize) -> Option<AnswerFeedback> {
        self.counter.answer(self.catalog, question_id, choice)
    }

    pub fn complete_counseling(&mut self) -> Result<bool> {
        self.counter
            .complete_counseling(&mut self.session, self.catalog, &self.rewards)
    }

    pub fn finish_dispensing(&self) -> Result<Continuation> {
        self.counter.finish(&self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abbreviations::Frequency;
    use crate::catalog::get_default_catalog;
    use crate::content::get_default_content;

    fn game() -> Game<'static> {
        crate::logging::init_test();
        Game::new(get_default_catalog(), get_default_content(), &Config::default()).unwrap()
    }

    fn check_in(g: &mut Game) {
        g.verify_identity().unwrap();
        g.check_allergies().unwrap();
        assert!(g.begin_investigation().unwrap());
    }

    #[test]
    fn test_start_year_loads_first_chapter() {
        let mut g = game();
        let t = g.start_year(YearLevel::One).unwrap();
        assert_eq!(
            t,
            Transition::NextLevel {
                chapter: 1,
                prescription_id: "rx-005".into()
            }
        );
        assert_eq!(g.current_level().unwrap().chapter, 1);
        assert_eq!(g.session().stage(), Stage::Receiving);
    }

    #[test]
    fn test_full_level_walkthrough() {
        let mut g = game();
        g.start_year(YearLevel::One).unwrap();

        check_in(&mut g);
        let out = g.validate(true, None).unwrap();
        assert_eq!(
            g.apply(out.continuation).unwrap(),
            Transition::NextStage {
                stage: Stage::Typing
            }
        );

        let label = g
            .print_label(LabelDraft {
                quantity: 2,
                dosage_form: DosageForm::Tablet,
                frequency: Frequency::Tds,
            })
            .unwrap();
        let LabelOutcome::Printed {
            continuation: Some(next),
            ..
        } = label
        else {
            panic!("label not accepted: {:?}", label);
        };
        g.apply(next).unwrap();

        g.toggle_medication("med-001");
        let pick = g.submit_picking().unwrap();
        g.apply(pick.continuation().unwrap()).unwrap();
        assert_eq!(g.session().stage(), Stage::Dispensing);

        for q in g.counseling_questions().unwrap() {
            g.answer_question(&q.id, q.correct_answer).unwrap();
        }
        assert!(g.complete_counseling().unwrap());
        let done = g.finish_dispensing().unwrap();
        let t = g.apply(done).unwrap();

        assert_eq!(
            t,
            Transition::NextLevel {
                chapter: 2,
                prescription_id: "rx-006".into()
            }
        );
        // verdict + label + pick + counseling; level score starts over
        assert_eq!(g.session().rx_points(), 30 + 25 + 30 + 15);
        assert_eq!(g.session().score(), 0);
    }

    #[test]
    fn test_short_circuit_scenario_skips_to_next_level() {
        let mut g = game();
        g.start_year(YearLevel::Three).unwrap();
        assert_eq!(g.session().prescription().unwrap().id, "rx-003");

        check_in(&mut g);
        assert!(g.session().allergy_conflict_detected());

        let res = g.decide("call-doctor-alternative").unwrap();
        assert_eq!(res.continuation, Continuation::LevelComplete);
        assert!(!g.session().allergy_conflict_detected());

        let t = g.apply(res.continuation).unwrap();
        assert_eq!(
            t,
            Transition::NextLevel {
                chapter: 2,
                prescription_id: "rx-002".into()
            }
        );
        assert_eq!(g.session().rx_points(), 75);
    }

    #[test]
    fn test_wrong_decision_discards_investigation() {
        let mut g = game();
        g.start_year(YearLevel::Three).unwrap();
        check_in(&mut g);
        g.check_field(ReceivingField::Allergies).unwrap();

        let res = g.decide("dispense-anyway").unwrap();
        assert_eq!(res.continuation, Continuation::Retry);
        assert_eq!(
            g.apply(res.continuation).unwrap(),
            Transition::Stayed {
                stage: Stage::Receiving
            }
        );
        assert!(g.receiving().checked_fields().is_empty());
        assert!(g.session().allergy_conflict_detected());
    }

    #[test]
    fn test_blocked_picking_returns_to_receiving() {
        let mut g = game();
        g.start_year(YearLevel::One).unwrap();
        check_in(&mut g);
        let out = g.validate(true, None).unwrap();
        g.apply(out.continuation).unwrap();
        g.apply(Continuation::AdvanceStage).unwrap();
        assert_eq!(g.session().stage(), Stage::Picking);

        g.session.set_allergy_conflict_detected(true);
        g.toggle_medication("med-001");
        assert_eq!(g.submit_picking().unwrap(), PickOutcome::Blocked);

        g.return_to_receiving();
        assert_eq!(g.session().stage(), Stage::Receiving);
        assert!(!g.receiving().identity_verified());
    }

    #[test]
    fn test_unresolved_allergy_holds_picking() {
        let mut g = game();
        g.start_year(YearLevel::One).unwrap();
        check_in(&mut g);
        let out = g.validate(true, None).unwrap();
        g.apply(out.continuation).unwrap();
        g.apply(Continuation::AdvanceStage).unwrap();

        g.session.set_allergy_conflict_detected(true);
        g.toggle_medication("med-001");
        assert_eq!(g.submit_picking().unwrap(), PickOutcome::Blocked);

        for c in [Continuation::AdvanceStage, Continuation::LevelComplete] {
            assert_eq!(
                g.apply(c).unwrap(),
                Transition::Stayed {
                    stage: Stage::Picking
                }
            );
        }
        assert_eq!(g.session().stage(), Stage::Picking);
        assert_eq!(g.session().level(), 1);
        assert!(!g.session().stage_progress().picking);
    }

    #[test]
    fn test_labels_typed_again_after_return_to_receiving() {
        let draft = LabelDraft {
            quantity: 2,
            dosage_form: DosageForm::Tablet,
            frequency: Frequency::Tds,
        };
        let mut g = game();
        g.start_year(YearLevel::One).unwrap();
        check_in(&mut g);
        let out = g.validate(true, None).unwrap();
        g.apply(out.continuation).unwrap();
        assert!(matches!(
            g.print_label(draft).unwrap(),
            LabelOutcome::Printed { continuation: Some(_), .. }
        ));
        g.apply(Continuation::AdvanceStage).unwrap();

        g.session.set_allergy_conflict_detected(true);
        assert_eq!(g.submit_picking().unwrap(), PickOutcome::Blocked);
        g.return_to_receiving();
        g.session.set_allergy_conflict_detected(false);
        g.apply(Continuation::AdvanceStage).unwrap();
        assert_eq!(g.session().stage(), Stage::Typing);

        assert_eq!(g.current_item().unwrap().unwrap().medication_id, "med-001");
        assert!(matches!(
            g.print_label(draft).unwrap(),
            LabelOutcome::Printed { continuation: Some(_), .. }
        ));
    }

    #[test]
    fn test_correct_decision_outside_allergy_case_keeps_flag() {
        let mut g = game();
        g.start_year(YearLevel::Two).unwrap();
        // Chapter 4 carries an unsigned-prescription scenario
        for _ in 0..3 {
            g.apply(Continuation::LevelComplete).unwrap();
        }
        let rx = g.session().prescription().unwrap().clone();
        assert_eq!(rx.id, "rx-010");
        let scenario = rx.scenario.unwrap();
        let correct = scenario
            .options
            .iter()
            .find(|o| scenario.consequence(&o.id).unwrap().is_correct)
            .unwrap()
            .id
            .clone();

        g.session.set_allergy_conflict_detected(true);
        let res = g.decide(&correct).unwrap();

        assert!(res.consequence.is_correct);
        assert!(g.session().allergy_conflict_detected());
    }

    #[test]
    fn test_year_completes_after_last_chapter() {
        let mut g = game();
        g.start_year(YearLevel::Two).unwrap();
        let chapters = g.content().levels_for_year(YearLevel::Two).len();

        let mut last = None;
        for _ in 0..chapters {
            last = Some(g.apply(Continuation::LevelComplete).unwrap());
        }

        assert_eq!(last, Some(Transition::YearComplete));
        assert!(g.is_year_complete());
    }

    #[test]
    fn test_decide_without_scenario() {
        let mut g = game();
        g.start_year(YearLevel::One).unwrap();
        let err = g.decide("verify").unwrap_err();
        assert!(matches!(err, Error::NoScenario(ref id) if id == "rx-005"));
    }

    #[test]
    fn test_abort_to_menu_resets_level() {
        let mut g = game();
        g.start_year(YearLevel::One).unwrap();
        check_in(&mut g);
        assert_eq!(g.session().score(), 10);

        g.abort_to_menu();

        assert_eq!(g.session().score(), 0);
        assert_eq!(g.session().level(), 1);
        assert!(!g.receiving().identity_verified());
    }
}
