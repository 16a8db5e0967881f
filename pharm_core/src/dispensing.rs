//! Dispensing counter: hand over and counsel the patient.

use crate::config::RewardsConfig;
use crate::engine::Continuation;
use crate::state::SessionState;
use crate::types::{Catalog, CounselingQuestion, Stage};
use crate::Result;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

/// Counseling questions for every prescribed medication, in prescription order
pub fn counseling_questions<'c>(
    session: &SessionState,
    catalog: &'c Catalog,
) -> Result<Vec<&'c CounselingQuestion>> {
    let rx = session.require_prescription()?;
    let mut seen = BTreeSet::new();
    let mut questions = Vec::new();
    for item in &rx.medications {
        if !seen.insert(item.medication_id.as_str()) {
            continue;
        }
        questions.extend(catalog.questions_for_medication(&item.medication_id));
    }
    Ok(questions)
}

#[derive(Clone, Debug, Default)]
pub struct DispensingCounter {
    answered_correctly: BTreeSet<String>,
    counseling_complete: bool,
}

impl DispensingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counseling_complete(&self) -> bool {
        self.counseling_complete
    }

    /// Grade one quiz answer; `None` for an unknown question id
    pub fn answer(
        &mut self,
        catalog: &Catalog,
        question_id: &str,
        choice: usize,
    ) -> Option<AnswerFeedback> {
        let question = catalog.lookup_question(question_id)?;
        let is_correct = choice == question.correct_answer;
        if is_correct {
            self.answered_correctly.insert(question.id.clone());
        }
        Some(AnswerFeedback {
            question_id: question.id.clone(),
            is_correct,
            correct_answer: question
                .options
                .get(question.correct_answer)
                .cloned()
                .unwrap_or_default(),
            explanation: question.explanation.clone(),
        })
    }

    /// Close counseling once every question has been answered correctly
    ///
    /// Pays the counseling reward the first time only. Returns whether
    /// counseling is complete.
    pub fn complete_counseling(
        &mut self,
        session: &mut SessionState,
        catalog: &Catalog,
        rewards: &RewardsConfig,
    ) -> Result<bool> {
        session.require_stage(Stage::Dispensing)?;
        if self.counseling_complete {
            return Ok(true);
        }

        let outstanding = counseling_questions(session, catalog)?
            .iter()
            .filter(|q| !self.answered_correctly.contains(&q.id))
            .count();
        if outstanding > 0 {
            tracing::debug!(session = %session.id(), outstanding, "Counseling not finished");
            return Ok(false);
        }

        session.apply_deltas(rewards.counseling.score, rewards.counseling.rx_points);
        self.counseling_complete = true;
        Ok(true)
    }

    /// Hand over the bag; advancing from here rolls the level over
    pub fn finish(&self, session: &SessionState) -> Result<Continuation> {
        session.require_stage(Stage::Dispensing)?;
        Ok(if self.counseling_complete {
            Continuation::AdvanceStage
        } else {
            Continuation::Retry
        })
    }
}
