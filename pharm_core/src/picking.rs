//! Picking desk: collect exactly the prescribed medications off the shelf.

use crate::config::{Reward, RewardsConfig};
use crate::engine::Continuation;
use crate::state::SessionState;
use crate::types::{Catalog, Medication, MedicationCategory, Stage};
use crate::Result;
use serde::Serialize;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PickOutcome {
    /// Allergy gate is up; nothing was graded
    Blocked,
    Correct { reward: Reward },
    Incorrect {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

impl PickOutcome {
    /// `None` when blocked: the only way on is `return_to_receiving`
    pub fn continuation(&self) -> Option<Continuation> {
        match self {
            PickOutcome::Blocked => None,
            PickOutcome::Correct { .. } => Some(Continuation::AdvanceStage),
            PickOutcome::Incorrect { .. } => Some(Continuation::Retry),
        }
    }
}

/// Medications on display: every catalog entry sharing a category with a
/// prescribed medication, grouped by category in prescription order
pub fn shelf<'c>(
    session: &SessionState,
    catalog: &'c Catalog,
) -> Result<Vec<(MedicationCategory, Vec<&'c Medication>)>> {
    let rx = session.require_prescription()?;

    let mut categories: Vec<MedicationCategory> = Vec::new();
    for item in &rx.medications {
        if let Some(med) = catalog.lookup_medication(&item.medication_id) {
            if !categories.contains(&med.category) {
                categories.push(med.category);
            }
        }
    }

    Ok(categories
        .into_iter()
        .map(|cat| (cat, catalog.medications_by_category(cat)))
        .collect())
}

/// Grade the basket against the prescription
///
/// Correct iff the basket has the same size as the prescription and holds
/// every prescribed id. A wrong basket is emptied for the retry.
pub fn submit_selection(
    session: &mut SessionState,
    rewards: &RewardsConfig,
) -> Result<PickOutcome> {
    session.require_stage(Stage::Picking)?;

    if session.allergy_conflict_detected() {
        tracing::info!(session = %session.id(), "Picking blocked by allergy conflict");
        return Ok(PickOutcome::Blocked);
    }

    let rx = session.require_prescription()?;
    let required: Vec<String> = rx
        .required_medication_ids()
        .into_iter()
        .map(String::from)
        .collect();
    let selected = session.selected_medications();

    let missing: Vec<String> = required
        .iter()
        .filter(|id| !selected.contains(*id))
        .cloned()
        .collect();
    let unexpected: Vec<String> = selected
        .iter()
        .filter(|id| !required.contains(*id))
        .cloned()
        .collect();
    let is_correct = selected.len() == required.len() && missing.is_empty();

    let outcome = if is_correct {
        let reward = rewards.picking;
        session.apply_deltas(reward.score, reward.rx_points);
        PickOutcome::Correct { reward }
    } else {
        session.clear_selected_medications();
        PickOutcome::Incorrect {
            missing,
            unexpected,
        }
    };

    tracing::info!(session = %session.id(), correct = is_correct, "Picking submitted");
    Ok(outcome)
}
