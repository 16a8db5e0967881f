//! Typing desk: one dispensing label per prescription item.

use crate::abbreviations::{convert_duration, Frequency};
use crate::config::{Reward, RewardsConfig};
use crate::engine::Continuation;
use crate::state::SessionState;
use crate::types::{Catalog, DosageForm, Medication, PrescriptionItem, Stage};
use crate::{Error, Result};
use serde::Serialize;

/// What the player typed for the current item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelDraft {
    pub quantity: u32,
    pub dosage_form: DosageForm,
    pub frequency: Frequency,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabelField {
    Quantity,
    DosageForm,
    Frequency,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LabelOutcome {
    /// Label accepted; `continuation` is set once the last item is done
    Printed {
        reward: Reward,
        continuation: Option<Continuation>,
    },
    /// The patient spotted something; answer with `recheck` or `insist`
    Queried {
        field: LabelField,
        patient_query: String,
    },
}

/// Quantity choices offered for a dosage form
pub fn quantity_choices(form: DosageForm) -> &'static [u32] {
    match form {
        DosageForm::Liquid | DosageForm::Syrup => &[5, 10, 15, 20, 25, 30],
        DosageForm::Inhaler => &[1, 2, 3, 4],
        _ => &[1, 2, 3, 4, 5],
    }
}

/// Human-readable label for an item, e.g. "Take 2 tablet(s) three times a day"
pub fn label_text(item: &PrescriptionItem, med: &Medication) -> String {
    let frequencies = Frequency::parse_alternatives(&item.frequency);
    let wording = if frequencies.is_empty() {
        item.frequency.clone()
    } else {
        frequencies
            .iter()
            .map(Frequency::label_text)
            .collect::<Vec<_>>()
            .join(" or ")
    };

    let unit = if med.dosage_form.is_liquid() {
        "ml".to_string()
    } else {
        format!("{}(s)", med.dosage_form)
    };

    let mut text = format!("Take {} {} {}", item.quantity, unit, wording);
    if let Some(duration) = &item.duration {
        text.push_str(&format!(" for {}", convert_duration(duration)));
    }
    if let Some(extra) = &item.special_instructions {
        let extra = match extra.trim().to_lowercase().as_str() {
            "prn" => "when necessary".to_string(),
            _ => extra.clone(),
        };
        text.push_str(&format!(" ({})", extra));
    }
    text
}

/// Per-visit typing state
#[derive(Clone, Debug, Default)]
pub struct TypingDesk {
    index: usize,
    pending_query: Option<LabelField>,
}

impl TypingDesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based position of the item being labelled
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pending_query(&self) -> Option<LabelField> {
        self.pending_query
    }

    /// Item to label next, `None` once every item has a label
    pub fn current_item<'s>(
        &self,
        session: &'s SessionState,
    ) -> Result<Option<&'s PrescriptionItem>> {
        Ok(session.require_prescription()?.medications.get(self.index))
    }

    pub fn print_label(
        &mut self,
        session: &mut SessionState,
        catalog: &Catalog,
        rewards: &RewardsConfig,
        draft: LabelDraft,
    ) -> Result<LabelOutcome> {
        session.require_stage(Stage::Typing)?;
        let rx = session.require_prescription()?;
        let total = rx.medications.len();
        let item = rx.medications.get(self.index).ok_or_else(|| {
            Error::ContentValidation(format!("Prescription '{}' has no item {}", rx.id, self.index))
        })?;
        let med = catalog.lookup_medication(&item.medication_id).ok_or_else(|| {
            Error::ContentValidation(format!(
                "Prescription '{}' references non-existent medication '{}'",
                rx.id, item.medication_id
            ))
        })?;

        let wrong_field = if draft.quantity != item.quantity {
            Some(LabelField::Quantity)
        } else if draft.dosage_form != med.dosage_form {
            Some(LabelField::DosageForm)
        } else if !Frequency::parse_alternatives(&item.frequency).contains(&draft.frequency) {
            Some(LabelField::Frequency)
        } else {
            None
        };

        if let Some(field) = wrong_field {
            let patient_query = match field {
                LabelField::Quantity => format!(
                    "Wait, this seems like a lot of {}s... Are you sure about the quantity?",
                    med.dosage_form
                ),
                LabelField::Frequency => format!(
                    "The label says {}, but I think the doctor said something different...",
                    draft.frequency.label_text()
                ),
                LabelField::DosageForm => {
                    "This doesn't look right to me. Can you double-check the prescription?".into()
                }
            };
            tracing::debug!(session = %session.id(), item = self.index, ?field, "Label queried");
            self.pending_query = Some(field);
            return Ok(LabelOutcome::Queried {
                field,
                patient_query,
            });
        }

        let reward = rewards.label;
        session.apply_deltas(reward.score, reward.rx_points);
        self.index += 1;
        self.pending_query = None;

        let continuation = (self.index >= total).then_some(Continuation::AdvanceStage);
        Ok(LabelOutcome::Printed {
            reward,
            continuation,
        })
    }

    /// Take the label back after a patient query; partial credit
    ///
    /// Returns `false` when there was no query to answer.
    pub fn recheck(&mut self, session: &mut SessionState, rewards: &RewardsConfig) -> Result<bool> {
        session.require_stage(Stage::Typing)?;
        if self.pending_query.take().is_none() {
            return Ok(false);
        }
        session.apply_deltas(rewards.label_recheck, 0);
        Ok(true)
    }

    /// Hand the wrong label over anyway
    ///
    /// The patient follows a bad label; no reward and the item is retyped.
    pub fn insist(&mut self) -> Option<Continuation> {
        self.pending_query.take().map(|_| Continuation::Retry)
    }
}
