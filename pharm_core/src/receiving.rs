//! Receiving desk: check-ins and the prescription inspection.
//!
//! The player verifies identity and allergies, then inspects the
//! prescription field by field before making a call (a scenario decision or
//! the validation mini-game). This state lives only for the current visit
//! to receiving.

use crate::allergy::{self, AllergyConflict};
use crate::config::RewardsConfig;
use crate::state::SessionState;
use crate::types::{Catalog, InvalidReason, Stage};
use crate::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Prescription areas that can be inspected
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReceivingField {
    Signature,
    Date,
    Patient,
    Dosage,
    Allergies,
}

impl ReceivingField {
    pub const ALL: [ReceivingField; 5] = [
        ReceivingField::Signature,
        ReceivingField::Date,
        ReceivingField::Patient,
        ReceivingField::Dosage,
        ReceivingField::Allergies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceivingField::Signature => "signature",
            ReceivingField::Date => "date",
            ReceivingField::Patient => "patient",
            ReceivingField::Dosage => "dosage",
            ReceivingField::Allergies => "allergies",
        }
    }

    /// Field where a given defect shows up
    pub fn for_reason(reason: InvalidReason) -> ReceivingField {
        match reason {
            InvalidReason::MissingSignature | InvalidReason::IllegibleHandwriting => {
                ReceivingField::Signature
            }
            InvalidReason::ExpiredDate | InvalidReason::MissingDate => ReceivingField::Date,
            InvalidReason::PatientMismatch => ReceivingField::Patient,
            InvalidReason::IncompleteDosage | InvalidReason::DrugInteraction => {
                ReceivingField::Dosage
            }
            InvalidReason::AllergyConflict => ReceivingField::Allergies,
        }
    }
}

impl fmt::Display for ReceivingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceivingField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ReceivingField::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}

/// Result of inspecting one field
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct FieldFinding {
    pub field: ReceivingField,
    pub has_issue: bool,
    /// Score granted by this inspection (only the first look pays)
    pub score_awarded: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ReceivingDesk {
    identity_verified: bool,
    allergies_checked: bool,
    investigating: bool,
    check_in_rewarded: bool,
    checked_fields: BTreeSet<ReceivingField>,
    found_issues: BTreeSet<ReceivingField>,
}

impl ReceivingDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity_verified(&self) -> bool {
        self.identity_verified
    }

    pub fn allergies_checked(&self) -> bool {
        self.allergies_checked
    }

    pub fn is_investigating(&self) -> bool {
        self.investigating
    }

    pub fn checked_fields(&self) -> &BTreeSet<ReceivingField> {
        &self.checked_fields
    }

    pub fn found_issues(&self) -> &BTreeSet<ReceivingField> {
        &self.found_issues
    }

    pub fn all_fields_checked(&self) -> bool {
        self.checked_fields.len() == ReceivingField::ALL.len()
    }

    pub fn verify_identity(&mut self, session: &SessionState) -> Result<()> {
        session.require_stage(Stage::Receiving)?;
        session.require_prescription()?;
        self.identity_verified = true;
        Ok(())
    }

    /// Run the allergy screen; a match raises the session's picking gate
    pub fn check_allergies(
        &mut self,
        session: &mut SessionState,
        catalog: &Catalog,
    ) -> Result<Vec<AllergyConflict>> {
        session.require_stage(Stage::Receiving)?;
        let conflicts = allergy::screen_session(session, catalog)?;
        self.allergies_checked = true;
        Ok(conflicts)
    }

    /// Open the prescription for inspection
    ///
    /// Needs both check-ins; returns `false` if either is missing. The
    /// check-in reward is paid once per visit.
    pub fn begin_investigation(
        &mut self,
        session: &mut SessionState,
        rewards: &RewardsConfig,
    ) -> Result<bool> {
        session.require_stage(Stage::Receiving)?;
        if !(self.identity_verified && self.allergies_checked) {
            return Ok(false);
        }
        if !self.check_in_rewarded {
            session.apply_deltas(rewards.check_in, 0);
            self.check_in_rewarded = true;
        }
        self.investigating = true;
        Ok(true)
    }

    /// Inspect one field of the prescription
    ///
    /// A valid prescription never shows an issue. The allergies field also
    /// shows one whenever the session's conflict flag is up.
    pub fn check_field(
        &mut self,
        session: &mut SessionState,
        rewards: &RewardsConfig,
        field: ReceivingField,
    ) -> Result<FieldFinding> {
        session.require_stage(Stage::Receiving)?;
        let rx = session.require_prescription()?;

        let has_issue = !rx.is_valid
            && (rx.invalid_reason.map(ReceivingField::for_reason) == Some(field)
                || (field == ReceivingField::Allergies && session.allergy_conflict_detected()));

        let score_awarded = if self.checked_fields.insert(field) {
            session.apply_deltas(rewards.field_check, 0);
            rewards.field_check
        } else {
            0
        };
        if has_issue {
            self.found_issues.insert(field);
        }

        tracing::debug!(session = %session.id(), %field, has_issue, "Field checked");
        Ok(FieldFinding {
            field,
            has_issue,
            score_awarded,
        })
    }

    /// Drop inspection progress after a wrong call; check-ins stand
    pub fn discard_investigation(&mut self) {
        self.investigating = false;
        self.checked_fields.clear();
        self.found_issues.clear();
    }
}
