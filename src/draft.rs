//! The capture form's draft aggregate.
//!
//! All mutation goes through the methods here so the weight lock and the
//! task binding rules hold regardless of which screen drives the draft.

use thiserror::Error;

use crate::{
    dates,
    decode::DecodedCode,
    tasks::PendingTask,
    validation::{DualValidation, ValidationStatus},
};

/// Unit shown next to a quantity derived from a weight payload.
pub const WEIGHT_UNIT: &str = "kg";

/// Direct edits refused by the draft.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("quantity is locked by a weighed scan")]
    QuantityLocked,
    #[error("identity can only be changed by scanning")]
    IdentityLocked,
}

/// What a scan did to the draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Free capture: identity written.
    Captured,
    /// Task-bound draft confirmed.
    Matched,
    /// Task-bound draft, wrong product; draft fields left untouched.
    Mismatch { scanned: String, expected: String },
}

/// Form state for one capture or task resolution.
#[derive(Clone, Debug)]
pub struct Draft {
    identity: String,
    description: String,
    quantity: String,
    quantity_locked: bool,
    quantity_unit: Option<String>,
    validity_date: String,
    creation_date: String,
    identity_editable: bool,
    bound_task: Option<PendingTask>,
    validation: Option<DualValidation>,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            identity: String::new(),
            description: String::new(),
            quantity: String::new(),
            quantity_locked: false,
            quantity_unit: None,
            validity_date: String::new(),
            creation_date: dates::today(),
            identity_editable: false,
            bound_task: None,
            validation: None,
        }
    }
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start resolving `task`: identity comes from the task, validation starts `Pending`.
    pub fn bind_to_task(&mut self, task: PendingTask) {
        self.reset();
        tracing::info!("draft bound to task {} ({})", task.id, task.expected_identity);
        self.identity = task.expected_identity.clone();
        self.description = task.description.clone();
        if dates::is_valid_date(task.created_day()) {
            self.creation_date = task.created_day().to_string();
        }
        self.validation = Some(DualValidation::new(task.expected_identity.clone()));
        self.bound_task = Some(task);
    }

    /// Apply the authoritative identity from the task-detail lookup.
    ///
    /// Only takes effect for the task currently bound and before the first scan.
    pub fn overlay_task_identity(&mut self, task_id: &str, identity: &str) -> bool {
        let (Some(task), Some(validation)) = (self.bound_task.as_mut(), self.validation.as_mut())
        else {
            return false;
        };
        if task.id != task_id || identity.trim().is_empty() || task.expected_identity == identity {
            return false;
        }
        if !validation.correct_expected(identity) {
            tracing::warn!("task {task_id} identity overlay ignored after scan");
            return false;
        }
        tracing::info!(
            "task {task_id} identity corrected: {} -> {identity}",
            task.expected_identity
        );
        task.expected_identity = identity.to_string();
        self.identity = identity.to_string();
        true
    }

    /// Write a decoded scan into the draft.
    ///
    /// For a task-bound draft the dual validation runs first; a mismatch leaves
    /// identity and quantity as they were.
    pub fn apply_scan(&mut self, decoded: &DecodedCode) -> ScanOutcome {
        let outcome = match self.validation.as_mut() {
            Some(v) => match v.observe(&decoded.identity) {
                ValidationStatus::Mismatch => {
                    return ScanOutcome::Mismatch {
                        scanned: decoded.identity.trim().to_string(),
                        expected: v.expected().trim().to_string(),
                    };
                }
                _ => ScanOutcome::Matched,
            },
            None => ScanOutcome::Captured,
        };

        self.identity = decoded.identity.clone();
        match decoded.quantity_text() {
            Some(q) if decoded.is_weight_encoded => {
                self.quantity = q;
                self.quantity_locked = true;
                self.quantity_unit = Some(WEIGHT_UNIT.to_string());
            }
            _ => {
                self.quantity_locked = false;
                self.quantity_unit = None;
            }
        }
        outcome
    }

    /// Switch to typed identity entry. Free captures start from an empty identity.
    pub fn enable_manual_entry(&mut self) {
        if !self.identity_editable {
            self.identity_editable = true;
            if self.bound_task.is_none() {
                self.identity.clear();
            }
        }
    }

    pub fn set_identity(&mut self, identity: &str) -> Result<(), DraftError> {
        if !self.identity_editable {
            return Err(DraftError::IdentityLocked);
        }
        self.identity = identity.trim().to_string();
        Ok(())
    }

    pub fn set_quantity(&mut self, quantity: &str) -> Result<(), DraftError> {
        if self.quantity_locked {
            return Err(DraftError::QuantityLocked);
        }
        self.quantity = quantity.trim().to_string();
        Ok(())
    }

    /// Keystroke-level update of the validity date; input is reshaped, never rejected.
    pub fn set_validity_date(&mut self, input: &str) {
        self.validity_date = dates::mask_date(input);
    }

    /// Outcome of the product description lookup for the current identity.
    ///
    /// A free capture without a description becomes editable so the code can be corrected.
    pub fn apply_description(&mut self, description: Option<String>) {
        match description.filter(|d| !d.trim().is_empty()) {
            Some(d) => self.description = d,
            None if self.bound_task.is_none() => {
                self.description.clear();
                self.identity_editable = true;
            }
            None => {}
        }
    }

    /// Forget everything, back to a fresh free capture.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when leaving would throw away operator input.
    pub fn has_unsaved_data(&self) -> bool {
        (!self.identity.is_empty() && self.bound_task.is_none()) || !self.quantity.is_empty()
    }

    /// Free captures always; bound drafts only once the scan matched.
    pub fn submission_allowed(&self) -> bool {
        match &self.validation {
            None => true,
            Some(v) => v.status() == ValidationStatus::Matched,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn quantity_locked(&self) -> bool {
        self.quantity_locked
    }

    pub fn quantity_unit(&self) -> Option<&str> {
        self.quantity_unit.as_deref()
    }

    pub fn validity_date(&self) -> &str {
        &self.validity_date
    }

    pub fn creation_date(&self) -> &str {
        &self.creation_date
    }

    pub fn identity_editable(&self) -> bool {
        self.identity_editable
    }

    pub fn bound_task(&self) -> Option<&PendingTask> {
        self.bound_task.as_ref()
    }

    pub fn validation(&self) -> Option<ValidationStatus> {
        self.validation.as_ref().map(|v| v.status())
    }

    pub fn last_scanned_identity(&self) -> Option<&str> {
        self.validation.as_ref().and_then(|v| v.last_scanned())
    }

    #[cfg(test)]
    pub(crate) fn set_creation_date(&mut self, date: &str) {
        self.creation_date = date.to_string();
    }

    #[cfg(test)]
    pub(crate) fn force_identity(&mut self, identity: &str) {
        self.identity = identity.to_string();
    }

    #[cfg(test)]
    pub(crate) fn clear_task_id(&mut self) {
        if let Some(t) = self.bound_task.as_mut() {
            t.id.clear();
        }
    }
}
