//! Confirmation of a scanned identity against a pending task's expected identity.

/// Where a task-bound draft stands in the scan confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationStatus {
    /// No scan observed yet.
    Pending,
    /// Last scan equals the expected identity.
    Matched,
    /// Last scan differs; the operator must rescan.
    Mismatch,
}

impl ValidationStatus {
    pub fn label(self) -> &'static str {
        match self {
            ValidationStatus::Pending => "awaiting validation scan",
            ValidationStatus::Matched => "product validated",
            ValidationStatus::Mismatch => "product does not match",
        }
    }
}

/// State machine re-evaluated only by fresh scans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DualValidation {
    expected: String,
    status: ValidationStatus,
    last_scanned: Option<String>,
}

impl DualValidation {
    /// Start in `Pending` against the given expected identity.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            status: ValidationStatus::Pending,
            last_scanned: None,
        }
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn last_scanned(&self) -> Option<&str> {
        self.last_scanned.as_deref()
    }

    /// Compare a freshly scanned identity (both sides trimmed) and move to `Matched` or `Mismatch`.
    pub fn observe(&mut self, scanned: &str) -> ValidationStatus {
        let got = scanned.trim();
        let want = self.expected.trim();
        self.status = if got == want {
            tracing::info!("scan matches task identity {want}");
            ValidationStatus::Matched
        } else {
            tracing::warn!("scan {got} does not match task identity {want}");
            ValidationStatus::Mismatch
        };
        self.last_scanned = Some(scanned.to_string());
        self.status
    }

    /// Replace the expected identity before any scan was observed.
    ///
    /// Used by the task-detail overlay; ignored once the operator has scanned.
    pub(crate) fn correct_expected(&mut self, expected: &str) -> bool {
        if self.last_scanned.is_some() {
            return false;
        }
        self.expected = expected.to_string();
        true
    }
}
