//! Pending task model loaded from the backend.

/// A backend record waiting to be resolved by scanning its product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTask {
    /// Server id used for the detail lookup and the resolving update.
    pub id: String,
    /// Identity the operator must confirm by scanning.
    pub expected_identity: String,
    /// Product description shown with the task.
    pub description: String,
    /// Creation date (`DD/MM/YYYY`), or "N/A" when the backend has none.
    pub created_date: String,
    /// Task category as named by the backend.
    pub kind: String,
    /// Internal product code, informational.
    pub product_code: Option<i64>,
}

impl PendingTask {
    /// Date part of `created_date` (text before the first space).
    pub fn created_day(&self) -> &str {
        self.created_date
            .split(' ')
            .next()
            .unwrap_or(&self.created_date)
    }
}

#[cfg(test)]
pub(crate) fn test_task(expected: &str) -> PendingTask {
    PendingTask {
        id: "act-1".into(),
        expected_identity: expected.into(),
        description: "ARROZ 5KG".into(),
        created_date: "10/06/2024 08:00".into(),
        kind: "VALIDADE".into(),
        product_code: Some(42),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_day_drops_time_part() {
        assert_eq!(test_task("1").created_day(), "10/06/2024");
        let mut t = test_task("1");
        t.created_date = "N/A".into();
        assert_eq!(t.created_day(), "N/A");
    }
}
