//! Turning a draft into a backend create or task update.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use thiserror::Error;

use crate::{
    api::{
        ApiError, Backend,
        models::{CreateSubmission, TaskResolution},
    },
    dates,
    draft::Draft,
    session::Session,
    validation::ValidationStatus,
};

/// Which date field failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateField {
    Validity,
    Creation,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Validity => f.write_str("validity"),
            DateField::Creation => f.write_str("creation"),
        }
    }
}

/// Reasons a submission is refused or fails.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("validation required: scan the product in hand to confirm")]
    ValidationRequired,
    #[error("identity mismatch: the scanned product differs from the task, scan the correct one")]
    IdentityMismatch,
    #[error("lost task reference")]
    LostTaskReference,
    #[error("product code diverges from the selected task")]
    IdentityDiverges,
    #[error("invalid {field} date (DD/MM/YYYY)")]
    InvalidDate { field: DateField },
    #[error("missing fields")]
    MissingFields,
    #[error("invalid quantity")]
    InvalidQuantity,
    #[error("{0}")]
    NetworkFailure(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ApiError> for SubmitError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotFound(what) => SubmitError::NotFound(what),
            other => SubmitError::NetworkFailure(other.to_string()),
        }
    }
}

/// Where the operator goes after a successful submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AfterSubmit {
    TaskList,
    Home,
}

/// Successful submission.
#[derive(Clone, Debug, PartialEq)]
pub struct Ack {
    pub route: AfterSubmit,
    pub task_id: Option<String>,
    /// Raw server response.
    pub response: serde_json::Value,
}

/// Everything the backend may need about one submission.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRecord {
    pub operator: String,
    pub identity: String,
    pub quantity: f64,
    /// `DD/MM/YYYY` as entered.
    pub validity_date: String,
    pub submitted_at: DateTime<Utc>,
    pub site_id: i64,
    pub was_manual_entry: bool,
    pub task_id: Option<String>,
}

/// The single backend call a submission turns into.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    /// Free capture: new record.
    Create(CreateSubmission),
    /// Task resolution: update of the existing record.
    Update { task_id: String, body: TaskResolution },
}

impl Dispatch {
    pub fn route(&self) -> AfterSubmit {
        match self {
            Dispatch::Create(_) => AfterSubmit::Home,
            Dispatch::Update { .. } => AfterSubmit::TaskList,
        }
    }
}

impl OutboundRecord {
    /// Shape the record for its endpoint: a bound task becomes an update, anything else a create.
    pub fn into_dispatch(self) -> Dispatch {
        match self.task_id {
            Some(task_id) => Dispatch::Update {
                task_id,
                body: TaskResolution {
                    quantidade_realizacao: self.quantity,
                    usuario_realizacao: self.operator,
                    datavalidade_execucao: dates::to_iso(&self.validity_date),
                },
            },
            None => Dispatch::Create(CreateSubmission {
                usuario: self.operator,
                ean: self.identity,
                quantidade: self.quantity,
                data_validade: dates::to_iso(&self.validity_date),
                dt_lancamento: dates::to_iso(
                    &self
                        .submitted_at
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
                cod_filial: self.site_id,
                batida_manual: self.was_manual_entry,
            }),
        }
    }
}

/// Run the preconditions in order; the first failure wins. Returns the parsed quantity.
pub fn check(draft: &Draft) -> Result<f64, SubmitError> {
    if let Some(task) = draft.bound_task() {
        match draft.validation() {
            Some(ValidationStatus::Pending) | None => return Err(SubmitError::ValidationRequired),
            Some(ValidationStatus::Mismatch) => return Err(SubmitError::IdentityMismatch),
            Some(ValidationStatus::Matched) => {}
        }
        if task.id.trim().is_empty() {
            return Err(SubmitError::LostTaskReference);
        }
        if !draft.identity().is_empty() && draft.identity().trim() != task.expected_identity.trim()
        {
            return Err(SubmitError::IdentityDiverges);
        }
    }
    if !dates::is_valid_date(draft.validity_date()) {
        return Err(SubmitError::InvalidDate {
            field: DateField::Validity,
        });
    }
    if !dates::is_valid_date(draft.creation_date()) {
        return Err(SubmitError::InvalidDate {
            field: DateField::Creation,
        });
    }
    if draft.identity().trim().is_empty() || draft.quantity().trim().is_empty() {
        return Err(SubmitError::MissingFields);
    }
    parse_quantity(draft.quantity()).ok_or(SubmitError::InvalidQuantity)
}

/// Accept a decimal comma; only finite values above zero.
pub fn parse_quantity(text: &str) -> Option<f64> {
    let q: f64 = text.trim().replacen(',', ".", 1).parse().ok()?;
    (q.is_finite() && q > 0.0).then_some(q)
}

/// Validate the draft and build the backend call for it.
pub fn resolve(draft: &Draft, session: &Session, now: DateTime<Utc>) -> Result<Dispatch, SubmitError> {
    let quantity = check(draft)?;
    let record = OutboundRecord {
        operator: session.operator_name.clone(),
        identity: draft.identity().trim().to_string(),
        quantity,
        validity_date: draft.validity_date().to_string(),
        submitted_at: now,
        site_id: session.site_id,
        was_manual_entry: draft.identity_editable(),
        task_id: draft.bound_task().map(|t| t.id.clone()),
    };
    Ok(record.into_dispatch())
}

/// Send a resolved dispatch.
pub async fn dispatch(
    backend: &dyn Backend,
    session: &Session,
    dispatch: Dispatch,
) -> Result<Ack, SubmitError> {
    let route = dispatch.route();
    match dispatch {
        Dispatch::Create(body) => {
            tracing::info!("create submission for {}", body.ean);
            let response = backend.create_submission(session, &body).await?;
            Ok(Ack {
                route,
                task_id: None,
                response,
            })
        }
        Dispatch::Update { task_id, body } => {
            tracing::info!("resolve task {task_id}");
            let response = backend.resolve_task(session, &task_id, &body).await?;
            Ok(Ack {
                route,
                task_id: Some(task_id),
                response,
            })
        }
    }
}

/// Check, build and send a submission for `draft`.
///
/// The draft is evaluated as passed in; resetting it on success is the caller's job.
pub async fn submit(
    backend: &dyn Backend,
    draft: &Draft,
    session: &Session,
) -> Result<Ack, SubmitError> {
    let d = resolve(draft, session, Utc::now())?;
    match dispatch(backend, session, d).await {
        Ok(ack) => Ok(ack),
        Err(e) => {
            tracing::error!("submission failed: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::fake::{Call, FakeBackend},
        decode::decode,
        session::test_session,
        tasks::test_task,
    };

    fn ready_free_draft() -> Draft {
        let mut d = Draft::new();
        d.apply_scan(&decode("7891000100103"));
        d.set_quantity("3").unwrap();
        d.set_validity_date("01012030");
        d
    }

    fn ready_bound_draft() -> Draft {
        let mut d = Draft::new();
        d.bind_to_task(test_task("7891000100103"));
        d.apply_scan(&decode("7891000100103"));
        d.set_quantity("2,5").unwrap();
        d.set_validity_date("15062030");
        d
    }

    #[test]
    fn pending_validation_rejected_regardless_of_fields() {
        let mut d = Draft::new();
        d.bind_to_task(test_task("111"));
        d.set_quantity("abc").unwrap();
        assert_eq!(check(&d), Err(SubmitError::ValidationRequired));
    }

    #[test]
    fn mismatch_rejected_regardless_of_fields() {
        let mut d = ready_bound_draft();
        d.apply_scan(&decode("999"));
        assert_eq!(check(&d), Err(SubmitError::IdentityMismatch));
    }

    #[test]
    fn lost_task_id_rejected() {
        let mut d = ready_bound_draft();
        d.clear_task_id();
        assert_eq!(check(&d), Err(SubmitError::LostTaskReference));
    }

    #[test]
    fn diverging_identity_rejected() {
        let mut d = ready_bound_draft();
        d.force_identity("123");
        assert_eq!(check(&d), Err(SubmitError::IdentityDiverges));
    }

    #[test]
    fn dates_checked_in_order() {
        let mut d = ready_free_draft();
        d.set_validity_date("3113");
        assert_eq!(
            check(&d),
            Err(SubmitError::InvalidDate {
                field: DateField::Validity
            })
        );
        d.set_validity_date("01012030");
        d.set_creation_date("99/99/9999");
        assert_eq!(
            check(&d),
            Err(SubmitError::InvalidDate {
                field: DateField::Creation
            })
        );
    }

    #[test]
    fn missing_fields_rejected() {
        let mut d = Draft::new();
        d.set_validity_date("01012030");
        d.set_quantity("1").unwrap();
        assert_eq!(check(&d), Err(SubmitError::MissingFields));

        let mut d = ready_free_draft();
        d.set_quantity("").unwrap();
        assert_eq!(check(&d), Err(SubmitError::MissingFields));
    }

    #[test]
    fn quantity_rules() {
        assert_eq!(parse_quantity("2,5"), Some(2.5));
        assert_eq!(parse_quantity("0.750"), Some(0.75));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("-1"), None);
        assert_eq!(parse_quantity("abc"), None);
        assert_eq!(parse_quantity("inf"), None);

        let mut d = ready_free_draft();
        for bad in ["0", "-1", "x"] {
            d.set_quantity(bad).unwrap();
            assert_eq!(check(&d), Err(SubmitError::InvalidQuantity));
        }
        d.set_quantity("2,5").unwrap();
        assert_eq!(check(&d), Ok(2.5));
    }

    #[test]
    fn free_capture_resolves_to_create() {
        let now = DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut d = ready_free_draft();
        d.enable_manual_entry();
        d.set_identity("7891000100103").unwrap();
        match resolve(&d, &test_session(), now).unwrap() {
            Dispatch::Create(body) => {
                assert_eq!(body.usuario, "Ana");
                assert_eq!(body.ean, "7891000100103");
                assert_eq!(body.quantidade, 3.0);
                assert_eq!(body.data_validade, "2030-01-01");
                assert_eq!(body.dt_lancamento, "2024-06-15T12:00:00.000Z");
                assert_eq!(body.cod_filial, 7);
                assert!(body.batida_manual);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn bound_task_resolves_to_update() {
        let d = ready_bound_draft();
        let dispatch = resolve(&d, &test_session(), Utc::now()).unwrap();
        assert_eq!(dispatch.route(), AfterSubmit::TaskList);
        assert_eq!(
            dispatch,
            Dispatch::Update {
                task_id: "act-1".into(),
                body: TaskResolution {
                    quantidade_realizacao: 2.5,
                    usuario_realizacao: "Ana".into(),
                    datavalidade_execucao: "2030-06-15".into(),
                },
            }
        );
    }

    #[tokio::test]
    async fn submit_bound_draft_issues_update_only() {
        let backend = FakeBackend::default();
        let ack = submit(&backend, &ready_bound_draft(), &test_session())
            .await
            .unwrap();
        assert_eq!(ack.route, AfterSubmit::TaskList);
        assert_eq!(ack.task_id.as_deref(), Some("act-1"));
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Resolve(id, _) if id == "act-1"));
    }

    #[tokio::test]
    async fn submit_free_draft_issues_create() {
        let backend = FakeBackend::default();
        let ack = submit(&backend, &ready_free_draft(), &test_session())
            .await
            .unwrap();
        assert_eq!(ack.route, AfterSubmit::Home);
        assert!(matches!(&backend.calls()[0], Call::Create(b) if !b.batida_manual));
    }

    #[tokio::test]
    async fn rejected_submission_makes_no_call() {
        let backend = FakeBackend::default();
        let mut d = Draft::new();
        d.bind_to_task(test_task("111"));
        let err = submit(&backend, &d, &test_session()).await.unwrap_err();
        assert_eq!(err, SubmitError::ValidationRequired);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn network_failure_is_surfaced() {
        let backend = FakeBackend {
            fail_writes: true,
            ..Default::default()
        };
        let d = ready_free_draft();
        let err = submit(&backend, &d, &test_session()).await.unwrap_err();
        assert!(matches!(err, SubmitError::NetworkFailure(ref m) if m.contains("500")));
        assert_eq!(d.quantity(), "3");
    }
}
