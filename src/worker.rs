//! Background worker handling backend calls.

use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    api::{ApiError, Backend},
    draft::Draft,
    session::Session,
    submit::{self, Ack, SubmitError},
    tasks::PendingTask,
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Authenticate the operator.
    SignIn { cpf: String, matricula: String },
    /// End the session server-side (best effort).
    SignOut(Session),
    /// Reload the pending task list for the session's site.
    RefreshTasks(Session),
    /// Fetch the authoritative identity of a task just bound to the draft.
    LoadTaskDetail { session: Session, task_id: String },
    /// Fetch the description for an identity.
    LookupProduct { session: Session, identity: String },
    /// Validate and send a draft snapshot.
    Submit {
        request_id: Uuid,
        session: Session,
        draft: Box<Draft>,
    },
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    SignedIn(Session),
    SignInFailed(String),
    SignedOut,
    TasksLoaded(Vec<PendingTask>),
    TaskDetail { task_id: String, identity: String },
    /// Description lookup result; `None` when missing or failed.
    Product {
        identity: String,
        description: Option<String>,
    },
    Submitted { request_id: Uuid, ack: Ack },
    SubmitFailed { request_id: Uuid, error: SubmitError },
    /// Informational log message.
    Log(String),
    /// User-visible error message.
    Error(String),
}

/// Main worker loop: handle commands sequentially until the UI hangs up.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    backend: Arc<dyn Backend>,
) {
    tracing::info!("worker started");
    while let Some(cmd) = rx.recv().await {
        let ev = handle(backend.as_ref(), cmd).await;
        if tx.send(ev).await.is_err() {
            break;
        }
    }
    tracing::info!("worker stopped");
}

/// Execute one command and produce the event describing its outcome.
pub async fn handle(backend: &dyn Backend, cmd: WorkerCmd) -> WorkerEvent {
    match cmd {
        WorkerCmd::SignIn { cpf, matricula } => {
            if cpf.trim().is_empty() || matricula.trim().is_empty() {
                return WorkerEvent::SignInFailed("identification required".into());
            }
            match backend.login(cpf.trim(), matricula.trim()).await {
                Ok(session) => WorkerEvent::SignedIn(session),
                Err(e) => {
                    tracing::warn!("login failed: {e}");
                    WorkerEvent::SignInFailed(login_message(&e))
                }
            }
        }

        WorkerCmd::SignOut(session) => {
            if !session.operator_matricula.is_empty()
                && let Err(e) = backend.end_session(&session).await
            {
                tracing::warn!("end session failed: {e}");
            }
            WorkerEvent::SignedOut
        }

        WorkerCmd::RefreshTasks(session) => match backend.pending_tasks(&session).await {
            Ok(tasks) => {
                tracing::info!("pending tasks loaded: {}", tasks.len());
                WorkerEvent::TasksLoaded(tasks)
            }
            Err(e) => {
                tracing::error!("pending task list failed: {e}");
                WorkerEvent::Error(format!("task list failed: {e}"))
            }
        },

        WorkerCmd::LoadTaskDetail { session, task_id } => {
            match backend.task_detail(&session, &task_id).await {
                Ok(detail) => match detail.ean() {
                    Some(ean) => WorkerEvent::TaskDetail {
                        task_id,
                        identity: ean.to_string(),
                    },
                    // the summary identity stays in place
                    None => {
                        tracing::warn!("task detail {task_id} has no product code");
                        WorkerEvent::Log(format!("task {task_id}: detail without product code"))
                    }
                },
                Err(e) => {
                    // the summary identity stays in place
                    tracing::warn!("task detail {task_id} failed: {e}");
                    WorkerEvent::Log(format!("task detail unavailable: {e}"))
                }
            }
        }

        WorkerCmd::LookupProduct { session, identity } => {
            let description = match backend.product(&session, &identity).await {
                Ok(p) => {
                    tracing::info!(
                        "product {identity}: ean {:?}, internal code {:?}",
                        p.ean,
                        p.internal_code
                    );
                    p.description
                }
                Err(e) => {
                    tracing::warn!("product lookup {identity} failed: {e}");
                    None
                }
            };
            WorkerEvent::Product {
                identity,
                description,
            }
        }

        WorkerCmd::Submit {
            request_id,
            session,
            draft,
        } => match submit::submit(backend, &draft, &session).await {
            Ok(ack) => {
                tracing::info!("submission {request_id} done: {}", ack.response);
                WorkerEvent::Submitted { request_id, ack }
            }
            Err(error) => WorkerEvent::SubmitFailed { request_id, error },
        },
    }
}

fn login_message(e: &ApiError) -> String {
    match e {
        ApiError::Rejected(m) => m.clone(),
        ApiError::Transport(_) => "server offline".into(),
        _ => "invalid credentials".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{
            fake::{Call, FakeBackend},
            models::ApiPendingActivity,
        },
        decode::decode,
        session::test_session,
        tasks::test_task,
    };

    #[tokio::test]
    async fn sign_in_requires_both_fields() {
        let b = FakeBackend::default();
        let ev = handle(
            &b,
            WorkerCmd::SignIn {
                cpf: "".into(),
                matricula: "1".into(),
            },
        )
        .await;
        assert!(matches!(ev, WorkerEvent::SignInFailed(m) if m == "identification required"));
    }

    #[tokio::test]
    async fn sign_in_surfaces_server_message() {
        let b = FakeBackend::default();
        let ev = handle(
            &b,
            WorkerCmd::SignIn {
                cpf: "000".into(),
                matricula: "1".into(),
            },
        )
        .await;
        assert!(matches!(ev, WorkerEvent::SignInFailed(m) if m == "CPF desconhecido"));

        let ev = handle(
            &b,
            WorkerCmd::SignIn {
                cpf: "123".into(),
                matricula: "55".into(),
            },
        )
        .await;
        assert!(matches!(ev, WorkerEvent::SignedIn(s) if s.operator_matricula == "55"));
    }

    #[tokio::test]
    async fn sign_out_ends_session_when_matricula_known() {
        let b = FakeBackend::default();
        let ev = handle(&b, WorkerCmd::SignOut(test_session())).await;
        assert!(matches!(ev, WorkerEvent::SignedOut));
        assert_eq!(b.calls(), vec![Call::EndSession("1234".into())]);

        let b = FakeBackend::default();
        let mut s = test_session();
        s.operator_matricula.clear();
        handle(&b, WorkerCmd::SignOut(s)).await;
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn detail_failure_is_silent() {
        let b = FakeBackend::default();
        let ev = handle(
            &b,
            WorkerCmd::LoadTaskDetail {
                session: test_session(),
                task_id: "missing".into(),
            },
        )
        .await;
        assert!(matches!(ev, WorkerEvent::Log(_)));
    }

    fn detail(body: serde_json::Value) -> ApiPendingActivity {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn detail_without_product_code_keeps_summary_identity() {
        for body in [
            serde_json::json!({ "id": "act-1" }),
            serde_json::json!({ "id": "act-1", "cod_ean": "  " }),
        ] {
            let b = FakeBackend {
                details: vec![detail(body)],
                ..Default::default()
            };
            let ev = handle(
                &b,
                WorkerCmd::LoadTaskDetail {
                    session: test_session(),
                    task_id: "act-1".into(),
                },
            )
            .await;
            assert!(matches!(ev, WorkerEvent::Log(_)), "got {ev:?}");
        }
    }

    #[tokio::test]
    async fn detail_returns_authoritative_identity() {
        let b = FakeBackend {
            details: vec![detail(
                serde_json::json!({ "id": "act-1", "cod_ean": "7890000000001" }),
            )],
            ..Default::default()
        };
        let ev = handle(
            &b,
            WorkerCmd::LoadTaskDetail {
                session: test_session(),
                task_id: "act-1".into(),
            },
        )
        .await;
        assert!(
            matches!(ev, WorkerEvent::TaskDetail { identity, .. } if identity == "7890000000001")
        );
    }

    #[tokio::test]
    async fn product_lookup_failure_yields_no_description() {
        let b = FakeBackend {
            products: vec![("789".into(), "ARROZ".into())],
            ..Default::default()
        };
        let ok = handle(
            &b,
            WorkerCmd::LookupProduct {
                session: test_session(),
                identity: "789".into(),
            },
        )
        .await;
        assert!(matches!(ok, WorkerEvent::Product { description: Some(d), .. } if d == "ARROZ"));

        let missing = handle(
            &b,
            WorkerCmd::LookupProduct {
                session: test_session(),
                identity: "000".into(),
            },
        )
        .await;
        assert!(matches!(missing, WorkerEvent::Product { description: None, .. }));
    }

    #[tokio::test]
    async fn submit_snapshot_is_independent_of_later_edits() {
        let b = FakeBackend::default();
        let mut draft = Draft::new();
        draft.apply_scan(&decode("789"));
        draft.set_quantity("4").unwrap();
        draft.set_validity_date("01012030");
        let snapshot = Box::new(draft.clone());
        draft.set_quantity("-1").unwrap();

        let id = Uuid::new_v4();
        let ev = handle(
            &b,
            WorkerCmd::Submit {
                request_id: id,
                session: test_session(),
                draft: snapshot,
            },
        )
        .await;
        assert!(matches!(ev, WorkerEvent::Submitted { request_id, .. } if request_id == id));
        assert!(matches!(&b.calls()[0], Call::Create(body) if body.quantidade == 4.0));
    }

    #[tokio::test]
    async fn run_loop_replies_per_command() {
        let (tx_cmd, rx_cmd) = mpsc::channel(4);
        let (tx_ev, mut rx_ev) = mpsc::channel(4);
        let backend: Arc<dyn Backend> = Arc::new(FakeBackend {
            tasks: vec![test_task("1")],
            ..Default::default()
        });
        let h = tokio::spawn(run(rx_cmd, tx_ev, backend));
        tx_cmd
            .send(WorkerCmd::RefreshTasks(test_session()))
            .await
            .unwrap();
        let ev = rx_ev.recv().await.unwrap();
        assert!(matches!(ev, WorkerEvent::TasksLoaded(t) if t.len() == 1));
        drop(tx_cmd);
        h.await.unwrap();
    }
}
