//! Backend REST access.

/// reqwest implementation of [`Backend`].
pub mod client;
/// Wire payloads.
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

use crate::{session::Session, tasks::PendingTask};
use models::{ApiPendingActivity, CreateSubmission, ProductDetails, TaskResolution};

/// Failures talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized")]
    Unauthorized,
    /// Non-2xx carrying a server-provided message.
    #[error("{0}")]
    Rejected(String),
    #[error("HTTP status {status} error: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Operations the capture workflow needs from the server.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, cpf: &str, matricula: &str) -> Result<Session, ApiError>;
    /// `PATCH /sessions/`
    async fn end_session(&self, session: &Session) -> Result<(), ApiError>;
    /// `GET /activities/pending/{siteId}`
    async fn pending_tasks(&self, session: &Session) -> Result<Vec<PendingTask>, ApiError>;
    /// `GET /activities/{id}`, as sent by the server.
    async fn task_detail(
        &self,
        session: &Session,
        task_id: &str,
    ) -> Result<ApiPendingActivity, ApiError>;
    /// `GET /products/{identity}`
    async fn product(&self, session: &Session, identity: &str) -> Result<ProductDetails, ApiError>;
    /// `POST /batidas`
    async fn create_submission(
        &self,
        session: &Session,
        body: &CreateSubmission,
    ) -> Result<serde_json::Value, ApiError>;
    /// `PATCH /activities/{id}`
    async fn resolve_task(
        &self,
        session: &Session,
        task_id: &str,
        body: &TaskResolution,
    ) -> Result<serde_json::Value, ApiError>;
}
