//! HTTP client for the collection backend.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::{
    ApiError, Backend,
    models::{
        ApiPendingActivity, CreateSubmission, EndSessionReq, ErrorBody, LoginReq, LoginResp,
        ProductDetails, TaskResolution,
    },
};
use crate::{config::ApiCfg, session::Session, tasks::PendingTask};

/// Bearer-authenticated JSON client rooted at the configured base URL.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(cfg: &ApiCfg) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, cpf: &str, matricula: &str) -> Result<Session, ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginReq { cpf, matricula })
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let body = resp.json::<LoginResp>().await?;
        match body.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(Session {
                operator_name: body.nome.unwrap_or_default(),
                site_id: body.filial.unwrap_or_default(),
                access_token,
                operator_matricula: matricula.to_string(),
            }),
            _ => Err(ApiError::Rejected(
                body.message
                    .unwrap_or_else(|| "authentication failed".into()),
            )),
        }
    }

    async fn end_session(&self, session: &Session) -> Result<(), ApiError> {
        let resp = self
            .http
            .patch(self.url("/sessions/"))
            .bearer_auth(&session.access_token)
            .json(&EndSessionReq {
                number_registration: &session.operator_matricula,
            })
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn pending_tasks(&self, session: &Session) -> Result<Vec<PendingTask>, ApiError> {
        let url = self.url(&format!("/activities/pending/{}", session.site_id));
        let resp = self
            .http
            .get(url)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let items = resp.json::<Vec<ApiPendingActivity>>().await?;
        Ok(items.into_iter().map(PendingTask::from).collect())
    }

    async fn task_detail(
        &self,
        session: &Session,
        task_id: &str,
    ) -> Result<ApiPendingActivity, ApiError> {
        let url = self.url(&format!("/activities/{}", urlencoding::encode(task_id)));
        let resp = self
            .http
            .get(url)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json::<ApiPendingActivity>().await?)
    }

    async fn product(&self, session: &Session, identity: &str) -> Result<ProductDetails, ApiError> {
        let url = self.url(&format!("/products/{}", urlencoding::encode(identity)));
        let resp = self
            .http
            .get(url)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json::<ProductDetails>().await?)
    }

    async fn create_submission(
        &self,
        session: &Session,
        body: &CreateSubmission,
    ) -> Result<serde_json::Value, ApiError> {
        let resp = self
            .http
            .post(self.url("/batidas"))
            .bearer_auth(&session.access_token)
            .json(body)
            .send()
            .await?;
        read_json_or_null(ensure_success(resp).await?).await
    }

    async fn resolve_task(
        &self,
        session: &Session,
        task_id: &str,
        body: &TaskResolution,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url(&format!("/activities/{}", urlencoding::encode(task_id)));
        let resp = self
            .http
            .patch(url)
            .bearer_auth(&session.access_token)
            .json(body)
            .send()
            .await?;
        read_json_or_null(ensure_success(resp).await?).await
    }
}

/// Write endpoints may answer with an empty body.
async fn read_json_or_null(resp: reqwest::Response) -> Result<serde_json::Value, ApiError> {
    let text = resp.text().await?;
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
}

/// Convert non-2xx responses into a structured error.
async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_else(|_| "".into());
    Err(status_error(status, body))
}

fn status_error(status: StatusCode, body: String) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty());
    match (status, message) {
        (StatusCode::NOT_FOUND, m) => ApiError::NotFound(m.unwrap_or(body)),
        (StatusCode::UNAUTHORIZED, None) => ApiError::Unauthorized,
        (_, Some(m)) => ApiError::Rejected(m),
        (_, None) => ApiError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_classified() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "".into()),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "".into()),
            ApiError::Unauthorized
        ));
        match status_error(StatusCode::BAD_REQUEST, r#"{"message":"CPF inválido"}"#.into()) {
            ApiError::Rejected(m) => assert_eq!(m, "CPF inválido"),
            other => panic!("unexpected {other:?}"),
        }
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, "oops".into()) {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "oops");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let b = HttpBackend::new(&ApiCfg {
            base_url: "http://host/api/".into(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(b.url("/batidas"), "http://host/api/batidas");
    }
}
