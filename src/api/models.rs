//! Request and response bodies as the backend names them.

use serde::{Deserialize, Serialize};

use crate::{dates, tasks::PendingTask};

/// Login request body.
#[derive(Debug, Serialize)]
pub struct LoginReq<'a> {
    pub cpf: &'a str,
    pub matricula: &'a str,
}

/// Login response; every field is optional because failures reuse the shape.
#[derive(Debug, Deserialize)]
pub struct LoginResp {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
    pub nome: Option<String>,
    pub filial: Option<i64>,
    pub message: Option<String>,
}

/// Error body some endpoints return.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// Pending activity as listed by the backend; also the task detail body.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiPendingActivity {
    pub id: String,
    #[serde(default)]
    pub codigo_produto: Option<i64>,
    #[serde(default)]
    pub descricao_produto: Option<String>,
    #[serde(default)]
    pub data_criacao: Option<String>,
    #[serde(default)]
    pub tipo_atividade: Option<String>,
    #[serde(default)]
    pub cod_ean: Option<String>,
}

impl ApiPendingActivity {
    /// Product code the task expects, if the backend sent a usable one.
    pub fn ean(&self) -> Option<&str> {
        self.cod_ean
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

impl From<ApiPendingActivity> for PendingTask {
    fn from(a: ApiPendingActivity) -> Self {
        let expected_identity = a.ean().unwrap_or("N/A").to_string();
        let created_date = a
            .data_criacao
            .as_deref()
            .and_then(dates::from_backend)
            .unwrap_or_else(|| "N/A".into());
        Self {
            id: a.id,
            expected_identity,
            description: a.descricao_produto.unwrap_or_default(),
            created_date,
            kind: a.tipo_atividade.unwrap_or_default(),
            product_code: a.codigo_produto,
        }
    }
}

/// Product lookup response.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ProductDetails {
    #[serde(rename = "DESCRICAO", default)]
    pub description: Option<String>,
    #[serde(rename = "COD_EAN", default)]
    pub ean: Option<String>,
    #[serde(rename = "CODPROD_CONSINCO", default)]
    pub internal_code: Option<i64>,
}

/// Body of `POST /batidas` (free capture).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CreateSubmission {
    pub usuario: String,
    pub ean: String,
    pub quantidade: f64,
    /// `YYYY-MM-DD`
    pub data_validade: String,
    pub dt_lancamento: String,
    pub cod_filial: i64,
    pub batida_manual: bool,
}

/// Body of `PATCH /activities/{id}` (task resolution).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TaskResolution {
    pub quantidade_realizacao: f64,
    pub usuario_realizacao: String,
    /// `YYYY-MM-DD`
    pub datavalidade_execucao: String,
}

/// Body of `PATCH /sessions/`.
#[derive(Debug, Serialize)]
pub struct EndSessionReq<'a> {
    pub number_registration: &'a str,
}
