use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro interno. Os handlers convertem para ApiError (localizado).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Formulário sem nome do lead")]
    MissingLeadName,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado à organização")]
    Forbidden,

    #[error("Nenhuma organização padrão encontrada")]
    DefaultOrganizationNotFound,

    #[error("Funil de vendas indisponível: {0}")]
    FunnelUnavailable(String),

    #[error("Contato não encontrado: {0}")]
    ContactNotFound(uuid::Uuid),

    #[error("Grupo de duplicados não encontrado")]
    DuplicateGroupNotFound,

    #[error("Um grupo de unificação precisa de pelo menos dois contatos")]
    MergeGroupTooSmall,

    #[error("O contato sobrevivente {0} não pertence ao grupo")]
    SurvivorNotInGroup(uuid::Uuid),

    #[error("Campo '{field}' aponta para o contato {source_id}, que não pertence ao grupo")]
    InvalidMergeField { field: String, source_id: uuid::Uuid },

    #[error("Funcionário não encontrado: {0}")]
    EmployeeNotFound(uuid::Uuid),

    #[error("Unificação automática falhou no grupo {group} ({merged_before} grupos já unificados): {source}")]
    BatchMergeFailed {
        group: String,
        merged_before: usize,
        #[source]
        source: Box<AppError>,
    },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro na chamada HTTP externa: {0}")]
    OutboundHttp(#[from] reqwest::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Código estável usado como chave de tradução.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::MissingLeadName => "missing_lead_name",
            AppError::InvalidToken | AppError::JwtError(_) => "invalid_token",
            AppError::Forbidden => "forbidden",
            AppError::DefaultOrganizationNotFound => "default_organization_not_found",
            AppError::FunnelUnavailable(_) => "funnel_unavailable",
            AppError::ContactNotFound(_) => "contact_not_found",
            AppError::DuplicateGroupNotFound => "duplicate_group_not_found",
            AppError::MergeGroupTooSmall => "merge_group_too_small",
            AppError::SurvivorNotInGroup(_) => "survivor_not_in_group",
            AppError::InvalidMergeField { .. } => "invalid_merge_field",
            AppError::EmployeeNotFound(_) => "employee_not_found",
            AppError::BatchMergeFailed { .. } => "batch_merge_failed",
            AppError::DatabaseError(_)
            | AppError::OutboundHttp(_)
            | AppError::InternalServerError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingLeadName
            | AppError::MergeGroupTooSmall
            | AppError::SurvivorNotInGroup(_)
            | AppError::InvalidMergeField { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            // Contato de outra organização é tratado como inexistente.
            AppError::ContactNotFound(_)
            | AppError::DuplicateGroupNotFound
            | AppError::EmployeeNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BatchMergeFailed { .. } => StatusCode::CONFLICT,
            AppError::DefaultOrganizationNotFound
            | AppError::FunnelUnavailable(_)
            | AppError::DatabaseError(_)
            | AppError::OutboundHttp(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro interno na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let error = store.message(&locale.0, self.code());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(store.message(&locale.0, code))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            AppError::SurvivorNotInGroup(id) | AppError::ContactNotFound(id) => {
                Some(json!({ "contactId": id }))
            }
            AppError::EmployeeNotFound(id) => Some(json!({ "employeeId": id })),
            AppError::InvalidMergeField { field, source_id } => {
                Some(json!({ "field": field, "contactId": source_id }))
            }
            AppError::BatchMergeFailed { group, merged_before, source } => Some(json!({
                "group": group,
                "mergedBefore": merged_before,
                "cause": store.message(&locale.0, source.code()),
            })),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// O erro que sai pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
