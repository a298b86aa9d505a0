// src/models/employee.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    #[sqlx(rename = "organizacao_id")]
    #[schema(ignore)]
    pub organization_id: Uuid,
    #[schema(example = "Carlos Souza")]
    pub full_name: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub contact_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Sinal que ligou o funcionário ao contato, do mais forte para o mais fraco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LinkSignal {
    Phone,
    Name,
    Cpf,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkCandidate {
    pub contact_id: Uuid,
    pub contact_name: Option<String>,
    pub signal: LinkSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLinkSuggestion {
    pub employee: Employee,
    pub candidates: Vec<LinkCandidate>,
}
