// src/models/funnel.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Funnel {
    pub id: Uuid,
    #[sqlx(rename = "organizacao_id")]
    #[schema(ignore)]
    pub organization_id: Uuid,
    #[schema(example = "Funil de Vendas")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStage {
    pub id: Uuid,
    #[sqlx(rename = "organizacao_id")]
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub funnel_id: Uuid,
    #[schema(example = "Entrada")]
    pub name: String,
    #[schema(example = 0)]
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

// Coloca um contato em uma etapa. No máximo um card por (funil, contato).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelCard {
    pub id: Uuid,
    #[sqlx(rename = "organizacao_id")]
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub funnel_id: Uuid,
    pub stage_id: Uuid,
    pub contact_id: Uuid,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_FUNNEL_NAME: &str = "Funil de Vendas";

// Etapas criadas junto com o funil padrão; a primeira é a de entrada.
pub const DEFAULT_FUNNEL_STAGES: [&str; 5] = [
    "Entrada",
    "Em atendimento",
    "Negociação",
    "Ganho",
    "Perdido",
];

pub const DEFAULT_CARD_ORDER: i32 = 0;
