// src/handlers/dedup.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::dedup::{
        BatchMergeReport, DuplicateGroup, FieldResolution, MatchType, MergeField, MergePlan,
        MergeResult,
    },
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSourcePayload {
    pub field: MergeField,
    pub contact_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergePayload {
    #[validate(length(min = 2, message = "merge_group_too_small"))]
    pub member_ids: Vec<Uuid>,
    /// Sem sobrevivente o mais antigo vence e os campos vazios são completados pelos demais.
    pub survivor_id: Option<Uuid>,
    #[serde(default)]
    pub field_sources: Vec<FieldSourcePayload>,
    /// Telefones que não devem ir para o sobrevivente.
    #[serde(default)]
    pub excluded_phones: Vec<String>,
    #[serde(default)]
    pub excluded_emails: Vec<String>,
}

impl MergePayload {
    fn into_plan(self) -> MergePlan {
        let resolution = match self.survivor_id {
            Some(survivor_id) => FieldResolution::Manual {
                survivor_id,
                field_sources: self
                    .field_sources
                    .into_iter()
                    .map(|s| (s.field, s.contact_id))
                    .collect::<HashMap<_, _>>(),
            },
            None => FieldResolution::OldestWins,
        };

        MergePlan {
            member_ids: self.member_ids,
            resolution,
            excluded_phones: self.excluded_phones,
            excluded_emails: self.excluded_emails,
        }
    }
}

// GET /api/crm/duplicates
#[utoipa::path(
    get,
    path = "/api/crm/duplicates",
    tag = "Duplicates",
    responses(
        (status = 200, description = "Grupos de contatos duplicados", body = Vec<DuplicateGroup>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_duplicates(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let groups = app_state
        .dedup_service
        .list_groups(tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(groups)))
}

// GET /api/crm/duplicates/{match_type}/{key}
#[utoipa::path(
    get,
    path = "/api/crm/duplicates/{match_type}/{key}",
    tag = "Duplicates",
    responses(
        (status = 200, description = "Grupo relido do banco", body = DuplicateGroup),
        (status = 404, description = "Grupo não existe mais")
    ),
    params(
        ("match_type" = MatchType, Path, description = "Chave de colisão"),
        ("key" = String, Path, description = "Valor normalizado"),
        ("x-tenant-id" = Uuid, Header, description = "ID da organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_duplicate_group(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path((match_type, key)): Path<(MatchType, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let group = app_state
        .dedup_service
        .find_group(tenant.0, match_type, &key)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(group)))
}

// POST /api/crm/duplicates/merge
#[utoipa::path(
    post,
    path = "/api/crm/duplicates/merge",
    tag = "Duplicates",
    request_body = MergePayload,
    responses(
        (status = 200, description = "Contatos unificados", body = MergeResult),
        (status = 400, description = "Plano de unificação inválido"),
        (status = 404, description = "Contato fora da organização")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn merge_contacts(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    user: AuthenticatedUser,
    Json(payload): Json<MergePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!(
        "Unificação manual de {} contato(s) pedida por {}",
        payload.member_ids.len(),
        user.0.sub
    );

    let result = app_state
        .dedup_service
        .merge(tenant.0, payload.into_plan())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

// POST /api/crm/duplicates/merge-all
#[utoipa::path(
    post,
    path = "/api/crm/duplicates/merge-all",
    tag = "Duplicates",
    responses(
        (status = 200, description = "Relatório do passe automático", body = BatchMergeReport),
        (status = 409, description = "Um grupo falhou; os anteriores continuam unificados")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn merge_all_duplicates(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .dedup_service
        .merge_all(tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}
