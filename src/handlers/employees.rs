// src/handlers/employees.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::employee::{Employee, EmployeeLinkSuggestion},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkContactPayload {
    pub contact_id: Uuid,
}

// GET /api/hr/employees/contact-suggestions
#[utoipa::path(
    get,
    path = "/api/hr/employees/contact-suggestions",
    tag = "HR",
    responses(
        (status = 200, description = "Sugestões de vínculo funcionário -> contato", body = Vec<EmployeeLinkSuggestion>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contact_suggestions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let suggestions = app_state
        .employee_link_service
        .suggestions(tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(suggestions)))
}

// POST /api/hr/employees/{id}/contact
#[utoipa::path(
    post,
    path = "/api/hr/employees/{id}/contact",
    tag = "HR",
    request_body = LinkContactPayload,
    responses(
        (status = 200, description = "Funcionário vinculado", body = Employee),
        (status = 404, description = "Funcionário ou contato fora da organização")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do funcionário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn link_contact(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(employee_id): Path<Uuid>,
    Json(payload): Json<LinkContactPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = app_state
        .employee_link_service
        .accept(tenant.0, employee_id, payload.contact_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(employee)))
}
