// src/handlers/leads.rs

use std::collections::HashMap;

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::lead::{LeadForm, LeadFormDoc},
};

// POST /api/public/leads
#[utoipa::path(
    post,
    path = "/api/public/leads",
    tag = "Leads",
    request_body(content = LeadFormDoc, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redireciona para a página de obrigado"),
        (status = 400, description = "Formulário sem nome")
    )
)]
pub async fn submit_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Form(raw): Form<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    // Só a falta de nome volta para o visitante; o resto vira log
    let request = LeadForm::from(raw)
        .parse()
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let redirect = app_state.intake_service.submit(request).await;

    Ok(Redirect::to(&redirect.location))
}
