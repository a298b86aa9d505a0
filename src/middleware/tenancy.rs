// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use uuid::Uuid;

use crate::common::error::ApiError;

// Cabeçalho com a organização que o operador quer acessar
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

fn bad_request(error: &str) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        error: error.to_string(),
        details: None,
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Já validado pelo tenant_guard
        if let Some(tenant) = parts.extensions.get::<TenantContext>() {
            return Ok(*tenant);
        }

        let value = parts
            .headers
            .get(TENANT_ID_HEADER)
            .ok_or_else(|| bad_request("O cabeçalho X-Tenant-ID é obrigatório."))?;

        let value_str = value
            .to_str()
            .map_err(|_| bad_request("Cabeçalho X-Tenant-ID contém caracteres inválidos."))?;

        let tenant_id = Uuid::parse_str(value_str.trim())
            .map_err(|_| bad_request("Cabeçalho X-Tenant-ID inválido (não é um UUID)."))?;

        Ok(TenantContext(tenant_id))
    }
}
