// src/services/tenancy_service.rs

use uuid::Uuid;

use crate::{common::error::AppError, db::ContactStore};

/// Operações de organização que acontecem antes de existir um escopo:
/// achar a organização dos formulários públicos e checar se o usuário é membro.
#[derive(Clone)]
pub struct TenantResolver<S: ContactStore> {
    store: S,
    configured_default: Option<Uuid>,
}

impl<S: ContactStore> TenantResolver<S> {
    pub fn new(store: S, configured_default: Option<Uuid>) -> Self {
        Self { store, configured_default }
    }

    /// Organização que recebe os leads das landing pages.
    pub async fn resolve_default(&self) -> Result<Uuid, AppError> {
        if let Some(id) = self.configured_default {
            return Ok(id);
        }

        self.store
            .find_default_organization()
            .await?
            .ok_or(AppError::DefaultOrganizationNotFound)
    }

    pub async fn ensure_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<(), AppError> {
        if self.store.is_member(user_id, organization_id).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
