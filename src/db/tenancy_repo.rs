// src/db/tenancy_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;

// Único repositório com pool próprio: as consultas daqui rodam fora do escopo
// de uma organização (antes de sabermos qual é).
#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verifica se o usuário é membro da organização.
    pub async fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, AppError> {
        // SELECT EXISTS devolve só true/false
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM organization_members
                WHERE user_id = $1 AND organizacao_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Organização que recebe os leads públicos quando nenhuma foi configurada:
    /// a mais antiga.
    pub async fn find_default_organization(&self) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM organizations ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }
}
