// src/db/merge_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::dedup::RelinkTarget};

// Re-aponta as tabelas filhas dos contatos secundários para o sobrevivente.
#[derive(Clone, Default)]
pub struct MergeRepository;

impl MergeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn relink<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        target: RelinkTarget,
        from: &[Uuid],
        to: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O nome da tabela vem de um enum fechado, nunca da requisição
        let sql = format!(
            "UPDATE {} SET contact_id = $3 WHERE organizacao_id = $1 AND contact_id = ANY($2)",
            target.table()
        );

        let result = sqlx::query(&sql)
            .bind(organization_id)
            .bind(from)
            .bind(to)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Antes de re-apontar os cards: apaga os cards dos secundários em funis onde
    /// o sobrevivente já está, e os repetidos entre secundários (fica o mais antigo).
    /// Sem isso o UNIQUE (funnel_id, contact_id) derruba a unificação.
    pub async fn drop_conflicting_cards<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        from: &[Uuid],
        to: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM funnel_cards fc
            WHERE fc.organizacao_id = $1
              AND fc.contact_id = ANY($2)
              AND (
                EXISTS (
                    SELECT 1 FROM funnel_cards s
                    WHERE s.organizacao_id = $1
                      AND s.funnel_id = fc.funnel_id
                      AND s.contact_id = $3
                )
                OR EXISTS (
                    SELECT 1 FROM funnel_cards o
                    WHERE o.organizacao_id = $1
                      AND o.funnel_id = fc.funnel_id
                      AND o.contact_id = ANY($2)
                      AND (o.created_at, o.id) < (fc.created_at, fc.id)
                )
              )
            "#,
        )
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
