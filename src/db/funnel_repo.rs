// src/db/funnel_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::funnel::{Funnel, FunnelCard, FunnelStage},
};

#[derive(Clone, Default)]
pub struct FunnelRepository;

impl FunnelRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_funnel_by_id<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        funnel_id: Uuid,
    ) -> Result<Option<Funnel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let funnel = sqlx::query_as::<_, Funnel>(
            "SELECT * FROM funnels WHERE organizacao_id = $1 AND id = $2",
        )
        .bind(organization_id)
        .bind(funnel_id)
        .fetch_optional(executor)
        .await?;

        Ok(funnel)
    }

    pub async fn find_funnel_by_name<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<Funnel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let funnel = sqlx::query_as::<_, Funnel>(
            "SELECT * FROM funnels WHERE organizacao_id = $1 AND name = $2",
        )
        .bind(organization_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;

        Ok(funnel)
    }

    /// Cria o funil (com o id configurado, quando houver). Se outra requisição
    /// criou o mesmo nome ao mesmo tempo, devolve o funil existente.
    pub async fn create_funnel<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        name: &str,
        funnel_id: Option<Uuid>,
    ) -> Result<Funnel, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let funnel = sqlx::query_as::<_, Funnel>(
            r#"
            INSERT INTO funnels (id, organizacao_id, name)
            VALUES (COALESCE($3, gen_random_uuid()), $1, $2)
            ON CONFLICT (organizacao_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(name)
        .bind(funnel_id)
        .fetch_one(executor)
        .await?;

        Ok(funnel)
    }

    /// Etapas do funil em ordem de posição (a primeira é a de entrada).
    pub async fn list_stages<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        funnel_id: Uuid,
    ) -> Result<Vec<FunnelStage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stages = sqlx::query_as::<_, FunnelStage>(
            r#"
            SELECT * FROM funnel_stages
            WHERE organizacao_id = $1 AND funnel_id = $2
            ORDER BY position ASC
            "#,
        )
        .bind(organization_id)
        .bind(funnel_id)
        .fetch_all(executor)
        .await?;

        Ok(stages)
    }

    pub async fn create_stage<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        funnel_id: Uuid,
        name: &str,
        position: i32,
    ) -> Result<FunnelStage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stage = sqlx::query_as::<_, FunnelStage>(
            r#"
            INSERT INTO funnel_stages (organizacao_id, funnel_id, name, position)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (funnel_id, position) DO UPDATE SET name = funnel_stages.name
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(funnel_id)
        .bind(name)
        .bind(position)
        .fetch_one(executor)
        .await?;

        Ok(stage)
    }

    pub async fn find_card<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        funnel_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<FunnelCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let card = sqlx::query_as::<_, FunnelCard>(
            r#"
            SELECT * FROM funnel_cards
            WHERE organizacao_id = $1 AND funnel_id = $2 AND contact_id = $3
            "#,
        )
        .bind(organization_id)
        .bind(funnel_id)
        .bind(contact_id)
        .fetch_optional(executor)
        .await?;

        Ok(card)
    }

    /// Cria o card se o contato ainda não estiver no funil. Nunca move um card existente.
    pub async fn insert_card<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        funnel_id: Uuid,
        stage_id: Uuid,
        contact_id: Uuid,
        display_order: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO funnel_cards (organizacao_id, funnel_id, stage_id, contact_id, display_order)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (funnel_id, contact_id) DO NOTHING
            "#,
        )
        .bind(organization_id)
        .bind(funnel_id)
        .bind(stage_id)
        .bind(contact_id)
        .bind(display_order)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
