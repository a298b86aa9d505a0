use sqlx::PgConnection;
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Define a organização da transação corrente (`set_config(..., true)` vale só até o commit).
/// As policies de RLS das tabelas de CRM leem `app.organization_id`.
pub(crate) async fn set_tenant_scope(
    conn: &mut PgConnection,
    organization_id: Uuid,
) -> Result<(), AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    sqlx::query("SELECT set_config('app.organization_id', $1, true)")
        .bind(organization_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(())
}
