// src/db/employee_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::employee::Employee};

#[derive(Clone, Default)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn new() -> Self {
        Self
    }

    /// Funcionários que ainda não têm contato vinculado.
    pub async fn list_unlinked<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
    ) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT * FROM employees
            WHERE organizacao_id = $1 AND contact_id IS NULL
            ORDER BY full_name ASC, id ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await?;

        Ok(employees)
    }

    pub async fn find_employee<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE organizacao_id = $1 AND id = $2",
        )
        .bind(organization_id)
        .bind(employee_id)
        .fetch_optional(executor)
        .await?;

        Ok(employee)
    }

    pub async fn link_contact<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        employee_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET contact_id = $3
            WHERE organizacao_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(employee_id)
        .bind(contact_id)
        .fetch_optional(executor)
        .await?;

        Ok(employee)
    }
}
