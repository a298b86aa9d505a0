// src/db/contact_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        contact::{Contact, ContactFields, Email, NewEmail, NewPhone, Phone},
        lead::FinancialData,
    },
};

// Responsável pelas tabelas contacts, contact_phones, contact_emails e notes.
// Toda consulta filtra por organizacao_id, além da policy de RLS.
#[derive(Clone, Default)]
pub struct ContactRepository;

impl ContactRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  BUSCA PARA DEDUPLICAÇÃO NA CAPTAÇÃO
    // =========================================================================

    /// Contato dono do telefone canônico (o mais antigo, se houver mais de um).
    pub async fn find_contact_id_by_phone<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        number: &str,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT p.contact_id
            FROM contact_phones p
            JOIN contacts c ON c.id = p.contact_id
            WHERE p.organizacao_id = $1 AND p.number = $2
            ORDER BY c.created_at ASC, c.id ASC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .bind(number)
        .fetch_optional(executor)
        .await?;

        Ok(id)
    }

    pub async fn find_contact_id_by_email<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        address: &str,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT e.contact_id
            FROM contact_emails e
            JOIN contacts c ON c.id = e.contact_id
            WHERE e.organizacao_id = $1 AND lower(e.address) = lower($2)
            ORDER BY c.created_at ASC, c.id ASC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .bind(address)
        .fetch_optional(executor)
        .await?;

        Ok(id)
    }

    // =========================================================================
    //  CONTATOS
    // =========================================================================

    pub async fn create_contact<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        fields: &ContactFields,
    ) -> Result<Contact, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (
                organizacao_id, personality,
                full_name, cpf, birth_date, marital_status, occupation,
                legal_name, trade_name, cnpj, state_registration,
                municipal_registration, legal_representative,
                contact_type, status, source,
                household_income, has_fgts, formal_employment_over_3_years
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(fields.personality)
        .bind(&fields.full_name)
        .bind(&fields.cpf)
        .bind(fields.birth_date)
        .bind(&fields.marital_status)
        .bind(&fields.occupation)
        .bind(&fields.legal_name)
        .bind(&fields.trade_name)
        .bind(&fields.cnpj)
        .bind(&fields.state_registration)
        .bind(&fields.municipal_registration)
        .bind(&fields.legal_representative)
        .bind(fields.contact_type)
        .bind(fields.status)
        .bind(&fields.source)
        .bind(fields.household_income)
        .bind(fields.has_fgts)
        .bind(fields.formal_employment_over_3_years)
        .fetch_one(executor)
        .await?;

        Ok(contact)
    }

    /// Marca o contato como atualizado. Os campos financeiros só são
    /// sobrescritos quando o formulário que chegou é financeiro.
    pub async fn touch_contact<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
        financial: Option<&FinancialData>,
    ) -> Result<Option<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = match financial {
            Some(financial) => {
                sqlx::query_as::<_, Contact>(
                    r#"
                    UPDATE contacts
                    SET household_income = $3,
                        has_fgts = $4,
                        formal_employment_over_3_years = $5,
                        updated_at = NOW()
                    WHERE organizacao_id = $1 AND id = $2
                    RETURNING *
                    "#,
                )
                .bind(organization_id)
                .bind(contact_id)
                .bind(financial.household_income)
                .bind(financial.has_fgts)
                .bind(financial.formal_employment_over_3_years)
                .fetch_optional(executor)
                .await?
            }
            None => {
                sqlx::query_as::<_, Contact>(
                    r#"
                    UPDATE contacts
                    SET updated_at = NOW()
                    WHERE organizacao_id = $1 AND id = $2
                    RETURNING *
                    "#,
                )
                .bind(organization_id)
                .bind(contact_id)
                .fetch_optional(executor)
                .await?
            }
        };

        Ok(contact)
    }

    pub async fn update_contact_fields<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
        fields: &ContactFields,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE contacts
            SET personality = $3,
                full_name = $4, cpf = $5, birth_date = $6,
                marital_status = $7, occupation = $8,
                legal_name = $9, trade_name = $10, cnpj = $11,
                state_registration = $12, municipal_registration = $13,
                legal_representative = $14,
                contact_type = $15, status = $16, source = $17,
                household_income = $18, has_fgts = $19,
                formal_employment_over_3_years = $20,
                updated_at = NOW()
            WHERE organizacao_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(contact_id)
        .bind(fields.personality)
        .bind(&fields.full_name)
        .bind(&fields.cpf)
        .bind(fields.birth_date)
        .bind(&fields.marital_status)
        .bind(&fields.occupation)
        .bind(&fields.legal_name)
        .bind(&fields.trade_name)
        .bind(&fields.cnpj)
        .bind(&fields.state_registration)
        .bind(&fields.municipal_registration)
        .bind(&fields.legal_representative)
        .bind(fields.contact_type)
        .bind(fields.status)
        .bind(&fields.source)
        .bind(fields.household_income)
        .bind(fields.has_fgts)
        .bind(fields.formal_employment_over_3_years)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_contact<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contact = sqlx::query_as::<_, Contact>(
            "SELECT * FROM contacts WHERE organizacao_id = $1 AND id = $2",
        )
        .bind(organization_id)
        .bind(contact_id)
        .fetch_optional(executor)
        .await?;

        Ok(contact)
    }

    pub async fn list_contacts<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
    ) -> Result<Vec<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE organizacao_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await?;

        Ok(contacts)
    }

    /// Lê e trava (FOR UPDATE) os contatos do grupo. Ids de outra organização
    /// simplesmente não voltam.
    pub async fn lock_contacts<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Contact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE organizacao_id = $1 AND id = ANY($2)
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(organization_id)
        .bind(ids)
        .fetch_all(executor)
        .await?;

        Ok(contacts)
    }

    pub async fn delete_contacts<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Telefones e e-mails restantes caem por ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM contacts WHERE organizacao_id = $1 AND id = ANY($2)")
            .bind(organization_id)
            .bind(ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  TELEFONES E E-MAILS
    // =========================================================================

    pub async fn list_phones<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Phone>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let phones = sqlx::query_as::<_, Phone>(
            r#"
            SELECT * FROM contact_phones
            WHERE organizacao_id = $1
              AND ($2::uuid[] IS NULL OR contact_id = ANY($2))
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(organization_id)
        .bind(contact_ids)
        .fetch_all(executor)
        .await?;

        Ok(phones)
    }

    pub async fn list_emails<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Email>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let emails = sqlx::query_as::<_, Email>(
            r#"
            SELECT * FROM contact_emails
            WHERE organizacao_id = $1
              AND ($2::uuid[] IS NULL OR contact_id = ANY($2))
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(organization_id)
        .bind(contact_ids)
        .fetch_all(executor)
        .await?;

        Ok(emails)
    }

    /// Insere o telefone se o contato ainda não o tiver. Retorna se inseriu.
    pub async fn add_phone<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
        phone: &NewPhone,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO contact_phones (organizacao_id, contact_id, number, country_code, kind)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (contact_id, number) DO NOTHING
            "#,
        )
        .bind(organization_id)
        .bind(contact_id)
        .bind(&phone.number)
        .bind(&phone.country_code)
        .bind(&phone.kind)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn add_email<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
        email: &NewEmail,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO contact_emails (organizacao_id, contact_id, address, kind)
            VALUES ($1, $2, lower($3), $4)
            ON CONFLICT (contact_id, address) DO NOTHING
            "#,
        )
        .bind(organization_id)
        .bind(contact_id)
        .bind(&email.address)
        .bind(&email.kind)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_phone<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
        number: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM contact_phones WHERE organizacao_id = $1 AND contact_id = $2 AND number = $3",
        )
        .bind(organization_id)
        .bind(contact_id)
        .bind(number)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn remove_email<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
        address: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM contact_emails WHERE organizacao_id = $1 AND contact_id = $2 AND lower(address) = lower($3)",
        )
        .bind(organization_id)
        .bind(contact_id)
        .bind(address)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  NOTAS
    // =========================================================================

    pub async fn add_note<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        contact_id: Uuid,
        body: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO notes (organizacao_id, contact_id, body) VALUES ($1, $2, $3)")
            .bind(organization_id)
            .bind(contact_id)
            .bind(body)
            .execute(executor)
            .await?;

        Ok(())
    }
}
