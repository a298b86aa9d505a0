// src/db/store.rs
//
// Fronteira entre os serviços e o banco. Toda escrita acontece dentro de uma
// transação aberta para uma organização; a transação carrega o escopo e os
// métodos não recebem organizacao_id de fora.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{db_utils::set_tenant_scope, error::AppError},
    db::{ContactRepository, EmployeeRepository, FunnelRepository, MergeRepository, TenantRepository},
    models::{
        contact::{Contact, ContactFields, ContactRecord, Email, NewEmail, NewPhone, Phone},
        dedup::RelinkTarget,
        employee::Employee,
        funnel::{Funnel, FunnelCard, FunnelStage},
        lead::FinancialData,
    },
};

#[async_trait]
pub trait ContactStore: Clone + Send + Sync + 'static {
    type Tx: ContactTx;

    /// Abre uma transação já restrita à organização.
    async fn begin(&self, organization_id: Uuid) -> Result<Self::Tx, AppError>;

    /// Única consulta sem escopo de organização: descobrir para onde vão os leads públicos.
    async fn find_default_organization(&self) -> Result<Option<Uuid>, AppError>;

    async fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ContactTx: Send {
    fn organization_id(&self) -> Uuid;

    // --- Contatos e canais ---
    async fn find_contact_by_phone(&mut self, number: &str) -> Result<Option<Uuid>, AppError>;
    async fn find_contact_by_email(&mut self, address: &str) -> Result<Option<Uuid>, AppError>;
    async fn find_contact(&mut self, contact_id: Uuid) -> Result<Option<Contact>, AppError>;
    async fn insert_contact(&mut self, fields: &ContactFields) -> Result<Contact, AppError>;
    async fn touch_contact(
        &mut self,
        contact_id: Uuid,
        financial: Option<&FinancialData>,
    ) -> Result<Option<Contact>, AppError>;
    async fn insert_phone(&mut self, contact_id: Uuid, phone: &NewPhone) -> Result<bool, AppError>;
    async fn insert_email(&mut self, contact_id: Uuid, email: &NewEmail) -> Result<bool, AppError>;
    async fn delete_phone(&mut self, contact_id: Uuid, number: &str) -> Result<u64, AppError>;
    async fn delete_email(&mut self, contact_id: Uuid, address: &str) -> Result<u64, AppError>;
    async fn insert_note(&mut self, contact_id: Uuid, body: &str) -> Result<(), AppError>;

    // --- Unificação ---
    async fn list_contact_records(&mut self) -> Result<Vec<ContactRecord>, AppError>;
    /// Trava os contatos pedidos. Ids inexistentes ou de outra organização não voltam.
    async fn lock_contact_records(&mut self, ids: &[Uuid]) -> Result<Vec<ContactRecord>, AppError>;
    async fn update_contact_fields(
        &mut self,
        contact_id: Uuid,
        fields: &ContactFields,
    ) -> Result<u64, AppError>;
    async fn relink(&mut self, target: RelinkTarget, from: &[Uuid], to: Uuid) -> Result<u64, AppError>;
    async fn delete_contacts(&mut self, ids: &[Uuid]) -> Result<u64, AppError>;

    // --- Funil ---
    async fn find_funnel_by_id(&mut self, funnel_id: Uuid) -> Result<Option<Funnel>, AppError>;
    async fn find_funnel_by_name(&mut self, name: &str) -> Result<Option<Funnel>, AppError>;
    async fn create_funnel(&mut self, name: &str, funnel_id: Option<Uuid>) -> Result<Funnel, AppError>;
    async fn list_stages(&mut self, funnel_id: Uuid) -> Result<Vec<FunnelStage>, AppError>;
    async fn create_stage(
        &mut self,
        funnel_id: Uuid,
        name: &str,
        position: i32,
    ) -> Result<FunnelStage, AppError>;
    async fn find_card(&mut self, funnel_id: Uuid, contact_id: Uuid) -> Result<Option<FunnelCard>, AppError>;
    async fn insert_card(
        &mut self,
        funnel_id: Uuid,
        stage_id: Uuid,
        contact_id: Uuid,
        display_order: i32,
    ) -> Result<bool, AppError>;

    // --- Funcionários ---
    async fn list_unlinked_employees(&mut self) -> Result<Vec<Employee>, AppError>;
    async fn find_employee(&mut self, employee_id: Uuid) -> Result<Option<Employee>, AppError>;
    async fn link_employee(
        &mut self,
        employee_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Employee>, AppError>;

    async fn commit(self) -> Result<(), AppError>;
    async fn rollback(self) -> Result<(), AppError>;
}

/// Junta telefones e e-mails aos contatos, preservando a ordem dos contatos.
pub(crate) fn assemble_records(
    contacts: Vec<Contact>,
    phones: Vec<Phone>,
    emails: Vec<Email>,
) -> Vec<ContactRecord> {
    let mut phones_by_contact: HashMap<Uuid, Vec<Phone>> = HashMap::new();
    for phone in phones {
        phones_by_contact.entry(phone.contact_id).or_default().push(phone);
    }
    let mut emails_by_contact: HashMap<Uuid, Vec<Email>> = HashMap::new();
    for email in emails {
        emails_by_contact.entry(email.contact_id).or_default().push(email);
    }

    contacts
        .into_iter()
        .map(|contact| ContactRecord {
            phones: phones_by_contact.remove(&contact.id).unwrap_or_default(),
            emails: emails_by_contact.remove(&contact.id).unwrap_or_default(),
            contact,
        })
        .collect()
}

// =========================================================================
//  POSTGRES
// =========================================================================

#[derive(Clone)]
pub struct PgContactStore {
    pool: PgPool,
    tenant_repo: TenantRepository,
    contact_repo: ContactRepository,
    funnel_repo: FunnelRepository,
    merge_repo: MergeRepository,
    employee_repo: EmployeeRepository,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tenant_repo: TenantRepository::new(pool.clone()),
            contact_repo: ContactRepository::new(),
            funnel_repo: FunnelRepository::new(),
            merge_repo: MergeRepository::new(),
            employee_repo: EmployeeRepository::new(),
            pool,
        }
    }
}

pub struct PgContactTx {
    organization_id: Uuid,
    tx: Transaction<'static, Postgres>,
    contact_repo: ContactRepository,
    funnel_repo: FunnelRepository,
    merge_repo: MergeRepository,
    employee_repo: EmployeeRepository,
}

#[async_trait]
impl ContactStore for PgContactStore {
    type Tx = PgContactTx;

    async fn begin(&self, organization_id: Uuid) -> Result<PgContactTx, AppError> {
        let mut tx = self.pool.begin().await?;

        // RLS: daqui em diante a transação só enxerga linhas desta organização
        set_tenant_scope(&mut tx, organization_id).await?;

        Ok(PgContactTx {
            organization_id,
            tx,
            contact_repo: self.contact_repo.clone(),
            funnel_repo: self.funnel_repo.clone(),
            merge_repo: self.merge_repo.clone(),
            employee_repo: self.employee_repo.clone(),
        })
    }

    async fn find_default_organization(&self) -> Result<Option<Uuid>, AppError> {
        self.tenant_repo.find_default_organization().await
    }

    async fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, AppError> {
        self.tenant_repo.is_member(user_id, organization_id).await
    }
}

impl PgContactTx {
    async fn load_records(&mut self, contacts: Vec<Contact>) -> Result<Vec<ContactRecord>, AppError> {
        if contacts.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = contacts.iter().map(|c| c.id).collect();
        let phones = self
            .contact_repo
            .list_phones(&mut *self.tx, self.organization_id, Some(ids.as_slice()))
            .await?;
        let emails = self
            .contact_repo
            .list_emails(&mut *self.tx, self.organization_id, Some(ids.as_slice()))
            .await?;
        Ok(assemble_records(contacts, phones, emails))
    }
}

#[async_trait]
impl ContactTx for PgContactTx {
    fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    async fn find_contact_by_phone(&mut self, number: &str) -> Result<Option<Uuid>, AppError> {
        self.contact_repo
            .find_contact_id_by_phone(&mut *self.tx, self.organization_id, number)
            .await
    }

    async fn find_contact_by_email(&mut self, address: &str) -> Result<Option<Uuid>, AppError> {
        self.contact_repo
            .find_contact_id_by_email(&mut *self.tx, self.organization_id, address)
            .await
    }

    async fn find_contact(&mut self, contact_id: Uuid) -> Result<Option<Contact>, AppError> {
        self.contact_repo
            .find_contact(&mut *self.tx, self.organization_id, contact_id)
            .await
    }

    async fn insert_contact(&mut self, fields: &ContactFields) -> Result<Contact, AppError> {
        self.contact_repo
            .create_contact(&mut *self.tx, self.organization_id, fields)
            .await
    }

    async fn touch_contact(
        &mut self,
        contact_id: Uuid,
        financial: Option<&FinancialData>,
    ) -> Result<Option<Contact>, AppError> {
        self.contact_repo
            .touch_contact(&mut *self.tx, self.organization_id, contact_id, financial)
            .await
    }

    async fn insert_phone(&mut self, contact_id: Uuid, phone: &NewPhone) -> Result<bool, AppError> {
        self.contact_repo
            .add_phone(&mut *self.tx, self.organization_id, contact_id, phone)
            .await
    }

    async fn insert_email(&mut self, contact_id: Uuid, email: &NewEmail) -> Result<bool, AppError> {
        self.contact_repo
            .add_email(&mut *self.tx, self.organization_id, contact_id, email)
            .await
    }

    async fn delete_phone(&mut self, contact_id: Uuid, number: &str) -> Result<u64, AppError> {
        self.contact_repo
            .remove_phone(&mut *self.tx, self.organization_id, contact_id, number)
            .await
    }

    async fn delete_email(&mut self, contact_id: Uuid, address: &str) -> Result<u64, AppError> {
        self.contact_repo
            .remove_email(&mut *self.tx, self.organization_id, contact_id, address)
            .await
    }

    async fn insert_note(&mut self, contact_id: Uuid, body: &str) -> Result<(), AppError> {
        self.contact_repo
            .add_note(&mut *self.tx, self.organization_id, contact_id, body)
            .await
    }

    async fn list_contact_records(&mut self) -> Result<Vec<ContactRecord>, AppError> {
        let contacts = self
            .contact_repo
            .list_contacts(&mut *self.tx, self.organization_id)
            .await?;
        let phones = self
            .contact_repo
            .list_phones(&mut *self.tx, self.organization_id, None)
            .await?;
        let emails = self
            .contact_repo
            .list_emails(&mut *self.tx, self.organization_id, None)
            .await?;
        Ok(assemble_records(contacts, phones, emails))
    }

    async fn lock_contact_records(&mut self, ids: &[Uuid]) -> Result<Vec<ContactRecord>, AppError> {
        let contacts = self
            .contact_repo
            .lock_contacts(&mut *self.tx, self.organization_id, ids)
            .await?;
        self.load_records(contacts).await
    }

    async fn update_contact_fields(
        &mut self,
        contact_id: Uuid,
        fields: &ContactFields,
    ) -> Result<u64, AppError> {
        self.contact_repo
            .update_contact_fields(&mut *self.tx, self.organization_id, contact_id, fields)
            .await
    }

    async fn relink(&mut self, target: RelinkTarget, from: &[Uuid], to: Uuid) -> Result<u64, AppError> {
        if target == RelinkTarget::FunnelCards {
            let dropped = self
                .merge_repo
                .drop_conflicting_cards(&mut *self.tx, self.organization_id, from, to)
                .await?;
            if dropped > 0 {
                tracing::debug!("{} card(s) duplicados descartados antes do re-link", dropped);
            }
        }

        self.merge_repo
            .relink(&mut *self.tx, self.organization_id, target, from, to)
            .await
    }

    async fn delete_contacts(&mut self, ids: &[Uuid]) -> Result<u64, AppError> {
        self.contact_repo
            .delete_contacts(&mut *self.tx, self.organization_id, ids)
            .await
    }

    async fn find_funnel_by_id(&mut self, funnel_id: Uuid) -> Result<Option<Funnel>, AppError> {
        self.funnel_repo
            .find_funnel_by_id(&mut *self.tx, self.organization_id, funnel_id)
            .await
    }

    async fn find_funnel_by_name(&mut self, name: &str) -> Result<Option<Funnel>, AppError> {
        self.funnel_repo
            .find_funnel_by_name(&mut *self.tx, self.organization_id, name)
            .await
    }

    async fn create_funnel(&mut self, name: &str, funnel_id: Option<Uuid>) -> Result<Funnel, AppError> {
        self.funnel_repo
            .create_funnel(&mut *self.tx, self.organization_id, name, funnel_id)
            .await
    }

    async fn list_stages(&mut self, funnel_id: Uuid) -> Result<Vec<FunnelStage>, AppError> {
        self.funnel_repo
            .list_stages(&mut *self.tx, self.organization_id, funnel_id)
            .await
    }

    async fn create_stage(
        &mut self,
        funnel_id: Uuid,
        name: &str,
        position: i32,
    ) -> Result<FunnelStage, AppError> {
        self.funnel_repo
            .create_stage(&mut *self.tx, self.organization_id, funnel_id, name, position)
            .await
    }

    async fn find_card(&mut self, funnel_id: Uuid, contact_id: Uuid) -> Result<Option<FunnelCard>, AppError> {
        self.funnel_repo
            .find_card(&mut *self.tx, self.organization_id, funnel_id, contact_id)
            .await
    }

    async fn insert_card(
        &mut self,
        funnel_id: Uuid,
        stage_id: Uuid,
        contact_id: Uuid,
        display_order: i32,
    ) -> Result<bool, AppError> {
        self.funnel_repo
            .insert_card(
                &mut *self.tx,
                self.organization_id,
                funnel_id,
                stage_id,
                contact_id,
                display_order,
            )
            .await
    }

    async fn list_unlinked_employees(&mut self) -> Result<Vec<Employee>, AppError> {
        self.employee_repo
            .list_unlinked(&mut *self.tx, self.organization_id)
            .await
    }

    async fn find_employee(&mut self, employee_id: Uuid) -> Result<Option<Employee>, AppError> {
        self.employee_repo
            .find_employee(&mut *self.tx, self.organization_id, employee_id)
            .await
    }

    async fn link_employee(
        &mut self,
        employee_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Employee>, AppError> {
        self.employee_repo
            .link_contact(&mut *self.tx, self.organization_id, employee_id, contact_id)
            .await
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
