// src/services/employee_link_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        normalize::{canonical_phone, normalize_cpf, normalize_name},
    },
    db::{ContactStore, ContactTx},
    models::{
        contact::ContactRecord,
        employee::{Employee, EmployeeLinkSuggestion, LinkCandidate, LinkSignal},
    },
};

/// Sinal mais forte entre um funcionário e um contato, se houver.
fn strongest_signal(
    employee: &Employee,
    record: &ContactRecord,
    default_country_code: &str,
) -> Option<LinkSignal> {
    let fields = &record.contact.fields;

    let employee_cpf = employee.cpf.as_deref().and_then(normalize_cpf);
    if employee_cpf.is_some() && employee_cpf == fields.cpf.as_deref().and_then(normalize_cpf) {
        return Some(LinkSignal::Cpf);
    }

    let employee_name = normalize_name(&employee.full_name);
    if employee_name.is_some() && employee_name == fields.full_name.as_deref().and_then(normalize_name) {
        return Some(LinkSignal::Name);
    }

    let employee_phone = employee
        .phone
        .as_deref()
        .and_then(|raw| canonical_phone(raw, default_country_code));
    if let Some(phone) = employee_phone {
        if record.phones.iter().any(|p| p.number == phone) {
            return Some(LinkSignal::Phone);
        }
    }

    None
}

/// Sugestões para um funcionário: um candidato por contato, do sinal mais forte para o mais fraco.
pub fn suggest_for(
    employee: &Employee,
    records: &[ContactRecord],
    default_country_code: &str,
) -> Vec<LinkCandidate> {
    let mut candidates: Vec<LinkCandidate> = records
        .iter()
        .filter_map(|record| {
            strongest_signal(employee, record, default_country_code).map(|signal| LinkCandidate {
                contact_id: record.id(),
                contact_name: record.contact.fields.display_name().map(str::to_string),
                signal,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.signal.cmp(&a.signal));
    candidates
}

#[derive(Clone)]
pub struct EmployeeLinkService<S: ContactStore> {
    store: S,
    /// DDI usado quando o telefone do funcionário não traz um, igual ao da captação.
    default_country_code: String,
}

impl<S: ContactStore> EmployeeLinkService<S> {
    pub fn new(store: S, default_country_code: impl Into<String>) -> Self {
        Self {
            store,
            default_country_code: default_country_code.into(),
        }
    }

    /// Funcionários sem contato vinculado que têm pelo menos um candidato.
    pub async fn suggestions(&self, organization_id: Uuid) -> Result<Vec<EmployeeLinkSuggestion>, AppError> {
        let mut tx = self.store.begin(organization_id).await?;
        let employees = tx.list_unlinked_employees().await?;
        let records = tx.list_contact_records().await?;
        tx.commit().await?;

        Ok(employees
            .into_iter()
            .filter_map(|employee| {
                let candidates = suggest_for(&employee, &records, &self.default_country_code);
                (!candidates.is_empty()).then_some(EmployeeLinkSuggestion { employee, candidates })
            })
            .collect())
    }

    /// Aceita uma sugestão: grava só `employees.contact_id`.
    pub async fn accept(
        &self,
        organization_id: Uuid,
        employee_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Employee, AppError> {
        let mut tx = self.store.begin(organization_id).await?;

        if tx.find_employee(employee_id).await?.is_none() {
            tx.rollback().await?;
            return Err(AppError::EmployeeNotFound(employee_id));
        }
        if tx.find_contact(contact_id).await?.is_none() {
            tx.rollback().await?;
            return Err(AppError::ContactNotFound(contact_id));
        }

        let employee = tx
            .link_employee(employee_id, contact_id)
            .await?
            .ok_or(AppError::EmployeeNotFound(employee_id))?;
        tx.commit().await?;

        tracing::info!("👤 Funcionário {} vinculado ao contato {}", employee_id, contact_id);
        Ok(employee)
    }
}
