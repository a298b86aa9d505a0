// src/db/memory_store.rs
//
// Banco em memória para os testes dos serviços. Cada transação trabalha numa
// cópia do estado e só publica no commit, então uma falha no meio da
// unificação deixa o estado como estava.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{ContactStore, ContactTx, assemble_records},
    models::{
        contact::{Contact, ContactFields, ContactRecord, Email, NewEmail, NewPhone, Phone},
        dedup::RelinkTarget,
        employee::Employee,
        funnel::{Funnel, FunnelCard, FunnelStage},
        lead::FinancialData,
    },
};

/// Linha genérica das tabelas filhas (notas, atividades, conversas).
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub contact_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub organizations: Vec<(Uuid, DateTime<Utc>)>,
    pub members: HashSet<(Uuid, Uuid)>,
    pub contacts: Vec<Contact>,
    pub phones: Vec<Phone>,
    pub emails: Vec<Email>,
    pub notes: Vec<ChildRow>,
    pub activities: Vec<ChildRow>,
    pub whatsapp_conversations: Vec<ChildRow>,
    pub funnels: Vec<Funnel>,
    pub stages: Vec<FunnelStage>,
    pub cards: Vec<FunnelCard>,
    pub employees: Vec<Employee>,
}

impl State {
    fn children_mut(&mut self, target: RelinkTarget) -> Option<&mut Vec<ChildRow>> {
        match target {
            RelinkTarget::Notes => Some(&mut self.notes),
            RelinkTarget::Activities => Some(&mut self.activities),
            RelinkTarget::WhatsappConversations => Some(&mut self.whatsapp_conversations),
            RelinkTarget::FunnelCards | RelinkTarget::Employees => None,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    relink: Option<RelinkTarget>,
    funnel: bool,
}

fn injected(what: &str) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("falha injetada: {}", what))
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Mutex<Faults>>,
    clock: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Relógio determinístico: cada linha nova é um segundo mais nova que a anterior
    fn now(&self) -> DateTime<Utc> {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(1_700_000_000 + tick, 0).unwrap()
    }

    pub fn snapshot(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    // --- Falhas ---

    pub fn fail_relink(&self, target: RelinkTarget) {
        self.faults.lock().unwrap().relink = Some(target);
    }

    pub fn fail_funnel(&self) {
        self.faults.lock().unwrap().funnel = true;
    }

    fn funnel_fault(&self) -> Result<(), AppError> {
        if self.faults.lock().unwrap().funnel {
            return Err(injected("funil"));
        }
        Ok(())
    }

    // --- Sementes ---

    pub fn add_organization(&self) -> Uuid {
        let id = Uuid::new_v4();
        let created_at = self.now();
        self.state.lock().unwrap().organizations.push((id, created_at));
        id
    }

    pub fn add_member(&self, organization_id: Uuid, user_id: Uuid) {
        self.state
            .lock()
            .unwrap()
            .members
            .insert((user_id, organization_id));
    }

    pub fn seed_contact(
        &self,
        organization_id: Uuid,
        fields: ContactFields,
        phones: &[&str],
        emails: &[&str],
    ) -> Uuid {
        let created_at = self.now();
        let contact = Contact {
            id: Uuid::new_v4(),
            organization_id,
            fields,
            created_at,
            updated_at: created_at,
        };
        let id = contact.id;

        let mut state = self.state.lock().unwrap();
        state.contacts.push(contact);
        for number in phones {
            state.phones.push(Phone {
                id: Uuid::new_v4(),
                organization_id,
                contact_id: id,
                number: number.to_string(),
                country_code: "+55".to_string(),
                kind: "celular".to_string(),
                created_at,
            });
        }
        for address in emails {
            state.emails.push(Email {
                id: Uuid::new_v4(),
                organization_id,
                contact_id: id,
                address: address.to_string(),
                kind: "pessoal".to_string(),
                created_at,
            });
        }
        id
    }

    pub fn seed_child(&self, organization_id: Uuid, target: RelinkTarget, contact_id: Uuid, body: &str) {
        let row = ChildRow {
            id: Uuid::new_v4(),
            organization_id,
            contact_id,
            body: body.to_string(),
        };
        let mut state = self.state.lock().unwrap();
        if let Some(rows) = state.children_mut(target) {
            rows.push(row);
        }
    }

    pub fn seed_funnel(&self, organization_id: Uuid, name: &str, stages: &[&str]) -> (Funnel, Vec<FunnelStage>) {
        let created_at = self.now();
        let funnel = Funnel {
            id: Uuid::new_v4(),
            organization_id,
            name: name.to_string(),
            created_at,
        };
        let stages: Vec<FunnelStage> = stages
            .iter()
            .enumerate()
            .map(|(position, stage)| FunnelStage {
                id: Uuid::new_v4(),
                organization_id,
                funnel_id: funnel.id,
                name: stage.to_string(),
                position: position as i32,
                created_at,
            })
            .collect();

        let mut state = self.state.lock().unwrap();
        state.funnels.push(funnel.clone());
        state.stages.extend(stages.iter().cloned());
        (funnel, stages)
    }

    pub fn seed_card(&self, organization_id: Uuid, stage: &FunnelStage, contact_id: Uuid) -> Uuid {
        let created_at = self.now();
        let card = FunnelCard {
            id: Uuid::new_v4(),
            organization_id,
            funnel_id: stage.funnel_id,
            stage_id: stage.id,
            contact_id,
            display_order: 0,
            created_at,
            updated_at: created_at,
        };
        let id = card.id;
        self.state.lock().unwrap().cards.push(card);
        id
    }

    pub fn seed_employee(
        &self,
        organization_id: Uuid,
        full_name: &str,
        cpf: Option<&str>,
        phone: Option<&str>,
    ) -> Uuid {
        let employee = Employee {
            id: Uuid::new_v4(),
            organization_id,
            full_name: full_name.to_string(),
            cpf: cpf.map(str::to_string),
            phone: phone.map(str::to_string),
            contact_id: None,
            created_at: self.now(),
        };
        let id = employee.id;
        self.state.lock().unwrap().employees.push(employee);
        id
    }

    pub fn link_seeded_employee(&self, employee_id: Uuid, contact_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        if let Some(employee) = state.employees.iter_mut().find(|e| e.id == employee_id) {
            employee.contact_id = Some(contact_id);
        }
    }

    // --- Consultas para asserções ---

    pub fn contacts(&self, organization_id: Uuid) -> Vec<Contact> {
        self.snapshot()
            .contacts
            .into_iter()
            .filter(|c| c.organization_id == organization_id)
            .collect()
    }

    pub fn contact(&self, contact_id: Uuid) -> Option<Contact> {
        self.snapshot().contacts.into_iter().find(|c| c.id == contact_id)
    }

    pub fn phones_of(&self, contact_id: Uuid) -> Vec<String> {
        let mut numbers: Vec<String> = self
            .snapshot()
            .phones
            .into_iter()
            .filter(|p| p.contact_id == contact_id)
            .map(|p| p.number)
            .collect();
        numbers.sort();
        numbers
    }

    pub fn emails_of(&self, contact_id: Uuid) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .snapshot()
            .emails
            .into_iter()
            .filter(|e| e.contact_id == contact_id)
            .map(|e| e.address)
            .collect();
        addresses.sort();
        addresses
    }

    pub fn notes_of(&self, contact_id: Uuid) -> Vec<String> {
        self.snapshot()
            .notes
            .into_iter()
            .filter(|n| n.contact_id == contact_id)
            .map(|n| n.body)
            .collect()
    }

    /// Contatos referenciados por uma tabela filha, na ordem de inserção.
    pub fn referenced_contacts(&self, target: RelinkTarget) -> Vec<Uuid> {
        let state = self.snapshot();
        match target {
            RelinkTarget::Notes => state.notes.iter().map(|r| r.contact_id).collect(),
            RelinkTarget::Activities => state.activities.iter().map(|r| r.contact_id).collect(),
            RelinkTarget::WhatsappConversations => state
                .whatsapp_conversations
                .iter()
                .map(|r| r.contact_id)
                .collect(),
            RelinkTarget::FunnelCards => state.cards.iter().map(|c| c.contact_id).collect(),
            RelinkTarget::Employees => state.employees.iter().filter_map(|e| e.contact_id).collect(),
        }
    }

    pub fn cards(&self, organization_id: Uuid) -> Vec<FunnelCard> {
        self.snapshot()
            .cards
            .into_iter()
            .filter(|c| c.organization_id == organization_id)
            .collect()
    }

    pub fn funnels(&self, organization_id: Uuid) -> Vec<Funnel> {
        self.snapshot()
            .funnels
            .into_iter()
            .filter(|f| f.organization_id == organization_id)
            .collect()
    }

    pub fn stages(&self, funnel_id: Uuid) -> Vec<FunnelStage> {
        let mut stages: Vec<FunnelStage> = self
            .snapshot()
            .stages
            .into_iter()
            .filter(|s| s.funnel_id == funnel_id)
            .collect();
        stages.sort_by_key(|s| s.position);
        stages
    }

    pub fn employee(&self, employee_id: Uuid) -> Option<Employee> {
        self.snapshot().employees.into_iter().find(|e| e.id == employee_id)
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self, organization_id: Uuid) -> Result<MemoryTx, AppError> {
        Ok(MemoryTx {
            organization_id,
            work: self.snapshot(),
            store: self.clone(),
        })
    }

    async fn find_default_organization(&self) -> Result<Option<Uuid>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .organizations
            .iter()
            .min_by_key(|(id, created_at)| (*created_at, *id))
            .map(|(id, _)| *id))
    }

    async fn is_member(&self, user_id: Uuid, organization_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .contains(&(user_id, organization_id)))
    }
}

pub struct MemoryTx {
    organization_id: Uuid,
    work: State,
    store: MemoryStore,
}

impl MemoryTx {
    fn owned_contacts(&self, ids: Option<&[Uuid]>) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self
            .work
            .contacts
            .iter()
            .filter(|c| c.organization_id == self.organization_id)
            .filter(|c| ids.map_or(true, |ids| ids.contains(&c.id)))
            .cloned()
            .collect();
        contacts.sort_by_key(|c| (c.created_at, c.id));
        contacts
    }

    fn records(&self, ids: Option<&[Uuid]>) -> Vec<ContactRecord> {
        let contacts = self.owned_contacts(ids);
        let wanted: HashSet<Uuid> = contacts.iter().map(|c| c.id).collect();
        let phones = self
            .work
            .phones
            .iter()
            .filter(|p| wanted.contains(&p.contact_id))
            .cloned()
            .collect();
        let emails = self
            .work
            .emails
            .iter()
            .filter(|e| wanted.contains(&e.contact_id))
            .cloned()
            .collect();
        assemble_records(contacts, phones, emails)
    }

    fn oldest_owner<'a>(&self, owners: impl Iterator<Item = &'a Uuid>) -> Option<Uuid> {
        let owners: HashSet<Uuid> = owners.copied().collect();
        self.owned_contacts(None)
            .into_iter()
            .find(|c| owners.contains(&c.id))
            .map(|c| c.id)
    }
}

#[async_trait]
impl ContactTx for MemoryTx {
    fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    async fn find_contact_by_phone(&mut self, number: &str) -> Result<Option<Uuid>, AppError> {
        let org = self.organization_id;
        let owners: Vec<Uuid> = self
            .work
            .phones
            .iter()
            .filter(|p| p.organization_id == org && p.number == number)
            .map(|p| p.contact_id)
            .collect();
        Ok(self.oldest_owner(owners.iter()))
    }

    async fn find_contact_by_email(&mut self, address: &str) -> Result<Option<Uuid>, AppError> {
        let org = self.organization_id;
        let address = address.to_lowercase();
        let owners: Vec<Uuid> = self
            .work
            .emails
            .iter()
            .filter(|e| e.organization_id == org && e.address.to_lowercase() == address)
            .map(|e| e.contact_id)
            .collect();
        Ok(self.oldest_owner(owners.iter()))
    }

    async fn find_contact(&mut self, contact_id: Uuid) -> Result<Option<Contact>, AppError> {
        Ok(self.owned_contacts(Some(&[contact_id][..])).into_iter().next())
    }

    async fn insert_contact(&mut self, fields: &ContactFields) -> Result<Contact, AppError> {
        let created_at = self.store.now();
        let contact = Contact {
            id: Uuid::new_v4(),
            organization_id: self.organization_id,
            fields: fields.clone(),
            created_at,
            updated_at: created_at,
        };
        self.work.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn touch_contact(
        &mut self,
        contact_id: Uuid,
        financial: Option<&FinancialData>,
    ) -> Result<Option<Contact>, AppError> {
        let now = self.store.now();
        let org = self.organization_id;
        let Some(contact) = self
            .work
            .contacts
            .iter_mut()
            .find(|c| c.id == contact_id && c.organization_id == org)
        else {
            return Ok(None);
        };

        if let Some(financial) = financial {
            contact.fields.household_income = financial.household_income;
            contact.fields.has_fgts = financial.has_fgts;
            contact.fields.formal_employment_over_3_years = financial.formal_employment_over_3_years;
        }
        contact.updated_at = now;
        Ok(Some(contact.clone()))
    }

    async fn insert_phone(&mut self, contact_id: Uuid, phone: &NewPhone) -> Result<bool, AppError> {
        if self
            .work
            .phones
            .iter()
            .any(|p| p.contact_id == contact_id && p.number == phone.number)
        {
            return Ok(false);
        }
        let created_at = self.store.now();
        self.work.phones.push(Phone {
            id: Uuid::new_v4(),
            organization_id: self.organization_id,
            contact_id,
            number: phone.number.clone(),
            country_code: phone.country_code.clone(),
            kind: phone.kind.clone(),
            created_at,
        });
        Ok(true)
    }

    async fn insert_email(&mut self, contact_id: Uuid, email: &NewEmail) -> Result<bool, AppError> {
        let address = email.address.to_lowercase();
        if self
            .work
            .emails
            .iter()
            .any(|e| e.contact_id == contact_id && e.address == address)
        {
            return Ok(false);
        }
        let created_at = self.store.now();
        self.work.emails.push(Email {
            id: Uuid::new_v4(),
            organization_id: self.organization_id,
            contact_id,
            address,
            kind: email.kind.clone(),
            created_at,
        });
        Ok(true)
    }

    async fn delete_phone(&mut self, contact_id: Uuid, number: &str) -> Result<u64, AppError> {
        let org = self.organization_id;
        let before = self.work.phones.len();
        self.work
            .phones
            .retain(|p| !(p.organization_id == org && p.contact_id == contact_id && p.number == number));
        Ok((before - self.work.phones.len()) as u64)
    }

    async fn delete_email(&mut self, contact_id: Uuid, address: &str) -> Result<u64, AppError> {
        let org = self.organization_id;
        let address = address.to_lowercase();
        let before = self.work.emails.len();
        self.work.emails.retain(|e| {
            !(e.organization_id == org && e.contact_id == contact_id && e.address.to_lowercase() == address)
        });
        Ok((before - self.work.emails.len()) as u64)
    }

    async fn insert_note(&mut self, contact_id: Uuid, body: &str) -> Result<(), AppError> {
        self.work.notes.push(ChildRow {
            id: Uuid::new_v4(),
            organization_id: self.organization_id,
            contact_id,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn list_contact_records(&mut self) -> Result<Vec<ContactRecord>, AppError> {
        Ok(self.records(None))
    }

    async fn lock_contact_records(&mut self, ids: &[Uuid]) -> Result<Vec<ContactRecord>, AppError> {
        Ok(self.records(Some(ids)))
    }

    async fn update_contact_fields(
        &mut self,
        contact_id: Uuid,
        fields: &ContactFields,
    ) -> Result<u64, AppError> {
        let now = self.store.now();
        let org = self.organization_id;
        match self
            .work
            .contacts
            .iter_mut()
            .find(|c| c.id == contact_id && c.organization_id == org)
        {
            Some(contact) => {
                contact.fields = fields.clone();
                contact.updated_at = now;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn relink(&mut self, target: RelinkTarget, from: &[Uuid], to: Uuid) -> Result<u64, AppError> {
        if self.store.faults.lock().unwrap().relink == Some(target) {
            return Err(injected(target.table()));
        }

        let org = self.organization_id;
        let mut moved = 0;
        match target {
            RelinkTarget::FunnelCards => {
                // Mesma regra do banco: um card por (funil, contato), fica o do sobrevivente ou o mais antigo
                let mut cards = std::mem::take(&mut self.work.cards);
                cards.sort_by_key(|c| (c.created_at, c.id));
                let mut taken: HashSet<Uuid> = cards
                    .iter()
                    .filter(|c| c.organization_id == org && c.contact_id == to)
                    .map(|c| c.funnel_id)
                    .collect();
                for mut card in cards {
                    if card.organization_id == org && from.contains(&card.contact_id) {
                        if !taken.insert(card.funnel_id) {
                            continue;
                        }
                        card.contact_id = to;
                        moved += 1;
                    }
                    self.work.cards.push(card);
                }
            }
            RelinkTarget::Employees => {
                for employee in self.work.employees.iter_mut() {
                    if employee.organization_id == org
                        && employee.contact_id.is_some_and(|id| from.contains(&id))
                    {
                        employee.contact_id = Some(to);
                        moved += 1;
                    }
                }
            }
            _ => {
                if let Some(rows) = self.work.children_mut(target) {
                    for row in rows.iter_mut() {
                        if row.organization_id == org && from.contains(&row.contact_id) {
                            row.contact_id = to;
                            moved += 1;
                        }
                    }
                }
            }
        }
        Ok(moved)
    }

    async fn delete_contacts(&mut self, ids: &[Uuid]) -> Result<u64, AppError> {
        let org = self.organization_id;
        let doomed: HashSet<Uuid> = self
            .work
            .contacts
            .iter()
            .filter(|c| c.organization_id == org && ids.contains(&c.id))
            .map(|c| c.id)
            .collect();

        // ON DELETE CASCADE / SET NULL
        let work = &mut self.work;
        work.contacts.retain(|c| !doomed.contains(&c.id));
        work.phones.retain(|p| !doomed.contains(&p.contact_id));
        work.emails.retain(|e| !doomed.contains(&e.contact_id));
        work.notes.retain(|r| !doomed.contains(&r.contact_id));
        work.activities.retain(|r| !doomed.contains(&r.contact_id));
        work.whatsapp_conversations.retain(|r| !doomed.contains(&r.contact_id));
        work.cards.retain(|c| !doomed.contains(&c.contact_id));
        for employee in work.employees.iter_mut() {
            if employee.contact_id.is_some_and(|id| doomed.contains(&id)) {
                employee.contact_id = None;
            }
        }

        Ok(doomed.len() as u64)
    }

    async fn find_funnel_by_id(&mut self, funnel_id: Uuid) -> Result<Option<Funnel>, AppError> {
        self.store.funnel_fault()?;
        Ok(self
            .work
            .funnels
            .iter()
            .find(|f| f.id == funnel_id && f.organization_id == self.organization_id)
            .cloned())
    }

    async fn find_funnel_by_name(&mut self, name: &str) -> Result<Option<Funnel>, AppError> {
        self.store.funnel_fault()?;
        Ok(self
            .work
            .funnels
            .iter()
            .find(|f| f.name == name && f.organization_id == self.organization_id)
            .cloned())
    }

    async fn create_funnel(&mut self, name: &str, funnel_id: Option<Uuid>) -> Result<Funnel, AppError> {
        self.store.funnel_fault()?;
        if let Some(existing) = self
            .work
            .funnels
            .iter()
            .find(|f| f.name == name && f.organization_id == self.organization_id)
        {
            return Ok(existing.clone());
        }
        let funnel = Funnel {
            id: funnel_id.unwrap_or_else(Uuid::new_v4),
            organization_id: self.organization_id,
            name: name.to_string(),
            created_at: self.store.now(),
        };
        self.work.funnels.push(funnel.clone());
        Ok(funnel)
    }

    async fn list_stages(&mut self, funnel_id: Uuid) -> Result<Vec<FunnelStage>, AppError> {
        let mut stages: Vec<FunnelStage> = self
            .work
            .stages
            .iter()
            .filter(|s| s.funnel_id == funnel_id && s.organization_id == self.organization_id)
            .cloned()
            .collect();
        stages.sort_by_key(|s| s.position);
        Ok(stages)
    }

    async fn create_stage(
        &mut self,
        funnel_id: Uuid,
        name: &str,
        position: i32,
    ) -> Result<FunnelStage, AppError> {
        if let Some(existing) = self
            .work
            .stages
            .iter()
            .find(|s| s.funnel_id == funnel_id && s.position == position)
        {
            return Ok(existing.clone());
        }
        let stage = FunnelStage {
            id: Uuid::new_v4(),
            organization_id: self.organization_id,
            funnel_id,
            name: name.to_string(),
            position,
            created_at: self.store.now(),
        };
        self.work.stages.push(stage.clone());
        Ok(stage)
    }

    async fn find_card(&mut self, funnel_id: Uuid, contact_id: Uuid) -> Result<Option<FunnelCard>, AppError> {
        Ok(self
            .work
            .cards
            .iter()
            .find(|c| {
                c.funnel_id == funnel_id
                    && c.contact_id == contact_id
                    && c.organization_id == self.organization_id
            })
            .cloned())
    }

    async fn insert_card(
        &mut self,
        funnel_id: Uuid,
        stage_id: Uuid,
        contact_id: Uuid,
        display_order: i32,
    ) -> Result<bool, AppError> {
        if self
            .work
            .cards
            .iter()
            .any(|c| c.funnel_id == funnel_id && c.contact_id == contact_id)
        {
            return Ok(false);
        }
        let created_at = self.store.now();
        self.work.cards.push(FunnelCard {
            id: Uuid::new_v4(),
            organization_id: self.organization_id,
            funnel_id,
            stage_id,
            contact_id,
            display_order,
            created_at,
            updated_at: created_at,
        });
        Ok(true)
    }

    async fn list_unlinked_employees(&mut self) -> Result<Vec<Employee>, AppError> {
        let mut employees: Vec<Employee> = self
            .work
            .employees
            .iter()
            .filter(|e| e.organization_id == self.organization_id && e.contact_id.is_none())
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(employees)
    }

    async fn find_employee(&mut self, employee_id: Uuid) -> Result<Option<Employee>, AppError> {
        Ok(self
            .work
            .employees
            .iter()
            .find(|e| e.id == employee_id && e.organization_id == self.organization_id)
            .cloned())
    }

    async fn link_employee(
        &mut self,
        employee_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<Employee>, AppError> {
        let org = self.organization_id;
        Ok(self
            .work
            .employees
            .iter_mut()
            .find(|e| e.id == employee_id && e.organization_id == org)
            .map(|employee| {
                employee.contact_id = Some(contact_id);
                employee.clone()
            }))
    }

    async fn commit(self) -> Result<(), AppError> {
        *self.store.state.lock().unwrap() = self.work;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        Ok(())
    }
}
