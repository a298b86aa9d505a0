// src/models/dedup.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::contact::{ContactFields, ContactRecord};

// --- AGRUPAMENTO ---

/// Chave pela qual os contatos de um grupo colidem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Cpf,
    Cnpj,
    Phone,
    Name,
    LegalName,
    TradeName,
}

impl MatchType {
    pub const ALL: [MatchType; 6] = [
        MatchType::Cpf,
        MatchType::Cnpj,
        MatchType::Phone,
        MatchType::Name,
        MatchType::LegalName,
        MatchType::TradeName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Cpf => "cpf",
            MatchType::Cnpj => "cnpj",
            MatchType::Phone => "phone",
            MatchType::Name => "name",
            MatchType::LegalName => "legal_name",
            MatchType::TradeName => "trade_name",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub match_type: MatchType,
    /// Valor normalizado que colidiu (dígitos do CPF, chave canônica do telefone, nome em caixa baixa...)
    #[schema(example = "5533998410016")]
    pub key: String,
    #[schema(example = "+55 (33) 99841-0016")]
    pub key_display: String,
    /// Membros do mais antigo para o mais novo.
    pub members: Vec<ContactRecord>,
}

impl DuplicateGroup {
    pub fn label(&self) -> String {
        format!("{}:{}", self.match_type, self.key)
    }

    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(ContactRecord::id).collect()
    }
}

// --- RESOLUÇÃO DE CAMPOS ---

/// Campos escalares que a unificação resolve individualmente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MergeField {
    Personality,
    FullName,
    Cpf,
    BirthDate,
    MaritalStatus,
    Occupation,
    LegalName,
    TradeName,
    Cnpj,
    StateRegistration,
    MunicipalRegistration,
    LegalRepresentative,
    ContactType,
    Status,
    Source,
    HouseholdIncome,
    HasFgts,
    FormalEmploymentOver3Years,
}

impl MergeField {
    pub const ALL: [MergeField; 18] = [
        MergeField::Personality,
        MergeField::FullName,
        MergeField::Cpf,
        MergeField::BirthDate,
        MergeField::MaritalStatus,
        MergeField::Occupation,
        MergeField::LegalName,
        MergeField::TradeName,
        MergeField::Cnpj,
        MergeField::StateRegistration,
        MergeField::MunicipalRegistration,
        MergeField::LegalRepresentative,
        MergeField::ContactType,
        MergeField::Status,
        MergeField::Source,
        MergeField::HouseholdIncome,
        MergeField::HasFgts,
        MergeField::FormalEmploymentOver3Years,
    ];
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl ContactFields {
    /// Copia exatamente um campo de outro contato. Nunca mistura valores.
    pub fn copy_field(&mut self, field: MergeField, from: &ContactFields) {
        match field {
            MergeField::Personality => self.personality = from.personality,
            MergeField::FullName => self.full_name = from.full_name.clone(),
            MergeField::Cpf => self.cpf = from.cpf.clone(),
            MergeField::BirthDate => self.birth_date = from.birth_date,
            MergeField::MaritalStatus => self.marital_status = from.marital_status.clone(),
            MergeField::Occupation => self.occupation = from.occupation.clone(),
            MergeField::LegalName => self.legal_name = from.legal_name.clone(),
            MergeField::TradeName => self.trade_name = from.trade_name.clone(),
            MergeField::Cnpj => self.cnpj = from.cnpj.clone(),
            MergeField::StateRegistration => {
                self.state_registration = from.state_registration.clone()
            }
            MergeField::MunicipalRegistration => {
                self.municipal_registration = from.municipal_registration.clone()
            }
            MergeField::LegalRepresentative => {
                self.legal_representative = from.legal_representative.clone()
            }
            MergeField::ContactType => self.contact_type = from.contact_type,
            MergeField::Status => self.status = from.status,
            MergeField::Source => self.source = from.source.clone(),
            MergeField::HouseholdIncome => self.household_income = from.household_income,
            MergeField::HasFgts => self.has_fgts = from.has_fgts,
            MergeField::FormalEmploymentOver3Years => {
                self.formal_employment_over_3_years = from.formal_employment_over_3_years
            }
        }
    }

    /// Campos obrigatórios (enums) nunca estão vazios.
    pub fn is_blank(&self, field: MergeField) -> bool {
        match field {
            MergeField::Personality | MergeField::ContactType | MergeField::Status => false,
            MergeField::FullName => blank(&self.full_name),
            MergeField::Cpf => blank(&self.cpf),
            MergeField::BirthDate => self.birth_date.is_none(),
            MergeField::MaritalStatus => blank(&self.marital_status),
            MergeField::Occupation => blank(&self.occupation),
            MergeField::LegalName => blank(&self.legal_name),
            MergeField::TradeName => blank(&self.trade_name),
            MergeField::Cnpj => blank(&self.cnpj),
            MergeField::StateRegistration => blank(&self.state_registration),
            MergeField::MunicipalRegistration => blank(&self.municipal_registration),
            MergeField::LegalRepresentative => blank(&self.legal_representative),
            MergeField::Source => blank(&self.source),
            MergeField::HouseholdIncome => self.household_income.is_none(),
            MergeField::HasFgts => self.has_fgts.is_none(),
            MergeField::FormalEmploymentOver3Years => {
                self.formal_employment_over_3_years.is_none()
            }
        }
    }
}

/// Como escolher o sobrevivente e o valor de cada campo.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldResolution {
    /// Revisão manual: o operador escolhe o sobrevivente e, por campo, o contato de origem.
    /// Campos omitidos mantêm o valor do sobrevivente.
    Manual {
        survivor_id: Uuid,
        field_sources: HashMap<MergeField, Uuid>,
    },
    /// Passe automático: o mais antigo sobrevive; cada campo vazio nele é
    /// preenchido pelo próximo membro mais antigo que tenha valor.
    OldestWins,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub member_ids: Vec<Uuid>,
    pub resolution: FieldResolution,
    /// Chaves naturais (número canônico / e-mail) que não devem ir para o sobrevivente.
    pub excluded_phones: Vec<String>,
    pub excluded_emails: Vec<String>,
}

// --- RE-LINK ---

/// Tabelas com chave estrangeira para `contacts` que a unificação re-aponta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelinkTarget {
    Notes,
    Activities,
    FunnelCards,
    Employees,
    WhatsappConversations,
}

impl RelinkTarget {
    pub const ALL: [RelinkTarget; 5] = [
        RelinkTarget::Notes,
        RelinkTarget::Activities,
        RelinkTarget::FunnelCards,
        RelinkTarget::Employees,
        RelinkTarget::WhatsappConversations,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            RelinkTarget::Notes => "notes",
            RelinkTarget::Activities => "activities",
            RelinkTarget::FunnelCards => "funnel_cards",
            RelinkTarget::Employees => "employees",
            RelinkTarget::WhatsappConversations => "whatsapp_conversations",
        }
    }
}

// --- RESULTADOS ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub survivor_id: Uuid,
    pub merged_ids: Vec<Uuid>,
    pub contacts_removed: u64,
    pub phones_added: u64,
    pub emails_added: u64,
    /// Linhas re-apontadas por tabela.
    pub relinked: BTreeMap<String, u64>,
    #[schema(example = "2 contato(s) unificado(s) em 550e8400-e29b-41d4-a716-446655440000")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchMergeReport {
    pub groups_found: usize,
    pub groups_merged: usize,
    /// Grupos que deixaram de existir por causa de unificações anteriores no mesmo passe.
    pub groups_skipped: usize,
    pub contacts_removed: u64,
    pub merges: Vec<MergeResult>,
}
