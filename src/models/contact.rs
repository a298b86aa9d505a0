// src/models/contact.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::normalize::format_phone_display;

// --- ENUMS ---

// Mapeia o CREATE TYPE contact_personality do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_personality", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Individual,
    Organization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Contact,
    Client,
    Supplier,
    Lead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Active,
    Inactive,
    Archived,
}

// --- CAMPOS ESCALARES ---

/// Todos os campos escalares de um contato. É a unidade que a unificação resolve
/// campo a campo e grava no sobrevivente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub personality: Personality,

    // Pessoa física
    #[schema(example = "Ana Silva")]
    pub full_name: Option<String>,
    #[schema(example = "12345678909")]
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<String>,
    pub occupation: Option<String>,

    // Pessoa jurídica
    pub legal_name: Option<String>,
    pub trade_name: Option<String>,
    pub cnpj: Option<String>,
    pub state_registration: Option<String>,
    pub municipal_registration: Option<String>,
    pub legal_representative: Option<String>,

    pub contact_type: ContactType,
    pub status: ContactStatus,
    #[schema(example = "Landing A")]
    pub source: Option<String>,

    // Só preenchidos por formulários de simulação de financiamento
    #[schema(value_type = Option<String>, example = "5000.00")]
    pub household_income: Option<Decimal>,
    pub has_fgts: Option<bool>,
    pub formal_employment_over_3_years: Option<bool>,
}

impl ContactFields {
    /// Pessoa física vazia, com os padrões do banco.
    pub fn individual() -> Self {
        Self {
            personality: Personality::Individual,
            full_name: None,
            cpf: None,
            birth_date: None,
            marital_status: None,
            occupation: None,
            legal_name: None,
            trade_name: None,
            cnpj: None,
            state_registration: None,
            municipal_registration: None,
            legal_representative: None,
            contact_type: ContactType::Contact,
            status: ContactStatus::Active,
            source: None,
            household_income: None,
            has_fgts: None,
            formal_employment_over_3_years: None,
        }
    }

    /// Nome para exibição, independente da personalidade.
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .or(self.trade_name.as_deref())
            .or(self.legal_name.as_deref())
    }
}

// --- CONTATO ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    #[sqlx(rename = "organizacao_id")]
    #[schema(ignore)]
    pub organization_id: Uuid,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: ContactFields,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    pub id: Uuid,
    #[sqlx(rename = "organizacao_id")]
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub contact_id: Uuid,
    /// DDI + número, só dígitos.
    #[schema(example = "5533988881111")]
    pub number: String,
    #[schema(example = "+55")]
    pub country_code: String,
    #[schema(example = "celular")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl Phone {
    pub fn display(&self) -> String {
        format_phone_display(&self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: Uuid,
    #[sqlx(rename = "organizacao_id")]
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub contact_id: Uuid,
    #[schema(example = "ana@x.com")]
    pub address: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// Contato com seus telefones e e-mails, como o motor de duplicados enxerga.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    #[serde(flatten)]
    pub contact: Contact,
    pub phones: Vec<Phone>,
    pub emails: Vec<Email>,
}

impl ContactRecord {
    pub fn id(&self) -> Uuid {
        self.contact.id
    }
}

// --- ESCRITA ---

#[derive(Debug, Clone)]
pub struct NewPhone {
    pub number: String,
    pub country_code: String,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct NewEmail {
    pub address: String,
    pub kind: String,
}

pub const PHONE_KIND_MOBILE: &str = "celular";
pub const EMAIL_KIND_PERSONAL: &str = "pessoal";
