// src/models/lead.rs

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::common::{
    error::AppError,
    normalize::{parse_flag, parse_locale_decimal},
};

// Chaves aceitas para cada campo (o formulário das landing pages usa os nomes em português)
const NAME_KEYS: &[&str] = &["name", "nome"];
const PHONE_KEYS: &[&str] = &["phone", "telefone", "whatsapp"];
const COUNTRY_CODE_KEYS: &[&str] = &["country_code", "ddi"];
const EMAIL_KEYS: &[&str] = &["email", "e-mail"];
const SOURCE_KEYS: &[&str] = &["source", "origem"];
const INCOME_KEYS: &[&str] = &["income", "renda"];
const FGTS_KEYS: &[&str] = &["has_fgts", "fgts"];
const TENURE_KEYS: &[&str] = &["employment_tenure_flag", "mais_de_3_anos_clt"];
const NOTES_KEYS: &[&str] = &["notes", "observacoes", "mensagem"];
const REDIRECT_KEYS: &[&str] = &["redirect_url", "thank_you_url"];
const DEFAULT_SOURCE_KEYS: &[&str] = &["default_source"];

/// Campos comuns a todos os formulários de captação.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseLead {
    pub name: String,
    pub phone: Option<String>,
    pub country_code: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    /// Texto livre (observações e campos não mapeados), vira uma nota interna.
    pub extra: Vec<(String, String)>,
}

impl BaseLead {
    pub fn note_body(&self) -> Option<String> {
        if self.extra.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .extra
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        Some(lines.join("\n"))
    }
}

/// Dados do formulário de simulação de financiamento.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialData {
    pub household_income: Option<Decimal>,
    pub has_fgts: Option<bool>,
    pub formal_employment_over_3_years: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeadSubmission {
    Standard(BaseLead),
    Financial { base: BaseLead, financial: FinancialData },
}

impl LeadSubmission {
    pub fn base(&self) -> &BaseLead {
        match self {
            LeadSubmission::Standard(base) => base,
            LeadSubmission::Financial { base, .. } => base,
        }
    }

    pub fn financial(&self) -> Option<&FinancialData> {
        match self {
            LeadSubmission::Standard(_) => None,
            LeadSubmission::Financial { financial, .. } => Some(financial),
        }
    }
}

/// Formulário já separado em submissão + campos de controle da página.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadRequest {
    pub submission: LeadSubmission,
    pub redirect_url: Option<String>,
    pub default_source: Option<String>,
}

/// O corpo bruto (chave/valor) enviado pela landing page.
#[derive(Debug, Clone, Default)]
pub struct LeadForm {
    fields: BTreeMap<String, String>,
}

impl From<HashMap<String, String>> for LeadForm {
    fn from(raw: HashMap<String, String>) -> Self {
        Self { fields: raw.into_iter().collect() }
    }
}

impl LeadForm {
    // Remove todas as chaves do grupo e devolve o primeiro valor não vazio
    fn take(&mut self, keys: &[&str]) -> Option<String> {
        let mut found = None;
        for key in keys {
            if let Some(value) = self.fields.remove(*key) {
                let value = value.trim();
                if found.is_none() && !value.is_empty() {
                    found = Some(value.to_string());
                }
            }
        }
        found
    }

    // Como `take`, mas diz se a chave existia mesmo vazia
    fn take_present(&mut self, keys: &[&str]) -> Option<String> {
        let present = keys.iter().any(|k| self.fields.contains_key(*k));
        let value = self.take(keys);
        if present { Some(value.unwrap_or_default()) } else { None }
    }

    /// Valida e tipa o formulário. Sem nome não há lead.
    pub fn parse(mut self) -> Result<LeadRequest, AppError> {
        let name = self.take(NAME_KEYS).ok_or(AppError::MissingLeadName)?;

        let redirect_url = self.take(REDIRECT_KEYS);
        let default_source = self.take(DEFAULT_SOURCE_KEYS);

        let phone = self.take(PHONE_KEYS);
        let country_code = self.take(COUNTRY_CODE_KEYS);
        let email = self.take(EMAIL_KEYS);
        let source = self.take(SOURCE_KEYS);

        // A simples presença do campo de renda marca o formulário como financeiro
        let income = self.take_present(INCOME_KEYS);
        let has_fgts = self.take(FGTS_KEYS);
        let tenure = self.take(TENURE_KEYS);

        let mut extra = Vec::new();
        if let Some(notes) = self.take(NOTES_KEYS) {
            extra.push(("observacoes".to_string(), notes));
        }
        extra.extend(
            self.fields
                .into_iter()
                .map(|(k, v)| (k, v.trim().to_string()))
                .filter(|(_, v)| !v.is_empty()),
        );

        let base = BaseLead { name, phone, country_code, email, source, extra };

        let submission = match income {
            Some(raw_income) => LeadSubmission::Financial {
                base,
                financial: FinancialData {
                    household_income: parse_locale_decimal(&raw_income),
                    has_fgts: has_fgts.as_deref().and_then(parse_flag),
                    formal_employment_over_3_years: tenure.as_deref().and_then(parse_flag),
                },
            },
            None => LeadSubmission::Standard(base),
        };

        Ok(LeadRequest { submission, redirect_url, default_source })
    }
}

/// Resposta para o visitante: sempre um redirecionamento para a página de obrigado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadRedirect {
    pub location: String,
}

// Só para a documentação OpenAPI do formulário público
#[allow(dead_code)]
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeadFormDoc {
    #[schema(example = "Ana Silva")]
    pub nome: String,
    #[schema(example = "(33) 98888-1111")]
    pub telefone: Option<String>,
    #[schema(example = "+55")]
    pub ddi: Option<String>,
    #[schema(example = "ana@x.com")]
    pub email: Option<String>,
    #[schema(example = "Landing A")]
    pub origem: Option<String>,
    #[schema(example = "5.000,00")]
    pub renda: Option<String>,
    #[schema(example = "sim")]
    pub fgts: Option<String>,
    #[schema(example = "sim")]
    pub mais_de_3_anos_clt: Option<String>,
    pub observacoes: Option<String>,
    #[schema(example = "/obrigado")]
    pub redirect_url: Option<String>,
    pub default_source: Option<String>,
}
