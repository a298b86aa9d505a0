// src/models/conversion.rs

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    NewLead,
    ReturningContact,
}

impl ConversionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionKind::NewLead => "new-lead",
            ConversionKind::ReturningContact => "returning-contact",
        }
    }

    /// Nome do evento padrão na Conversions API da Meta.
    pub fn meta_event_name(&self) -> &'static str {
        match self {
            ConversionKind::NewLead => "Lead",
            ConversionKind::ReturningContact => "Contact",
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            ConversionKind::NewLead => "novo_lead",
            ConversionKind::ReturningContact => "contato_recorrente",
        }
    }
}

/// Dados do lead já normalizados e com hash SHA-256 (nunca em claro).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HashedUserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<String>,
    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "ln", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionCustomData {
    pub content_name: String,
    pub status: String,
    pub currency: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionEvent {
    pub event_id: Uuid,
    pub kind: ConversionKind,
    pub event_time: i64,
    pub user_data: HashedUserData,
    pub custom_data: ConversionCustomData,
}
