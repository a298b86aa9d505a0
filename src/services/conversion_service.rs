// src/services/conversion_service.rs
//
// Eventos de conversão para a plataforma de anúncios (Meta Conversions API).
// O envio roda numa task separada: falha aqui nunca chega ao visitante.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        normalize::{NormalizedPhone, digits_only},
    },
    models::conversion::{ConversionCustomData, ConversionEvent, ConversionKind, HashedUserData},
};

const GRAPH_API_BASE: &str = "https://graph.facebook.com";
const ACTION_SOURCE: &str = "website";
const CURRENCY: &str = "BRL";

// =========================================================================
//  MONTAGEM DO EVENTO
// =========================================================================

fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

fn hash_normalized(value: &str) -> Option<String> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    Some(sha256_hex(&normalized))
}

/// Dados do lead como a plataforma espera: normalizados e com hash, nunca em claro.
pub fn hash_user_data(
    name: &str,
    email: Option<&str>,
    phone: Option<&NormalizedPhone>,
) -> HashedUserData {
    let mut parts = name.split_whitespace();
    let first_name = parts.next();
    let last_name = parts.last();

    HashedUserData {
        em: email.and_then(hash_normalized),
        ph: phone.and_then(|p| hash_normalized(&digits_only(&p.full()))),
        first_name: first_name.and_then(hash_normalized),
        last_name: last_name.and_then(hash_normalized),
    }
}

pub fn build_event(
    kind: ConversionKind,
    user_data: HashedUserData,
    content_name: &str,
    income: Option<Decimal>,
) -> ConversionEvent {
    ConversionEvent {
        event_id: Uuid::new_v4(),
        kind,
        event_time: Utc::now().timestamp(),
        user_data,
        custom_data: ConversionCustomData {
            content_name: content_name.to_string(),
            status: kind.status_label().to_string(),
            currency: CURRENCY.to_string(),
            value: income.unwrap_or(Decimal::ZERO),
        },
    }
}

// =========================================================================
//  DESTINOS
// =========================================================================

#[async_trait]
pub trait ConversionSink: Send + Sync {
    async fn send(&self, event: &ConversionEvent) -> Result<(), AppError>;
}

/// Envia para `POST /{versão}/{pixel}/events` da Graph API.
pub struct MetaConversionsClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl MetaConversionsClient {
    pub fn new(pixel_id: &str, access_token: &str, api_version: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("criando cliente HTTP da Conversions API")?;

        Ok(Self {
            http,
            endpoint: format!("{}/{}/{}/events", GRAPH_API_BASE, api_version, pixel_id),
            access_token: access_token.to_string(),
        })
    }

    pub fn payload(event: &ConversionEvent) -> serde_json::Value {
        json!({
            "data": [{
                "event_name": event.kind.meta_event_name(),
                "event_time": event.event_time,
                "event_id": event.event_id,
                "action_source": ACTION_SOURCE,
                "user_data": event.user_data,
                "custom_data": event.custom_data,
            }]
        })
    }
}

#[async_trait]
impl ConversionSink for MetaConversionsClient {
    async fn send(&self, event: &ConversionEvent) -> Result<(), AppError> {
        self.http
            .post(&self.endpoint)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&Self::payload(event))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("📣 Evento {} enviado ({})", event.kind.as_str(), event.event_id);
        Ok(())
    }
}

/// Sem pixel configurado: o evento só é registrado no log.
pub struct LoggingSink;

#[async_trait]
impl ConversionSink for LoggingSink {
    async fn send(&self, event: &ConversionEvent) -> Result<(), AppError> {
        tracing::info!(
            "Evento de conversão {} ({}) não enviado: pixel não configurado",
            event.kind.as_str(),
            event.event_id
        );
        Ok(())
    }
}

// =========================================================================
//  DISPARO
// =========================================================================

#[derive(Clone)]
pub struct ConversionDispatcher {
    sink: Arc<dyn ConversionSink>,
}

impl ConversionDispatcher {
    pub fn new(sink: Arc<dyn ConversionSink>) -> Self {
        Self { sink }
    }

    pub fn logging_only() -> Self {
        Self::new(Arc::new(LoggingSink))
    }

    /// Dispara e esquece. O handle só existe para os testes poderem aguardar.
    pub fn dispatch(&self, event: ConversionEvent) -> JoinHandle<()> {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.send(&event).await {
                tracing::warn!(
                    "⚠️ Falha ao enviar evento de conversão {} ({}): {}",
                    event.kind.as_str(),
                    event.event_id,
                    e
                );
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::mpsc;

    /// Destino que só repassa os eventos para o teste.
    pub struct RecordingSink {
        pub tx: mpsc::UnboundedSender<ConversionEvent>,
        pub fail: bool,
    }

    #[async_trait]
    impl ConversionSink for RecordingSink {
        async fn send(&self, event: &ConversionEvent) -> Result<(), AppError> {
            let _ = self.tx.send(event.clone());
            if self.fail {
                return Err(AppError::InternalServerError(anyhow::anyhow!("plataforma fora do ar")));
            }
            Ok(())
        }
    }

    pub fn recording(fail: bool) -> (ConversionDispatcher, mpsc::UnboundedReceiver<ConversionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConversionDispatcher::new(Arc::new(RecordingSink { tx, fail })), rx)
    }
}
