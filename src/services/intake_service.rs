// src/services/intake_service.rs
//
// Captação de leads das landing pages. Para o visitante o resultado é sempre
// um redirecionamento; o resultado interno (que pode falhar) só vai para o log.

use thiserror::Error;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        normalize::{NormalizedPhone, normalize_country_code, normalize_email},
    },
    db::{ContactStore, ContactTx},
    models::{
        contact::{
            Contact, ContactFields, ContactType, EMAIL_KIND_PERSONAL, NewEmail, NewPhone,
            PHONE_KIND_MOBILE,
        },
        conversion::{ConversionEvent, ConversionKind},
        funnel::{DEFAULT_CARD_ORDER, DEFAULT_FUNNEL_NAME, DEFAULT_FUNNEL_STAGES, Funnel},
        lead::{LeadRedirect, LeadRequest},
    },
    services::{
        conversion_service::{ConversionDispatcher, build_event, hash_user_data},
        tenancy_service::TenantResolver,
    },
};

#[derive(Debug, Clone)]
pub struct IntakeSettings {
    pub default_country_code: String,
    pub default_thank_you_url: String,
    pub default_lead_source: String,
    /// Funil procurado primeiro pelo id; sem ele, pelo nome padrão.
    pub default_funnel_id: Option<Uuid>,
}

/// Em que etapa a captação falhou.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("organização não resolvida: {0}")]
    Tenant(#[source] AppError),

    #[error("falha ao gravar o contato: {0}")]
    Contact(#[source] AppError),

    #[error("falha ao gravar telefone/e-mail: {0}")]
    Channel(#[source] AppError),

    #[error("falha ao posicionar no funil: {0}")]
    Funnel(#[source] AppError),
}

impl IntakeError {
    pub fn stage(&self) -> &'static str {
        match self {
            IntakeError::Tenant(_) => "tenant",
            IntakeError::Contact(_) => "contact",
            IntakeError::Channel(_) => "channel",
            IntakeError::Funnel(_) => "funnel",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub organization_id: Uuid,
    pub contact_id: Uuid,
    pub created: bool,
    pub card_created: bool,
    pub event: ConversionEvent,
}

#[derive(Clone)]
pub struct IntakeService<S: ContactStore> {
    store: S,
    tenants: TenantResolver<S>,
    conversions: ConversionDispatcher,
    settings: IntakeSettings,
}

impl<S: ContactStore> IntakeService<S> {
    pub fn new(
        store: S,
        tenants: TenantResolver<S>,
        conversions: ConversionDispatcher,
        settings: IntakeSettings,
    ) -> Self {
        Self { store, tenants, conversions, settings }
    }

    /// Processa o formulário e devolve a página de obrigado, aconteça o que acontecer.
    pub async fn submit(&self, request: LeadRequest) -> LeadRedirect {
        let redirect = self.redirect_for(&request);

        match self.process(&request).await {
            Ok(outcome) => {
                tracing::info!(
                    "✅ Lead processado: contato {} ({}), card criado: {}",
                    outcome.contact_id,
                    if outcome.created { "novo" } else { "atualizado" },
                    outcome.card_created
                );
                self.conversions.dispatch(outcome.event);
            }
            Err(e) => {
                tracing::error!("❌ Falha na captação do lead [{}]: {}", e.stage(), e);
            }
        }

        redirect
    }

    /// Só aceita destinos relativos ou http(s); qualquer outra coisa vai para o padrão.
    pub fn redirect_for(&self, request: &LeadRequest) -> LeadRedirect {
        let location = request
            .redirect_url
            .as_deref()
            .filter(|url| {
                (url.starts_with('/') && !url.starts_with("//"))
                    || url.starts_with("https://")
                    || url.starts_with("http://")
            })
            .unwrap_or(self.settings.default_thank_you_url.as_str());

        LeadRedirect { location: location.to_string() }
    }

    pub async fn process(&self, request: &LeadRequest) -> Result<IntakeOutcome, IntakeError> {
        let organization_id = self
            .tenants
            .resolve_default()
            .await
            .map_err(IntakeError::Tenant)?;

        let base = request.submission.base();
        let country_code = base
            .country_code
            .as_deref()
            .and_then(normalize_country_code)
            .unwrap_or_else(|| self.settings.default_country_code.clone());
        let phone = base
            .phone
            .as_deref()
            .and_then(|raw| NormalizedPhone::parse(raw, Some(&country_code)));
        let email = base.email.as_deref().and_then(normalize_email);

        if base.email.is_some() && email.is_none() {
            tracing::debug!("E-mail inválido ignorado na captação");
        }

        // 1. Contato, telefone, e-mail e nota: uma transação
        let mut tx = self
            .store
            .begin(organization_id)
            .await
            .map_err(IntakeError::Contact)?;
        // Se algo falhar, o drop da transação desfaz tudo
        let (contact, created) = self
            .upsert_contact(&mut tx, request, phone.as_ref(), email.as_deref())
            .await?;
        tx.commit().await.map_err(IntakeError::Contact)?;

        // 2. Funil: transação separada, o contato já está salvo
        let card_created = self.place_in_funnel(organization_id, contact.id).await?;

        // 3. Evento de conversão (disparado por quem chamou)
        let kind = if created {
            ConversionKind::NewLead
        } else {
            ConversionKind::ReturningContact
        };
        // A origem é a do formulário enviado agora, não a da primeira captação
        let content_name = base
            .source
            .clone()
            .or_else(|| request.default_source.clone())
            .or_else(|| contact.fields.source.clone())
            .unwrap_or_else(|| self.settings.default_lead_source.clone());
        let event = build_event(
            kind,
            hash_user_data(&base.name, email.as_deref(), phone.as_ref()),
            &content_name,
            contact.fields.household_income,
        );

        Ok(IntakeOutcome {
            organization_id,
            contact_id: contact.id,
            created,
            card_created,
            event,
        })
    }

    async fn upsert_contact(
        &self,
        tx: &mut S::Tx,
        request: &LeadRequest,
        phone: Option<&NormalizedPhone>,
        email: Option<&str>,
    ) -> Result<(Contact, bool), IntakeError> {
        let submission = &request.submission;
        let base = submission.base();

        // Telefone primeiro; e-mail só se o telefone não achou ninguém
        let mut existing = None;
        if let Some(phone) = phone {
            existing = tx
                .find_contact_by_phone(&phone.full())
                .await
                .map_err(IntakeError::Contact)?;
        }
        if existing.is_none() {
            if let Some(email) = email {
                existing = tx
                    .find_contact_by_email(email)
                    .await
                    .map_err(IntakeError::Contact)?;
            }
        }

        let (contact, created) = match existing {
            Some(contact_id) => {
                // Formulário comum nunca apaga dados financeiros já capturados
                let contact = tx
                    .touch_contact(contact_id, submission.financial())
                    .await
                    .map_err(IntakeError::Contact)?
                    .ok_or(IntakeError::Contact(AppError::ContactNotFound(contact_id)))?;
                (contact, false)
            }
            None => {
                let mut fields = ContactFields::individual();
                fields.full_name = Some(base.name.clone());
                fields.contact_type = ContactType::Lead;
                fields.source = Some(
                    base.source
                        .clone()
                        .or_else(|| request.default_source.clone())
                        .unwrap_or_else(|| self.settings.default_lead_source.clone()),
                );
                if let Some(financial) = submission.financial() {
                    fields.household_income = financial.household_income;
                    fields.has_fgts = financial.has_fgts;
                    fields.formal_employment_over_3_years = financial.formal_employment_over_3_years;
                }

                let contact = tx
                    .insert_contact(&fields)
                    .await
                    .map_err(IntakeError::Contact)?;
                (contact, true)
            }
        };

        if let Some(phone) = phone {
            let new_phone = NewPhone {
                number: phone.full(),
                country_code: phone.country_code.clone(),
                kind: PHONE_KIND_MOBILE.to_string(),
            };
            tx.insert_phone(contact.id, &new_phone)
                .await
                .map_err(IntakeError::Channel)?;
        }

        if let Some(email) = email {
            let new_email = NewEmail {
                address: email.to_string(),
                kind: EMAIL_KIND_PERSONAL.to_string(),
            };
            tx.insert_email(contact.id, &new_email)
                .await
                .map_err(IntakeError::Channel)?;
        }

        if let Some(body) = base.note_body() {
            tx.insert_note(contact.id, &body)
                .await
                .map_err(IntakeError::Contact)?;
        }

        Ok((contact, created))
    }

    /// Coloca o contato na etapa de entrada do funil padrão, se ainda não estiver no funil.
    /// Um card existente nunca é movido.
    async fn place_in_funnel(&self, organization_id: Uuid, contact_id: Uuid) -> Result<bool, IntakeError> {
        let mut tx = self
            .store
            .begin(organization_id)
            .await
            .map_err(IntakeError::Funnel)?;

        let funnel = self.resolve_funnel(&mut tx).await.map_err(IntakeError::Funnel)?;

        if tx
            .find_card(funnel.id, contact_id)
            .await
            .map_err(IntakeError::Funnel)?
            .is_some()
        {
            tx.commit().await.map_err(IntakeError::Funnel)?;
            return Ok(false);
        }

        let mut stages = tx.list_stages(funnel.id).await.map_err(IntakeError::Funnel)?;
        if stages.is_empty() {
            for (position, name) in DEFAULT_FUNNEL_STAGES.iter().enumerate() {
                let stage = tx
                    .create_stage(funnel.id, name, position as i32)
                    .await
                    .map_err(IntakeError::Funnel)?;
                stages.push(stage);
            }
        }

        let entry = stages
            .iter()
            .min_by_key(|stage| stage.position)
            .ok_or_else(|| IntakeError::Funnel(AppError::FunnelUnavailable(funnel.name.clone())))?;

        let created = tx
            .insert_card(funnel.id, entry.id, contact_id, DEFAULT_CARD_ORDER)
            .await
            .map_err(IntakeError::Funnel)?;
        tx.commit().await.map_err(IntakeError::Funnel)?;

        Ok(created)
    }

    async fn resolve_funnel(&self, tx: &mut S::Tx) -> Result<Funnel, AppError> {
        if let Some(funnel_id) = self.settings.default_funnel_id {
            if let Some(funnel) = tx.find_funnel_by_id(funnel_id).await? {
                return Ok(funnel);
            }
        }

        if let Some(funnel) = tx.find_funnel_by_name(DEFAULT_FUNNEL_NAME).await? {
            return Ok(funnel);
        }

        tracing::info!("Criando o funil padrão '{}'", DEFAULT_FUNNEL_NAME);
        tx.create_funnel(DEFAULT_FUNNEL_NAME, self.settings.default_funnel_id)
            .await
    }
}
