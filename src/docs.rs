// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Leads (público) ---
        handlers::leads::submit_lead,

        // --- Duplicados ---
        handlers::dedup::list_duplicates,
        handlers::dedup::get_duplicate_group,
        handlers::dedup::merge_contacts,
        handlers::dedup::merge_all_duplicates,

        // --- RH ---
        handlers::employees::list_contact_suggestions,
        handlers::employees::link_contact,
    ),
    components(
        schemas(
            // --- Contatos ---
            models::contact::Personality,
            models::contact::ContactType,
            models::contact::ContactStatus,
            models::contact::ContactFields,
            models::contact::Contact,
            models::contact::Phone,
            models::contact::Email,
            models::contact::ContactRecord,

            // --- Funil ---
            models::funnel::Funnel,
            models::funnel::FunnelStage,
            models::funnel::FunnelCard,

            // --- Duplicados ---
            models::dedup::MatchType,
            models::dedup::MergeField,
            models::dedup::DuplicateGroup,
            models::dedup::MergeResult,
            models::dedup::BatchMergeReport,
            handlers::dedup::MergePayload,
            handlers::dedup::FieldSourcePayload,

            // --- RH ---
            models::employee::Employee,
            models::employee::LinkSignal,
            models::employee::LinkCandidate,
            models::employee::EmployeeLinkSuggestion,
            handlers::employees::LinkContactPayload,

            // --- Leads ---
            models::lead::LeadFormDoc,
        )
    ),
    tags(
        (name = "Leads", description = "Captação de leads das landing pages"),
        (name = "Duplicates", description = "Detecção e unificação de contatos duplicados"),
        (name = "HR", description = "Vínculo de funcionários com contatos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
