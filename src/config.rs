// src/config.rs

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{
    common::{i18n::I18nStore, normalize::DEFAULT_COUNTRY_CODE},
    db::PgContactStore,
    services::{
        auth::AuthService,
        conversion_service::{ConversionDispatcher, MetaConversionsClient},
        dedup_service::DedupService,
        employee_link_service::EmployeeLinkService,
        intake_service::{IntakeService, IntakeSettings},
        tenancy_service::TenantResolver,
    },
};

#[derive(Debug, Clone)]
pub struct MetaSettings {
    pub pixel_id: String,
    pub access_token: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub default_organization_id: Option<Uuid>,
    pub intake: IntakeSettings,
    /// Sem pixel e token os eventos de conversão só vão para o log.
    pub meta: Option<MetaSettings>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lê a configuração de qualquer fonte chave/valor (o ambiente, em produção).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let uuid = |key: &str| -> anyhow::Result<Option<Uuid>> {
            get(key)
                .map(|raw| Uuid::parse_str(&raw).with_context(|| format!("{} não é um UUID válido", key)))
                .transpose()
        };

        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = get("DB_MAX_CONNECTIONS")
            .map(|raw| raw.parse::<u32>())
            .transpose()
            .context("DB_MAX_CONNECTIONS deve ser um número")?
            .unwrap_or(5);

        let meta = match (get("META_PIXEL_ID"), get("META_ACCESS_TOKEN")) {
            (Some(pixel_id), Some(access_token)) => Some(MetaSettings {
                pixel_id,
                access_token,
                api_version: get("META_API_VERSION").unwrap_or_else(|| "v19.0".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            default_organization_id: uuid("DEFAULT_ORGANIZATION_ID")?,
            intake: IntakeSettings {
                default_country_code: get("DEFAULT_COUNTRY_CODE")
                    .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string()),
                default_thank_you_url: get("DEFAULT_THANK_YOU_URL")
                    .unwrap_or_else(|| "/obrigado".to_string()),
                default_lead_source: get("DEFAULT_LEAD_SOURCE").unwrap_or_else(|| "Site".to_string()),
                default_funnel_id: uuid("DEFAULT_FUNNEL_ID")?,
            },
            meta,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub tenant_resolver: TenantResolver<PgContactStore>,
    pub intake_service: IntakeService<PgContactStore>,
    pub dedup_service: DedupService<PgContactStore>,
    pub employee_link_service: EmployeeLinkService<PgContactStore>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::build(config, db_pool)
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn build(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let store = PgContactStore::new(db_pool.clone());

        let conversions = match &config.meta {
            Some(meta) => {
                let client = MetaConversionsClient::new(&meta.pixel_id, &meta.access_token, &meta.api_version)?;
                tracing::info!("📣 Eventos de conversão serão enviados ao pixel {}", meta.pixel_id);
                ConversionDispatcher::new(Arc::new(client))
            }
            None => ConversionDispatcher::logging_only(),
        };

        let tenant_resolver = TenantResolver::new(store.clone(), config.default_organization_id);
        let intake_service = IntakeService::new(
            store.clone(),
            tenant_resolver.clone(),
            conversions,
            config.intake.clone(),
        );

        Ok(Self {
            auth_service: AuthService::new(config.jwt_secret.clone()),
            i18n_store: Arc::new(I18nStore::embedded()?),
            dedup_service: DedupService::new(store.clone(), config.intake.default_country_code.clone()),
            employee_link_service: EmployeeLinkService::new(
                store,
                config.intake.default_country_code.clone(),
            ),
            tenant_resolver,
            intake_service,
            config: Arc::new(config),
            db_pool,
        })
    }
}
