// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{Database, MemoryDatabase, PgDatabase},
    services::{auth::AuthService, PipelineService, TxSettings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub tx: TxSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("PIPELINE_STORAGE").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => return Err(anyhow!("PIPELINE_STORAGE inválido: {other}")),
        };

        let database_url = lookup("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL deve ser definida"));
        }

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            storage,
            database_url,
            jwt_secret,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: number(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(number(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            tx: TxSettings {
                timeout: Duration::from_secs(number(&lookup, "TX_TIMEOUT_SECS", 10)?),
                max_attempts: number::<_, u32>(&lookup, "TX_MAX_ATTEMPTS", 3)?.max(1),
            },
        })
    }
}

fn number<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} inválido: {raw}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: PipelineService,
    pub auth_service: AuthService,
    pub i18n_store: Arc<I18nStore>,
}

impl AppState {
    /// Conecta ao armazenamento escolhido e monta o gráfico de dependências.
    /// Migrações ficam a cargo de quem chama (`main`).
    pub async fn new(config: &Config) -> anyhow::Result<(Self, Option<sqlx::PgPool>)> {
        let (db, pool): (Arc<dyn Database>, Option<sqlx::PgPool>) = match config.storage {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;
                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(config.db_acquire_timeout)
                    .connect(url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                let db: Arc<dyn Database> = Arc::new(PgDatabase::new(pool.clone()));
                (db, Some(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Usando armazenamento em memória: nada será persistido");
                let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
                (db, None)
            }
        };

        Ok((Self::with_database(db, config), pool))
    }

    pub fn with_database(db: Arc<dyn Database>, config: &Config) -> Self {
        Self {
            pipeline: PipelineService::new(db, config.tx),
            auth_service: AuthService::new(config.jwt_secret.clone()),
            i18n_store: Arc::new(I18nStore::new()),
        }
    }
}
