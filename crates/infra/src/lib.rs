mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, VapiConfig};
use repos::Repos;
pub use repos::{IReminderRepo, ReminderFindQuery, StatusUpdate};
pub use services::{CallOutcome, IVoiceCallClient, VapiVoiceCallClient, VoiceCallRequest};
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;

#[derive(Clone)]
pub struct CallmeContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub call_client: Arc<dyn IVoiceCallClient>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl CallmeContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let call_client = Arc::new(VapiVoiceCallClient::new(config.vapi.clone()));
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            call_client,
        }
    }

    /// Context backed by inmemory repos and an unconfigured call client.
    /// Tests swap `sys` and `call_client` as needed.
    pub fn create_inmemory() -> Self {
        let config = Config {
            port: 5000,
            scheduler_interval_secs: 30,
            skip_batch_when_unconfigured: false,
            vapi: VapiConfig::unconfigured(),
        };
        let call_client = Arc::new(VapiVoiceCallClient::new(config.vapi.clone()));
        Self {
            repos: Repos::create_inmemory(),
            config,
            sys: Arc::new(RealSys {}),
            call_client,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> CallmeContext {
    CallmeContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
