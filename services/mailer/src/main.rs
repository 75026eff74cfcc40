use std::time::Duration;

use anyhow::Context as _;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mailcraft_core::config::Config;
use mailcraft_core::tracing::init_tracing;
use mailcraft_mailer::config::MailerConfig;
use mailcraft_mailer::domain::types::Participant;
use mailcraft_mailer::infra::nylas::{NylasClient, NylasSettings};
use mailcraft_mailer::infra::openai::OpenAiClient;
use mailcraft_mailer::infra::session::{MemoryGrantStore, RedisGrantStore, SessionStore};
use mailcraft_mailer::router::build_router;
use mailcraft_mailer::scheduler::CampaignScheduler;
use mailcraft_mailer::state::AppState;
use mailcraft_mailer_migration::Migrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = MailerConfig::try_from_env().context("failed to load config from environment")?;

    let mut db_options = ConnectOptions::new(config.database_url.clone());
    db_options
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    let db = Database::connect(db_options)
        .await
        .context("failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to run migrations")?;

    let sessions = match &config.redis_url {
        Some(url) => {
            let pool = deadpool_redis::Config::from_url(url)
                .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                .context("failed to create Redis pool")?;
            SessionStore::Redis(RedisGrantStore { pool })
        }
        None => SessionStore::Memory(MemoryGrantStore::new()),
    };

    let recurrence = config
        .recurrence()
        .with_context(|| format!("invalid CAMPAIGN_RECURRENCE {:?}", config.campaign_recurrence))?;
    let scheduler = CampaignScheduler::new(config.scheduler_tick(), recurrence);

    let nylas = NylasClient::new(NylasSettings {
        api_uri: config.nylas_api_uri.clone(),
        api_key: config.nylas_api_key.clone(),
        client_id: config.nylas_client_id.clone(),
        client_secret: config.client_secret().to_owned(),
        redirect_uri: config.nylas_redirect_uri.clone(),
        provider: config.nylas_provider.clone(),
    });
    let openai = OpenAiClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    );

    let state = AppState {
        db,
        sessions,
        nylas,
        openai,
        scheduler: scheduler.clone(),
        retry: config.retry_policy(),
        session_ttl_secs: config.session_ttl_secs,
        cookie_secure: config.cookie_secure,
        sender: config
            .sender_email
            .as_ref()
            .map(|email| Participant::new(config.sender_name.clone(), email.clone())),
        recurrence_expr: config.campaign_recurrence.clone(),
    };

    let cancel = CancellationToken::new();
    let scheduler_task = scheduler.start(state.campaign_runner(), cancel.clone());

    let session_backend = state.sessions.backend();
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.mailer_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        session_backend,
        "mailer service listening"
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cancel.cancel();
    scheduler_task.await.context("scheduler task panicked")?;
    info!("mailer service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
