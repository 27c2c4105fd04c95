//! Backend entry-point: loads settings, migrates the database, and serves
//! REST, WebSocket, and health endpoints.

mod server;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{WrapErr, eyre};
use diesel::{Connection, PgConnection};
use diesel_migrations::MigrationHarness;
use mockable::DefaultClock;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use musiconthego::domain::LoginCredentials;
use musiconthego::domain::ports::{AuthService, MediaStore};
use musiconthego::inbound::http::health::HealthState;
use musiconthego::inbound::ws::origin::OriginPolicy;
use musiconthego::outbound::media::{CloudinaryCredentials, CloudinaryMediaStore};
use musiconthego::outbound::persistence::{DbPool, MIGRATIONS, PoolConfig};
use musiconthego::settings::AppSettings;
use ortho_config::OrthoConfig;

use server::{AccountService, ServerConfig, build_services, create_server};

const MEDIA_TIMEOUT: Duration = Duration::from_secs(60);
const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| eyre!("failed to load settings: {e}"))?;
    let database_url = settings
        .database_url()
        .ok_or_else(|| eyre!("MOTG_DATABASE_URL must be set"))?
        .to_owned();

    run_migrations(database_url.clone()).await?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("failed to build database pool")?;

    let origins = OriginPolicy::new(settings.allowed_origins())
        .wrap_err("MOTG_ALLOWED_ORIGINS contains an invalid origin")?;
    let bind_addr = settings
        .bind_addr()
        .wrap_err("MOTG_BIND_HOST must be an IP address")?;

    let config = ServerConfig::new(bind_addr, pool)
        .with_token_ttl_hours(settings.token_ttl_hours())
        .with_max_upload_bytes(settings.max_upload_bytes())
        .with_origins(origins)
        .with_media_store(media_store(&settings)?);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::make_metrics()?));

    let services = build_services(&config);
    bootstrap_admin(&services.accounts, &settings).await?;
    spawn_token_purge(services.accounts.clone());

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting server");
    create_server(health_state, config, services)?.await?;
    Ok(())
}

/// Apply embedded migrations on a dedicated synchronous connection.
async fn run_migrations(database_url: String) -> color_eyre::Result<()> {
    let applied = tokio::task::spawn_blocking(move || -> color_eyre::Result<usize> {
        let mut conn = PgConnection::establish(&database_url)
            .wrap_err("failed to connect for migrations")?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| eyre!("migration failed: {e}"))?;
        Ok(versions.len())
    })
    .await
    .wrap_err("migration task panicked")??;
    info!(applied, "database migrations complete");
    Ok(())
}

fn media_store(settings: &AppSettings) -> color_eyre::Result<Arc<dyn MediaStore>> {
    let credentials = CloudinaryCredentials::from_parts(
        settings.cloudinary_cloud_name.clone(),
        settings.cloudinary_api_key.clone(),
        settings.cloudinary_api_secret.clone(),
        settings.cloudinary_folder(),
    );
    let Some(credentials) = credentials else {
        warn!("cloudinary credentials missing; uploads will return 503");
        return Ok(Arc::new(musiconthego::domain::ports::UnconfiguredMediaStore));
    };
    let store = CloudinaryMediaStore::new(credentials, MEDIA_TIMEOUT, Arc::new(DefaultClock))
        .wrap_err("failed to build media client")?;
    Ok(Arc::new(store))
}

async fn bootstrap_admin(
    accounts: &AccountService,
    settings: &AppSettings,
) -> color_eyre::Result<()> {
    let Some((email, password)) = settings.admin_credentials() else {
        return Ok(());
    };
    let credentials = LoginCredentials::try_from_parts(email, password)
        .map_err(|e| eyre!("invalid bootstrap admin credentials: {e}"))?;
    let created = accounts
        .ensure_admin(credentials)
        .await
        .map_err(|e| eyre!("admin bootstrap failed: {e}"))?;
    if created {
        info!(email, "created bootstrap admin account");
    }
    Ok(())
}

/// Drop expired bearer tokens at startup and then hourly.
fn spawn_token_purge(accounts: Arc<AccountService>) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match accounts.purge_expired_tokens().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "purged expired tokens"),
                Err(e) => warn!(error = %e, "token purge failed"),
            }
        }
    });
}
