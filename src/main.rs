//! Noretmy API server.
//!
//! Loads configuration, connects to PostgreSQL, wires the adapters into
//! the promotion handlers and serves the HTTP API. A background task
//! expires lapsed promotions on a fixed interval.

use std::process;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use noretmy::adapters::auth::{JwtConfig, JwtSessionValidator};
use noretmy::adapters::http::middleware::AuthState;
use noretmy::adapters::http::{build_router, PromotionAppState, RouterConfig};
use noretmy::adapters::postgres::{
    self, PostgresGigRepository, PostgresNotificationStore, PostgresPromotionRepository,
    PostgresUserRepository,
};
use noretmy::adapters::realtime::{RoomManager, WebSocketState};
use noretmy::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use noretmy::adapters::vat::ConfiguredVatRates;
use noretmy::application::handlers::promotion::{ExpirePromotionsHandler, NotificationLinks};
use noretmy::config::{AppConfig, ConfigError, LogFormat, ValidationError};
use noretmy::domain::foundation::Timestamp;
use noretmy::domain::promotion::PricingPolicy;
use noretmy::ports::{GigRepository, PromotionRepository};

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to install tracing subscriber: {0}")]
    Telemetry(String),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("noretmy: {error}");
        tracing::error!(error = %error, "startup failed");
        process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config)?;
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        live_payments = config.payment.is_live_mode(),
        "Starting noretmy"
    );

    let pool = postgres::connect(&config.database).await?;
    if config.database.run_migrations {
        postgres::run_migrations(&pool).await?;
    }

    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let gigs: Arc<dyn GigRepository> = Arc::new(PostgresGigRepository::new(pool.clone()));
    let promotions: Arc<dyn PromotionRepository> =
        Arc::new(PostgresPromotionRepository::new(pool.clone()));
    let notifications = Arc::new(PostgresNotificationStore::new(pool.clone()));

    let mut stripe = StripeConfig::new(
        config.payment.stripe_api_key.clone(),
        config.payment.stripe_webhook_secret.clone(),
    )
    .with_require_livemode(config.payment.require_livemode);
    if let Some(base_url) = &config.payment.api_base_url {
        stripe = stripe.with_base_url(base_url.clone());
    }

    let vat_rates = ConfiguredVatRates::new(
        config.pricing.default_vat()?,
        config.pricing.country_rates()?,
    );

    let mut jwt = JwtConfig::new(config.auth.jwt_secret.clone()).with_leeway(config.auth.leeway_secs);
    if let Some(issuer) = &config.auth.jwt_issuer {
        jwt = jwt.with_issuer(issuer.clone());
    }
    let auth: AuthState = Arc::new(JwtSessionValidator::new(&jwt));

    let room_manager = Arc::new(RoomManager::with_default_capacity());

    let promotion_state = PromotionAppState {
        users,
        gigs: gigs.clone(),
        promotions: promotions.clone(),
        payment_provider: Arc::new(StripePaymentAdapter::new(stripe)),
        vat_rates: Arc::new(vat_rates),
        notifications,
        realtime: room_manager.clone(),
        pricing: PricingPolicy::new(config.pricing.platform_fee()?),
        currency: config.payment.currency_code(),
        links: NotificationLinks {
            seller: config.promotion.seller_notification_link.clone(),
            admin: config.promotion.admin_notification_link.clone(),
        },
    };

    let sweep = spawn_expiry_sweep(
        ExpirePromotionsHandler::new(promotions, gigs),
        config.promotion.expiry_sweep_interval(),
    );

    let app = build_router(
        promotion_state,
        WebSocketState::new(room_manager),
        auth,
        &RouterConfig {
            request_timeout: config.server.request_timeout(),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweep.abort();
    let _ = sweep.await;
    pool.close().await;

    served?;
    tracing::info!("Shut down cleanly");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_level))
        .map_err(|e| StartupError::Telemetry(e.to_string()))?;

    let fmt_layer = match config.server.effective_log_format() {
        LogFormat::Json => fmt::layer().json().with_current_span(true).with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| StartupError::Telemetry(e.to_string()))
}

/// Flips lapsed `active` purchases to `expired` and clears their badges.
fn spawn_expiry_sweep(
    handler: ExpirePromotionsHandler,
    every: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = handler.handle(Timestamp::now()).await {
                tracing::warn!(error = %e, "Promotion expiry sweep failed");
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
