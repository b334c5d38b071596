//! One-shot copy of legacy `promotions` rows into `promotion_purchases`.
//!
//! Safe to re-run: rows already carried over are skipped by the source
//! query, and the legacy id is unique on the target table.
//!
//! ```text
//! NORETMY__DATABASE__URL=postgres://... backfill-legacy-promotions
//! ```

use std::process;
use std::sync::Arc;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use noretmy::adapters::postgres::{
    self, PostgresLegacyPromotionSource, PostgresPromotionRepository,
};
use noretmy::application::handlers::promotion::BackfillLegacyPromotionsHandler;
use noretmy::config::{load_sections, DatabaseConfig, PromotionConfig};

#[derive(Debug, Deserialize)]
struct BackfillConfig {
    database: DatabaseConfig,
    #[serde(default)]
    promotion: PromotionConfig,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .compact()
        .init();

    if let Err(message) = run().await {
        tracing::error!(error = %message, "Backfill failed");
        process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config: BackfillConfig =
        load_sections().map_err(|e| format!("failed to load configuration: {e}"))?;
    config
        .database
        .validate()
        .map_err(|e| format!("invalid database configuration: {e}"))?;
    config
        .promotion
        .validate()
        .map_err(|e| format!("invalid promotion configuration: {e}"))?;

    let pool = postgres::connect(&config.database)
        .await
        .map_err(|e| format!("database connection failed: {e}"))?;
    if config.database.run_migrations {
        postgres::run_migrations(&pool)
            .await
            .map_err(|e| format!("database migration failed: {e}"))?;
    }

    let handler = BackfillLegacyPromotionsHandler::new(
        Arc::new(PostgresLegacyPromotionSource::new(pool.clone())),
        Arc::new(PostgresPromotionRepository::new(pool.clone())),
        config.promotion.backfill_batch_size,
    );

    let result = handler.handle().await.map_err(|e| e.to_string())?;
    pool.close().await;

    println!(
        "migrated {} legacy promotion(s), skipped {}",
        result.migrated, result.skipped
    );
    Ok(())
}
