// src/main.rs
use actix_web::{
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use actix_web::http::header;
use actix_cors::Cors;
use anyhow::Context;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod flow;
mod flow_handlers;
mod handlers;
mod inventory;
mod inventory_handlers;
mod models;
mod monitoring;
pub mod repositories;
#[cfg(test)]
mod test_support;
pub mod validator;

use config::{load_config, Config};
use error::ApiResult;
use flow::StopwatchHandle;
use models::InventoryState;
use repositories::{InventoryStore, ReadingStore, SqliteInventoryStore, SqliteReadingStore};

pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    /// Single owner of the inventory; every mutation goes through the write lock.
    pub inventory: RwLock<InventoryState>,
    pub inventory_store: Arc<dyn InventoryStore>,
    pub reading_store: Arc<dyn ReadingStore>,
    pub stopwatch: StopwatchHandle,
    pub started_at: Instant,
}

impl AppState {
    /// Wires the SQLite stores and loads the saved inventory once.
    pub async fn build(config: Config, pool: SqlitePool) -> ApiResult<Self> {
        let inventory_store: Arc<dyn InventoryStore> = Arc::new(SqliteInventoryStore::new(
            pool.clone(),
            config.inventory.storage_key.clone(),
        ));
        let reading_store: Arc<dyn ReadingStore> = Arc::new(SqliteReadingStore::new(pool.clone()));

        let inventory = inventory_store.load().await?;
        let stopwatch = StopwatchHandle::new(config.flow.tick_interval());

        Ok(Self {
            db_pool: pool,
            config,
            inventory: RwLock::new(inventory),
            inventory_store,
            reading_store,
            stopwatch,
            started_at: Instant::now(),
        })
    }
}

/// Health probes plus the versioned inventory and flow APIs.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::query_config())
        .service(
            web::scope("/health")
                .route("", web::get().to(monitoring::health_check))
                .route("/ready", web::get().to(monitoring::readiness_check))
        )
        .service(
            web::scope("/api/v1")
                // Chemical inventory
                .service(
                    web::scope("/inventory")
                        .route("/chemicals", web::get().to(inventory_handlers::get_chemicals))
                        .route("/chemicals", web::post().to(inventory_handlers::add_chemical))
                        .route("/chemicals/{id}", web::get().to(inventory_handlers::get_chemical))
                        .route("/alerts", web::get().to(inventory_handlers::get_alerts))
                        .route("/usage", web::get().to(inventory_handlers::get_usage_history))
                        .route("/usage", web::post().to(inventory_handlers::record_usage))
                        .route("/export", web::get().to(inventory_handlers::export_inventory))
                        .route("/report", web::get().to(inventory_handlers::print_report))
                )

                // Flow-rate calculator
                .service(
                    web::scope("/flow")
                        .route("/compute", web::post().to(flow_handlers::compute))
                        .route("/stopwatch", web::get().to(flow_handlers::get_stopwatch))
                        .route("/stopwatch/start", web::post().to(flow_handlers::start_stopwatch))
                        .route("/stopwatch/stop", web::post().to(flow_handlers::stop_stopwatch))
                        .route("/stopwatch/reset", web::post().to(flow_handlers::reset_stopwatch))
                        .route("/readings", web::get().to(flow_handlers::get_readings))
                        .route("/readings", web::post().to(flow_handlers::create_reading))
                        .route("/readings", web::delete().to(flow_handlers::clear_readings))
                        .route("/readings/{id}", web::delete().to(flow_handlers::delete_reading))
                        .route("/summary", web::get().to(flow_handlers::get_summary))
                        .route("/reports", web::get().to(flow_handlers::get_reports))
                        .route("/reports", web::post().to(flow_handlers::submit_report))
                )
        );
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    setup_logging(&config)?;
    config.print_startup_info();

    setup_database(&config.database.url).await?;
    let pool = create_database_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let app_state = Arc::new(
        AppState::build(config.clone(), pool)
            .await
            .context("Failed to load inventory")?,
    );

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let server_config = config.clone();
    let mut server = HttpServer::new(move || {
        let cors = setup_cors(&server_config.security.allowed_origins);

        App::new()
            .wrap(cors)
            .wrap(setup_security_headers())
            .wrap(Logger::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(handlers::json_config(server_config.security.max_request_size))
            .configure(configure_api)
    })
        .keep_alive(Duration::from_secs(config.server.keep_alive))
        .client_request_timeout(Duration::from_secs(config.server.client_timeout));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)?
        .run()
        .await
        .context("Server failed to run")?;

    Ok(())
}

// ==================== HELPER FUNCTIONS ====================

pub fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::USER_AGENT,
            header::REFERER,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH, header::CONTENT_DISPOSITION])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        log::warn!("Using wildcard CORS (*)");
        cors = cors.allow_any_origin().allow_any_header().allow_any_method();
    } else {
        for origin in allowed_origins.iter().filter(|o| !o.is_empty()) {
            log::debug!("Adding CORS origin: {}", origin);
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = config.logging.level.as_str();
            tracing_subscriber::EnvFilter::new(level)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}

async fn setup_database(database_url: &str) -> anyhow::Result<()> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        log::info!("Creating database: {}", database_url);
        Sqlite::create_database(database_url).await?;
    }
    Ok(())
}

async fn create_database_pool(db_config: &config::DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&db_config.url)
        .with_context(|| format!("Invalid database url: {}", db_config.url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .connect_with(options)
        .await?;
    Ok(pool)
}

fn setup_security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
}
