//! Verdant API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::HeaderValue;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use verdant_api::config::Config;
use verdant_api::error::AppError;
use verdant_api::state::{AppState, Services, Settings};
use verdant_api::{router, telemetry};
use verdant_core::clock::SystemClock;
use verdant_core::rng::{DeterministicRng, SystemRng};
use verdant_notifications::{LogMailer, Mailer, ResendMailer};
use verdant_payments::StripeClient;
use verdant_store::{MIGRATOR, PgStore};

fn cors_layer(origins: &[String]) -> Result<CorsLayer, AppError> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim())
                .map_err(|e| AppError::Config(format!("invalid CORS origin {origin:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A missing .env file is fine; the environment may be set directly.
    dotenvy::dotenv().ok();
    let config = Config::parse();
    let tracer_provider = telemetry::init(&config)?;

    tracing::info!("Starting Verdant API server");

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await.map_err(sqlx::Error::from)?;
    let store = Arc::new(PgStore::new(pool));

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .map_err(|e| AppError::Config(format!("HTTP client: {e}")))?;
    let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(
            http.clone(),
            key.clone(),
            config.email_from.clone(),
        )),
        None => {
            tracing::warn!("RESEND_API_KEY not set, emails will be logged and dropped");
            Arc::new(LogMailer)
        }
    };
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SystemRng::new()));

    // Build application state.
    let services = Services {
        clock: Arc::new(SystemClock),
        rng,
        mailer,
        gateway: Arc::new(StripeClient::new(http, config.stripe_secret_key.clone())),
    };
    let settings = Settings {
        base_url: config.base_url().to_owned(),
        webhook_secret: config.stripe_webhook_secret.clone(),
        jwt_secret: config.jwt_secret.clone(),
        learning: config.learning_settings(),
    };
    let app = router(AppState::new(store, services, settings))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origins)?);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    if let Some(provider) = tracer_provider {
        provider
            .shutdown()
            .map_err(|e| AppError::Telemetry(e.to_string()))?;
    }

    Ok(())
}
