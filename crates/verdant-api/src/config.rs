//! Server configuration, read from flags or the environment.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use verdant_learning::application::LearningSettings;
use verdant_learning::domain::validation::QualityThresholds;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Verdant API server configuration. Every option can also be given as an
/// environment variable; a `.env` file is honored when present.
#[derive(Debug, Clone, Parser)]
#[command(name = "verdant-api", version, about = "Verdant sustainability training API")]
pub struct Config {
    /// `PostgreSQL` connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum pooled database connections.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub db_max_connections: u32,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// HS256 secret used to verify Supabase access tokens.
    #[arg(long, env = "SUPABASE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Stripe API key used to create checkout sessions.
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: String,

    /// Secret used to verify Stripe webhook signatures.
    #[arg(long, env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    pub stripe_webhook_secret: String,

    /// Resend API key; emails are logged and dropped when absent.
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    /// Sender of transactional email.
    #[arg(long, env = "EMAIL_FROM", default_value = "Verdant <no-reply@verdant.app>")]
    pub email_from: String,

    /// Public base URL used in links and checkout redirects.
    #[arg(long, env = "APP_BASE_URL", default_value = "http://localhost:3000")]
    pub app_base_url: String,

    /// Mirror saved activities into the legacy `lesson_responses` table.
    #[arg(long, env = "LEGACY_DUAL_WRITE")]
    pub legacy_dual_write: bool,

    /// Minimum words in a free-text answer.
    #[arg(long, env = "MIN_WORD_COUNT", default_value_t = 30)]
    pub min_word_count: usize,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces are exported only when set.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    /// Timeout for outbound HTTP calls, in seconds.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 15)]
    pub http_timeout_secs: u64,

    /// Comma-separated CORS origins; any origin is allowed when empty.
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Learning settings derived from the configuration.
    #[must_use]
    pub fn learning_settings(&self) -> LearningSettings {
        LearningSettings {
            thresholds: QualityThresholds {
                min_words: self.min_word_count,
                ..QualityThresholds::default()
            },
            legacy_dual_write: self.legacy_dual_write,
        }
    }

    /// Timeout applied to the shared HTTP client.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.app_base_url.trim_end_matches('/')
    }
}
