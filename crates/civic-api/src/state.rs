//! # Application State
//!
//! Configuration read from the environment and the shared state handed
//! to every route handler: the issue store, the classifier, metrics, and
//! (when connected) the Postgres pool.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use civic_classifier::{ClassifierConfig, IssueClassifier, StaticClassifier};
use civic_state::TransitionPolicy;

use crate::middleware::metrics::ApiMetrics;
use crate::store::{IssueStore, MemoryStore};

/// Default radius for `GET /issue/nearby` when the query omits one.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Largest radius a nearby query may ask for.
pub const MAX_RADIUS_KM: f64 = 100.0;

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared secret carried in bearer tokens. `None` disables the secret
    /// check (development mode); the user id is still required.
    pub auth_token: Option<String>,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Whether transitions check the predecessor status.
    pub transition_policy: TransitionPolicy,
    /// Radius used when a nearby query gives none.
    pub default_radius_km: f64,
    /// Classifier endpoints. `None` selects the static fallback classifier.
    pub classifier: Option<ClassifierConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("transition_policy", &self.transition_policy)
            .field("default_radius_km", &self.default_radius_km)
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            database_url: None,
            transition_policy: TransitionPolicy::Strict,
            default_radius_km: DEFAULT_RADIUS_KM,
            classifier: None,
        }
    }
}

/// Invalid configuration values. Startup aborts on any of these.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),

    #[error("TRANSITION_POLICY must be \"strict\" or \"permissive\", got {0:?}")]
    InvalidPolicy(String),

    #[error("DEFAULT_RADIUS_KM must be > 0 and <= {MAX_RADIUS_KM}, got {0:?}")]
    InvalidRadius(String),

    #[error(transparent)]
    Classifier(#[from] civic_classifier::ConfigError),
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let transition_policy = match lookup("TRANSITION_POLICY") {
            Some(raw) => raw
                .parse::<TransitionPolicy>()
                .map_err(|_| ConfigError::InvalidPolicy(raw))?,
            None => defaults.transition_policy,
        };

        let default_radius_km = match lookup("DEFAULT_RADIUS_KM") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(r) if r > 0.0 && r <= MAX_RADIUS_KM => r,
                _ => return Err(ConfigError::InvalidRadius(raw)),
            },
            None => defaults.default_radius_km,
        };

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port,
            auth_token: non_empty("AUTH_TOKEN"),
            database_url: non_empty("DATABASE_URL"),
            transition_policy,
            default_radius_km,
            classifier: ClassifierConfig::from_lookup(&lookup)?,
        })
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IssueStore>,
    pub classifier: Arc<dyn IssueClassifier>,
    pub metrics: ApiMetrics,
    pub config: AppConfig,
    /// Present when the store is Postgres; checked by the readiness check.
    pub db_pool: Option<PgPool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("db_pool", &self.db_pool.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// In-memory store, static classifier, default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// In-memory store and static classifier with the given configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            classifier: Arc::new(StaticClassifier::default()),
            metrics: ApiMetrics::new(),
            config,
            db_pool: None,
        }
    }

    /// Replace the issue store.
    pub fn with_store(mut self, store: Arc<dyn IssueStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn IssueClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Record the Postgres pool backing the store.
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
