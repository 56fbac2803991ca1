//! Server state
//!
//! [`ServerState`] holds the shared service handles: configuration, the
//! database pool, the payment gateway and the pricing tables. It clones
//! cheaply (Arc/pool handles) and is the axum router state.

use std::sync::Arc;

use crate::core::Config;
use crate::db::DbService;
use crate::payments::gateway::{MockGateway, PaymentGateway, StripeGateway};
use crate::pricing::PricingConfig;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct ServerState {
    /// Server configuration (immutable)
    pub config: Config,
    /// SQLite connection pool
    pub db: SqlitePool,
    /// Payment gateway collaborator
    pub gateway: Arc<dyn PaymentGateway>,
    /// Pricing tables for the customization calculator
    pub pricing: Arc<PricingConfig>,
}

impl ServerState {
    /// Assemble a state from parts (tests use this with a mock gateway)
    pub fn new(config: Config, db: SqlitePool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            config,
            db,
            gateway,
            pricing: Arc::new(PricingConfig::default()),
        }
    }

    /// Initialize the full state: working directory, database, gateway.
    ///
    /// Picks the live Stripe gateway when a secret key is configured and
    /// the in-process mock otherwise.
    pub async fn initialize(config: &Config) -> Result<Self, shared::AppError> {
        config
            .ensure_work_dir()
            .map_err(|e| shared::AppError::internal(format!("work dir: {e}")))?;

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?;

        let gateway: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
            Some(key) => Arc::new(StripeGateway::new(key.clone())),
            None => {
                tracing::warn!("STRIPE_SECRET_KEY not set, using the in-process mock gateway");
                Arc::new(MockGateway::new())
            }
        };

        Ok(Self::new(config.clone(), db.pool, gateway))
    }
}
