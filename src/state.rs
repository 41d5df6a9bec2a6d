use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::OrmConn,
    identity::{IdentityVerifier, JwtIdentityVerifier},
    notify::OrderHub,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub hub: Arc<OrderHub>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build the shared state with the JWT identity verifier and a fresh hub.
    pub fn new(orm: OrmConn, config: AppConfig) -> anyhow::Result<Self> {
        let identity = Arc::new(JwtIdentityVerifier::new(&config.identity));
        Self::with_identity(orm, config, identity)
    }

    pub fn with_identity(
        orm: OrmConn,
        config: AppConfig,
        identity: Arc<dyn IdentityVerifier>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.payment_http_timeout)
            .build()?;
        let hub = Arc::new(OrderHub::new(config.notify_queue_capacity));

        Ok(Self {
            orm,
            config: Arc::new(config),
            hub,
            identity,
            http,
        })
    }
}
