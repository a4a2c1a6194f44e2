//! Endpoint connector with ordered failover
//!
//! Tries the configured RPC URLs strictly in order, probing each candidate
//! session with a height query before accepting it. Reconnects reuse the
//! exact list/wallet/network from init under an outer bounded retry.

use super::{ChainSession, SessionFactory, Wallet};
use crate::config::{ConnectionConfig, RECONNECT_RETRY_DELAY, RECONNECT_TIME_BUDGET};
use crate::error::{SenderError, SenderResult};

use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Binds one live session to the first healthy endpoint
pub struct EndpointConnector {
    config: ConnectionConfig,
    wallet: Arc<dyn Wallet>,
    factory: Arc<dyn SessionFactory>,
}

impl EndpointConnector {
    pub fn new(
        config: ConnectionConfig,
        wallet: Arc<dyn Wallet>,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            wallet,
            factory,
        }
    }

    /// Try endpoints in configured order and return the first session whose
    /// build and liveness probe both succeed.
    pub async fn connect(&self) -> SenderResult<Arc<dyn ChainSession>> {
        let network = self.config.network();
        let mut last = String::from("no endpoints attempted");

        for url in self.config.endpoints() {
            match self.factory.build(url, self.wallet.clone(), network).await {
                Ok(session) => match session.height().await {
                    Ok(height) => {
                        info!("Connected to {} at height {}", url, height);
                        return Ok(session);
                    }
                    Err(e) => {
                        warn!("Liveness probe failed for {}: {}", url, e);
                        last = e.to_string();
                    }
                },
                Err(e) => {
                    warn!("Failed to build session for {}: {}", url, e);
                    last = e.to_string();
                }
            }
        }

        Err(SenderError::Connection { last })
    }

    /// Re-run the failover algorithm against the stored configuration,
    /// absorbing transient startup failures with a fixed-delay retry under
    /// a total time budget.
    pub async fn reconnect(&self) -> SenderResult<Arc<dyn ChainSession>> {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.connect().await {
                Ok(session) => {
                    debug!("Reconnected on attempt {}", attempt);
                    return Ok(session);
                }
                Err(e) => {
                    if started.elapsed() + RECONNECT_RETRY_DELAY >= RECONNECT_TIME_BUDGET {
                        warn!("Reconnect budget exhausted after {} attempts", attempt);
                        return Err(e);
                    }
                    warn!("Reconnect attempt {} failed: {}", attempt, e);
                    sleep(RECONNECT_RETRY_DELAY).await;
                }
            }
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn wallet(&self) -> Arc<dyn Wallet> {
        self.wallet.clone()
    }
}
