//! Connection and pool configuration
//!
//! Values are supplied by the caller (the surrounding SDK); this subsystem
//! has no filesystem or environment dependencies.

use crate::error::{SenderError, SenderResult};
use crate::types::Network;

use serde::Deserialize;
use std::time::Duration;

/// Fixed delay between broadcast retry attempts
pub const BROADCAST_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Total time budget for one `sign_and_send` retry loop
pub const BROADCAST_TIME_BUDGET: Duration = Duration::from_secs(18);

/// Fixed delay between reconnect attempts
pub const RECONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Total time budget for a reconnect
pub const RECONNECT_TIME_BUDGET: Duration = Duration::from_secs(30);

/// Default gas price in ncheq per gas unit
pub const DEFAULT_GAS_PRICE: u128 = 50;

/// Fee safety multiplier applied on top of simulated gas: 13/10 = 1.3x
pub const FEE_SAFETY_NUMERATOR: u128 = 13;
pub const FEE_SAFETY_DENOMINATOR: u128 = 10;

/// Gas allowance for a plain token transfer
pub const TRANSFER_GAS: u128 = 200_000;

/// Fee charged for the fixed-payment transfers used when reclaiming sender
/// balances: TRANSFER_GAS x DEFAULT_GAS_PRICE x 1.3
pub const FIXED_TRANSFER_FEE: u128 =
    TRANSFER_GAS * DEFAULT_GAS_PRICE * FEE_SAFETY_NUMERATOR / FEE_SAFETY_DENOMINATOR;

/// Default funding per pool sender: 500 CHEQ in ncheq
pub const DEFAULT_AMOUNT_PER_SENDER: u128 = 500_000_000_000;

/// Maximum balance top-up attempts per pooled operation
pub const POOL_TOPUP_MAX_ATTEMPTS: u32 = 3;

/// Attempts spent re-querying a sender's balance after a top-up transfer
pub const TOPUP_CONFIRM_ATTEMPTS: u32 = 6;

/// Resolved connection parameters for one chain session.
///
/// Created at init and replaced wholesale on reconnect; the endpoint list
/// keeps its configured order so failover is deterministic.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    endpoints: Vec<String>,
    network: Network,
}

impl ConnectionConfig {
    /// Normalize and validate the endpoint list: trim, drop empties,
    /// deduplicate preserving first occurrence, require at least one URL.
    pub fn new(
        endpoints: impl IntoIterator<Item = String>,
        network: Network,
    ) -> SenderResult<Self> {
        let mut normalized: Vec<String> = Vec::new();
        for url in endpoints {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() || normalized.contains(&url) {
                continue;
            }
            normalized.push(url);
        }

        if normalized.is_empty() {
            return Err(SenderError::Config(
                "at least one RPC endpoint is required".to_string(),
            ));
        }

        Ok(Self {
            endpoints: normalized,
            network,
        })
    }

    /// Convenience constructor for a single endpoint
    pub fn single(url: impl Into<String>, network: Network) -> SenderResult<Self> {
        Self::new([url.into()], network)
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn network(&self) -> Network {
        self.network
    }
}

/// Sender pool sizing and funding
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub count: usize,
    pub amount_per_sender: u128,
}

impl PoolConfig {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            amount_per_sender: DEFAULT_AMOUNT_PER_SENDER,
        }
    }

    pub fn with_amount_per_sender(mut self, amount: u128) -> Self {
        self.amount_per_sender = amount;
        self
    }

    pub fn validate(&self) -> SenderResult<()> {
        if self.count == 0 {
            return Err(SenderError::Config(
                "sender pool count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
