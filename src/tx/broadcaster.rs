//! Transaction broadcaster with fee building and classified retry
//!
//! Wraps one live session. A single-slot mutex serializes broadcasts:
//! chain accounts require strictly increasing sequence numbers, so at most
//! one transaction per account may be in flight.

use super::classify::{classify_failure, FailureClass};
use crate::chain::{ChainSession, EndpointConnector, SessionFactory, Wallet};
use crate::config::{
    ConnectionConfig, BROADCAST_RETRY_DELAY, BROADCAST_TIME_BUDGET, DEFAULT_GAS_PRICE,
    FEE_SAFETY_DENOMINATOR, FEE_SAFETY_NUMERATOR,
};
use crate::error::{SenderError, SenderResult};
use crate::types::{AnyMsg, Coin, Network, Payment, TxResponse};

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Options for one `sign_and_send` call; all fields are optional
#[derive(Debug, Clone, Default)]
pub struct SignAndSendOptions {
    /// Signing address; defaults to the session's own address
    pub from: Option<String>,
    /// Transaction memo
    pub memo: String,
    /// Explicit gas allowance, skipping simulation
    pub gas: Option<u128>,
    /// Fully explicit fee envelope, skipping fee computation entirely
    pub payment: Option<Payment>,
}

/// Signs and broadcasts batches against one live session
pub struct Broadcaster {
    connector: EndpointConnector,
    session: RwLock<Arc<dyn ChainSession>>,
    gas_price: u128,
    // one in-flight broadcast per account sequence
    broadcast_slot: Mutex<()>,
}

impl Broadcaster {
    /// Connect to the first live endpoint and wrap the resulting session
    pub async fn connect(
        config: ConnectionConfig,
        wallet: Arc<dyn Wallet>,
        factory: Arc<dyn SessionFactory>,
    ) -> SenderResult<Self> {
        let connector = EndpointConnector::new(config, wallet, factory);
        let session = connector.connect().await?;

        Ok(Self {
            connector,
            session: RwLock::new(session),
            gas_price: DEFAULT_GAS_PRICE,
            broadcast_slot: Mutex::new(()),
        })
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn network(&self) -> Network {
        self.connector.config().network()
    }

    pub fn connection_config(&self) -> &ConnectionConfig {
        self.connector.config()
    }

    /// Signing address of the live session
    pub async fn address(&self) -> String {
        self.session.read().await.address()
    }

    /// Current chain height
    pub async fn height(&self) -> SenderResult<u64> {
        self.session.read().await.height().await
    }

    /// Balance of `address` (or of the session's own account) in the
    /// network's fee denom
    pub async fn balance_of(&self, address: Option<&str>) -> SenderResult<u128> {
        let session = self.session.read().await.clone();
        let address = match address {
            Some(a) => a.to_string(),
            None => session.address(),
        };
        session.balance_of(&address, self.network().denom()).await
    }

    /// Look up a broadcast transaction by hash
    pub async fn tx_result(&self, hash: &str) -> SenderResult<Option<TxResponse>> {
        self.session.read().await.tx_result(hash).await
    }

    /// Simulate the batch and return the gas it consumed
    pub async fn estimate_gas(
        &self,
        msgs: &[AnyMsg],
        from: Option<&str>,
        memo: &str,
    ) -> SenderResult<u64> {
        let session = self.session.read().await.clone();
        let from = match from {
            Some(f) => f.to_string(),
            None => session.address(),
        };
        session.simulate(&from, msgs, memo).await
    }

    /// Build the fee envelope for a gas allowance:
    /// amount = gas x gas_price x 1.3, in the network denom
    pub fn calculate_fee(&self, gas: u128, payer: &str) -> Payment {
        let amount = gas * self.gas_price * FEE_SAFETY_NUMERATOR / FEE_SAFETY_DENOMINATOR;
        Payment {
            amount: vec![Coin::new(self.network().denom(), amount)],
            gas,
            payer: payer.to_string(),
        }
    }

    /// Encode a native-token transfer through the session codec
    pub async fn encode_transfer(
        &self,
        from: &str,
        to: &str,
        amount: u128,
    ) -> SenderResult<AnyMsg> {
        let coin = Coin::new(self.network().denom(), amount);
        self.session
            .read()
            .await
            .encode_transfer(from, to, &[coin])
    }

    /// Rebind the session by re-running endpoint failover
    pub async fn reconnect(&self) -> SenderResult<()> {
        let session = self.connector.reconnect().await?;
        *self.session.write().await = session;
        Ok(())
    }

    /// Release the underlying connection
    pub async fn disconnect(&self) {
        self.session.read().await.disconnect().await;
    }

    /// Sign and broadcast a batch, retrying classified transient failures
    /// under a fixed delay and a total time budget.
    pub async fn sign_and_send(
        &self,
        msgs: &[AnyMsg],
        opts: SignAndSendOptions,
    ) -> SenderResult<TxResponse> {
        let _slot = self.broadcast_slot.lock().await;

        let from = match opts.from {
            Some(f) => f,
            None => self.session.read().await.address(),
        };

        let mut payment = match opts.payment {
            Some(p) => p,
            None => {
                let gas = match opts.gas {
                    Some(g) => g,
                    None => {
                        let session = self.session.read().await.clone();
                        session.simulate(&from, msgs, &opts.memo).await? as u128
                    }
                };
                self.calculate_fee(gas, &from)
            }
        };

        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let session = self.session.read().await.clone();
            let outcome = session
                .sign_and_broadcast(&from, msgs, &payment, &opts.memo)
                .await;

            let (raw, failure) = match outcome {
                Ok(resp) if resp.code == 0 => {
                    info!(
                        "Transaction {} included at height {} (attempt {})",
                        resp.tx_hash, resp.height, attempt
                    );
                    return Ok(resp);
                }
                Ok(resp) => {
                    let rendered = serde_json::to_string(&resp)
                        .unwrap_or_else(|_| resp.raw_log.clone());
                    (
                        resp.raw_log.clone(),
                        SenderError::Broadcast {
                            code: resp.code,
                            response: rendered,
                        },
                    )
                }
                Err(e) => (e.to_string(), e),
            };

            match classify_failure(&raw) {
                FailureClass::Transport => {
                    warn!("Transport failure on attempt {}: {}", attempt, raw);
                    self.reconnect().await?;
                }
                FailureClass::OutOfGas => {
                    payment.gas = self.raise_gas(payment.gas)?;
                    warn!(
                        "Out of gas on attempt {}, raising allowance to {}",
                        attempt, payment.gas
                    );
                }
                FailureClass::SequenceMismatch => {
                    debug!(
                        "Sequence mismatch on attempt {}, retrying unchanged",
                        attempt
                    );
                }
                FailureClass::InsufficientBalance => {
                    return Err(match failure {
                        e @ SenderError::Balance(_) => e,
                        other => SenderError::Balance(other.to_string()),
                    });
                }
                FailureClass::Fatal => return Err(failure),
            }

            if started.elapsed() + BROADCAST_RETRY_DELAY >= BROADCAST_TIME_BUDGET {
                return Err(SenderError::Timeout {
                    operation: "sign and broadcast".to_string(),
                });
            }
            sleep(BROADCAST_RETRY_DELAY).await;
        }
    }

    /// Double a gas allowance, failing once it would meet or exceed the
    /// per-block gas limit. A zero allowance cannot be raised.
    fn raise_gas(&self, gas: u128) -> SenderResult<u128> {
        let limit = self.network().max_block_gas();
        if gas == 0 {
            return Err(SenderError::GasExceeded { gas, limit });
        }
        let doubled = gas.saturating_mul(2);
        if doubled >= limit as u128 {
            return Err(SenderError::GasExceeded { gas: doubled, limit });
        }
        Ok(doubled)
    }
}
