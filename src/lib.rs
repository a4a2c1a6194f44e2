//! cheqd-sender - transaction submission subsystem for the cheqd ledger
//!
//! The write path of a DID/credential SDK: upstream modules hand this crate
//! already-encoded `(type_url, payload)` pairs and it gets them on chain.
//!
//! - [`chain`]: session traits for the external chain surface and an
//!   endpoint connector with ordered failover
//! - [`tx`]: gas heuristics, fee building and the broadcast retry loop
//! - [`pool`]: a load-balanced pool of independently funded sender accounts
//! - [`orchestrator`]: the façade upstream callers hold
//!
//! Transactions submitted through different senders are unordered with
//! respect to each other; each sender serializes its own broadcasts because
//! chain accounts require strictly increasing sequence numbers.

pub mod chain;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod tx;
pub mod types;

pub use chain::{ChainSession, EndpointConnector, SessionFactory, Wallet, WalletFactory};
pub use config::{ConnectionConfig, PoolConfig};
pub use error::{SenderError, SenderResult};
pub use orchestrator::CheqdLedger;
pub use pool::SenderPool;
pub use tx::{Broadcaster, SignAndSendOptions};
pub use types::{AnyMsg, Coin, Network, Payment, TxResponse};
