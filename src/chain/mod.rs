//! Chain module - session traits and endpoint failover
//!
//! The chain itself is an external collaborator: this module defines the
//! trait surface the submission subsystem calls through (height, balance,
//! simulate, broadcast) and the connector that binds a session to the first
//! live endpoint from an ordered list.

pub mod connector;

pub use connector::EndpointConnector;

use crate::error::SenderResult;
use crate::types::{AnyMsg, Coin, Network, Payment, TxResponse};

use async_trait::async_trait;
use std::sync::Arc;

/// Opaque wallet credential.
///
/// Key material and signing live behind the session; the subsystem only
/// needs the account addresses the wallet can sign for.
pub trait Wallet: Send + Sync {
    /// Addresses this wallet controls; the first one is the signing address
    fn accounts(&self) -> Vec<String>;
}

/// Produces fresh wallets for pool senders when none are supplied
pub trait WalletFactory: Send + Sync {
    fn generate(&self) -> SenderResult<Arc<dyn Wallet>>;
}

/// One live connection to a chain endpoint, bound to a wallet.
///
/// Implementations wrap the actual RPC client and proto codec. Errors they
/// surface are classified by the broadcaster, so raw chain/transport
/// messages should be preserved in the error text.
#[async_trait]
pub trait ChainSession: Send + Sync {
    /// Signing address of the bound wallet
    fn address(&self) -> String;

    /// Current chain height; used as the liveness probe
    async fn height(&self) -> SenderResult<u64>;

    /// Spendable balance of `address` in `denom`
    async fn balance_of(&self, address: &str, denom: &str) -> SenderResult<u128>;

    /// Simulate the transaction and return the gas it consumed
    async fn simulate(&self, signer: &str, msgs: &[AnyMsg], memo: &str) -> SenderResult<u64>;

    /// Sign the batch and broadcast it, waiting for inclusion.
    ///
    /// A rejected transaction may come back either as an `Err` or as a
    /// `TxResponse` with a non-zero code; callers must handle both.
    async fn sign_and_broadcast(
        &self,
        signer: &str,
        msgs: &[AnyMsg],
        payment: &Payment,
        memo: &str,
    ) -> SenderResult<TxResponse>;

    /// Look up a previously broadcast transaction by hash
    async fn tx_result(&self, hash: &str) -> SenderResult<Option<TxResponse>>;

    /// Encode a native-token transfer message (`MsgSend`)
    fn encode_transfer(&self, from: &str, to: &str, amount: &[Coin]) -> SenderResult<AnyMsg>;

    /// Release the underlying connection
    async fn disconnect(&self);
}

/// Builds sessions for candidate endpoints; the connector probes the result
/// before accepting it.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn build(
        &self,
        url: &str,
        wallet: Arc<dyn Wallet>,
        network: Network,
    ) -> SenderResult<Arc<dyn ChainSession>>;
}

#[cfg(test)]
pub(crate) mod testing;
