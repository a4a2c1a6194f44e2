//! Ledger façade - single broadcaster or sender pool behind one surface
//!
//! Upstream DID/resource/status-list modules hold a `CheqdLedger` and never
//! need to know whether writes go through one account or a funded pool.

use crate::error::SenderResult;
use crate::pool::SenderPool;
use crate::tx::{Broadcaster, SignAndSendOptions};
use crate::types::{AnyMsg, TxResponse};

use std::sync::Arc;

enum Backend {
    Single(Arc<Broadcaster>),
    Pool(Arc<SenderPool>),
}

/// Write-path entry point for the SDK
pub struct CheqdLedger {
    backend: Backend,
}

impl CheqdLedger {
    /// All writes go through one account
    pub fn single(broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            backend: Backend::Single(broadcaster),
        }
    }

    /// Writes are load-balanced across the pool's senders
    pub fn pooled(pool: Arc<SenderPool>) -> Self {
        Self {
            backend: Backend::Pool(pool),
        }
    }

    fn root(&self) -> &Arc<Broadcaster> {
        match &self.backend {
            Backend::Single(b) => b,
            Backend::Pool(p) => p.root(),
        }
    }

    pub async fn sign_and_send(
        &self,
        msgs: &[AnyMsg],
        opts: SignAndSendOptions,
    ) -> SenderResult<TxResponse> {
        match &self.backend {
            Backend::Single(b) => b.sign_and_send(msgs, opts).await,
            Backend::Pool(p) => p.sign_and_send(msgs, opts).await,
        }
    }

    /// Root signing address
    pub async fn address(&self) -> String {
        self.root().address().await
    }

    pub async fn balance_of(&self, address: Option<&str>) -> SenderResult<u128> {
        self.root().balance_of(address).await
    }

    pub async fn height(&self) -> SenderResult<u64> {
        self.root().height().await
    }

    pub async fn tx_result(&self, hash: &str) -> SenderResult<Option<TxResponse>> {
        self.root().tx_result(hash).await
    }

    pub async fn estimate_gas(
        &self,
        msgs: &[AnyMsg],
        from: Option<&str>,
        memo: &str,
    ) -> SenderResult<u64> {
        self.root().estimate_gas(msgs, from, memo).await
    }

    /// Submit a native-token transfer from the root account
    pub async fn transfer(&self, to: &str, amount: u128) -> SenderResult<TxResponse> {
        let from = self.root().address().await;
        let msg = self.root().encode_transfer(&from, to, amount).await?;
        self.sign_and_send(&[msg], SignAndSendOptions::default())
            .await
    }

    /// Tear down the active backend: a pool reclaims its senders first,
    /// then the root connection is released.
    pub async fn disconnect(&self) -> SenderResult<()> {
        if let Backend::Pool(p) = &self.backend {
            if p.is_initialized().await {
                p.shutdown().await?;
            }
        }
        self.root().disconnect().await;
        Ok(())
    }
}
