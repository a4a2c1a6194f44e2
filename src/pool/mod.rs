//! Sender pool - load-balanced submission across funded accounts
//!
//! Owns N independently funded broadcasters and exposes the same
//! `sign_and_send` contract as a single one. Free senders live in a bounded
//! channel of capacity N: acquiring is a blocking receive, releasing is a
//! send, so admission and the free list cannot diverge.

use crate::chain::{SessionFactory, Wallet, WalletFactory};
use crate::config::{
    PoolConfig, BROADCAST_RETRY_DELAY, FIXED_TRANSFER_FEE, POOL_TOPUP_MAX_ATTEMPTS,
    TOPUP_CONFIRM_ATTEMPTS, TRANSFER_GAS,
};
use crate::error::{SenderError, SenderResult};
use crate::tx::{Broadcaster, SignAndSendOptions};
use crate::types::{AnyMsg, Coin, Payment, TxResponse};

use futures::future::try_join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// One funded account and its dedicated broadcaster
struct Sender {
    address: String,
    broadcaster: Arc<Broadcaster>,
}

struct PoolInner {
    count: usize,
    amount_per_sender: u128,
    free_tx: mpsc::Sender<Sender>,
    free_rx: Arc<Mutex<mpsc::Receiver<Sender>>>,
}

/// A sender checked out of the free list. The return happens in `Drop`,
/// so the pool keeps its full complement even when the borrowing future
/// is cancelled mid-broadcast.
struct BorrowedSender {
    sender: Option<Sender>,
    free_tx: mpsc::Sender<Sender>,
}

impl BorrowedSender {
    fn sender(&self) -> &Sender {
        // present from construction until drop
        self.sender.as_ref().expect("sender already returned")
    }
}

impl Drop for BorrowedSender {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            // capacity equals the sender count and this one is checked
            // out, so the channel always has room
            if self.free_tx.try_send(sender).is_err() {
                warn!("Free list closed while returning a sender");
            }
        }
    }
}

/// Load-balancing pool of funded sender accounts
pub struct SenderPool {
    root: Arc<Broadcaster>,
    session_factory: Arc<dyn SessionFactory>,
    wallet_factory: Arc<dyn WalletFactory>,
    inner: RwLock<Option<PoolInner>>,
    shutting_down: AtomicBool,
}

impl SenderPool {
    pub fn new(
        root: Arc<Broadcaster>,
        session_factory: Arc<dyn SessionFactory>,
        wallet_factory: Arc<dyn WalletFactory>,
    ) -> Self {
        Self {
            root,
            session_factory,
            wallet_factory,
            inner: RwLock::new(None),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Root broadcaster the pool funds its senders from
    pub fn root(&self) -> &Arc<Broadcaster> {
        &self.root
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Bring up `count` senders bound to the root's network/endpoints and
    /// fund them all with one batched transfer from the root account.
    pub async fn init(
        &self,
        config: PoolConfig,
        sender_wallets: Option<Vec<Arc<dyn Wallet>>>,
    ) -> SenderResult<()> {
        config.validate()?;
        if self.inner.read().await.is_some() {
            return Err(SenderError::Pool("pool is already initialized".to_string()));
        }

        let wallets = match sender_wallets {
            Some(wallets) => {
                if wallets.len() != config.count {
                    return Err(SenderError::Config(format!(
                        "expected {} sender wallets, got {}",
                        config.count,
                        wallets.len()
                    )));
                }
                wallets
            }
            None => (0..config.count)
                .map(|_| self.wallet_factory.generate())
                .collect::<SenderResult<Vec<_>>>()?,
        };

        let connection = self.root.connection_config().clone();
        let members = try_join_all(wallets.into_iter().map(|wallet| {
            let connection = connection.clone();
            let factory = self.session_factory.clone();
            async move {
                let broadcaster = Broadcaster::connect(connection, wallet, factory).await?;
                let address = broadcaster.address().await;
                Ok::<_, SenderError>(Sender {
                    address,
                    broadcaster: Arc::new(broadcaster),
                })
            }
        }))
        .await?;

        let root_address = self.root.address().await;
        let mut msgs = Vec::with_capacity(members.len());
        for member in &members {
            msgs.push(
                self.root
                    .encode_transfer(&root_address, &member.address, config.amount_per_sender)
                    .await?,
            );
        }
        let receipt = self
            .root
            .sign_and_send(&msgs, SignAndSendOptions::default())
            .await?;
        info!(
            "Funded {} senders with {} each (tx {})",
            members.len(),
            config.amount_per_sender,
            receipt.tx_hash
        );

        let (free_tx, free_rx) = mpsc::channel(config.count);
        for member in members {
            free_tx
                .send(member)
                .await
                .map_err(|_| SenderError::Pool("free list closed during init".to_string()))?;
        }

        *self.inner.write().await = Some(PoolInner {
            count: config.count,
            amount_per_sender: config.amount_per_sender,
            free_tx,
            free_rx: Arc::new(Mutex::new(free_rx)),
        });
        Ok(())
    }

    /// Borrow a free sender (blocking while all are in flight), submit
    /// through it, and return it to the pool whatever the outcome.
    pub async fn sign_and_send(
        &self,
        msgs: &[AnyMsg],
        opts: SignAndSendOptions,
    ) -> SenderResult<TxResponse> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(SenderError::Pool("pool is shutting down".to_string()));
        }

        let (free_tx, free_rx, amount_per_sender) = {
            let guard = self.inner.read().await;
            let inner = guard
                .as_ref()
                .ok_or_else(|| SenderError::Pool("pool is not initialized".to_string()))?;
            (
                inner.free_tx.clone(),
                inner.free_rx.clone(),
                inner.amount_per_sender,
            )
        };

        let sender = {
            let mut rx = free_rx.lock().await;
            rx.recv()
                .await
                .ok_or_else(|| SenderError::Pool("pool is shutting down".to_string()))?
        };
        let borrowed = BorrowedSender {
            sender: Some(sender),
            free_tx,
        };

        // shutdown may have started while we were queued; dropping the
        // borrow hands the sender straight back so it can be reclaimed
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(SenderError::Pool("pool is shutting down".to_string()));
        }

        self.submit_with_topup(borrowed.sender(), msgs, &opts, amount_per_sender)
            .await
    }

    /// Run the member broadcaster, topping the account up from the root on
    /// balance failures.
    async fn submit_with_topup(
        &self,
        sender: &Sender,
        msgs: &[AnyMsg],
        opts: &SignAndSendOptions,
        amount_per_sender: u128,
    ) -> SenderResult<TxResponse> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match sender.broadcaster.sign_and_send(msgs, opts.clone()).await {
                Ok(resp) => return Ok(resp),
                Err(SenderError::Balance(msg)) if attempt < POOL_TOPUP_MAX_ATTEMPTS => {
                    warn!(
                        "Sender {} under-funded on attempt {}: {}",
                        sender.address, attempt, msg
                    );
                    self.top_up(sender, amount_per_sender).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Transfer `amount` from the root account into the sender, then wait
    /// until the credit is observable before letting the caller retry.
    async fn top_up(&self, sender: &Sender, amount: u128) -> SenderResult<()> {
        let before = sender.broadcaster.balance_of(None).await?;
        let root_address = self.root.address().await;
        let msg = self
            .root
            .encode_transfer(&root_address, &sender.address, amount)
            .await?;
        self.root
            .sign_and_send(&[msg], SignAndSendOptions::default())
            .await?;

        for _ in 0..TOPUP_CONFIRM_ATTEMPTS {
            if sender.broadcaster.balance_of(None).await? > before {
                return Ok(());
            }
            sleep(BROADCAST_RETRY_DELAY).await;
        }
        Err(SenderError::Balance(format!(
            "top-up of {} to {} not yet visible",
            amount, sender.address
        )))
    }

    /// Reclaim every sender's remaining balance into the root account and
    /// tear the pool down. Per-sender failures are logged, not propagated,
    /// so one broken sender cannot block the rest.
    pub async fn shutdown(&self) -> SenderResult<Vec<TxResponse>> {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return Err(SenderError::Pool("shutdown already in progress".to_string()));
        }

        let (count, free_rx) = {
            let guard = self.inner.read().await;
            match guard.as_ref() {
                Some(inner) => (inner.count, inner.free_rx.clone()),
                None => {
                    self.shutting_down.store(false, Ordering::SeqCst);
                    return Err(SenderError::Pool("pool is not initialized".to_string()));
                }
            }
        };

        let root_address = self.root.address().await;
        let mut receipts = Vec::new();

        // each in-flight sender arrives here once its borrower returns it
        for _ in 0..count {
            let sender = {
                let mut rx = free_rx.lock().await;
                rx.recv().await
            };
            let Some(sender) = sender else { break };

            match self.reclaim(&sender, &root_address).await {
                Ok(Some(receipt)) => receipts.push(receipt),
                Ok(None) => debug!("Sender {} had nothing to reclaim", sender.address),
                Err(e) => warn!(
                    "Failed to reclaim funds from sender {}: {}",
                    sender.address, e
                ),
            }
            sender.broadcaster.disconnect().await;
        }

        *self.inner.write().await = None;
        self.shutting_down.store(false, Ordering::SeqCst);
        Ok(receipts)
    }

    /// Sweep `balance - fixed fee` back to the root account with an
    /// explicit fixed-fee payment so the swept amount is deterministic.
    async fn reclaim(&self, sender: &Sender, root_address: &str) -> SenderResult<Option<TxResponse>> {
        let balance = sender.broadcaster.balance_of(None).await?;
        if balance <= FIXED_TRANSFER_FEE {
            return Ok(None);
        }

        let refund = balance - FIXED_TRANSFER_FEE;
        let msg = sender
            .broadcaster
            .encode_transfer(&sender.address, root_address, refund)
            .await?;
        let payment = Payment {
            amount: vec![Coin::new(self.root.network().denom(), FIXED_TRANSFER_FEE)],
            gas: TRANSFER_GAS,
            payer: sender.address.clone(),
        };
        let receipt = sender
            .broadcaster
            .sign_and_send(
                &[msg],
                SignAndSendOptions {
                    payment: Some(payment),
                    ..Default::default()
                },
            )
            .await?;
        Ok(Some(receipt))
    }
}
