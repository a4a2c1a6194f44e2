//! Instrumented in-memory chain for unit tests
//!
//! `MockChain` keeps a balance ledger, applies `MsgSend` payloads encoded
//! by its sessions, counts concurrent in-flight broadcasts and can be
//! scripted with per-attempt failures.

use super::{ChainSession, SessionFactory, Wallet, WalletFactory};
use crate::error::{SenderError, SenderResult};
use crate::types::{type_url, AnyMsg, Coin, Network, Payment, TxResponse};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Route log output through the test capture writer; idempotent
pub(crate) fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) struct MockWallet {
    address: String,
}

impl MockWallet {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }
}

impl Wallet for MockWallet {
    fn accounts(&self) -> Vec<String> {
        vec![self.address.clone()]
    }
}

pub(crate) struct MockWalletFactory {
    counter: AtomicUsize,
}

impl MockWalletFactory {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl WalletFactory for MockWalletFactory {
    fn generate(&self) -> SenderResult<Arc<dyn Wallet>> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockWallet::new(&format!("cheqd1sender{n}"))))
    }
}

/// Scripted outcome for one broadcast attempt
pub(crate) enum MockFailure {
    Err(SenderError),
    Resp(TxResponse),
}

/// Wire shape the mock sessions use for `MsgSend` payloads
#[derive(Serialize, Deserialize)]
struct TransferBody {
    from: String,
    to: String,
    denom: String,
    amount: u128,
}

pub(crate) struct MockChain {
    balances: Mutex<HashMap<String, u128>>,
    inflight: AtomicUsize,
    max_inflight: AtomicUsize,
    broadcasts: AtomicU64,
    broadcast_delay: Mutex<Duration>,
    failures: Mutex<VecDeque<MockFailure>>,
    payments: Mutex<Vec<Payment>>,
    sim_gas: AtomicU64,
    disconnects: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            balances: Mutex::new(HashMap::new()),
            inflight: AtomicUsize::new(0),
            max_inflight: AtomicUsize::new(0),
            broadcasts: AtomicU64::new(0),
            broadcast_delay: Mutex::new(Duration::ZERO),
            failures: Mutex::new(VecDeque::new()),
            payments: Mutex::new(Vec::new()),
            sim_gas: AtomicU64::new(140_000),
            disconnects: AtomicUsize::new(0),
        })
    }

    pub fn set_balance(&self, address: &str, amount: u128) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), amount);
    }

    pub fn balance(&self, address: &str) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn set_broadcast_delay(&self, delay: Duration) {
        *self.broadcast_delay.lock().unwrap() = delay;
    }

    pub fn push_failure(&self, failure: MockFailure) {
        self.failures.lock().unwrap().push_back(failure);
    }

    pub fn fail_with_code(&self, code: u32, raw_log: &str) {
        self.push_failure(MockFailure::Resp(TxResponse {
            code,
            raw_log: raw_log.to_string(),
            ..TxResponse::default()
        }));
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.payments.lock().unwrap().clone()
    }

    pub fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn debit(balances: &mut HashMap<String, u128>, address: &str, amount: u128) -> SenderResult<()> {
        let entry = balances.entry(address.to_string()).or_insert(0);
        if *entry < amount {
            return Err(SenderError::Balance(format!(
                "spendable balance {} of {} is smaller than {}",
                entry, address, amount
            )));
        }
        *entry -= amount;
        Ok(())
    }

    fn apply(&self, msgs: &[AnyMsg], payment: &Payment) -> SenderResult<()> {
        let mut balances = self.balances.lock().unwrap();

        let fee: u128 = payment.amount.iter().map(|c| c.amount).sum();
        Self::debit(&mut balances, &payment.payer, fee)?;

        for msg in msgs {
            if msg.type_url != type_url::MSG_SEND {
                continue;
            }
            let body: TransferBody = serde_json::from_slice(&msg.value)
                .map_err(|e| SenderError::Encoding(e.to_string()))?;
            Self::debit(&mut balances, &body.from, body.amount)?;
            *balances.entry(body.to).or_insert(0) += body.amount;
        }
        Ok(())
    }
}

pub(crate) struct MockSession {
    chain: Arc<MockChain>,
    address: String,
    probe_ok: bool,
}

#[async_trait]
impl ChainSession for MockSession {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn height(&self) -> SenderResult<u64> {
        if self.probe_ok {
            Ok(1042)
        } else {
            Err(SenderError::Transport("fetch failed".to_string()))
        }
    }

    async fn balance_of(&self, address: &str, _denom: &str) -> SenderResult<u128> {
        Ok(self.chain.balance(address))
    }

    async fn simulate(&self, _signer: &str, _msgs: &[AnyMsg], _memo: &str) -> SenderResult<u64> {
        Ok(self.chain.sim_gas.load(Ordering::SeqCst))
    }

    async fn sign_and_broadcast(
        &self,
        _signer: &str,
        msgs: &[AnyMsg],
        payment: &Payment,
        _memo: &str,
    ) -> SenderResult<TxResponse> {
        self.chain.payments.lock().unwrap().push(payment.clone());

        let current = self.chain.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.chain.max_inflight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.chain.broadcast_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.chain.inflight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.chain.failures.lock().unwrap().pop_front();
        if let Some(failure) = scripted {
            return match failure {
                MockFailure::Err(e) => Err(e),
                MockFailure::Resp(resp) => Ok(resp),
            };
        }

        self.chain.apply(msgs, payment)?;

        let seq = self.chain.broadcasts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TxResponse {
            code: 0,
            height: 100 + seq,
            tx_hash: format!("{seq:064X}"),
            raw_log: String::new(),
            gas_wanted: payment.gas as u64,
            gas_used: (payment.gas as u64) * 8 / 10,
        })
    }

    async fn tx_result(&self, _hash: &str) -> SenderResult<Option<TxResponse>> {
        Ok(None)
    }

    fn encode_transfer(&self, from: &str, to: &str, amount: &[Coin]) -> SenderResult<AnyMsg> {
        let coin = amount
            .first()
            .ok_or_else(|| SenderError::Encoding("transfer without coins".to_string()))?;
        let body = TransferBody {
            from: from.to_string(),
            to: to.to_string(),
            denom: coin.denom.clone(),
            amount: coin.amount,
        };
        let value = serde_json::to_vec(&body).map_err(|e| SenderError::Encoding(e.to_string()))?;
        Ok(AnyMsg::new(type_url::MSG_SEND, value))
    }

    async fn disconnect(&self) {
        self.chain.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct MockFactory {
    chain: Arc<MockChain>,
    builds: Mutex<Vec<String>>,
    build_failures: Mutex<HashSet<String>>,
    probe_failures: Mutex<HashSet<String>>,
}

impl MockFactory {
    pub fn new(chain: Arc<MockChain>) -> Self {
        Self {
            chain,
            builds: Mutex::new(Vec::new()),
            build_failures: Mutex::new(HashSet::new()),
            probe_failures: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_build(&self, url: &str) {
        self.build_failures.lock().unwrap().insert(url.to_string());
    }

    pub fn fail_probe(&self, url: &str) {
        self.probe_failures.lock().unwrap().insert(url.to_string());
    }

    pub fn build_attempts(&self) -> Vec<String> {
        self.builds.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    async fn build(
        &self,
        url: &str,
        wallet: Arc<dyn Wallet>,
        _network: Network,
    ) -> SenderResult<Arc<dyn ChainSession>> {
        self.builds.lock().unwrap().push(url.to_string());

        if self.build_failures.lock().unwrap().contains(url) {
            return Err(SenderError::Transport("connection refused".to_string()));
        }

        let address = wallet
            .accounts()
            .into_iter()
            .next()
            .ok_or_else(|| SenderError::Wallet("wallet has no accounts".to_string()))?;

        Ok(Arc::new(MockSession {
            chain: self.chain.clone(),
            address,
            probe_ok: !self.probe_failures.lock().unwrap().contains(url),
        }))
    }
}
