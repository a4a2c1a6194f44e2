//! Wire-adjacent value types: networks, messages, coins, payments, receipts
//!
//! All money and gas arithmetic uses `u128` so that
//! `gas x price x batch-count` products stay exact; string renderings are
//! used on the wire.

use serde::{Deserialize, Serialize};

/// Canonical type URLs for the messages this subsystem submits
pub mod type_url {
    pub const MSG_CREATE_DID_DOC: &str = "/cheqd.did.v2.MsgCreateDidDoc";
    pub const MSG_UPDATE_DID_DOC: &str = "/cheqd.did.v2.MsgUpdateDidDoc";
    pub const MSG_DEACTIVATE_DID_DOC: &str = "/cheqd.did.v2.MsgDeactivateDidDoc";
    pub const MSG_CREATE_RESOURCE: &str = "/cheqd.resource.v2.MsgCreateResource";
    pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";
}

/// Target network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Fee denomination used by the chain
    pub fn denom(self) -> &'static str {
        "ncheq"
    }

    /// Per-block gas limit; adjusted gas must stay strictly below this
    pub fn max_block_gas(self) -> u64 {
        30_000_000
    }
}

/// An already proto-encoded message tagged with its canonical type URL.
///
/// The subsystem never interprets `value`; encoding belongs to the
/// DID/resource modules and the session codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyMsg {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl AnyMsg {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }
}

/// A single denominated amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "string_u128")]
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// Fee envelope attached to a broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: Vec<Coin>,
    #[serde(with = "string_u128")]
    pub gas: u128,
    pub payer: String,
}

/// Broadcast receipt as returned by the chain.
///
/// A non-zero `code` means the transaction was rejected; the broadcaster
/// turns such a response into an error embedding its serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    pub code: u32,
    pub height: u64,
    pub tx_hash: String,
    pub raw_log: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
}

/// Serialize `u128` amounts as decimal strings (chain wire convention)
mod string_u128 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
