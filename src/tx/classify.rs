//! Broadcast failure classification
//!
//! The chain and its transports report failures as strings, so
//! classification is substring matching against known wordings. It is
//! deliberately confined to this one function: if a node or client upgrade
//! rewords an error, this is the only place that breaks.
//! TODO: switch the sequence/gas arms to ABCI error codes once the session
//! trait exposes them.

/// Remediation class for a failed broadcast attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Network-level failure; reconnect and retry
    Transport,
    /// Execution ran out of gas; raise the gas allowance and retry
    OutOfGas,
    /// Stale account sequence; retry unchanged, the next attempt observes
    /// the advanced sequence
    SequenceMismatch,
    /// Payer cannot cover the fee; top up (pool) or fail (single sender)
    InsufficientBalance,
    /// Everything else; propagate immediately
    Fatal,
}

/// Map a raw chain/transport error message into its remediation class
pub fn classify_failure(raw: &str) -> FailureClass {
    if raw.contains("fetch failed")
        || raw.contains("Bad status")
        || raw.contains("connection closed")
        || raw.contains("connection refused")
        || raw.contains("transport error")
    {
        FailureClass::Transport
    } else if raw.contains("out of gas in location") {
        FailureClass::OutOfGas
    } else if raw.contains("account sequence mismatch") {
        FailureClass::SequenceMismatch
    } else if raw.contains("balance") {
        FailureClass::InsufficientBalance
    } else {
        FailureClass::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_chain_wordings() {
        assert_eq!(classify_failure("fetch failed"), FailureClass::Transport);
        assert_eq!(
            classify_failure("Bad status on response: 502"),
            FailureClass::Transport
        );
        assert_eq!(
            classify_failure("out of gas in location: WritePerByte; gasWanted: 360000"),
            FailureClass::OutOfGas
        );
        assert_eq!(
            classify_failure("account sequence mismatch, expected 9, got 8"),
            FailureClass::SequenceMismatch
        );
        assert_eq!(
            classify_failure("spendable balance 12ncheq is smaller than 5000ncheq"),
            FailureClass::InsufficientBalance
        );
    }

    #[test]
    fn unknown_errors_are_fatal() {
        assert_eq!(
            classify_failure("did document already exists"),
            FailureClass::Fatal
        );
    }
}
