//! Transaction building, gas heuristics and broadcast retry

pub mod broadcaster;
pub mod classify;
pub mod gas;

pub use broadcaster::{Broadcaster, SignAndSendOptions};
pub use classify::{classify_failure, FailureClass};
