//! allocsync-tracker: follow a remote allocation feed with a brokerage account.
//!
//! Polls the feed on a trading-hours-aware cadence, diffs each snapshot
//! against the committed baseline, sizes material changes against a notional
//! balance, and submits the resulting orders with bounded retries. A
//! stop-loss / take-profit scan runs over held positions every cycle. Events
//! go to a JSONL audit trail.

pub mod audit;
pub mod broker;
pub mod clock;
pub mod config;
pub mod error;
pub mod execution;
pub mod exit_guard;
pub mod feed;
pub mod notify;
pub mod order;
pub mod scheduler;
pub mod store;
