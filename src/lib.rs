// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # allocsync
//!
//! Change detection and sizing for following a remote portfolio-allocation feed.
//!
//! ## Features
//!
//! - **Snapshot diffing**: added, removed and modified records keyed by market-qualified symbol
//! - **Change classification**: OPEN / CLOSE / BUY / SELL with a 1pp materiality filter
//! - **Ratio translation**: target share quantities against a fixed notional balance, with a dead-band
//! - **Trading hours**: per-market session windows that pick the polling interval
//! - **Fixed-point prices**: integer cents throughout the sizing path
//!
//! ## Quick Start
//!
//! ```
//! use allocsync::{AllocationRecord, AllocationSnapshot, ChangeType, MarketCode, Price, diff, translate};
//!
//! let old = AllocationSnapshot::new(vec![], Some(100.0));
//! let new = AllocationSnapshot::new(
//!     vec![AllocationRecord::new("AAA", MarketCode::Us, 10.0).with_name("Triple A")],
//!     Some(100.0),
//! );
//!
//! let entries = diff(Some(&old), &new).classify();
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].change_type, ChangeType::Open);
//! assert_eq!(entries[0].new_ratio_pct, 10.0);
//!
//! // $10,000 balance, $50.00 quote: floor(10_000 * 0.10 / 50) = 20 shares
//! let delta = translate(&entries[0], 0, Price(50_00), Price(10_000_00));
//! assert_eq!(delta, 20);
//! ```
//!
//! ## Price Representation
//!
//! ```
//! use allocsync::Price;
//!
//! let price = Price(100_50);  // $100.50
//! assert_eq!(format!("{}", price), "$100.50");
//!
//! // Feed prices are scaled by 10^9
//! assert_eq!(Price::from_feed(100_500_000_000), price);
//! ```

pub mod diff;
mod error;
pub mod hours;
mod side;
pub mod snapshot;
mod tif;
pub mod translate;
mod types;

// Re-export public API
pub use diff::{ChangeEntry, ChangeType, MATERIALITY_PCT, RecordChange, SnapshotDiff, classify, diff};
pub use error::SnapshotError;
pub use hours::{Market, PollingPolicy, SessionPhase, TradingHours};
pub use side::Side;
pub use snapshot::{AllocationRecord, AllocationSnapshot, MarketCode, MarketItem};
pub use tif::TimeInForce;
pub use translate::{DEAD_BAND, OrderIntent, plan, translate};
pub use types::{Price, Symbol};
