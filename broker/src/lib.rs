//! Brokerage abstraction for allocsync.
//!
//! Provides a `Broker` trait covering the three calls the tracker needs:
//! positions, quotes and order submission. Implementations:
//!
//! - **Mock** ([`mock::MockBroker`]): scripted responses for tests
//! - **Gateway** (feature `gateway`): signed REST calls to a brokerage gateway

pub mod error;
pub mod mock;
pub mod quote;
pub mod types;

#[cfg(feature = "gateway")]
pub mod gateway;

pub use error::BrokerError;
pub use quote::{QuoteResolver, latest_tick};
pub use types::*;

use allocsync::Symbol;

/// A brokerage account that can list holdings, quote symbols and take orders.
pub trait Broker {
    /// Get all current positions.
    fn positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Get the current quote for a symbol, including extended-hours ticks.
    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError>;

    /// Submit an order. Returns the broker's receipt.
    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderReceipt, BrokerError>;

    /// Check that the broker is reachable.
    fn ping(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}

impl<B: Broker + ?Sized> Broker for &B {
    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        (**self).positions()
    }

    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        (**self).quote(symbol)
    }

    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderReceipt, BrokerError> {
        (**self).submit_order(order)
    }

    fn ping(&self) -> Result<(), BrokerError> {
        (**self).ping()
    }
}

impl<B: Broker + ?Sized> Broker for Box<B> {
    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        (**self).positions()
    }

    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        (**self).quote(symbol)
    }

    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderReceipt, BrokerError> {
        (**self).submit_order(order)
    }

    fn ping(&self) -> Result<(), BrokerError> {
        (**self).ping()
    }
}
