//! Shared broker types: positions, quotes, orders, receipts.

use std::fmt;

use allocsync::{Price, Side, Symbol, TimeInForce};
use serde::Serialize;

/// Broker-level holding. Read-only to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub symbol: Symbol,
    /// Average cost per share.
    pub cost_price: Price,
    /// Total held quantity.
    pub quantity: i64,
    /// Quantity not locked by open orders or settlement.
    pub available_quantity: i64,
}

/// A last-trade price at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tick {
    /// Unix seconds.
    pub timestamp: i64,
    pub last_done: Price,
}

/// Live quote with optional extended-hours ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub symbol: Symbol,
    /// Regular-session last trade.
    pub regular: Tick,
    pub pre_market: Option<Tick>,
    pub post_market: Option<Tick>,
}

impl Quote {
    /// Quote with only a regular-session tick.
    pub fn regular(symbol: Symbol, timestamp: i64, last_done: Price) -> Self {
        Self {
            symbol,
            regular: Tick {
                timestamp,
                last_done,
            },
            pre_market: None,
            post_market: None,
        }
    }
}

/// Market or limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderKind {
    Market,
    Limit(Price),
}

impl OrderKind {
    /// Limit price, if any.
    pub fn price(&self) -> Option<Price> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit(p) => Some(*p),
        }
    }
}

/// Order to submit to a broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerOrder {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: u64,
    pub kind: OrderKind,
    pub time_in_force: TimeInForce,
    /// Free-text note attached to the order.
    pub remark: String,
}

impl fmt::Display for BrokerOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.side, self.quantity, self.symbol)?;
        match self.kind {
            OrderKind::Market => write!(f, " MKT")?,
            OrderKind::Limit(p) => write!(f, " @ {p}")?,
        }
        write!(f, " {}", self.time_in_force)
    }
}

/// Opaque order ID returned by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Broker acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
}
