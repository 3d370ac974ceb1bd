//! Brokerage gateway implementation.

pub mod auth;
pub mod client;
pub mod types;

use std::time::Duration;

use allocsync::{Price, Side, Symbol, TimeInForce};

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;
use client::GatewayClient;

/// Broker backed by a signed REST gateway.
///
/// Blocking (sync) via reqwest::blocking.
pub struct GatewayBroker {
    client: GatewayClient,
}

impl GatewayBroker {
    pub fn new(
        base_url: &str,
        api_key: &str,
        secret_key: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        Ok(Self {
            client: GatewayClient::new(base_url, api_key, secret_key, timeout)?,
        })
    }
}

/// Parse a decimal price string to cents (e.g., "185.50" → 18550).
pub fn parse_price(s: &str) -> Result<Price, BrokerError> {
    let val: f64 = s
        .trim()
        .parse()
        .map_err(|_| BrokerError::Decode(format!("invalid price '{s}'")))?;
    if !val.is_finite() {
        return Err(BrokerError::Decode(format!("invalid price '{s}'")));
    }
    Ok(Price::from_dollars(val))
}

/// Parse a share quantity. Fractional quantities are truncated.
pub fn parse_quantity(s: &str) -> Result<i64, BrokerError> {
    let s = s.trim();
    if let Ok(q) = s.parse::<i64>() {
        return Ok(q);
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
        .ok_or_else(|| BrokerError::Decode(format!("invalid quantity '{s}'")))
}

/// Convert a wire position.
pub fn position_from_wire(p: &types::PositionInfo) -> Result<Position, BrokerError> {
    Ok(Position {
        symbol: Symbol::new(&p.symbol),
        cost_price: parse_price(&p.cost_price)?,
        quantity: parse_quantity(&p.quantity)?,
        available_quantity: parse_quantity(&p.available_quantity)?,
    })
}

/// Convert a wire quote.
pub fn quote_from_wire(q: &types::QuoteResponse) -> Result<Quote, BrokerError> {
    let session = |s: &Option<types::SessionQuote>| -> Result<Option<Tick>, BrokerError> {
        s.as_ref()
            .map(|s| {
                Ok(Tick {
                    timestamp: s.timestamp,
                    last_done: parse_price(&s.last_done)?,
                })
            })
            .transpose()
    };

    Ok(Quote {
        symbol: Symbol::new(&q.symbol),
        regular: Tick {
            timestamp: q.timestamp,
            last_done: parse_price(&q.last_done)?,
        },
        pre_market: session(&q.pre_market_quote)?,
        post_market: session(&q.post_market_quote)?,
    })
}

/// Build the wire request for an order.
pub fn order_to_wire(order: &BrokerOrder) -> types::SubmitOrderRequest<'_> {
    let side = match order.side {
        Side::Buy => "Buy",
        Side::Sell => "Sell",
    };
    let (order_type, price) = match order.kind {
        OrderKind::Market => ("MO", None),
        OrderKind::Limit(p) => ("LO", Some(format!("{:.2}", p.as_dollars()))),
    };
    let time_in_force = match order.time_in_force {
        TimeInForce::Day => "Day",
        TimeInForce::GoodTilCanceled => "GTC",
    };

    types::SubmitOrderRequest {
        symbol: order.symbol.as_str(),
        side,
        order_type,
        submitted_quantity: order.quantity.to_string(),
        submitted_price: price,
        time_in_force,
        remark: &order.remark,
    }
}

impl Broker for GatewayBroker {
    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.client
            .positions()?
            .positions
            .iter()
            .map(position_from_wire)
            .collect()
    }

    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        quote_from_wire(&self.client.quote(symbol.as_str())?)
    }

    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderReceipt, BrokerError> {
        let resp = self.client.submit_order(&order_to_wire(order))?;
        Ok(OrderReceipt {
            order_id: OrderId(resp.order_id),
        })
    }

    fn ping(&self) -> Result<(), BrokerError> {
        self.client.ping()
    }
}
