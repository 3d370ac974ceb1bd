//! Mock broker for testing; implements the `Broker` trait with scripted behavior.
//!
//! Use this in tests to simulate broker responses without network calls.
//!
//! ```
//! use allocsync::{Price, Symbol};
//! use allocsync_broker::BrokerError;
//! use allocsync_broker::mock::MockBroker;
//!
//! let broker = MockBroker::builder()
//!     .with_position(Symbol::new("AAPL.US"), 100, 100, 150_00)
//!     .with_quote(Symbol::new("AAPL.US"), 155_00)
//!     .fail_orders(2, BrokerError::Timeout("gateway".into()))
//!     .build();
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use allocsync::{Price, Symbol};

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// How the mock broker answers orders once scripted failures run out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderMode {
    /// Every order is acknowledged.
    Accept,
    /// Every order fails with the given error.
    Reject(BrokerError),
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    order_mode: OrderMode,
    scripted: VecDeque<BrokerError>,
    positions: Vec<Position>,
    positions_error: Option<BrokerError>,
    quotes: Vec<Quote>,
}

impl MockBrokerBuilder {
    pub fn order_mode(mut self, mode: OrderMode) -> Self {
        self.order_mode = mode;
        self
    }

    /// Fail the next `n` order submissions with `error`, then fall back to
    /// the order mode.
    pub fn fail_orders(mut self, n: usize, error: BrokerError) -> Self {
        self.scripted.extend(std::iter::repeat_n(error, n));
        self
    }

    pub fn with_position(
        mut self,
        symbol: Symbol,
        quantity: i64,
        available_quantity: i64,
        cost_cents: i64,
    ) -> Self {
        self.positions.push(Position {
            symbol,
            cost_price: Price(cost_cents),
            quantity,
            available_quantity,
        });
        self
    }

    /// Make `positions()` fail.
    pub fn fail_positions(mut self, error: BrokerError) -> Self {
        self.positions_error = Some(error);
        self
    }

    /// Regular-session quote at the given price.
    pub fn with_quote(mut self, symbol: Symbol, last_cents: i64) -> Self {
        self.quotes.push(Quote::regular(symbol, 0, Price(last_cents)));
        self
    }

    pub fn with_quote_detail(mut self, quote: Quote) -> Self {
        self.quotes.push(quote);
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            order_mode: self.order_mode,
            positions: self.positions,
            positions_error: self.positions_error,
            quotes: self.quotes,
            state: Mutex::new(MockState {
                scripted: self.scripted,
                attempts: 0,
                next_order_id: 1,
                submitted: Vec::new(),
            }),
        }
    }
}

struct MockState {
    scripted: VecDeque<BrokerError>,
    attempts: usize,
    next_order_id: u64,
    submitted: Vec<BrokerOrder>,
}

/// A mock broker that records submitted orders and returns scripted responses.
pub struct MockBroker {
    order_mode: OrderMode,
    positions: Vec<Position>,
    positions_error: Option<BrokerError>,
    quotes: Vec<Quote>,
    state: Mutex<MockState>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            order_mode: OrderMode::Accept,
            scripted: VecDeque::new(),
            positions: Vec::new(),
            positions_error: None,
            quotes: Vec::new(),
        }
    }

    /// Orders the broker acknowledged (for assertion in tests).
    pub fn submitted_orders(&self) -> Vec<BrokerOrder> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Number of `submit_order` calls, successful or not.
    pub fn order_attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }
}

impl Broker for MockBroker {
    fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        match &self.positions_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.positions.clone()),
        }
    }

    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        self.quotes
            .iter()
            .find(|q| &q.symbol == symbol)
            .cloned()
            .ok_or_else(|| BrokerError::InvalidSymbol(symbol.as_str().to_string()))
    }

    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderReceipt, BrokerError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;

        if let Some(err) = state.scripted.pop_front() {
            return Err(err);
        }
        if let OrderMode::Reject(err) = &self.order_mode {
            return Err(err.clone());
        }

        let id = state.next_order_id;
        state.next_order_id += 1;
        state.submitted.push(order.clone());
        Ok(OrderReceipt {
            order_id: OrderId(format!("mock-{id}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocsync::{Side, TimeInForce};

    fn aapl() -> Symbol {
        Symbol::new("AAPL.US")
    }

    fn order() -> BrokerOrder {
        BrokerOrder {
            symbol: aapl(),
            side: Side::Buy,
            quantity: 50,
            kind: OrderKind::Limit(Price(150_00)),
            time_in_force: TimeInForce::Day,
            remark: "Auto buy 50 shares".into(),
        }
    }

    #[test]
    fn builder_basic() {
        let broker = MockBroker::builder()
            .with_position(aapl(), 100, 80, 150_00)
            .with_quote(aapl(), 151_00)
            .build();

        let positions = broker.positions().unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].symbol, aapl());
        assert_eq!(positions[0].quantity, 100);
        assert_eq!(positions[0].available_quantity, 80);

        let quote = broker.quote(&aapl()).unwrap();
        assert_eq!(quote.regular.last_done, Price(151_00));
        assert!(broker.quote(&Symbol::new("MSFT.US")).is_err());
    }

    #[test]
    fn submit_records_orders() {
        let broker = MockBroker::builder().build();
        let receipt = broker.submit_order(&order()).unwrap();
        assert_eq!(receipt.order_id, OrderId("mock-1".into()));

        let recorded = broker.submitted_orders();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].quantity, 50);
        assert_eq!(broker.order_attempts(), 1);
    }

    #[test]
    fn scripted_failures_then_accept() {
        let broker = MockBroker::builder()
            .fail_orders(2, BrokerError::Connection("reset".into()))
            .build();

        assert!(broker.submit_order(&order()).unwrap_err().is_transport());
        assert!(broker.submit_order(&order()).is_err());
        assert!(broker.submit_order(&order()).is_ok());
        assert_eq!(broker.order_attempts(), 3);
        assert_eq!(broker.submitted_orders().len(), 1);
    }

    #[test]
    fn reject_mode() {
        let broker = MockBroker::builder()
            .order_mode(OrderMode::Reject(BrokerError::Order("rejected".into())))
            .build();
        assert_eq!(
            broker.submit_order(&order()),
            Err(BrokerError::Order("rejected".into()))
        );
        assert!(broker.submitted_orders().is_empty());
    }

    #[test]
    fn positions_failure() {
        let broker = MockBroker::builder()
            .fail_positions(BrokerError::Timeout("positions".into()))
            .build();
        assert!(broker.positions().unwrap_err().is_transport());
    }
}
