//! Order submission with bounded retries and failure escalation.

use std::time::Duration;

use allocsync::{OrderIntent, Price, Side, Symbol, TimeInForce};
use allocsync_broker::{Broker, BrokerError, BrokerOrder, OrderKind, OrderReceipt};
use log::{error, info, warn};

use crate::clock::Clock;
use crate::config::{OrderStyle, OrdersConfig};
use crate::notify::{self, Notifier};

/// An order that failed on every attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("order {side} {quantity} {symbol} failed after {attempts} attempt(s): {last_error}")]
pub struct OrderSubmissionFailure {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: u64,
    /// Limit price; `None` for market orders.
    pub price: Option<Price>,
    pub attempts: u32,
    pub last_error: BrokerError,
}

impl OrderSubmissionFailure {
    /// Whether the final attempt failed on the network path.
    pub fn is_transport(&self) -> bool {
        self.last_error.is_transport()
    }
}

/// Submits orders, retrying failures with a fixed pause and raising one
/// notification when every attempt fails.
pub struct OrderController<'a> {
    broker: &'a dyn Broker,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
    max_attempts: u32,
    retry_delay: Duration,
    style: OrderStyle,
    time_in_force: TimeInForce,
}

impl<'a> OrderController<'a> {
    /// Three attempts, five seconds apart, Day limit orders.
    pub fn new(broker: &'a dyn Broker, notifier: &'a dyn Notifier, clock: &'a dyn Clock) -> Self {
        Self::from_config(&OrdersConfig::default(), broker, notifier, clock)
    }

    pub fn from_config(
        config: &OrdersConfig,
        broker: &'a dyn Broker,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            broker,
            notifier,
            clock,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            style: config.order_type,
            time_in_force: config.time_in_force,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Build the broker order for a sized intent.
    pub fn order_for(&self, intent: &OrderIntent) -> BrokerOrder {
        let kind = match self.style {
            OrderStyle::Limit => OrderKind::Limit(intent.price),
            OrderStyle::Market => OrderKind::Market,
        };
        BrokerOrder {
            symbol: intent.symbol.clone(),
            side: intent.side,
            quantity: intent.quantity,
            kind,
            time_in_force: self.time_in_force,
            remark: intent.note(),
        }
    }

    pub fn submit_intent(
        &self,
        intent: &OrderIntent,
    ) -> Result<(BrokerOrder, OrderReceipt), OrderSubmissionFailure> {
        let order = self.order_for(intent);
        let receipt = self.submit(&order)?;
        Ok((order, receipt))
    }

    /// Submit `order`, retrying on any failure.
    ///
    /// Pauses between attempts but not after the last one. On exhaustion the
    /// notifier is called once and the failure is returned.
    pub fn submit(&self, order: &BrokerOrder) -> Result<OrderReceipt, OrderSubmissionFailure> {
        let mut attempt = 1;
        let last_error = loop {
            match self.broker.submit_order(order) {
                Ok(receipt) => {
                    info!(
                        "[attempt {attempt}/{}] {order} accepted as {}",
                        self.max_attempts, receipt.order_id
                    );
                    return Ok(receipt);
                }
                Err(e) => {
                    warn!(
                        "[attempt {attempt}/{}] {order} failed: {e}",
                        self.max_attempts
                    );
                    if attempt >= self.max_attempts {
                        break e;
                    }
                }
            }
            self.clock.sleep(self.retry_delay);
            attempt += 1;
        };

        let failure = OrderSubmissionFailure {
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price: order.kind.price(),
            attempts: attempt,
            last_error,
        };
        error!("{failure}");
        notify::deliver(
            self.notifier,
            &notify::order_failure_report(&failure, self.clock.now()),
        );
        Err(failure)
    }
}
