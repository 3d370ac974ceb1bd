//! Broker construction for the tracker runtime.

use std::cell::Cell;
use std::time::Duration;

use allocsync::Symbol;
use allocsync_broker::gateway::GatewayBroker;
use allocsync_broker::{Broker, BrokerError, BrokerOrder, OrderId, OrderReceipt, Position, Quote};
use log::info;

use crate::config::Config;
use crate::error::Result;

/// Connect to the brokerage gateway named in the config.
pub fn connect_gateway(config: &Config) -> Result<GatewayBroker> {
    let secret = config.gateway_secret()?;
    let broker = GatewayBroker::new(
        &config.gateway.base_url,
        &config.gateway.api_key,
        &secret,
        Duration::from_secs(config.gateway.timeout_secs),
    )?;
    Ok(broker)
}

/// The live broker, or a paper wrapper around it for dry runs.
pub fn open(config: &Config, dry_run: bool) -> Result<Box<dyn Broker>> {
    let live = connect_gateway(config)?;
    Ok(if dry_run {
        info!("dry run: orders will be logged, not sent");
        Box::new(PaperBroker::new(live))
    } else {
        Box::new(live)
    })
}

/// Reads positions and quotes from the inner broker but only logs orders.
pub struct PaperBroker<B> {
    inner: B,
    next_id: Cell<u64>,
}

impl<B: Broker> PaperBroker<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            next_id: Cell::new(1),
        }
    }
}

impl<B: Broker> Broker for PaperBroker<B> {
    fn positions(&self) -> std::result::Result<Vec<Position>, BrokerError> {
        self.inner.positions()
    }

    fn quote(&self, symbol: &Symbol) -> std::result::Result<Quote, BrokerError> {
        self.inner.quote(symbol)
    }

    fn submit_order(&self, order: &BrokerOrder) -> std::result::Result<OrderReceipt, BrokerError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        info!("[paper] {order} ({})", order.remark);
        Ok(OrderReceipt {
            order_id: OrderId(format!("paper-{id}")),
        })
    }

    fn ping(&self) -> std::result::Result<(), BrokerError> {
        self.inner.ping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocsync::{Price, Side, TimeInForce};
    use allocsync_broker::OrderKind;
    use allocsync_broker::mock::MockBroker;

    fn order() -> BrokerOrder {
        BrokerOrder {
            symbol: Symbol::new("AAPL.US"),
            side: Side::Sell,
            quantity: 5,
            kind: OrderKind::Limit(Price(190_00)),
            time_in_force: TimeInForce::Day,
            remark: "Auto sell 5 shares".into(),
        }
    }

    #[test]
    fn paper_orders_never_reach_inner() {
        let paper = PaperBroker::new(
            MockBroker::builder()
                .with_position(Symbol::new("AAPL.US"), 10, 10, 150_00)
                .build(),
        );
        assert_eq!(paper.submit_order(&order()).unwrap().order_id.0, "paper-1");
        assert_eq!(paper.submit_order(&order()).unwrap().order_id.0, "paper-2");
        assert_eq!(paper.inner.order_attempts(), 0);
        assert_eq!(paper.positions().unwrap().len(), 1);
    }

    #[test]
    fn gateway_needs_a_secret() {
        let config = Config::parse(
            r#"
[feed]
url = "https://feeds.example.com/p/1"
[gateway]
base_url = "http://127.0.0.1:8700"
api_key = "k"
secret_key = "s"
[account]
balance = 10000
"#,
        )
        .unwrap();
        assert!(connect_gateway(&config).is_ok());
    }
}
