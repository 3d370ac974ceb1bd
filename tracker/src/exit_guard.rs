//! Per-cycle stop-loss / take-profit scan over held positions.

use allocsync::{ChangeType, OrderIntent, Price, Side};
use allocsync_broker::{Broker, BrokerOrder, OrderReceipt, QuoteResolver};
use allocsync_risk::{ExitAction, ExitDecision, ExitEngine, ExitReport};
use log::{info, warn};

use crate::error::Result;
use crate::order::{OrderController, OrderSubmissionFailure};

/// Exit order outcome for one triggered decision.
#[derive(Debug, Clone, PartialEq)]
pub enum ExitOrder {
    Submitted {
        order: BrokerOrder,
        receipt: OrderReceipt,
    },
    Failed(OrderSubmissionFailure),
}

/// Decisions for every sellable position plus the orders they produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitScan {
    pub report: ExitReport,
    pub orders: Vec<ExitOrder>,
}

/// Evaluates holdings against the exit thresholds and sells the ones that
/// trip them.
pub struct ExitGuard<'a> {
    engine: &'a ExitEngine,
    broker: &'a dyn Broker,
    controller: &'a OrderController<'a>,
}

impl<'a> ExitGuard<'a> {
    pub fn new(
        engine: &'a ExitEngine,
        broker: &'a dyn Broker,
        controller: &'a OrderController<'a>,
    ) -> Self {
        Self {
            engine,
            broker,
            controller,
        }
    }

    /// Scan all positions with a sellable quantity.
    ///
    /// A failed quote skips that position; a failed order is recorded and the
    /// scan moves on. Only a failure to list positions is returned as an error.
    pub fn scan(&self, balance: Price) -> Result<ExitScan> {
        if !self.engine.config().enabled {
            return Ok(ExitScan::default());
        }

        let resolver = QuoteResolver::new(self.broker);
        let mut scan = ExitScan::default();

        for position in self.broker.positions()? {
            if position.available_quantity <= 0 {
                continue;
            }

            let decision = match resolver.resolve(&position.symbol) {
                Ok(price) => self.engine.evaluate(&position, price, balance),
                Err(e) => {
                    warn!("{}: no quote for exit check: {e}", position.symbol);
                    ExitDecision {
                        symbol: position.symbol.clone(),
                        action: ExitAction::Skip,
                        sell_quantity: 0,
                        price: Price::ZERO,
                        pnl_ratio: 0.0,
                        detail: format!("quote unavailable: {e}"),
                    }
                }
            };

            if decision.action.is_exit() {
                info!("{} {}: {}", decision.action, decision.symbol, decision.detail);
                scan.orders.push(self.sell(&decision));
            }
            scan.report.decisions.push(decision);
        }

        Ok(scan)
    }

    fn sell(&self, decision: &ExitDecision) -> ExitOrder {
        let intent = OrderIntent {
            symbol: decision.symbol.clone(),
            side: Side::Sell,
            quantity: decision.sell_quantity,
            price: decision.price,
            reason: ChangeType::Close,
        };
        match self.controller.submit_intent(&intent) {
            Ok((order, receipt)) => ExitOrder::Submitted { order, receipt },
            Err(failure) => ExitOrder::Failed(failure),
        }
    }
}
