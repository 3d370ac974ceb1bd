//! Change execution: change entries → live price → sized order → broker.
//!
//! Also hosts the read-only CLI views (positions, status) that share the same
//! broker plumbing.

use allocsync::{ChangeEntry, Price, Symbol, plan};
use allocsync_broker::{Broker, BrokerOrder, OrderReceipt, Position, QuoteResolver};
use chrono::Utc;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::feed::{Feed, HttpFeed};
use crate::order::{OrderController, OrderSubmissionFailure};

/// What happened to one change entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    /// The broker acknowledged an order.
    Submitted {
        order: BrokerOrder,
        receipt: OrderReceipt,
    },
    /// Every attempt failed; the operator has been notified.
    Failed(OrderSubmissionFailure),
    /// Sizing produced no order (dead band, direction mismatch, nothing held).
    NoAction { current_qty: i64, price: Price },
    /// No usable live price.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    pub entry: ChangeEntry,
    pub result: EntryResult,
}

/// Per-entry results of one execution pass, in entry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub outcomes: Vec<EntryOutcome>,
}

impl ExecutionReport {
    pub fn submitted(&self) -> impl Iterator<Item = (&BrokerOrder, &OrderReceipt)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            EntryResult::Submitted { order, receipt } => Some((order, receipt)),
            _ => None,
        })
    }
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "EXECUTION:")?;
        for o in &self.outcomes {
            let symbol = &o.entry.symbol;
            match &o.result {
                EntryResult::Submitted { order, receipt } => {
                    writeln!(f, "  [SENT] {order} -> {}", receipt.order_id)?
                }
                EntryResult::Failed(failure) => writeln!(f, "  [FAIL] {failure}")?,
                EntryResult::NoAction { current_qty, price } => writeln!(
                    f,
                    "  [----] {symbol}: holding {current_qty} @ {price}, no order"
                )?,
                EntryResult::Skipped { reason } => writeln!(f, "  [SKIP] {symbol}: {reason}")?,
            }
        }
        Ok(())
    }
}

/// Execute a classified change set against the broker.
///
/// Positions are listed once up front; failing that aborts the whole pass.
/// Each entry is then priced and sized independently, so a missing quote or a
/// failed order only affects its own entry.
pub fn execute_changes(
    entries: &[ChangeEntry],
    broker: &dyn Broker,
    controller: &OrderController<'_>,
    balance: Price,
) -> Result<ExecutionReport> {
    let positions = broker.positions()?;
    let available: FxHashMap<Symbol, i64> = positions
        .into_iter()
        .map(|p| (p.symbol, p.available_quantity))
        .collect();
    let resolver = QuoteResolver::new(broker);

    let mut report = ExecutionReport::default();
    for entry in entries {
        let current_qty = available.get(&entry.symbol).copied().unwrap_or(0);
        let result = execute_entry(entry, current_qty, &resolver, controller, balance);
        report.outcomes.push(EntryOutcome {
            entry: entry.clone(),
            result,
        });
    }
    Ok(report)
}

fn execute_entry(
    entry: &ChangeEntry,
    current_qty: i64,
    resolver: &QuoteResolver<'_>,
    controller: &OrderController<'_>,
    balance: Price,
) -> EntryResult {
    let price = match resolver.resolve(&entry.symbol) {
        Ok(p) if p.is_positive() => p,
        Ok(p) => {
            warn!("{}: unusable price {p}, skipping", entry.symbol);
            return EntryResult::Skipped {
                reason: format!("unusable price {p}"),
            };
        }
        Err(e) => {
            warn!("{}: quote unavailable: {e}", entry.symbol);
            return EntryResult::Skipped {
                reason: format!("quote unavailable: {e}"),
            };
        }
    };

    let Some(intent) = plan(entry, current_qty, price, balance) else {
        info!(
            "{} [{}]: holding {current_qty} @ {price}, no order",
            entry.symbol, entry.change_type
        );
        return EntryResult::NoAction { current_qty, price };
    };

    match controller.submit_intent(&intent) {
        Ok((order, receipt)) => EntryResult::Submitted { order, receipt },
        Err(failure) => EntryResult::Failed(failure),
    }
}

/// A held position priced for display.
#[derive(Debug, Clone, Serialize)]
pub struct PricedPosition {
    pub position: Position,
    pub price: Option<Price>,
    /// Unrealized P&L as a fraction of balance.
    pub pnl_ratio: Option<f64>,
}

/// Price every position; a failed quote leaves the price empty.
pub fn price_positions(broker: &dyn Broker, balance: Price) -> Result<Vec<PricedPosition>> {
    let resolver = QuoteResolver::new(broker);
    Ok(broker
        .positions()?
        .into_iter()
        .map(|position| {
            let price = resolver
                .resolve(&position.symbol)
                .ok()
                .filter(|p| p.is_positive());
            let pnl_ratio = price.filter(|_| balance.is_positive()).map(|p| {
                (p.0 - position.cost_price.0) as f64 * position.quantity as f64 / balance.0 as f64
            });
            PricedPosition {
                position,
                price,
                pnl_ratio,
            }
        })
        .collect())
}

/// Show broker positions with live prices.
pub fn show_positions(config: &Config, broker: &dyn Broker) -> Result<()> {
    let priced = price_positions(broker, config.balance())?;
    println!("Balance: {}\n", config.balance());
    display_positions(&priced);
    Ok(())
}

/// Check feed and gateway reachability and the trading-hours state.
pub fn check_status(config: &Config, broker: &dyn Broker) -> Result<()> {
    print!("Feed {} ... ", config.feed.url);
    let feed = HttpFeed::new(
        &config.feed.url,
        std::time::Duration::from_secs(config.feed.timeout_secs),
    )?;
    match feed.fetch() {
        Ok(snapshot) => println!("OK ({} records)", snapshot.records.len()),
        Err(e) => println!("FAILED: {e}"),
    }

    print!("Gateway {} ... ", config.gateway.base_url);
    broker.ping()?;
    println!("OK");

    let policy = config.polling_policy();
    let now = Utc::now();
    println!(
        "Market {}: {} (next poll in {}s)",
        config.polling.market,
        policy.phase_at(now),
        policy.interval_at(now).as_secs(),
    );
    Ok(())
}

// === Helpers ===

fn display_positions(positions: &[PricedPosition]) {
    if positions.is_empty() {
        println!("No positions.");
        return;
    }

    println!("POSITIONS:");
    println!(
        "  {:10} {:>8} {:>8} {:>10} {:>10} {:>8}",
        "Symbol", "Qty", "Avail", "Cost", "Last", "P&L/bal"
    );
    for p in positions {
        let last = p.price.map_or_else(|| "n/a".to_string(), |x| x.to_string());
        let pnl = p
            .pnl_ratio
            .map_or_else(|| "n/a".to_string(), |r| format!("{:+.2}%", r * 100.0));
        println!(
            "  {:10} {:>8} {:>8} {:>10} {:>10} {:>8}",
            p.position.symbol.as_str(),
            p.position.quantity,
            p.position.available_quantity,
            p.position.cost_price.to_string(),
            last,
            pnl,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocsync::{ChangeType, MarketCode, Side};
    use allocsync_broker::mock::MockBroker;

    use crate::clock::SystemClock;
    use crate::notify::LogNotifier;

    fn entry(symbol: &str, change_type: ChangeType, old: f64, new: f64) -> ChangeEntry {
        ChangeEntry {
            symbol: Symbol::new(symbol),
            name: symbol.into(),
            market: MarketCode::Us,
            old_ratio_pct: old,
            new_ratio_pct: new,
            reference_price: Price(50_00),
            cost_price: Price(40_00),
            change_type,
        }
    }

    #[test]
    fn missing_quote_skips_only_that_entry() {
        let broker = MockBroker::builder()
            .with_quote(Symbol::new("AAA.US"), 50_00)
            .build();
        let controller = OrderController::new(&broker, &LogNotifier, &SystemClock);
        let entries = vec![
            entry("ZZZ.US", ChangeType::Open, 0.0, 10.0),
            entry("AAA.US", ChangeType::Open, 0.0, 10.0),
        ];

        let report = execute_changes(&entries, &broker, &controller, Price(10_000_00)).unwrap();
        assert!(matches!(report.outcomes[0].result, EntryResult::Skipped { .. }));
        let sent: Vec<_> = report.submitted().collect();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.quantity, 20);
        assert_eq!(sent[0].0.side, Side::Buy);
    }

    #[test]
    fn sizing_uses_available_quantity() {
        // 100 held but only 40 available; close sells the available 40
        let broker = MockBroker::builder()
            .with_position(Symbol::new("BBB.US"), 100, 40, 45_00)
            .with_quote(Symbol::new("BBB.US"), 50_00)
            .build();
        let controller = OrderController::new(&broker, &LogNotifier, &SystemClock);
        let entries = vec![entry("BBB.US", ChangeType::Close, 8.0, 0.0)];

        let report = execute_changes(&entries, &broker, &controller, Price(10_000_00)).unwrap();
        let orders = broker.submitted_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Sell);
        assert_eq!(orders[0].quantity, 40);
        assert!(report.to_string().contains("[SENT] SELL 40 BBB.US"));
    }

    #[test]
    fn dead_band_is_no_action() {
        // holding 10% (20 @ $50), target 12%: inside the band
        let broker = MockBroker::builder()
            .with_position(Symbol::new("CCC.US"), 20, 20, 45_00)
            .with_quote(Symbol::new("CCC.US"), 50_00)
            .build();
        let controller = OrderController::new(&broker, &LogNotifier, &SystemClock);
        let entries = vec![entry("CCC.US", ChangeType::Buy, 10.0, 12.0)];

        let report = execute_changes(&entries, &broker, &controller, Price(10_000_00)).unwrap();
        assert_eq!(
            report.outcomes[0].result,
            EntryResult::NoAction {
                current_qty: 20,
                price: Price(50_00)
            }
        );
        assert_eq!(broker.order_attempts(), 0);
    }

    #[test]
    fn pnl_ratio_uses_total_quantity() {
        let broker = MockBroker::builder()
            .with_position(Symbol::new("AAPL.US"), 50, 30, 100_00)
            .with_quote(Symbol::new("AAPL.US"), 90_00)
            .with_position(Symbol::new("MSFT.US"), 10, 10, 300_00)
            .build();
        let priced = price_positions(&broker, Price(10_000_00)).unwrap();
        assert_eq!(priced[0].price, Some(Price(90_00)));
        assert!((priced[0].pnl_ratio.unwrap() + 0.05).abs() < 1e-12);
        assert_eq!(priced[1].price, None);
        assert_eq!(priced[1].pnl_ratio, None);
    }
}
