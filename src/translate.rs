//! Ratio→quantity translation against a fixed notional balance.
//!
//! Target quantities are sized as `floor(balance * target_ratio / price)`.
//! Gradual rebalances inside a [`DEAD_BAND`] of the target ratio are ignored;
//! opening a fresh position and closing a held one are discrete events and
//! always act.

use serde::Serialize;

use crate::diff::{ChangeEntry, ChangeType};
use crate::{Price, Side, Symbol};

/// Ratio distance (as a fraction of balance) below which no order is issued.
pub const DEAD_BAND: f64 = 0.05;

/// Whole shares that `balance * target_ratio` buys at `price`.
///
/// Returns 0 for a non-positive price or target.
pub fn target_quantity(target_ratio: f64, price: Price, balance: Price) -> i64 {
    if !price.is_positive() || !target_ratio.is_finite() || target_ratio <= 0.0 {
        return 0;
    }
    (balance.0 as f64 * target_ratio / price.0 as f64).floor().max(0.0) as i64
}

/// Fraction of the balance currently held in a position.
pub fn held_ratio(current_qty: i64, price: Price, balance: Price) -> f64 {
    if !balance.is_positive() {
        return 0.0;
    }
    current_qty as f64 * price.0 as f64 / balance.0 as f64
}

/// Signed share delta that moves the holding to the entry's target ratio.
///
/// Positive means buy, negative means sell, zero means leave the position.
pub fn translate(entry: &ChangeEntry, current_qty: i64, price: Price, balance: Price) -> i64 {
    if !balance.is_positive() {
        return 0;
    }
    let target_ratio = entry.new_ratio_pct / 100.0;

    match entry.change_type {
        ChangeType::Open if current_qty == 0 => {
            return target_quantity(target_ratio, price, balance);
        }
        ChangeType::Close if current_qty > 0 => return -current_qty,
        _ => {}
    }

    let current_ratio = held_ratio(current_qty, price, balance);
    if (current_ratio - target_ratio).abs() < DEAD_BAND {
        return 0;
    }

    target_quantity(target_ratio, price, balance) - current_qty
}

/// A sized order derived from one change entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderIntent {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: u64,
    pub price: Price,
    pub reason: ChangeType,
}

impl OrderIntent {
    /// Free-text order note sent to the broker.
    pub fn note(&self) -> String {
        let verb = match self.side {
            Side::Buy => "buy",
            Side::Sell => "sell",
        };
        format!("Auto {verb} {} shares", self.quantity)
    }
}

/// Turn a change entry into an order, if one is warranted.
///
/// The direction must agree with the change type: an OPEN only buys into an
/// empty position, a CLOSE only sells a held one, a BUY only buys and a SELL
/// only sells.
pub fn plan(entry: &ChangeEntry, current_qty: i64, price: Price, balance: Price) -> Option<OrderIntent> {
    let delta = translate(entry, current_qty, price, balance);

    let side = Side::for_delta(delta)?;
    let agrees = match entry.change_type {
        ChangeType::Open => current_qty == 0 && side == Side::Buy,
        ChangeType::Close => current_qty > 0 && side == Side::Sell,
        ChangeType::Buy => side == Side::Buy,
        ChangeType::Sell => side == Side::Sell,
    };
    if !agrees {
        return None;
    }

    Some(OrderIntent {
        symbol: entry.symbol.clone(),
        side,
        quantity: delta.unsigned_abs(),
        price,
        reason: entry.change_type,
    })
}
