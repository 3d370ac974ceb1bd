//! Per-position exit checks.

use allocsync::Price;
use allocsync_broker::Position;

use crate::config::ExitConfig;
use crate::report::{ExitAction, ExitDecision};

/// Returns `">"` for an exit, `"<="` otherwise.
fn cmp_symbol(action: ExitAction) -> &'static str {
    if action.is_exit() { ">" } else { "<=" }
}

fn skip(position: &Position, price: Price, detail: &str) -> ExitDecision {
    ExitDecision {
        symbol: position.symbol.clone(),
        action: ExitAction::Skip,
        sell_quantity: 0,
        price,
        pnl_ratio: 0.0,
        detail: detail.to_string(),
    }
}

/// Evaluate one position at its current price.
///
/// P&L is measured on the total held quantity; an exit sells the available
/// quantity. At most one action per position.
pub fn evaluate_position(
    config: &ExitConfig,
    position: &Position,
    price: Price,
    balance: Price,
) -> ExitDecision {
    if position.available_quantity <= 0 {
        return skip(position, price, "no available quantity");
    }
    if !price.is_positive() || !position.cost_price.is_positive() {
        return skip(position, price, "non-positive price or cost basis");
    }
    if !balance.is_positive() {
        return skip(position, price, "non-positive balance");
    }

    let pnl_cents = (price.0 - position.cost_price.0).saturating_mul(position.quantity);
    let pnl_ratio = pnl_cents as f64 / balance.0 as f64;

    let (action, label, threshold) = if price < position.cost_price {
        let action = if -pnl_ratio > config.loss_threshold {
            ExitAction::StopLoss
        } else {
            ExitAction::Hold
        };
        (action, "loss", config.loss_threshold)
    } else if price > position.cost_price {
        let action = if pnl_ratio > config.profit_threshold {
            ExitAction::TakeProfit
        } else {
            ExitAction::Hold
        };
        (action, "gain", config.profit_threshold)
    } else {
        return ExitDecision {
            symbol: position.symbol.clone(),
            action: ExitAction::Hold,
            sell_quantity: 0,
            price,
            pnl_ratio: 0.0,
            detail: format!("flat at cost {}", position.cost_price),
        };
    };

    let mut detail = format!(
        "{label} {} = {:.2}% of balance {} {:.2}% limit",
        Price(pnl_cents.abs()),
        pnl_ratio.abs() * 100.0,
        cmp_symbol(action),
        threshold * 100.0,
    );
    let sell_quantity = if action.is_exit() {
        let qty = position.available_quantity.unsigned_abs();
        detail.push_str(&format!("; sell {qty} @ {price}"));
        qty
    } else {
        0
    };

    ExitDecision {
        symbol: position.symbol.clone(),
        action,
        sell_quantity,
        price,
        pnl_ratio,
        detail,
    }
}
