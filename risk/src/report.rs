//! Exit scan report types.

use allocsync::{Price, Symbol};
use serde::Serialize;

/// Result of scanning all held positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExitReport {
    pub decisions: Vec<ExitDecision>,
}

/// Verdict for one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitDecision {
    pub symbol: Symbol,
    pub action: ExitAction,
    /// Shares to sell; zero unless the action is an exit.
    pub sell_quantity: u64,
    /// Price the decision was made at.
    pub price: Price,
    /// Signed unrealized P&L as a fraction of balance.
    pub pnl_ratio: f64,
    pub detail: String,
}

/// What to do with a position this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitAction {
    /// Within thresholds.
    Hold,
    /// Not evaluated (missing data or nothing sellable).
    Skip,
    /// Loss exceeded the threshold.
    StopLoss,
    /// Gain exceeded the threshold.
    TakeProfit,
}

impl ExitAction {
    pub fn is_exit(self) -> bool {
        matches!(self, ExitAction::StopLoss | ExitAction::TakeProfit)
    }
}

impl std::fmt::Display for ExitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitAction::Hold => write!(f, "HOLD"),
            ExitAction::Skip => write!(f, "SKIP"),
            ExitAction::StopLoss => write!(f, "STOP-LOSS"),
            ExitAction::TakeProfit => write!(f, "TAKE-PROFIT"),
        }
    }
}

impl ExitReport {
    /// Decisions that call for a sell.
    pub fn exits(&self) -> impl Iterator<Item = &ExitDecision> {
        self.decisions.iter().filter(|d| d.action.is_exit())
    }

    /// True if any position should be exited.
    pub fn has_exits(&self) -> bool {
        self.exits().next().is_some()
    }
}

impl std::fmt::Display for ExitReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "EXIT CHECKS:")?;
        for d in &self.decisions {
            writeln!(f, "  [{}] {}: {}", d.action, d.symbol, d.detail)?;
        }
        Ok(())
    }
}
