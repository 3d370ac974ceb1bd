//! Stop-loss and take-profit rules for allocsync.
//!
//! Evaluates held positions against loss and gain thresholds expressed as a
//! fraction of the account balance. Pure: pricing and order submission live
//! with the caller.

pub mod checks;
pub mod config;
pub mod report;

pub use config::ExitConfig;
pub use report::{ExitAction, ExitDecision, ExitReport};

use allocsync::Price;
use allocsync_broker::Position;

/// Exit rule engine.
#[derive(Debug, Clone)]
pub struct ExitEngine {
    config: ExitConfig,
}

impl ExitEngine {
    /// Create a new exit engine with the given config.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails validation (e.g., NaN thresholds).
    /// Use [`ExitEngine::try_new`] to handle the error instead.
    #[track_caller]
    pub fn new(config: ExitConfig) -> Self {
        if let Err(msg) = config.validate() {
            panic!("invalid ExitConfig: {msg}");
        }
        Self { config }
    }

    /// Create a new exit engine, rejecting an invalid config.
    pub fn try_new(config: ExitConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Access the current config.
    pub fn config(&self) -> &ExitConfig {
        &self.config
    }

    /// Evaluate one position at its current price.
    pub fn evaluate(&self, position: &Position, price: Price, balance: Price) -> ExitDecision {
        checks::evaluate_position(&self.config, position, price, balance)
    }
}
