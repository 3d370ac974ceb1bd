//! Exit rule configuration.

use serde::Deserialize;

/// Thresholds for the per-cycle exit scan.
///
/// Both thresholds are unrealized P&L as a fraction of the account balance
/// (e.g., 0.01 = a loss worth 1% of balance).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExitConfig {
    /// Run the scan at all.
    pub enabled: bool,
    /// Sell the full position once its loss exceeds this fraction of balance.
    pub loss_threshold: f64,
    /// Sell the full position once its gain exceeds this fraction of balance.
    pub profit_threshold: f64,
}

impl ExitConfig {
    /// Validate the config. Returns `Err` with a description if any field is nonsensical.
    pub fn validate(&self) -> Result<(), String> {
        if !self.loss_threshold.is_finite()
            || self.loss_threshold < 0.0
            || self.loss_threshold > 1.0
        {
            return Err(format!(
                "loss_threshold must be in [0, 1], got {}",
                self.loss_threshold
            ));
        }
        if !self.profit_threshold.is_finite()
            || self.profit_threshold < 0.0
            || self.profit_threshold > 1.0
        {
            return Err(format!(
                "profit_threshold must be in [0, 1], got {}",
                self.profit_threshold
            ));
        }
        Ok(())
    }
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            loss_threshold: 0.01,
            profit_threshold: 0.04,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ExitConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_nan_and_out_of_range() {
        let nan = ExitConfig {
            loss_threshold: f64::NAN,
            ..ExitConfig::default()
        };
        assert!(nan.validate().unwrap_err().contains("loss_threshold"));

        let big = ExitConfig {
            profit_threshold: 1.5,
            ..ExitConfig::default()
        };
        assert!(big.validate().unwrap_err().contains("profit_threshold"));

        let negative = ExitConfig {
            loss_threshold: -0.01,
            ..ExitConfig::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: ExitConfig = toml::from_str("loss_threshold = 0.02").unwrap();
        assert_eq!(cfg.loss_threshold, 0.02);
        assert_eq!(cfg.profit_threshold, 0.04);
        assert!(cfg.enabled);
    }
}
