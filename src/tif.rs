//! Time-in-force for brokerage orders

use std::fmt;

use serde::{Deserialize, Serialize};

/// How long a submitted order stays working at the broker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Expires at the end of the trading day.
    #[default]
    Day,

    /// Good-til-cancelled: works until filled or explicitly cancelled.
    #[serde(rename = "GTC")]
    GoodTilCanceled,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Day => write!(f, "Day"),
            TimeInForce::GoodTilCanceled => write!(f, "GTC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_day() {
        assert_eq!(TimeInForce::default(), TimeInForce::Day);
    }

    #[test]
    fn wire_names_match_display() {
        for tif in [TimeInForce::Day, TimeInForce::GoodTilCanceled] {
            let json = serde_json::to_string(&tif).unwrap();
            assert_eq!(json, format!("\"{tif}\""));
        }
    }
}
