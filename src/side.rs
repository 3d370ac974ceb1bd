//! Order side: Buy or Sell

use std::fmt;

use serde::{Deserialize, Serialize};

/// Side of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side that moves a holding by a signed quantity delta, if any.
    #[inline]
    pub fn for_delta(delta: i64) -> Option<Self> {
        match delta {
            d if d > 0 => Some(Side::Buy),
            d if d < 0 => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}
