//! Core types: Price, Symbol

use std::fmt;

use serde::{Deserialize, Serialize};

/// Price in cents.
///
/// `Price(10050)` represents $100.50. Broker quotes, cost bases and the
/// account balance are all carried in this unit so the sizing math works on
/// integers until the final ratio.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Scale of the allocation feed's fixed-point prices (10^9 per unit).
    pub const FEED_SCALE: i64 = 1_000_000_000;

    /// Convert a dollar amount to cents, rounding to the nearest cent.
    pub fn from_dollars(dollars: f64) -> Self {
        Price((dollars * 100.0).round() as i64)
    }

    /// Convert a feed price (scaled by 10^9) to cents, rounding half away from zero.
    pub fn from_feed(raw: i64) -> Self {
        let per_cent = Self::FEED_SCALE / 100;
        let half = per_cent / 2;
        let cents = if raw >= 0 {
            raw.saturating_add(half) / per_cent
        } else {
            raw.saturating_sub(half) / per_cent
        };
        Price(cents)
    }

    /// Value in dollars.
    #[inline]
    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = (self.0 % 100).abs();
        if self.0 < 0 {
            write!(f, "-${}.{:02}", dollars.abs(), cents)
        } else {
            write!(f, "${}.{:02}", dollars, cents)
        }
    }
}

/// A market-qualified instrument symbol, e.g. `AAPL.US` or `700.HK`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: &str) -> Self {
        Symbol(s.to_string())
    }

    /// Build a symbol from a bare code and a market suffix (`"US"`, `"HK"`).
    ///
    /// An empty suffix leaves the code untouched.
    pub fn qualified(code: &str, suffix: &str) -> Self {
        if suffix.is_empty() {
            Symbol(code.to_string())
        } else {
            Symbol(format!("{code}.{suffix}"))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}
