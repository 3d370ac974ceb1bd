//! Allocation snapshots as published by the remote feed.
//!
//! A snapshot keeps every field the feed sent, including ones this crate does
//! not interpret, so two snapshots compare equal only when the feed content is
//! structurally identical and a persisted baseline round-trips unchanged.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SnapshotError;
use crate::{Price, Symbol};

/// Market a feed record trades on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCode {
    Domestic,
    Hk,
    Us,
}

impl MarketCode {
    /// Map the feed's integer market code (`1` = HK, `2` = US, else domestic).
    pub fn from_feed(code: i64) -> Self {
        match code {
            1 => MarketCode::Hk,
            2 => MarketCode::Us,
            _ => MarketCode::Domestic,
        }
    }

    /// Symbol suffix used by the brokerage for this market.
    pub fn suffix(self) -> &'static str {
        match self {
            MarketCode::Domestic => "",
            MarketCode::Hk => "HK",
            MarketCode::Us => "US",
        }
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One symbol's entry in the allocation feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Bare code without market suffix.
    pub stock_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock_name: String,
    /// Raw feed market code; see [`MarketCode::from_feed`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub market: i64,
    /// Raw ratio units, normalised against the snapshot's market ratio.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_ratio: f64,
    /// Reference trade price, scaled by 10^9.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<i64>,
    /// Cost price, scaled by 10^9.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<i64>,
    /// Feed fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AllocationRecord {
    pub fn new(stock_code: &str, market: MarketCode, total_ratio: f64) -> Self {
        let market = match market {
            MarketCode::Domestic => 0,
            MarketCode::Hk => 1,
            MarketCode::Us => 2,
        };
        Self {
            stock_code: stock_code.to_string(),
            stock_name: String::new(),
            market,
            total_ratio,
            current_price: None,
            cost_price: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.stock_name = name.to_string();
        self
    }

    /// Set reference and cost prices from cent values.
    pub fn with_prices(mut self, reference: Price, cost: Price) -> Self {
        let scale = Price::FEED_SCALE / 100;
        self.current_price = Some(reference.0.saturating_mul(scale));
        self.cost_price = Some(cost.0.saturating_mul(scale));
        self
    }

    pub fn market_code(&self) -> MarketCode {
        MarketCode::from_feed(self.market)
    }

    /// Market-qualified symbol; the record's identity key.
    pub fn symbol(&self) -> Symbol {
        Symbol::qualified(&self.stock_code, self.market_code().suffix())
    }

    /// Reference price in cents, if the feed provided one.
    pub fn reference_price(&self) -> Option<Price> {
        self.current_price.map(Price::from_feed)
    }

    /// Cost price in cents, if the feed provided one.
    pub fn cost_basis(&self) -> Option<Price> {
        self.cost_price.map(Price::from_feed)
    }
}

/// Market-level aggregate from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Point-in-time capture of the allocation feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    #[serde(rename = "record_items", default)]
    pub records: Vec<AllocationRecord>,
    #[serde(default)]
    pub market_items: Vec<MarketItem>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AllocationSnapshot {
    /// Build a snapshot from records and an optional market ratio.
    pub fn new(records: Vec<AllocationRecord>, market_ratio: Option<f64>) -> Self {
        let market_items = market_ratio
            .map(|ratio| {
                vec![MarketItem {
                    ratio: Some(ratio),
                    extra: BTreeMap::new(),
                }]
            })
            .unwrap_or_default();
        Self {
            records,
            market_items,
            extra: BTreeMap::new(),
        }
    }

    /// Parse the feed's `data` object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Denominator for ratio percentages.
    ///
    /// Falls back to `1.0` when the feed has no market item, or its ratio is
    /// missing, zero, negative or non-finite.
    pub fn market_ratio(&self) -> f64 {
        self.market_items
            .first()
            .and_then(|m| m.ratio)
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0)
    }

    /// True when the record lists are structurally identical (market ratio ignored).
    pub fn same_records(&self, other: &AllocationSnapshot) -> bool {
        self.records == other.records
    }

    /// Check that every record has a code, a finite ratio and a unique symbol.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = FxHashSet::default();
        for (index, record) in self.records.iter().enumerate() {
            if record.stock_code.trim().is_empty() {
                return Err(SnapshotError::EmptySymbol { index });
            }
            let symbol = record.symbol();
            if !record.total_ratio.is_finite() {
                return Err(SnapshotError::NonFiniteRatio(symbol));
            }
            if !seen.insert(symbol.clone()) {
                return Err(SnapshotError::DuplicateSymbol(symbol));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_json() -> &'static str {
        r#"{
            "record_items": [
                {
                    "stock_code": "AAPL",
                    "stock_name": "Apple",
                    "market": 2,
                    "total_ratio": 12.5,
                    "current_price": 185500000000,
                    "cost_price": 150250000000,
                    "position_ratio": 0.4
                },
                {
                    "stock_code": "700",
                    "stock_name": "Tencent",
                    "market": 1,
                    "total_ratio": 3.0
                }
            ],
            "market_items": [{ "ratio": 50.0, "market": 2 }],
            "update_time": 1718000000
        }"#
    }

    #[test]
    fn parse_feed_document() {
        let snap = AllocationSnapshot::from_json(feed_json()).unwrap();
        assert_eq!(snap.records.len(), 2);
        assert_eq!(snap.market_ratio(), 50.0);

        let aapl = &snap.records[0];
        assert_eq!(aapl.symbol(), Symbol::new("AAPL.US"));
        assert_eq!(aapl.reference_price(), Some(Price(18_550)));
        assert_eq!(aapl.cost_basis(), Some(Price(15_025)));
        assert!(aapl.extra.contains_key("position_ratio"));

        let tencent = &snap.records[1];
        assert_eq!(tencent.symbol(), Symbol::new("700.HK"));
        assert_eq!(tencent.reference_price(), None);
    }

    #[test]
    fn round_trip_keeps_unknown_fields() {
        let snap = AllocationSnapshot::from_json(feed_json()).unwrap();
        let json = serde_json::to_string(&snap).unwrap();
        let back = AllocationSnapshot::from_json(&json).unwrap();
        assert_eq!(snap, back);
        assert!(json.contains("update_time"));
    }

    #[test]
    fn market_ratio_fallbacks() {
        assert_eq!(AllocationSnapshot::new(vec![], None).market_ratio(), 1.0);
        assert_eq!(AllocationSnapshot::new(vec![], Some(0.0)).market_ratio(), 1.0);
        assert_eq!(AllocationSnapshot::new(vec![], Some(f64::NAN)).market_ratio(), 1.0);
        assert_eq!(AllocationSnapshot::new(vec![], Some(80.0)).market_ratio(), 80.0);

        let null_ratio = AllocationSnapshot::from_json(r#"{"market_items":[{"ratio":null}]}"#)
            .unwrap();
        assert_eq!(null_ratio.market_ratio(), 1.0);
    }

    #[test]
    fn domestic_records_have_no_suffix() {
        let rec = AllocationRecord::new("600519", MarketCode::Domestic, 1.0);
        assert_eq!(rec.symbol().as_str(), "600519");
    }

    #[test]
    fn same_records_ignores_market_ratio() {
        let recs = vec![AllocationRecord::new("AAPL", MarketCode::Us, 10.0)];
        let a = AllocationSnapshot::new(recs.clone(), Some(100.0));
        let b = AllocationSnapshot::new(recs, Some(90.0));
        assert!(a.same_records(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn validate_rejects_duplicates() {
        let snap = AllocationSnapshot::new(
            vec![
                AllocationRecord::new("AAPL", MarketCode::Us, 10.0),
                AllocationRecord::new("AAPL", MarketCode::Us, 5.0),
            ],
            None,
        );
        assert_eq!(
            snap.validate(),
            Err(SnapshotError::DuplicateSymbol(Symbol::new("AAPL.US")))
        );
    }

    #[test]
    fn validate_allows_same_code_on_different_markets() {
        let snap = AllocationSnapshot::new(
            vec![
                AllocationRecord::new("ABC", MarketCode::Us, 10.0),
                AllocationRecord::new("ABC", MarketCode::Hk, 5.0),
            ],
            None,
        );
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_code() {
        let snap = AllocationSnapshot::new(vec![AllocationRecord::new(" ", MarketCode::Us, 1.0)], None);
        assert_eq!(snap.validate(), Err(SnapshotError::EmptySymbol { index: 0 }));
    }
}
