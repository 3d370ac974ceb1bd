//! BASELINE→FETCHED snapshot diff and change classification.
//!
//! [`diff`] finds records that were added, removed or modified between two
//! snapshots. [`SnapshotDiff::classify`] turns those raw pairs into
//! [`ChangeEntry`] values, dropping anything whose ratio moved by less than
//! [`MATERIALITY_PCT`] percentage points.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::snapshot::{AllocationRecord, AllocationSnapshot, MarketCode};
use crate::{Price, Symbol};

/// Minimum ratio move, in percentage points, for a change to be acted on.
pub const MATERIALITY_PCT: f64 = 1.0;

/// A record-level difference between two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordChange {
    /// Present only in the new snapshot.
    Added(AllocationRecord),
    /// Present only in the old snapshot.
    Removed(AllocationRecord),
    /// Present in both with differing fields.
    Modified {
        old: AllocationRecord,
        new: AllocationRecord,
    },
}

impl RecordChange {
    pub fn before(&self) -> Option<&AllocationRecord> {
        match self {
            RecordChange::Added(_) => None,
            RecordChange::Removed(old) | RecordChange::Modified { old, .. } => Some(old),
        }
    }

    pub fn after(&self) -> Option<&AllocationRecord> {
        match self {
            RecordChange::Removed(_) => None,
            RecordChange::Added(new) | RecordChange::Modified { new, .. } => Some(new),
        }
    }

    /// The record describing the symbol, preferring the newer side.
    fn latest(&self) -> &AllocationRecord {
        match self {
            RecordChange::Added(rec) | RecordChange::Removed(rec) => rec,
            RecordChange::Modified { new, .. } => new,
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.latest().symbol()
    }

    /// The change that undoes this one.
    pub fn inverted(&self) -> RecordChange {
        match self {
            RecordChange::Added(rec) => RecordChange::Removed(rec.clone()),
            RecordChange::Removed(rec) => RecordChange::Added(rec.clone()),
            RecordChange::Modified { old, new } => RecordChange::Modified {
                old: new.clone(),
                new: old.clone(),
            },
        }
    }
}

/// Output of [`diff`]: raw record changes plus the ratio denominator.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDiff {
    pub changes: Vec<RecordChange>,
    pub market_ratio: f64,
}

/// Compare a baseline snapshot (if any) against a freshly fetched one.
///
/// Removals and modifications are emitted in the old snapshot's record order,
/// followed by additions in the new snapshot's order. Records are keyed by
/// their market-qualified symbol.
pub fn diff(old: Option<&AllocationSnapshot>, new: &AllocationSnapshot) -> SnapshotDiff {
    let old_records: &[AllocationRecord] = old.map(|s| s.records.as_slice()).unwrap_or(&[]);

    let old_map: FxHashMap<Symbol, &AllocationRecord> =
        old_records.iter().map(|r| (r.symbol(), r)).collect();
    let new_map: FxHashMap<Symbol, &AllocationRecord> =
        new.records.iter().map(|r| (r.symbol(), r)).collect();

    let mut changes = Vec::new();

    // 1. Removed or modified
    for old_rec in old_records {
        match new_map.get(&old_rec.symbol()) {
            None => changes.push(RecordChange::Removed(old_rec.clone())),
            Some(&new_rec) if new_rec != old_rec => changes.push(RecordChange::Modified {
                old: old_rec.clone(),
                new: new_rec.clone(),
            }),
            Some(_) => {}
        }
    }

    // 2. Added
    for new_rec in &new.records {
        if !old_map.contains_key(&new_rec.symbol()) {
            changes.push(RecordChange::Added(new_rec.clone()));
        }
    }

    SnapshotDiff {
        changes,
        market_ratio: new.market_ratio(),
    }
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The diff that maps the new record set back onto the old one.
    pub fn inverted(&self) -> SnapshotDiff {
        SnapshotDiff {
            changes: self.changes.iter().map(RecordChange::inverted).collect(),
            market_ratio: self.market_ratio,
        }
    }

    /// Apply this diff to a record list.
    ///
    /// Removed symbols are dropped, modified ones replaced in place and added
    /// ones appended.
    pub fn apply(&self, base: &[AllocationRecord]) -> Vec<AllocationRecord> {
        let by_symbol: FxHashMap<Symbol, &RecordChange> = self
            .changes
            .iter()
            .filter(|c| !matches!(c, RecordChange::Added(_)))
            .map(|c| (c.symbol(), c))
            .collect();

        let mut out: Vec<AllocationRecord> = base
            .iter()
            .filter_map(|rec| match by_symbol.get(&rec.symbol()) {
                Some(RecordChange::Removed(_)) => None,
                Some(RecordChange::Modified { new, .. }) => Some(new.clone()),
                _ => Some(rec.clone()),
            })
            .collect();

        out.extend(self.changes.iter().filter_map(|c| match c {
            RecordChange::Added(rec) => Some(rec.clone()),
            _ => None,
        }));
        out
    }

    /// Material change entries, in diff order.
    pub fn classify(&self) -> Vec<ChangeEntry> {
        self.changes
            .iter()
            .filter_map(|c| classify(c, self.market_ratio))
            .collect()
    }
}

/// Kind of allocation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// New symbol in the allocation.
    Open,
    /// Symbol dropped from the allocation.
    Close,
    /// Ratio increased.
    Buy,
    /// Ratio decreased.
    Sell,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Open => write!(f, "OPEN"),
            ChangeType::Close => write!(f, "CLOSE"),
            ChangeType::Buy => write!(f, "BUY"),
            ChangeType::Sell => write!(f, "SELL"),
        }
    }
}

/// One material allocation change, ready for sizing and notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEntry {
    pub symbol: Symbol,
    pub name: String,
    pub market: MarketCode,
    pub old_ratio_pct: f64,
    pub new_ratio_pct: f64,
    pub reference_price: Price,
    pub cost_price: Price,
    pub change_type: ChangeType,
}

impl ChangeEntry {
    /// Signed ratio move in percentage points.
    pub fn delta_pct(&self) -> f64 {
        self.new_ratio_pct - self.old_ratio_pct
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {:.2}% -> {:.2}% [{}] ref {}",
            self.name,
            self.symbol,
            self.old_ratio_pct,
            self.new_ratio_pct,
            self.change_type,
            self.reference_price,
        )
    }
}

/// Classify one record change against the new snapshot's market ratio.
///
/// Both percentages use the same denominator. Returns `None` when the ratio
/// moved by less than [`MATERIALITY_PCT`].
pub fn classify(change: &RecordChange, market_ratio: f64) -> Option<ChangeEntry> {
    let denom = if market_ratio.is_finite() && market_ratio > 0.0 {
        market_ratio
    } else {
        1.0
    };

    let old_pct = change.before().map_or(0.0, |r| r.total_ratio / denom * 100.0);
    let new_pct = change.after().map_or(0.0, |r| r.total_ratio / denom * 100.0);

    if (new_pct - old_pct).abs() < MATERIALITY_PCT {
        return None;
    }

    let change_type = match change {
        RecordChange::Added(_) => ChangeType::Open,
        RecordChange::Removed(_) => ChangeType::Close,
        RecordChange::Modified { .. } if new_pct > old_pct => ChangeType::Buy,
        RecordChange::Modified { .. } => ChangeType::Sell,
    };

    let latest = change.latest();
    let price_of = |f: fn(&AllocationRecord) -> Option<Price>| {
        change
            .after()
            .and_then(f)
            .or_else(|| change.before().and_then(f))
            .unwrap_or(Price::ZERO)
    };

    Some(ChangeEntry {
        symbol: latest.symbol(),
        name: latest.stock_name.clone(),
        market: latest.market_code(),
        old_ratio_pct: old_pct,
        new_ratio_pct: new_pct,
        reference_price: price_of(AllocationRecord::reference_price),
        cost_price: price_of(AllocationRecord::cost_basis),
        change_type,
    })
}
