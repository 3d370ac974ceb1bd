// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Property-based tests for diffing and sizing invariants.

use allocsync::{
    AllocationRecord, AllocationSnapshot, ChangeEntry, ChangeType, DEAD_BAND, MATERIALITY_PCT,
    MarketCode, Price, Symbol, diff, translate,
};
use allocsync::translate::target_quantity;
use proptest::prelude::*;

/// Generate a market code
fn market_strategy() -> impl Strategy<Value = MarketCode> {
    prop_oneof![Just(MarketCode::Us), Just(MarketCode::Hk), Just(MarketCode::Domestic)]
}

/// Generate a record from a small code universe so snapshots overlap
fn record_strategy() -> impl Strategy<Value = AllocationRecord> {
    (0u8..12, market_strategy(), 0.0f64..50.0)
        .prop_map(|(code, market, ratio)| AllocationRecord::new(&format!("C{code}"), market, ratio))
}

/// Generate a snapshot with unique symbols
fn snapshot_strategy() -> impl Strategy<Value = AllocationSnapshot> {
    (prop::collection::vec(record_strategy(), 0..15), 1.0f64..200.0).prop_map(|(records, ratio)| {
        let mut seen = std::collections::HashSet::new();
        let records: Vec<_> = records
            .into_iter()
            .filter(|r| seen.insert(r.symbol()))
            .collect();
        AllocationSnapshot::new(records, Some(ratio))
    })
}

fn sorted_symbols(records: &[AllocationRecord]) -> Vec<Symbol> {
    let mut out: Vec<_> = records.iter().map(|r| r.symbol()).collect();
    out.sort();
    out
}

fn entry(change_type: ChangeType, new_pct: f64) -> ChangeEntry {
    ChangeEntry {
        symbol: Symbol::new("AAA.US"),
        name: "AAA".into(),
        market: MarketCode::Us,
        old_ratio_pct: 0.0,
        new_ratio_pct: new_pct,
        reference_price: Price(100_00),
        cost_price: Price(100_00),
        change_type,
    }
}

proptest! {
    #[test]
    fn diff_then_inverse_restores_records(a in snapshot_strategy(), b in snapshot_strategy()) {
        let d = diff(Some(&a), &b);

        let forward = d.apply(&a.records);
        prop_assert_eq!(sorted_symbols(&forward), sorted_symbols(&b.records));

        let back = d.inverted().apply(&forward);
        prop_assert_eq!(back.len(), a.records.len());
        prop_assert_eq!(sorted_symbols(&back), sorted_symbols(&a.records));
        for rec in &a.records {
            let restored = back.iter().find(|r| r.symbol() == rec.symbol()).unwrap();
            prop_assert_eq!(restored, rec);
        }
    }

    #[test]
    fn self_diff_is_empty(a in snapshot_strategy()) {
        let d = diff(Some(&a), &a);
        prop_assert!(d.is_empty());
        prop_assert!(d.classify().is_empty());
    }

    #[test]
    fn classified_entries_are_material(a in snapshot_strategy(), b in snapshot_strategy()) {
        for e in diff(Some(&a), &b).classify() {
            prop_assert!(e.delta_pct().abs() >= MATERIALITY_PCT);
            match e.change_type {
                ChangeType::Buy => prop_assert!(e.delta_pct() > 0.0),
                ChangeType::Sell => prop_assert!(e.delta_pct() < 0.0),
                ChangeType::Open => prop_assert_eq!(e.old_ratio_pct, 0.0),
                ChangeType::Close => prop_assert_eq!(e.new_ratio_pct, 0.0),
            }
        }
    }

    #[test]
    fn dead_band_holds(held in 0i64..200, target_pct in 0.0f64..100.0) {
        // $10,000 balance at $100.00: each share is 1% of balance
        let balance = Price(10_000_00);
        let price = Price(100_00);
        let e = entry(ChangeType::Buy, target_pct);
        let delta = translate(&e, held, price, balance);

        let current_ratio = held as f64 / 100.0;
        if (current_ratio - target_pct / 100.0).abs() < DEAD_BAND {
            prop_assert_eq!(delta, 0);
        } else {
            let target_qty = target_quantity(target_pct / 100.0, price, balance);
            prop_assert_eq!(delta, target_qty - held);
        }
    }

    #[test]
    fn open_buys_never_exceed_balance(target_pct in 0.0f64..100.0, cents in 1i64..1_000_000) {
        let balance = Price(10_000_00);
        let qty = translate(&entry(ChangeType::Open, target_pct), 0, Price(cents), balance);
        prop_assert!(qty >= 0);
        prop_assert!(qty * cents <= balance.0);
    }
}
