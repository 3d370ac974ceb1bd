// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Edge-case and scenario tests across the public API.

use allocsync::{
    AllocationRecord, AllocationSnapshot, ChangeType, MarketCode, Price, Side, Symbol, diff, plan,
    translate,
};

fn us(code: &str, ratio: f64) -> AllocationRecord {
    AllocationRecord::new(code, MarketCode::Us, ratio).with_name(code)
}

// ============================================================================
// Feed documents
// ============================================================================

#[test]
fn empty_feed_document() {
    let snap = AllocationSnapshot::from_json("{}").unwrap();
    assert!(snap.records.is_empty());
    assert_eq!(snap.market_ratio(), 1.0);
    assert!(diff(None, &snap).is_empty());
}

#[test]
fn negative_market_ratio_falls_back_to_one() {
    let snap = AllocationSnapshot::new(vec![us("AAA", 0.2)], Some(-5.0));
    let entries = diff(None, &snap).classify();
    assert_eq!(entries.len(), 1);
    assert!((entries[0].new_ratio_pct - 20.0).abs() < 1e-9);
}

#[test]
fn feed_prices_convert_to_cents() {
    let json = r#"{
        "record_items": [
            {"stock_code": "AAA", "stock_name": "Triple A", "market": 2,
             "total_ratio": 10, "current_price": 50125000000, "cost_price": 48000000000}
        ],
        "market_items": [{"ratio": 100}]
    }"#;
    let snap = AllocationSnapshot::from_json(json).unwrap();
    let entries = diff(None, &snap).classify();
    assert_eq!(entries[0].reference_price, Price(50_13));
    assert_eq!(entries[0].cost_price, Price(48_00));
}

#[test]
fn null_fields_fall_back_to_defaults() {
    let json = r#"{
        "record_items": [
            {"stock_code": "AAA", "stock_name": null, "market": null, "total_ratio": 10},
            {"stock_code": "BBB", "stock_name": "B", "market": 2, "total_ratio": null}
        ],
        "market_items": [{"ratio": 100}]
    }"#;
    let snap = AllocationSnapshot::from_json(json).unwrap();
    assert_eq!(snap.records[0].stock_name, "");
    assert_eq!(snap.records[0].market, 0);
    assert_eq!(snap.records[1].total_ratio, 0.0);
    assert!(snap.validate().is_ok());
}

#[test]
fn garbage_feed_price_does_not_overflow() {
    let mut record = us("AAA", 10.0);
    record.current_price = Some(i64::MAX);
    record.cost_price = Some(i64::MIN);
    let snap = AllocationSnapshot::new(vec![record], Some(100.0));
    let entries = diff(None, &snap).classify();
    assert_eq!(entries[0].reference_price, Price(i64::MAX / 10_000_000));
    assert_eq!(entries[0].cost_price, Price(i64::MIN / 10_000_000));
}

#[test]
fn market_ratio_only_change_keeps_records_equal() {
    let a = AllocationSnapshot::new(vec![us("AAA", 10.0)], Some(100.0));
    let b = AllocationSnapshot::new(vec![us("AAA", 10.0)], Some(120.0));
    assert!(a.same_records(&b));
    assert!(diff(Some(&a), &b).is_empty());
}

#[test]
fn same_code_on_two_markets_are_distinct_symbols() {
    let old = AllocationSnapshot::new(
        vec![AllocationRecord::new("ABC", MarketCode::Us, 10.0)],
        Some(100.0),
    );
    let new = AllocationSnapshot::new(
        vec![AllocationRecord::new("ABC", MarketCode::Hk, 10.0)],
        Some(100.0),
    );
    let entries = diff(Some(&old), &new).classify();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].change_type, ChangeType::Close);
    assert_eq!(entries[0].symbol, Symbol::new("ABC.US"));
    assert_eq!(entries[1].change_type, ChangeType::Open);
    assert_eq!(entries[1].symbol, Symbol::new("ABC.HK"));
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn open_position_scenario() {
    let old = AllocationSnapshot::new(vec![], Some(100.0));
    let new = AllocationSnapshot::new(vec![us("AAA", 10.0)], Some(100.0));

    let entries = diff(Some(&old), &new).classify();
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert_eq!(e.change_type, ChangeType::Open);
    assert_eq!(e.new_ratio_pct, 10.0);

    let balance = Price(25_000_00);
    let price = Price(37_00);
    // floor(25_000 * 0.10 / 37) = 67
    assert_eq!(translate(e, 0, price, balance), 67);
    let intent = plan(e, 0, price, balance).unwrap();
    assert_eq!(intent.side, Side::Buy);
    assert_eq!(intent.quantity, 67);
}

#[test]
fn close_position_scenario() {
    let old = AllocationSnapshot::new(vec![us("BBB", 8.0)], Some(100.0));
    let new = AllocationSnapshot::new(vec![], Some(100.0));

    let entries = diff(Some(&old), &new).classify();
    let e = &entries[0];
    assert_eq!(e.change_type, ChangeType::Close);
    assert_eq!(translate(e, 33, Price(20_00), Price(10_000_00)), -33);
}

#[test]
fn materiality_boundary() {
    let old = AllocationSnapshot::new(vec![us("AAA", 10.0), us("BBB", 10.0)], Some(100.0));
    let new = AllocationSnapshot::new(vec![us("AAA", 10.9), us("BBB", 11.5)], Some(100.0));
    let entries = diff(Some(&old), &new).classify();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].symbol, Symbol::new("BBB.US"));
    assert_eq!(entries[0].change_type, ChangeType::Buy);
}

#[test]
fn non_positive_balance_sizes_nothing() {
    let new = AllocationSnapshot::new(vec![us("AAA", 10.0)], Some(100.0));
    let e = &diff(None, &new).classify()[0];
    assert_eq!(translate(e, 0, Price(10_00), Price(-1)), 0);
    assert!(plan(e, 0, Price(10_00), Price::ZERO).is_none());
}
