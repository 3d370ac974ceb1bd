//! JSONL audit trail logging.
//!
//! Each tracker cycle appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use allocsync::{AllocationSnapshot, ChangeEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::execution::{EntryResult, ExecutionReport};
use crate::exit_guard::{ExitOrder, ExitScan};

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, ts: DateTime<Utc>, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent { event, ts, data };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Where the scheduler sends audit events. Failures are the sink's concern.
pub trait AuditSink {
    fn record(&mut self, event: &'static str, ts: DateTime<Utc>, data: serde_json::Value);
}

impl AuditSink for AuditLog {
    fn record(&mut self, event: &'static str, ts: DateTime<Utc>, data: serde_json::Value) {
        if let Err(e) = self.log(event, ts, data) {
            log::warn!("audit write failed for {event}: {e}");
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    pub events: Vec<AuditEvent>,
}

impl MemoryAudit {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.event).collect()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&mut self, event: &'static str, ts: DateTime<Utc>, data: serde_json::Value) {
        self.events.push(AuditEvent { event, ts, data });
    }
}

// === Event helpers ===

pub fn cycle_started(sink: &mut dyn AuditSink, ts: DateTime<Utc>, phase: &str) {
    sink.record("cycle_started", ts, serde_json::json!({ "phase": phase }));
}

pub fn snapshot_fetched(sink: &mut dyn AuditSink, ts: DateTime<Utc>, snapshot: &AllocationSnapshot) {
    sink.record(
        "snapshot_fetched",
        ts,
        serde_json::json!({
            "records": snapshot.records.len(),
            "market_ratio": snapshot.market_ratio(),
        }),
    );
}

pub fn fetch_failed(sink: &mut dyn AuditSink, ts: DateTime<Utc>, error: &str) {
    sink.record("fetch_failed", ts, serde_json::json!({ "error": error }));
}

pub fn baseline_bootstrapped(sink: &mut dyn AuditSink, ts: DateTime<Utc>, records: usize) {
    sink.record(
        "baseline_bootstrapped",
        ts,
        serde_json::json!({ "records": records }),
    );
}

pub fn changes_detected(sink: &mut dyn AuditSink, ts: DateTime<Utc>, entries: &[ChangeEntry]) {
    let data: Vec<_> = entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "symbol": e.symbol.as_str(),
                "type": e.change_type.to_string(),
                "old_pct": e.old_ratio_pct,
                "new_pct": e.new_ratio_pct,
            })
        })
        .collect();
    sink.record("changes_detected", ts, serde_json::json!({ "changes": data }));
}

/// One `order_submitted` or `order_failed` event per execution outcome that
/// reached the broker.
pub fn execution(sink: &mut dyn AuditSink, ts: DateTime<Utc>, report: &ExecutionReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            EntryResult::Submitted { order, receipt } => {
                sink.record(
                    "order_submitted",
                    ts,
                    serde_json::json!({
                        "reason": outcome.entry.change_type.to_string(),
                        "order": order,
                        "order_id": receipt.order_id,
                    }),
                );
            }
            EntryResult::Failed(failure) => order_failed(sink, ts, failure),
            EntryResult::NoAction { .. } | EntryResult::Skipped { .. } => {}
        }
    }
}

pub fn exits(sink: &mut dyn AuditSink, ts: DateTime<Utc>, scan: &ExitScan) {
    for decision in scan.report.exits() {
        sink.record(
            "exit_triggered",
            ts,
            serde_json::json!({
                "symbol": decision.symbol.as_str(),
                "action": decision.action.to_string(),
                "pnl_ratio": decision.pnl_ratio,
                "detail": decision.detail,
            }),
        );
    }
    for order in &scan.orders {
        match order {
            ExitOrder::Submitted { order, receipt } => sink.record(
                "order_submitted",
                ts,
                serde_json::json!({
                    "reason": "EXIT",
                    "order": order,
                    "order_id": receipt.order_id,
                }),
            ),
            ExitOrder::Failed(failure) => order_failed(sink, ts, failure),
        }
    }
}

fn order_failed(
    sink: &mut dyn AuditSink,
    ts: DateTime<Utc>,
    failure: &crate::order::OrderSubmissionFailure,
) {
    sink.record(
        "order_failed",
        ts,
        serde_json::json!({
            "symbol": failure.symbol.as_str(),
            "side": failure.side.to_string(),
            "quantity": failure.quantity,
            "attempts": failure.attempts,
            "transport": failure.is_transport(),
            "error": failure.last_error.to_string(),
        }),
    );
}

pub fn baseline_committed(sink: &mut dyn AuditSink, ts: DateTime<Utc>, records: usize) {
    sink.record(
        "baseline_committed",
        ts,
        serde_json::json!({ "records": records }),
    );
}

pub fn baseline_persist_failed(
    sink: &mut dyn AuditSink,
    ts: DateTime<Utc>,
    records: usize,
    error: &str,
) {
    sink.record(
        "baseline_persist_failed",
        ts,
        serde_json::json!({ "records": records, "error": error }),
    );
}
