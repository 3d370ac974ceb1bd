//! The polling loop: exit scan → fetch → diff → execute → commit → sleep.
//!
//! The committed baseline is threaded through [`Scheduler::run_cycle`]
//! explicitly. The store is only written on bootstrap and after a cycle that
//! produced material changes and got through execution.

use std::fmt;
use std::time::Duration;

use allocsync::{AllocationSnapshot, ChangeEntry, PollingPolicy, Price, SessionPhase, diff};
use allocsync_broker::Broker;
use allocsync_risk::ExitEngine;
use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::audit::{self, AuditSink};
use crate::clock::Clock;
use crate::config::{Config, OrdersConfig};
use crate::error::{Error, Result};
use crate::execution::{self, ExecutionReport};
use crate::exit_guard::{ExitGuard, ExitScan};
use crate::feed::Feed;
use crate::notify::{self, Notifier};
use crate::order::OrderController;
use crate::store::BaselineStore;

/// External collaborators, borrowed for the scheduler's lifetime.
pub struct Collaborators<'a> {
    pub feed: &'a dyn Feed,
    pub broker: &'a dyn Broker,
    pub store: &'a dyn BaselineStore,
    pub notifier: &'a dyn Notifier,
    pub clock: &'a dyn Clock,
}

/// Tuning that stays fixed for a run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub balance: Price,
    pub policy: PollingPolicy,
    pub orders: OrdersConfig,
    pub exits: ExitEngine,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let exits = ExitEngine::try_new(config.exits.clone())
            .map_err(|msg| Error::Config(format!("exits: {msg}")))?;
        Ok(Self {
            balance: config.balance(),
            policy: config.polling_policy(),
            orders: config.orders.clone(),
            exits,
        })
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Feed unavailable; baseline untouched.
    FetchFailed(String),
    /// No baseline existed; the fetched snapshot became the baseline.
    Bootstrapped { records: usize },
    /// Record lists identical to the baseline.
    Unchanged,
    /// Records differ but no change cleared the materiality threshold.
    Immaterial,
    /// Material changes executed and committed.
    Rebalanced {
        entries: Vec<ChangeEntry>,
        execution: ExecutionReport,
    },
    /// Positions could not be listed; nothing executed or committed.
    ExecutionAborted(String),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::FetchFailed(e) => write!(f, "feed unavailable: {e}"),
            CycleOutcome::Bootstrapped { records } => {
                write!(f, "baseline bootstrapped with {records} records")
            }
            CycleOutcome::Unchanged => write!(f, "no change"),
            CycleOutcome::Immaterial => write!(f, "changes below materiality threshold"),
            CycleOutcome::Rebalanced { entries, execution } => {
                writeln!(f, "{} change(s):", entries.len())?;
                for e in entries {
                    writeln!(f, "  {e}")?;
                }
                write!(f, "{execution}")
            }
            CycleOutcome::ExecutionAborted(e) => write!(f, "execution aborted: {e}"),
        }
    }
}

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Baseline to carry into the next cycle.
    pub baseline: Option<AllocationSnapshot>,
    pub outcome: CycleOutcome,
    pub phase: SessionPhase,
    /// Sleep before the next cycle.
    pub sleep: Duration,
    /// `None` if positions could not be listed for the exit scan.
    pub exits: Option<ExitScan>,
}

pub struct Scheduler<'a> {
    deps: Collaborators<'a>,
    audit: &'a mut dyn AuditSink,
    settings: Settings,
}

impl<'a> Scheduler<'a> {
    pub fn new(deps: Collaborators<'a>, audit: &'a mut dyn AuditSink, settings: Settings) -> Self {
        Self {
            deps,
            audit,
            settings,
        }
    }

    /// One cycle against the persisted baseline, without sleeping.
    pub fn run_once(&mut self) -> CycleReport {
        let baseline = self.deps.store.load();
        let now = self.deps.clock.now();
        self.run_cycle(baseline, now)
    }

    /// Loop until `max_cycles` cycles have run (forever if `None`).
    ///
    /// Sleeps between cycles, not after the last one. Returns the baseline
    /// the loop ended with.
    pub fn run(&mut self, max_cycles: Option<usize>) -> Option<AllocationSnapshot> {
        let mut baseline = self.deps.store.load();
        let mut cycles = 0usize;
        loop {
            let now = self.deps.clock.now();
            let report = self.run_cycle(baseline, now);
            info!(
                "cycle {}: {}; next in {}s ({})",
                cycles + 1,
                report.outcome,
                report.sleep.as_secs(),
                report.phase,
            );
            baseline = report.baseline;
            cycles += 1;
            if max_cycles.is_some_and(|max| cycles >= max) {
                return baseline;
            }
            self.deps.clock.sleep(report.sleep);
        }
    }

    /// Run one cycle at `now` against `baseline`.
    pub fn run_cycle(
        &mut self,
        baseline: Option<AllocationSnapshot>,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let phase = self.settings.policy.phase_at(now);
        let sleep = self.settings.policy.interval_at(now);
        audit::cycle_started(self.audit, now, &phase.to_string());

        let controller = OrderController::from_config(
            &self.settings.orders,
            self.deps.broker,
            self.deps.notifier,
            self.deps.clock,
        );

        // 1. Exit scan, independent of the feed
        let exits = match ExitGuard::new(&self.settings.exits, self.deps.broker, &controller)
            .scan(self.settings.balance)
        {
            Ok(scan) => {
                audit::exits(self.audit, now, &scan);
                Some(scan)
            }
            Err(e) => {
                warn!("exit scan skipped: {e}");
                None
            }
        };

        let report = |baseline, outcome| CycleReport {
            baseline,
            outcome,
            phase,
            sleep,
            exits: exits.clone(),
        };

        // 2. Fetch
        let fetched = match self.deps.feed.fetch() {
            Ok(s) => s,
            Err(e) => {
                warn!("{e}");
                audit::fetch_failed(self.audit, now, &e.to_string());
                return report(baseline, CycleOutcome::FetchFailed(e.to_string()));
            }
        };
        audit::snapshot_fetched(self.audit, now, &fetched);

        // 3. Bootstrap
        let Some(current) = baseline else {
            let records = fetched.records.len();
            info!("no baseline yet, bootstrapping with {records} records");
            if self.commit(&fetched, now) {
                audit::baseline_bootstrapped(self.audit, now, records);
            }
            return report(Some(fetched), CycleOutcome::Bootstrapped { records });
        };

        // 4. Record-level equality
        if current.same_records(&fetched) {
            return report(Some(current), CycleOutcome::Unchanged);
        }

        // 5. Diff and classify
        let entries = diff(Some(&current), &fetched).classify();
        if entries.is_empty() {
            info!("feed changed but nothing is material; baseline kept");
            return report(Some(current), CycleOutcome::Immaterial);
        }
        for entry in &entries {
            info!("change: {entry}");
        }
        audit::changes_detected(self.audit, now, &entries);

        // 6. Execute
        let execution = match execution::execute_changes(
            &entries,
            self.deps.broker,
            &controller,
            self.settings.balance,
        ) {
            Ok(r) => r,
            Err(e) => {
                error!("execution aborted: {e}");
                return report(Some(current), CycleOutcome::ExecutionAborted(e.to_string()));
            }
        };
        audit::execution(self.audit, now, &execution);

        // 7. Notify and commit
        notify::deliver(self.deps.notifier, &notify::change_report(&entries, now));
        if self.commit(&fetched, now) {
            audit::baseline_committed(self.audit, now, fetched.records.len());
        }

        report(
            Some(fetched),
            CycleOutcome::Rebalanced { entries, execution },
        )
    }

    /// Persist `snapshot`. A failed save is audited and reported as `false`;
    /// the caller still carries the snapshot forward in memory.
    fn commit(&mut self, snapshot: &AllocationSnapshot, now: DateTime<Utc>) -> bool {
        match self.deps.store.save(snapshot) {
            Ok(()) => true,
            Err(e) => {
                error!("baseline not persisted: {e}");
                audit::baseline_persist_failed(
                    self.audit,
                    now,
                    snapshot.records.len(),
                    &e.to_string(),
                );
                false
            }
        }
    }
}
