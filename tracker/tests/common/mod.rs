//! Recording test doubles for the tracker's collaborator traits.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use allocsync::{AllocationRecord, AllocationSnapshot, MarketCode};
use allocsync_tracker::clock::Clock;
use allocsync_tracker::error::{Error, Result};
use allocsync_tracker::feed::Feed;
use allocsync_tracker::notify::{Notification, Notifier, NotifyError};
use allocsync_tracker::store::BaselineStore;
use chrono::{DateTime, TimeZone, Utc};

/// Serves queued responses; repeats the last one when the queue runs dry.
pub struct ScriptedFeed {
    queue: RefCell<VecDeque<Option<AllocationSnapshot>>>,
    last: RefCell<Option<AllocationSnapshot>>,
    pub calls: Cell<usize>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            last: RefCell::new(None),
            calls: Cell::new(0),
        }
    }

    pub fn then(self, snapshot: AllocationSnapshot) -> Self {
        self.queue.borrow_mut().push_back(Some(snapshot));
        self
    }

    pub fn then_fail(self) -> Self {
        self.queue.borrow_mut().push_back(None);
        self
    }
}

impl Feed for ScriptedFeed {
    fn fetch(&self) -> Result<AllocationSnapshot> {
        self.calls.set(self.calls.get() + 1);
        let next = self.queue.borrow_mut().pop_front();
        let response = match next {
            Some(r) => {
                *self.last.borrow_mut() = r.clone();
                r
            }
            None => self.last.borrow().clone(),
        };
        response.ok_or_else(|| Error::Fetch("feed timed out".into()))
    }
}

/// In-memory baseline store that counts save attempts.
#[derive(Default)]
pub struct MemoryStore {
    pub snapshot: RefCell<Option<AllocationSnapshot>>,
    pub saves: Cell<usize>,
    /// Every save fails with a disk-full error and leaves `snapshot` alone.
    pub fail_saves: bool,
}

impl MemoryStore {
    pub fn with(snapshot: AllocationSnapshot) -> Self {
        Self {
            snapshot: RefCell::new(Some(snapshot)),
            ..Self::default()
        }
    }

    pub fn failing(snapshot: Option<AllocationSnapshot>) -> Self {
        Self {
            snapshot: RefCell::new(snapshot),
            fail_saves: true,
            ..Self::default()
        }
    }
}

impl BaselineStore for MemoryStore {
    fn load(&self) -> Option<AllocationSnapshot> {
        self.snapshot.borrow().clone()
    }

    fn save(&self, snapshot: &AllocationSnapshot) -> Result<()> {
        self.saves.set(self.saves.get() + 1);
        if self.fail_saves {
            return Err(Error::Store {
                path: PathBuf::from("/data/baseline.json"),
                source: io::Error::other("disk full"),
            });
        }
        *self.snapshot.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.snapshot.borrow_mut() = None;
        Ok(())
    }
}

/// Collects every notification; a failing notifier still records the attempt.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<Notification>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|n| n.subject.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &Notification) -> std::result::Result<(), NotifyError> {
        self.sent.borrow_mut().push(message.clone());
        if self.fail {
            return Err(NotifyError::Status(500));
        }
        Ok(())
    }
}

/// Fixed wall clock; sleeps are recorded and advance the clock.
pub struct FakeClock {
    now: Cell<DateTime<Utc>>,
    pub sleeps: RefCell<Vec<Duration>>,
}

impl FakeClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps.borrow().len()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        if let Ok(d) = chrono::Duration::from_std(duration) {
            self.now.set(self.now.get() + d);
        }
    }
}

/// Tuesday 2024-06-11 10:00 in New York (14:00 UTC): US session open.
pub fn us_session() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 11, 14, 0, 0).unwrap()
}

/// Tuesday 2024-06-11 22:00 in New York (02:00 UTC next day): US session closed.
pub fn us_night() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 12, 2, 0, 0).unwrap()
}

pub fn us(code: &str, ratio: f64) -> AllocationRecord {
    AllocationRecord::new(code, MarketCode::Us, ratio).with_name(code)
}

pub fn snapshot(records: Vec<AllocationRecord>) -> AllocationSnapshot {
    AllocationSnapshot::new(records, Some(100.0))
}
