//! Market trading-hours windows and the polling interval they imply.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Market whose session gates the polling cadence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    #[default]
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "HK")]
    Hk,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Us => write!(f, "US"),
            Market::Hk => write!(f, "HK"),
        }
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Market::Us),
            "HK" => Ok(Market::Hk),
            other => Err(format!("unknown market '{other}' (expected US or HK)")),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid wall-clock time")
}

/// A daily session window in a market's local time zone.
///
/// Both ends are inclusive at minute granularity: a 04:00–20:00 window is open
/// from 04:00:00 through 20:00:59 local time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradingHours {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl TradingHours {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime) -> Self {
        Self { tz, open, close }
    }

    /// Extended session for the given market.
    ///
    /// US: 04:00–20:00 America/New_York (pre-market through after-hours).
    /// HK: 09:30–16:00 Asia/Hong_Kong.
    pub fn for_market(market: Market) -> Self {
        match market {
            Market::Us => Self::new(chrono_tz::America::New_York, hm(4, 0), hm(20, 0)),
            Market::Hk => Self::new(chrono_tz::Asia::Hong_Kong, hm(9, 30), hm(16, 0)),
        }
    }

    /// Whether the session is open at the given instant.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.tz);
        let minute = (local.hour(), local.minute());
        (self.open.hour(), self.open.minute()) <= minute
            && minute <= (self.close.hour(), self.close.minute())
    }
}

/// Which cadence the scheduler runs at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    ActiveHours,
    OffHours,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::ActiveHours => write!(f, "active hours"),
            SessionPhase::OffHours => write!(f, "off hours"),
        }
    }
}

/// Chooses the inter-cycle sleep from the trading session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollingPolicy {
    pub hours: TradingHours,
    /// Sleep while the session is open.
    pub active: Duration,
    /// Sleep outside the session.
    pub off_hours: Duration,
}

impl PollingPolicy {
    /// Default sleep outside trading hours.
    pub const DEFAULT_OFF_HOURS: Duration = Duration::from_secs(3600);

    pub fn new(market: Market, active: Duration) -> Self {
        Self {
            hours: TradingHours::for_market(market),
            active,
            off_hours: Self::DEFAULT_OFF_HOURS,
        }
    }

    pub fn with_off_hours(mut self, off_hours: Duration) -> Self {
        self.off_hours = off_hours;
        self
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> SessionPhase {
        if self.hours.is_open_at(now) {
            SessionPhase::ActiveHours
        } else {
            SessionPhase::OffHours
        }
    }

    pub fn interval_at(&self, now: DateTime<Utc>) -> Duration {
        match self.phase_at(now) {
            SessionPhase::ActiveHours => self.active,
            SessionPhase::OffHours => self.off_hours,
        }
    }
}
