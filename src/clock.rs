//! Batch clock with an injectable "now".
//!
//! Scoring batches resolve "today" exactly once per invocation and pass the
//! resulting date down, so a batch that straddles midnight stays internally
//! consistent. The clock is a value handed to callers rather than ambient
//! state, which also gives tests a frozen moment to pin against.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Seoul;

/// Wall clock resolved in a display timezone.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
    fixed: Option<DateTime<Utc>>,
}

impl Clock {
    /// Real clock in the given timezone.
    pub fn system(tz: Tz) -> Self {
        Clock { tz, fixed: None }
    }

    /// Frozen clock for tests and replays.
    pub fn fixed(now: DateTime<Utc>, tz: Tz) -> Self {
        Clock {
            tz,
            fixed: Some(now),
        }
    }

    /// Resolve a timezone by IANA name, falling back to Asia/Seoul.
    pub fn system_in(tz_name: &str) -> Self {
        let tz = match tz_name.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("unknown timezone {tz_name:?}, using {DEFAULT_TIMEZONE}");
                DEFAULT_TIMEZONE
            }
        };
        Clock::system(tz)
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.fixed.unwrap_or_else(Utc::now)
    }

    /// Calendar date "today" in the display timezone.
    pub fn today(&self) -> NaiveDate {
        self.now_utc().with_timezone(&self.tz).date_naive()
    }

    /// `YYYY-MM-DD` in the display timezone, the sheets' date cell format.
    pub fn today_label(&self) -> String {
        self.today().format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD HH:MM:SS` in the display timezone, used for log rows
    /// and Last Modified cells.
    pub fn timestamp_label(&self) -> String {
        self.now_utc()
            .with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::system(DEFAULT_TIMEZONE)
    }
}
