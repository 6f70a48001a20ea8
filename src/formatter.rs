//! Size and modification-date formatting for the metadata box.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Local, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::db::{self, DbResult};
use crate::events::{ChangeEvent, EventTarget, Listener, ListenerId};

pub const USE_24_HOUR_CLOCK_KEY: &str = "use24HourClock";

const SIZE_UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateTimeFormat {
    #[default]
    TwelveHour,
    TwentyFourHour,
}

impl DateTimeFormat {
    fn time_pattern(self) -> &'static str {
        match self {
            Self::TwelveHour => "%-I:%M %p",
            Self::TwentyFourHour => "%H:%M",
        }
    }
}

/// Formats sizes and dates and announces clock-preference changes.
#[derive(Default)]
pub struct FileMetadataFormatter {
    use_24_hour: AtomicBool,
    events: EventTarget,
}

impl FileMetadataFormatter {
    pub fn new(format: DateTimeFormat) -> Self {
        let formatter = Self::default();
        formatter
            .use_24_hour
            .store(format == DateTimeFormat::TwentyFourHour, Ordering::SeqCst);
        formatter
    }

    /// Reads the clock preference from settings, defaulting to 12-hour.
    pub fn from_settings(conn: &Connection) -> DbResult<Self> {
        let format = match db::get_setting_bool(conn, USE_24_HOUR_CLOCK_KEY)? {
            Some(true) => DateTimeFormat::TwentyFourHour,
            _ => DateTimeFormat::TwelveHour,
        };
        Ok(Self::new(format))
    }

    pub fn persist(&self, conn: &Connection) -> DbResult<()> {
        db::set_setting_bool(
            conn,
            USE_24_HOUR_CLOCK_KEY,
            self.date_time_format() == DateTimeFormat::TwentyFourHour,
        )
    }

    pub fn date_time_format(&self) -> DateTimeFormat {
        if self.use_24_hour.load(Ordering::SeqCst) {
            DateTimeFormat::TwentyFourHour
        } else {
            DateTimeFormat::TwelveHour
        }
    }

    /// Switches the clock; listeners only hear about actual changes.
    pub fn set_date_time_format(&self, format: DateTimeFormat) {
        let wanted = format == DateTimeFormat::TwentyFourHour;
        if self.use_24_hour.swap(wanted, Ordering::SeqCst) == wanted {
            return;
        }
        debug!(?format, "date/time format changed");
        self.events.dispatch(ChangeEvent::DateTimeFormatChanged);
    }

    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        self.events.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    /// `hosted` documents have no local bytes, so a zero size reads as `--`.
    pub fn format_size(&self, bytes: u64, hosted: bool) -> String {
        if hosted && bytes == 0 {
            return "--".to_string();
        }
        if bytes < 1024 {
            return format!("{bytes} bytes");
        }
        let mut value = bytes as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
            value /= 1024.0;
            unit += 1;
        }
        format!("{value:.1} {}", SIZE_UNITS[unit])
    }

    pub fn format_mod_date(&self, time: DateTime<Utc>) -> String {
        self.format_mod_date_at(time, Local::now())
    }

    pub fn format_mod_date_at(&self, time: DateTime<Utc>, now: DateTime<Local>) -> String {
        let local = time.with_timezone(&Local);
        let clock = local
            .format(self.date_time_format().time_pattern())
            .to_string();
        let day = local.date_naive();
        let today = now.date_naive();
        if day == today {
            return format!("Today {clock}");
        }
        if today
            .checked_sub_signed(Duration::days(1))
            .is_some_and(|yesterday| yesterday == day)
        {
            return format!("Yesterday {clock}");
        }
        format!("{}, {clock}", local.format("%b %-d, %Y"))
    }
}
