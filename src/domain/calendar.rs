use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::error::{HotelError, Result};

/// Calendar-day format used in every external representation.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of whole calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(HotelError::validation(format!(
                "window end {} is before window start {}",
                format_day(end),
                format_day(start)
            )));
        }
        Ok(Self { start, end })
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(start);
        Self { start, end }
    }

    /// The `days` calendar days ending on (and including) `today`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        let start = today
            .checked_sub_signed(Duration::days(span))
            .unwrap_or(today);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the window, both ends included.
    pub fn len_days(&self) -> u32 {
        let days = (self.end - self.start).num_days() + 1;
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|day| *day <= self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Midnight UTC of the first day.
    pub fn start_instant(&self) -> DateTime<Utc> {
        day_instant(self.start)
    }

    /// Midnight UTC of the day after the last day.
    pub fn end_instant_exclusive(&self) -> DateTime<Utc> {
        self.end
            .succ_opt()
            .map_or_else(|| day_instant(self.end), day_instant)
    }

    /// Human label of the first day's month, e.g. `October 2026`.
    pub fn month_label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }

    pub fn ensure_max_len(&self, max_days: u32) -> Result<()> {
        if self.len_days() > max_days {
            return Err(HotelError::validation(format!(
                "window of {} days exceeds the maximum of {max_days} days",
                self.len_days()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", format_day(self.start), format_day(self.end))
    }
}

/// Canonical instant of a calendar day (midnight UTC) used for
/// day-in-stay containment tests.
pub fn day_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

pub fn parse_day(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DAY_FORMAT).map_err(|_| {
        HotelError::validation(format!("invalid date '{input}', expected YYYY-MM-DD"))
    })
}

/// Parse a stay boundary: either a calendar day (midnight UTC) or an
/// RFC 3339 timestamp.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DAY_FORMAT) {
        return Ok(day_instant(date));
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            HotelError::validation(format!(
                "invalid date '{input}', expected YYYY-MM-DD or an RFC 3339 timestamp"
            ))
        })
}

/// Parse a `YYYY-MM` month into its window.
pub fn parse_month(input: &str) -> Result<DateWindow> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", input.trim()), DAY_FORMAT)
        .map_err(|_| HotelError::validation(format!("invalid month '{input}', expected YYYY-MM")))?;
    Ok(DateWindow::month_of(first))
}
