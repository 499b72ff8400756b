use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::format_day;
use super::revenue::{DailyOccupancy, DailyRevenue, format_money, format_rate};
use crate::error::{HotelError, Result};

pub const CSV_CONTENT_TYPE: &str = "text/csv";

const OCCUPANCY_HEADER: &str = "Date,Total Rooms,Occupied Rooms,Occupancy Rate";
const REVENUE_HEADER: &str = "Date,Room Revenue,Service Revenue,Total Revenue";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Occupancy,
    Revenue,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Occupancy => "occupancy",
            Self::Revenue => "revenue",
        }
    }

    /// `<kind>-report-<YYYY-MM-DD>.csv`
    pub fn filename(self, generated_on: NaiveDate) -> String {
        format!("{}-report-{}.csv", self.as_str(), format_day(generated_on))
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = HotelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "occupancy" => Ok(Self::Occupancy),
            "revenue" => Ok(Self::Revenue),
            other => Err(HotelError::validation(format!(
                "unknown report type '{other}', expected 'occupancy' or 'revenue'"
            ))),
        }
    }
}

/// A rendered CSV file ready to hand to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedReport {
    pub kind: ReportKind,
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl ExportedReport {
    pub fn occupancy(series: &[DailyOccupancy], generated_on: NaiveDate) -> Self {
        Self::csv(ReportKind::Occupancy, occupancy_csv(series), generated_on)
    }

    pub fn revenue(daily: &[DailyRevenue], generated_on: NaiveDate) -> Self {
        Self::csv(ReportKind::Revenue, revenue_csv(daily), generated_on)
    }

    fn csv(kind: ReportKind, body: String, generated_on: NaiveDate) -> Self {
        Self {
            kind,
            filename: kind.filename(generated_on),
            content_type: CSV_CONTENT_TYPE,
            body,
        }
    }
}

pub fn occupancy_csv(series: &[DailyOccupancy]) -> String {
    let mut out = String::with_capacity(OCCUPANCY_HEADER.len() + series.len() * 32);
    out.push_str(OCCUPANCY_HEADER);
    out.push('\n');
    for day in series {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            day.date,
            day.total_rooms,
            day.occupied_rooms,
            format_rate(day.occupancy_rate)
        );
    }
    out
}

pub fn revenue_csv(daily: &[DailyRevenue]) -> String {
    let mut out = String::with_capacity(REVENUE_HEADER.len() + daily.len() * 40);
    out.push_str(REVENUE_HEADER);
    out.push('\n');
    for day in daily {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            day.date,
            format_money(day.room_revenue),
            format_money(day.service_revenue),
            format_money(day.total_revenue)
        );
    }
    out
}
