#![no_main]
use libfuzzer_sys::fuzz_target;

use mcp_hotel::domain::calendar::{parse_day, parse_instant, parse_month};
use mcp_hotel::domain::export::ReportKind;
use mcp_hotel::domain::reservation::ReservationStatus;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_day(text);
        let _ = parse_instant(text);
        if let Ok(month) = parse_month(text) {
            assert!((28..=31).contains(&month.len_days()));
        }
        let _ = text.parse::<ReservationStatus>();
        let _ = text.parse::<ReportKind>();
    }
});
