#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::calendar::{DateWindow, day_instant, format_day};
use super::reservation::{Reservation, StayInterval};
use super::room::{Room, RoomStatus, RoomType};

const UNKNOWN_ROOM_TYPE: &str = "Unknown";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    pub date: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomAvailability {
    pub room_id: String,
    pub room_number: String,
    pub room_type: String,
    pub status: RoomStatus,
    pub daily_availability: Vec<DayAvailability>,
    pub available_days: u32,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAvailability {
    pub room_type: String,
    pub total_rooms: u32,
    pub available_nights: u32,
    pub total_nights: u32,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityStats {
    pub total_rooms: u32,
    pub currently_available: u32,
    pub total_available_room_nights: u32,
    pub total_occupied_room_nights: u32,
    pub total_possible_room_nights: u32,
    pub overall_occupancy_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityGrid {
    pub property_id: String,
    pub month: String,
    pub window_start: String,
    pub window_end: String,
    pub days: Vec<String>,
    pub statistics: AvailabilityStats,
    pub rooms: Vec<RoomAvailability>,
    pub by_type: Vec<TypeAvailability>,
}

// ---------------------------------------------------------------------------
// Grid builder
// ---------------------------------------------------------------------------

/// Build the day-by-day availability matrix of a property.
///
/// A room is available on a day when its status is `AVAILABLE` and no
/// confirmed, checked-in or checked-out reservation contains that day's
/// midnight (UTC) under half-open `[check_in, check_out)` semantics.
/// Reservations in other statuses are ignored. The result depends only on
/// the arguments.
pub fn build_availability_grid(
    property_id: &str,
    rooms: &[Room],
    room_types: &[RoomType],
    reservations: &[Reservation],
    window: &DateWindow,
    now: DateTime<Utc>,
) -> AvailabilityGrid {
    let type_names: HashMap<&str, &str> = room_types
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();

    let mut ordered: Vec<(&Room, &str)> = rooms
        .iter()
        .map(|room| {
            let type_name = type_names
                .get(room.room_type_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_ROOM_TYPE);
            (room, type_name)
        })
        .collect();
    ordered.sort_by(|(a, a_type), (b, b_type)| {
        a_type
            .cmp(b_type)
            .then_with(|| a.room_number.cmp(&b.room_number))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut stays_by_room: HashMap<&str, Vec<&StayInterval>> = HashMap::new();
    for reservation in reservations.iter().filter(|r| r.counts_toward_occupancy()) {
        stays_by_room
            .entry(reservation.room_id.as_str())
            .or_default()
            .push(&reservation.stay);
    }

    let days: Vec<NaiveDate> = window.days().collect();
    let window_len = window.len_days();

    let room_rows: Vec<RoomAvailability> = ordered
        .iter()
        .map(|(room, type_name)| {
            let stays: &[&StayInterval] = stays_by_room
                .get(room.id.as_str())
                .map_or(&[], Vec::as_slice);
            room_availability(room, type_name, stays, &days, window_len)
        })
        .collect();

    let total_rooms = count_u32(room_rows.len());
    let total_possible_room_nights = total_rooms.saturating_mul(window_len);
    let total_available_room_nights: u32 = room_rows.iter().map(|r| r.available_days).sum();
    let total_occupied_room_nights =
        total_possible_room_nights.saturating_sub(total_available_room_nights);

    let currently_available = today_index(window, now).map_or(0, |idx| {
        count_u32(
            room_rows
                .iter()
                .filter(|r| r.daily_availability.get(idx).is_some_and(|d| d.available))
                .count(),
        )
    });

    let by_type = availability_by_type(&room_rows, window_len);

    AvailabilityGrid {
        property_id: property_id.to_string(),
        month: window.month_label(),
        window_start: format_day(window.start()),
        window_end: format_day(window.end()),
        days: days.iter().copied().map(format_day).collect(),
        statistics: AvailabilityStats {
            total_rooms,
            currently_available,
            total_available_room_nights,
            total_occupied_room_nights,
            total_possible_room_nights,
            overall_occupancy_rate: percentage(
                total_occupied_room_nights,
                total_possible_room_nights,
            ),
        },
        rooms: room_rows,
        by_type,
    }
}

fn room_availability(
    room: &Room,
    type_name: &str,
    stays: &[&StayInterval],
    days: &[NaiveDate],
    window_len: u32,
) -> RoomAvailability {
    let bookable = room.is_bookable();
    let daily_availability: Vec<DayAvailability> = days
        .iter()
        .map(|day| {
            let instant = day_instant(*day);
            let booked = stays.iter().any(|stay| stay.contains(instant));
            DayAvailability {
                date: format_day(*day),
                available: bookable && !booked,
            }
        })
        .collect();
    let available_days = count_u32(daily_availability.iter().filter(|d| d.available).count());

    RoomAvailability {
        room_id: room.id.clone(),
        room_number: room.room_number.clone(),
        room_type: type_name.to_string(),
        status: room.status,
        daily_availability,
        available_days,
        occupancy_rate: percentage(window_len.saturating_sub(available_days), window_len),
    }
}

/// Group rows by room type, in the order types first appear.
fn availability_by_type(rows: &[RoomAvailability], window_len: u32) -> Vec<TypeAvailability> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<TypeAvailability> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.room_type.as_str()).or_insert_with(|| {
            groups.push(TypeAvailability {
                room_type: row.room_type.clone(),
                total_rooms: 0,
                available_nights: 0,
                total_nights: 0,
                occupancy_rate: 0.0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.total_rooms += 1;
        group.available_nights += row.available_days;
        group.total_nights = group.total_nights.saturating_add(window_len);
    }

    for group in &mut groups {
        group.occupancy_rate = percentage(
            group.total_nights.saturating_sub(group.available_nights),
            group.total_nights,
        );
    }
    groups
}

fn today_index(window: &DateWindow, now: DateTime<Utc>) -> Option<usize> {
    let today = now.date_naive();
    if !window.contains(today) {
        return None;
    }
    usize::try_from((today - window.start()).num_days()).ok()
}

/// `part / whole × 100`, or 0 when `whole` is 0.
fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for AvailabilityGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = &self.statistics;
        writeln!(
            f,
            "# Availability: property {} ({})",
            self.property_id, self.month
        )?;
        writeln!(f, "Window: {} to {}", self.window_start, self.window_end)?;
        writeln!(
            f,
            "Rooms: {} total, {} available today",
            stats.total_rooms, stats.currently_available
        )?;
        writeln!(
            f,
            "Room-nights: {} possible, {} available, {} occupied",
            stats.total_possible_room_nights,
            stats.total_available_room_nights,
            stats.total_occupied_room_nights
        )?;
        writeln!(f, "Occupancy rate: {:.1}%", stats.overall_occupancy_rate)?;

        if !self.by_type.is_empty() {
            writeln!(f, "\nBy room type:")?;
            for t in &self.by_type {
                writeln!(
                    f,
                    "  {}: {} rooms, {}/{} nights available, {:.1}% occupied",
                    t.room_type, t.total_rooms, t.available_nights, t.total_nights, t.occupancy_rate
                )?;
            }
        }

        if !self.rooms.is_empty() {
            writeln!(f, "\nBy room (. available, x unavailable):")?;
            writeln!(
                f,
                "{:<8} {:<20} {:<12} {:>6} {:>7}  Days",
                "Room", "Type", "Status", "Avail", "Occ%"
            )?;
            for room in &self.rooms {
                let strip: String = room
                    .daily_availability
                    .iter()
                    .map(|d| if d.available { '.' } else { 'x' })
                    .collect();
                writeln!(
                    f,
                    "{:<8} {:<20} {:<12} {:>6} {:>6.1}%  {strip}",
                    room.room_number,
                    room.room_type,
                    room.status.to_string(),
                    room.available_days,
                    room.occupancy_rate
                )?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
