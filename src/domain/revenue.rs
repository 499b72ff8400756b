use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::calendar::{DateWindow, day_instant, format_day};
use super::catalog::Service;
use super::reservation::Reservation;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: String,
    pub room_revenue: Decimal,
    pub service_revenue: Decimal,
    pub total_revenue: Decimal,
    pub check_ins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    pub total_revenue: Decimal,
    pub room_revenue: Decimal,
    pub service_revenue: Decimal,
    pub total_reservations: u32,
    pub occupied_nights: u32,
    pub total_room_nights: u32,
    pub occupancy_rate: Decimal,
    pub average_daily_rate: Decimal,
    pub revpar: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueReport {
    pub property_id: String,
    pub window_start: String,
    pub window_end: String,
    pub room_count: u32,
    pub daily: Vec<DailyRevenue>,
    pub totals: PeriodTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyOccupancy {
    pub date: String,
    pub total_rooms: u32,
    pub occupied_rooms: u32,
    pub occupancy_rate: Decimal,
}

// ---------------------------------------------------------------------------
// Revenue aggregation
// ---------------------------------------------------------------------------

/// Aggregate revenue and occupancy metrics over `window`.
///
/// Reservations count when their status is confirmed, checked-in or
/// checked-out and their check-in date falls inside the window. The whole
/// `total_price` and all booked services are attributed to the check-in
/// date. Every ratio with a zero denominator is 0.
pub fn aggregate_revenue_occupancy(
    property_id: &str,
    reservations: &[Reservation],
    services: &[Service],
    room_count: u32,
    window: &DateWindow,
) -> RevenueReport {
    let prices: HashMap<&str, &Service> = services.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut by_day: BTreeMap<NaiveDate, DailyRevenue> = window
        .days()
        .map(|day| {
            (
                day,
                DailyRevenue {
                    date: format_day(day),
                    room_revenue: Decimal::ZERO,
                    service_revenue: Decimal::ZERO,
                    total_revenue: Decimal::ZERO,
                    check_ins: 0,
                },
            )
        })
        .collect();

    let mut total_reservations: u32 = 0;
    let mut occupied_nights: u32 = 0;

    for reservation in reservations.iter().filter(|r| r.counts_toward_occupancy()) {
        let Some(day) = by_day.get_mut(&reservation.stay.check_in_date()) else {
            continue;
        };
        let services_total = service_revenue(reservation, &prices);
        day.room_revenue = day.room_revenue.saturating_add(reservation.total_price);
        day.service_revenue = day.service_revenue.saturating_add(services_total);
        day.total_revenue = day
            .total_revenue
            .saturating_add(reservation.total_price.saturating_add(services_total));
        day.check_ins += 1;

        total_reservations += 1;
        occupied_nights = occupied_nights.saturating_add(reservation.stay.nights());
    }

    let daily: Vec<DailyRevenue> = by_day.into_values().collect();
    let room_revenue = money_sum(daily.iter().map(|d| d.room_revenue));
    let service_revenue = money_sum(daily.iter().map(|d| d.service_revenue));
    let total_revenue = money_sum(daily.iter().map(|d| d.total_revenue));
    let total_room_nights = room_count.saturating_mul(window.len_days());

    let occupancy_rate = percentage(
        Decimal::from(occupied_nights),
        Decimal::from(total_room_nights),
    );
    let average_daily_rate = ratio(total_revenue, Decimal::from(occupied_nights));
    let revpar = ratio(
        average_daily_rate.saturating_mul(occupancy_rate),
        Decimal::ONE_HUNDRED,
    );

    RevenueReport {
        property_id: property_id.to_string(),
        window_start: format_day(window.start()),
        window_end: format_day(window.end()),
        room_count,
        daily,
        totals: PeriodTotals {
            total_revenue,
            room_revenue,
            service_revenue,
            total_reservations,
            occupied_nights,
            total_room_nights,
            occupancy_rate,
            average_daily_rate,
            revpar,
        },
    }
}

fn service_revenue(reservation: &Reservation, prices: &HashMap<&str, &Service>) -> Decimal {
    let lines = reservation
        .services
        .iter()
        .filter_map(|line| match prices.get(line.service_id.as_str()) {
            Some(service) => Some(service.line_total(line.quantity)),
            None => {
                tracing::warn!(
                    reservation = %reservation.id,
                    service = %line.service_id,
                    "Service line references an unknown service, skipping"
                );
                None
            }
        });
    money_sum(lines)
}

// ---------------------------------------------------------------------------
// Daily occupancy series
// ---------------------------------------------------------------------------

/// Per-day count of distinct rooms held by a confirmed, checked-in or
/// checked-out reservation at that day's midnight (UTC).
pub fn compute_daily_occupancy(
    reservations: &[Reservation],
    room_count: u32,
    window: &DateWindow,
) -> Vec<DailyOccupancy> {
    let counted: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.counts_toward_occupancy())
        .collect();

    window
        .days()
        .map(|day| {
            let instant = day_instant(day);
            let occupied: HashSet<&str> = counted
                .iter()
                .filter(|r| r.stay.contains(instant))
                .map(|r| r.room_id.as_str())
                .collect();
            let occupied_rooms = u32::try_from(occupied.len()).unwrap_or(u32::MAX);
            DailyOccupancy {
                date: format_day(day),
                total_rooms: room_count,
                occupied_rooms,
                occupancy_rate: percentage(
                    Decimal::from(occupied_rooms),
                    Decimal::from(room_count),
                ),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Arithmetic and rendering helpers
// ---------------------------------------------------------------------------

fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    ratio(part.saturating_mul(Decimal::ONE_HUNDRED), whole)
}

/// Sum that clamps at `Decimal::MAX` instead of panicking on overflow.
fn money_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Round half away from zero and pin the scale, so `130` renders `130.00`.
pub fn round_fixed(value: Decimal, places: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    rounded
}

pub fn format_money(value: Decimal) -> String {
    round_fixed(value, 2).to_string()
}

pub fn format_rate(value: Decimal) -> String {
    format!("{}%", round_fixed(value, 1))
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for RevenueReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = &self.totals;
        writeln!(
            f,
            "# Revenue: property {} ({} to {})",
            self.property_id, self.window_start, self.window_end
        )?;
        writeln!(f, "Total revenue: {}", format_money(t.total_revenue))?;
        writeln!(
            f,
            "  Rooms: {} | Services: {}",
            format_money(t.room_revenue),
            format_money(t.service_revenue)
        )?;
        writeln!(f, "Reservations: {}", t.total_reservations)?;
        writeln!(
            f,
            "Occupied nights: {} of {} room-nights ({} rooms)",
            t.occupied_nights, t.total_room_nights, self.room_count
        )?;
        writeln!(f, "Occupancy rate: {}", format_rate(t.occupancy_rate))?;
        writeln!(f, "ADR: {}", format_money(t.average_daily_rate))?;
        writeln!(f, "RevPAR: {}", format_money(t.revpar))?;

        let active: Vec<&DailyRevenue> = self
            .daily
            .iter()
            .filter(|d| d.check_ins > 0 || !d.total_revenue.is_zero())
            .collect();
        if !active.is_empty() {
            writeln!(f, "\nDays with check-ins:")?;
            writeln!(
                f,
                "{:<12} {:>9} {:>12} {:>12} {:>12}",
                "Date", "Check-ins", "Rooms", "Services", "Total"
            )?;
            for day in active {
                writeln!(
                    f,
                    "{:<12} {:>9} {:>12} {:>12} {:>12}",
                    day.date,
                    day.check_ins,
                    format_money(day.room_revenue),
                    format_money(day.service_revenue),
                    format_money(day.total_revenue)
                )?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for DailyOccupancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}/{} rooms occupied ({})",
            self.date,
            self.occupied_rooms,
            self.total_rooms,
            format_rate(self.occupancy_rate)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
