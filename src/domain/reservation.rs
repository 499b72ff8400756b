use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calendar::DateWindow;
use super::revenue::format_money;
use crate::error::{HotelError, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Upper bound for any stored amount of money (one billion).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

// ---------------------------------------------------------------------------
// Status state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

/// Statuses that hold a room and therefore block overlapping bookings.
pub const BLOCKING_STATUSES: [ReservationStatus; 3] = [
    ReservationStatus::Pending,
    ReservationStatus::Confirmed,
    ReservationStatus::CheckedIn,
];

/// Statuses that count as "was occupied" for availability and revenue
/// reporting. Completed stays count, pending ones do not.
pub const OCCUPANCY_STATUSES: [ReservationStatus; 3] = [
    ReservationStatus::Confirmed,
    ReservationStatus::CheckedIn,
    ReservationStatus::CheckedOut,
];

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::CheckedOut => "CHECKED_OUT",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn blocks_room(self) -> bool {
        BLOCKING_STATUSES.contains(&self)
    }

    pub fn counts_toward_occupancy(self) -> bool {
        OCCUPANCY_STATUSES.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CheckedOut | Self::Cancelled)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::CheckedIn)
                | (Self::CheckedIn, Self::CheckedOut)
                | (
                    Self::Pending | Self::Confirmed | Self::CheckedIn,
                    Self::Cancelled
                )
        )
    }

    /// Move to `next`. Re-applying the current status is a no-op.
    pub fn transition(self, next: Self) -> Result<Self> {
        if self == next || self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HotelError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = HotelError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CHECKED_IN" => Ok(Self::CheckedIn),
            "CHECKED_OUT" => Ok(Self::CheckedOut),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            _ => Err(HotelError::validation(format!(
                "unknown reservation status '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Stay interval
// ---------------------------------------------------------------------------

/// Half-open stay `[check_in, check_out)`. Construction guarantees
/// `check_out > check_in`, including when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StayBounds")]
pub struct StayInterval {
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StayBounds {
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
}

impl TryFrom<StayBounds> for StayInterval {
    type Error = HotelError;

    fn try_from(bounds: StayBounds) -> Result<Self> {
        Self::new(bounds.check_in, bounds.check_out)
    }
}

impl StayInterval {
    pub fn new(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Result<Self> {
        if check_out <= check_in {
            return Err(HotelError::validation(
                "check-out must be after check-in",
            ));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Whole-day span of a window: midnight of its first day up to
    /// midnight after its last day.
    pub fn spanning(window: &DateWindow) -> Self {
        Self {
            check_in: window.start_instant(),
            check_out: window.end_instant_exclusive(),
        }
    }

    pub fn check_in(&self) -> DateTime<Utc> {
        self.check_in
    }

    pub fn check_out(&self) -> DateTime<Utc> {
        self.check_out
    }

    pub fn check_in_date(&self) -> NaiveDate {
        self.check_in.date_naive()
    }

    /// The single overlap predicate used for double-booking checks.
    /// Back-to-back stays (one ends exactly when the other starts) do not
    /// overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Half-open containment of an instant.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.check_in <= instant && instant < self.check_out
    }

    /// Nights billed for the stay: the length in days, rounded up.
    pub fn nights(&self) -> u32 {
        let seconds = (self.check_out - self.check_in).num_seconds();
        let nights = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
        u32::try_from(nights).unwrap_or(u32::MAX)
    }
}

// ---------------------------------------------------------------------------
// Reservation records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Guest {
    /// Trim fields and turn blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            name: self.name.trim().to_string(),
            email: clean(self.email),
            phone: clean(self.phone),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HotelError::validation("guest name is required"));
        }
        if let Some(email) = &self.email
            && !is_plausible_email(email)
        {
            return Err(HotelError::validation(format!(
                "invalid guest email '{email}'"
            )));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// A service booked with a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub service_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub property_id: String,
    pub room_id: String,
    pub guest: Guest,
    pub stay: StayInterval,
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    pub total_price: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub services: Vec<ServiceLine>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn validate(&self) -> Result<()> {
        self.guest.validate()?;
        validate_occupants(self.adults)?;
        validate_amount("total price", self.total_price)?;
        validate_amount("paid amount", self.paid_amount)?;
        validate_lines(&self.services)
    }

    pub fn blocks_room(&self) -> bool {
        self.status.blocks_room()
    }

    pub fn counts_toward_occupancy(&self) -> bool {
        self.status.counts_toward_occupancy()
    }

    pub fn outstanding_balance(&self) -> Decimal {
        self.total_price.saturating_sub(self.paid_amount)
    }
}

impl std::fmt::Display for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Reservation {} [{}]", self.id, self.status)?;
        writeln!(f, "  Room: {}", self.room_id)?;
        write!(f, "  Guest: {}", self.guest.name)?;
        if let Some(email) = &self.guest.email {
            write!(f, " <{email}>")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  Stay: {} to {} ({} nights)",
            self.stay.check_in().to_rfc3339(),
            self.stay.check_out().to_rfc3339(),
            self.stay.nights()
        )?;
        writeln!(f, "  Guests: {} adults, {} children", self.adults, self.children)?;
        writeln!(
            f,
            "  Total: {} (paid {}, outstanding {})",
            format_money(self.total_price),
            format_money(self.paid_amount),
            format_money(self.outstanding_balance())
        )?;
        for line in &self.services {
            writeln!(f, "  Service: {} x{}", line.service_id, line.quantity)?;
        }
        if let Some(notes) = &self.notes {
            writeln!(f, "  Notes: {notes}")?;
        }
        Ok(())
    }
}

/// Input for creating a reservation. Validated before any overlap check.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub room_id: String,
    pub guest: Guest,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub adults: u32,
    pub children: u32,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub services: Vec<ServiceLine>,
}

impl NewReservation {
    /// Validate the request and return its stay interval.
    pub fn validate(&self) -> Result<StayInterval> {
        if self.room_id.trim().is_empty() {
            return Err(HotelError::validation("room is required"));
        }
        self.guest.validate()?;
        validate_occupants(self.adults)?;
        validate_amount("total price", self.total_price)?;
        validate_lines(&self.services)?;
        StayInterval::new(self.check_in, self.check_out)
    }

    /// Build the stored record. New reservations always start `PENDING`
    /// with nothing paid; the store assigns the id.
    pub fn into_reservation(
        self,
        property_id: &str,
        stay: StayInterval,
        created_at: DateTime<Utc>,
    ) -> Reservation {
        Reservation {
            id: String::new(),
            property_id: property_id.to_string(),
            room_id: self.room_id,
            guest: self.guest.normalized(),
            stay,
            adults: self.adults,
            children: self.children,
            total_price: self.total_price,
            paid_amount: Decimal::ZERO,
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            status: ReservationStatus::Pending,
            services: self.services,
            created_at,
        }
    }
}

fn validate_occupants(adults: u32) -> Result<()> {
    if adults == 0 {
        return Err(HotelError::validation("at least 1 adult is required"));
    }
    Ok(())
}

pub(crate) fn validate_amount(field: &str, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(HotelError::validation(format!(
            "{field} must not be negative"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(HotelError::validation(format!(
            "{field} must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

fn validate_lines(lines: &[ServiceLine]) -> Result<()> {
    if let Some(line) = lines.iter().find(|l| l.quantity == 0) {
        return Err(HotelError::validation(format!(
            "service {} has a quantity of 0",
            line.service_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::parse_instant;
    use rust_decimal_macros::dec;

    fn stay(check_in: &str, check_out: &str) -> StayInterval {
        StayInterval::new(
            parse_instant(check_in).unwrap(),
            parse_instant(check_out).unwrap(),
        )
        .unwrap()
    }

    fn new_reservation() -> NewReservation {
        NewReservation {
            room_id: "r1".into(),
            guest: Guest {
                name: " Ada Lovelace ".into(),
                email: Some(String::new()),
                phone: Some(" +1 555 ".into()),
            },
            check_in: parse_instant("2024-05-01").unwrap(),
            check_out: parse_instant("2024-05-05").unwrap(),
            adults: 2,
            children: 0,
            total_price: dec!(400.00),
            notes: Some("  ".into()),
            services: vec![],
        }
    }

    // ---- status machine ----

    #[test]
    fn happy_path_transitions() {
        let s = ReservationStatus::Pending;
        let s = s.transition(ReservationStatus::Confirmed).unwrap();
        let s = s.transition(ReservationStatus::CheckedIn).unwrap();
        let s = s.transition(ReservationStatus::CheckedOut).unwrap();
        assert!(s.is_terminal());
    }

    #[test]
    fn cancel_reachable_from_active_states_only() {
        for from in BLOCKING_STATUSES {
            assert!(from.can_transition_to(ReservationStatus::Cancelled));
        }
        assert!(!ReservationStatus::CheckedOut.can_transition_to(ReservationStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        let err = ReservationStatus::Cancelled
            .transition(ReservationStatus::Confirmed)
            .unwrap_err();
        assert!(matches!(err, HotelError::InvalidTransition { .. }));
        assert!(
            ReservationStatus::CheckedOut
                .transition(ReservationStatus::CheckedIn)
                .is_err()
        );
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(
            ReservationStatus::Pending
                .transition(ReservationStatus::CheckedIn)
                .is_err()
        );
        assert!(
            ReservationStatus::Confirmed
                .transition(ReservationStatus::Pending)
                .is_err()
        );
    }

    #[test]
    fn same_status_is_noop() {
        assert_eq!(
            ReservationStatus::Confirmed
                .transition(ReservationStatus::Confirmed)
                .unwrap(),
            ReservationStatus::Confirmed
        );
    }

    #[test]
    fn blocking_and_occupancy_sets() {
        assert!(ReservationStatus::Pending.blocks_room());
        assert!(!ReservationStatus::Pending.counts_toward_occupancy());
        assert!(ReservationStatus::CheckedOut.counts_toward_occupancy());
        assert!(!ReservationStatus::CheckedOut.blocks_room());
        assert!(!ReservationStatus::Cancelled.blocks_room());
        assert!(!ReservationStatus::Cancelled.counts_toward_occupancy());
    }

    #[test]
    fn status_parses_loosely() {
        assert_eq!(
            "checked-in".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::CheckedIn
        );
        assert_eq!(
            "CANCELED".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Cancelled
        );
        assert!("archived".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn status_wire_form() {
        let json = serde_json::to_string(&ReservationStatus::CheckedOut).unwrap();
        assert_eq!(json, "\"CHECKED_OUT\"");
    }

    // ---- stay interval ----

    #[test]
    fn stay_requires_checkout_after_checkin() {
        let day = parse_instant("2024-05-01").unwrap();
        assert!(StayInterval::new(day, day).is_err());
        assert!(StayInterval::new(parse_instant("2024-05-02").unwrap(), day).is_err());
    }

    #[test]
    fn back_to_back_stays_do_not_overlap() {
        let first = stay("2024-05-01", "2024-05-05");
        let second = stay("2024-05-05", "2024-05-10");
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn partial_overlap_detected_both_ways() {
        let existing = stay("2024-05-01", "2024-05-05");
        let proposed = stay("2024-05-03", "2024-05-07");
        assert!(existing.overlaps(&proposed));
        assert!(proposed.overlaps(&existing));
    }

    #[test]
    fn enclosing_stay_overlaps() {
        let outer = stay("2024-05-01", "2024-05-31");
        let inner = stay("2024-05-10", "2024-05-11");
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn contains_is_half_open() {
        let s = stay("2024-05-01", "2024-05-03");
        assert!(s.contains(parse_instant("2024-05-01").unwrap()));
        assert!(s.contains(parse_instant("2024-05-02").unwrap()));
        assert!(!s.contains(parse_instant("2024-05-03").unwrap()));
    }

    #[test]
    fn spanning_covers_whole_window_days() {
        let window = DateWindow::new(
            crate::domain::calendar::parse_day("2024-05-01").unwrap(),
            crate::domain::calendar::parse_day("2024-05-03").unwrap(),
        )
        .unwrap();
        let span = StayInterval::spanning(&window);
        assert_eq!(span.nights(), 3);
        assert!(span.overlaps(&stay("2024-05-03T23:00:00Z", "2024-05-05")));
        assert!(!span.overlaps(&stay("2024-05-04", "2024-05-05")));
        assert!(!span.overlaps(&stay("2024-04-28", "2024-05-01")));
    }

    #[test]
    fn nights_round_up_partial_days() {
        assert_eq!(stay("2024-05-01", "2024-05-05").nights(), 4);
        assert_eq!(
            stay("2024-05-01T15:00:00Z", "2024-05-03T11:00:00Z").nights(),
            2
        );
        assert_eq!(
            stay("2024-05-01T10:00:00Z", "2024-05-01T12:00:00Z").nights(),
            1
        );
    }

    #[test]
    fn stay_deserialization_enforces_order() {
        let ok: StayInterval = serde_json::from_str(
            r#"{"check_in":"2024-05-01T00:00:00Z","check_out":"2024-05-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(ok.nights(), 1);

        let bad = serde_json::from_str::<StayInterval>(
            r#"{"check_in":"2024-05-02T00:00:00Z","check_out":"2024-05-01T00:00:00Z"}"#,
        );
        assert!(bad.is_err());
    }

    // ---- new reservation ----

    #[test]
    fn new_reservation_validates_and_normalizes() {
        let request = new_reservation();
        let stay = request.validate().unwrap();
        let created = parse_instant("2024-04-01").unwrap();
        let reservation = request.into_reservation("p1", stay, created);
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.paid_amount, Decimal::ZERO);
        assert_eq!(reservation.guest.name, "Ada Lovelace");
        assert_eq!(reservation.guest.email, None);
        assert_eq!(reservation.guest.phone.as_deref(), Some("+1 555"));
        assert_eq!(reservation.notes, None);
        assert_eq!(reservation.outstanding_balance(), dec!(400.00));

        let text = reservation.to_string();
        assert!(text.contains("[PENDING]"));
        assert!(text.contains("(4 nights)"));
        assert!(text.contains("Total: 400.00 (paid 0.00, outstanding 400.00)"));
    }

    #[test]
    fn new_reservation_rejects_bad_input() {
        let mut r = new_reservation();
        r.guest.name = String::new();
        assert!(r.validate().unwrap_err().is_client_error());

        let mut r = new_reservation();
        r.adults = 0;
        assert!(r.validate().is_err());

        let mut r = new_reservation();
        r.total_price = dec!(-0.01);
        assert!(r.validate().is_err());

        let mut r = new_reservation();
        r.total_price = MAX_AMOUNT;
        assert!(r.validate().is_ok());
        r.total_price = Decimal::MAX;
        assert!(r.validate().unwrap_err().is_client_error());

        let mut r = new_reservation();
        r.check_out = r.check_in;
        assert!(r.validate().is_err());

        let mut r = new_reservation();
        r.guest.email = Some("not-an-email".into());
        assert!(r.validate().is_err());

        let mut r = new_reservation();
        r.services = vec![ServiceLine {
            service_id: "s1".into(),
            quantity: 0,
        }];
        assert!(r.validate().is_err());
    }

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("guest@example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("guest@localhost"));
        assert!(!is_plausible_email("guest@example."));
    }
}
