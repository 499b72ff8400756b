use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::types::ReportsConfig;
use crate::domain::availability::{AvailabilityGrid, build_availability_grid};
use crate::domain::calendar::DateWindow;
use crate::domain::catalog::PricingRule;
use crate::domain::export::{ExportedReport, ReportKind};
use crate::domain::overlap::{OverlapCheck, check_overlap, ensure_no_conflict};
use crate::domain::property::Property;
use crate::domain::reservation::{
    BLOCKING_STATUSES, NewReservation, OCCUPANCY_STATUSES, Reservation, ReservationStatus,
    StayInterval,
};
use crate::domain::revenue::{
    DailyOccupancy, RevenueReport, aggregate_revenue_occupancy, compute_daily_occupancy,
};
use crate::error::{HotelError, Result};
use crate::ports::repository::{HotelStore, ReservationFilter};

/// Statuses removed by `clear_statistics`.
const HISTORICAL_STATUSES: [ReservationStatus; 2] =
    [ReservationStatus::CheckedOut, ReservationStatus::Cancelled];

/// Tenant-checked entry point for every reservation and reporting
/// operation. Holds no per-request state.
pub struct ReservationEngine {
    store: Arc<dyn HotelStore>,
    reports: ReportsConfig,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn HotelStore>, reports: ReportsConfig) -> Self {
        Self { store, reports }
    }

    /// Trailing window used by revenue and occupancy reports when the
    /// caller gives none.
    pub fn default_report_window(&self, now: DateTime<Utc>) -> DateWindow {
        DateWindow::trailing(now.date_naive(), self.reports.trailing_days)
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    pub async fn list_properties(&self, tenant_id: &str) -> Result<Vec<Property>> {
        self.store.list_properties(tenant_id).await
    }

    /// Resolve a property the tenant owns. Foreign and missing properties
    /// produce the same `NotFound`.
    pub async fn property(&self, tenant_id: &str, property_id: &str) -> Result<Property> {
        match self.store.find_property(property_id).await? {
            Some(property) if property.is_owned_by(tenant_id) => Ok(property),
            Some(_) => {
                tracing::warn!(
                    tenant = tenant_id,
                    property = property_id,
                    "Property belongs to another tenant"
                );
                Err(HotelError::not_found("Property", property_id))
            }
            None => Err(HotelError::not_found("Property", property_id)),
        }
    }

    // -----------------------------------------------------------------------
    // Reservation lookup
    // -----------------------------------------------------------------------

    /// Reservations of the property matching `filter`, earliest check-in
    /// first.
    pub async fn list_reservations(
        &self,
        tenant_id: &str,
        property_id: &str,
        filter: &ReservationFilter,
    ) -> Result<Vec<Reservation>> {
        self.property(tenant_id, property_id).await?;
        if let Some(room_id) = filter.room_id.as_deref() {
            self.require_room(property_id, room_id).await?;
        }
        self.store.list_reservations(property_id, filter).await
    }

    pub async fn reservation(
        &self,
        tenant_id: &str,
        property_id: &str,
        reservation_id: &str,
    ) -> Result<Reservation> {
        self.property(tenant_id, property_id).await?;
        self.store
            .find_reservation(property_id, reservation_id)
            .await?
            .ok_or_else(|| HotelError::not_found("Reservation", reservation_id))
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    pub async fn check_overlap(
        &self,
        tenant_id: &str,
        property_id: &str,
        room_id: &str,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<OverlapCheck> {
        self.property(tenant_id, property_id).await?;
        let proposed = StayInterval::new(check_in, check_out)?;
        self.require_room(property_id, room_id).await?;

        let existing = self.blocking_reservations(property_id, room_id).await?;
        let result = check_overlap(&existing, room_id, &proposed);
        tracing::debug!(
            property = property_id,
            room = room_id,
            conflict = result.conflict,
            "Checked overlap"
        );
        Ok(result)
    }

    /// Validate and store a new `PENDING` reservation.
    pub async fn create_reservation(
        &self,
        tenant_id: &str,
        property_id: &str,
        request: NewReservation,
        now: DateTime<Utc>,
    ) -> Result<Reservation> {
        self.property(tenant_id, property_id).await?;
        let stay = request.validate()?;
        self.require_room(property_id, &request.room_id).await?;

        if !request.services.is_empty() {
            let services = self.store.list_services(property_id).await?;
            for line in &request.services {
                match services.iter().find(|s| s.id == line.service_id) {
                    Some(service) if service.is_active => {}
                    Some(service) => {
                        return Err(HotelError::validation(format!(
                            "service '{}' is not currently offered",
                            service.name
                        )));
                    }
                    None => return Err(HotelError::not_found("Service", line.service_id.clone())),
                }
            }
        }

        let existing = self
            .blocking_reservations(property_id, &request.room_id)
            .await?;
        if let Err(e) = ensure_no_conflict(&existing, &request.room_id, &stay) {
            tracing::info!(
                property = property_id,
                room = %request.room_id,
                "Rejected double booking: {e}"
            );
            return Err(e);
        }

        let reservation = request.into_reservation(property_id, stay, now);
        let stored = self.store.insert_reservation(reservation).await?;
        tracing::info!(
            property = property_id,
            room = %stored.room_id,
            reservation = %stored.id,
            "Created reservation"
        );
        Ok(stored)
    }

    pub async fn change_status(
        &self,
        tenant_id: &str,
        property_id: &str,
        reservation_id: &str,
        status: ReservationStatus,
    ) -> Result<Reservation> {
        self.property(tenant_id, property_id).await?;
        let updated = self
            .store
            .update_status(property_id, reservation_id, status)
            .await?;
        tracing::info!(
            property = property_id,
            reservation = reservation_id,
            status = %updated.status,
            "Updated reservation status"
        );
        Ok(updated)
    }

    /// Delete every reservation of the property.
    pub async fn clear_reservations(&self, tenant_id: &str, property_id: &str) -> Result<usize> {
        self.property(tenant_id, property_id).await?;
        let deleted = self.store.delete_reservations(property_id, None).await?;
        tracing::info!(property = property_id, deleted, "Cleared all reservations");
        Ok(deleted)
    }

    /// Delete checked-out and cancelled reservations, keeping active ones.
    pub async fn clear_statistics(&self, tenant_id: &str, property_id: &str) -> Result<usize> {
        self.property(tenant_id, property_id).await?;
        let deleted = self
            .store
            .delete_reservations(property_id, Some(&HISTORICAL_STATUSES))
            .await?;
        tracing::info!(property = property_id, deleted, "Cleared historical reservations");
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Availability grid over `window`, by default the month containing
    /// `now`.
    pub async fn availability_grid(
        &self,
        tenant_id: &str,
        property_id: &str,
        window: Option<DateWindow>,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityGrid> {
        self.property(tenant_id, property_id).await?;
        let window = window.unwrap_or_else(|| DateWindow::month_of(now.date_naive()));
        window.ensure_max_len(self.reports.max_window_days)?;

        let rooms = self.store.list_rooms(property_id).await?;
        let room_types = self.store.list_room_types(property_id).await?;
        let filter = ReservationFilter::all()
            .with_statuses(&OCCUPANCY_STATUSES)
            .overlapping(&window);
        let reservations = self.store.list_reservations(property_id, &filter).await?;

        tracing::debug!(
            property = property_id,
            window = %window,
            rooms = rooms.len(),
            reservations = reservations.len(),
            "Building availability grid"
        );
        Ok(build_availability_grid(
            property_id,
            &rooms,
            &room_types,
            &reservations,
            &window,
            now,
        ))
    }

    pub async fn revenue_report(
        &self,
        tenant_id: &str,
        property_id: &str,
        window: Option<DateWindow>,
        now: DateTime<Utc>,
    ) -> Result<RevenueReport> {
        self.property(tenant_id, property_id).await?;
        let window = self.report_window(window, now)?;

        let room_count = self.room_count(property_id).await?;
        let services = self.store.list_services(property_id).await?;
        let filter = ReservationFilter::all()
            .with_statuses(&OCCUPANCY_STATUSES)
            .checking_in_within(&window);
        let reservations = self.store.list_reservations(property_id, &filter).await?;

        tracing::debug!(
            property = property_id,
            window = %window,
            reservations = reservations.len(),
            "Aggregating revenue"
        );
        Ok(aggregate_revenue_occupancy(
            property_id,
            &reservations,
            &services,
            room_count,
            &window,
        ))
    }

    pub async fn occupancy_series(
        &self,
        tenant_id: &str,
        property_id: &str,
        window: Option<DateWindow>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyOccupancy>> {
        self.property(tenant_id, property_id).await?;
        let window = self.report_window(window, now)?;
        self.daily_occupancy(property_id, &window).await
    }

    /// Render a CSV report over `window` (trailing default), named after
    /// the day it was generated.
    pub async fn export_report(
        &self,
        tenant_id: &str,
        property_id: &str,
        kind: ReportKind,
        window: Option<DateWindow>,
        now: DateTime<Utc>,
    ) -> Result<ExportedReport> {
        let today = now.date_naive();
        let export = match kind {
            ReportKind::Occupancy => {
                let series = self
                    .occupancy_series(tenant_id, property_id, window, now)
                    .await?;
                ExportedReport::occupancy(&series, today)
            }
            ReportKind::Revenue => {
                let report = self.revenue_report(tenant_id, property_id, window, now).await?;
                ExportedReport::revenue(&report.daily, today)
            }
        };
        tracing::debug!(
            property = property_id,
            file = %export.filename,
            bytes = export.body.len(),
            "Exported report"
        );
        Ok(export)
    }

    /// Stored pricing rules, highest priority first.
    pub async fn list_pricing_rules(
        &self,
        tenant_id: &str,
        property_id: &str,
    ) -> Result<Vec<PricingRule>> {
        self.property(tenant_id, property_id).await?;
        let mut rules = self.store.list_pricing_rules(property_id).await?;
        rules.sort_by(PricingRule::listing_order);
        Ok(rules)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn report_window(&self, window: Option<DateWindow>, now: DateTime<Utc>) -> Result<DateWindow> {
        let window = window.unwrap_or_else(|| self.default_report_window(now));
        window.ensure_max_len(self.reports.max_window_days)?;
        Ok(window)
    }

    async fn require_room(&self, property_id: &str, room_id: &str) -> Result<()> {
        match self.store.find_room(property_id, room_id).await? {
            Some(_) => Ok(()),
            None => Err(HotelError::not_found("Room", room_id)),
        }
    }

    async fn blocking_reservations(
        &self,
        property_id: &str,
        room_id: &str,
    ) -> Result<Vec<Reservation>> {
        let filter = ReservationFilter::all()
            .for_room(room_id)
            .with_statuses(&BLOCKING_STATUSES);
        self.store.list_reservations(property_id, &filter).await
    }

    async fn room_count(&self, property_id: &str) -> Result<u32> {
        let rooms = self.store.list_rooms(property_id).await?;
        Ok(u32::try_from(rooms.len()).unwrap_or(u32::MAX))
    }

    async fn daily_occupancy(
        &self,
        property_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<DailyOccupancy>> {
        let room_count = self.room_count(property_id).await?;
        let filter = ReservationFilter::all()
            .with_statuses(&OCCUPANCY_STATUSES)
            .overlapping(window);
        let reservations = self.store.list_reservations(property_id, &filter).await?;
        Ok(compute_daily_occupancy(&reservations, room_count, window))
    }
}
