use async_trait::async_trait;

use crate::domain::calendar::DateWindow;
use crate::domain::catalog::{PricingRule, Service};
use crate::domain::property::Property;
use crate::domain::reservation::{Reservation, ReservationStatus, StayInterval};
use crate::domain::room::{Room, RoomType};
use crate::error::Result;

/// Narrows a reservation listing. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub room_id: Option<String>,
    pub statuses: Option<Vec<ReservationStatus>>,
    pub overlapping: Option<StayInterval>,
    pub check_in_within: Option<DateWindow>,
}

impl ReservationFilter {
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_room(mut self, room_id: &str) -> Self {
        self.room_id = Some(room_id.to_string());
        self
    }

    #[must_use]
    pub fn with_statuses(mut self, statuses: &[ReservationStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    /// Stays that hold at least part of a day in `window`.
    #[must_use]
    pub fn overlapping(mut self, window: &DateWindow) -> Self {
        self.overlapping = Some(StayInterval::spanning(window));
        self
    }

    /// Stays whose check-in date (UTC) lies in `window`.
    #[must_use]
    pub fn checking_in_within(mut self, window: &DateWindow) -> Self {
        self.check_in_within = Some(*window);
        self
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.room_id
            .as_deref()
            .is_none_or(|room| reservation.room_id == room)
            && self
                .statuses
                .as_deref()
                .is_none_or(|statuses| statuses.contains(&reservation.status))
            && self
                .overlapping
                .is_none_or(|span| reservation.stay.overlaps(&span))
            && self
                .check_in_within
                .is_none_or(|window| window.contains(reservation.stay.check_in_date()))
    }
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn find_property(&self, property_id: &str) -> Result<Option<Property>>;
    async fn list_properties(&self, owner_id: &str) -> Result<Vec<Property>>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn list_rooms(&self, property_id: &str) -> Result<Vec<Room>>;
    async fn list_room_types(&self, property_id: &str) -> Result<Vec<RoomType>>;
    async fn find_room(&self, property_id: &str, room_id: &str) -> Result<Option<Room>>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn list_reservations(
        &self,
        property_id: &str,
        filter: &ReservationFilter,
    ) -> Result<Vec<Reservation>>;

    async fn find_reservation(
        &self,
        property_id: &str,
        reservation_id: &str,
    ) -> Result<Option<Reservation>>;

    /// Store a new reservation and return it with its assigned id.
    ///
    /// Implementations must re-check the overlap predicate atomically with
    /// the insert and fail with `Conflict` when another blocking stay on
    /// the same room was stored in the meantime.
    async fn insert_reservation(&self, reservation: Reservation) -> Result<Reservation>;

    /// Apply a status transition atomically. Illegal transitions fail with
    /// `InvalidTransition`, unknown ids with `NotFound`.
    async fn update_status(
        &self,
        property_id: &str,
        reservation_id: &str,
        status: ReservationStatus,
    ) -> Result<Reservation>;

    /// Delete the property's reservations whose status is in `statuses`, or
    /// all of them with `None`. Returns how many were deleted.
    async fn delete_reservations(
        &self,
        property_id: &str,
        statuses: Option<&[ReservationStatus]>,
    ) -> Result<usize>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn list_services(&self, property_id: &str) -> Result<Vec<Service>>;
}

#[async_trait]
pub trait PricingRuleRepository: Send + Sync {
    async fn list_pricing_rules(&self, property_id: &str) -> Result<Vec<PricingRule>>;
}

/// Everything the engine reads and writes.
pub trait HotelStore:
    PropertyRepository
    + RoomRepository
    + ReservationRepository
    + ServiceRepository
    + PricingRuleRepository
{
}

impl<T> HotelStore for T where
    T: PropertyRepository
        + RoomRepository
        + ReservationRepository
        + ServiceRepository
        + PricingRuleRepository
{
}
