use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::dataset::Dataset;
use crate::domain::catalog::{PricingRule, Service};
use crate::domain::overlap::ensure_no_conflict;
use crate::domain::property::Property;
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::domain::room::{Room, RoomType};
use crate::error::{HotelError, Result};
use crate::ports::repository::{
    PricingRuleRepository, PropertyRepository, ReservationFilter, ReservationRepository,
    RoomRepository, ServiceRepository,
};

const RESERVATION_ID_PREFIX: &str = "rsv-";

struct State {
    dataset: Dataset,
    next_id: u64,
}

/// Dataset held in memory behind one lock, optionally written back to a
/// JSON snapshot after every change. Check-then-insert runs under the
/// write lock, so concurrent bookings of the same room serialise.
pub struct InMemoryStore {
    state: RwLock<State>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        let next_id = next_reservation_number(&dataset);
        Self {
            state: RwLock::new(State { dataset, next_id }),
            snapshot_path: None,
        }
    }

    /// Serve `dataset` and persist changes to `path`.
    #[must_use]
    pub fn with_snapshot(dataset: Dataset, path: PathBuf) -> Self {
        Self {
            snapshot_path: Some(path),
            ..Self::new(dataset)
        }
    }

    /// Load a dataset file and keep persisting to it.
    pub fn open(path: &Path) -> Result<Self> {
        let dataset = Dataset::from_path(path)?;
        tracing::info!(
            path = %path.display(),
            properties = dataset.properties.len(),
            rooms = dataset.rooms.len(),
            reservations = dataset.reservations.len(),
            "Loaded dataset"
        );
        Ok(Self::with_snapshot(dataset, path.to_path_buf()))
    }

    pub fn snapshot(&self) -> Result<Dataset> {
        Ok(self.read()?.dataset.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| {
            tracing::error!("Store lock poisoned on read");
            HotelError::Store {
                reason: "store lock poisoned".into(),
            }
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| {
            tracing::error!("Store lock poisoned on write");
            HotelError::Store {
                reason: "store lock poisoned".into(),
            }
        })
    }

    /// Write the dataset to the snapshot file, if any. On failure the
    /// reservations are rolled back to `backup`.
    fn persist(&self, dataset: &mut Dataset, backup: Vec<Reservation>) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        match write_snapshot(path, dataset) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(path = %path.display(), "Failed to persist dataset: {e}");
                dataset.reservations = backup;
                Err(HotelError::Store {
                    reason: format!("failed to persist dataset: {e}"),
                })
            }
        }
    }
}

fn write_snapshot(path: &Path, dataset: &Dataset) -> Result<()> {
    let json = dataset.to_json_pretty()?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn next_reservation_number(dataset: &Dataset) -> u64 {
    dataset
        .reservations
        .iter()
        .filter_map(|r| r.id.strip_prefix(RESERVATION_ID_PREFIX)?.parse::<u64>().ok())
        .max()
        .map_or(1, |n| n + 1)
}

#[async_trait]
impl PropertyRepository for InMemoryStore {
    async fn find_property(&self, property_id: &str) -> Result<Option<Property>> {
        let state = self.read()?;
        Ok(state
            .dataset
            .properties
            .iter()
            .find(|p| p.id == property_id)
            .cloned())
    }

    async fn list_properties(&self, owner_id: &str) -> Result<Vec<Property>> {
        let state = self.read()?;
        let mut owned: Vec<Property> = state
            .dataset
            .properties
            .iter()
            .filter(|p| p.is_owned_by(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn list_rooms(&self, property_id: &str) -> Result<Vec<Room>> {
        let state = self.read()?;
        Ok(state
            .dataset
            .rooms
            .iter()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect())
    }

    async fn list_room_types(&self, property_id: &str) -> Result<Vec<RoomType>> {
        let state = self.read()?;
        Ok(state
            .dataset
            .room_types
            .iter()
            .filter(|t| t.property_id == property_id)
            .cloned()
            .collect())
    }

    async fn find_room(&self, property_id: &str, room_id: &str) -> Result<Option<Room>> {
        let state = self.read()?;
        Ok(state
            .dataset
            .rooms
            .iter()
            .find(|r| r.id == room_id && r.property_id == property_id)
            .cloned())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn list_reservations(
        &self,
        property_id: &str,
        filter: &ReservationFilter,
    ) -> Result<Vec<Reservation>> {
        let state = self.read()?;
        let mut found: Vec<Reservation> = state
            .dataset
            .reservations
            .iter()
            .filter(|r| r.property_id == property_id && filter.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.stay
                .check_in()
                .cmp(&b.stay.check_in())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(found)
    }

    async fn find_reservation(
        &self,
        property_id: &str,
        reservation_id: &str,
    ) -> Result<Option<Reservation>> {
        let state = self.read()?;
        Ok(state
            .dataset
            .reservations
            .iter()
            .find(|r| r.id == reservation_id && r.property_id == property_id)
            .cloned())
    }

    async fn insert_reservation(&self, mut reservation: Reservation) -> Result<Reservation> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let room_known = state
            .dataset
            .rooms
            .iter()
            .any(|r| r.id == reservation.room_id && r.property_id == reservation.property_id);
        if !room_known {
            return Err(HotelError::not_found("Room", reservation.room_id));
        }

        ensure_no_conflict(
            &state.dataset.reservations,
            &reservation.room_id,
            &reservation.stay,
        )?;

        if reservation.id.is_empty() {
            reservation.id = format!("{RESERVATION_ID_PREFIX}{}", state.next_id);
            state.next_id += 1;
        } else if state.dataset.reservations.iter().any(|r| r.id == reservation.id) {
            return Err(HotelError::validation(format!(
                "reservation id {} already exists",
                reservation.id
            )));
        }

        let backup = state.dataset.reservations.clone();
        state.dataset.reservations.push(reservation.clone());
        self.persist(&mut state.dataset, backup)?;

        tracing::debug!(
            reservation = %reservation.id,
            room = %reservation.room_id,
            "Stored reservation"
        );
        Ok(reservation)
    }

    async fn update_status(
        &self,
        property_id: &str,
        reservation_id: &str,
        status: ReservationStatus,
    ) -> Result<Reservation> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let backup = state.dataset.reservations.clone();
        let Some(reservation) = state
            .dataset
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation_id && r.property_id == property_id)
        else {
            return Err(HotelError::not_found("Reservation", reservation_id));
        };

        let next = reservation.status.transition(status)?;
        if next == reservation.status {
            return Ok(reservation.clone());
        }
        reservation.status = next;
        let updated = reservation.clone();
        self.persist(&mut state.dataset, backup)?;
        Ok(updated)
    }

    async fn delete_reservations(
        &self,
        property_id: &str,
        statuses: Option<&[ReservationStatus]>,
    ) -> Result<usize> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let before = state.dataset.reservations.len();
        let backup = state.dataset.reservations.clone();
        state.dataset.reservations.retain(|r| {
            r.property_id != property_id || statuses.is_some_and(|s| !s.contains(&r.status))
        });
        let deleted = before - state.dataset.reservations.len();
        if deleted > 0 {
            self.persist(&mut state.dataset, backup)?;
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ServiceRepository for InMemoryStore {
    async fn list_services(&self, property_id: &str) -> Result<Vec<Service>> {
        let state = self.read()?;
        Ok(state
            .dataset
            .services
            .iter()
            .filter(|s| s.property_id == property_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PricingRuleRepository for InMemoryStore {
    async fn list_pricing_rules(&self, property_id: &str) -> Result<Vec<PricingRule>> {
        let state = self.read()?;
        Ok(state
            .dataset
            .pricing_rules
            .iter()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect())
    }
}
