use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{HotelError, Result};

/// Operational status of a room. Anything other than `Available` makes the
/// room unavailable for every day of a grid, whatever its bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
    Cleaning,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "AVAILABLE"),
            Self::Occupied => write!(f, "OCCUPIED"),
            Self::Maintenance => write!(f, "MAINTENANCE"),
            Self::Cleaning => write!(f, "CLEANING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub property_id: String,
    pub room_number: String,
    #[serde(default)]
    pub floor: Option<i32>,
    pub status: RoomStatus,
    pub room_type_id: String,
}

impl Room {
    pub fn is_bookable(&self) -> bool {
        self.status == RoomStatus::Available
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: String,
    pub property_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub max_guests: u32,
    pub base_price: Decimal,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl RoomType {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HotelError::validation("room type name is required"));
        }
        if self.max_guests == 0 {
            return Err(HotelError::validation(format!(
                "room type '{}' must allow at least one guest",
                self.name
            )));
        }
        if self.base_price < Decimal::ZERO {
            return Err(HotelError::validation(format!(
                "room type '{}' has a negative base price",
                self.name
            )));
        }
        Ok(())
    }
}
