use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{PricingRule, RuleType, Service};
use crate::domain::overlap::find_conflict;
use crate::domain::property::Property;
use crate::domain::reservation::Reservation;
use crate::domain::room::{Room, RoomStatus, RoomType};
use crate::error::{HotelError, Result};

pub const DEMO_PROPERTY_ID: &str = "demo-instance-id";

/// Flat snapshot of every record the store serves. Loaded from JSON or
/// YAML and written back as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub pricing_rules: Vec<PricingRule>,
}

impl Dataset {
    /// Load and validate a dataset. `.yaml`/`.yml` files are parsed as
    /// YAML, everything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HotelError::Config(format!("failed to read dataset {}: {e}", path.display()))
        })?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let dataset: Self = serde_json::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let dataset: Self = serde_yml::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check per-record rules, id uniqueness, that every reference stays
    /// inside its property, and that no two blocking stays on a room
    /// overlap.
    pub fn validate(&self) -> Result<()> {
        unique_ids("property", self.properties.iter().map(|p| p.id.as_str()))?;
        unique_ids("room type", self.room_types.iter().map(|t| t.id.as_str()))?;
        unique_ids("room", self.rooms.iter().map(|r| r.id.as_str()))?;
        unique_ids("reservation", self.reservations.iter().map(|r| r.id.as_str()))?;
        unique_ids("service", self.services.iter().map(|s| s.id.as_str()))?;
        unique_ids("pricing rule", self.pricing_rules.iter().map(|r| r.id.as_str()))?;

        let property_ids: HashSet<&str> = self.properties.iter().map(|p| p.id.as_str()).collect();
        let ensure_property = |kind: &str, id: &str, property_id: &str| {
            if property_ids.contains(property_id) {
                Ok(())
            } else {
                Err(HotelError::validation(format!(
                    "{kind} {id} references unknown property {property_id}"
                )))
            }
        };

        for room_type in &self.room_types {
            ensure_property("room type", &room_type.id, &room_type.property_id)?;
            room_type.validate()?;
        }
        for service in &self.services {
            ensure_property("service", &service.id, &service.property_id)?;
            service.validate()?;
        }
        for rule in &self.pricing_rules {
            ensure_property("pricing rule", &rule.id, &rule.property_id)?;
            rule.validate()?;
        }

        for room in &self.rooms {
            ensure_property("room", &room.id, &room.property_id)?;
            let type_ok = self
                .room_types
                .iter()
                .any(|t| t.id == room.room_type_id && t.property_id == room.property_id);
            if !type_ok {
                return Err(HotelError::validation(format!(
                    "room {} references room type {} outside its property",
                    room.id, room.room_type_id
                )));
            }
        }
        let mut numbers = HashSet::new();
        for room in &self.rooms {
            if !numbers.insert((room.property_id.as_str(), room.room_number.as_str())) {
                return Err(HotelError::validation(format!(
                    "room number {} is used twice in property {}",
                    room.room_number, room.property_id
                )));
            }
        }

        for (idx, reservation) in self.reservations.iter().enumerate() {
            ensure_property("reservation", &reservation.id, &reservation.property_id)?;
            reservation.validate()?;
            let room_ok = self
                .rooms
                .iter()
                .any(|r| r.id == reservation.room_id && r.property_id == reservation.property_id);
            if !room_ok {
                return Err(HotelError::validation(format!(
                    "reservation {} references room {} outside its property",
                    reservation.id, reservation.room_id
                )));
            }
            for line in &reservation.services {
                let service_ok = self.services.iter().any(|s| {
                    s.id == line.service_id && s.property_id == reservation.property_id
                });
                if !service_ok {
                    return Err(HotelError::validation(format!(
                        "reservation {} references service {} outside its property",
                        reservation.id, line.service_id
                    )));
                }
            }
            if reservation.blocks_room()
                && let Some(other) = find_conflict(
                    &self.reservations[..idx],
                    &reservation.room_id,
                    &reservation.stay,
                )
            {
                return Err(HotelError::validation(format!(
                    "reservations {} and {} double-book room {}",
                    other.id, reservation.id, reservation.room_id
                )));
            }
        }
        Ok(())
    }

    /// The demo hotel every fresh install starts with: 5 standard rooms on
    /// floor 1, 3 deluxe rooms on floor 2 and four services.
    pub fn demo(owner_id: &str) -> Self {
        let property_id = DEMO_PROPERTY_ID.to_string();
        let amenities = |extra: &[&str]| {
            ["WiFi", "TV", "Air Conditioning", "Private Bathroom"]
                .iter()
                .chain(extra)
                .map(|a| (*a).to_string())
                .collect::<Vec<_>>()
        };

        let room_types = vec![
            RoomType {
                id: "rt-standard".into(),
                property_id: property_id.clone(),
                name: "Standard Room".into(),
                description: Some("Comfortable room with essential amenities".into()),
                max_guests: 2,
                base_price: Decimal::from(100),
                amenities: amenities(&[]),
            },
            RoomType {
                id: "rt-deluxe".into(),
                property_id: property_id.clone(),
                name: "Deluxe Room".into(),
                description: Some("Spacious room with premium amenities".into()),
                max_guests: 3,
                base_price: Decimal::from(150),
                amenities: amenities(&["Mini Bar", "Balcony"]),
            },
        ];

        let room = |floor: i32, n: u32, room_type_id: &str| Room {
            id: format!("room-{floor}0{n}"),
            property_id: property_id.clone(),
            room_number: format!("{floor}0{n}"),
            floor: Some(floor),
            status: RoomStatus::Available,
            room_type_id: room_type_id.to_string(),
        };
        let rooms = (1..=5)
            .map(|n| room(1, n, "rt-standard"))
            .chain((1..=3).map(|n| room(2, n, "rt-deluxe")))
            .collect();

        let service = |id: &str, name: &str, description: &str, price: i64, refundable: bool| {
            Service {
                id: id.to_string(),
                property_id: property_id.clone(),
                name: name.to_string(),
                description: Some(description.to_string()),
                price: Decimal::from(price),
                tax_rate: Some(Decimal::from(10)),
                is_refundable: refundable,
                is_active: true,
            }
        };
        let services = vec![
            service("svc-breakfast", "Breakfast", "Continental breakfast buffet", 15, true),
            service(
                "svc-airport-transfer",
                "Airport Transfer",
                "One-way airport transfer service",
                50,
                false,
            ),
            service("svc-extra-bed", "Extra Bed", "Additional bed in the room", 25, true),
            service("svc-parking", "Parking", "Secure parking space per night", 10, true),
        ];

        let pricing_rules = vec![
            PricingRule {
                id: "rule-weekend".into(),
                property_id: property_id.clone(),
                name: "Weekend Rate".into(),
                description: Some("Friday and Saturday nights".into()),
                rule_type: RuleType::Weekend,
                start_date: None,
                end_date: None,
                adjustment: Decimal::from(10),
                is_percentage: true,
                is_active: true,
                priority: 1,
            },
        ];

        Self {
            properties: vec![Property {
                id: property_id.clone(),
                owner_id: owner_id.to_string(),
                name: "Grand Hotel Demo".into(),
                currency: "USD".into(),
            }],
            room_types,
            rooms,
            reservations: vec![],
            services,
            pricing_rules,
        }
    }
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(HotelError::validation(format!("{kind} with an empty id")));
        }
        if !seen.insert(id) {
            return Err(HotelError::validation(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::ReservationStatus;
    use crate::test_helpers::{TEST_PROPERTY, make_dataset, make_reservation};
    use std::io::Write as _;

    #[test]
    fn demo_dataset_matches_seed() {
        let demo = Dataset::demo("demo-user");
        assert!(demo.validate().is_ok());
        assert_eq!(demo.properties[0].name, "Grand Hotel Demo");
        assert_eq!(demo.rooms.len(), 8);
        assert_eq!(
            demo.rooms.iter().filter(|r| r.room_type_id == "rt-standard").count(),
            5
        );
        assert!(demo.rooms.iter().any(|r| r.room_number == "203" && r.floor == Some(2)));
        assert_eq!(demo.services.len(), 4);
        let transfer = demo.services.iter().find(|s| s.name == "Airport Transfer").unwrap();
        assert!(!transfer.is_refundable);
        assert_eq!(transfer.price, Decimal::from(50));
        assert!(demo.reservations.is_empty());
    }

    #[test]
    fn json_round_trip_keeps_records() {
        let mut dataset = make_dataset();
        dataset.reservations.push(make_reservation(
            "a",
            "r1",
            "2024-05-01",
            "2024-05-03",
            ReservationStatus::Confirmed,
        ));
        let json = dataset.to_json_pretty().unwrap();
        let back = Dataset::from_json_str(&json).unwrap();
        assert_eq!(back, dataset);
    }

    #[test]
    fn yaml_file_is_detected_by_extension() {
        let yaml = r#"
properties:
  - id: p1
    owner_id: owner-1
    name: Seaside Inn
room_types:
  - id: std
    property_id: p1
    name: Standard
    max_guests: 2
    base_price: "80.00"
rooms:
  - id: r1
    property_id: p1
    room_number: "1"
    status: AVAILABLE
    room_type_id: std
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let dataset = Dataset::from_path(file.path()).unwrap();
        assert_eq!(dataset.properties[0].currency, "USD");
        assert_eq!(dataset.rooms.len(), 1);
        assert!(dataset.reservations.is_empty());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = Dataset::from_path(Path::new("/tmp/nonexistent_hotel_dataset_12345.json"))
            .unwrap_err();
        assert!(matches!(err, HotelError::Config(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            Dataset::from_json_str("{not json").unwrap_err(),
            HotelError::Json(_)
        ));
    }

    #[test]
    fn dangling_references_are_rejected() {
        let mut dataset = make_dataset();
        dataset.rooms[0].room_type_id = "nope".into();
        assert!(dataset.validate().is_err());

        let mut dataset = make_dataset();
        dataset.reservations.push(make_reservation(
            "a",
            "ghost",
            "2024-05-01",
            "2024-05-03",
            ReservationStatus::Confirmed,
        ));
        assert!(dataset.validate().is_err());

        let mut dataset = make_dataset();
        dataset.services[0].property_id = "elsewhere".into();
        assert!(dataset.validate().is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let mut dataset = make_dataset();
        dataset.services[0].price = Decimal::MAX;
        assert!(dataset.validate().unwrap_err().is_client_error());

        let mut dataset = make_dataset();
        let mut reservation =
            make_reservation("a", "r1", "2024-05-01", "2024-05-03", ReservationStatus::Confirmed);
        reservation.paid_amount = Decimal::MAX;
        dataset.reservations.push(reservation);
        assert!(dataset.validate().is_err());
    }

    #[test]
    fn duplicate_ids_and_room_numbers_are_rejected() {
        let mut dataset = make_dataset();
        dataset.rooms[1].id = dataset.rooms[0].id.clone();
        assert!(dataset.validate().is_err());

        let mut dataset = make_dataset();
        dataset.rooms[1].room_number = dataset.rooms[0].room_number.clone();
        assert!(dataset.validate().is_err());
    }

    #[test]
    fn overlapping_active_stays_are_rejected() {
        let mut dataset = make_dataset();
        dataset.reservations = vec![
            make_reservation("a", "r1", "2024-05-01", "2024-05-05", ReservationStatus::Confirmed),
            make_reservation("b", "r1", "2024-05-04", "2024-05-06", ReservationStatus::Pending),
        ];
        let err = dataset.validate().unwrap_err();
        assert!(err.to_string().contains("double-book"));

        dataset.reservations[0].status = ReservationStatus::CheckedOut;
        assert!(dataset.validate().is_ok());
        assert_eq!(dataset.reservations[1].property_id, TEST_PROPERTY);
    }
}
