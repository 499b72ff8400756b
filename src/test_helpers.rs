use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::adapters::dataset::Dataset;
use crate::domain::calendar::parse_instant;
use crate::domain::catalog::Service;
use crate::domain::property::Property;
use crate::domain::reservation::{Guest, Reservation, ReservationStatus, ServiceLine, StayInterval};
use crate::domain::room::{Room, RoomStatus, RoomType};

pub const TEST_PROPERTY: &str = "p1";
pub const TEST_OWNER: &str = "owner-1";

pub fn fixed_now() -> DateTime<Utc> {
    parse_instant("2024-05-10T12:00:00Z").unwrap()
}

pub fn make_stay(check_in: &str, check_out: &str) -> StayInterval {
    StayInterval::new(
        parse_instant(check_in).unwrap(),
        parse_instant(check_out).unwrap(),
    )
    .unwrap()
}

pub fn make_reservation(
    id: &str,
    room_id: &str,
    check_in: &str,
    check_out: &str,
    status: ReservationStatus,
) -> Reservation {
    Reservation {
        id: id.to_string(),
        property_id: TEST_PROPERTY.to_string(),
        room_id: room_id.to_string(),
        guest: Guest {
            name: "Test Guest".to_string(),
            email: Some("guest@example.com".to_string()),
            phone: None,
        },
        stay: make_stay(check_in, check_out),
        adults: 1,
        children: 0,
        total_price: Decimal::from(100),
        paid_amount: Decimal::ZERO,
        notes: None,
        status,
        services: vec![],
        created_at: parse_instant("2024-04-01T09:00:00Z").unwrap(),
    }
}

pub fn make_reservation_with_services(
    id: &str,
    room_id: &str,
    check_in: &str,
    check_out: &str,
    total_price: Decimal,
    services: &[(&str, u32)],
) -> Reservation {
    let mut reservation =
        make_reservation(id, room_id, check_in, check_out, ReservationStatus::Confirmed);
    reservation.total_price = total_price;
    reservation.services = services
        .iter()
        .map(|(service_id, quantity)| ServiceLine {
            service_id: (*service_id).to_string(),
            quantity: *quantity,
        })
        .collect();
    reservation
}

pub fn make_room(id: &str, number: &str, room_type_id: &str, status: RoomStatus) -> Room {
    Room {
        id: id.to_string(),
        property_id: TEST_PROPERTY.to_string(),
        room_number: number.to_string(),
        floor: Some(1),
        status,
        room_type_id: room_type_id.to_string(),
    }
}

pub fn make_room_type(id: &str, name: &str) -> RoomType {
    RoomType {
        id: id.to_string(),
        property_id: TEST_PROPERTY.to_string(),
        name: name.to_string(),
        description: None,
        max_guests: 2,
        base_price: Decimal::from(100),
        amenities: vec!["WiFi".to_string()],
    }
}

pub fn make_service(id: &str, name: &str, price: Decimal) -> Service {
    Service {
        id: id.to_string(),
        property_id: TEST_PROPERTY.to_string(),
        name: name.to_string(),
        description: None,
        price,
        tax_rate: None,
        is_refundable: true,
        is_active: true,
    }
}

pub fn make_property(id: &str, owner_id: &str) -> Property {
    Property {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        name: format!("Hotel {id}"),
        currency: "USD".to_string(),
    }
}

/// One property with two standard rooms, one deluxe room under
/// maintenance and a breakfast service. No reservations.
pub fn make_dataset() -> Dataset {
    Dataset {
        properties: vec![make_property(TEST_PROPERTY, TEST_OWNER)],
        room_types: vec![
            make_room_type("std", "Standard Room"),
            make_room_type("dlx", "Deluxe Room"),
        ],
        rooms: vec![
            make_room("r1", "101", "std", RoomStatus::Available),
            make_room("r2", "102", "std", RoomStatus::Available),
            make_room("r3", "201", "dlx", RoomStatus::Maintenance),
        ],
        reservations: vec![],
        services: vec![make_service("breakfast", "Breakfast", Decimal::from(15))],
        pricing_rules: vec![],
    }
}
