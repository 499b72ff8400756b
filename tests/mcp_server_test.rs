#![allow(clippy::too_many_lines)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use mcp_hotel::adapters::dataset::{DEMO_PROPERTY_ID, Dataset};
use mcp_hotel::adapters::memory_store::InMemoryStore;
use mcp_hotel::config::types::ReportsConfig;
use mcp_hotel::engine::ReservationEngine;
use mcp_hotel::mcp::server::HotelMcpServer;

use rmcp::model::{CallToolRequestParams, CallToolResult, ClientInfo, ReadResourceRequestParams};
use rmcp::{ClientHandler, ServiceExt};

const OWNER: &str = "owner-1";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Dummy client handler required by rmcp to create a client-server pair.
#[derive(Debug, Clone, Default)]
struct DummyClientHandler;

impl ClientHandler for DummyClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

type Client = rmcp::service::RunningService<rmcp::RoleClient, DummyClientHandler>;

fn today() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

fn extract_text(result: &CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.raw.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

#[allow(clippy::needless_pass_by_value)]
fn tool_params(name: &str, args: serde_json::Value) -> CallToolRequestParams {
    CallToolRequestParams {
        meta: None,
        name: std::borrow::Cow::Owned(name.to_string()),
        arguments: Some(args.as_object().unwrap().clone()),
        task: None,
    }
}

/// Serve the demo hotel over an in-memory transport with "today" pinned
/// to 2024-05-10.
async fn setup() -> (Client, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let (server_transport, client_transport) = tokio::io::duplex(65536);

    let store = Arc::new(InMemoryStore::new(Dataset::demo(OWNER)));
    let engine = Arc::new(ReservationEngine::new(store, ReportsConfig::default()));
    let server = HotelMcpServer::new(engine, OWNER).with_clock(today);
    let server_handle = tokio::spawn(async move {
        server.serve(server_transport).await?.waiting().await?;
        anyhow::Ok(())
    });

    let client = DummyClientHandler
        .serve(client_transport)
        .await
        .expect("client should connect");

    (client, server_handle)
}

async fn teardown(client: Client, server_handle: tokio::task::JoinHandle<anyhow::Result<()>>) {
    let _ = client.cancel().await;
    let _ = server_handle.await;
}

async fn call(client: &Client, name: &str, args: serde_json::Value) -> CallToolResult {
    client
        .call_tool(tool_params(name, args))
        .await
        .expect("call_tool should succeed")
}

fn assert_success(result: &CallToolResult) {
    assert!(
        result.is_error.is_none() || result.is_error == Some(false),
        "Expected success but got error: {}",
        extract_text(result)
    );
}

/// Book room-101 for 2024-05-02..05-06 with two breakfasts and confirm it.
async fn book_confirmed_stay(client: &Client) {
    let result = call(
        client,
        "hotel_create_reservation",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "room_id": "room-101",
            "guest_name": "Grace Hopper",
            "guest_email": "Grace@Example.com",
            "check_in": "2024-05-02",
            "check_out": "2024-05-06",
            "adults": 2,
            "total_price": "400",
            "services": [{ "service_id": "svc-breakfast", "quantity": 2 }],
        }),
    )
    .await;
    assert_success(&result);
    assert!(extract_text(&result).contains("rsv-1"));

    let result = call(
        client,
        "hotel_update_reservation_status",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "reservation_id": "rsv-1",
            "status": "CONFIRMED",
        }),
    )
    .await;
    assert_success(&result);
}

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_tools_returns_all_hotel_tools() {
    let (client, server_handle) = setup().await;

    let tools = client.list_tools(None).await.expect("list_tools should work");
    let tool_names: Vec<String> = tools.tools.iter().map(|t| t.name.to_string()).collect();

    let expected = [
        "hotel_list_properties",
        "hotel_check_overlap",
        "hotel_create_reservation",
        "hotel_update_reservation_status",
        "hotel_list_reservations",
        "hotel_get_reservation",
        "hotel_availability_grid",
        "hotel_revenue_report",
        "hotel_occupancy_report",
        "hotel_export_report",
        "hotel_pricing_rules",
        "hotel_clear_statistics",
        "hotel_clear_reservations",
    ];
    assert_eq!(tool_names.len(), expected.len(), "got {tool_names:?}");
    for name in &expected {
        assert!(tool_names.contains(&name.to_string()), "Missing tool: {name}");
    }

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn list_properties_shows_demo_hotel() {
    let (client, server_handle) = setup().await;

    let result = call(&client, "hotel_list_properties", serde_json::json!({})).await;
    assert_success(&result);
    let text = extract_text(&result);
    assert!(text.contains("Grand Hotel Demo"), "got: {text}");
    assert!(text.contains(DEMO_PROPERTY_ID));

    teardown(client, server_handle).await;
}

// ---------------------------------------------------------------------------
// Booking flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn back_to_back_stays_do_not_conflict() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let overlapping = call(
        &client,
        "hotel_check_overlap",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "room_id": "room-101",
            "check_in": "2024-05-05",
            "check_out": "2024-05-08",
        }),
    )
    .await;
    assert!(extract_text(&overlapping).contains("conflicts with reservation rsv-1"));

    let adjacent = call(
        &client,
        "hotel_create_reservation",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "room_id": "room-101",
            "guest_name": "Alan Turing",
            "check_in": "2024-05-06",
            "check_out": "2024-05-08",
            "total_price": "200",
        }),
    )
    .await;
    assert_success(&adjacent);
    assert!(extract_text(&adjacent).contains("rsv-2"));

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn double_booking_is_rejected() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let result = call(
        &client,
        "hotel_create_reservation",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "room_id": "room-101",
            "guest_name": "Alan Turing",
            "check_in": "2024-05-01",
            "check_out": "2024-05-03",
            "total_price": "200",
        }),
    )
    .await;
    assert_eq!(result.is_error, Some(true));
    assert!(extract_text(&result).contains("not available"));

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn cancelled_stay_frees_the_room() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let result = call(
        &client,
        "hotel_update_reservation_status",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "reservation_id": "rsv-1",
            "status": "cancelled",
        }),
    )
    .await;
    assert_success(&result);

    let check = call(
        &client,
        "hotel_check_overlap",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "room_id": "room-101",
            "check_in": "2024-05-03",
            "check_out": "2024-05-04",
            "format": "json",
        }),
    )
    .await;
    let json: serde_json::Value = serde_json::from_str(&extract_text(&check)).unwrap();
    assert_eq!(json["conflict"], false);

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn reservations_are_discoverable_by_status() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;
    let pending = call(
        &client,
        "hotel_create_reservation",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "room_id": "room-102",
            "guest_name": "Alan Turing",
            "check_in": "2024-05-20",
            "check_out": "2024-05-22",
            "total_price": "200",
        }),
    )
    .await;
    assert_success(&pending);

    let listed = call(
        &client,
        "hotel_list_reservations",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "status": "PENDING",
            "format": "json",
        }),
    )
    .await;
    assert_success(&listed);
    let json: serde_json::Value = serde_json::from_str(&extract_text(&listed)).unwrap();
    let found = json["reservations"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], "rsv-2");
    assert_eq!(found[0]["room_id"], "room-102");

    let detail = call(
        &client,
        "hotel_get_reservation",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "reservation_id": "rsv-1",
        }),
    )
    .await;
    assert_success(&detail);
    let text = extract_text(&detail);
    assert!(text.contains("Reservation rsv-1 [CONFIRMED]"), "got: {text}");
    assert!(text.contains("Guest: Grace Hopper <Grace@Example.com>"), "got: {text}");
    assert!(text.contains("Service: svc-breakfast x2"), "got: {text}");

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn huge_price_is_rejected_and_reports_keep_working() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let result = call(
        &client,
        "hotel_create_reservation",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "room_id": "room-102",
            "guest_name": "Alan Turing",
            "check_in": "2024-05-02",
            "check_out": "2024-05-03",
            "total_price": "79228162514264337593543950335",
        }),
    )
    .await;
    assert_eq!(result.is_error, Some(true));
    assert!(extract_text(&result).contains("must not exceed"));

    let report = call(
        &client,
        "hotel_revenue_report",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "start_date": "2024-05-01",
            "end_date": "2024-05-10",
        }),
    )
    .await;
    assert_success(&report);
    assert!(extract_text(&report).contains("Total revenue: 430.00"));

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn missing_required_argument_is_a_protocol_error() {
    let (client, server_handle) = setup().await;

    let result = client
        .call_tool(tool_params(
            "hotel_check_overlap",
            serde_json::json!({ "property_id": DEMO_PROPERTY_ID }),
        ))
        .await;
    assert!(result.is_err(), "missing room_id should fail to deserialize");

    teardown(client, server_handle).await;
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revenue_report_computes_kpis() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let result = call(
        &client,
        "hotel_revenue_report",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "start_date": "2024-05-01",
            "end_date": "2024-05-10",
        }),
    )
    .await;
    assert_success(&result);
    let text = extract_text(&result);
    // 400 room + 2 x 15 breakfast over 4 of 80 room-nights
    assert!(text.contains("Total revenue: 430.00"), "got: {text}");
    assert!(text.contains("Occupancy rate: 5.0%"), "got: {text}");
    assert!(text.contains("ADR: 107.50"), "got: {text}");
    assert!(text.contains("RevPAR: 5.38"), "got: {text}");

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn availability_grid_marks_booked_days() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let result = call(
        &client,
        "hotel_availability_grid",
        serde_json::json!({
            "property_id": DEMO_PROPERTY_ID,
            "month": "2024-05",
            "format": "json",
        }),
    )
    .await;
    assert_success(&result);
    let grid: serde_json::Value = serde_json::from_str(&extract_text(&result)).unwrap();
    assert_eq!(grid["statistics"]["total_rooms"], 8);
    assert_eq!(grid["statistics"]["total_possible_room_nights"], 248);
    assert_eq!(grid["statistics"]["total_occupied_room_nights"], 4);

    let room_101 = grid["rooms"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["room_id"] == "room-101")
        .unwrap();
    let days = room_101["daily_availability"].as_array().unwrap();
    assert_eq!(days[0]["available"], true);
    assert_eq!(days[1]["available"], false);
    assert_eq!(days[4]["available"], false);
    assert_eq!(days[5]["available"], true);
    assert_eq!(room_101["available_days"], 27);

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn occupancy_export_defaults_to_trailing_window() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let result = call(
        &client,
        "hotel_export_report",
        serde_json::json!({ "property_id": DEMO_PROPERTY_ID }),
    )
    .await;
    assert_success(&result);
    let csv = extract_text(&result);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Date,Total Rooms,Occupied Rooms,Occupancy Rate");
    assert_eq!(lines.len(), 31);
    assert!(lines.contains(&"2024-05-02,8,1,12.5%"), "got: {csv}");
    assert!(lines.contains(&"2024-05-06,8,0,0.0%"), "got: {csv}");

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn pricing_rules_lists_weekend_rate() {
    let (client, server_handle) = setup().await;

    let result = call(
        &client,
        "hotel_pricing_rules",
        serde_json::json!({ "property_id": DEMO_PROPERTY_ID }),
    )
    .await;
    assert_success(&result);
    assert!(extract_text(&result).contains("Weekend Rate"));

    teardown(client, server_handle).await;
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_statistics_keeps_active_stays() {
    let (client, server_handle) = setup().await;
    book_confirmed_stay(&client).await;

    let result = call(
        &client,
        "hotel_clear_statistics",
        serde_json::json!({ "property_id": DEMO_PROPERTY_ID, "confirm": true }),
    )
    .await;
    assert!(extract_text(&result).contains("Deleted 0 "));

    let result = call(
        &client,
        "hotel_clear_reservations",
        serde_json::json!({ "property_id": DEMO_PROPERTY_ID, "confirm": true }),
    )
    .await;
    assert!(extract_text(&result).contains("Deleted 1 reservations"));

    teardown(client, server_handle).await;
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_resources_empty_initially() {
    let (client, server_handle) = setup().await;

    let result = client
        .peer()
        .list_resources(None)
        .await
        .expect("list_resources should succeed");
    assert!(result.resources.is_empty());

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn report_is_readable_as_resource() {
    let (client, server_handle) = setup().await;

    let _ = call(
        &client,
        "hotel_revenue_report",
        serde_json::json!({ "property_id": DEMO_PROPERTY_ID }),
    )
    .await;

    let listed = client
        .peer()
        .list_resources(None)
        .await
        .expect("list_resources should succeed");
    let uri = format!("hotel://property/{DEMO_PROPERTY_ID}/revenue");
    assert!(listed.resources.iter().any(|r| r.raw.uri == uri));

    let result = client
        .peer()
        .read_resource(ReadResourceRequestParams {
            uri: uri.clone(),
            meta: None,
        })
        .await
        .expect("read_resource should succeed");
    assert!(!result.contents.is_empty());

    teardown(client, server_handle).await;
}

#[tokio::test]
async fn read_resource_not_found_returns_error() {
    let (client, server_handle) = setup().await;

    let result = client
        .peer()
        .read_resource(ReadResourceRequestParams {
            uri: "hotel://property/nowhere/revenue".into(),
            meta: None,
        })
        .await;
    assert!(result.is_err());

    teardown(client, server_handle).await;
}
