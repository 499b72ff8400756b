use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::{DateTime, Utc};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
        ResourceTemplate, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::calendar::{DateWindow, format_day, parse_day, parse_instant, parse_month};
use crate::domain::catalog::PricingRule;
use crate::domain::export::{ExportedReport, ReportKind};
use crate::domain::property::Property;
use crate::domain::reservation::{
    Guest, NewReservation, Reservation, ReservationStatus, ServiceLine,
};
use crate::domain::revenue::{DailyOccupancy, format_money, format_rate};
use crate::engine::ReservationEngine;
use crate::error::{self, HotelError};
use crate::ports::repository::ReservationFilter;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ---------- Resource Store ----------

/// Thread-safe store of generated reports exposed as MCP resources.
/// Keys are URIs like `hotel://property/demo-instance-id/revenue`.
#[derive(Clone, Default)]
pub struct ResourceStore {
    entries: Arc<RwLock<HashMap<String, ResourceEntry>>>,
}

#[derive(Clone)]
struct ResourceEntry {
    name: String,
    mime_type: &'static str,
    text: String,
}

impl ResourceStore {
    async fn insert(&self, uri: impl Into<String>, name: impl Into<String>, text: String) {
        self.insert_typed(uri, name, "text/plain", text).await;
    }

    async fn insert_typed(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        mime_type: &'static str,
        text: String,
    ) {
        self.entries.write().await.insert(
            uri.into(),
            ResourceEntry {
                name: name.into(),
                mime_type,
                text,
            },
        );
    }

    async fn get(&self, uri: &str) -> Option<ResourceEntry> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn list(&self) -> Vec<(String, String, &'static str)> {
        let mut entries: Vec<(String, String, &'static str)> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(uri, entry)| (uri.clone(), entry.name.clone(), entry.mime_type))
            .collect();
        entries.sort();
        entries
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore").finish()
    }
}

fn property_uri(property_id: &str, report: &str) -> String {
    format!("hotel://property/{property_id}/{report}")
}

// ---------- Tool parameter types ----------

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ListPropertiesToolParams {
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct PropertyToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CheckOverlapToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Room ID to check
    pub room_id: String,
    /// Check-in: YYYY-MM-DD (midnight UTC) or an RFC 3339 timestamp
    pub check_in: String,
    /// Check-out: YYYY-MM-DD (midnight UTC) or an RFC 3339 timestamp. Must be after check-in.
    pub check_out: String,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ServiceLineParams {
    /// Service ID
    pub service_id: String,
    /// Quantity (at least 1)
    pub quantity: u32,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateReservationToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Room ID to book
    pub room_id: String,
    /// Guest full name
    pub guest_name: String,
    /// Guest email address
    pub guest_email: Option<String>,
    /// Guest phone number
    pub guest_phone: Option<String>,
    /// Check-in: YYYY-MM-DD (midnight UTC) or an RFC 3339 timestamp
    pub check_in: String,
    /// Check-out: YYYY-MM-DD (midnight UTC) or an RFC 3339 timestamp
    pub check_out: String,
    /// Number of adults (default: 1)
    pub adults: Option<u32>,
    /// Number of children (default: 0)
    pub children: Option<u32>,
    /// Total price for the stay as a decimal string, e.g. "450.00"
    pub total_price: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Extra services booked with the stay
    pub services: Option<Vec<ServiceLineParams>>,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct UpdateStatusToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Reservation ID
    pub reservation_id: String,
    /// New status: PENDING, CONFIRMED, CHECKED_IN, CHECKED_OUT or CANCELLED
    pub status: String,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ListReservationsToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Only this status: PENDING, CONFIRMED, CHECKED_IN, CHECKED_OUT, CANCELLED or "all" (default)
    pub status: Option<String>,
    /// Only reservations of this room
    pub room_id: Option<String>,
    /// Only stays touching this range: first day (YYYY-MM-DD), use with end_date
    pub start_date: Option<String>,
    /// Last day, inclusive (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetReservationToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Reservation ID, e.g. "rsv-1"
    pub reservation_id: String,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AvailabilityToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Month to show (YYYY-MM). Defaults to the current month.
    pub month: Option<String>,
    /// First day (YYYY-MM-DD). Use with end_date instead of month.
    pub start_date: Option<String>,
    /// Last day, inclusive (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ReportWindowToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// First day (YYYY-MM-DD). Defaults to the trailing window ending today.
    pub start_date: Option<String>,
    /// Last day, inclusive (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Output format: "text" (default) or "json"
    pub format: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ExportToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Report type: "occupancy" (default) or "revenue"
    pub report_type: Option<String>,
    /// First day (YYYY-MM-DD). Defaults to the trailing window ending today.
    pub start_date: Option<String>,
    /// Last day, inclusive (YYYY-MM-DD)
    pub end_date: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ClearToolParams {
    /// Property ID (from hotel_list_properties)
    pub property_id: String,
    /// Must be true. Deleted reservations cannot be restored.
    pub confirm: bool,
}

// ---------- Output helpers ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: Option<&str>) -> error::Result<Self> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("" | "text") => Ok(Self::Text),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(HotelError::validation(format!(
                "unknown format '{other}', expected 'text' or 'json'"
            ))),
        }
    }
}

fn render<T>(value: &T, format: OutputFormat) -> error::Result<String>
where
    T: Serialize + std::fmt::Display,
{
    match format {
        OutputFormat::Text => Ok(value.to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

/// `month` wins over explicit bounds; both bounds must come together.
fn parse_window(
    month: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> error::Result<Option<DateWindow>> {
    if let Some(month) = month.filter(|m| !m.trim().is_empty()) {
        return parse_month(month).map(Some);
    }
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => Ok(Some(DateWindow::new(parse_day(start)?, parse_day(end)?)?)),
        _ => Err(HotelError::validation(
            "start_date and end_date must be given together",
        )),
    }
}

fn failure(action: &str, e: &HotelError) -> CallToolResult {
    let hint = match e {
        HotelError::NotFound {
            resource: "Property",
            ..
        } => " Use hotel_list_properties to see the properties you manage.",
        HotelError::NotFound {
            resource: "Reservation",
            ..
        } => " Use hotel_list_reservations to find reservation IDs.",
        HotelError::Conflict { .. } => {
            " Pick other dates or another room; hotel_availability_grid shows free nights."
        }
        HotelError::InvalidTransition { .. } => {
            " Allowed: PENDING -> CONFIRMED -> CHECKED_IN -> CHECKED_OUT, and CANCELLED from any of the first three."
        }
        _ => "",
    };
    CallToolResult::error(vec![Content::text(format!("{action}: {e}.{hint}"))])
}

#[derive(Serialize)]
struct PropertyList<'a> {
    properties: &'a [Property],
}

impl std::fmt::Display for PropertyList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.properties.is_empty() {
            return writeln!(f, "No properties found for this account.");
        }
        writeln!(f, "Properties ({}):", self.properties.len())?;
        for p in self.properties {
            writeln!(f, "- **{}** (ID: {}, currency {})", p.name, p.id, p.currency)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct PricingRuleList<'a> {
    property_id: &'a str,
    rules: &'a [PricingRule],
}

impl std::fmt::Display for PricingRuleList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# Pricing rules: property {}", self.property_id)?;
        if self.rules.is_empty() {
            return writeln!(f, "No pricing rules defined.");
        }
        for rule in self.rules {
            writeln!(f, "- {rule}")?;
            if let Some(description) = &rule.description {
                writeln!(f, "  {description}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ReservationList<'a> {
    property_id: &'a str,
    reservations: &'a [Reservation],
}

impl std::fmt::Display for ReservationList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "# Reservations: property {} ({} found)",
            self.property_id,
            self.reservations.len()
        )?;
        if self.reservations.is_empty() {
            return writeln!(f, "No reservations match.");
        }
        for r in self.reservations {
            writeln!(
                f,
                "- {} [{}] room {}: {} to {} ({} nights), {}, total {}",
                r.id,
                r.status,
                r.room_id,
                format_day(r.stay.check_in_date()),
                format_day(r.stay.check_out().date_naive()),
                r.stay.nights(),
                r.guest.name,
                format_money(r.total_price)
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct OccupancySeries<'a> {
    property_id: &'a str,
    days: &'a [DailyOccupancy],
}

impl std::fmt::Display for OccupancySeries<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (Some(first), Some(last)) = (self.days.first(), self.days.last()) else {
            return writeln!(f, "# Occupancy: property {} (no days)", self.property_id);
        };
        writeln!(
            f,
            "# Occupancy: property {} ({} to {})",
            self.property_id, first.date, last.date
        )?;
        let days = Decimal::from(self.days.len());
        let average = self.days.iter().map(|d| d.occupancy_rate).sum::<Decimal>() / days;
        writeln!(f, "Average occupancy: {}", format_rate(average))?;
        // earliest day wins a tie
        if let Some(peak) = self.days.iter().rev().max_by_key(|d| d.occupancy_rate) {
            writeln!(
                f,
                "Peak: {} ({})",
                peak.date,
                format_rate(peak.occupancy_rate)
            )?;
        }
        writeln!(f)?;
        for day in self.days {
            writeln!(f, "{day}")?;
        }
        Ok(())
    }
}

// ---------- MCP Server ----------

#[derive(Clone)]
pub struct HotelMcpServer {
    engine: Arc<ReservationEngine>,
    tenant_id: String,
    clock: Clock,
    tool_router: ToolRouter<Self>,
    resources: ResourceStore,
}

#[tool_router]
impl HotelMcpServer {
    pub fn new(engine: Arc<ReservationEngine>, tenant_id: impl Into<String>) -> Self {
        Self {
            engine,
            tenant_id: tenant_id.into(),
            clock: Arc::new(Utc::now),
            tool_router: Self::tool_router(),
            resources: ResourceStore::default(),
        }
    }

    /// Replace the wall clock, e.g. to pin "today" in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// List the properties managed by this account.
    #[tool(
        name = "hotel_list_properties",
        description = "List the hotel properties managed by this account with their IDs and currency. Start here: every other hotel tool needs a property ID.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_list_properties(
        &self,
        Parameters(params): Parameters<ListPropertiesToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.list_properties_text(&params).await {
            Ok(text) => {
                self.resources
                    .insert("hotel://properties", "Properties", text.clone())
                    .await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Failed to list properties", &e)),
        }
    }

    /// Check whether a room is free for a proposed stay.
    #[tool(
        name = "hotel_check_overlap",
        description = "Check whether a room can be booked for a stay. Stays are half-open [check_in, check_out): a stay may start on the day another ends. Only PENDING, CONFIRMED and CHECKED_IN reservations block a room. Returns the conflicting reservation ID if any.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_check_overlap(
        &self,
        Parameters(params): Parameters<CheckOverlapToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.check_overlap_text(&params).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(failure(
                &format!("Failed to check room '{}'", params.room_id),
                &e,
            )),
        }
    }

    /// Create a PENDING reservation after validating input and overlap.
    #[tool(
        name = "hotel_create_reservation",
        description = "Create a reservation in PENDING status with nothing paid. Validates guest name, adults >= 1, a price between 0 and 1000000000, service quantities and dates, then rejects the booking if it overlaps an active reservation on the same room.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn hotel_create_reservation(
        &self,
        Parameters(params): Parameters<CreateReservationToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let room_id = params.room_id.clone();
        match self.create_reservation_text(params).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(failure(
                &format!("Failed to book room '{room_id}'"),
                &e,
            )),
        }
    }

    /// Move a reservation through its status lifecycle.
    #[tool(
        name = "hotel_update_reservation_status",
        description = "Change a reservation's status. Allowed moves: PENDING -> CONFIRMED -> CHECKED_IN -> CHECKED_OUT, and CANCELLED from PENDING, CONFIRMED or CHECKED_IN. CHECKED_OUT and CANCELLED are final. Setting the current status again is a no-op.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn hotel_update_reservation_status(
        &self,
        Parameters(params): Parameters<UpdateStatusToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.update_status_text(&params).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(failure(
                &format!("Failed to update reservation '{}'", params.reservation_id),
                &e,
            )),
        }
    }

    /// List reservations with optional status, room and date filters.
    #[tool(
        name = "hotel_list_reservations",
        description = "List a property's reservations, earliest check-in first, with ID, status, room, dates, guest and total. Filter by status (or \"all\"), room_id and a start_date/end_date range the stay must touch. Use the IDs with hotel_get_reservation and hotel_update_reservation_status.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_list_reservations(
        &self,
        Parameters(params): Parameters<ListReservationsToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.list_reservations_text(&params).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(failure("Failed to list reservations", &e)),
        }
    }

    /// Full details of one reservation.
    #[tool(
        name = "hotel_get_reservation",
        description = "Show one reservation in full: guest contact, exact stay instants, occupants, total, paid and outstanding amounts, booked services and notes.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_get_reservation(
        &self,
        Parameters(params): Parameters<GetReservationToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.reservation_text(&params).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(failure(
                &format!("Failed to get reservation '{}'", params.reservation_id),
                &e,
            )),
        }
    }

    /// Day-by-day availability of every room.
    #[tool(
        name = "hotel_availability_grid",
        description = "Day-by-day availability of every room for a month (default: current month) or a date range: per-room available days and occupancy, per-room-type breakdown, property totals and rooms available today. A room is unavailable when its status is not AVAILABLE or a CONFIRMED, CHECKED_IN or CHECKED_OUT stay covers that day.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_availability_grid(
        &self,
        Parameters(params): Parameters<AvailabilityToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.availability_text(&params).await {
            Ok(text) => {
                let uri = property_uri(&params.property_id, "availability");
                let name = format!("Availability: property {}", params.property_id);
                self.resources.insert(uri, name, text.clone()).await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Failed to build availability grid", &e)),
        }
    }

    /// Revenue and occupancy KPIs over a window.
    #[tool(
        name = "hotel_revenue_report",
        description = "Revenue and occupancy KPIs over a date range (default: trailing 30 days): daily room and service revenue attributed to the check-in day, total revenue, occupied nights, occupancy rate, ADR (revenue / occupied nights) and RevPAR (ADR x occupancy).",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_revenue_report(
        &self,
        Parameters(params): Parameters<ReportWindowToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.revenue_text(&params).await {
            Ok(text) => {
                let uri = property_uri(&params.property_id, "revenue");
                let name = format!("Revenue: property {}", params.property_id);
                self.resources.insert(uri, name, text.clone()).await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Failed to build revenue report", &e)),
        }
    }

    /// Daily occupied-room counts over a window.
    #[tool(
        name = "hotel_occupancy_report",
        description = "Daily occupancy over a date range (default: trailing 30 days): total rooms, rooms occupied at midnight and occupancy rate for each day, with the average and peak day.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_occupancy_report(
        &self,
        Parameters(params): Parameters<ReportWindowToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.occupancy_text(&params).await {
            Ok(text) => {
                let uri = property_uri(&params.property_id, "occupancy");
                let name = format!("Occupancy: property {}", params.property_id);
                self.resources.insert(uri, name, text.clone()).await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Failed to build occupancy report", &e)),
        }
    }

    /// Export occupancy or revenue as CSV.
    #[tool(
        name = "hotel_export_report",
        description = "Export a daily report as CSV. report_type 'occupancy' (default) gives Date,Total Rooms,Occupied Rooms,Occupancy Rate; 'revenue' gives Date,Room Revenue,Service Revenue,Total Revenue. Covers the trailing 30 days unless a range is given.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_export_report(
        &self,
        Parameters(params): Parameters<ExportToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.export(&params).await {
            Ok(export) => {
                let uri = property_uri(&params.property_id, &format!("export/{}", export.kind));
                self.resources
                    .insert_typed(uri, export.filename.clone(), export.content_type, export.body.clone())
                    .await;
                Ok(CallToolResult::success(vec![
                    Content::text(export.body),
                    Content::text(format!(
                        "File name: {} ({})",
                        export.filename, export.content_type
                    )),
                ]))
            }
            Err(e) => Ok(failure("Failed to export report", &e)),
        }
    }

    /// Stored pricing rules, highest priority first.
    #[tool(
        name = "hotel_pricing_rules",
        description = "List the property's stored pricing rules (seasonal, weekend, weekday, special) ordered by priority, highest first. Rules are informational: they are not applied to reservation prices.",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn hotel_pricing_rules(
        &self,
        Parameters(params): Parameters<PropertyToolParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.pricing_rules_text(&params).await {
            Ok(text) => {
                let uri = property_uri(&params.property_id, "pricing-rules");
                let name = format!("Pricing rules: property {}", params.property_id);
                self.resources.insert(uri, name, text.clone()).await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(failure("Failed to list pricing rules", &e)),
        }
    }

    /// Delete finished and cancelled reservations.
    #[tool(
        name = "hotel_clear_statistics",
        description = "Delete all CHECKED_OUT and CANCELLED reservations of a property, resetting historical statistics. Active reservations are kept. Requires confirm=true.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn hotel_clear_statistics(
        &self,
        Parameters(params): Parameters<ClearToolParams>,
    ) -> Result<CallToolResult, McpError> {
        if !params.confirm {
            return Ok(CallToolResult::error(vec![Content::text(
                "Refusing to delete reservations without confirm=true.",
            )]));
        }
        match self
            .engine
            .clear_statistics(&self.tenant_id, &params.property_id)
            .await
        {
            Ok(deleted) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Deleted {deleted} checked-out or cancelled reservations from property {}.",
                params.property_id
            ))])),
            Err(e) => Ok(failure("Failed to clear statistics", &e)),
        }
    }

    /// Delete every reservation of a property.
    #[tool(
        name = "hotel_clear_reservations",
        description = "Delete ALL reservations of a property, including active ones. Requires confirm=true. This cannot be undone.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn hotel_clear_reservations(
        &self,
        Parameters(params): Parameters<ClearToolParams>,
    ) -> Result<CallToolResult, McpError> {
        if !params.confirm {
            return Ok(CallToolResult::error(vec![Content::text(
                "Refusing to delete reservations without confirm=true.",
            )]));
        }
        match self
            .engine
            .clear_reservations(&self.tenant_id, &params.property_id)
            .await
        {
            Ok(deleted) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Deleted {deleted} reservations from property {}.",
                params.property_id
            ))])),
            Err(e) => Ok(failure("Failed to clear reservations", &e)),
        }
    }
}

// ---------- Tool bodies ----------

impl HotelMcpServer {
    async fn list_properties_text(
        &self,
        params: &ListPropertiesToolParams,
    ) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let properties = self.engine.list_properties(&self.tenant_id).await?;
        render(
            &PropertyList {
                properties: &properties,
            },
            format,
        )
    }

    async fn check_overlap_text(&self, params: &CheckOverlapToolParams) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let check_in = parse_instant(&params.check_in)?;
        let check_out = parse_instant(&params.check_out)?;
        let result = self
            .engine
            .check_overlap(
                &self.tenant_id,
                &params.property_id,
                &params.room_id,
                check_in,
                check_out,
            )
            .await?;
        render(&result, format)
    }

    async fn create_reservation_text(
        &self,
        params: CreateReservationToolParams,
    ) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let total_price = Decimal::from_str(params.total_price.trim()).map_err(|e| {
            HotelError::validation(format!("invalid total price '{}': {e}", params.total_price))
        })?;
        let request = NewReservation {
            room_id: params.room_id,
            guest: Guest {
                name: params.guest_name,
                email: params.guest_email,
                phone: params.guest_phone,
            },
            check_in: parse_instant(&params.check_in)?,
            check_out: parse_instant(&params.check_out)?,
            adults: params.adults.unwrap_or(1),
            children: params.children.unwrap_or(0),
            total_price,
            notes: params.notes,
            services: params
                .services
                .unwrap_or_default()
                .into_iter()
                .map(|line| ServiceLine {
                    service_id: line.service_id,
                    quantity: line.quantity,
                })
                .collect(),
        };
        let created = self
            .engine
            .create_reservation(&self.tenant_id, &params.property_id, request, self.now())
            .await?;
        match format {
            OutputFormat::Text => Ok(format!("Reservation created.\n\n{created}")),
            OutputFormat::Json => render(&created, format),
        }
    }

    async fn update_status_text(&self, params: &UpdateStatusToolParams) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let status = ReservationStatus::from_str(&params.status)?;
        let updated = self
            .engine
            .change_status(
                &self.tenant_id,
                &params.property_id,
                &params.reservation_id,
                status,
            )
            .await?;
        render(&updated, format)
    }

    async fn list_reservations_text(
        &self,
        params: &ListReservationsToolParams,
    ) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let mut filter = ReservationFilter::all();
        if let Some(status) = params
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
        {
            filter = filter.with_statuses(&[ReservationStatus::from_str(status)?]);
        }
        if let Some(room_id) = params.room_id.as_deref().filter(|r| !r.trim().is_empty()) {
            filter = filter.for_room(room_id.trim());
        }
        if let Some(window) =
            parse_window(None, params.start_date.as_deref(), params.end_date.as_deref())?
        {
            filter = filter.overlapping(&window);
        }
        let reservations = self
            .engine
            .list_reservations(&self.tenant_id, &params.property_id, &filter)
            .await?;
        render(
            &ReservationList {
                property_id: &params.property_id,
                reservations: &reservations,
            },
            format,
        )
    }

    async fn reservation_text(&self, params: &GetReservationToolParams) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let reservation = self
            .engine
            .reservation(&self.tenant_id, &params.property_id, &params.reservation_id)
            .await?;
        render(&reservation, format)
    }

    async fn availability_text(&self, params: &AvailabilityToolParams) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let window = parse_window(
            params.month.as_deref(),
            params.start_date.as_deref(),
            params.end_date.as_deref(),
        )?;
        let grid = self
            .engine
            .availability_grid(&self.tenant_id, &params.property_id, window, self.now())
            .await?;
        render(&grid, format)
    }

    async fn revenue_text(&self, params: &ReportWindowToolParams) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let window = parse_window(None, params.start_date.as_deref(), params.end_date.as_deref())?;
        let report = self
            .engine
            .revenue_report(&self.tenant_id, &params.property_id, window, self.now())
            .await?;
        render(&report, format)
    }

    async fn occupancy_text(&self, params: &ReportWindowToolParams) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let window = parse_window(None, params.start_date.as_deref(), params.end_date.as_deref())?;
        let days = self
            .engine
            .occupancy_series(&self.tenant_id, &params.property_id, window, self.now())
            .await?;
        render(
            &OccupancySeries {
                property_id: &params.property_id,
                days: &days,
            },
            format,
        )
    }

    async fn export(&self, params: &ExportToolParams) -> error::Result<ExportedReport> {
        let kind = ReportKind::from_str(params.report_type.as_deref().unwrap_or_default())?;
        let window = parse_window(None, params.start_date.as_deref(), params.end_date.as_deref())?;
        self.engine
            .export_report(&self.tenant_id, &params.property_id, kind, window, self.now())
            .await
    }

    async fn pricing_rules_text(&self, params: &PropertyToolParams) -> error::Result<String> {
        let format = OutputFormat::parse(params.format.as_deref())?;
        let rules = self
            .engine
            .list_pricing_rules(&self.tenant_id, &params.property_id)
            .await?;
        let mut text = render(
            &PricingRuleList {
                property_id: &params.property_id,
                rules: &rules,
            },
            format,
        )?;
        if format == OutputFormat::Text && !rules.is_empty() {
            let _ = writeln!(
                text,
                "\nRules are stored for reference; reservation prices are entered explicitly."
            );
        }
        Ok(text)
    }
}

#[tool_handler]
impl ServerHandler for HotelMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Hotel reservation MCP server: double-booking checks, availability grids and revenue/occupancy analytics.\n\
                 \n\
                 ## Getting started\n\
                 Call hotel_list_properties to get property IDs. Dates are YYYY-MM-DD; stay boundaries \
                 also accept RFC 3339 timestamps. Stays are half-open [check_in, check_out).\n\
                 \n\
                 ## Reservations\n\
                 - hotel_check_overlap: is a room free for a stay?\n\
                 - hotel_create_reservation: book a room (starts PENDING)\n\
                 - hotel_update_reservation_status: confirm, check in, check out or cancel\n\
                 - hotel_list_reservations: find reservations by status, room or dates\n\
                 - hotel_get_reservation: full details of one reservation\n\
                 \n\
                 ## Reports\n\
                 - hotel_availability_grid: per-day, per-room availability for a month\n\
                 - hotel_revenue_report: revenue, occupancy, ADR and RevPAR\n\
                 - hotel_occupancy_report: daily occupied rooms\n\
                 - hotel_export_report: CSV export (occupancy or revenue)\n\
                 - hotel_pricing_rules: stored pricing rules by priority\n\
                 \n\
                 ## Maintenance\n\
                 - hotel_clear_statistics: delete checked-out and cancelled reservations\n\
                 - hotel_clear_reservations: delete every reservation\n\
                 Both require confirm=true.\n\
                 \n\
                 ## Resources\n\
                 Reports are kept as MCP resources under hotel://property/{id}/{report}. \
                 Add format=\"json\" to most tools for machine-readable output."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let entries = self.resources.list().await;
        let resources: Vec<Resource> = entries
            .into_iter()
            .map(|(uri, name, mime_type)| Resource {
                annotations: None,
                raw: RawResource {
                    uri,
                    name,
                    title: None,
                    description: None,
                    mime_type: Some(mime_type.into()),
                    size: None,
                    icons: None,
                    meta: None,
                },
            })
            .collect();
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let template = |uri_template: &str, name: &str, title: &str, description: &str, mime: &str| {
            ResourceTemplate {
                annotations: None,
                raw: RawResourceTemplate {
                    uri_template: uri_template.into(),
                    name: name.into(),
                    title: Some(title.into()),
                    description: Some(description.into()),
                    mime_type: Some(mime.into()),
                    icons: None,
                },
            }
        };
        let templates = vec![
            template(
                "hotel://property/{id}/availability",
                "Availability Grid",
                "Room availability grid",
                "Per-day, per-room availability (generated by hotel_availability_grid)",
                "text/plain",
            ),
            template(
                "hotel://property/{id}/revenue",
                "Revenue Report",
                "Revenue and occupancy KPIs",
                "Daily revenue, ADR, RevPAR (generated by hotel_revenue_report)",
                "text/plain",
            ),
            template(
                "hotel://property/{id}/occupancy",
                "Occupancy Report",
                "Daily occupancy",
                "Rooms occupied per day (generated by hotel_occupancy_report)",
                "text/plain",
            ),
            template(
                "hotel://property/{id}/export/{type}",
                "CSV Export",
                "CSV report export",
                "Occupancy or revenue CSV (generated by hotel_export_report)",
                "text/csv",
            ),
            template(
                "hotel://property/{id}/pricing-rules",
                "Pricing Rules",
                "Stored pricing rules",
                "Pricing rules by priority (generated by hotel_pricing_rules)",
                "text/plain",
            ),
        ];
        Ok(ListResourceTemplatesResult {
            resource_templates: templates,
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match self.resources.get(&request.uri).await {
            Some(entry) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(entry.text, request.uri)],
            }),
            None => Err(McpError::resource_not_found(
                format!("resource not found: {}", request.uri),
                None,
            )),
        }
    }
}
