use serde::{Serialize, Deserialize};
use serde_with::skip_serializing_none;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Configurator submission for `POST /api/generate-mockup`.
///
/// Every field is free-form; only `design_prompt` is checked server-side.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MockupConfiguration {
    #[serde(default)]
    pub clothing_type: String,
    #[serde(default)]
    pub base_color: String,
    #[serde(default)]
    pub fit: String,
    #[serde(default)]
    pub branding_style: String,
    #[serde(default)]
    pub placement: String,
    #[serde(default)]
    pub design_prompt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Mockups {
    pub front: String,
    pub back: String,
}

/// Response contract of the mockup endpoint.
///
/// `success == true` carries both URLs; `success == false` carries two empty
/// strings and an `error`. Use the constructors rather than building it by hand.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MockupResult {
    pub success: bool,
    pub mockups: Mockups,
    pub error: Option<String>,
}

impl MockupResult {
    pub fn succeeded(front: String, back: String) -> Self {
        Self { success: true, mockups: Mockups { front, back }, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, mockups: Mockups::default(), error: Some(error.into()) }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn in_transit(self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::Shipped)
    }
}

/// An order as owned by the external order system.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub item_name: String,
    pub collection_name: String,
    pub price: f64,
    pub quantity: u32,
    pub status: OrderStatus,
    #[serde(default)]
    pub image: Option<String>,
    /// ISO8601 as issued by the order system, passed through untouched.
    pub created_at: String,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
}

impl Order {
    /// `created_at` as a sortable instant. Offset-less values are taken as UTC.
    pub fn placed_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

/// Figures the dashboard derives from a wallet's order list.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: usize,
    pub total_spent: f64,
    pub in_transit: usize,
}

impl OrderSummary {
    pub fn from_orders(orders: &[Order]) -> Self {
        Self {
            total_orders: orders.len(),
            total_spent: orders.iter().map(|o| o.price * f64::from(o.quantity)).sum(),
            in_transit: orders.iter().filter(|o| o.status.in_transit()).count(),
        }
    }
}
