use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TapInitRequest {
    pub customer_email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TapInitResponse {
    pub charge_id: String,
    pub redirect_url: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TapStatusRequest {
    pub charge_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TapStatusResponse {
    pub status: String,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct TapWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: TapCharge,
}

#[derive(Debug, Deserialize)]
pub struct TapCharge {
    pub id: String,
    #[serde(default)]
    pub metadata: TapMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct TapMetadata {
    pub cart_id: Option<Uuid>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TelrPlaceRequest {
    pub cart_id: Uuid,
    #[serde(default = "default_description")]
    pub description: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postcode: String,
}

fn default_description() -> String {
    "Storefront order".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TelrPlaceResponse {
    pub payment_url: String,
    pub order_ref: String,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    pub order_ref: Option<String>,
}
