use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::{AddOnOption, SelectedAddOn};

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub area: String,
    pub cuisine_type: String,
    pub is_open: bool,
    pub delivery_fee: i64,
    pub min_order: i64,
    pub delivery_time: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AddOnGroup {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub is_required: bool,
    pub max_selections: i32,
    #[schema(value_type = Vec<AddOnOption>)]
    pub options: sqlx::types::Json<Vec<AddOnOption>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub address_line: String,
    pub area: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Delivery address fields frozen onto an order at checkout; deleting the
/// address row later does not touch placed orders.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AddressSnapshot {
    pub label: String,
    pub address_line: String,
    pub area: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub driver_id: Option<Uuid>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_reference: Option<String>,
    pub status: String,
    pub address: AddressSnapshot,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of one ordered line: name and prices are copied from the menu at
/// checkout, never looked up again.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub addons: Vec<SelectedAddOn>,
    pub subtotal: i64,
    pub created_at: DateTime<Utc>,
}
