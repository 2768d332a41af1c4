use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::SelectedAddOn;
use crate::models::{Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    /// Chosen add-ons; prices are advisory and re-derived from the catalog.
    #[serde(default)]
    pub addons: Vec<SelectedAddOn>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub restaurant_id: Uuid,
    pub items: Vec<CheckoutItem>,
    pub address_id: Uuid,
    /// `COD` or `WALLET_REF`.
    pub payment_method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentReferenceRequest {
    /// Wallet transfer reference code the customer copied from the wallet app.
    pub reference: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
