use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{AddOnGroup, MenuItem, Restaurant};

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantList {
    pub items: Vec<Restaurant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuList {
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddOnGroupList {
    pub items: Vec<AddOnGroup>,
}
