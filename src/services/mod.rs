pub mod admin_service;
pub mod auth_service;
pub mod catalog_service;
pub mod driver_service;
pub mod order_service;
pub mod restaurant_service;
