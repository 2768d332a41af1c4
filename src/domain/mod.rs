//! Pure order/cart domain logic shared by every service.
//!
//! Nothing in here touches the database or the HTTP layer: the services
//! build snapshots from storage, run them through these types, and persist
//! the results.

pub mod cart;
pub mod catalog;
pub mod lifecycle;
