use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod doc;
pub mod driver;
pub mod health;
pub mod orders;
pub mod params;
pub mod restaurant_panel;
pub mod restaurants;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/restaurants", restaurants::router())
        .nest("/addresses", addresses::router())
        .nest("/orders", orders::router())
        .nest("/driver", driver::router())
        .nest("/restaurant", restaurant_panel::router())
        .nest("/admin", admin::router())
}
