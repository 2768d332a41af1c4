use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::catalog::{AddOnOption, SelectedAddOn},
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        catalog::{AddOnGroupList, MenuList, RestaurantList},
        orders::{
            CheckoutItem, CheckoutRequest, OrderList, OrderWithItems, PaymentReferenceRequest,
            UpdateOrderStatusRequest,
        },
    },
    models::{AddOnGroup, Address, AddressSnapshot, MenuItem, Order, OrderItem, Restaurant, User},
    response::{ApiResponse, Meta},
    routes::{addresses, admin, auth, driver, health, orders, params, restaurant_panel, restaurants},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        restaurants::list_restaurants,
        restaurants::get_restaurant,
        restaurants::get_menu,
        restaurants::get_item_addons,
        addresses::list_addresses,
        addresses::create_address,
        addresses::delete_address,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::submit_payment_reference,
        driver::list_available_orders,
        driver::list_my_orders,
        driver::claim_order,
        driver::update_order_status,
        restaurant_panel::list_orders,
        restaurant_panel::cancel_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::cancel_order,
        admin::list_pending_payments,
        admin::confirm_payment
    ),
    components(
        schemas(
            User,
            Restaurant,
            MenuItem,
            AddOnGroup,
            AddOnOption,
            SelectedAddOn,
            Address,
            AddressSnapshot,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            RestaurantList,
            MenuList,
            AddOnGroupList,
            addresses::CreateAddressRequest,
            addresses::AddressList,
            CheckoutItem,
            CheckoutRequest,
            PaymentReferenceRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            params::Pagination,
            params::RestaurantQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<RestaurantList>,
            ApiResponse<MenuList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Restaurants", description = "Public restaurant catalog"),
        (name = "Addresses", description = "Customer delivery addresses"),
        (name = "Orders", description = "Customer order endpoints"),
        (name = "Driver", description = "Driver claim and delivery endpoints"),
        (name = "Restaurant panel", description = "Restaurant owner endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
