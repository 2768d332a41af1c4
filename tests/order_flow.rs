use axum_delivery_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    domain::catalog::SelectedAddOn,
    dto::orders::{CheckoutItem, CheckoutRequest, PaymentReferenceRequest, UpdateOrderStatusRequest},
    entity::{
        addon_groups::ActiveModel as AddOnGroupActive, addresses::ActiveModel as AddressActive,
        menu_items::ActiveModel as MenuItemActive, restaurants::ActiveModel as RestaurantActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, driver_service, order_service, restaurant_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

// Both tests truncate the same database, so they must not interleave.
static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn db_guard() -> MutexGuard<'static, ()> {
    DB_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Integration flow: customer checks out with a wallet reference, a driver
// claims and delivers, payment is verified by an admin at its own pace.
#[tokio::test]
async fn wallet_checkout_claim_and_deliver_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let _guard = db_guard();
    let state = setup_state(&database_url).await?;
    let fixture = seed_catalog(&state).await?;

    let customer = AuthUser {
        user_id: fixture.customer_id,
        role: "customer".into(),
    };
    let driver_a = AuthUser {
        user_id: create_user(&state, "driver", "0955000001").await?,
        role: "driver".into(),
    };
    let driver_b = AuthUser {
        user_id: create_user(&state, "driver", "0955000002").await?,
        role: "driver".into(),
    };
    let admin = AuthUser {
        user_id: create_user(&state, "admin", "0955000009").await?,
        role: "admin".into(),
    };

    // Checkout: 2x shawarma at 8000 plus one 500 add-on per unit, 5000 fee.
    // The client-submitted add-on price is a lie; the catalog one wins.
    let checkout = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            restaurant_id: fixture.restaurant_id,
            items: vec![CheckoutItem {
                menu_item_id: fixture.item_id,
                quantity: 2,
                addons: vec![SelectedAddOn {
                    group_name: "Extras".into(),
                    option_name: "Extra garlic".into(),
                    price: 0,
                }],
            }],
            address_id: fixture.address_id,
            payment_method: "WALLET_REF".into(),
            notes: None,
        },
    )
    .await?;
    let placed = checkout.data.unwrap();
    assert_eq!(placed.order.subtotal, 17_000);
    assert_eq!(placed.order.total, 22_000);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.payment_status, "pending_verification");
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].addons[0].price, 500);
    let order_id = placed.order.id;

    // Driver A claims; driver B loses the race.
    let claimed = driver_service::claim_order(&state, &driver_a, order_id).await?;
    assert_eq!(claimed.data.unwrap().status, "assigned");

    let err = driver_service::claim_order(&state, &driver_b, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // Driver B cannot advance an order assigned to driver A.
    let err = driver_service::update_order_status(
        &state,
        &driver_b,
        order_id,
        UpdateOrderStatusRequest {
            status: "picked_up".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    // Driver A walks the chain; unverified payment never blocks delivery.
    for status in ["picked_up", "out_for_delivery", "delivered"] {
        let resp = driver_service::update_order_status(
            &state,
            &driver_a,
            order_id,
            UpdateOrderStatusRequest {
                status: status.into(),
            },
        )
        .await?;
        assert_eq!(resp.data.unwrap().status, status);
    }

    let delivered = order_service::get_order(&state, &customer, order_id).await?;
    assert_eq!(
        delivered.data.unwrap().order.payment_status,
        "pending_verification"
    );

    // Customer submits the transfer code, admin verifies it.
    let with_ref = order_service::submit_payment_reference(
        &state,
        &customer,
        order_id,
        PaymentReferenceRequest {
            reference: "SYP-12345".into(),
        },
    )
    .await?;
    let with_ref = with_ref.data.unwrap();
    assert_eq!(with_ref.payment_status, "pending_verification");
    assert_eq!(with_ref.payment_reference.as_deref(), Some("SYP-12345"));

    let pending = admin_service::list_pending_payments(
        &state,
        &admin,
        Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?;
    assert!(
        pending.data.unwrap().items.iter().any(|o| o.id == order_id),
        "expected order in pending payments list"
    );

    let confirmed = admin_service::confirm_payment(&state, &admin, order_id).await?;
    assert_eq!(confirmed.data.unwrap().payment_status, "paid");

    // Delivered orders are out of reach for cancellation.
    let owner = AuthUser {
        user_id: fixture.owner_id,
        role: "restaurant".into(),
    };
    let err = restaurant_service::cancel_order(&state, &owner, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)), "got {err:?}");

    Ok(())
}

// COD settles on handover: delivered flips the payment to paid.
#[tokio::test]
async fn cod_order_settles_on_delivery() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let _guard = db_guard();
    let state = setup_state(&database_url).await?;
    let fixture = seed_catalog(&state).await?;

    let customer = AuthUser {
        user_id: fixture.customer_id,
        role: "customer".into(),
    };
    let driver = AuthUser {
        user_id: create_user(&state, "driver", "0955000003").await?,
        role: "driver".into(),
    };
    let owner = AuthUser {
        user_id: fixture.owner_id,
        role: "restaurant".into(),
    };

    let checkout = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            restaurant_id: fixture.restaurant_id,
            items: vec![CheckoutItem {
                menu_item_id: fixture.item_id,
                quantity: 2,
                addons: vec![],
            }],
            address_id: fixture.address_id,
            payment_method: "COD".into(),
            notes: Some("ring the bell".into()),
        },
    )
    .await?;
    let order = checkout.data.unwrap().order;
    assert_eq!(order.payment_status, "unpaid");

    driver_service::claim_order(&state, &driver, order.id).await?;
    for status in ["picked_up", "out_for_delivery", "delivered"] {
        driver_service::update_order_status(
            &state,
            &driver,
            order.id,
            UpdateOrderStatusRequest {
                status: status.into(),
            },
        )
        .await?;
    }

    let done = order_service::get_order(&state, &customer, order.id).await?;
    assert_eq!(done.data.unwrap().order.payment_status, "paid");

    // A second order stays cancellable while it is still pending.
    let second = order_service::checkout(
        &state,
        &customer,
        CheckoutRequest {
            restaurant_id: fixture.restaurant_id,
            items: vec![CheckoutItem {
                menu_item_id: fixture.item_id,
                quantity: 2,
                addons: vec![],
            }],
            address_id: fixture.address_id,
            payment_method: "COD".into(),
            notes: None,
        },
    )
    .await?;
    let second_id = second.data.unwrap().order.id;

    let cancelled = restaurant_service::cancel_order(&state, &owner, second_id).await?;
    assert_eq!(cancelled.data.unwrap().status, "cancelled");

    // The owner sees it under the cancelled filter.
    let incoming = restaurant_service::list_orders(
        &state,
        &owner,
        OrderListQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(20),
            },
            status: Some("cancelled".into()),
            sort_order: None,
        },
    )
    .await?;
    assert!(incoming.data.unwrap().items.iter().any(|o| o.id == second_id));

    Ok(())
}

struct Fixture {
    customer_id: Uuid,
    owner_id: Uuid,
    restaurant_id: Uuid,
    item_id: Uuid,
    address_id: Uuid,
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, addon_groups, menu_items, addresses, restaurants, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

async fn create_user(state: &AppState, role: &str, phone: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{role} {phone}")),
        phone: Set(phone.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn seed_catalog(state: &AppState) -> anyhow::Result<Fixture> {
    let customer_id = create_user(state, "customer", "0944000001").await?;
    let owner_id = create_user(state, "restaurant", "0944000002").await?;

    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(Some(owner_id)),
        name: Set("Test Shawarma".into()),
        description: Set(None),
        address: Set("Main St 1".into()),
        area: Set("Downtown".into()),
        cuisine_type: Set("Syrian".into()),
        is_open: Set(true),
        delivery_fee: Set(5_000),
        min_order: Set(10_000),
        delivery_time: Set("30-45 min".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant.id),
        name: Set("Chicken Shawarma".into()),
        description: Set(None),
        price: Set(8_000),
        category: Set("Sandwiches".into()),
        is_available: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    AddOnGroupActive {
        id: Set(Uuid::new_v4()),
        menu_item_id: Set(item.id),
        restaurant_id: Set(restaurant.id),
        name: Set("Extras".into()),
        is_required: Set(false),
        max_selections: Set(2),
        options: Set(serde_json::json!([
            { "name": "Extra garlic", "price": 500 },
            { "name": "Cheese", "price": 1000 }
        ])),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(customer_id),
        label: Set("Home".into()),
        address_line: Set("Building 4, floor 2".into()),
        area: Set(Some("Downtown".into())),
        lat: Set(None),
        lng: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(Fixture {
        customer_id,
        owner_id,
        restaurant_id: restaurant.id,
        item_id: item.id,
        address_id: address.id,
    })
}
