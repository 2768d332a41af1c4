use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{
        cart::Cart,
        catalog::{self, AddOnGroupSnapshot, MenuItemSnapshot, RestaurantSnapshot},
        lifecycle::{OrderStatus, PaymentMethod, PaymentStatus, Role},
    },
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems, PaymentReferenceRequest},
    entity::{
        addon_groups::{Column as AddOnCol, Entity as AddOnGroups},
        addresses::{Column as AddrCol, Entity as Addresses},
        menu_items::Entity as MenuItems,
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        restaurants::Entity as Restaurants,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::{AddressSnapshot, Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Create an immutable order from the caller's selection.
///
/// The cart is rebuilt server-side from catalog prices inside the
/// transaction: client-side totals are display-only and never trusted. Each
/// line is validated exactly once, here; a line whose item went unavailable
/// fails the whole checkout with an error naming that line.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_role(user, Role::Customer)?;

    let method = PaymentMethod::parse(&payload.payment_method).ok_or_else(|| {
        AppError::BadRequest(format!(
            "unknown payment method \"{}\"",
            payload.payment_method
        ))
    })?;
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".into()));
    }

    let txn = state.orm.begin().await?;

    let restaurant = Restaurants::find_by_id(payload.restaurant_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if !restaurant.is_open {
        return Err(AppError::BadRequest(format!(
            "restaurant \"{}\" is currently closed",
            restaurant.name
        )));
    }

    let address = Addresses::find()
        .filter(
            Condition::all()
                .add(AddrCol::Id.eq(payload.address_id))
                .add(AddrCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("delivery address not found".into()))?;

    let restaurant_snapshot = RestaurantSnapshot {
        id: restaurant.id,
        name: restaurant.name.clone(),
        is_open: restaurant.is_open,
        delivery_fee: restaurant.delivery_fee,
        min_order: restaurant.min_order,
    };

    let mut cart = Cart::new();
    for line in &payload.items {
        let item = MenuItems::find_by_id(line.menu_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("menu item {} does not exist", line.menu_item_id))
            })?;
        if item.restaurant_id != restaurant.id {
            return Err(AppError::BadRequest(format!(
                "item \"{}\" does not belong to restaurant \"{}\"",
                item.name, restaurant.name
            )));
        }
        if !item.is_available {
            return Err(AppError::BadRequest(format!(
                "item \"{}\" is currently unavailable",
                item.name
            )));
        }

        let groups: Vec<AddOnGroupSnapshot> = AddOnGroups::find()
            .filter(AddOnCol::MenuItemId.eq(item.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|g| AddOnGroupSnapshot {
                name: g.name,
                is_required: g.is_required,
                max_selections: g.max_selections,
                options: serde_json::from_value(g.options).unwrap_or_default(),
            })
            .collect();
        let addons = catalog::validate_selections(&groups, &line.addons).map_err(|e| {
            AppError::BadRequest(format!("item \"{}\": {e}", item.name))
        })?;

        cart.add_item_with_quantity(
            MenuItemSnapshot {
                id: item.id,
                restaurant_id: item.restaurant_id,
                name: item.name,
                price: item.price,
                is_available: item.is_available,
            },
            restaurant_snapshot.clone(),
            addons,
            line.quantity,
        );
    }

    if cart.subtotal() < restaurant.min_order {
        return Err(AppError::BadRequest(format!(
            "minimum order for \"{}\" is {}, cart subtotal is {}",
            restaurant.name,
            restaurant.min_order,
            cart.subtotal()
        )));
    }

    let address_snapshot = AddressSnapshot {
        label: address.label.clone(),
        address_line: address.address_line.clone(),
        area: address.area.clone(),
    };

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        restaurant_id: Set(restaurant.id),
        restaurant_name: Set(restaurant.name.clone()),
        driver_id: Set(None),
        subtotal: Set(cart.subtotal()),
        delivery_fee: Set(restaurant.delivery_fee),
        total: Set(cart.total()),
        payment_method: Set(method.as_str().into()),
        payment_status: Set(method.initial_payment_status().as_str().into()),
        payment_reference: Set(None),
        status: Set(OrderStatus::Pending.as_str().into()),
        address: Set(serde_json::to_value(&address_snapshot).map_err(anyhow::Error::from)?),
        notes: Set(payload.notes.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menu_item_id: Set(line.item.id),
            name: Set(line.item.name.clone()),
            price: Set(line.item.price),
            quantity: Set(line.quantity),
            addons: Set(serde_json::to_value(&line.add_ons).map_err(anyhow::Error::from)?),
            subtotal: Set(line.line_total()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "restaurant_id": order.restaurant_id,
            "total": order.total,
            "payment_method": order.payment_method,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Record the wallet transfer reference for a `WALLET_REF` order.
///
/// This only stores the code and keeps the order in `pending_verification`;
/// the actual ledger check is an external concern and the order is never
/// auto-cancelled while waiting. Delivery progresses regardless.
pub async fn submit_payment_reference(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PaymentReferenceRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.reference.trim().is_empty() {
        return Err(AppError::BadRequest("payment reference is empty".into()));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_method != PaymentMethod::WalletRef.as_str() {
        return Err(AppError::BadRequest(format!(
            "order was placed with {}, not {}",
            order.payment_method,
            PaymentMethod::WalletRef
        )));
    }
    if order.status == OrderStatus::Cancelled.as_str() {
        return Err(AppError::BadRequest("order is cancelled".into()));
    }
    if order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::BadRequest("order is already paid".into()));
    }

    let mut active: OrderActive = order.into();
    active.payment_reference = Set(Some(payload.reference.trim().to_string()));
    active.payment_status = Set(PaymentStatus::PendingVerification.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_reference_submitted",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment reference recorded",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        restaurant_id: model.restaurant_id,
        restaurant_name: model.restaurant_name,
        driver_id: model.driver_id,
        subtotal: model.subtotal,
        delivery_fee: model.delivery_fee,
        total: model.total,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        payment_reference: model.payment_reference,
        status: model.status,
        address: serde_json::from_value(model.address).unwrap_or_default(),
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        menu_item_id: model.menu_item_id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
        addons: serde_json::from_value(model.addons).unwrap_or_default(),
        subtotal: model.subtotal,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
