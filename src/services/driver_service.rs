use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::lifecycle::{self, OrderStatus, PaymentMethod, PaymentStatus, Role},
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::order_service::order_from_entity,
    state::AppState,
};

/// Orders a driver can claim: pending and not yet assigned to anyone.
pub async fn list_available_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_role(user, Role::Driver)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
                .add(OrderCol::DriverId.is_null()),
        )
        .order_by_asc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<Vec<Order>>();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Claim a pending order for delivery.
///
/// The assignment is a single conditional UPDATE keyed on the order still
/// being pending and unassigned. When two drivers race, exactly one update
/// matches a row; the loser sees zero rows affected and gets a conflict.
pub async fn claim_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_role(user, Role::Driver)?;

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Assigned.as_str()))
        .col_expr(OrderCol::DriverId, Expr::value(user.user_id))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
                .add(OrderCol::DriverId.is_null()),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        // The update matched nothing. Look at the order to say why.
        let order = Orders::find_by_id(id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        if order.driver_id.is_some() {
            return Err(AppError::Conflict(
                "order was already claimed by another driver".into(),
            ));
        }
        return Err(AppError::Conflict(format!(
            "order is no longer claimable (status {})",
            order.status
        )));
    }

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_claimed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order claimed",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Advance a claimed order along the delivery chain.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_role(user, Role::Driver)?;
    let actor = user.actor()?;

    let target = OrderStatus::parse(&payload.status).ok_or_else(|| {
        AppError::BadRequest(format!("unknown order status \"{}\"", payload.status))
    })?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = OrderStatus::parse(&order.status)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("corrupt order status {}", order.status)))?;

    lifecycle::check_transition(current, target, &actor, order.driver_id)?;

    let settles = target == OrderStatus::Delivered
        && PaymentMethod::parse(&order.payment_method)
            .is_some_and(|m| m.settles_on_delivery());

    let mut active: OrderActive = order.into();
    active.status = Set(target.as_str().into());
    if settles {
        active.payment_status = Set(PaymentStatus::Paid.as_str().into());
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order status updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Orders currently in this driver's hands.
pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_role(user, Role::Driver)?;

    let active = [
        OrderStatus::Assigned.as_str(),
        OrderStatus::PickedUp.as_str(),
        OrderStatus::OutForDelivery.as_str(),
    ];

    let orders = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::DriverId.eq(user.user_id))
                .add(OrderCol::Status.is_in(active)),
        )
        .order_by_asc(OrderCol::UpdatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(Meta::empty()),
    ))
}
