use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::dto::catalog::{AddOnGroupList, MenuList, RestaurantList};
use crate::{
    entity::{
        addon_groups::{
            Column as AddOnCol, Entity as AddOnGroups, Model as AddOnGroupModel,
        },
        menu_items::{Column as MenuCol, Entity as MenuItems, Model as MenuItemModel},
        restaurants::{Column as RestCol, Entity as Restaurants, Model as RestaurantModel},
    },
    error::{AppError, AppResult},
    models::{AddOnGroup, MenuItem, Restaurant},
    response::{ApiResponse, Meta},
    routes::params::RestaurantQuery,
    state::AppState,
};

pub async fn list_restaurants(
    state: &AppState,
    query: RestaurantQuery,
) -> AppResult<ApiResponse<RestaurantList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(RestCol::Name).ilike(pattern.clone()))
                .add(Expr::col(RestCol::CuisineType).ilike(pattern)),
        );
    }

    if let Some(area) = query.area.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(RestCol::Area.eq(area.clone()));
    }

    let finder = Restaurants::find()
        .filter(condition)
        .order_by_asc(RestCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(restaurant_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Restaurants",
        RestaurantList { items },
        Some(meta),
    ))
}

pub async fn get_restaurant(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Restaurant>> {
    let result = Restaurants::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(restaurant_from_entity);
    let result = match result {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Restaurant", result, None))
}

/// Full menu of one restaurant, unavailable items included so clients can
/// grey them out instead of dropping them.
pub async fn get_menu(state: &AppState, restaurant_id: Uuid) -> AppResult<ApiResponse<MenuList>> {
    Restaurants::find_by_id(restaurant_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = MenuItems::find()
        .filter(MenuCol::RestaurantId.eq(restaurant_id))
        .order_by_asc(MenuCol::Category)
        .order_by_asc(MenuCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(menu_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Menu",
        MenuList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_item_addons(
    state: &AppState,
    restaurant_id: Uuid,
    item_id: Uuid,
) -> AppResult<ApiResponse<AddOnGroupList>> {
    let item = MenuItems::find_by_id(item_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if item.restaurant_id != restaurant_id {
        return Err(AppError::NotFound);
    }

    let items = AddOnGroups::find()
        .filter(AddOnCol::MenuItemId.eq(item_id))
        .order_by_asc(AddOnCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(addon_group_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Add-on groups",
        AddOnGroupList { items },
        Some(Meta::empty()),
    ))
}

fn restaurant_from_entity(model: RestaurantModel) -> Restaurant {
    Restaurant {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        description: model.description,
        address: model.address,
        area: model.area,
        cuisine_type: model.cuisine_type,
        is_open: model.is_open,
        delivery_fee: model.delivery_fee,
        min_order: model.min_order,
        delivery_time: model.delivery_time,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn menu_item_from_entity(model: MenuItemModel) -> MenuItem {
    MenuItem {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        is_available: model.is_available,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn addon_group_from_entity(model: AddOnGroupModel) -> AddOnGroup {
    AddOnGroup {
        id: model.id,
        menu_item_id: model.menu_item_id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        is_required: model.is_required,
        max_selections: model.max_selections,
        options: sqlx::types::Json(serde_json::from_value(model.options).unwrap_or_default()),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
