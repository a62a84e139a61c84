use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    cache::MenuNamespace,
    db::contains_pattern,
    dto::menu::{CreateDishRequest, DeleteDishesRequest, MenuList, UpdateDishRequest},
    entity::{
        MenuStatus,
        dishes::{self, ActiveModel as DishActive, Column as DishCol, Entity as Dishes},
        setmeal_dishes::{Column as SetmealDishCol, Entity as SetmealDishes},
        setmeals::{Column as SetmealCol, Entity as Setmeals},
    },
    error::{AppError, AppResult, ValidationError},
    middleware::auth::{AuthUser, ensure_admin},
    models::MenuItem,
    response::{ApiResponse, Meta},
    routes::params::MenuPageQuery,
    stamp::{OperationKind, Stamp},
    state::AppState,
};

/// Enabled dishes of a category, served through the menu cache.
pub async fn list_by_category(
    state: &AppState,
    category_id: Uuid,
) -> AppResult<ApiResponse<MenuList>> {
    let items = state
        .menu_cache
        .read_through(MenuNamespace::Dishes, category_id, || async {
            let rows = Dishes::find()
                .filter(
                    Condition::all()
                        .add(DishCol::CategoryId.eq(category_id))
                        .add(DishCol::Status.eq(MenuStatus::Enabled)),
                )
                .order_by_asc(DishCol::Name)
                .all(&state.orm)
                .await?;
            Ok::<_, AppError>(rows.into_iter().map(MenuItem::from).collect::<Vec<_>>())
        })
        .await?;

    Ok(ApiResponse::success(
        "Dishes",
        MenuList { items },
        Some(Meta::empty()),
    ))
}

/// Every dish, on sale or not, for the back office.
pub async fn page_dishes(
    state: &AppState,
    user: &AuthUser,
    query: MenuPageQuery,
) -> AppResult<ApiResponse<MenuList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize()?;

    let mut condition = Condition::all();
    if let Some(category_id) = query.category_id {
        condition = condition.add(DishCol::CategoryId.eq(category_id));
    }
    if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
        condition = condition.add(Expr::col(DishCol::Name).like(contains_pattern(name)));
    }
    if let Some(status) = query.status {
        condition = condition.add(DishCol::Status.eq(status));
    }

    let finder = Dishes::find()
        .filter(condition)
        .order_by_desc(DishCol::UpdatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(MenuItem::from)
        .collect();

    Ok(ApiResponse::success(
        "Dishes",
        MenuList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_dish(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;
    let dish = Dishes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Dish",
        MenuItem::from(dish),
        Some(Meta::empty()),
    ))
}

pub async fn create_dish(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDishRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;
    validate_name_and_price(Some(&payload.name), Some(payload.price))?;

    let mut active = DishActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(payload.name),
        price: Set(payload.price),
        description: Set(payload.description),
        image: Set(payload.image),
        status: Set(MenuStatus::Enabled),
        ..Default::default()
    };
    let now = state.clock.now();
    active.stamp(now, user.user_id, OperationKind::Insert);
    let dish = active.insert(&state.orm).await?;

    state
        .menu_cache
        .invalidate_category(MenuNamespace::Dishes, dish.category_id)
        .await;
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "dish_create",
        "dishes",
        serde_json::json!({ "dish_id": dish.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dish created",
        MenuItem::from(dish),
        Some(Meta::empty()),
    ))
}

pub async fn update_dish(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDishRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;
    validate_name_and_price(payload.name.as_deref(), payload.price)?;

    let existing = Dishes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let old_category = existing.category_id;

    let mut active: DishActive = existing.into();
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    let now = state.clock.now();
    active.stamp(now, user.user_id, OperationKind::Update);
    let dish = active.update(&state.orm).await?;

    if dish.category_id == old_category {
        state
            .menu_cache
            .invalidate_category(MenuNamespace::Dishes, dish.category_id)
            .await;
    } else {
        state
            .menu_cache
            .invalidate_namespace(MenuNamespace::Dishes)
            .await;
    }
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "dish_update",
        "dishes",
        serde_json::json!({ "dish_id": dish.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dish updated",
        MenuItem::from(dish),
        Some(Meta::empty()),
    ))
}

/// Enables or disables a dish. Disabling also disables every combo containing it.
pub async fn set_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: MenuStatus,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;
    let now = state.clock.now();

    let txn = state.orm.begin().await?;
    let (dish, cascaded) = match set_status_in_txn(&txn, user, id, status, now).await {
        Ok(result) => {
            txn.commit().await?;
            result
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "dish status rollback failed");
            }
            return Err(err);
        }
    };

    state
        .menu_cache
        .invalidate_category(MenuNamespace::Dishes, dish.category_id)
        .await;
    if cascaded > 0 {
        tracing::info!(dish_id = %dish.id, combos = cascaded, "combos disabled with dish");
        state
            .menu_cache
            .invalidate_namespace(MenuNamespace::Setmeals)
            .await;
    }
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "dish_status",
        "dishes",
        serde_json::json!({ "dish_id": dish.id, "status": dish.status, "combos": cascaded }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dish status updated",
        MenuItem::from(dish),
        Some(Meta::empty()),
    ))
}

async fn set_status_in_txn(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    id: Uuid,
    status: MenuStatus,
    now: DateTime<Utc>,
) -> AppResult<(dishes::Model, u64)> {
    let existing = lock_dishes(txn, &[id])
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;

    let mut active: DishActive = existing.into();
    active.status = Set(status);
    active.stamp(now, user.user_id, OperationKind::Update);
    let dish = active.update(txn).await?;

    if status != MenuStatus::Disabled {
        return Ok((dish, 0));
    }

    let setmeal_ids: Vec<Uuid> = SetmealDishes::find()
        .select_only()
        .column(SetmealDishCol::SetmealId)
        .filter(SetmealDishCol::DishId.eq(dish.id))
        .into_tuple()
        .all(txn)
        .await?;
    if setmeal_ids.is_empty() {
        return Ok((dish, 0));
    }

    let cascaded = Setmeals::update_many()
        .col_expr(SetmealCol::Status, Expr::value(MenuStatus::Disabled))
        .col_expr(SetmealCol::UpdatedAt, Expr::value(now.fixed_offset()))
        .col_expr(SetmealCol::UpdatedBy, Expr::value(user.user_id))
        .filter(SetmealCol::Id.is_in(setmeal_ids))
        .filter(SetmealCol::Status.eq(MenuStatus::Enabled))
        .exec(txn)
        .await?
        .rows_affected;

    Ok((dish, cascaded))
}

/// Deletes dishes in one go. Refused as a whole when any of them is on sale or
/// part of a combo.
pub async fn delete_dishes(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteDishesRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if payload.ids.is_empty() {
        return Err(ValidationError::InvalidField("ids must not be empty").into());
    }

    let txn = state.orm.begin().await?;
    let deleted = match delete_in_txn(&txn, &payload.ids).await {
        Ok(deleted) => {
            txn.commit().await?;
            deleted
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "dish delete rollback failed");
            }
            return Err(err);
        }
    };

    state
        .menu_cache
        .invalidate_namespace(MenuNamespace::Dishes)
        .await;
    audit::record(
        &state.orm,
        state.clock.now(),
        Some(user.user_id),
        "dish_delete",
        "dishes",
        serde_json::json!({ "ids": payload.ids, "deleted": deleted }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dishes deleted",
        serde_json::json!({ "deleted": deleted }),
        Some(Meta::empty()),
    ))
}

async fn delete_in_txn(txn: &DatabaseTransaction, ids: &[Uuid]) -> AppResult<u64> {
    let dishes = lock_dishes(txn, ids).await?;
    if dishes.iter().any(|d| d.status == MenuStatus::Enabled) {
        return Err(ValidationError::DeletionNotAllowed("dish is on sale".into()).into());
    }

    let in_combo = SetmealDishes::find()
        .filter(SetmealDishCol::DishId.is_in(ids.to_vec()))
        .count(txn)
        .await?;
    if in_combo > 0 {
        return Err(
            ValidationError::DeletionNotAllowed("dish is part of a combo".into()).into(),
        );
    }

    let deleted = Dishes::delete_many()
        .filter(DishCol::Id.is_in(ids.to_vec()))
        .filter(DishCol::Status.eq(MenuStatus::Disabled))
        .exec(txn)
        .await?
        .rows_affected;
    Ok(deleted)
}

/// Locks the given dishes for the rest of the transaction, in id order.
///
/// Menu writes that touch both tables lock dishes before combos; the dish
/// status cascade does the same.
pub(crate) async fn lock_dishes(
    txn: &DatabaseTransaction,
    ids: &[Uuid],
) -> AppResult<Vec<dishes::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let dishes = Dishes::find()
        .filter(DishCol::Id.is_in(ids.to_vec()))
        .order_by_asc(DishCol::Id)
        .lock(LockType::Update)
        .all(txn)
        .await?;
    Ok(dishes)
}

pub(crate) fn validate_name_and_price(
    name: Option<&str>,
    price: Option<i64>,
) -> Result<(), ValidationError> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(ValidationError::InvalidField("name must not be empty"));
    }
    if price.is_some_and(|p| p < 0) {
        return Err(ValidationError::InvalidField("price must not be negative"));
    }
    Ok(())
}
