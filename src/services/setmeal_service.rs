use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    cache::MenuNamespace,
    db::contains_pattern,
    dto::menu::{
        CreateSetmealRequest, DeleteSetmealsRequest, MenuList, SetmealDishLine, SetmealWithDishes,
        UpdateSetmealRequest,
    },
    entity::{
        MenuStatus,
        setmeal_dishes::{
            ActiveModel as SetmealDishActive, Column as SetmealDishCol, Entity as SetmealDishes,
        },
        setmeals::{self, ActiveModel as SetmealActive, Column as SetmealCol, Entity as Setmeals},
    },
    error::{AppError, AppResult, ValidationError},
    middleware::auth::{AuthUser, ensure_admin},
    models::MenuItem,
    response::{ApiResponse, Meta},
    routes::params::MenuPageQuery,
    services::dish_service::{lock_dishes, validate_name_and_price},
    stamp::{OperationKind, Stamp},
    state::AppState,
};

/// Enabled combos of a category, served through the menu cache.
pub async fn list_by_category(
    state: &AppState,
    category_id: Uuid,
) -> AppResult<ApiResponse<MenuList>> {
    let items = state
        .menu_cache
        .read_through(MenuNamespace::Setmeals, category_id, || async {
            let rows = Setmeals::find()
                .filter(
                    Condition::all()
                        .add(SetmealCol::CategoryId.eq(category_id))
                        .add(SetmealCol::Status.eq(MenuStatus::Enabled)),
                )
                .order_by_asc(SetmealCol::Name)
                .all(&state.orm)
                .await?;
            Ok::<_, AppError>(rows.into_iter().map(MenuItem::from).collect::<Vec<_>>())
        })
        .await?;

    Ok(ApiResponse::success(
        "Setmeals",
        MenuList { items },
        Some(Meta::empty()),
    ))
}

pub async fn page_setmeals(
    state: &AppState,
    user: &AuthUser,
    query: MenuPageQuery,
) -> AppResult<ApiResponse<MenuList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize()?;

    let mut condition = Condition::all();
    if let Some(category_id) = query.category_id {
        condition = condition.add(SetmealCol::CategoryId.eq(category_id));
    }
    if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
        condition = condition.add(Expr::col(SetmealCol::Name).like(contains_pattern(name)));
    }
    if let Some(status) = query.status {
        condition = condition.add(SetmealCol::Status.eq(status));
    }

    let finder = Setmeals::find()
        .filter(condition)
        .order_by_desc(SetmealCol::UpdatedAt);
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
        "Setmeals",
        MenuList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// A combo together with its dish lines.
pub async fn get_setmeal(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SetmealWithDishes>> {
    ensure_admin(user)?;
    let setmeal = Setmeals::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let dishes = dish_lines(&state.orm, setmeal.id).await?;
    Ok(ApiResponse::success(
        "Setmeal",
        SetmealWithDishes {
            setmeal: MenuItem::from(setmeal),
            dishes,
        },
        Some(Meta::empty()),
    ))
}

/// Creates a combo off sale, with its dish lines.
pub async fn create_setmeal(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSetmealRequest,
) -> AppResult<ApiResponse<SetmealWithDishes>> {
    ensure_admin(user)?;
    validate_name_and_price(Some(&payload.name), Some(payload.price))?;
    validate_lines(&payload.dishes)?;
    let now = state.clock.now();

    let txn = state.orm.begin().await?;
    let setmeal = match create_in_txn(&txn, user, &payload, now).await {
        Ok(setmeal) => {
            txn.commit().await?;
            setmeal
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "setmeal create rollback failed");
            }
            return Err(err);
        }
    };

    state
        .menu_cache
        .invalidate_category(MenuNamespace::Setmeals, setmeal.category_id)
        .await;
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "setmeal_create",
        "setmeals",
        serde_json::json!({ "setmeal_id": setmeal.id, "dishes": payload.dishes.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Setmeal created",
        SetmealWithDishes {
            setmeal: MenuItem::from(setmeal),
            dishes: payload.dishes,
        },
        Some(Meta::empty()),
    ))
}

async fn create_in_txn(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    payload: &CreateSetmealRequest,
    now: DateTime<Utc>,
) -> AppResult<setmeals::Model> {
    lock_all_dishes(txn, &payload.dishes).await?;

    let mut active = SetmealActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(payload.name.clone()),
        price: Set(payload.price),
        description: Set(payload.description.clone()),
        image: Set(payload.image.clone()),
        status: Set(MenuStatus::Disabled),
        ..Default::default()
    };
    active.stamp(now, user.user_id, OperationKind::Insert);
    let setmeal = active.insert(txn).await?;

    insert_lines(txn, setmeal.id, &payload.dishes).await?;
    Ok(setmeal)
}

/// Edits a combo. A new dish list replaces the old one; an enabled combo can
/// only take dishes that are on sale.
pub async fn update_setmeal(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSetmealRequest,
) -> AppResult<ApiResponse<SetmealWithDishes>> {
    ensure_admin(user)?;
    validate_name_and_price(payload.name.as_deref(), payload.price)?;
    if let Some(lines) = &payload.dishes {
        validate_lines(lines)?;
    }
    let now = state.clock.now();

    let txn = state.orm.begin().await?;
    let (setmeal, old_category) = match update_in_txn(&txn, user, id, payload, now).await {
        Ok(result) => {
            txn.commit().await?;
            result
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "setmeal update rollback failed");
            }
            return Err(err);
        }
    };

    if setmeal.category_id == old_category {
        state
            .menu_cache
            .invalidate_category(MenuNamespace::Setmeals, setmeal.category_id)
            .await;
    } else {
        state
            .menu_cache
            .invalidate_namespace(MenuNamespace::Setmeals)
            .await;
    }
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "setmeal_update",
        "setmeals",
        serde_json::json!({ "setmeal_id": setmeal.id }),
    )
    .await;

    let dishes = dish_lines(&state.orm, setmeal.id).await?;
    Ok(ApiResponse::success(
        "Setmeal updated",
        SetmealWithDishes {
            setmeal: MenuItem::from(setmeal),
            dishes,
        },
        Some(Meta::empty()),
    ))
}

async fn update_in_txn(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSetmealRequest,
    now: DateTime<Utc>,
) -> AppResult<(setmeals::Model, Uuid)> {
    let all_on_sale = match &payload.dishes {
        Some(lines) => lock_all_dishes(txn, lines).await?,
        None => true,
    };

    let existing = Setmeals::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.status == MenuStatus::Enabled && !all_on_sale {
        return Err(ValidationError::StatusChangeNotAllowed(
            "combo on sale cannot take a disabled dish".into(),
        )
        .into());
    }
    let old_category = existing.category_id;

    let mut active: SetmealActive = existing.into();
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
    active.stamp(now, user.user_id, OperationKind::Update);
    let setmeal = active.update(txn).await?;

    if let Some(lines) = &payload.dishes {
        SetmealDishes::delete_many()
            .filter(SetmealDishCol::SetmealId.eq(setmeal.id))
            .exec(txn)
            .await?;
        insert_lines(txn, setmeal.id, lines).await?;
    }

    Ok((setmeal, old_category))
}

/// Puts a combo on or off sale. A combo can only go on sale while all of its
/// dishes are.
pub async fn set_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: MenuStatus,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_admin(user)?;
    let now = state.clock.now();

    let txn = state.orm.begin().await?;
    let setmeal = match set_status_in_txn(&txn, user, id, status, now).await {
        Ok(setmeal) => {
            txn.commit().await?;
            setmeal
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "setmeal status rollback failed");
            }
            return Err(err);
        }
    };

    state
        .menu_cache
        .invalidate_category(MenuNamespace::Setmeals, setmeal.category_id)
        .await;
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "setmeal_status",
        "setmeals",
        serde_json::json!({ "setmeal_id": setmeal.id, "status": setmeal.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Setmeal status updated",
        MenuItem::from(setmeal),
        Some(Meta::empty()),
    ))
}

async fn set_status_in_txn(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    id: Uuid,
    status: MenuStatus,
    now: DateTime<Utc>,
) -> AppResult<setmeals::Model> {
    let mut locked_dishes = BTreeSet::new();
    if status == MenuStatus::Enabled {
        let lines = dish_lines(txn, id).await?;
        let dishes = lock_dishes(txn, &line_ids(&lines)).await?;
        if dishes.iter().any(|d| d.status == MenuStatus::Disabled) {
            return Err(ValidationError::StatusChangeNotAllowed(
                "combo contains a disabled dish".into(),
            )
            .into());
        }
        locked_dishes = dishes.into_iter().map(|d| d.id).collect();
    }

    let existing = Setmeals::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // The dish list may have been replaced between reading it and locking the combo.
    if status == MenuStatus::Enabled {
        let current: BTreeSet<Uuid> = line_ids(&dish_lines(txn, id).await?).into_iter().collect();
        if current != locked_dishes {
            return Err(ValidationError::StatusChangeNotAllowed(
                "combo dishes changed, try again".into(),
            )
            .into());
        }
    }

    let mut active: SetmealActive = existing.into();
    active.status = Set(status);
    active.stamp(now, user.user_id, OperationKind::Update);
    Ok(active.update(txn).await?)
}

/// Deletes combos and their dish lines. Refused as a whole while any of them is on sale.
pub async fn delete_setmeals(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteSetmealsRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if payload.ids.is_empty() {
        return Err(ValidationError::InvalidField("ids must not be empty").into());
    }

    let txn = state.orm.begin().await?;
    let (deleted, categories) = match delete_in_txn(&txn, &payload.ids).await {
        Ok(result) => {
            txn.commit().await?;
            result
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "setmeal delete rollback failed");
            }
            return Err(err);
        }
    };

    for category_id in &categories {
        state
            .menu_cache
            .invalidate_category(MenuNamespace::Setmeals, *category_id)
            .await;
    }
    audit::record(
        &state.orm,
        state.clock.now(),
        Some(user.user_id),
        "setmeal_delete",
        "setmeals",
        serde_json::json!({ "ids": payload.ids, "deleted": deleted }),
    )
    .await;

    Ok(ApiResponse::success(
        "Setmeals deleted",
        serde_json::json!({ "deleted": deleted }),
        Some(Meta::empty()),
    ))
}

async fn delete_in_txn(
    txn: &DatabaseTransaction,
    ids: &[Uuid],
) -> AppResult<(u64, BTreeSet<Uuid>)> {
    let setmeals = Setmeals::find()
        .filter(SetmealCol::Id.is_in(ids.to_vec()))
        .order_by_asc(SetmealCol::Id)
        .lock(LockType::Update)
        .all(txn)
        .await?;
    if setmeals.len() != ids.iter().collect::<HashSet<_>>().len() {
        return Err(AppError::NotFound);
    }
    if setmeals.iter().any(|s| s.status == MenuStatus::Enabled) {
        return Err(ValidationError::DeletionNotAllowed("combo is on sale".into()).into());
    }

    SetmealDishes::delete_many()
        .filter(SetmealDishCol::SetmealId.is_in(ids.to_vec()))
        .exec(txn)
        .await?;
    let deleted = Setmeals::delete_many()
        .filter(SetmealCol::Id.is_in(ids.to_vec()))
        .exec(txn)
        .await?
        .rows_affected;

    Ok((deleted, setmeals.into_iter().map(|s| s.category_id).collect()))
}

async fn dish_lines<C>(conn: &C, setmeal_id: Uuid) -> AppResult<Vec<SetmealDishLine>>
where
    C: ConnectionTrait,
{
    let lines = SetmealDishes::find()
        .filter(SetmealDishCol::SetmealId.eq(setmeal_id))
        .order_by_asc(SetmealDishCol::DishId)
        .all(conn)
        .await?
        .into_iter()
        .map(|line| SetmealDishLine {
            dish_id: line.dish_id,
            copies: line.copies,
        })
        .collect();
    Ok(lines)
}

fn line_ids(lines: &[SetmealDishLine]) -> Vec<Uuid> {
    lines.iter().map(|line| line.dish_id).collect()
}

/// Locks the dishes a combo is about to reference. Returns whether all of them are on sale.
async fn lock_all_dishes(txn: &DatabaseTransaction, lines: &[SetmealDishLine]) -> AppResult<bool> {
    let dishes = lock_dishes(txn, &line_ids(lines)).await?;
    if dishes.len() != lines.len() {
        return Err(AppError::NotFound);
    }
    Ok(dishes.iter().all(|d| d.status == MenuStatus::Enabled))
}

async fn insert_lines(
    txn: &DatabaseTransaction,
    setmeal_id: Uuid,
    lines: &[SetmealDishLine],
) -> AppResult<()> {
    let rows = lines.iter().map(|line| SetmealDishActive {
        id: Set(Uuid::new_v4()),
        setmeal_id: Set(setmeal_id),
        dish_id: Set(line.dish_id),
        copies: Set(line.copies),
    });
    SetmealDishes::insert_many(rows).exec(txn).await?;
    Ok(())
}

fn validate_lines(lines: &[SetmealDishLine]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::InvalidField("a combo needs at least one dish"));
    }
    if lines.iter().any(|line| line.copies < 1) {
        return Err(ValidationError::InvalidField("copies must be at least 1"));
    }
    let unique: HashSet<Uuid> = lines.iter().map(|line| line.dish_id).collect();
    if unique.len() != lines.len() {
        return Err(ValidationError::InvalidField("a dish appears twice in the combo"));
    }
    Ok(())
}
