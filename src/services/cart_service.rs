use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    entity::{
        MenuStatus,
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        dishes::Entity as Dishes,
        setmeals::Entity as Setmeals,
    },
    error::{AppError, AppResult, ValidationError},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Menu entry a cart line points at.
enum CartTarget {
    Dish(Uuid),
    Setmeal(Uuid),
}

impl CartTarget {
    fn from_request(payload: &AddToCartRequest) -> Result<Self, ValidationError> {
        match (payload.dish_id, payload.setmeal_id) {
            (Some(id), None) => Ok(CartTarget::Dish(id)),
            (None, Some(id)) => Ok(CartTarget::Setmeal(id)),
            _ => Err(ValidationError::AmbiguousCartItem),
        }
    }

    fn condition(&self, user_id: Uuid) -> Condition {
        let owner = Condition::all().add(CartCol::UserId.eq(user_id));
        match self {
            CartTarget::Dish(id) => owner.add(CartCol::DishId.eq(*id)),
            CartTarget::Setmeal(id) => owner.add(CartCol::SetmealId.eq(*id)),
        }
    }
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items: Vec<CartItem> = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();

    let total_amount = items
        .iter()
        .map(|item| item.unit_price * i64::from(item.quantity))
        .sum();
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "OK",
        CartList {
            items,
            total_amount,
        },
        Some(Meta::new(1, total, total)),
    ))
}

/// Adds one unit of a dish or combo. An existing line is bumped instead of duplicated.
///
/// Name and price are copied from the menu at the time of adding.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let target = CartTarget::from_request(&payload)?;

    let existing = CartItems::find()
        .filter(target.condition(user.user_id))
        .one(&state.orm)
        .await?;

    if let Some(line) = existing {
        let quantity = line.quantity + 1;
        let mut active: CartActive = line.into();
        active.quantity = Set(quantity);
        let line = active.update(&state.orm).await?;
        return Ok(ApiResponse::success(
            "Cart updated",
            CartItem::from(line),
            Some(Meta::empty()),
        ));
    }

    let (name, unit_price) = match target {
        CartTarget::Dish(id) => {
            let dish = Dishes::find_by_id(id)
                .one(&state.orm)
                .await?
                .filter(|d| d.status == MenuStatus::Enabled)
                .ok_or(AppError::NotFound)?;
            (dish.name, dish.price)
        }
        CartTarget::Setmeal(id) => {
            let setmeal = Setmeals::find_by_id(id)
                .one(&state.orm)
                .await?
                .filter(|s| s.status == MenuStatus::Enabled)
                .ok_or(AppError::NotFound)?;
            (setmeal.name, setmeal.price)
        }
    };

    let line = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        dish_id: Set(payload.dish_id),
        setmeal_id: Set(payload.setmeal_id),
        name: Set(name),
        unit_price: Set(unit_price),
        quantity: Set(1),
        created_at: Set(state.clock.now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Added to cart",
        CartItem::from(line),
        Some(Meta::empty()),
    ))
}

pub async fn clean_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?
        .rows_affected;

    tracing::debug!(user_id = %user.user_id, removed, "cart cleared");
    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    ))
}
