use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::cart::{AddToCartRequest, CartList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(cart_list).post(add_to_cart).delete(clean_cart))
}

#[utoipa::path(
    get,
    path = "/api/user/cart",
    responses(
        (status = 200, description = "Cart lines of the caller with the running total", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "One unit added", body = ApiResponse<CartItem>),
        (status = 400, description = "Neither or both of dish_id and setmeal_id given"),
        (status = 404, description = "Item not on sale"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/user/cart",
    responses(
        (status = 200, description = "Cart emptied")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clean_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::clean_cart(&state, &user).await?;
    Ok(Json(resp))
}
