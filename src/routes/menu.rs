use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::menu::{
        CategoryQuery, CreateDishRequest, CreateSetmealRequest, DeleteDishesRequest,
        DeleteSetmealsRequest, MenuList, MenuStatusRequest, SetmealWithDishes, UpdateDishRequest,
        UpdateSetmealRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::MenuItem,
    response::ApiResponse,
    routes::params::MenuPageQuery,
    services::{dish_service, setmeal_service},
    state::AppState,
};

/// Customer facing listings, mounted under `/user`.
pub fn user_router() -> Router<AppState> {
    Router::new()
        .route("/dishes", get(list_dishes))
        .route("/setmeals", get(list_setmeals))
}

/// Menu management, mounted under `/admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/dishes",
            get(page_dishes).post(create_dish).delete(delete_dishes),
        )
        .route("/dishes/{id}", get(get_dish).put(update_dish))
        .route("/dishes/{id}/status", post(set_dish_status))
        .route(
            "/setmeals",
            get(page_setmeals)
                .post(create_setmeal)
                .delete(delete_setmeals),
        )
        .route("/setmeals/{id}", get(get_setmeal).put(update_setmeal))
        .route("/setmeals/{id}/status", post(set_setmeal_status))
}

#[utoipa::path(
    get,
    path = "/api/user/dishes",
    params(("category_id" = Uuid, Query, description = "Category to list")),
    responses((status = 200, description = "Dishes on sale in the category", body = ApiResponse<MenuList>)),
    tag = "Menu"
)]
pub async fn list_dishes(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = dish_service::list_by_category(&state, query.category_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/setmeals",
    params(("category_id" = Uuid, Query, description = "Category to list")),
    responses((status = 200, description = "Combos on sale in the category", body = ApiResponse<MenuList>)),
    tag = "Menu"
)]
pub async fn list_setmeals(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = setmeal_service::list_by_category(&state, query.category_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/dishes",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("per_page" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("category_id" = Option<Uuid>, Query, description = "Only this category"),
        ("name" = Option<String>, Query, description = "Name contains"),
        ("status" = Option<String>, Query, description = "enabled or disabled"),
    ),
    responses(
        (status = 200, description = "Dishes, on sale or not", body = ApiResponse<MenuList>),
        (status = 400, description = "Page out of range"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn page_dishes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MenuPageQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = dish_service::page_dishes(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/dishes/{id}",
    params(("id" = Uuid, Path, description = "Dish ID")),
    responses(
        (status = 200, description = "Dish", body = ApiResponse<MenuItem>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn get_dish(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = dish_service::get_dish(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/dishes",
    request_body = CreateDishRequest,
    responses(
        (status = 200, description = "Dish created", body = ApiResponse<MenuItem>),
        (status = 400, description = "Invalid name or price"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn create_dish(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDishRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = dish_service::create_dish(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/dishes/{id}",
    params(("id" = Uuid, Path, description = "Dish ID")),
    request_body = UpdateDishRequest,
    responses(
        (status = 200, description = "Dish updated", body = ApiResponse<MenuItem>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn update_dish(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDishRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = dish_service::update_dish(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/dishes/{id}/status",
    params(("id" = Uuid, Path, description = "Dish ID")),
    request_body = MenuStatusRequest,
    responses(
        (status = 200, description = "Dish put on or off sale", body = ApiResponse<MenuItem>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn set_dish_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MenuStatusRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = dish_service::set_status(&state, &user, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/dishes",
    request_body = DeleteDishesRequest,
    responses(
        (status = 200, description = "Dishes deleted"),
        (status = 400, description = "A dish is on sale or part of a combo"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn delete_dishes(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteDishesRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = dish_service::delete_dishes(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/setmeals/{id}/status",
    params(("id" = Uuid, Path, description = "Setmeal ID")),
    request_body = MenuStatusRequest,
    responses(
        (status = 200, description = "Combo put on or off sale", body = ApiResponse<MenuItem>),
        (status = 400, description = "Combo contains a disabled dish"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn set_setmeal_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MenuStatusRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = setmeal_service::set_status(&state, &user, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/setmeals",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("per_page" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("category_id" = Option<Uuid>, Query, description = "Only this category"),
        ("name" = Option<String>, Query, description = "Name contains"),
        ("status" = Option<String>, Query, description = "enabled or disabled"),
    ),
    responses(
        (status = 200, description = "Combos, on sale or not", body = ApiResponse<MenuList>),
        (status = 400, description = "Page out of range"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn page_setmeals(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MenuPageQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = setmeal_service::page_setmeals(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/setmeals/{id}",
    params(("id" = Uuid, Path, description = "Setmeal ID")),
    responses(
        (status = 200, description = "Combo with its dishes", body = ApiResponse<SetmealWithDishes>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn get_setmeal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SetmealWithDishes>>> {
    let resp = setmeal_service::get_setmeal(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/setmeals",
    request_body = CreateSetmealRequest,
    responses(
        (status = 200, description = "Combo created off sale", body = ApiResponse<SetmealWithDishes>),
        (status = 400, description = "Invalid fields or dish lines"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown dish"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn create_setmeal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSetmealRequest>,
) -> AppResult<Json<ApiResponse<SetmealWithDishes>>> {
    let resp = setmeal_service::create_setmeal(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/setmeals/{id}",
    params(("id" = Uuid, Path, description = "Setmeal ID")),
    request_body = UpdateSetmealRequest,
    responses(
        (status = 200, description = "Combo updated", body = ApiResponse<SetmealWithDishes>),
        (status = 400, description = "Invalid fields, or a disabled dish for a combo on sale"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn update_setmeal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSetmealRequest>,
) -> AppResult<Json<ApiResponse<SetmealWithDishes>>> {
    let resp = setmeal_service::update_setmeal(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/setmeals",
    request_body = DeleteSetmealsRequest,
    responses(
        (status = 200, description = "Combos deleted"),
        (status = 400, description = "A combo is on sale"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown combo"),
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn delete_setmeals(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteSetmealsRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = setmeal_service::delete_setmeals(&state, &user, payload).await?;
    Ok(Json(resp))
}
