use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CancelOrderRequest, OrderList, OrderStatistics, OrderWithDetails, RejectOrderRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::{AdminOrderQuery, StatisticsQuery},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/statistics", get(order_statistics))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/confirm", put(confirm_order))
        .route("/orders/{id}/rejection", put(reject_order))
        .route("/orders/{id}/cancel", put(cancel_order))
        .route("/orders/{id}/delivery", put(dispatch_order))
        .route("/orders/{id}/complete", put(complete_order))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("number" = Option<String>, Query, description = "Order number fragment"),
        ("begin_time" = Option<String>, Query, description = "Placed at or after (RFC 3339)"),
        ("end_time" = Option<String>, Query, description = "Placed before (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Search every order (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminOrderQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/statistics",
    params(
        ("begin_time" = Option<String>, Query, description = "Turnover window start (RFC 3339)"),
        ("end_time" = Option<String>, Query, description = "Turnover window end (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Open order counts and completed turnover", body = ApiResponse<OrderStatistics>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn order_statistics(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StatisticsQuery>,
) -> AppResult<Json<ApiResponse<OrderStatistics>>> {
    let resp = admin_service::statistics(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Any order with its detail lines (admin only)", body = ApiResponse<OrderWithDetails>),
        (status = 404, description = "Order not found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithDetails>>> {
    let resp = admin_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/confirm",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order accepted", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order status changed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn confirm_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::confirm_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/rejection",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = RejectOrderRequest,
    responses(
        (status = 200, description = "Order rejected, payment refunded", body = ApiResponse<Order>),
        (status = 400, description = "Missing rejection reason"),
        (status = 409, description = "Order status changed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::reject_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled by the merchant", body = ApiResponse<Order>),
        (status = 400, description = "Missing cancel reason"),
        (status = 409, description = "Order status changed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::cancel_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/delivery",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order out for delivery", body = ApiResponse<Order>),
        (status = 409, description = "Order status changed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dispatch_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::dispatch_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order delivered", body = ApiResponse<Order>),
        (status = 409, description = "Order status changed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn complete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::complete_order(&state, &user, id).await?;
    Ok(Json(resp))
}
