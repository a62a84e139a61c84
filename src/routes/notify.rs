use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::orders::{PayOrderRequest, PaymentAck},
    error::AppResult,
    middleware::auth::PaymentNotifier,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/pay-success", post(pay_success))
}

#[utoipa::path(
    post,
    path = "/api/notify/pay-success",
    request_body = PayOrderRequest,
    params(("x-notify-token" = String, Header, description = "Shared gateway token")),
    responses(
        (status = 200, description = "Payment recorded, repeats are acknowledged", body = ApiResponse<PaymentAck>),
        (status = 401, description = "Missing or wrong notify token"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Notify"
)]
pub async fn pay_success(
    State(state): State<AppState>,
    _notifier: PaymentNotifier,
    Json(payload): Json<PayOrderRequest>,
) -> AppResult<Json<ApiResponse<PaymentAck>>> {
    let resp = order_service::pay_success(&state, &payload.order_number).await?;
    Ok(Json(resp))
}
