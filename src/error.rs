use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    order_state::TransitionError,
    response::ApiResponse,
};

/// Input the caller has to fix before retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("address book entry not found")]
    AddressMissing,

    #[error("cart is empty")]
    CartEmpty,

    #[error("{0} is required")]
    MissingReason(&'static str),

    #[error("submitted amount {submitted} does not match cart total {expected}")]
    AmountMismatch { expected: i64, submitted: i64 },

    #[error("{0}")]
    InvalidField(&'static str),

    #[error("exactly one of dish_id or setmeal_id must be given")]
    AmbiguousCartItem,

    #[error("deletion not allowed: {0}")]
    DeletionNotAllowed(String),

    #[error("status change not allowed: {0}")]
    StatusChangeNotAllowed(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The order is not in the status the action needs, or a concurrent
    /// transition got there first.
    #[error("Order status changed")]
    OrderStatusInvalid,

    #[error("Forbidden")]
    Forbidden,

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidStatus { .. } => AppError::OrderStatusInvalid,
            TransitionError::MissingReason(what) => {
                AppError::Validation(ValidationError::MissingReason(what))
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound | AppError::OrderNotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::OrderStatusInvalid => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiResponse::failure(
            self.to_string(),
            ErrorData {
                error: detail(&self),
            },
        );

        (status, axum::Json(body)).into_response()
    }
}

/// Stable code clients can match on.
fn detail(err: &AppError) -> String {
    let code = match err {
        AppError::NotFound => "not_found",
        AppError::OrderNotFound => "order_not_found",
        AppError::BadRequest(_) => "bad_request",
        AppError::Validation(ValidationError::AddressMissing) => "address_missing",
        AppError::Validation(ValidationError::CartEmpty) => "cart_empty",
        AppError::Validation(ValidationError::AmountMismatch { .. }) => "amount_mismatch",
        AppError::Validation(_) => "validation_failed",
        AppError::OrderStatusInvalid => "order_status_invalid",
        AppError::Forbidden => "forbidden",
        AppError::Unauthorized(_) => "unauthorized",
        AppError::OrmError(_) | AppError::Internal(_) => "internal",
    };
    code.to_string()
}

pub type AppResult<T> = Result<T, AppError>;
