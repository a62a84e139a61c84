use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Order, OrderDetail},
    order_state::OrderStatus,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitOrderRequest {
    pub address_book_id: Uuid,
    pub remark: Option<String>,
    /// Total the client displayed, in minor units. Checked against the cart when given.
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderSubmitSummary {
    pub id: Uuid,
    pub number: String,
    pub order_time: DateTime<Utc>,
    pub amount: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    pub order_number: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentAck {
    pub order_number: String,
    pub status: OrderStatus,
    /// False when the callback was a repeat for an already processed order.
    pub transitioned: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectOrderRequest {
    pub rejection_reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub cancel_reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithDetails {
    pub order: Order,
    pub details: Vec<OrderDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatistics {
    pub to_be_confirmed: u64,
    pub confirmed: u64,
    pub delivery_in_progress: u64,
    /// Sum of completed order amounts inside the requested window.
    pub completed_turnover: i64,
}
