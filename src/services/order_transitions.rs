use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    entity::orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    order_state::{OrderAction, TransitionPlan, plan_transition},
};

pub async fn find_order<C>(conn: &C, id: Uuid) -> AppResult<OrderModel>
where
    C: ConnectionTrait,
{
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::OrderNotFound)
}

/// Writes `plan` only if the row still holds the status pair the plan was made from.
///
/// Returns `false` when another writer changed the order first.
pub async fn apply_plan<C>(conn: &C, order_id: Uuid, plan: &TransitionPlan) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let mut update = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(plan.status))
        .col_expr(OrderCol::PayStatus, Expr::value(plan.pay_status));

    if let Some(at) = plan.checkout_time {
        update = update.col_expr(OrderCol::CheckoutTime, Expr::value(at.fixed_offset()));
    }
    if let Some(at) = plan.delivery_time {
        update = update.col_expr(OrderCol::DeliveryTime, Expr::value(at.fixed_offset()));
    }
    if let Some(at) = plan.cancel_time {
        update = update.col_expr(OrderCol::CancelTime, Expr::value(at.fixed_offset()));
    }
    if let Some(reason) = &plan.cancel_reason {
        update = update.col_expr(OrderCol::CancelReason, Expr::value(reason.clone()));
    }
    if let Some(reason) = &plan.rejection_reason {
        update = update.col_expr(OrderCol::RejectionReason, Expr::value(reason.clone()));
    }

    let result = update
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::Status.eq(plan.expected_status))
        .filter(OrderCol::PayStatus.eq(plan.expected_pay_status))
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Loads the order, checks the action against its current status and applies it.
pub async fn transition_order<C>(
    conn: &C,
    order_id: Uuid,
    action: &OrderAction,
    now: DateTime<Utc>,
) -> AppResult<OrderModel>
where
    C: ConnectionTrait,
{
    let order = find_order(conn, order_id).await?;
    let plan = plan_transition(order.status, order.pay_status, action, now)?;

    if !apply_plan(conn, order.id, &plan).await? {
        tracing::info!(
            order_id = %order.id,
            action = action.name(),
            "order changed concurrently, transition rejected"
        );
        return Err(AppError::OrderStatusInvalid);
    }

    tracing::debug!(
        order_id = %order.id,
        action = action.name(),
        from = ?plan.expected_status,
        to = ?plan.status,
        "order transitioned"
    );
    Ok(with_plan(order, plan))
}

/// The row as it reads after `plan` was written.
pub fn with_plan(mut order: OrderModel, plan: TransitionPlan) -> OrderModel {
    order.status = plan.status;
    order.pay_status = plan.pay_status;
    if let Some(at) = plan.checkout_time {
        order.checkout_time = Some(at.fixed_offset());
    }
    if let Some(at) = plan.delivery_time {
        order.delivery_time = Some(at.fixed_offset());
    }
    if let Some(at) = plan.cancel_time {
        order.cancel_time = Some(at.fixed_offset());
    }
    if plan.cancel_reason.is_some() {
        order.cancel_reason = plan.cancel_reason;
    }
    if plan.rejection_reason.is_some() {
        order.rejection_reason = plan.rejection_reason;
    }
    order
}
