use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};
use uuid::Uuid;

use crate::{
    audit,
    db::contains_pattern,
    dto::orders::{
        CancelOrderRequest, OrderList, OrderStatistics, OrderWithDetails, RejectOrderRequest,
    },
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    order_state::{CancelInitiator, OrderAction, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{AdminOrderQuery, StatisticsQuery},
    services::{
        order_service::{order_with_details, with_details},
        order_transitions::{find_order, transition_order},
    },
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: AdminOrderQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize()?;

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(number) = query.number.as_deref().filter(|n| !n.is_empty()) {
        condition = condition.add(Expr::col(OrderCol::Number).like(contains_pattern(number)));
    }
    if let Some(begin) = query.begin_time {
        condition = condition.add(OrderCol::OrderTime.gte(begin.fixed_offset()));
    }
    if let Some(end) = query.end_time {
        condition = condition.add(OrderCol::OrderTime.lt(end.fixed_offset()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::OrderTime);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_details(&state.orm, orders).await?;

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    ensure_admin(user)?;
    let order = find_order(&state.orm, id).await?;
    let data = order_with_details(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Counts of orders waiting on the merchant plus completed turnover.
pub async fn statistics(
    state: &AppState,
    user: &AuthUser,
    query: StatisticsQuery,
) -> AppResult<ApiResponse<OrderStatistics>> {
    ensure_admin(user)?;

    let count_by_status = |status: OrderStatus| {
        Orders::find()
            .filter(OrderCol::Status.eq(status))
            .count(&state.orm)
    };
    let to_be_confirmed = count_by_status(OrderStatus::ToBeConfirmed).await?;
    let confirmed = count_by_status(OrderStatus::Confirmed).await?;
    let delivery_in_progress = count_by_status(OrderStatus::DeliveryInProgress).await?;

    let mut completed = Condition::all().add(OrderCol::Status.eq(OrderStatus::Completed));
    if let Some(begin) = query.begin_time {
        completed = completed.add(OrderCol::OrderTime.gte(begin.fixed_offset()));
    }
    if let Some(end) = query.end_time {
        completed = completed.add(OrderCol::OrderTime.lt(end.fixed_offset()));
    }
    // Postgres widens SUM(bigint) to numeric.
    let turnover = SimpleExpr::from(Func::cast_as(
        Func::sum(Expr::col(OrderCol::Amount)),
        Alias::new("bigint"),
    ));
    let completed_turnover: Option<i64> = Orders::find()
        .select_only()
        .column_as(turnover, "turnover")
        .filter(completed)
        .into_tuple::<Option<i64>>()
        .one(&state.orm)
        .await?
        .flatten();

    let data = OrderStatistics {
        to_be_confirmed,
        confirmed,
        delivery_in_progress,
        completed_turnover: completed_turnover.unwrap_or(0),
    };
    Ok(ApiResponse::success("Statistics", data, Some(Meta::empty())))
}

pub async fn confirm_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    merchant_transition(state, user, id, OrderAction::Confirm, "order_confirm").await
}

pub async fn reject_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RejectOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let action = OrderAction::Reject {
        reason: payload.rejection_reason,
    };
    merchant_transition(state, user, id, action, "order_reject").await
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CancelOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let action = OrderAction::Cancel {
        initiator: CancelInitiator::Merchant,
        reason: payload.cancel_reason,
    };
    merchant_transition(state, user, id, action, "order_cancel_by_merchant").await
}

pub async fn dispatch_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    merchant_transition(state, user, id, OrderAction::Dispatch, "order_dispatch").await
}

pub async fn complete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    merchant_transition(state, user, id, OrderAction::Complete, "order_complete").await
}

async fn merchant_transition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    action: OrderAction,
    audit_action: &str,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let now = state.clock.now();
    let order = transition_order(&state.orm, id, &action, now).await?;

    tracing::info!(
        order_id = %order.id,
        action = action.name(),
        status = ?order.status,
        "order updated by merchant"
    );
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        audit_action,
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "status": order.status,
            "pay_status": order.pay_status,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}
