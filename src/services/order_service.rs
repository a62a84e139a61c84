use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        OrderList, OrderSubmitSummary, OrderWithDetails, PayOrderRequest, PaymentAck,
        SubmitOrderRequest,
    },
    entity::{
        address_book::{Column as AddressCol, Entity as AddressBook, Model as AddressModel},
        cart_items::{
            ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel,
        },
        order_details::{
            self, ActiveModel as OrderDetailActive, Column as OrderDetailCol, Entity as OrderDetails,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult, ValidationError},
    middleware::auth::AuthUser,
    models::{Order, OrderDetail},
    order_state::{
        CancelInitiator, OrderAction, OrderStatus, PayStatus, USER_CANCEL_REASON, plan_transition,
    },
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::order_transitions::{apply_plan, transition_order},
    state::AppState,
};

/// Turns the caller's cart into an order.
///
/// The order row, its detail lines and the cart clearing commit together or not at all.
pub async fn submit_order(
    state: &AppState,
    user: &AuthUser,
    payload: SubmitOrderRequest,
) -> AppResult<ApiResponse<OrderSubmitSummary>> {
    let now = state.clock.now();
    let txn = state.orm.begin().await?;

    let summary = match submit_in_txn(&txn, state, user, &payload, now).await {
        Ok(summary) => {
            txn.commit().await?;
            summary
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "order submission rollback failed");
            }
            return Err(err);
        }
    };

    tracing::info!(
        order_id = %summary.id,
        number = %summary.number,
        amount = summary.amount,
        "order submitted"
    );
    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "order_submit",
        "orders",
        serde_json::json!({ "order_id": summary.id, "number": summary.number }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order submitted",
        summary,
        Some(Meta::empty()),
    ))
}

async fn submit_in_txn(
    txn: &DatabaseTransaction,
    state: &AppState,
    user: &AuthUser,
    payload: &SubmitOrderRequest,
    now: DateTime<Utc>,
) -> AppResult<OrderSubmitSummary> {
    let (address, cart) = resolve_snapshot(txn, user, payload.address_book_id).await?;

    let amount: i64 = cart
        .iter()
        .map(|line| line.unit_price * i64::from(line.quantity))
        .sum();
    if let Some(submitted) = payload.amount {
        if submitted != amount {
            return Err(ValidationError::AmountMismatch {
                expected: amount,
                submitted,
            }
            .into());
        }
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        number: Set(state.order_numbers.next_number()),
        user_id: Set(user.user_id),
        address_book_id: Set(address.id),
        status: Set(OrderStatus::PendingPayment),
        pay_status: Set(PayStatus::Unpaid),
        amount: Set(amount),
        remark: Set(payload.remark.clone()),
        consignee: Set(address.consignee.clone()),
        phone: Set(address.phone.clone()),
        address: Set(address.full_address()),
        order_time: Set(now.into()),
        checkout_time: Set(None),
        delivery_time: Set(None),
        cancel_time: Set(None),
        cancel_reason: Set(None),
        rejection_reason: Set(None),
    }
    .insert(txn)
    .await?;

    let details = cart.iter().map(|line| OrderDetailActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        name: Set(line.name.clone()),
        dish_id: Set(line.dish_id),
        setmeal_id: Set(line.setmeal_id),
        unit_price: Set(line.unit_price),
        quantity: Set(line.quantity),
    });
    OrderDetails::insert_many(details).exec(txn).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(txn)
        .await?;

    Ok(OrderSubmitSummary {
        id: order.id,
        number: order.number,
        order_time: order.order_time.with_timezone(&Utc),
        amount: order.amount,
    })
}

/// Checks that the order can be placed at all. Runs before anything is written.
async fn resolve_snapshot<C>(
    conn: &C,
    user: &AuthUser,
    address_book_id: Uuid,
) -> AppResult<(AddressModel, Vec<CartModel>)>
where
    C: ConnectionTrait,
{
    let address = AddressBook::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(address_book_id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(conn)
        .await?
        .ok_or(ValidationError::AddressMissing)?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(conn)
        .await?;
    if cart.is_empty() {
        return Err(ValidationError::CartEmpty.into());
    }

    Ok((address, cart))
}

/// Simulated checkout: the customer "pays" and the order moves as if the
/// gateway had called back.
pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<PaymentAck>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Number.eq(payload.order_number.clone()))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::OrderNotFound)?;

    pay_success(state, &order.number).await
}

/// Payment notification for `order_number`.
///
/// Repeated notifications are acknowledged without touching the order again.
pub async fn pay_success(state: &AppState, order_number: &str) -> AppResult<ApiResponse<PaymentAck>> {
    let now = state.clock.now();
    let order = Orders::find()
        .filter(OrderCol::Number.eq(order_number))
        .one(&state.orm)
        .await?
        .ok_or(AppError::OrderNotFound)?;

    let ack = |status: OrderStatus, transitioned: bool| PaymentAck {
        order_number: order_number.to_string(),
        status,
        transitioned,
    };

    if order.status != OrderStatus::PendingPayment {
        tracing::info!(
            order_id = %order.id,
            status = ?order.status,
            "payment callback for an order no longer awaiting payment, ignored"
        );
        return Ok(ApiResponse::success(
            "Payment already processed",
            ack(order.status, false),
            Some(Meta::empty()),
        ));
    }

    let plan = plan_transition(
        order.status,
        order.pay_status,
        &OrderAction::PaymentSucceeded,
        now,
    )?;
    if !apply_plan(&state.orm, order.id, &plan).await? {
        let current = Orders::find_by_id(order.id)
            .one(&state.orm)
            .await?
            .map(|o| o.status)
            .unwrap_or(order.status);
        tracing::warn!(
            order_id = %order.id,
            status = ?current,
            "payment callback lost a race with another transition, ignored"
        );
        return Ok(ApiResponse::success(
            "Payment already processed",
            ack(current, false),
            Some(Meta::empty()),
        ));
    }

    tracing::info!(order_id = %order.id, "order paid");
    audit::record(
        &state.orm,
        now,
        Some(order.user_id),
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        ack(plan.status, true),
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize()?;
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::OrderTime),
        SortOrder::Desc => finder.order_by_desc(OrderCol::OrderTime),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_details(&state.orm, orders).await?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    let order = find_user_order(&state.orm, user, id).await?;
    let data = order_with_details(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Customer withdrawal. Only possible until the merchant accepts the order.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let now = state.clock.now();
    let order = find_user_order(&state.orm, user, id).await?;
    let action = OrderAction::Cancel {
        initiator: CancelInitiator::Customer,
        reason: USER_CANCEL_REASON.to_string(),
    };
    let order = transition_order(&state.orm, order.id, &action, now).await?;

    audit::record(
        &state.orm,
        now,
        Some(user.user_id),
        "order_cancel_by_user",
        "orders",
        serde_json::json!({ "order_id": order.id, "pay_status": order.pay_status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// "Order again": copies the detail lines of a past order back into the cart.
///
/// A dish or combo already in the cart has its quantity raised instead of getting
/// a second line.
pub async fn repeat_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let now = state.clock.now();
    let order = find_user_order(&state.orm, user, id).await?;
    let details = OrderDetails::find()
        .filter(OrderDetailCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?;
    let lines = details.len();

    let txn = state.orm.begin().await?;
    match refill_cart(&txn, user, details, now).await {
        Ok(()) => txn.commit().await?,
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "cart refill rollback failed");
            }
            return Err(err);
        }
    }

    Ok(ApiResponse::success(
        "Items added to cart",
        serde_json::json!({ "lines": lines }),
        Some(Meta::empty()),
    ))
}

async fn refill_cart(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    details: Vec<order_details::Model>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let mut cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(txn)
        .await?;

    for detail in details {
        let existing = cart
            .iter_mut()
            .find(|line| line.dish_id == detail.dish_id && line.setmeal_id == detail.setmeal_id);
        match existing {
            Some(line) => {
                let mut active: CartActive = line.clone().into();
                active.quantity = Set(line.quantity + detail.quantity);
                *line = active.update(txn).await?;
            }
            None => {
                let line = CartActive {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user.user_id),
                    dish_id: Set(detail.dish_id),
                    setmeal_id: Set(detail.setmeal_id),
                    name: Set(detail.name),
                    unit_price: Set(detail.unit_price),
                    quantity: Set(detail.quantity),
                    created_at: Set(now.into()),
                }
                .insert(txn)
                .await?;
                cart.push(line);
            }
        }
    }
    Ok(())
}

async fn find_user_order<C>(conn: &C, user: &AuthUser, id: Uuid) -> AppResult<OrderModel>
where
    C: ConnectionTrait,
{
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(conn)
        .await?
        .ok_or(AppError::OrderNotFound)
}

pub(crate) async fn order_with_details<C>(conn: &C, order: OrderModel) -> AppResult<OrderWithDetails>
where
    C: ConnectionTrait,
{
    let details = OrderDetails::find()
        .filter(OrderDetailCol::OrderId.eq(order.id))
        .all(conn)
        .await?
        .into_iter()
        .map(OrderDetail::from)
        .collect();

    Ok(OrderWithDetails {
        order: Order::from(order),
        details,
    })
}

/// Attaches detail lines to a page of orders with a single extra query.
pub(crate) async fn with_details<C>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithDetails>>
where
    C: ConnectionTrait,
{
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<Uuid, Vec<OrderDetail>> = HashMap::new();
    for detail in OrderDetails::find()
        .filter(OrderDetailCol::OrderId.is_in(ids))
        .all(conn)
        .await?
    {
        by_order
            .entry(detail.order_id)
            .or_default()
            .push(OrderDetail::from(detail));
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithDetails {
            details: by_order.remove(&order.id).unwrap_or_default(),
            order: Order::from(order),
        })
        .collect())
}
