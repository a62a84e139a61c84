//! Order reconciliation sweeps.
//!
//! Two background jobs close out orders nobody will act on any more: unpaid orders past
//! the payment window are cancelled, and orders left out for delivery are completed once
//! a day. Both go through the same conditional update as interactive transitions, so a
//! sweep never overrides a change a customer or the merchant made in the meantime.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    audit,
    config::SweepConfig,
    entity::orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
    error::AppResult,
    order_state::{OrderAction, OrderStatus, plan_transition},
    services::order_transitions::apply_plan,
    state::AppState,
};

/// Outcome of a single sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub transitioned: usize,
    /// Rows another writer moved between the scan and the update.
    pub conflicts: usize,
    pub failed: usize,
}

/// Cancels orders still awaiting payment after the payment window.
pub async fn process_timeout_orders(state: &AppState, config: &SweepConfig) -> AppResult<SweepReport> {
    let now = state.clock.now();
    let cutoff = now - config.payment_timeout;
    let stale = stale_orders(state, OrderStatus::PendingPayment, cutoff).await?;
    let report = sweep(state, stale, OrderAction::PaymentTimedOut, "order_timeout_cancel", now).await;

    tracing::info!(
        examined = report.examined,
        transitioned = report.transitioned,
        conflicts = report.conflicts,
        failed = report.failed,
        "payment timeout sweep finished"
    );
    Ok(report)
}

/// Completes orders that have been out for delivery longer than the grace period.
pub async fn process_delivery_orders(
    state: &AppState,
    config: &SweepConfig,
) -> AppResult<SweepReport> {
    let now = state.clock.now();
    let cutoff = now - config.delivery_grace;
    let stale = stale_orders(state, OrderStatus::DeliveryInProgress, cutoff).await?;
    let report = sweep(state, stale, OrderAction::ForceComplete, "order_force_complete", now).await;

    tracing::info!(
        examined = report.examined,
        transitioned = report.transitioned,
        conflicts = report.conflicts,
        failed = report.failed,
        "delivery sweep finished"
    );
    Ok(report)
}

async fn stale_orders(
    state: &AppState,
    status: OrderStatus,
    cutoff: DateTime<Utc>,
) -> AppResult<Vec<OrderModel>> {
    let orders = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Status.eq(status))
                .add(OrderCol::OrderTime.lt(cutoff.fixed_offset())),
        )
        .order_by_asc(OrderCol::OrderTime)
        .all(&state.orm)
        .await?;
    Ok(orders)
}

/// Applies `action` row by row. A failing row is logged and skipped; it stays
/// eligible for the next run.
async fn sweep(
    state: &AppState,
    orders: Vec<OrderModel>,
    action: OrderAction,
    audit_action: &str,
    now: DateTime<Utc>,
) -> SweepReport {
    let mut report = SweepReport {
        examined: orders.len(),
        ..SweepReport::default()
    };

    for order in orders {
        let plan = match plan_transition(order.status, order.pay_status, &action, now) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "sweep skipped order");
                report.failed += 1;
                continue;
            }
        };

        match apply_plan(&state.orm, order.id, &plan).await {
            Ok(true) => {
                report.transitioned += 1;
                audit::record(
                    &state.orm,
                    now,
                    None,
                    audit_action,
                    "orders",
                    serde_json::json!({ "order_id": order.id, "status": plan.status }),
                )
                .await;
            }
            Ok(false) => {
                tracing::debug!(order_id = %order.id, "order changed before sweep update");
                report.conflicts += 1;
            }
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "sweep update failed");
                report.failed += 1;
            }
        }
    }

    report
}

/// Time left until the next `hour:00` UTC strictly after `now`.
pub fn duration_until_next_run(now: DateTime<Utc>, hour: u32) -> std::time::Duration {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive();
    let target_date = if now.time() >= at {
        today + Duration::days(1)
    } else {
        today
    };
    let target = target_date.and_time(at).and_utc();

    (target - now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(60))
}

/// Running sweep tasks. Dropping the handle leaves them running.
pub struct SchedulerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Starts the payment timeout sweep on a fixed interval and the delivery sweep daily.
pub fn spawn(state: AppState, config: SweepConfig) -> SchedulerHandle {
    tracing::info!(
        interval_secs = config.timeout_sweep_interval.as_secs(),
        delivery_hour = config.delivery_sweep_hour,
        "order sweeps started"
    );

    let timeout_task = {
        let state = state.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.timeout_sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(err) = process_timeout_orders(&state, &config).await {
                    tracing::error!(error = %err, "payment timeout sweep failed");
                }
            }
        })
    };

    let delivery_task = tokio::spawn(async move {
        loop {
            let wait = duration_until_next_run(state.clock.now(), config.delivery_sweep_hour);
            tracing::info!(minutes = wait.as_secs() / 60, "next delivery sweep scheduled");
            tokio::time::sleep(wait).await;
            if let Err(err) = process_delivery_orders(&state, &config).await {
                tracing::error!(error = %err, "delivery sweep failed");
            }
        }
    });

    SchedulerHandle {
        tasks: vec![timeout_task, delivery_task],
    }
}
