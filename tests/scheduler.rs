mod common;

use axum_takeout_api::{
    clock::Clock,
    config::SweepConfig,
    entity::Orders,
    order_state::{OrderAction, OrderStatus, PayStatus, TIMEOUT_CANCEL_REASON, plan_transition},
    scheduler::{self, SweepReport, duration_until_next_run},
    services::{admin_service, order_service, order_transitions::apply_plan},
};
use chrono::{Duration, TimeZone, Utc};
use common::{admin, customer, place_order, setup};
use sea_orm::EntityTrait;

#[tokio::test]
async fn stale_unpaid_order_is_cancelled_once() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let config = SweepConfig::default();
    let order_id = place_order(&ctx.state, &customer()).await?;

    // Not yet past the payment window.
    ctx.clock.advance(Duration::minutes(10));
    let early = scheduler::process_timeout_orders(&ctx.state, &config).await?;
    assert_eq!(early, SweepReport::default());

    ctx.clock.advance(Duration::minutes(6));
    let report = scheduler::process_timeout_orders(&ctx.state, &config).await?;
    assert_eq!(report.examined, 1);
    assert_eq!(report.transitioned, 1);

    let order = Orders::find_by_id(order_id)
        .one(&ctx.state.orm)
        .await?
        .expect("order");
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.pay_status, PayStatus::Unpaid);
    assert_eq!(order.cancel_reason.as_deref(), Some(TIMEOUT_CANCEL_REASON));
    assert_eq!(
        order.cancel_time,
        Some((common::start_time() + Duration::minutes(16)).fixed_offset())
    );

    let rerun = scheduler::process_timeout_orders(&ctx.state, &config).await?;
    assert_eq!(rerun.examined, 0);
    assert_eq!(rerun.transitioned, 0);
    Ok(())
}

#[tokio::test]
async fn paid_orders_are_left_alone_by_timeout_sweep() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let order_id = place_order(&ctx.state, &customer()).await?;
    let number = Orders::find_by_id(order_id)
        .one(&ctx.state.orm)
        .await?
        .expect("order")
        .number;
    order_service::pay_success(&ctx.state, &number).await?;

    ctx.clock.advance(Duration::hours(2));
    let report = scheduler::process_timeout_orders(&ctx.state, &SweepConfig::default()).await?;
    assert_eq!(report.transitioned, 0);

    let order = Orders::find_by_id(order_id)
        .one(&ctx.state.orm)
        .await?
        .expect("order");
    assert_eq!(order.status, OrderStatus::ToBeConfirmed);
    Ok(())
}

#[tokio::test]
async fn sweep_plan_loses_to_a_payment_that_landed_first() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let order_id = place_order(&ctx.state, &customer()).await?;
    let order = Orders::find_by_id(order_id)
        .one(&ctx.state.orm)
        .await?
        .expect("order");

    // The sweep read the row while it was still unpaid...
    ctx.clock.advance(Duration::minutes(20));
    let plan = plan_transition(
        order.status,
        order.pay_status,
        &OrderAction::PaymentTimedOut,
        ctx.clock.now(),
    )?;

    // ...then the payment callback got in before the sweep wrote.
    order_service::pay_success(&ctx.state, &order.number).await?;

    assert!(!apply_plan(&ctx.state.orm, order_id, &plan).await?);
    let stored = Orders::find_by_id(order_id)
        .one(&ctx.state.orm)
        .await?
        .expect("order");
    assert_eq!(stored.status, OrderStatus::ToBeConfirmed);
    assert_eq!(stored.pay_status, PayStatus::Paid);
    assert!(stored.cancel_reason.is_none());
    Ok(())
}

#[tokio::test]
async fn delivery_sweep_completes_lingering_deliveries() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let merchant = admin();
    let order_id = place_order(&ctx.state, &customer()).await?;
    let number = Orders::find_by_id(order_id)
        .one(&ctx.state.orm)
        .await?
        .expect("order")
        .number;
    order_service::pay_success(&ctx.state, &number).await?;
    admin_service::confirm_order(&ctx.state, &merchant, order_id).await?;
    admin_service::dispatch_order(&ctx.state, &merchant, order_id).await?;

    ctx.clock.advance(Duration::minutes(61));
    let report = scheduler::process_delivery_orders(&ctx.state, &SweepConfig::default()).await?;
    assert_eq!(report.transitioned, 1);

    let order = Orders::find_by_id(order_id)
        .one(&ctx.state.orm)
        .await?
        .expect("order");
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(
        order.delivery_time,
        Some((common::start_time() + Duration::minutes(61)).fixed_offset())
    );

    let rerun = scheduler::process_delivery_orders(&ctx.state, &SweepConfig::default()).await?;
    assert_eq!(rerun.transitioned, 0);
    Ok(())
}

#[tokio::test]
async fn shorter_payment_window_is_honoured() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let config = SweepConfig {
        payment_timeout: Duration::minutes(5),
        ..SweepConfig::default()
    };
    place_order(&ctx.state, &customer()).await?;

    ctx.clock.advance(Duration::minutes(6));
    let report = scheduler::process_timeout_orders(&ctx.state, &config).await?;
    assert_eq!(report.transitioned, 1);
    Ok(())
}

#[test]
fn next_daily_run_is_later_today_or_tomorrow() {
    let before = Utc.with_ymd_and_hms(2025, 3, 1, 0, 30, 0).single().expect("time");
    assert_eq!(
        duration_until_next_run(before, 1),
        std::time::Duration::from_secs(30 * 60)
    );

    let at = Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).single().expect("time");
    assert_eq!(
        duration_until_next_run(at, 1),
        std::time::Duration::from_secs(24 * 3600)
    );

    let after = Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).single().expect("time");
    assert_eq!(
        duration_until_next_run(after, 1),
        std::time::Duration::from_secs(2 * 3600)
    );
}
