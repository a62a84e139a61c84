use axum_takeout_api::order_state::{
    CancelInitiator, OrderAction, OrderStatus, PayStatus, TIMEOUT_CANCEL_REASON, TransitionError,
    plan_transition,
};
use chrono::{TimeZone, Utc};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("time")
}

fn cancel(initiator: CancelInitiator, reason: &str) -> OrderAction {
    OrderAction::Cancel {
        initiator,
        reason: reason.to_string(),
    }
}

#[test]
fn payment_marks_order_paid_and_awaiting_merchant() {
    let plan = plan_transition(
        OrderStatus::PendingPayment,
        PayStatus::Unpaid,
        &OrderAction::PaymentSucceeded,
        now(),
    )
    .expect("legal");

    assert_eq!(plan.expected_status, OrderStatus::PendingPayment);
    assert_eq!(plan.expected_pay_status, PayStatus::Unpaid);
    assert_eq!(plan.status, OrderStatus::ToBeConfirmed);
    assert_eq!(plan.pay_status, PayStatus::Paid);
    assert_eq!(plan.checkout_time, Some(now()));
}

#[test]
fn payment_is_only_accepted_once() {
    let err = plan_transition(
        OrderStatus::ToBeConfirmed,
        PayStatus::Paid,
        &OrderAction::PaymentSucceeded,
        now(),
    )
    .expect_err("already paid");
    assert_eq!(
        err,
        TransitionError::InvalidStatus {
            action: "payment_succeeded",
            from: OrderStatus::ToBeConfirmed
        }
    );
}

#[test]
fn forward_path_requires_each_previous_step() {
    let steps = [
        (OrderStatus::ToBeConfirmed, OrderAction::Confirm, OrderStatus::Confirmed),
        (OrderStatus::Confirmed, OrderAction::Dispatch, OrderStatus::DeliveryInProgress),
        (OrderStatus::DeliveryInProgress, OrderAction::Complete, OrderStatus::Completed),
    ];
    for (from, action, to) in steps {
        let plan = plan_transition(from, PayStatus::Paid, &action, now()).expect("legal");
        assert_eq!(plan.status, to);
        assert_eq!(plan.pay_status, PayStatus::Paid);
    }

    assert!(plan_transition(OrderStatus::PendingPayment, PayStatus::Unpaid, &OrderAction::Confirm, now()).is_err());
    assert!(plan_transition(OrderStatus::ToBeConfirmed, PayStatus::Paid, &OrderAction::Dispatch, now()).is_err());
    assert!(plan_transition(OrderStatus::Confirmed, PayStatus::Paid, &OrderAction::Complete, now()).is_err());
}

#[test]
fn completion_records_delivery_time() {
    let plan = plan_transition(
        OrderStatus::DeliveryInProgress,
        PayStatus::Paid,
        &OrderAction::ForceComplete,
        now(),
    )
    .expect("legal");
    assert_eq!(plan.status, OrderStatus::Completed);
    assert_eq!(plan.delivery_time, Some(now()));
}

#[test]
fn rejection_needs_a_reason_and_refunds() {
    let err = plan_transition(
        OrderStatus::ToBeConfirmed,
        PayStatus::Paid,
        &OrderAction::Reject {
            reason: String::new(),
        },
        now(),
    )
    .expect_err("no reason");
    assert!(matches!(err, TransitionError::MissingReason(_)));

    let plan = plan_transition(
        OrderStatus::ToBeConfirmed,
        PayStatus::Paid,
        &OrderAction::Reject {
            reason: " sold out ".into(),
        },
        now(),
    )
    .expect("legal");
    assert_eq!(plan.status, OrderStatus::Cancelled);
    assert_eq!(plan.pay_status, PayStatus::Refund);
    assert_eq!(plan.rejection_reason.as_deref(), Some("sold out"));
    assert_eq!(plan.cancel_time, Some(now()));
}

#[test]
fn customers_cancel_only_before_confirmation() {
    let unpaid = plan_transition(
        OrderStatus::PendingPayment,
        PayStatus::Unpaid,
        &cancel(CancelInitiator::Customer, "changed my mind"),
        now(),
    )
    .expect("legal");
    assert_eq!(unpaid.pay_status, PayStatus::Unpaid);

    let paid = plan_transition(
        OrderStatus::ToBeConfirmed,
        PayStatus::Paid,
        &cancel(CancelInitiator::Customer, "changed my mind"),
        now(),
    )
    .expect("legal");
    assert_eq!(paid.pay_status, PayStatus::Refund);

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::DeliveryInProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ] {
        assert!(
            plan_transition(
                status,
                PayStatus::Paid,
                &cancel(CancelInitiator::Customer, "too late"),
                now()
            )
            .is_err(),
            "customer cancel from {status:?}"
        );
    }
}

#[test]
fn merchants_cancel_anything_not_finished() {
    for status in [
        OrderStatus::PendingPayment,
        OrderStatus::ToBeConfirmed,
        OrderStatus::Confirmed,
        OrderStatus::DeliveryInProgress,
    ] {
        let plan = plan_transition(
            status,
            PayStatus::Paid,
            &cancel(CancelInitiator::Merchant, "kitchen closed"),
            now(),
        )
        .expect("legal");
        assert_eq!(plan.status, OrderStatus::Cancelled);
        assert_eq!(plan.cancel_reason.as_deref(), Some("kitchen closed"));
    }

    for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
        assert!(
            plan_transition(
                status,
                PayStatus::Paid,
                &cancel(CancelInitiator::Merchant, "kitchen closed"),
                now()
            )
            .is_err()
        );
    }
}

#[test]
fn timeout_cancels_unpaid_orders_with_fixed_reason() {
    let plan = plan_transition(
        OrderStatus::PendingPayment,
        PayStatus::Unpaid,
        &OrderAction::PaymentTimedOut,
        now(),
    )
    .expect("legal");
    assert_eq!(plan.status, OrderStatus::Cancelled);
    assert_eq!(plan.pay_status, PayStatus::Unpaid);
    assert_eq!(plan.cancel_reason.as_deref(), Some(TIMEOUT_CANCEL_REASON));

    assert!(
        plan_transition(
            OrderStatus::ToBeConfirmed,
            PayStatus::Paid,
            &OrderAction::PaymentTimedOut,
            now()
        )
        .is_err()
    );
}

#[test]
fn terminal_states_accept_nothing() {
    let actions = [
        OrderAction::PaymentSucceeded,
        OrderAction::Confirm,
        OrderAction::Dispatch,
        OrderAction::Complete,
        OrderAction::PaymentTimedOut,
        OrderAction::ForceComplete,
        OrderAction::Reject {
            reason: "late".into(),
        },
    ];
    for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
        assert!(status.is_terminal());
        for action in &actions {
            assert!(
                plan_transition(status, PayStatus::Paid, action, now()).is_err(),
                "{} from {status:?}",
                action.name()
            );
        }
    }
}
