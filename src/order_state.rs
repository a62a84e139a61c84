//! Order lifecycle rules.
//!
//! `status` and `pay_status` move independently. Every legal move is described by
//! [`plan_transition`], which turns the current pair plus an [`OrderAction`] into a
//! [`TransitionPlan`]. The plan carries the expected source state so the writer can
//! apply it as a conditional update and detect lost races.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const TIMEOUT_CANCEL_REASON: &str = "timeout, auto-cancelled";
pub const USER_CANCEL_REASON: &str = "user cancelled";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending_payment")]
    PendingPayment,
    #[sea_orm(string_value = "to_be_confirmed")]
    ToBeConfirmed,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "delivery_in_progress")]
    DeliveryInProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Position along the forward path. `Cancelled` sits outside of it.
    fn rank(self) -> u8 {
        match self {
            OrderStatus::PendingPayment => 1,
            OrderStatus::ToBeConfirmed => 2,
            OrderStatus::Confirmed => 3,
            OrderStatus::DeliveryInProgress => 4,
            OrderStatus::Completed => 5,
            OrderStatus::Cancelled => 6,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Customers may only withdraw an order the merchant has not accepted yet.
    pub fn is_customer_cancellable(self) -> bool {
        self.rank() < OrderStatus::Confirmed.rank()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PayStatus {
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "refund")]
    Refund,
}

impl PayStatus {
    /// Money that was taken is returned whenever a paid order is cancelled.
    fn after_cancellation(self) -> PayStatus {
        match self {
            PayStatus::Paid => PayStatus::Refund,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CancelInitiator {
    Customer,
    Merchant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    PaymentSucceeded,
    Confirm,
    Reject { reason: String },
    Cancel { initiator: CancelInitiator, reason: String },
    Dispatch,
    Complete,
    PaymentTimedOut,
    ForceComplete,
}

impl OrderAction {
    pub fn name(&self) -> &'static str {
        match self {
            OrderAction::PaymentSucceeded => "payment_succeeded",
            OrderAction::Confirm => "confirm",
            OrderAction::Reject { .. } => "reject",
            OrderAction::Cancel { .. } => "cancel",
            OrderAction::Dispatch => "dispatch",
            OrderAction::Complete => "complete",
            OrderAction::PaymentTimedOut => "payment_timeout",
            OrderAction::ForceComplete => "force_complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} an order in status {from:?}")]
    InvalidStatus {
        action: &'static str,
        from: OrderStatus,
    },
    #[error("{0} is required")]
    MissingReason(&'static str),
}

/// The write a legal transition results in.
///
/// `None` fields are left untouched by the update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub expected_status: OrderStatus,
    pub expected_pay_status: PayStatus,
    pub status: OrderStatus,
    pub pay_status: PayStatus,
    pub checkout_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub cancel_time: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
}

impl TransitionPlan {
    fn new(from: (OrderStatus, PayStatus), to: OrderStatus) -> Self {
        Self {
            expected_status: from.0,
            expected_pay_status: from.1,
            status: to,
            pay_status: from.1,
            checkout_time: None,
            delivery_time: None,
            cancel_time: None,
            cancel_reason: None,
            rejection_reason: None,
        }
    }
}

pub fn plan_transition(
    status: OrderStatus,
    pay_status: PayStatus,
    action: &OrderAction,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, TransitionError> {
    let from = (status, pay_status);
    let invalid = || TransitionError::InvalidStatus {
        action: action.name(),
        from: status,
    };

    let plan = match action {
        OrderAction::PaymentSucceeded => {
            if status != OrderStatus::PendingPayment || pay_status != PayStatus::Unpaid {
                return Err(invalid());
            }
            let mut plan = TransitionPlan::new(from, OrderStatus::ToBeConfirmed);
            plan.pay_status = PayStatus::Paid;
            plan.checkout_time = Some(now);
            plan
        }
        OrderAction::Confirm => {
            if status != OrderStatus::ToBeConfirmed {
                return Err(invalid());
            }
            TransitionPlan::new(from, OrderStatus::Confirmed)
        }
        OrderAction::Reject { reason } => {
            let reason = required(reason, "rejection reason")?;
            if status != OrderStatus::ToBeConfirmed {
                return Err(invalid());
            }
            let mut plan = TransitionPlan::new(from, OrderStatus::Cancelled);
            plan.pay_status = pay_status.after_cancellation();
            plan.rejection_reason = Some(reason);
            plan.cancel_time = Some(now);
            plan
        }
        OrderAction::Cancel { initiator, reason } => {
            let reason = required(reason, "cancel reason")?;
            let allowed = match initiator {
                CancelInitiator::Customer => status.is_customer_cancellable(),
                CancelInitiator::Merchant => !status.is_terminal(),
            };
            if !allowed {
                return Err(invalid());
            }
            let mut plan = TransitionPlan::new(from, OrderStatus::Cancelled);
            plan.pay_status = pay_status.after_cancellation();
            plan.cancel_reason = Some(reason);
            plan.cancel_time = Some(now);
            plan
        }
        OrderAction::Dispatch => {
            if status != OrderStatus::Confirmed {
                return Err(invalid());
            }
            TransitionPlan::new(from, OrderStatus::DeliveryInProgress)
        }
        OrderAction::Complete | OrderAction::ForceComplete => {
            if status != OrderStatus::DeliveryInProgress {
                return Err(invalid());
            }
            let mut plan = TransitionPlan::new(from, OrderStatus::Completed);
            plan.delivery_time = Some(now);
            plan
        }
        OrderAction::PaymentTimedOut => {
            if status != OrderStatus::PendingPayment {
                return Err(invalid());
            }
            let mut plan = TransitionPlan::new(from, OrderStatus::Cancelled);
            plan.pay_status = pay_status.after_cancellation();
            plan.cancel_reason = Some(TIMEOUT_CANCEL_REASON.to_string());
            plan.cancel_time = Some(now);
            plan
        }
    };

    Ok(plan)
}

fn required(reason: &str, what: &'static str) -> Result<String, TransitionError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(TransitionError::MissingReason(what));
    }
    Ok(reason.to_string())
}
