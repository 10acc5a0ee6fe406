//! Order lifecycle: statuses, admin transitions and order numbers.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::payment::{PaymentStatus, UnknownVariant};

/// Status of an order.
///
/// New orders start in `PendingVerification`. Admins move them out of the awaiting states
/// (`PendingVerification`, `Processing`) with an [`AdminDecision`], then along the
/// fulfilment path with a [`FulfilmentStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingVerification,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [Self; 7] = [
        Self::PendingVerification,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingVerification => "pending_verification",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Human-readable name used in emails and `status_display` fields.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::PendingVerification => "Pending Verification",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
        }
    }

    /// Payment evidence may only be attached while an admin has not decided yet.
    pub fn accepts_payment_proof(self) -> bool {
        self.awaits_admin_decision()
    }

    pub fn awaits_admin_decision(self) -> bool {
        matches!(self, Self::PendingVerification | Self::Processing)
    }

    /// Whether the fulfilment path (`shipped` / `delivered` / `refunded`) is open.
    pub fn can_advance(self) -> bool {
        matches!(self, Self::Confirmed | Self::Processing | Self::Shipped)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

/// Rejected order transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order in status {current} cannot move to {requested}")]
pub struct InvalidTransition {
    pub current: OrderStatus,
    pub requested: OrderStatus,
}

/// Admin verdict on submitted payment evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminDecision {
    Confirmed,
    Cancelled,
}

impl AdminDecision {
    pub fn order_status(self) -> OrderStatus {
        match self {
            Self::Confirmed => OrderStatus::Confirmed,
            Self::Cancelled => OrderStatus::Cancelled,
        }
    }

    pub fn payment_status(self) -> PaymentStatus {
        match self {
            Self::Confirmed => PaymentStatus::Verified,
            Self::Cancelled => PaymentStatus::Failed,
        }
    }

    /// Returns the new order status, or an error when the order is not awaiting a decision.
    pub fn apply(self, current: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        if current.awaits_admin_decision() {
            Ok(self.order_status())
        } else {
            Err(InvalidTransition {
                current,
                requested: self.order_status(),
            })
        }
    }
}

/// Post-approval fulfilment transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfilmentStep {
    Shipped,
    Delivered,
    Refunded,
}

impl FulfilmentStep {
    pub fn order_status(self) -> OrderStatus {
        match self {
            Self::Shipped => OrderStatus::Shipped,
            Self::Delivered => OrderStatus::Delivered,
            Self::Refunded => OrderStatus::Refunded,
        }
    }

    /// Payment status that accompanies the step, if it changes one.
    pub fn payment_status(self) -> Option<PaymentStatus> {
        match self {
            Self::Refunded => Some(PaymentStatus::Refunded),
            Self::Shipped | Self::Delivered => None,
        }
    }

    pub fn apply(self, current: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        let requested = self.order_status();
        if current.can_advance() && current != requested {
            Ok(requested)
        } else {
            Err(InvalidTransition { current, requested })
        }
    }
}

/// Which admin controls apply to an order in its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminActions {
    pub can_approve: bool,
    pub can_cancel: bool,
    pub can_update: bool,
}

impl From<OrderStatus> for AdminActions {
    fn from(status: OrderStatus) -> Self {
        Self {
            can_approve: status.awaits_admin_decision(),
            can_cancel: status.awaits_admin_decision(),
            can_update: status.can_advance(),
        }
    }
}

// ── Order numbers ───────────────────────────────────────────────────────

pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// `ORD<YYYYMMDD>`, the shared prefix of every order number issued on `date`.
pub fn order_number_prefix(date: NaiveDate) -> String {
    format!("{ORDER_NUMBER_PREFIX}{}", date.format("%Y%m%d"))
}

/// Next order number for `date` given the highest number already issued that day.
///
/// Sequences start at `0001` and reset daily. A `last` value from another day or with an
/// unparseable suffix is treated as absent.
pub fn next_order_number(date: NaiveDate, last: Option<&str>) -> String {
    let prefix = order_number_prefix(date);
    let next = last
        .and_then(|n| n.strip_prefix(prefix.as_str()))
        .and_then(|seq| seq.parse::<u32>().ok())
        .map_or(1, |seq| seq + 1);
    format!("{prefix}{next:04}")
}
