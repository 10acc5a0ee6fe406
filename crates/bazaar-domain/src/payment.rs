//! Payment types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Verification state of the single payment attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

/// Manual transfer channels accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [Self; 2] = [Self::Upi, Self::BankTransfer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::BankTransfer => "bank_transfer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Upi => "UPI Transfer",
            Self::BankTransfer => "Bank Transfer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Upi => "Pay using UPI",
            Self::BankTransfer => "Direct bank transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upi" => Ok(Self::Upi),
            "bank_transfer" => Ok(Self::BankTransfer),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

/// A stored string that does not name any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);
