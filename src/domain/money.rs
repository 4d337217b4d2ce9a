use crate::error::EngineError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Platform fee rate charged on refunds and withdrawals.
pub const FEE_RATE: Decimal = dec!(0.015);

/// A wallet balance, quantized to 2 decimal places.
///
/// Wrapper around `rust_decimal::Decimal` to enforce domain rules and keep
/// financial arithmetic type-safe.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// A positive monetary amount, quantized to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, EngineError> {
        if value > Decimal::ZERO {
            Ok(Self(value.round_dp(2)))
        } else {
            Err(EngineError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Platform fee on this amount, rounded to 2 decimal places.
    pub fn platform_fee(&self) -> Decimal {
        (self.0 * FEE_RATE).round_dp(2)
    }

    /// Amount left after deducting the platform fee.
    pub fn net_of_fee(&self) -> Decimal {
        self.0 - self.platform_fee()
    }

    /// Amount plus the platform fee, as debited for a withdrawal.
    pub fn with_fee(&self) -> Decimal {
        self.0 + self.platform_fee()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = EngineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value.round_dp(2))
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}
