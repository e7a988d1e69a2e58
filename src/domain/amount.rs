use crate::error::{LoanError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base units per whole coin (18 decimal places).
pub const UNITS_PER_COIN: u128 = 1_000_000_000_000_000_000;

/// Denominator of a basis-point rate: 10000 bps = 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// A value of the single collateral asset, counted in indivisible base units.
///
/// All registry arithmetic happens on base units. Coin-denominated decimals only
/// exist at the CSV boundary, see [`Amount::from_coins`] and [`Amount::to_coins`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(units: u128) -> Self {
        Self(units)
    }

    pub fn units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0.checked_add(rhs.0).map(Self).ok_or(LoanError::Overflow)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(LoanError::Overflow)
    }

    /// Flat interest on `self` at `rate_bps`, rounded down.
    pub fn interest(self, rate_bps: u32) -> Result<Self> {
        self.0
            .checked_mul(u128::from(rate_bps))
            .map(|scaled| Self(scaled / BPS_DENOMINATOR))
            .ok_or(LoanError::Overflow)
    }

    /// Converts a coin-denominated decimal into base units.
    ///
    /// Rejects negative values and values finer than one base unit.
    pub fn from_coins(coins: Decimal) -> Result<Self> {
        if coins.is_sign_negative() {
            return Err(LoanError::ValidationError(format!(
                "amount must not be negative: {coins}"
            )));
        }
        let units = coins
            .checked_mul(Decimal::from(UNITS_PER_COIN as u64))
            .ok_or(LoanError::Overflow)?;
        if !units.fract().is_zero() {
            return Err(LoanError::ValidationError(format!(
                "amount has more than 18 decimal places: {coins}"
            )));
        }
        units.to_u128().map(Self).ok_or(LoanError::Overflow)
    }

    /// Converts base units back into a normalized coin-denominated decimal.
    pub fn to_coins(&self) -> Result<Decimal> {
        let units = i128::try_from(self.0).map_err(|_| LoanError::Overflow)?;
        Decimal::try_from_i128_with_scale(units, 18)
            .map(|d| d.normalize())
            .map_err(|_| LoanError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
