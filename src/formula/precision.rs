//! Division scale and rounding policy.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::FormulaError;

/// Largest scale a `Decimal` can carry.
pub const MAX_SCALE: u32 = 28;

/// Rounding applied after every division.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Ties round away from zero.
    #[default]
    HalfUp,
    /// Ties round to the even neighbour.
    HalfEven,
    /// Ties round toward zero.
    HalfDown,
    /// Always away from zero.
    Up,
    /// Always toward zero.
    Down,
}

impl RoundingMode {
    pub fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
            RoundingMode::Down => RoundingStrategy::ToZero,
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoundingMode::HalfUp => "half_up",
            RoundingMode::HalfEven => "half_even",
            RoundingMode::HalfDown => "half_down",
            RoundingMode::Up => "up",
            RoundingMode::Down => "down",
        };
        f.write_str(s)
    }
}

impl FromStr for RoundingMode {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "half_up" => Ok(Self::HalfUp),
            "half_even" => Ok(Self::HalfEven),
            "half_down" => Ok(Self::HalfDown),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(FormulaError::UnknownRounding(other.to_string())),
        }
    }
}

/// Scale and rounding used at every division boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    /// Fractional digits kept after a division
    pub scale: u32,

    /// How the discarded digits are rounded
    pub rounding: RoundingMode,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            scale: 10,
            rounding: RoundingMode::HalfUp,
        }
    }
}

impl Precision {
    pub fn new(scale: u32, rounding: RoundingMode) -> Self {
        Self { scale, rounding }
    }

    /// Round a value to this precision.
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, self.rounding.strategy())
    }

    /// Divide and round, failing on a zero denominator.
    ///
    /// `what` names the quantity being computed and ends up in the error.
    pub fn div(
        &self,
        numerator: Decimal,
        denominator: Decimal,
        what: &'static str,
    ) -> Result<Decimal, FormulaError> {
        if denominator.is_zero() {
            return Err(FormulaError::DivisionByZero(what));
        }
        numerator
            .checked_div(denominator)
            .map(|q| self.round(q))
            .ok_or(FormulaError::Overflow(what))
    }

    /// `1 / value`, rounded.
    pub fn recip(&self, value: Decimal, what: &'static str) -> Result<Decimal, FormulaError> {
        self.div(Decimal::ONE, value, what)
    }
}
