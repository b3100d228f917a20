//! Trade direction and rate adjustment mode.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::precision::Precision;
use super::FormulaError;

/// Direction of the modelled trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Sell,
    Buy,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Sell => "SELL",
            TradeDirection::Buy => "BUY",
        }
    }

    /// Fail if the endpoint this direction divides by is zero.
    ///
    /// SELL closes with a buy-back, so the closing rate is inverted.
    /// BUY inverts the opening rate instead.
    pub fn check_critical_rate(&self, opening: Decimal, closing: Decimal) -> Result<(), FormulaError> {
        match self {
            TradeDirection::Sell if closing.is_zero() => Err(FormulaError::InvalidRate(
                "closing rate cannot be zero for SELL".to_string(),
            )),
            TradeDirection::Buy if opening.is_zero() => Err(FormulaError::InvalidRate(
                "opening rate cannot be zero for BUY".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Apply the half-spread to both endpoints.
    ///
    /// A SELL opens lower and closes higher than the quoted mid; a BUY is the mirror.
    /// Returns `(adjusted_opening, adjusted_closing)`.
    pub fn adjust_for_spread(
        &self,
        opening: Decimal,
        closing: Decimal,
        spread: Decimal,
        precision: &Precision,
    ) -> Result<(Decimal, Decimal), FormulaError> {
        let half = precision.div(spread, Decimal::TWO, "half spread")?;
        let adjusted = match self {
            TradeDirection::Sell => opening.checked_sub(half).zip(closing.checked_add(half)),
            TradeDirection::Buy => opening.checked_add(half).zip(closing.checked_sub(half)),
        };
        adjusted.ok_or(FormulaError::Overflow("adjusted rate"))
    }

    /// Derive `(opening_factor, closing_factor)` from adjusted endpoints.
    ///
    /// Exactly one of the two is a reciprocal.
    pub fn factors(
        &self,
        opening: Decimal,
        closing: Decimal,
        precision: &Precision,
    ) -> Result<(Decimal, Decimal), FormulaError> {
        match self {
            TradeDirection::Sell => Ok((opening, precision.recip(closing, "closing factor")?)),
            TradeDirection::Buy => Ok((precision.recip(opening, "opening factor")?, closing)),
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeDirection {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SELL" => Ok(Self::Sell),
            "BUY" => Ok(Self::Buy),
            other => Err(FormulaError::UnknownDirection(other.to_string())),
        }
    }
}

/// Whether endpoint rates are already net execution rates or quoted market mids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateAdjustmentMode {
    /// Rates are used as given.
    #[default]
    ExecutionBased,
    /// Half the spread is applied to each endpoint before use.
    MarketBased,
}

impl RateAdjustmentMode {
    pub fn from_market_based(market_based: bool) -> Self {
        if market_based {
            Self::MarketBased
        } else {
            Self::ExecutionBased
        }
    }

    pub fn is_market_based(&self) -> bool {
        matches!(self, Self::MarketBased)
    }
}

impl fmt::Display for RateAdjustmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionBased => f.write_str("Execution-Based"),
            Self::MarketBased => f.write_str("Market-Based"),
        }
    }
}
