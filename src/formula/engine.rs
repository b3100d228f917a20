//! The trade formula: one invariant relating amount, profit, profit factor,
//! opening rate and closing rate.
//!
//! ```text
//! profit = amount * rate_bk * rate_kn * (opening_factor * closing_factor - 1)
//! ```
//!
//! For a SELL the opening factor is the opening rate and the closing factor is
//! the reciprocal of the closing rate. For a BUY the roles are swapped. Every
//! inverse below solves the same equation for a different unknown.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{FormulaError, Precision, RateAdjustmentMode, TradeDirection};

/// Raw constructor inputs for a [`TradeFormula`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInputs {
    /// Trade direction
    pub direction: TradeDirection,

    /// Full bid/ask spread; half is applied per endpoint in market-based mode
    pub spread: Decimal,

    /// Base-to-cross conversion rate
    pub rate_bk: Decimal,

    /// Cross-to-quote conversion rate
    pub rate_kn: Decimal,

    /// Trade amount in base units
    pub trade_amount: Decimal,

    /// Opening rate
    pub opening_value: Decimal,

    /// Closing rate
    pub closing_value: Decimal,
}

/// A normalized single-trade formula.
///
/// Factors are derived once, at construction, under the adjustment mode
/// passed in. Changing the mode afterwards does not re-derive them.
#[derive(Debug, Clone)]
pub struct TradeFormula {
    direction: TradeDirection,
    spread: Decimal,
    rate_bk: Decimal,
    rate_kn: Decimal,
    trade_amount: Decimal,
    opening_value: Decimal,
    closing_value: Decimal,
    opening_factor: Decimal,
    closing_factor: Decimal,
    mode: RateAdjustmentMode,
    precision: Precision,
}

impl TradeFormula {
    /// Build an execution-based formula at the default precision.
    pub fn new(inputs: TradeInputs) -> Result<Self, FormulaError> {
        Self::with_mode(inputs, RateAdjustmentMode::default(), Precision::default())
    }

    /// Build a formula, deriving factors under `mode` and `precision`.
    pub fn with_mode(
        inputs: TradeInputs,
        mode: RateAdjustmentMode,
        precision: Precision,
    ) -> Result<Self, FormulaError> {
        let TradeInputs {
            direction,
            spread,
            rate_bk,
            rate_kn,
            trade_amount,
            opening_value,
            closing_value,
        } = inputs;

        direction.check_critical_rate(opening_value, closing_value)?;

        let (opening_value, closing_value) = if mode.is_market_based() {
            direction.adjust_for_spread(opening_value, closing_value, spread, &precision)?
        } else {
            (opening_value, closing_value)
        };

        let (opening_factor, closing_factor) =
            direction.factors(opening_value, closing_value, &precision)?;

        trace!(
            direction = %direction,
            mode = %mode,
            opening = %opening_value,
            closing = %closing_value,
            opening_factor = %opening_factor,
            closing_factor = %closing_factor,
            "Trade formula normalized"
        );

        Ok(Self {
            direction,
            spread,
            rate_bk,
            rate_kn,
            trade_amount,
            opening_value,
            closing_value,
            opening_factor,
            closing_factor,
            mode,
            precision,
        })
    }

    pub fn direction(&self) -> TradeDirection {
        self.direction
    }

    pub fn spread(&self) -> Decimal {
        self.spread
    }

    pub fn rate_bk(&self) -> Decimal {
        self.rate_bk
    }

    pub fn rate_kn(&self) -> Decimal {
        self.rate_kn
    }

    /// The amount given at construction. None of the formulas read it.
    pub fn trade_amount_input(&self) -> Decimal {
        self.trade_amount
    }

    /// Opening rate after any spread adjustment.
    pub fn opening_value(&self) -> Decimal {
        self.opening_value
    }

    /// Closing rate after any spread adjustment.
    pub fn closing_value(&self) -> Decimal {
        self.closing_value
    }

    pub fn opening_factor(&self) -> Decimal {
        self.opening_factor
    }

    pub fn closing_factor(&self) -> Decimal {
        self.closing_factor
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Set the adjustment flag. Derived factors are left untouched.
    pub fn set_adjustment_mode(&mut self, mode: RateAdjustmentMode) {
        self.mode = mode;
    }

    pub fn adjustment_mode(&self) -> RateAdjustmentMode {
        self.mode
    }

    pub fn is_market_based(&self) -> bool {
        self.mode.is_market_based()
    }

    /// Net rate movement `opening_factor * closing_factor - 1`.
    fn movement(&self) -> Result<Decimal, FormulaError> {
        self.opening_factor
            .checked_mul(self.closing_factor)
            .and_then(|product| product.checked_sub(Decimal::ONE))
            .ok_or(FormulaError::Overflow("rate movement"))
    }

    /// Conversion `rate_bk * rate_kn`.
    fn conversion(&self) -> Result<Decimal, FormulaError> {
        self.rate_bk
            .checked_mul(self.rate_kn)
            .ok_or(FormulaError::Overflow("conversion rate"))
    }

    /// Notional exposure `amount * rate_bk * rate_kn`.
    fn exposure(&self, amount: Decimal) -> Result<Decimal, FormulaError> {
        amount
            .checked_mul(self.conversion()?)
            .ok_or(FormulaError::Overflow("exposure"))
    }

    /// Realized profit for `amount`. Not rounded.
    ///
    /// # Panics
    ///
    /// If the product does not fit in a `Decimal`. Use [`Self::checked_profit`]
    /// when the inputs are not known to be in range.
    pub fn profit(&self, amount: Decimal) -> Decimal {
        amount * self.rate_bk * self.rate_kn * (self.opening_factor * self.closing_factor - Decimal::ONE)
    }

    /// [`Self::profit`], reporting overflow instead of panicking.
    pub fn checked_profit(&self, amount: Decimal) -> Result<Decimal, FormulaError> {
        self.exposure(amount)?
            .checked_mul(self.movement()?)
            .ok_or(FormulaError::Overflow("trade profit"))
    }

    /// Profit normalized by exposure.
    pub fn profit_factor(&self, profit: Decimal, amount: Decimal) -> Result<Decimal, FormulaError> {
        self.precision
            .div(profit, self.exposure(amount)?, "profit factor")
    }

    /// Amount needed to realize `profit`.
    ///
    /// `amount` is accepted so all inverses share a signature; it is not read.
    /// Fails when the rates did not move, since no amount produces a profit then.
    pub fn trade_amount(&self, profit: Decimal, _amount: Decimal) -> Result<Decimal, FormulaError> {
        let per_unit = self
            .conversion()?
            .checked_mul(self.movement()?)
            .ok_or(FormulaError::Overflow("trade amount"))?;
        self.precision.div(profit, per_unit, "trade amount")
    }

    /// `profit / exposure + 1`, the factor product implied by `profit`.
    fn implied_product(&self, profit: Decimal, amount: Decimal) -> Result<Decimal, FormulaError> {
        self.profit_factor(profit, amount)?
            .checked_add(Decimal::ONE)
            .ok_or(FormulaError::Overflow("factor product"))
    }

    /// Opening rate that yields `profit` on `amount` given the closing side.
    pub fn opening(&self, profit: Decimal, amount: Decimal) -> Result<Decimal, FormulaError> {
        let product = self.implied_product(profit, amount)?;
        let factor = self
            .precision
            .div(product, self.closing_factor, "opening factor")?;

        match self.direction {
            TradeDirection::Sell => Ok(factor),
            TradeDirection::Buy => self.precision.recip(factor, "opening value"),
        }
    }

    /// Closing rate that yields `profit` on `amount` given the opening side.
    pub fn closing(&self, profit: Decimal, amount: Decimal) -> Result<Decimal, FormulaError> {
        let product = self.implied_product(profit, amount)?;
        let factor = self
            .precision
            .div(product, self.opening_factor, "closing factor")?;

        match self.direction {
            TradeDirection::Sell => self.precision.recip(factor, "closing value"),
            TradeDirection::Buy => Ok(factor),
        }
    }
}
