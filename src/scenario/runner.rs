//! Min/max band calculation for the five scenario variables.
//!
//! Each variable is solved twice, once from the bounds that push it low and
//! once from the bounds that push it high. A band whose inputs are not all
//! positive, or whose formula fails, is stored as zero.

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::{Band, ScenarioBounds, ScenarioConfig, ScenarioResults, Variable};
use crate::formula::{FormulaError, TradeFormula, TradeInputs};

/// Runs every variable of a scenario against one configuration.
pub struct ScenarioRunner {
    config: ScenarioConfig,
}

impl ScenarioRunner {
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Compute result bands for all variables.
    pub fn run(&self, bounds: &ScenarioBounds) -> ScenarioResults {
        info!(
            direction = %self.config.direction,
            mode = %self.config.adjustment,
            spread = %self.config.spread,
            rate_bk = %self.config.rate_bk,
            rate_kn = %self.config.rate_kn,
            "Running scenario"
        );

        let mut results = ScenarioResults::default();
        for variable in Variable::ALL {
            *results.get_mut(variable) = self.band(variable, bounds);
        }
        results
    }

    /// Compute the band for one variable, substituting zero on failure.
    pub fn band(&self, variable: Variable, bounds: &ScenarioBounds) -> Band {
        if !self.guard(variable, bounds) {
            warn!(variable = %variable, "Skipping calculation: bounds must be positive");
            return Band::zero();
        }

        match self.solve(variable, bounds) {
            Ok(band) => {
                info!(variable = %variable, min = %band.min, max = %band.max, "Band calculated");
                band
            }
            Err(e) => {
                warn!(variable = %variable, error = %e, "Calculation failed, storing zero");
                Band::zero()
            }
        }
    }

    /// Input bounds that must be strictly positive for `variable`.
    fn guard(&self, variable: Variable, b: &ScenarioBounds) -> bool {
        let rates = b.opening_value.is_positive() && b.closing_value.is_positive();
        match variable {
            Variable::TradeProfit | Variable::TradeAmount => rates,
            Variable::ProfitFactor => b.trade_amount.is_positive() && rates,
            Variable::OpeningValue => {
                b.trade_amount.is_positive() && b.closing_value.is_positive()
            }
            Variable::ClosingValue => {
                b.trade_amount.is_positive() && b.opening_value.is_positive()
            }
        }
    }

    fn formula(
        &self,
        amount: Decimal,
        opening: Decimal,
        closing: Decimal,
    ) -> Result<TradeFormula, FormulaError> {
        let inputs = TradeInputs {
            direction: self.config.direction,
            spread: self.config.spread,
            rate_bk: self.config.rate_bk,
            rate_kn: self.config.rate_kn,
            trade_amount: amount,
            opening_value: opening,
            closing_value: closing,
        };
        TradeFormula::with_mode(inputs, self.config.adjustment, self.config.precision)
    }

    fn solve(&self, variable: Variable, b: &ScenarioBounds) -> Result<Band, FormulaError> {
        let amount = b.trade_amount;
        let profit = b.trade_profit;
        let open = b.opening_value;
        let close = b.closing_value;

        let band = match variable {
            Variable::TradeProfit => {
                let low = self.formula(amount.min, open.min, close.max)?;
                let high = self.formula(amount.max, open.max, close.min)?;
                Band::new(low.checked_profit(amount.min)?, high.checked_profit(amount.max)?)
            }
            Variable::ProfitFactor => {
                let low = self.formula(amount.max, open.min, close.max)?;
                let high = self.formula(amount.min, open.max, close.min)?;
                Band::new(
                    low.profit_factor(profit.min, amount.max)?,
                    high.profit_factor(profit.max, amount.min)?,
                )
            }
            Variable::TradeAmount => {
                let low = self.formula(Decimal::ONE, open.min, close.max)?;
                let high = self.formula(Decimal::ONE, open.max, close.min)?;
                Band::new(
                    low.trade_amount(profit.min, Decimal::ONE)?,
                    high.trade_amount(profit.max, Decimal::ONE)?,
                )
            }
            Variable::OpeningValue => {
                // The unknown endpoint is a placeholder; only the closing side is read.
                let low = self.formula(amount.max, Decimal::ONE, close.max)?;
                let high = self.formula(amount.min, Decimal::ONE, close.min)?;
                Band::new(
                    low.opening(profit.min, amount.max)?,
                    high.opening(profit.max, amount.min)?,
                )
            }
            Variable::ClosingValue => {
                let low = self.formula(amount.max, open.min, Decimal::ONE)?;
                let high = self.formula(amount.min, open.max, Decimal::ONE)?;
                Band::new(
                    low.closing(profit.min, amount.max)?,
                    high.closing(profit.max, amount.min)?,
                )
            }
        };

        debug!(variable = %variable, band = %band, "Solved");
        Ok(band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Precision, RateAdjustmentMode, TradeDirection};
    use rust_decimal_macros::dec;

    fn reference_config() -> ScenarioConfig {
        ScenarioConfig {
            direction: TradeDirection::Sell,
            adjustment: RateAdjustmentMode::ExecutionBased,
            spread: dec!(0.01),
            rate_bk: dec!(17.7055),
            rate_kn: dec!(1.0),
            precision: Precision::default(),
        }
    }

    fn reference_bounds() -> ScenarioBounds {
        ScenarioBounds {
            trade_profit: Band::new(dec!(-88), dec!(-88)),
            profit_factor: Band::zero(),
            trade_amount: Band::new(dec!(10000), dec!(10000)),
            opening_value: Band::new(dec!(17.6967), dec!(17.6967)),
            closing_value: Band::new(dec!(17.7055), dec!(17.7055)),
        }
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        let diff = (actual - expected).abs();
        assert!(diff <= dec!(0.01), "expected {expected}, got {actual}");
    }

    #[test]
    fn test_degenerate_bounds_reproduce_reference() {
        let runner = ScenarioRunner::new(reference_config()).unwrap();
        let results = runner.run(&reference_bounds());

        assert_eq!(results.trade_profit.min, dec!(-87.9999225769375));
        assert_eq!(results.trade_profit.min, results.trade_profit.max);
        assert_eq!(results.profit_factor.min, dec!(-0.0004970207));
        assert_close(results.trade_amount.min, dec!(10000));
        assert_close(results.opening_value.max, dec!(17.6967));
        assert_close(results.closing_value.max, dec!(17.7055));
    }

    #[test]
    fn test_profit_band_orders_sell_extremes() {
        let runner = ScenarioRunner::new(reference_config()).unwrap();
        let bounds = ScenarioBounds {
            trade_amount: Band::new(dec!(5000), dec!(10000)),
            opening_value: Band::new(dec!(17.69), dec!(17.72)),
            closing_value: Band::new(dec!(17.70), dec!(17.71)),
            ..Default::default()
        };

        let band = runner.band(Variable::TradeProfit, &bounds);
        // Worst: open low, close high. Best: open high, close low.
        assert!(band.min < Decimal::ZERO);
        assert!(band.max > Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_bounds_yield_zero() {
        let runner = ScenarioRunner::new(reference_config()).unwrap();
        let results = runner.run(&ScenarioBounds::default());
        assert_eq!(results, ScenarioResults::default());

        let mut bounds = reference_bounds();
        bounds.trade_amount.min = Decimal::ZERO;
        assert_eq!(runner.band(Variable::ProfitFactor, &bounds), Band::zero());
        assert_eq!(runner.band(Variable::OpeningValue, &bounds), Band::zero());
        // Profit only needs positive rates.
        assert_ne!(runner.band(Variable::TradeProfit, &bounds), Band::zero());
    }

    #[test]
    fn test_opening_band_ignores_opening_bounds() {
        let runner = ScenarioRunner::new(reference_config()).unwrap();
        let mut bounds = reference_bounds();
        bounds.opening_value = Band::zero();

        let band = runner.band(Variable::OpeningValue, &bounds);
        assert_close(band.min, dec!(17.6967));
    }

    #[test]
    fn test_formula_failure_yields_zero() {
        let runner = ScenarioRunner::new(reference_config()).unwrap();
        // Opening and closing cancel for SELL at 2 / 2, so no amount exists.
        let bounds = ScenarioBounds {
            trade_profit: Band::new(dec!(10), dec!(20)),
            opening_value: Band::new(dec!(2), dec!(2)),
            closing_value: Band::new(dec!(2), dec!(2)),
            ..Default::default()
        };
        assert_eq!(runner.band(Variable::TradeAmount, &bounds), Band::zero());
    }

    #[test]
    fn test_oversized_amount_yields_zero_instead_of_aborting() {
        let runner = ScenarioRunner::new(reference_config()).unwrap();
        let bounds = ScenarioBounds {
            trade_amount: Band::new(dec!(10000), Decimal::MAX),
            ..reference_bounds()
        };

        let results = runner.run(&bounds);
        assert_eq!(results.trade_profit, Band::zero());
        assert_eq!(results.profit_factor, Band::zero());
        // Solved with a unit amount, so unaffected.
        assert_close(results.trade_amount.min, dec!(10000));
    }

    #[test]
    fn test_market_based_is_applied_at_construction() {
        let config = ScenarioConfig {
            adjustment: RateAdjustmentMode::MarketBased,
            ..reference_config()
        };
        let market = ScenarioRunner::new(config).unwrap().run(&reference_bounds());
        let execution = ScenarioRunner::new(reference_config())
            .unwrap()
            .run(&reference_bounds());

        // Spread widens the SELL loss.
        assert!(market.trade_profit.min < execution.trade_profit.min);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScenarioConfig {
            spread: dec!(-1),
            ..reference_config()
        };
        assert!(ScenarioRunner::new(config).is_err());
    }
}
