//! Scenario configuration.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::formula::{Precision, RateAdjustmentMode, TradeDirection, MAX_SCALE};

/// Parameters shared by every formula instance in a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Direction of the modelled trade
    pub direction: TradeDirection,

    /// Whether bounds are market mids (spread applied) or execution rates
    pub adjustment: RateAdjustmentMode,

    /// Full bid/ask spread
    pub spread: Decimal,

    /// Base-to-cross conversion rate
    pub rate_bk: Decimal,

    /// Cross-to-quote conversion rate
    pub rate_kn: Decimal,

    /// Division scale and rounding
    #[serde(default)]
    pub precision: Precision,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            direction: TradeDirection::Sell,
            adjustment: RateAdjustmentMode::ExecutionBased,
            spread: dec!(0.001),
            rate_bk: dec!(0.95),
            rate_kn: dec!(0.98),
            precision: Precision::default(),
        }
    }
}

impl ScenarioConfig {
    /// Reject values no formula instance could be built from.
    pub fn validate(&self) -> Result<()> {
        if self.spread < Decimal::ZERO {
            bail!("spread must not be negative (got {})", self.spread);
        }
        if self.precision.scale > MAX_SCALE {
            bail!(
                "scale {} exceeds the maximum decimal scale of {}",
                self.precision.scale,
                MAX_SCALE
            );
        }
        Ok(())
    }
}
