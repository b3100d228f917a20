//! Named quantities and their min/max input bounds and result bands.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of the five quantities related by the trade formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    TradeProfit,
    ProfitFactor,
    TradeAmount,
    OpeningValue,
    ClosingValue,
}

impl Variable {
    /// All variables, in display and storage order.
    pub const ALL: [Variable; 5] = [
        Variable::TradeProfit,
        Variable::ProfitFactor,
        Variable::TradeAmount,
        Variable::OpeningValue,
        Variable::ClosingValue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variable::TradeProfit => "tradeprofit",
            Variable::ProfitFactor => "profitfactor",
            Variable::TradeAmount => "tradeamount",
            Variable::OpeningValue => "openingvalue",
            Variable::ClosingValue => "closingvalue",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', '_'], "");
        Variable::ALL
            .into_iter()
            .find(|v| v.as_str() == key)
            .ok_or_else(|| anyhow!("unknown variable: {s:?}"))
    }
}

/// User-writable bound column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundColumn {
    Minimum,
    Maximum,
}

impl BoundColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundColumn::Minimum => "minimum",
            BoundColumn::Maximum => "maximum",
        }
    }
}

impl fmt::Display for BoundColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimum" | "min" => Ok(BoundColumn::Minimum),
            "maximum" | "max" => Ok(BoundColumn::Maximum),
            other => Err(anyhow!("unknown column: {other:?} (expected minimum or maximum)")),
        }
    }
}

/// A min/max pair, used both for input bounds and for result bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub min: Decimal,
    pub max: Decimal,
}

impl Band {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// True when both ends are strictly positive.
    pub fn is_positive(&self) -> bool {
        self.min > Decimal::ZERO && self.max > Decimal::ZERO
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.min, self.max)
    }
}

/// Input bounds for every variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioBounds {
    pub trade_profit: Band,
    pub profit_factor: Band,
    pub trade_amount: Band,
    pub opening_value: Band,
    pub closing_value: Band,
}

/// Result band for every variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResults {
    pub trade_profit: Band,
    pub profit_factor: Band,
    pub trade_amount: Band,
    pub opening_value: Band,
    pub closing_value: Band,
}

macro_rules! band_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn get(&self, variable: Variable) -> Band {
                match variable {
                    Variable::TradeProfit => self.trade_profit,
                    Variable::ProfitFactor => self.profit_factor,
                    Variable::TradeAmount => self.trade_amount,
                    Variable::OpeningValue => self.opening_value,
                    Variable::ClosingValue => self.closing_value,
                }
            }

            pub fn get_mut(&mut self, variable: Variable) -> &mut Band {
                match variable {
                    Variable::TradeProfit => &mut self.trade_profit,
                    Variable::ProfitFactor => &mut self.profit_factor,
                    Variable::TradeAmount => &mut self.trade_amount,
                    Variable::OpeningValue => &mut self.opening_value,
                    Variable::ClosingValue => &mut self.closing_value,
                }
            }

            /// `(variable, band)` pairs in canonical order.
            pub fn iter(&self) -> impl Iterator<Item = (Variable, Band)> + '_ {
                Variable::ALL.into_iter().map(move |v| (v, self.get(v)))
            }
        }
    };
}

band_accessors!(ScenarioBounds);
band_accessors!(ScenarioResults);

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_variable_names() {
        assert_eq!(Variable::OpeningValue.as_str(), "openingvalue");
        assert_eq!("trade-profit".parse::<Variable>().unwrap(), Variable::TradeProfit);
        assert_eq!("closing_value".parse::<Variable>().unwrap(), Variable::ClosingValue);
        assert!("sellvariable".parse::<Variable>().is_err());
    }

    #[test]
    fn test_column_names() {
        assert_eq!("max".parse::<BoundColumn>().unwrap(), BoundColumn::Maximum);
        assert_eq!("Minimum".parse::<BoundColumn>().unwrap(), BoundColumn::Minimum);
        assert!("returnmin".parse::<BoundColumn>().is_err());
    }

    #[test]
    fn test_band_positive() {
        assert!(Band::new(dec!(1), dec!(2)).is_positive());
        assert!(!Band::new(dec!(0), dec!(2)).is_positive());
        assert!(!Band::zero().is_positive());
    }

    #[test]
    fn test_bounds_get_mut() {
        let mut bounds = ScenarioBounds::default();
        bounds.get_mut(Variable::TradeAmount).max = dec!(10000);
        assert_eq!(bounds.trade_amount.max, dec!(10000));
        assert_eq!(bounds.iter().count(), 5);
    }
}
