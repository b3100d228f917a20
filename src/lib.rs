//! FX trade formula engine with min/max scenario bands and SQLite bound storage.

pub mod db;
pub mod formula;
pub mod scenario;

pub use formula::{
    FormulaError, Precision, RateAdjustmentMode, RoundingMode, TradeDirection, TradeFormula,
    TradeInputs,
};
pub use scenario::{Band, ScenarioBounds, ScenarioConfig, ScenarioResults, ScenarioRunner, Variable};
