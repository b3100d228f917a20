//! Trade formula engine: direction-aware normalization and closed-form inverses.

mod direction;
mod engine;
mod error;
mod precision;

pub use direction::{RateAdjustmentMode, TradeDirection};
pub use engine::{TradeFormula, TradeInputs};
pub use error::FormulaError;
pub use precision::{Precision, RoundingMode, MAX_SCALE};
