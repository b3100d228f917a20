use thiserror::Error;

/// Errors raised by the trade formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// A direction-critical endpoint rate is zero.
    #[error("invalid rate: {0}")]
    InvalidRate(String),

    /// A denominator evaluated to exactly zero.
    #[error("division by zero while computing {0}")]
    DivisionByZero(&'static str),

    /// A quotient does not fit in a `Decimal`.
    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    #[error("unknown trade direction: {0:?} (expected BUY or SELL)")]
    UnknownDirection(String),

    #[error("unknown rounding mode: {0:?}")]
    UnknownRounding(String),
}
