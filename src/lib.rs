//! Arbitrary-precision decimal expression calculator: a hand-rolled expression
//! compiler and tree evaluator (`expr`) plus a standalone lexical-analysis
//! prototype (`lexis`).

pub mod expr;
pub mod lexis;

pub use bigdecimal::{BigDecimal, RoundingMode};
pub use expr::{compile, Definition, Environment, Evaluator, ExprError, Node, NodeKind};

/// Evaluates an expression with the default division policy (scale 48,
/// rounding half-up).
///
/// Each call runs against a fresh environment; hold an [`Evaluator`] instead
/// to keep variables and definitions across calls.
pub fn evaluate_expression(expression: &str) -> Result<BigDecimal, ExprError> {
    let mut evaluator = Evaluator::default();
    evaluator.evaluate(expression)
}
