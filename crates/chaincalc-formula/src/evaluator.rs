//! Formula evaluator
//!
//! Evaluates expression trees to exact decimal values. All arithmetic is
//! arbitrary-precision decimal, never binary floating point, so chained
//! results do not accumulate representation error: `0.1+0.2` is exactly
//! `0.3`.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::parser::{parse, substitute, validate};
use bigdecimal::{BigDecimal, One, ToPrimitive, Zero};
use chaincalc_core::NodeId;
use std::collections::HashMap;

/// Evaluate formula text to an exact decimal value
///
/// Pure and deterministic: the same text always yields the identical
/// decimal string. Any `{{id}}` reference still present in the text fails
/// with [`FormulaError::UnknownReference`]; substitution is the caller's
/// job (see [`calculate_formula`]).
pub fn evaluate(text: &str) -> FormulaResult<BigDecimal> {
    let expr = parse(text)?;
    Ok(eval_expr(&expr)?.normalized())
}

/// Validate, substitute, and evaluate a formula against its parents' values
///
/// This is the single entry point the graph manager calls: every evaluator
/// failure surfaces as a typed [`FormulaError`], never an unwound panic.
pub fn calculate_formula(
    formula: &str,
    parent_values: &HashMap<NodeId, BigDecimal>,
) -> FormulaResult<BigDecimal> {
    validate(formula)?;
    let substituted = substitute(formula, parent_values);
    evaluate(&substituted)
}

fn eval_expr(expr: &Expr) -> FormulaResult<BigDecimal> {
    match expr {
        Expr::Number(n) => Ok(n.clone()),

        Expr::Reference(id) => Err(FormulaError::UnknownReference(id.clone())),

        Expr::UnaryOp {
            op: UnaryOperator::Negate,
            operand,
        } => Ok(-eval_expr(operand)?),

        Expr::BinaryOp { op, left, right } => {
            let left = eval_expr(left)?;
            let right = eval_expr(right)?;
            apply_binary(*op, left, right)
        }
    }
}

fn apply_binary(
    op: BinaryOperator,
    left: BigDecimal,
    right: BigDecimal,
) -> FormulaResult<BigDecimal> {
    match op {
        BinaryOperator::Add => Ok(left + right),
        BinaryOperator::Subtract => Ok(left - right),
        BinaryOperator::Multiply => Ok(left * right),

        BinaryOperator::Divide => {
            if right.is_zero() {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(left / right)
            }
        }

        BinaryOperator::Modulo => {
            if right.is_zero() {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(left % right)
            }
        }

        BinaryOperator::Power => pow(left, &right),
    }
}

/// Integer exponentiation by squaring
///
/// Exponents must be integers: exactness cannot survive irrational powers,
/// so a fractional exponent is rejected rather than approximated. Negative
/// exponents evaluate as `1 / base^|e|`.
fn pow(base: BigDecimal, exponent: &BigDecimal) -> FormulaResult<BigDecimal> {
    if !exponent.is_integer() {
        return Err(FormulaError::UnsupportedExponent(
            exponent.normalized().to_string(),
        ));
    }
    let e = exponent
        .to_i64()
        .ok_or_else(|| FormulaError::UnsupportedExponent(exponent.normalized().to_string()))?;

    if e < 0 {
        if base.is_zero() {
            return Err(FormulaError::DivisionByZero);
        }
        return Ok(BigDecimal::one() / pow_unsigned(base, e.unsigned_abs()));
    }

    Ok(pow_unsigned(base, e as u64))
}

fn pow_unsigned(base: BigDecimal, mut e: u64) -> BigDecimal {
    let mut acc = BigDecimal::one();
    let mut square = base;

    loop {
        if e & 1 == 1 {
            acc = &acc * &square;
        }
        e >>= 1;
        if e == 0 {
            break;
        }
        square = &square * &square;
    }

    acc
}
