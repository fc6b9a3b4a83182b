//! Evaluates instructions whose operands are all known constants.

use std::cmp::Ordering;

use crate::{
    frontend::ast::BinaryOperatorKind,
    internal_error,
    middle::ir::{
        constant::IrConst,
        data::FunData,
        op::{Op, Tac, UnaryOperator},
        term::Term,
    },
};

use super::{
    OptId, Pass,
    canvas::{Canvas, Transform},
};

pub struct ConstFold;

impl Pass for ConstFold {
    fn id(&self) -> OptId {
        OptId::ConstFold
    }

    fn apply(&self, canvas: Canvas) -> Canvas {
        canvas.each_op(|_, data, op| match op {
            Op::Tac(tac) => match fold(tac, data) {
                Some(value) => Transform::replace(
                    op,
                    Op::Const {
                        to: tac.term().clone(),
                        value,
                    },
                ),
                None => Transform::Retain,
            },
            _ => Transform::Retain,
        })
    }
}

/// The value `tac` computes, if every operand is settled and the operation
/// can be carried out at compile time.
fn fold(tac: &Tac<Term>, data: &FunData<Term>) -> Option<IrConst> {
    match tac {
        Tac::Unary {
            operator, operand, ..
        } => fold_unary(*operator, data.settled_const(operand)?),
        Tac::Binary {
            operator, lhs, rhs, ..
        } => fold_binary(
            *operator,
            data.settled_const(lhs)?,
            data.settled_const(rhs)?,
        ),
        Tac::TableSet { .. } => None,
    }
}

pub fn fold_unary(operator: UnaryOperator, operand: &IrConst) -> Option<IrConst> {
    let value = match (operator, operand) {
        (UnaryOperator::Negate, IrConst::Int(value)) => IrConst::Int(value.wrapping_neg()),
        (UnaryOperator::Negate, IrConst::Float(value)) => IrConst::Float(-value),
        (UnaryOperator::LogicalNot, IrConst::Bool(value)) => IrConst::Bool(!value),
        (UnaryOperator::Show, value) => IrConst::Str(value.show()),
        (operator, operand) => {
            internal_error!("cannot apply `{operator}` to the constant {operand}")
        }
    };

    Some(value)
}

/// Folds a binary operation over two constants. Integer arithmetic wraps
/// around like it does at runtime. Operations that would trap or whose result
/// is unordered are left for runtime.
pub fn fold_binary(operator: BinaryOperatorKind, lhs: &IrConst, rhs: &IrConst) -> Option<IrConst> {
    use BinaryOperatorKind as B;

    let value = match (operator, lhs, rhs) {
        (B::Equals, lhs, rhs) => IrConst::Bool(constants_equal(lhs, rhs)),
        (B::NotEquals, lhs, rhs) => IrConst::Bool(!constants_equal(lhs, rhs)),
        (
            B::LessThan | B::LessThanOrEqualTo | B::GreaterThan | B::GreaterThanOrEqualTo,
            lhs,
            rhs,
        ) => {
            let ordering = compare(lhs, rhs)?;

            IrConst::Bool(match operator {
                B::LessThan => ordering.is_lt(),
                B::LessThanOrEqualTo => ordering.is_le(),
                B::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
        (B::Concat, IrConst::Str(lhs), IrConst::Str(rhs)) => IrConst::Str(format!("{lhs}{rhs}")),
        (_, IrConst::Int(lhs), IrConst::Int(rhs)) => IrConst::Int(fold_int(operator, *lhs, *rhs)?),
        (_, IrConst::Float(lhs), IrConst::Float(rhs)) => {
            IrConst::Float(fold_float(operator, *lhs, *rhs))
        }
        _ => internal_error!("cannot fold {lhs} {operator} {rhs}"),
    };

    Some(value)
}

fn fold_int(operator: BinaryOperatorKind, lhs: i64, rhs: i64) -> Option<i64> {
    use BinaryOperatorKind as B;

    let value = match operator {
        B::Add => lhs.wrapping_add(rhs),
        B::Subtract => lhs.wrapping_sub(rhs),
        B::Multiply => lhs.wrapping_mul(rhs),
        B::Divide if rhs == 0 => return None,
        B::Divide => lhs.wrapping_div(rhs),
        B::BitwiseAnd => lhs & rhs,
        B::BitwiseOr => lhs | rhs,
        B::BitwiseXor => lhs ^ rhs,
        // Only the low six bits of the amount count, as on the target
        B::ShiftLeft => lhs.wrapping_shl(rhs as u32),
        B::ShiftRight => lhs.wrapping_shr(rhs as u32),
        _ => internal_error!("`{operator}` is not an integer operation"),
    };

    Some(value)
}

fn fold_float(operator: BinaryOperatorKind, lhs: f64, rhs: f64) -> f64 {
    match operator {
        BinaryOperatorKind::Add => lhs + rhs,
        BinaryOperatorKind::Subtract => lhs - rhs,
        BinaryOperatorKind::Multiply => lhs * rhs,
        BinaryOperatorKind::Divide => lhs / rhs,
        _ => internal_error!("`{operator}` is not a float operation"),
    }
}

fn compare(lhs: &IrConst, rhs: &IrConst) -> Option<Ordering> {
    match (lhs, rhs) {
        (IrConst::Int(lhs), IrConst::Int(rhs)) => Some(lhs.cmp(rhs)),
        (IrConst::Float(lhs), IrConst::Float(rhs)) => lhs.partial_cmp(rhs),
        _ => internal_error!("cannot order {lhs} and {rhs}"),
    }
}

/// Runtime equality: numeric for floats, entry by entry for tables.
fn constants_equal(lhs: &IrConst, rhs: &IrConst) -> bool {
    match (lhs, rhs) {
        (IrConst::Float(lhs), IrConst::Float(rhs)) => lhs == rhs,
        (IrConst::Int(lhs), IrConst::Int(rhs)) => lhs == rhs,
        (IrConst::Bool(lhs), IrConst::Bool(rhs)) => lhs == rhs,
        (IrConst::Str(lhs), IrConst::Str(rhs)) => lhs == rhs,
        (IrConst::Nil, IrConst::Nil) => true,
        (lhs, rhs) if lhs.is_table() && rhs.is_table() => {
            match (lhs.entries(), rhs.entries()) {
                (Some(left), Some(right)) => {
                    left.len() == right.len()
                        && left.iter().zip(right).all(|((lk, lv), (rk, rv))| {
                            constants_equal(lk, rk) && constants_equal(lv, rv)
                        })
                }
                _ => false,
            }
        }
        _ => internal_error!("cannot compare {lhs} with {rhs}"),
    }
}
