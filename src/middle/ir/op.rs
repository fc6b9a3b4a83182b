use strum::Display;

use crate::frontend::ast::{BinaryOperatorKind, UnaryOperatorKind};

use super::{
    constant::IrConst,
    term::{TermId, TermLike},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op<T> {
    Ret(T),
    Print(T),
    Const { to: T, value: IrConst },
    Tac(Tac<T>),
    /// Stands in for a removed instruction until the end of a pass, so that
    /// positions stay stable. Never survives [`Canvas::finish`].
    ///
    /// [`Canvas::finish`]: crate::middle::optimization::canvas::Canvas::finish
    Dummy(T),
}

/// Three address instructions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tac<T> {
    Unary {
        operator: UnaryOperator,
        to: T,
        operand: T,
    },
    Binary {
        operator: BinaryOperatorKind,
        to: T,
        lhs: T,
        rhs: T,
    },
    /// `table[key] = value`. Writes into an existing table instead of
    /// defining a new term.
    TableSet { table: T, key: T, value: T },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOperator {
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "not")]
    LogicalNot,
    /// Converts any value to its textual form
    #[strum(serialize = "show")]
    Show,
}

impl From<UnaryOperatorKind> for UnaryOperator {
    fn from(value: UnaryOperatorKind) -> Self {
        match value {
            UnaryOperatorKind::Negate => Self::Negate,
            UnaryOperatorKind::LogicalNot => Self::LogicalNot,
        }
    }
}

impl<T: TermLike> Tac<T> {
    pub fn term(&self) -> &T {
        match self {
            Tac::Unary { to, .. } | Tac::Binary { to, .. } => to,
            Tac::TableSet { table, .. } => table,
        }
    }

    pub fn terms(&self) -> Vec<&T> {
        match self {
            Tac::Unary { to, operand, .. } => vec![to, operand],
            Tac::Binary { to, lhs, rhs, .. } => vec![to, lhs, rhs],
            Tac::TableSet { table, key, value } => vec![table, key, value],
        }
    }

    pub fn is_definition(&self) -> bool {
        !matches!(self, Tac::TableSet { .. })
    }

    pub fn map_terms<U>(&self, mut f: impl FnMut(&T) -> U) -> Tac<U> {
        match self {
            Tac::Unary {
                operator,
                to,
                operand,
            } => Tac::Unary {
                operator: *operator,
                to: f(to),
                operand: f(operand),
            },
            Tac::Binary {
                operator,
                to,
                lhs,
                rhs,
            } => Tac::Binary {
                operator: *operator,
                to: f(to),
                lhs: f(lhs),
                rhs: f(rhs),
            },
            Tac::TableSet { table, key, value } => Tac::TableSet {
                table: f(table),
                key: f(key),
                value: f(value),
            },
        }
    }
}

impl<T: TermLike> Op<T> {
    /// The term being defined, or the sole (first) operand of instructions
    /// that define nothing.
    pub fn term(&self) -> &T {
        match self {
            Op::Ret(term) | Op::Print(term) | Op::Dummy(term) => term,
            Op::Const { to, .. } => to,
            Op::Tac(tac) => tac.term(),
        }
    }

    /// Every term mentioned, principal term first. Empty for dummies.
    pub fn terms(&self) -> Vec<&T> {
        match self {
            Op::Ret(term) | Op::Print(term) => vec![term],
            Op::Const { to, .. } => vec![to],
            Op::Tac(tac) => tac.terms(),
            Op::Dummy(_) => Vec::new(),
        }
    }

    /// The terms this instruction reads: everything but the defined term.
    pub fn used_terms(&self) -> Vec<&T> {
        let mut terms = self.terms();

        if self.is_definition() && !terms.is_empty() {
            terms.remove(0);
        }

        terms
    }

    pub fn is_definition(&self) -> bool {
        match self {
            Op::Ret(_) | Op::Print(_) | Op::Dummy(_) => false,
            Op::Const { .. } => true,
            Op::Tac(tac) => tac.is_definition(),
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self, Op::Dummy(_))
    }

    pub fn as_const(&self) -> Option<&IrConst> {
        match self {
            Op::Const { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Whether this is a `TableSet` writing into `table`.
    pub fn mutates(&self, table: TermId) -> bool {
        matches!(self, Op::Tac(Tac::TableSet { table: target, .. }) if target.id() == table)
    }

    pub fn map_terms<U>(&self, mut f: impl FnMut(&T) -> U) -> Op<U> {
        match self {
            Op::Ret(term) => Op::Ret(f(term)),
            Op::Print(term) => Op::Print(f(term)),
            Op::Const { to, value } => Op::Const {
                to: f(to),
                value: value.clone(),
            },
            Op::Tac(tac) => Op::Tac(tac.map_terms(f)),
            Op::Dummy(term) => Op::Dummy(f(term)),
        }
    }
}
