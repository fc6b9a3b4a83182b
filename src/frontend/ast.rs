//! The typed AST handed over by the type checker. Every expression node
//! already carries its resolved [`Type`]; nothing in this crate re-derives or
//! validates types.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::{intern::InternedSymbol, ty::Type};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Top level items in declaration order
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    FunctionDefinition(FunctionDefinition),
    /// Left behind by the parser where an item was expected but none was
    /// found. A module containing one never passes type checking.
    Empty,
}

/// Functions take no parameters yet; the only one in practice is `main`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: InternedSymbol,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Print(Expression),
    Return(Expression),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionKind {
    Literal(Literal),
    Parenthesized(Box<Expression>),
    /// `show e`, the textual form of any value
    Show(Box<Expression>),
    Unary {
        operator: UnaryOperatorKind,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperatorKind,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Interpolation(Interpolation),
    /// Placeholder for an expression that failed to parse
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Nil,
    /// `["a": 1, "b": 2]`, keys and values kept as parallel lists
    Table {
        keys: Vec<Expression>,
        values: Vec<Expression>,
    },
}

/// One link of a string interpolation.
///
/// `"Hello, #{name}! You are #{age}."` becomes
/// `Some("Hello, ", name) -> Some("! You are ", age) -> End(".")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Some {
        string: String,
        expression: Box<Expression>,
        next: Box<Interpolation>,
    },
    End {
        string: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperatorKind {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "==")]
    Equals,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanOrEqualTo,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanOrEqualTo,
    #[strum(serialize = "bitand")]
    BitwiseAnd,
    #[strum(serialize = "bitor")]
    BitwiseOr,
    #[strum(serialize = "xor")]
    BitwiseXor,
    #[strum(serialize = "<<")]
    ShiftLeft,
    #[strum(serialize = ">>")]
    ShiftRight,
    /// String concatenation, resolved from `+` on two strings
    #[strum(serialize = "concat")]
    Concat,
}

impl BinaryOperatorKind {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::NotEquals
                | Self::LessThan
                | Self::LessThanOrEqualTo
                | Self::GreaterThan
                | Self::GreaterThanOrEqualTo
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperatorKind {
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "not")]
    LogicalNot,
}

// Shorthands for building already-typed trees by hand. The types they fill in
// are the ones the checker would have inferred.
impl Expression {
    pub fn new(kind: ExpressionKind, ty: Type) -> Self {
        Self { kind, ty }
    }

    pub fn int(value: i64) -> Self {
        Self::new(ExpressionKind::Literal(Literal::Integer(value)), Type::Int)
    }

    pub fn float(value: f64) -> Self {
        Self::new(ExpressionKind::Literal(Literal::Float(value)), Type::Float)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExpressionKind::Literal(Literal::Boolean(value)), Type::Bool)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(
            ExpressionKind::Literal(Literal::String(value.into())),
            Type::Str,
        )
    }

    pub fn nil() -> Self {
        Self::new(ExpressionKind::Literal(Literal::Nil), Type::Nil)
    }

    /// A table literal. Its type is taken from the first entry, or given
    /// explicitly for empty tables through [`Expression::empty_table`].
    pub fn table(entries: Vec<(Expression, Expression)>) -> Self {
        let ty = entries
            .first()
            .map(|(key, value)| Type::table(key.ty.clone(), value.ty.clone()))
            .unwrap_or_else(|| Type::table(Type::Nil, Type::Nil));

        let (keys, values) = entries.into_iter().unzip();

        Self::new(ExpressionKind::Literal(Literal::Table { keys, values }), ty)
    }

    pub fn empty_table(key: Type, value: Type) -> Self {
        Self::new(
            ExpressionKind::Literal(Literal::Table {
                keys: Vec::new(),
                values: Vec::new(),
            }),
            Type::table(key, value),
        )
    }

    pub fn parenthesized(inner: Expression) -> Self {
        let ty = inner.ty.clone();
        Self::new(ExpressionKind::Parenthesized(Box::new(inner)), ty)
    }

    pub fn show(inner: Expression) -> Self {
        Self::new(ExpressionKind::Show(Box::new(inner)), Type::Str)
    }

    pub fn unary(operator: UnaryOperatorKind, operand: Expression) -> Self {
        let ty = match operator {
            UnaryOperatorKind::Negate => operand.ty.clone(),
            UnaryOperatorKind::LogicalNot => Type::Bool,
        };

        Self::new(
            ExpressionKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    pub fn binary(operator: BinaryOperatorKind, lhs: Expression, rhs: Expression) -> Self {
        let ty = if operator.is_comparison() {
            Type::Bool
        } else if operator == BinaryOperatorKind::Concat {
            Type::Str
        } else {
            lhs.ty.clone()
        };

        Self::new(
            ExpressionKind::Binary {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        )
    }

    /// Builds `"<parts[0].0>#{parts[0].1}<parts[1].0>#{parts[1].1}...<end>"`.
    pub fn interpolation(parts: Vec<(String, Expression)>, end: impl Into<String>) -> Self {
        let chain = parts.into_iter().rev().fold(
            Interpolation::End { string: end.into() },
            |next, (string, expression)| Interpolation::Some {
                string,
                expression: Box::new(expression),
                next: Box::new(next),
            },
        );

        Self::new(ExpressionKind::Interpolation(chain), Type::Str)
    }

    pub fn empty(ty: Type) -> Self {
        Self::new(ExpressionKind::Empty, ty)
    }
}

impl FunctionDefinition {
    pub fn new(name: &str, body: Vec<Statement>) -> Self {
        Self {
            name: InternedSymbol::new(name),
            body,
        }
    }
}
