use serde::{Deserialize, Serialize};

/// A fully resolved type, as attached to every expression by the type checker.
/// Lowering copies it onto the terms it creates and never inspects it further.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// 1, -20
    Int,
    /// 2.5
    Float,
    /// true, false
    Bool,
    /// "Hello"
    Str,
    /// nil
    Nil,
    /// ["a": 1]
    ///
    /// An empty table literal gets whatever key and value types inference
    /// settled on.
    Table { key: Box<Type>, value: Box<Type> },
}

impl Type {
    pub fn table(key: Type, value: Type) -> Self {
        Self::Table {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table { .. })
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::Str => write!(f, "Str"),
            Type::Nil => write!(f, "Nil"),
            Type::Table { key, value } => write!(f, "[{key}: {value}]"),
        }
    }
}
