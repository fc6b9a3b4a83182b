use std::hash::{Hash, Hasher};

use itertools::Itertools;

/// A value known at compile time.
///
/// Equality and hashing are structural. Floats compare by their bit pattern so
/// that constants can key the constant to terms map.
#[derive(Debug, Clone)]
pub enum IrConst {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// The string's contents, without quotes
    Str(String),
    Nil,
    EmptyTable,
    /// Entries in insertion order
    Table(Vec<(IrConst, IrConst)>),
}

impl IrConst {
    pub fn is_table(&self) -> bool {
        matches!(self, Self::EmptyTable | Self::Table(_))
    }

    /// The entries of a table constant, empty for `[:]`.
    pub fn entries(&self) -> Option<&[(IrConst, IrConst)]> {
        match self {
            Self::EmptyTable => Some(&[]),
            Self::Table(entries) => Some(entries),
            _ => None,
        }
    }

    /// Builds a table constant, collapsing to `[:]` when there are no entries.
    pub fn table(entries: Vec<(IrConst, IrConst)>) -> Self {
        if entries.is_empty() {
            Self::EmptyTable
        } else {
            Self::Table(entries)
        }
    }

    /// The text `show` produces for this value at runtime. Strings come out
    /// bare at the top level but quoted when nested inside a table. Floats
    /// keep all of their significant digits, see [`show_float`].
    pub fn show(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            other => other.show_nested(),
        }
    }

    fn show_nested(&self) -> String {
        match self {
            Self::Float(value) => show_float(*value),
            Self::Table(entries) => format!(
                "[{}]",
                entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.show_nested(), value.show_nested()))
                    .join(", ")
            ),
            other => other.to_string(),
        }
    }
}

impl PartialEq for IrConst {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Nil, Self::Nil) | (Self::EmptyTable, Self::EmptyTable) => true,
            (Self::Table(a), Self::Table(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for IrConst {}

impl Hash for IrConst {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);

        match self {
            Self::Int(value) => value.hash(state),
            Self::Float(value) => value.to_bits().hash(state),
            Self::Bool(value) => value.hash(state),
            Self::Str(value) => value.hash(state),
            Self::Nil | Self::EmptyTable => {}
            Self::Table(entries) => entries.hash(state),
        }
    }
}

impl core::fmt::Display for IrConst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&format_float(*value)),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "\"{value}\""),
            Self::Nil => f.write_str("nil"),
            Self::EmptyTable => f.write_str("[:]"),
            Self::Table(entries) => write!(
                f,
                "[{}]",
                entries
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .join(", ")
            ),
        }
    }
}

const FLOAT_PRECISION: i32 = 14;

/// Formats like C's `%.14g`: fourteen significant digits, trailing zeros
/// dropped, scientific notation for very large or very small magnitudes. Used
/// for IR dumps.
pub fn format_float(value: f64) -> String {
    match significant_digits(value) {
        Some(Notation::Scientific { mantissa, exponent }) => {
            format!("{}{}", trim_fraction(&mantissa), exponent_suffix(exponent))
        }
        Some(Notation::Positional(digits)) => trim_fraction(&digits).to_owned(),
        None => value.to_string(),
    }
}

/// The runtime's `show` of a float: `%.14g` with every trailing zero kept, so
/// `0.25` shows as `0.25000000000000`.
pub fn show_float(value: f64) -> String {
    match significant_digits(value) {
        Some(Notation::Scientific { mantissa, exponent }) => {
            format!("{mantissa}{}", exponent_suffix(exponent))
        }
        Some(Notation::Positional(digits)) => digits,
        None if value.is_nan() => "NaN".to_owned(),
        None if value > 0.0 => "Infinity".to_owned(),
        None => "-Infinity".to_owned(),
    }
}

enum Notation {
    Scientific { mantissa: String, exponent: i32 },
    Positional(String),
}

/// Rounds `value` to [`FLOAT_PRECISION`] significant digits. `None` for NaN
/// and the infinities.
fn significant_digits(value: f64) -> Option<Notation> {
    if !value.is_finite() {
        return None;
    }

    let scientific = format!("{:.*e}", (FLOAT_PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;

    // The exponent after rounding decides the notation
    if exponent < -4 || exponent >= FLOAT_PRECISION {
        Some(Notation::Scientific {
            mantissa: mantissa.to_owned(),
            exponent,
        })
    } else {
        let decimals = (FLOAT_PRECISION - 1 - exponent) as usize;

        Some(Notation::Positional(format!("{value:.decimals$}")))
    }
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };

    format!("e{sign}{:02}", exponent.unsigned_abs())
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
