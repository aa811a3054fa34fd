//! Textual forms of typed values.
//!
//! Bools and lists travel as strings; this module owns their text so
//! the reader and writer agree on it.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Canonical literal for `true`.
pub const TRUE_LITERAL: &str = "true";
/// Canonical literal for `false`.
pub const FALSE_LITERAL: &str = "false";

/// A value of any kind the protocol can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(String),
    IntList(Vec<i32>),
    FloatList(Vec<f32>),
    #[cfg(feature = "image")]
    Image(image::DynamicImage),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::IntList(_) => ValueKind::IntList,
            Value::FloatList(_) => ValueKind::FloatList,
            #[cfg(feature = "image")]
            Value::Image(_) => ValueKind::Image,
        }
    }
}

/// The kind of a [`Value`]. Not sent on the wire; both ends agree out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    IntList,
    FloatList,
    #[cfg(feature = "image")]
    Image,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::IntList => "int-list",
            ValueKind::FloatList => "float-list",
            #[cfg(feature = "image")]
            ValueKind::Image => "image",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `"true"` or `"false"`.
pub fn bool_text(value: bool) -> &'static str {
    if value {
        TRUE_LITERAL
    } else {
        FALSE_LITERAL
    }
}

/// Parse a bool literal. Accepts `true`/`false` and `1`/`0`.
pub fn parse_bool(text: &[u8]) -> Option<bool> {
    match text {
        b"true" | b"1" => Some(true),
        b"false" | b"0" => Some(false),
        _ => None,
    }
}

/// `[1,2,3]`, no trailing comma; `[]` for an empty list.
pub fn format_int_list(values: &[i32]) -> String {
    join_list(values)
}

/// `[3.14,2.5]`, using the same float text as the float header field.
pub fn format_float_list(values: &[f32]) -> Result<String> {
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(FrameError::Encoding(format!(
            "non-finite float {bad} has no wire form"
        )));
    }
    Ok(join_list(values))
}

fn join_list<T: Display>(values: &[T]) -> String {
    let mut out = String::with_capacity(2 + values.len() * 4);
    out.push('[');
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&value.to_string());
    }
    out.push(']');
    out
}

pub fn parse_int_list(text: &str) -> Result<Vec<i32>> {
    parse_list(text)
}

pub fn parse_float_list(text: &str) -> Result<Vec<f32>> {
    parse_list(text)
}

/// Fields may carry surrounding spaces (`[1, 2, 3]`); empty fields are errors.
fn parse_list<T>(text: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| FrameError::Protocol(format!("list '{text}' is not bracketed")))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .enumerate()
        .map(|(index, field)| {
            let field = field.trim();
            if field.is_empty() {
                return Err(FrameError::Protocol(format!(
                    "empty field at index {index} in list '{text}'"
                )));
            }
            field.parse::<T>().map_err(|err| {
                FrameError::Protocol(format!("malformed list field '{field}': {err}"))
            })
        })
        .collect()
}
