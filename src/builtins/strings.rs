//! `uppercase`, `lowercase`, `split`.

use super::arity;
use crate::error::{Result, VmError};
use crate::value::Value;

pub fn uppercase(args: &[Value]) -> Result<Value> {
    arity("uppercase", args, 1)?;
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_ascii_uppercase())),
        other => Err(VmError::type_mismatch(format!(
            "uppercase() requires a string, got {}",
            other.type_name()
        ))),
    }
}

pub fn lowercase(args: &[Value]) -> Result<Value> {
    arity("lowercase", args, 1)?;
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.to_ascii_lowercase())),
        other => Err(VmError::type_mismatch(format!(
            "lowercase() requires a string, got {}",
            other.type_name()
        ))),
    }
}

/// Splits by `delimiter` (default `" "`), returning a 1-based array: index
/// 0 is a placeholder `Null`, and the tokens start at index 1. This
/// convention is part of the language surface and is shared with
/// `dict_keys`/`dict_values`.
pub fn split(args: &[Value]) -> Result<Value> {
    if args.is_empty() || args.len() > 2 {
        return Err(VmError::ArityMismatch {
            expected: 1,
            got: args.len(),
        });
    }
    let s = match &args[0] {
        Value::String(s) => s.as_str(),
        other => {
            return Err(VmError::type_mismatch(format!(
                "split() requires a string as its first argument, got {}",
                other.type_name()
            )))
        }
    };
    let delimiter = match args.get(1) {
        None => " ".to_string(),
        Some(Value::String(d)) => d.clone(),
        Some(other) => {
            return Err(VmError::type_mismatch(format!(
                "split() requires a string delimiter, got {}",
                other.type_name()
            )))
        }
    };

    let mut result = vec![Value::Null];
    let mut rest = s;
    if delimiter.is_empty() {
        result.push(Value::String(s.to_string()));
    } else {
        while let Some(pos) = rest.find(&delimiter) {
            result.push(Value::String(rest[..pos].to_string()));
            rest = &rest[pos + delimiter.len()..];
        }
        result.push(Value::String(rest.to_string()));
    }
    Ok(Value::array(result))
}
