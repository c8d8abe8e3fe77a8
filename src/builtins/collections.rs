//! `length`, `dict_keys`, `dict_values`, `dict_clear`, `dict_size`.

use super::arity;
use crate::error::{Result, VmError};
use crate::value::Value;

/// String: char count. Array: element count *minus one* — every Vasuki
/// array reserves index 0 (the `split`/`dict_keys`/`dict_values`
/// convention), so `length` reports the count of real, 1-indexed
/// elements. Dict: entry count.
pub fn length(args: &[Value]) -> Result<Value> {
    arity("length", args, 1)?;
    match &args[0] {
        Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Array(a) => Ok(Value::Int(a.borrow().len().saturating_sub(1) as i64)),
        Value::Dict(d) => Ok(Value::Int(d.borrow().len() as i64)),
        other => Err(VmError::type_mismatch(format!(
            "length() requires a string, array, or dictionary, got {}",
            other.type_name()
        ))),
    }
}

fn require_dict<'a>(name: &str, args: &'a [Value]) -> Result<&'a crate::value::DictRef> {
    arity(name, args, 1)?;
    match &args[0] {
        Value::Dict(d) => Ok(d),
        other => Err(VmError::type_mismatch(format!(
            "{name}() requires a dictionary, got {}",
            other.type_name()
        ))),
    }
}

pub fn dict_keys(args: &[Value]) -> Result<Value> {
    let d = require_dict("dict_keys", args)?;
    let mut result = vec![Value::Null];
    result.extend(d.borrow().keys().cloned().map(Value::String));
    Ok(Value::array(result))
}

pub fn dict_values(args: &[Value]) -> Result<Value> {
    let d = require_dict("dict_values", args)?;
    let mut result = vec![Value::Null];
    result.extend(d.borrow().values().cloned());
    Ok(Value::array(result))
}

pub fn dict_clear(args: &[Value]) -> Result<Value> {
    let d = require_dict("dict_clear", args)?;
    d.borrow_mut().clear();
    Ok(Value::Null)
}

pub fn dict_size(args: &[Value]) -> Result<Value> {
    let d = require_dict("dict_size", args)?;
    Ok(Value::Int(d.borrow().len() as i64))
}
