//! `type`, `to_string`, `to_int`, `to_float`.

use super::arity;
use crate::error::{Result, VmError};
use crate::value::Value;

pub fn type_of(args: &[Value]) -> Result<Value> {
    arity("type", args, 1)?;
    Ok(Value::String(args[0].type_name().to_string()))
}

pub fn to_string(args: &[Value]) -> Result<Value> {
    arity("to_string", args, 1)?;
    Ok(Value::String(args[0].to_display_string()))
}

pub fn to_int(args: &[Value]) -> Result<Value> {
    arity("to_int", args, 1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| VmError::type_mismatch(format!("cannot convert {s:?} to integer"))),
        other => Err(VmError::type_mismatch(format!(
            "cannot convert {} to integer",
            other.type_name()
        ))),
    }
}

pub fn to_float(args: &[Value]) -> Result<Value> {
    arity("to_float", args, 1)?;
    match &args[0] {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| VmError::type_mismatch(format!("cannot convert {s:?} to float"))),
        other => Err(VmError::type_mismatch(format!(
            "cannot convert {} to float",
            other.type_name()
        ))),
    }
}
