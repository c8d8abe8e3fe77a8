//! Name-keyed registry of host primitives invoked by the VM when a `CALL`
//! target is a string rather than a `Function` value.

mod collections;
mod convert;
mod io;
mod strings;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{Result, VmError};
use crate::value::Value;

pub type BuiltinFn = fn(&[Value]) -> Result<Value>;

static BUILTINS: Lazy<HashMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, BuiltinFn> = HashMap::new();
    m.insert("print", io::print);
    m.insert("length", collections::length);
    m.insert("uppercase", strings::uppercase);
    m.insert("lowercase", strings::lowercase);
    m.insert("type", convert::type_of);
    m.insert("to_string", convert::to_string);
    m.insert("to_int", convert::to_int);
    m.insert("to_float", convert::to_float);
    m.insert("split", strings::split);
    m.insert("dict_keys", collections::dict_keys);
    m.insert("dict_values", collections::dict_values);
    m.insert("dict_clear", collections::dict_clear);
    m.insert("dict_size", collections::dict_size);
    m
});

/// Invokes the built-in named `name` with `args`, by value (Vasuki
/// built-ins never see the operand stack directly).
pub fn call(name: &str, args: &[Value]) -> Result<Value> {
    match BUILTINS.get(name) {
        Some(f) => f(args),
        None => Err(VmError::not_callable(format!("builtin '{name}'"))),
    }
}

fn require_arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(VmError::ArityMismatch {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

pub(super) use require_arity as arity;
