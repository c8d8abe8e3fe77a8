//! The Vasuki value representation: a tagged sum of scalar, string,
//! array, dictionary, and function variants.

mod function;
mod ops;

pub use function::FunctionData;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared, mutable ordered sequence. Cloning an `ArrayRef` aliases the same
/// backing `Vec`; callers that need an independent copy build a fresh one.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable string-keyed mapping. Iteration order is whatever
/// `HashMap` gives; nothing in the language depends on a stable order.
pub type DictRef = Rc<RefCell<HashMap<String, Value>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(ArrayRef),
    Dict(DictRef),
    Function(Rc<FunctionData>),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn dict(entries: HashMap<String, Value>) -> Value {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn is_truthy_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The descriptor string returned by the `type` built-in.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dictionary",
            Value::Function(_) => "function",
        }
    }

    /// The language-level textual rendering used by `PRINT`, `print`, and
    /// `to_string`.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.clone(),
            Value::Array(a) => {
                let items: Vec<String> =
                    a.borrow().iter().map(Value::to_display_string).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Dict(d) => {
                let items: Vec<String> = d
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_display_string()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Value::Function(_) => "<function>".to_string(),
        }
    }
}

/// Fixed-precision-6 formatting with trailing zeros (and a bare trailing
/// dot) trimmed, matching the original interpreter's `ostringstream` +
/// `setprecision(6)` rendering.
pub fn format_float(f: f64) -> String {
    let s = format!("{:.6}", f);
    let trimmed = s.trim_end_matches('0');
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_formatting_trims_trailing_zeros_and_dot() {
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-2.0), "-2");
    }

    #[test]
    fn to_display_string_matches_contract() {
        assert_eq!(Value::Null.to_display_string(), "null");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(
            Value::array(vec![Value::Int(1), Value::Int(2)]).to_display_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn array_aliasing_is_observed_through_clones() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = a.clone();
        if let (Value::Array(ra), Value::Array(rb)) = (&a, &b) {
            ra.borrow_mut().push(Value::Int(2));
            assert_eq!(rb.borrow().len(), 2);
        } else {
            unreachable!();
        }
    }
}
