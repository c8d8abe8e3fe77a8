//! Arithmetic, comparison, and equality operators over `Value`.
//!
//! Numeric promotion: if either operand is `Float`, both are coerced to
//! `Float`; otherwise `Int`-`Int` yields `Int`. `+` additionally overloads
//! onto strings (coerce-and-concatenate) and arrays (concatenate into a
//! fresh array); `*` overloads onto `String * Int` (repeat).

use super::Value;
use crate::error::{Result, VmError};

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

impl Value {
    pub fn add(&self, other: &Value) -> Result<Value> {
        if matches!(self, Value::String(_)) || matches!(other, Value::String(_)) {
            return Ok(Value::String(format!(
                "{}{}",
                self.to_display_string(),
                other.to_display_string()
            )));
        }
        if let (Value::Array(a), Value::Array(b)) = (self, other) {
            let mut merged = a.borrow().clone();
            merged.extend(b.borrow().iter().cloned());
            return Ok(Value::array(merged));
        }
        numeric_binop(self, other, "+", |a, b| a + b, |a, b| a + b)
    }

    pub fn sub(&self, other: &Value) -> Result<Value> {
        numeric_binop(self, other, "-", |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(&self, other: &Value) -> Result<Value> {
        // Order-sensitive: only `String * Int` repeats. `Int * String` has
        // no operator overload in the source language and falls through to
        // the numeric case below, which rejects it as a type mismatch.
        if let (Value::String(s), Value::Int(n)) = (self, other) {
            return Ok(Value::String(repeat_string(s, *n)));
        }
        numeric_binop(self, other, "*", |a, b| a * b, |a, b| a * b)
    }

    pub fn div(&self, other: &Value) -> Result<Value> {
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            if *b == 0 {
                return Err(VmError::DivideByZero);
            }
            return Ok(Value::Int(a / b));
        }
        match (as_f64(self), as_f64(other)) {
            (Some(a), Some(b)) => {
                if b == 0.0 {
                    Err(VmError::DivideByZero)
                } else {
                    Ok(Value::Float(a / b))
                }
            }
            _ => Err(VmError::type_mismatch(format!(
                "cannot divide {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn rem(&self, other: &Value) -> Result<Value> {
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            if *b == 0 {
                return Err(VmError::ModuloByZero);
            }
            return Ok(Value::Int(a % b));
        }
        match (as_f64(self), as_f64(other)) {
            (Some(a), Some(b)) => {
                if b == 0.0 {
                    Err(VmError::ModuloByZero)
                } else {
                    Ok(Value::Float(a % b))
                }
            }
            _ => Err(VmError::type_mismatch(format!(
                "cannot modulo {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn neg(&self) -> Result<Value> {
        match self {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(VmError::type_mismatch(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }

    pub fn pow(&self, other: &Value) -> Result<Value> {
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            return Ok(Value::Int((*a as f64).powf(*b as f64) as i64));
        }
        match (as_f64(self), as_f64(other)) {
            (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
            _ => Err(VmError::type_mismatch(format!(
                "cannot raise {} to the power of {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn values_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    pub fn less_than(&self, other: &Value) -> Result<bool> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a < b),
            (Value::String(a), Value::String(b)) => Ok(a < b),
            _ => match (as_f64(self), as_f64(other)) {
                (Some(a), Some(b)) => Ok(a < b),
                _ => Err(VmError::type_mismatch(format!(
                    "cannot compare {} and {}",
                    self.type_name(),
                    other.type_name()
                ))),
            },
        }
    }

    pub fn less_equal(&self, other: &Value) -> Result<bool> {
        Ok(self.less_than(other)? || self.values_equal(other))
    }

    pub fn greater_than(&self, other: &Value) -> Result<bool> {
        Ok(!self.less_equal(other)?)
    }

    pub fn greater_equal(&self, other: &Value) -> Result<bool> {
        Ok(!self.less_than(other)?)
    }
}

fn numeric_binop(
    a: &Value,
    b: &Value,
    op: &str,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y))),
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => Ok(Value::Float(float_op(x, y))),
            _ => Err(VmError::type_mismatch(format!(
                "cannot apply {} to {} and {}",
                op,
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

fn repeat_string(s: &str, count: i64) -> String {
    if count <= 0 {
        String::new()
    } else {
        s.repeat(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_div_and_mod_satisfy_the_division_identity() {
        for (a, b) in [(17, 5), (-17, 5), (17, -5), (-17, -5)] {
            let q = Value::Int(a).div(&Value::Int(b)).unwrap();
            let r = Value::Int(a).rem(&Value::Int(b)).unwrap();
            if let (Value::Int(q), Value::Int(r)) = (q, r) {
                assert_eq!(q * b + r, a);
            }
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(matches!(
            Value::Int(1).div(&Value::Int(0)),
            Err(VmError::DivideByZero)
        ));
        assert!(matches!(
            Value::Float(1.0).rem(&Value::Float(0.0)),
            Err(VmError::ModuloByZero)
        ));
    }

    #[test]
    fn string_plus_anything_concatenates() {
        let v = Value::String("x=".into()).add(&Value::Int(5)).unwrap();
        assert!(matches!(v, Value::String(s) if s == "x=5"));
    }

    #[test]
    fn string_times_negative_int_is_empty() {
        let v = Value::String("ab".into()).mul(&Value::Int(-3)).unwrap();
        assert!(matches!(v, Value::String(s) if s.is_empty()));
    }

    #[test]
    fn int_times_string_is_a_type_mismatch_not_a_repeat() {
        // Multiplication is order-sensitive: only `String * Int` repeats.
        assert!(matches!(
            Value::Int(3).mul(&Value::String("ab".into())),
            Err(VmError::TypeMismatch(_))
        ));
    }

    #[test]
    fn array_plus_array_concatenates_into_a_fresh_array() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = Value::array(vec![Value::Int(2)]);
        let c = a.add(&b).unwrap();
        if let Value::Array(r) = c {
            assert_eq!(r.borrow().len(), 2);
        } else {
            unreachable!();
        }
        // operands unchanged
        if let Value::Array(r) = &a {
            assert_eq!(r.borrow().len(), 1);
        }
    }

    #[test]
    fn pow_promotes_to_float_when_either_operand_is_float() {
        assert!(matches!(Value::Int(2).pow(&Value::Int(10)).unwrap(), Value::Int(1024)));
        let v = Value::Int(2).pow(&Value::Float(0.5)).unwrap();
        assert!(matches!(v, Value::Float(f) if (f - std::f64::consts::SQRT_2).abs() < 1e-9));
    }

    #[test]
    fn ordering_is_derived_from_less_than() {
        assert!(Value::Int(1).less_than(&Value::Int(2)).unwrap());
        assert!(!Value::Int(2).less_than(&Value::Int(2)).unwrap());
        assert!(Value::Int(2).less_equal(&Value::Int(2)).unwrap());
        assert!(Value::Int(3).greater_than(&Value::Int(2)).unwrap());
        assert!(Value::Int(2).greater_equal(&Value::Int(2)).unwrap());
    }

    #[test]
    fn int_float_mixing_is_allowed_in_equality_and_ordering() {
        assert!(Value::Int(2).values_equal(&Value::Float(2.0)));
        assert!(Value::Int(1).less_than(&Value::Float(1.5)).unwrap());
    }

    #[test]
    fn cross_variant_equality_is_false() {
        assert!(!Value::Int(1).values_equal(&Value::String("1".into())));
        assert!(!Value::Null.values_equal(&Value::Bool(false)));
    }

    #[test]
    fn ordering_across_incomparable_types_is_a_type_mismatch() {
        assert!(matches!(
            Value::Bool(true).less_than(&Value::Int(1)),
            Err(VmError::TypeMismatch(_))
        ));
    }
}
