//! Runtime error types for the Vasuki VM.
//!
//! One variant per error kind the VM can surface (see the design doc for
//! the full taxonomy). `StackUnderflow` exists here for completeness and
//! for the disassembler/tests, but the interpreter never returns it as an
//! `Err` — a stack underflow is recovered in place by substituting `Null`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("division by zero")]
    DivideByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("unbound name: {0}")]
    UnboundName(String),

    #[error("value is not callable: {0}")]
    NotCallable(String),

    #[error("arity mismatch: expected {expected} argument(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("malformed bytecode: {0}")]
    MalformedBytecode(String),

    #[error("invalid opcode: {0}")]
    InvalidOpcode(u8),

    #[error("stack underflow")]
    StackUnderflow,
}

impl VmError {
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self {
        VmError::TypeMismatch(msg.into())
    }

    pub fn unbound_name<S: Into<String>>(name: S) -> Self {
        VmError::UnboundName(name.into())
    }

    pub fn not_callable<S: Into<String>>(what: S) -> Self {
        VmError::NotCallable(what.into())
    }

    pub fn key_not_found<S: Into<String>>(key: S) -> Self {
        VmError::KeyNotFound(key.into())
    }

    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        VmError::MalformedBytecode(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, VmError>;
