//! The interpreter core: operand stack, call stack, instruction pointer,
//! and the fetch/decode/dispatch loop.

mod frame;

pub use frame::CallFrame;

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::bytecode::BytecodeImage;
use crate::builtins;
use crate::environment::Environment;
use crate::error::{Result, VmError};
use crate::opcode::Opcode;
use crate::value::{FunctionData, Value};

/// What a single dispatched instruction asks the run loop to do next.
enum Step {
    Continue,
    Exit(Value),
}

#[derive(Debug)]
pub struct Vm {
    code: Vec<u8>,
    constants: Vec<crate::bytecode::Constant>,
    names: Vec<String>,
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: Environment,
    ip: usize,
    /// High-water mark of `frames.len()`, tracked only at frame *creation*
    /// (`CALL`'s `frames.push`) and never touched by `TAIL_CALL`'s in-place
    /// rewrite. A self-recursive function that tail-calls itself N times
    /// leaves this at 1 regardless of N; if `TAIL_CALL` regressed to a
    /// plain `CALL`, this would climb to N instead.
    max_frame_depth: usize,
}

impl Vm {
    pub fn new(image: BytecodeImage) -> Self {
        Vm {
            code: image.code,
            constants: image.constants,
            names: image.names,
            stack: Vec::new(),
            frames: Vec::new(),
            globals: Environment::root(),
            ip: 0,
            max_frame_depth: 0,
        }
    }

    /// The largest the call stack has grown to since construction. Exists
    /// for tests that need to verify `TAIL_CALL` rewrites frames in place
    /// rather than pushing new ones; production code has no use for it.
    pub fn max_frame_depth(&self) -> usize {
        self.max_frame_depth
    }

    /// Runs from the current instruction pointer until `HALT`, a
    /// top-level `RETURN`, or the code stream is exhausted, and returns
    /// the program's final value.
    pub fn run(&mut self) -> Result<Value> {
        loop {
            if self.ip >= self.code.len() {
                return Ok(self.pop());
            }
            let opcode_byte = self.code[self.ip];
            self.ip += 1;
            let opcode = Opcode::try_from(opcode_byte)?;

            match self.dispatch(opcode)? {
                Step::Continue => continue,
                Step::Exit(value) => return Ok(value),
            }
        }
    }

    fn dispatch(&mut self, opcode: Opcode) -> Result<Step> {
        use Opcode::*;
        match opcode {
            Halt => return Ok(Step::Exit(self.pop())),
            Nop => {}

            PushInt => {
                let i = self.read_i32()?;
                self.push(Value::Int(i as i64));
            }
            PushFloat => {
                let idx = self.read_u8()?;
                let c = self.constant(idx as usize)?;
                match c {
                    crate::bytecode::Constant::Float(f) => self.push(Value::Float(*f)),
                    other => {
                        return Err(VmError::type_mismatch(format!(
                            "PUSH_FLOAT constant index {idx} is not a float: {other:?}"
                        )))
                    }
                }
            }
            PushString => {
                let idx = self.read_u16()?;
                let s = self.name(idx)?;
                self.push(Value::String(s));
            }
            PushBool => {
                let b = self.read_u8()?;
                self.push(Value::Bool(b != 0));
            }
            PushNull => self.push(Value::Null),
            PushTrue => self.push(Value::Bool(true)),
            PushFalse => self.push(Value::Bool(false)),
            PushConstant => {
                let idx = self.read_u8()?;
                let v = self.constant(idx as usize)?.to_value();
                self.push(v);
            }

            Pop => {
                self.pop();
            }
            PopN => {
                let n = self.read_u8()?;
                for _ in 0..n {
                    self.pop();
                }
            }
            Dup => {
                let top = self.peek()?;
                self.push(top);
            }

            Add => self.binop(|a, b| a.add(b))?,
            Sub => self.binop(|a, b| a.sub(b))?,
            Mul => self.binop(|a, b| a.mul(b))?,
            Div => self.binop(|a, b| a.div(b))?,
            Mod => self.binop(|a, b| a.rem(b))?,
            Pow => self.binop(|a, b| a.pow(b))?,
            Neg => {
                let v = self.pop();
                self.push(v.neg()?);
            }

            Eq => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(a.values_equal(&b)));
            }
            Neq => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(!a.values_equal(&b)));
            }
            Lt => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(a.less_than(&b)?));
            }
            Lte => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(a.less_equal(&b)?));
            }
            Gt => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(a.greater_than(&b)?));
            }
            Gte => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(a.greater_equal(&b)?));
            }

            And => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(as_bool(&a)? && as_bool(&b)?));
            }
            Or => {
                let (a, b) = self.pop2();
                self.push(Value::Bool(as_bool(&a)? || as_bool(&b)?));
            }
            Not => {
                let v = self.pop();
                self.push(Value::Bool(!as_bool(&v)?));
            }

            GetGlobal => {
                let idx = self.read_u16()?;
                let name = self.name(idx)?;
                let v = self.globals.lookup(&name)?;
                self.push(v);
            }
            SetGlobal => {
                let idx = self.read_u16()?;
                let name = self.name(idx)?;
                let v = self.pop();
                self.globals.assign(&name, v.clone())?;
                self.push(v);
            }
            DefineGlobal => {
                let idx = self.read_u16()?;
                let name = self.name(idx)?;
                let v = self.pop();
                self.globals.declare(&name, v);
            }

            GetLocal => {
                let idx = self.read_u16()?;
                let name = self.name(idx)?;
                let env = self.local_env(&name)?;
                let v = env.lookup(&name)?;
                self.push(v);
            }
            SetLocal => {
                let idx = self.read_u16()?;
                let name = self.name(idx)?;
                let env = self.local_env(&name)?;
                let v = self.pop();
                env.assign(&name, v.clone())?;
                self.push(v);
            }
            DefineLocal => {
                let idx = self.read_u16()?;
                let name = self.name(idx)?;
                let env = self.local_env(&name)?;
                let v = self.pop();
                env.declare(&name, v);
            }

            Jump => {
                let offset = self.read_i32()?;
                self.jump(offset);
            }
            JumpIfFalse => {
                let offset = self.read_i32()?;
                let cond = as_bool(&self.pop())?;
                if !cond {
                    self.jump(offset);
                }
            }
            JumpIfTrue => {
                let offset = self.read_i32()?;
                let cond = as_bool(&self.pop())?;
                if cond {
                    self.jump(offset);
                }
            }

            Call => {
                let argc = self.read_u8()?;
                return self.exec_call(argc, false);
            }
            TailCall => {
                let argc = self.read_u8()?;
                return self.exec_call(argc, true);
            }
            Return => {
                let value = self.pop();
                match self.frames.pop() {
                    None => return Ok(Step::Exit(value)),
                    Some(frame) => {
                        self.ip = frame.return_address;
                        self.push(value);
                    }
                }
            }

            Function => {
                self.exec_function_decl()?;
            }

            List => {
                let n = self.read_u16()? as usize;
                let mut elements = vec![Value::Null; n];
                for i in (0..n).rev() {
                    elements[i] = self.pop();
                }
                self.push(Value::array(elements));
            }
            Dict => {
                let n = self.read_u16()?;
                let mut map = HashMap::with_capacity(n as usize);
                for _ in 0..n {
                    let value = self.pop();
                    let key = self.pop();
                    let key = match key {
                        Value::String(s) => s,
                        other => {
                            return Err(VmError::type_mismatch(format!(
                                "dictionary keys must be strings, got {}",
                                other.type_name()
                            )))
                        }
                    };
                    map.insert(key, value);
                }
                self.push(Value::dict(map));
            }

            GetProperty => {
                let index = self.pop();
                let object = self.pop();
                self.push(get_property(&object, &index)?);
            }
            SetProperty => {
                let value = self.pop();
                let index = self.pop();
                let object = self.pop();
                set_property(&object, &index, value.clone())?;
                self.push(value);
            }

            Print => {
                let value = self.pop();
                let rendered = value.to_display_string();
                let suppress_newline =
                    matches!(&value, Value::String(s) if s.ends_with('\n'));
                if suppress_newline {
                    print!("{rendered}");
                } else {
                    println!("{rendered}");
                }
            }
        }
        Ok(Step::Continue)
    }

    fn exec_call(&mut self, argc: u8, is_tail: bool) -> Result<Step> {
        let argc = argc as usize;
        let mut args = vec![Value::Null; argc];
        for i in (0..argc).rev() {
            args[i] = self.pop();
        }
        let callee = self.pop();

        match callee {
            Value::Function(function) => {
                if args.len() != function.arity() {
                    return Err(VmError::ArityMismatch {
                        expected: function.arity(),
                        got: args.len(),
                    });
                }
                let env = Environment::new(Some(function.closure.clone()));
                for (param, arg) in function.params.iter().zip(args.into_iter()) {
                    env.declare(param, arg);
                }

                if is_tail && !self.frames.is_empty() {
                    trace!(target: "vasuki::vm", "tail call, rewriting current frame in place");
                    let frame = self.frames.last_mut().expect("checked non-empty");
                    frame.environment = env;
                    frame.function = function.clone();
                    self.ip = function.start_pos as usize;
                } else {
                    trace!(target: "vasuki::vm", "call, pushing new frame");
                    let return_address = self.ip;
                    self.ip = function.start_pos as usize;
                    self.frames
                        .push(CallFrame::new(return_address, env, function));
                    self.max_frame_depth = self.max_frame_depth.max(self.frames.len());
                }
            }
            Value::String(name) => {
                let result = builtins::call(&name, &args)?;
                self.push(result);
            }
            other => {
                return Err(VmError::not_callable(format!(
                    "cannot call a value of type {}",
                    other.type_name()
                )))
            }
        }
        Ok(Step::Continue)
    }

    fn exec_function_decl(&mut self) -> Result<()> {
        let name_idx = self.read_u16()?;
        let name = self.name(name_idx)?;
        let start_pos = self.read_i32()?;
        let param_count = self.read_u8()?;
        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            let idx = self.read_u16()?;
            params.push(self.name(idx)?);
        }

        let scope = match self.frames.last() {
            Some(frame) => frame.environment.clone(),
            None => self.globals.clone(),
        };
        let function = Rc::new(FunctionData::new(start_pos as u32, params, scope.clone()));
        scope.declare(&name, Value::Function(function));
        Ok(())
    }

    /// The environment `GET_LOCAL`/`SET_LOCAL`/`DEFINE_LOCAL` operate on:
    /// the innermost call frame's environment. There is no local scope at
    /// the top level, so using these opcodes outside any call is an
    /// unbound-name condition.
    fn local_env(&self, name: &str) -> Result<Environment> {
        self.frames
            .last()
            .map(|f| f.environment.clone())
            .ok_or_else(|| VmError::unbound_name(name))
    }

    fn jump(&mut self, offset: i32) {
        // `offset` is relative to the instruction pointer immediately
        // after the 4-byte operand, which is exactly where `self.ip`
        // already sits once `read_i32` has consumed it.
        self.ip = (self.ip as i64 + offset as i64) as usize;
    }

    fn binop(&mut self, f: impl FnOnce(&Value, &Value) -> Result<Value>) -> Result<()> {
        let (a, b) = self.pop2();
        self.push(f(&a, &b)?);
        Ok(())
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Stack underflow is a recoverable warning, not a propagating error:
    /// log it and synthesize `Null`.
    fn pop(&mut self) -> Value {
        match self.stack.pop() {
            Some(v) => v,
            None => {
                warn!(target: "vasuki::vm", "stack underflow, substituting null");
                Value::Null
            }
        }
    }

    fn pop2(&mut self) -> (Value, Value) {
        let b = self.pop();
        let a = self.pop();
        (a, b)
    }

    fn peek(&mut self) -> Result<Value> {
        match self.stack.last() {
            Some(v) => Ok(v.clone()),
            None => {
                warn!(target: "vasuki::vm", "stack underflow, substituting null");
                Ok(Value::Null)
            }
        }
    }

    fn constant(&self, idx: usize) -> Result<&crate::bytecode::Constant> {
        self.constants
            .get(idx)
            .ok_or_else(|| VmError::malformed(format!("constant index {idx} out of range")))
    }

    fn name(&self, idx: u16) -> Result<String> {
        self.names
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| VmError::malformed(format!("name index {idx} out of range")))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self
            .code
            .get(self.ip)
            .ok_or_else(|| VmError::malformed("truncated instruction operand"))?;
        self.ip += 1;
        Ok(b)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let lo = self.read_u8()? as u16;
        let hi = self.read_u8()? as u16;
        Ok(lo | (hi << 8))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let b0 = self.read_u8()? as u32;
        let b1 = self.read_u8()? as u32;
        let b2 = self.read_u8()? as u32;
        let b3 = self.read_u8()? as u32;
        Ok((b0 | (b1 << 8) | (b2 << 16) | (b3 << 24)) as i32)
    }
}

fn as_bool(v: &Value) -> Result<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        other => Err(VmError::type_mismatch(format!(
            "expected a boolean, got {}",
            other.type_name()
        ))),
    }
}

fn get_property(object: &Value, index: &Value) -> Result<Value> {
    match object {
        Value::Array(a) => {
            let i = expect_int(index, "array index")?;
            let a = a.borrow();
            if i < 0 || i as usize >= a.len() {
                return Err(VmError::IndexOutOfBounds {
                    index: i,
                    length: a.len(),
                });
            }
            Ok(a[i as usize].clone())
        }
        Value::Dict(d) => {
            let key = expect_string(index, "dictionary key")?;
            d.borrow()
                .get(key)
                .cloned()
                .ok_or_else(|| VmError::key_not_found(key.clone()))
        }
        Value::String(s) => {
            let i = expect_int(index, "string index")?;
            let bytes = s.as_bytes();
            if i < 0 || i as usize >= bytes.len() {
                return Err(VmError::IndexOutOfBounds {
                    index: i,
                    length: bytes.len(),
                });
            }
            Ok(Value::String((bytes[i as usize] as char).to_string()))
        }
        other => Err(VmError::type_mismatch(format!(
            "cannot get a property of {}",
            other.type_name()
        ))),
    }
}

fn set_property(object: &Value, index: &Value, value: Value) -> Result<()> {
    match object {
        Value::Array(a) => {
            let i = expect_int(index, "array index")?;
            let mut a = a.borrow_mut();
            if i < 0 || i as usize >= a.len() {
                return Err(VmError::IndexOutOfBounds {
                    index: i,
                    length: a.len(),
                });
            }
            a[i as usize] = value;
            Ok(())
        }
        Value::Dict(d) => {
            let key = expect_string(index, "dictionary key")?;
            d.borrow_mut().insert(key.clone(), value);
            Ok(())
        }
        other => Err(VmError::type_mismatch(format!(
            "cannot set a property of {}",
            other.type_name()
        ))),
    }
}

fn expect_int<'a>(v: &'a Value, what: &str) -> Result<i64> {
    match v {
        Value::Int(i) => Ok(*i),
        other => Err(VmError::type_mismatch(format!(
            "{what} must be an integer, got {}",
            other.type_name()
        ))),
    }
}

fn expect_string<'a>(v: &'a Value, what: &str) -> Result<&'a String> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(VmError::type_mismatch(format!(
            "{what} must be a string, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{BytecodeImage, Constant};

    fn image(code: Vec<u8>, constants: Vec<Constant>, names: Vec<String>) -> BytecodeImage {
        BytecodeImage {
            code,
            constants,
            names,
        }
    }

    #[test]
    fn stack_underflow_on_pop_yields_null_not_an_error() {
        let mut vm = Vm::new(image(vec![], vec![], vec![]));
        assert!(matches!(vm.pop(), Value::Null));
    }

    #[test]
    fn halt_with_empty_stack_returns_null() {
        let mut vm = Vm::new(image(vec![Opcode::Halt as u8], vec![], vec![]));
        assert!(matches!(vm.run().unwrap(), Value::Null));
    }

    #[test]
    fn running_off_the_end_returns_top_of_stack() {
        // PUSH_INT 7 (opcode 2, then i32 LE), no HALT.
        let mut code = vec![2];
        code.extend(7i32.to_le_bytes());
        let mut vm = Vm::new(image(code, vec![], vec![]));
        assert!(matches!(vm.run().unwrap(), Value::Int(7)));
    }

    #[test]
    fn array_aliasing_observed_through_set_property() {
        let dict_a = Value::dict(HashMap::new());
        let dict_b = dict_a.clone();
        set_property(&dict_a, &Value::String("k".into()), Value::Int(1)).unwrap();
        let got = get_property(&dict_b, &Value::String("k".into())).unwrap();
        assert!(matches!(got, Value::Int(1)));
    }
}
