//! A tiny hand-assembler for building `BytecodeImage`s in tests, mirroring
//! the shape of a real compiler's output without depending on one.

#![allow(dead_code)]

use vasuki::bytecode::{BytecodeImage, Constant};

pub struct Asm {
    code: Vec<u8>,
    constants: Vec<Constant>,
    names: Vec<String>,
}

impl Asm {
    pub fn new() -> Self {
        Asm {
            code: Vec::new(),
            constants: Vec::new(),
            names: Vec::new(),
        }
    }

    pub fn here(&self) -> usize {
        self.code.len()
    }

    fn op(&mut self, byte: u8) -> &mut Self {
        self.code.push(byte);
        self
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.code.push(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.code.extend(v.to_le_bytes());
        self
    }

    fn i32(&mut self, v: i32) -> &mut Self {
        self.code.extend(v.to_le_bytes());
        self
    }

    pub fn name(&mut self, s: &str) -> u16 {
        if let Some(idx) = self.names.iter().position(|n| n == s) {
            return idx as u16;
        }
        self.names.push(s.to_string());
        (self.names.len() - 1) as u16
    }

    pub fn constant(&mut self, c: Constant) -> u8 {
        self.constants.push(c);
        (self.constants.len() - 1) as u8
    }

    pub fn push_int(&mut self, v: i32) -> &mut Self {
        self.op(2).i32(v)
    }

    pub fn push_string(&mut self, s: &str) -> &mut Self {
        let idx = self.name(s);
        self.op(4).u16(idx)
    }

    pub fn push_null(&mut self) -> &mut Self {
        self.op(6)
    }

    pub fn push_true(&mut self) -> &mut Self {
        self.op(44)
    }

    pub fn push_false(&mut self) -> &mut Self {
        self.op(45)
    }

    pub fn pop(&mut self) -> &mut Self {
        self.op(7)
    }

    pub fn add(&mut self) -> &mut Self {
        self.op(10)
    }
    pub fn sub(&mut self) -> &mut Self {
        self.op(11)
    }
    pub fn lte(&mut self) -> &mut Self {
        self.op(20)
    }

    pub fn get_global(&mut self, name: &str) -> &mut Self {
        let idx = self.name(name);
        self.op(26).u16(idx)
    }
    pub fn set_global(&mut self, name: &str) -> &mut Self {
        let idx = self.name(name);
        self.op(27).u16(idx)
    }
    pub fn define_global(&mut self, name: &str) -> &mut Self {
        let idx = self.name(name);
        self.op(28).u16(idx)
    }
    pub fn get_local(&mut self, name: &str) -> &mut Self {
        let idx = self.name(name);
        self.op(29).u16(idx)
    }
    pub fn define_local(&mut self, name: &str) -> &mut Self {
        let idx = self.name(name);
        self.op(31).u16(idx)
    }

    /// Emits a JUMP_IF_FALSE with a placeholder offset and returns the code
    /// offset of the start of that offset operand, to be patched later with
    /// `patch_jump`.
    pub fn jump_if_false_placeholder(&mut self) -> usize {
        self.op(33);
        let at = self.here();
        self.i32(0);
        at
    }

    pub fn jump_placeholder(&mut self) -> usize {
        self.op(32);
        let at = self.here();
        self.i32(0);
        at
    }

    /// Patches a previously-emitted placeholder offset so that it targets
    /// `target`, relative to the end of the 4-byte operand itself.
    pub fn patch_jump(&mut self, operand_at: usize, target: usize) {
        let end_of_operand = operand_at + 4;
        let offset = target as i64 - end_of_operand as i64;
        let bytes = (offset as i32).to_le_bytes();
        self.code[operand_at..operand_at + 4].copy_from_slice(&bytes);
    }

    pub fn call(&mut self, argc: u8) -> &mut Self {
        self.op(35).u8(argc)
    }

    pub fn tail_call(&mut self, argc: u8) -> &mut Self {
        self.op(46).u8(argc)
    }

    pub fn ret(&mut self) -> &mut Self {
        self.op(36)
    }

    pub fn print(&mut self) -> &mut Self {
        self.op(42)
    }

    pub fn halt(&mut self) -> &mut Self {
        self.op(0)
    }

    pub fn list(&mut self, n: u16) -> &mut Self {
        self.op(38).u16(n)
    }

    pub fn dict(&mut self, n: u16) -> &mut Self {
        self.op(39).u16(n)
    }

    pub fn get_property(&mut self) -> &mut Self {
        self.op(40)
    }

    pub fn set_property(&mut self) -> &mut Self {
        self.op(41)
    }

    /// Emits a `FUNCTION` declaration with a placeholder `start_pos`,
    /// returning the code offset of that operand for later patching.
    pub fn function_placeholder(&mut self, name: &str, params: &[&str]) -> usize {
        let name_idx = self.name(name);
        self.op(37).u16(name_idx);
        let at = self.here();
        self.i32(0);
        self.u8(params.len() as u8);
        for p in params {
            let idx = self.name(p);
            self.u16(idx);
        }
        at
    }

    pub fn patch_function_start(&mut self, operand_at: usize, start: usize) {
        let bytes = (start as i32).to_le_bytes();
        self.code[operand_at..operand_at + 4].copy_from_slice(&bytes);
    }

    pub fn finish(self) -> BytecodeImage {
        BytecodeImage {
            code: self.code,
            constants: self.constants,
            names: self.names,
        }
    }
}
