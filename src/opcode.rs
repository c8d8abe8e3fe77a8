//! The Vasuki instruction set: one byte per opcode, inline little-endian
//! operands. See `bytecode.rs` for the container that carries the code
//! stream, constant pool, and name table this opcode set indexes into.

use crate::error::VmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Halt = 0,
    Nop = 1,
    PushInt = 2,
    PushFloat = 3,
    PushString = 4,
    PushBool = 5,
    PushNull = 6,
    Pop = 7,
    PopN = 8,
    Dup = 9,
    Add = 10,
    Sub = 11,
    Mul = 12,
    Div = 13,
    Mod = 14,
    Neg = 15,
    Pow = 16,
    Eq = 17,
    Neq = 18,
    Lt = 19,
    Lte = 20,
    Gt = 21,
    Gte = 22,
    And = 23,
    Or = 24,
    Not = 25,
    GetGlobal = 26,
    SetGlobal = 27,
    DefineGlobal = 28,
    GetLocal = 29,
    SetLocal = 30,
    DefineLocal = 31,
    Jump = 32,
    JumpIfFalse = 33,
    JumpIfTrue = 34,
    Call = 35,
    Return = 36,
    Function = 37,
    List = 38,
    Dict = 39,
    GetProperty = 40,
    SetProperty = 41,
    Print = 42,
    PushConstant = 43,
    PushTrue = 44,
    PushFalse = 45,
    TailCall = 46,
}

impl TryFrom<u8> for Opcode {
    type Error = VmError;

    fn try_from(byte: u8) -> Result<Self, VmError> {
        use Opcode::*;
        Ok(match byte {
            0 => Halt,
            1 => Nop,
            2 => PushInt,
            3 => PushFloat,
            4 => PushString,
            5 => PushBool,
            6 => PushNull,
            7 => Pop,
            8 => PopN,
            9 => Dup,
            10 => Add,
            11 => Sub,
            12 => Mul,
            13 => Div,
            14 => Mod,
            15 => Neg,
            16 => Pow,
            17 => Eq,
            18 => Neq,
            19 => Lt,
            20 => Lte,
            21 => Gt,
            22 => Gte,
            23 => And,
            24 => Or,
            25 => Not,
            26 => GetGlobal,
            27 => SetGlobal,
            28 => DefineGlobal,
            29 => GetLocal,
            30 => SetLocal,
            31 => DefineLocal,
            32 => Jump,
            33 => JumpIfFalse,
            34 => JumpIfTrue,
            35 => Call,
            36 => Return,
            37 => Function,
            38 => List,
            39 => Dict,
            40 => GetProperty,
            41 => SetProperty,
            42 => Print,
            43 => PushConstant,
            44 => PushTrue,
            45 => PushFalse,
            46 => TailCall,
            other => return Err(VmError::InvalidOpcode(other)),
        })
    }
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Halt => "HALT",
            Nop => "NOP",
            PushInt => "PUSH_INT",
            PushFloat => "PUSH_FLOAT",
            PushString => "PUSH_STRING",
            PushBool => "PUSH_BOOL",
            PushNull => "PUSH_NULL",
            Pop => "POP",
            PopN => "POP_N",
            Dup => "DUP",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Neg => "NEG",
            Pow => "POW",
            Eq => "EQ",
            Neq => "NEQ",
            Lt => "LT",
            Lte => "LTE",
            Gt => "GT",
            Gte => "GTE",
            And => "AND",
            Or => "OR",
            Not => "NOT",
            GetGlobal => "GET_GLOBAL",
            SetGlobal => "SET_GLOBAL",
            DefineGlobal => "DEFINE_GLOBAL",
            GetLocal => "GET_LOCAL",
            SetLocal => "SET_LOCAL",
            DefineLocal => "DEFINE_LOCAL",
            Jump => "JUMP",
            JumpIfFalse => "JUMP_IF_FALSE",
            JumpIfTrue => "JUMP_IF_TRUE",
            Call => "CALL",
            Return => "RETURN",
            Function => "FUNCTION",
            List => "LIST",
            Dict => "DICT",
            GetProperty => "GET_PROPERTY",
            SetProperty => "SET_PROPERTY",
            Print => "PRINT",
            PushConstant => "PUSH_CONSTANT",
            PushTrue => "PUSH_TRUE",
            PushFalse => "PUSH_FALSE",
            TailCall => "TAIL_CALL",
        }
    }
}
