//! Read-only sequential disassembler: one line per instruction, decoded
//! against the constant pool and name table. Never mutates or executes
//! anything — purely a debugging aid over an already-loaded image.

use crate::bytecode::BytecodeImage;
use crate::opcode::Opcode;

/// Disassembles the full code stream of `image`, one line per
/// instruction. Stops and appends `<incomplete>` the moment an opcode or
/// one of its operands runs past the end of the code stream, rather than
/// erroring — this is a listing tool, not a loader.
pub fn disassemble(image: &BytecodeImage) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cursor = Reader {
        code: &image.code,
        pos: 0,
    };

    while cursor.pos < cursor.code.len() {
        let offset = cursor.pos;
        match disassemble_one(&mut cursor, image) {
            Some(text) => lines.push(format!("{offset:06}  {text}")),
            None => {
                lines.push(format!("{offset:06}  <incomplete>"));
                break;
            }
        }
    }
    lines
}

fn disassemble_one(cursor: &mut Reader, image: &BytecodeImage) -> Option<String> {
    let byte = cursor.read_u8()?;
    let opcode = Opcode::try_from(byte).ok()?;
    let mnemonic = opcode.mnemonic();

    use Opcode::*;
    let operands = match opcode {
        Halt | Nop | Pop | Dup | Add | Sub | Mul | Div | Mod | Neg | Pow | Eq | Neq | Lt
        | Lte | Gt | Gte | And | Or | Not | Return | GetProperty | SetProperty | Print
        | PushNull | PushTrue | PushFalse => String::new(),

        PushInt => format!("{}", cursor.read_i32()?),
        PushFloat => {
            let idx = cursor.read_u8()?;
            format!("#{idx} ({:?})", image.constants.get(idx as usize)?)
        }
        PushConstant => {
            let idx = cursor.read_u8()?;
            format!("#{idx} ({:?})", image.constants.get(idx as usize)?)
        }
        PushString => {
            let idx = cursor.read_u16()?;
            format!("#{idx} ({:?})", image.names.get(idx as usize)?)
        }
        PushBool => format!("{}", cursor.read_u8()? != 0),
        PopN => format!("{}", cursor.read_u8()?),

        GetGlobal | SetGlobal | DefineGlobal | GetLocal | SetLocal | DefineLocal => {
            let idx = cursor.read_u16()?;
            format!("#{idx} ({:?})", image.names.get(idx as usize)?)
        }

        Jump | JumpIfFalse | JumpIfTrue => {
            let offset = cursor.read_i32()?;
            let target = (cursor.pos as i64 + offset as i64) as usize;
            format!("{offset:+} -> {target:06}")
        }

        Call | TailCall => format!("argc={}", cursor.read_u8()?),

        Function => {
            let name_idx = cursor.read_u16()?;
            let start = cursor.read_i32()?;
            let pcount = cursor.read_u8()?;
            let mut params = Vec::with_capacity(pcount as usize);
            for _ in 0..pcount {
                let idx = cursor.read_u16()?;
                params.push(image.names.get(idx as usize)?.clone());
            }
            format!(
                "{:?} start={start:06} params=[{}]",
                image.names.get(name_idx as usize)?,
                params.join(", ")
            )
        }

        List | Dict => format!("n={}", cursor.read_u16()?),
    };

    if operands.is_empty() {
        Some(mnemonic.to_string())
    } else {
        Some(format!("{mnemonic} {operands}"))
    }
}

struct Reader<'a> {
    code: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn read_u8(&mut self) -> Option<u8> {
        let b = *self.code.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn read_u16(&mut self) -> Option<u16> {
        let lo = self.read_u8()? as u16;
        let hi = self.read_u8()? as u16;
        Some(lo | (hi << 8))
    }

    fn read_i32(&mut self) -> Option<i32> {
        let b0 = self.read_u8()? as u32;
        let b1 = self.read_u8()? as u32;
        let b2 = self.read_u8()? as u32;
        let b3 = self.read_u8()? as u32;
        Some((b0 | (b1 << 8) | (b2 << 16) | (b3 << 24)) as i32)
    }
}
