//! On-disk bytecode container format.
//!
//! ```text
//! u32  code_size
//! u8[code_size]  code
//! u32  const_count
//! { u8 tag; payload }[const_count]
//!   tag 0: null,    no payload
//!   tag 1: bool,    u8
//!   tag 2: int,     i64
//!   tag 3: float,   f64
//!   tag 4: string,  u32 len; u8[len]
//! u32  name_count
//! { u32 len; u8[len] }[name_count]
//! ```
//!
//! Little-endian throughout. Compatibility is byte-exact: this layout is
//! produced by the external compiler and must not be reordered or have its
//! endianness changed.

use std::convert::TryInto;
use std::fs;
use std::path::Path;

use crate::error::{Result, VmError};
use crate::value::Value;

/// A typed literal from the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Constant {
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::Int(*i),
            Constant::Float(f) => Value::Float(*f),
            Constant::String(s) => Value::String(s.clone()),
        }
    }
}

/// A loaded bytecode image: the instruction stream plus its constant pool
/// and interned name table.
#[derive(Debug, Clone)]
pub struct BytecodeImage {
    pub code: Vec<u8>,
    pub constants: Vec<Constant>,
    pub names: Vec<String>,
}

impl BytecodeImage {
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<BytecodeImage> {
        let bytes = fs::read(path)
            .map_err(|e| VmError::malformed(format!("could not read bytecode file: {e}")))?;
        Self::load_bytes(&bytes)
    }

    pub fn load_bytes(bytes: &[u8]) -> Result<BytecodeImage> {
        let mut cursor = Cursor::new(bytes);

        let code_size = cursor.read_u32()? as usize;
        let code = cursor.read_bytes(code_size)?.to_vec();

        let const_count = cursor.read_u32()?;
        let mut constants = Vec::with_capacity(const_count as usize);
        for _ in 0..const_count {
            constants.push(cursor.read_constant()?);
        }

        let name_count = cursor.read_u32()?;
        let mut names = Vec::with_capacity(name_count as usize);
        for _ in 0..name_count {
            let len = cursor.read_u32()? as usize;
            let raw = cursor.read_bytes(len)?;
            names.push(
                String::from_utf8(raw.to_vec())
                    .map_err(|e| VmError::malformed(format!("invalid UTF-8 in name table: {e}")))?,
            );
        }

        Ok(BytecodeImage {
            code,
            constants,
            names,
        })
    }

    /// Serializes back to the container format. Used by tests and by
    /// `disasm`/debugging tools; the production path for producing a
    /// container is the external compiler.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend((self.code.len() as u32).to_le_bytes());
        out.extend(&self.code);

        out.extend((self.constants.len() as u32).to_le_bytes());
        for c in &self.constants {
            match c {
                Constant::Null => out.push(0),
                Constant::Bool(b) => {
                    out.push(1);
                    out.push(*b as u8);
                }
                Constant::Int(i) => {
                    out.push(2);
                    out.extend(i.to_le_bytes());
                }
                Constant::Float(f) => {
                    out.push(3);
                    out.extend(f.to_le_bytes());
                }
                Constant::String(s) => {
                    out.push(4);
                    out.extend((s.len() as u32).to_le_bytes());
                    out.extend(s.as_bytes());
                }
            }
        }

        out.extend((self.names.len() as u32).to_le_bytes());
        for n in &self.names {
            out.extend((n.len() as u32).to_le_bytes());
            out.extend(n.as_bytes());
        }
        out
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(VmError::malformed(format!(
                "truncated bytecode: needed {} bytes at offset {}, only {} remain",
                n,
                self.pos,
                self.bytes.len() - self.pos.min(self.bytes.len())
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let raw: [u8; 4] = self.read_bytes(4)?.try_into().expect("checked length");
        Ok(u32::from_le_bytes(raw))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let raw: [u8; 8] = self.read_bytes(8)?.try_into().expect("checked length");
        Ok(i64::from_le_bytes(raw))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let raw: [u8; 8] = self.read_bytes(8)?.try_into().expect("checked length");
        Ok(f64::from_le_bytes(raw))
    }

    fn read_constant(&mut self) -> Result<Constant> {
        match self.read_u8()? {
            0 => Ok(Constant::Null),
            1 => Ok(Constant::Bool(self.read_u8()? != 0)),
            2 => Ok(Constant::Int(self.read_i64()?)),
            3 => Ok(Constant::Float(self.read_f64()?)),
            4 => {
                let len = self.read_u32()? as usize;
                let raw = self.read_bytes(len)?;
                Ok(Constant::String(String::from_utf8(raw.to_vec()).map_err(
                    |e| VmError::malformed(format!("invalid UTF-8 in constant pool: {e}")),
                )?))
            }
            other => Err(VmError::malformed(format!(
                "unknown constant tag: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_and_load() {
        let image = BytecodeImage {
            code: vec![0, 1, 2, 3],
            constants: vec![
                Constant::Null,
                Constant::Bool(true),
                Constant::Int(-7),
                Constant::Float(2.5),
                Constant::String("hi".into()),
            ],
            names: vec!["x".into(), "hello world".into()],
        };
        let bytes = image.encode();
        let loaded = BytecodeImage::load_bytes(&bytes).unwrap();
        assert_eq!(loaded.code, image.code);
        assert_eq!(loaded.constants, image.constants);
        assert_eq!(loaded.names, image.names);
    }

    #[test]
    fn truncated_code_size_is_malformed() {
        // Declares a code_size far larger than the bytes that follow.
        let mut bytes = Vec::new();
        bytes.extend(1000u32.to_le_bytes());
        bytes.extend([1, 2, 3]); // far short of 1000 bytes
        assert!(matches!(
            BytecodeImage::load_bytes(&bytes),
            Err(VmError::MalformedBytecode(_))
        ));
    }

    #[test]
    fn load_file_reads_a_container_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program.vbc");
        let image = BytecodeImage {
            code: vec![0],
            constants: vec![Constant::Int(5)],
            names: vec!["x".into()],
        };
        std::fs::write(&path, image.encode()).unwrap();

        let loaded = BytecodeImage::load_file(&path).unwrap();
        assert_eq!(loaded.code, image.code);
        assert_eq!(loaded.constants, image.constants);
    }

    #[test]
    fn unknown_constant_tag_is_malformed() {
        let mut bytes = Vec::new();
        bytes.extend(0u32.to_le_bytes()); // empty code
        bytes.extend(1u32.to_le_bytes()); // one constant
        bytes.push(99); // unknown tag
        assert!(matches!(
            BytecodeImage::load_bytes(&bytes),
            Err(VmError::MalformedBytecode(_))
        ));
    }
}
