//! CIL instruction model as exposed by the metadata facade.
//!
//! Loaders decode method bodies into a flat list of [`Instruction`] values. Only the
//! opcode and the operand matter to call-site inspection; the remaining fields exist so
//! diagnostics can point at the offending IL offset.

use std::fmt;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::metadata::token::Token;

/// Prefix byte shared by all two-byte CIL opcodes.
pub const FE_PREFIX: u16 = 0xFE00;

/// CIL opcodes understood by the facade.
///
/// The [`Display`] form is the ECMA-335 mnemonic (e.g. `callvirt`, `ldarg.0`), and
/// [`OpCode::code`] returns the encoded value (two-byte opcodes carry [`FE_PREFIX`]).
/// Loaders map opcodes they do not care about to [`OpCode::Unknown`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum OpCode {
    /// `nop`
    #[strum(serialize = "nop")]
    Nop,
    /// `ldarg.0`
    #[strum(serialize = "ldarg.0")]
    Ldarg0,
    /// `ldarg.1`
    #[strum(serialize = "ldarg.1")]
    Ldarg1,
    /// `ldloc.0`
    #[strum(serialize = "ldloc.0")]
    Ldloc0,
    /// `stloc.0`
    #[strum(serialize = "stloc.0")]
    Stloc0,
    /// `ldnull`
    #[strum(serialize = "ldnull")]
    Ldnull,
    /// `ldc.i4`
    #[strum(serialize = "ldc.i4")]
    LdcI4,
    /// `dup`
    #[strum(serialize = "dup")]
    Dup,
    /// `pop`
    #[strum(serialize = "pop")]
    Pop,
    /// `call`
    #[strum(serialize = "call")]
    Call,
    /// `calli`
    #[strum(serialize = "calli")]
    Calli,
    /// `ret`
    #[strum(serialize = "ret")]
    Ret,
    /// `br`
    #[strum(serialize = "br")]
    Br,
    /// `brtrue`
    #[strum(serialize = "brtrue")]
    Brtrue,
    /// `callvirt`
    #[strum(serialize = "callvirt")]
    Callvirt,
    /// `ldstr`
    #[strum(serialize = "ldstr")]
    Ldstr,
    /// `newobj`
    #[strum(serialize = "newobj")]
    Newobj,
    /// `ldfld`
    #[strum(serialize = "ldfld")]
    Ldfld,
    /// `stfld`
    #[strum(serialize = "stfld")]
    Stfld,
    /// `ldsfld`
    #[strum(serialize = "ldsfld")]
    Ldsfld,
    /// `box`
    #[strum(serialize = "box")]
    Box,
    /// `throw`
    #[strum(serialize = "throw")]
    Throw,
    /// `ldftn`
    #[strum(serialize = "ldftn")]
    Ldftn,
    /// `ldvirtftn`
    #[strum(serialize = "ldvirtftn")]
    Ldvirtftn,
    /// Any opcode the loader did not map
    #[strum(serialize = "<unknown>")]
    Unknown,
}

impl OpCode {
    /// Returns the encoded opcode value. Two-byte opcodes include [`FE_PREFIX`].
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            OpCode::Nop => 0x00,
            OpCode::Ldarg0 => 0x02,
            OpCode::Ldarg1 => 0x03,
            OpCode::Ldloc0 => 0x06,
            OpCode::Stloc0 => 0x0A,
            OpCode::Ldnull => 0x14,
            OpCode::LdcI4 => 0x20,
            OpCode::Dup => 0x25,
            OpCode::Pop => 0x26,
            OpCode::Call => 0x28,
            OpCode::Calli => 0x29,
            OpCode::Ret => 0x2A,
            OpCode::Br => 0x38,
            OpCode::Brtrue => 0x3A,
            OpCode::Callvirt => 0x6F,
            OpCode::Ldstr => 0x72,
            OpCode::Newobj => 0x73,
            OpCode::Ldfld => 0x7B,
            OpCode::Stfld => 0x7D,
            OpCode::Ldsfld => 0x7E,
            OpCode::Box => 0x8C,
            OpCode::Throw => 0x7A,
            OpCode::Ldftn => FE_PREFIX | 0x06,
            OpCode::Ldvirtftn => FE_PREFIX | 0x07,
            OpCode::Unknown => 0xFFFF,
        }
    }

    /// Maps an encoded opcode value back to an [`OpCode`], or [`OpCode::Unknown`].
    #[must_use]
    pub fn from_code(code: u16) -> OpCode {
        OpCode::iter()
            .find(|opcode| *opcode != OpCode::Unknown && opcode.code() == code)
            .unwrap_or(OpCode::Unknown)
    }

    /// Returns `true` for `call` and `callvirt`, the two opcodes that form call-sites.
    #[must_use]
    pub const fn is_call_site(&self) -> bool {
        matches!(self, OpCode::Call | OpCode::Callvirt)
    }
}

/// Operand of a decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate integer value
    Immediate(i64),
    /// Metadata token reference (method, field, type)
    Token(Token),
    /// Branch target offset
    Target(u32),
    /// User string literal
    String(String),
}

/// A single decoded CIL instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// IL offset of this instruction within its method body
    pub offset: u32,
    /// The opcode
    pub opcode: OpCode,
    /// The operand data for this instruction
    pub operand: Operand,
}

impl Instruction {
    /// Creates a new instruction.
    #[must_use]
    pub fn new(offset: u32, opcode: OpCode, operand: Operand) -> Self {
        Instruction {
            offset,
            opcode,
            operand,
        }
    }

    /// Returns the token operand, if the instruction carries one.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match &self.operand {
            Operand::Token(token) => Some(*token),
            _ => None,
        }
    }

    /// Returns the mnemonic of this instruction
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        self.opcode.into()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.opcode)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Immediate(value) => write!(f, " {value}"),
            Operand::Token(token) => write!(f, " {token}"),
            Operand::Target(target) => write!(f, " IL_{target:04x}"),
            Operand::String(value) => write!(f, " \"{value}\""),
        }
    }
}
