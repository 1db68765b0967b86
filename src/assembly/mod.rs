//! Decoded CIL instruction streams.
//!
//! # Key Types
//! - [`Instruction`] - A decoded CIL instruction
//! - [`OpCode`] - Opcode with its ECMA-335 mnemonic and encoding
//! - [`Operand`] - Instruction operands (immediates, tokens, targets)

mod instruction;

pub use instruction::{Instruction, OpCode, Operand, FE_PREFIX};
