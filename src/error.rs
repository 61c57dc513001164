//! Runtime faults raised by the virtual machine and the value operations it
//! shares with the front end.

use crate::Type;
use thiserror::Error;

pub type FaultResult<T> = std::result::Result<T, Fault>;

/// Unrecoverable errors. Execution stops at the first one.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("stack underflow")]
    StackUnderflow,

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("unknown type tag: {0}")]
    UnknownTypeTag(String),

    #[error("label {0} is not defined")]
    UnknownLabel(usize),

    #[error("label {label} defined twice (instructions {first} and {second})")]
    DuplicateLabel {
        label: usize,
        first: usize,
        second: usize,
    },

    #[error("line {line}: unknown opcode '{mnemonic}'")]
    UnknownOpcode { line: usize, mnemonic: String },

    #[error("line {line}: malformed instruction '{text}': {reason}")]
    MalformedInstruction {
        line: usize,
        text: String,
        reason: String,
    },

    #[error("unsupported operand types for {operation}: {left} and {right}")]
    InvalidOperands {
        operation: &'static str,
        left: Type,
        right: Type,
    },

    #[error("unsupported operand type for {operation}: {operand}")]
    InvalidOperand {
        operation: &'static str,
        operand: Type,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    IntegerOverflow(&'static str),

    #[error("cannot read '{input}' as {expected}")]
    InvalidInput { expected: Type, input: String },

    #[error("input exhausted")]
    InputExhausted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
