mod compiler;
mod error;
mod lexer;
mod parser;
mod symbols;
mod typechecker;
mod types;
mod value;
mod vm;

pub use self::{
    compiler::*, error::*, lexer::*, parser::*, symbols::*, typechecker::*, types::*, value::*,
    vm::*,
};

use anyhow::{bail, Result};
use std::{
    fmt::Display,
    io::{BufRead, Write},
};

fn flatten(items: &[impl Display], separator: &str) -> String {
    let strings = items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    strings.join(separator)
}

/// Lexes and parses a whole source text.
pub fn parse_source(source: &str) -> Result<Program> {
    let mut lexer = Lexer::new(source);
    let lexemes = lexer.tokenize()?;
    let mut parser = Parser::new(&lexemes);
    parser.parse()
}

/// Parses, checks and compiles. Fails with every diagnostic, one per line,
/// if the checker reports any.
pub fn compile_source(source: &str) -> Result<Bytecode> {
    let program = parse_source(source)?;
    let diagnostics = check(&program);
    if !diagnostics.is_empty() {
        bail!("{}", flatten(&diagnostics, "\n"));
    }
    let mut compiler = Compiler::new(&program);
    compiler.compile()
}

/// Compiles and executes, handing the VM the bytecode text.
pub fn run_source(source: &str, input: impl BufRead, output: impl Write) -> Result<()> {
    let bytecode = compile_source(source)?;
    let mut virtual_machine = VirtualMachine::new(input, output);
    virtual_machine.execute(&bytecode.to_string())?;
    Ok(())
}
