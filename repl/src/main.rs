use anyhow::{bail, Result};
use rustyline::{error::ReadlineError, Editor};
use slate::{check, parse_source, Compiler, VirtualMachine};
use std::io::{self, BufRead, Write};

enum Feed {
    NeedMore,
    Done,
}

/// Keeps every accepted line so later lines see earlier declarations, and a
/// VM whose variables carry over between lines.
struct Session<R, W> {
    virtual_machine: VirtualMachine<R, W>,
    accumulated_code: String,
    pending: String,
    executed: usize,
}

impl<R: BufRead, W: Write> Session<R, W> {
    fn new(input: R, output: W) -> Self {
        Self {
            virtual_machine: VirtualMachine::new(input, output),
            accumulated_code: String::new(),
            pending: String::new(),
            executed: 0,
        }
    }

    fn is_continuing(&self) -> bool {
        !self.pending.is_empty()
    }

    fn feed(&mut self, line: &str) -> Result<Feed> {
        self.pending.push_str(line);
        self.pending.push('\n');
        if open_braces(&self.pending) > 0 {
            return Ok(Feed::NeedMore);
        }

        let pending = std::mem::take(&mut self.pending);
        let test_code = format!("{}{}", self.accumulated_code, pending);

        let program = parse_source(&test_code)?;
        let diagnostics = check(&program);
        if !diagnostics.is_empty() {
            bail!(
                "{}",
                diagnostics
                    .iter()
                    .map(|diagnostic| diagnostic.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }

        let mut compiler = Compiler::new(&program);
        let bytecode = compiler.compile()?;

        // Earlier lines compile to the same prefix; only the new tail runs.
        let fresh = bytecode.instructions.get(self.executed..).unwrap_or(&[]);
        let variables = self.virtual_machine.variables.clone();
        if let Err(fault) = self.virtual_machine.run(fresh) {
            // Undo everything but the output of the dropped line.
            self.virtual_machine.stack.clear();
            self.virtual_machine.variables = variables;
            return Err(fault.into());
        }

        self.executed = bytecode.instructions.len();
        self.accumulated_code = test_code;
        Ok(Feed::Done)
    }
}

// Braces inside string literals don't count.
fn open_braces(code: &str) -> i64 {
    let mut depth = 0;
    let mut in_string = false;
    for c in code.chars() {
        match c {
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn main() -> Result<()> {
    println!(
        r"
Welcome to the slate REPL!
Declare variables and they stay in scope for the following lines.
Enter 'exit' or press 'CTRL+C' to exit the REPL.
    "
    );

    let mut rl = Editor::<()>::new();
    if rl.load_history("history.txt").is_err() {
        println!("No previous history.");
    }

    let stdin = io::stdin();
    let mut session = Session::new(stdin.lock(), io::stdout());

    loop {
        let prompt = if session.is_continuing() { ".. " } else { "> " };
        let readline = rl.readline(prompt);
        match readline {
            Ok(line) => match line.as_ref() {
                "exit" if !session.is_continuing() => break,
                line => {
                    rl.add_history_entry(line);
                    if let Err(error) = session.feed(line) {
                        eprintln!("Error: {}", error);
                    }
                }
            },
            Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history("history.txt")?;
    Ok(())
}
