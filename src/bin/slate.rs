use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use slate::{check, compile_source, parse_source, VirtualMachine};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "slate")]
#[command(about = "Type checker, bytecode compiler and stack VM for the slate language")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Type check a source file and print its diagnostics
    Check { file: PathBuf },

    /// Compile a source file to bytecode text
    Compile {
        file: PathBuf,

        /// Write the bytecode here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print an indexed listing instead of loadable bytecode
        #[arg(long)]
        listing: bool,
    },

    /// Execute a bytecode file
    Run { file: PathBuf },

    /// Compile and execute a source file
    Exec { file: PathBuf },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "slate=debug" } else { "warn" })
    });
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check { file } => {
            let source = read_file(&file)?;
            let program = parse_source(&source).context("Parser error")?;
            let diagnostics = check(&program);
            for diagnostic in diagnostics.iter() {
                println!("{}", diagnostic);
            }
            if !diagnostics.is_empty() {
                bail!("{} type error(s) in {}", diagnostics.len(), file.display());
            }
        }
        Command::Compile {
            file,
            output,
            listing,
        } => {
            let source = read_file(&file)?;
            let bytecode = compile_source(&source).context("Compiler error")?;
            let text = if listing {
                format!("{}\n", bytecode.disassemble())
            } else {
                bytecode.to_string()
            };
            match output {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("Failed to write file: {}", path.display()))?;
                    info!(path = %path.display(), "bytecode written");
                }
                None => io::stdout().write_all(text.as_bytes())?,
            }
        }
        Command::Run { file } => {
            let text = read_file(&file)?;
            let stdin = io::stdin();
            let mut virtual_machine = VirtualMachine::new(stdin.lock(), io::stdout());
            virtual_machine.execute(&text).context("Runtime error")?;
        }
        Command::Exec { file } => {
            let source = read_file(&file)?;
            let bytecode = compile_source(&source).context("Compiler error")?;
            let stdin = io::stdin();
            let mut virtual_machine = VirtualMachine::new(stdin.lock(), io::stdout());
            virtual_machine
                .execute(&bytecode.to_string())
                .context("Runtime error")?;
        }
    }

    Ok(())
}
