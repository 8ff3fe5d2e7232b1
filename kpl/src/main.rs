use clap::{Args, Parser, Subcommand};
use kpl_syntax::{scan, ErrorManager, FileManager, TokenKind};
use kpl_typecheck::{compile, CompileError};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
struct CliArgs {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and check a source file, printing its symbol table.
    Compile(CompileArgs),
    /// Dump the token stream of a source file.
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
struct CompileArgs {
    file: PathBuf,
}

#[derive(Args, Debug)]
struct ScanArgs {
    file: PathBuf,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match args.command {
        Command::Compile(arg) => run_compile(arg),
        Command::Scan(arg) => run_scan(arg),
    }
}

fn run_compile(arg: CompileArgs) -> ExitCode {
    let mut stdout = std::io::stdout();
    match compile(arg.file, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CompileError::Io(err)) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(CompileError::Source(diagnostics)) => {
            for diagnostic in diagnostics {
                eprintln!("{diagnostic}");
            }
            eprintln!("Compilation failed due to some error(s)");
            ExitCode::FAILURE
        }
    }
}

fn run_scan(arg: ScanArgs) -> ExitCode {
    let mut file_manager = FileManager::default();
    let file = match file_manager.open(arg.file) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let mut error_manager = ErrorManager::default();
    for token in scan(&error_manager, &file) {
        let location = file_manager.location(token.pos);
        match token.kind {
            TokenKind::Ident
            | TokenKind::Number
            | TokenKind::Float
            | TokenKind::CharLit
            | TokenKind::StringLit
            | TokenKind::Invalid => println!("{location}: {}({})", token.kind, token.value),
            _ => println!("{location}: {}", token.kind),
        }
    }

    let errors = error_manager.take();
    let failed = !errors.is_empty();
    for err in errors {
        let location = file_manager.location(err.pos);
        eprintln!("{location}: {}", err.message);
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
