mod errors;
mod expr;
mod object;
mod parser;
mod printer;
mod scope;
mod ty;
mod value;

pub use object::{Object, ObjectId, ObjectKind, ParamMode};
pub use parser::parse;
pub use printer::SymbolPrinter;
pub use scope::{Scope, ScopeId, SymbolTable};
pub use ty::Type;
pub use value::ConstantValue;

use kpl_syntax::{ErrorManager, ErrorReporter, FileManager, Location};
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;

/// A reported error with its position already resolved to line/column.
#[derive(Debug)]
pub struct Diagnostic {
    pub location: Location,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

#[derive(Debug)]
pub enum CompileError {
    /// The source file could not be opened or the output not written.
    Io(io::Error),
    /// The source had errors; every collected diagnostic is included.
    Source(Vec<Diagnostic>),
}

impl From<io::Error> for CompileError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Compiles one source file: scan, parse and check in a single pass,
/// then print the symbol tree to `out`. A file that cannot be opened is
/// an I/O error before any scanning happens. A fatal syntax/semantic
/// error or any recovered lexical error fails the compilation with the
/// collected diagnostics; the tree is only printed on a clean pass.
pub fn compile(path: PathBuf, out: &mut dyn Write) -> Result<(), CompileError> {
    let mut file_manager = FileManager::default();
    let file = file_manager.open(path)?;

    let error_manager = ErrorManager::default();
    let result = parse(&error_manager, &file);
    match result {
        Ok(symtab) if !error_manager.has_errors() => {
            SymbolPrinter::new(&symtab).print(out)?;
            Ok(())
        }
        Ok(_) => Err(CompileError::Source(drain(error_manager, &file_manager))),
        Err(err) => {
            error_manager.report(err.pos, err.message);
            Err(CompileError::Source(drain(error_manager, &file_manager)))
        }
    }
}

fn drain(mut error_manager: ErrorManager, files: &FileManager) -> Vec<Diagnostic> {
    error_manager
        .take()
        .into_iter()
        .map(|err| Diagnostic {
            location: files.location(err.pos),
            message: err.message,
        })
        .collect()
}
