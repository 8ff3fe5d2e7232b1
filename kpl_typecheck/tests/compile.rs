use kpl_typecheck::{compile, CompileError};
use std::path::PathBuf;

#[test]
fn test_missing_file_is_an_io_error() {
    let mut out = Vec::new();
    let result = compile(PathBuf::from("no_such_file.kpl"), &mut out);
    assert!(matches!(result, Err(CompileError::Io(..))));
    assert!(out.is_empty());
}

#[test]
fn test_compile_dumps_symbol_tree() {
    let path = std::env::temp_dir().join("kpl_compile_ok.kpl");
    std::fs::write(&path, "PROGRAM tiny;\nVAR a: INTEGER;\nBEGIN\na := 1\nEND.\n")
        .expect("temp file is writable");

    let mut out = Vec::new();
    let result = compile(path.clone(), &mut out);
    std::fs::remove_file(&path).ok();

    assert!(result.is_ok());
    let dump = String::from_utf8(out).expect("dump is valid utf-8");
    assert_eq!(dump, "program tiny\n  var a: integer\n");
}

#[test]
fn test_compile_reports_single_fatal_diagnostic() {
    let path = std::env::temp_dir().join("kpl_compile_err.kpl");
    std::fs::write(&path, "PROGRAM broken;\nBEGIN\nx := 1\nEND.\n")
        .expect("temp file is writable");

    let mut out = Vec::new();
    let result = compile(path.clone(), &mut out);
    std::fs::remove_file(&path).ok();

    let Err(CompileError::Source(diagnostics)) = result else {
        panic!("expected a source error");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        format!("{}", diagnostics[0]),
        "3-1: Symbol x is not declared yet"
    );
    assert!(out.is_empty());
}
