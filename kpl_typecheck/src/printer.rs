use crate::object::{ObjectId, ObjectKind, ParamMode};
use crate::scope::{ScopeId, SymbolTable};
use std::io::{self, Write};

/// Renders the symbol tree after a successful pass: one line per
/// declared object with its kind-specific attributes, indented two
/// spaces per nesting depth.
pub struct SymbolPrinter<'a> {
    symtab: &'a SymbolTable,
}

impl<'a> SymbolPrinter<'a> {
    pub fn new(symtab: &'a SymbolTable) -> Self {
        Self { symtab }
    }

    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        if let Some(program) = self.symtab.program() {
            self.print_object(out, program, 0)?;
        }
        Ok(())
    }

    fn print_object(&self, out: &mut dyn Write, id: ObjectId, depth: usize) -> io::Result<()> {
        let pad = "  ".repeat(depth);
        let object = self.symtab.object(id);
        let name = &object.name;

        match &object.kind {
            ObjectKind::Constant(value) => writeln!(out, "{pad}const {name} = {value}"),
            ObjectKind::TypeDef(ty) => writeln!(out, "{pad}type {name} = {ty}"),
            ObjectKind::Variable(ty) => writeln!(out, "{pad}var {name}: {ty}"),
            ObjectKind::Parameter { ty, mode } => match mode {
                ParamMode::Value => writeln!(out, "{pad}param {name}: {ty}"),
                ParamMode::Reference => writeln!(out, "{pad}param var {name}: {ty}"),
            },
            ObjectKind::Function {
                return_type, scope, ..
            } => {
                match return_type {
                    Some(ty) => writeln!(out, "{pad}function {name}: {ty}")?,
                    None => writeln!(out, "{pad}function {name}")?,
                }
                self.print_scope(out, *scope, depth + 1)
            }
            ObjectKind::Procedure { scope, .. } => {
                writeln!(out, "{pad}procedure {name}")?;
                self.print_scope(out, *scope, depth + 1)
            }
            ObjectKind::Program { scope } => {
                writeln!(out, "{pad}program {name}")?;
                self.print_scope(out, *scope, depth + 1)
            }
        }
    }

    fn print_scope(&self, out: &mut dyn Write, scope: ScopeId, depth: usize) -> io::Result<()> {
        let objects: Vec<ObjectId> = self.symtab.scope(scope).objects().collect();
        for id in objects {
            self.print_object(out, id, depth)?;
        }
        Ok(())
    }
}
