use kpl_syntax::{Error, Pos};
use std::fmt::Display;

// Syntax and semantic errors are fatal: the parser threads them out of
// every rule with `?` and the first one ends the pass. Only the compile
// boundary turns them into process-visible behavior.

pub(crate) fn unexpected(pos: Pos, expected: impl Display, found: impl Display) -> Error {
    Error::new(pos, format!("Expected {expected}, but found {found}"))
}

pub(crate) fn redeclared_symbol(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is redeclared"))
}

pub(crate) fn undeclared_symbol(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is not declared yet"))
}

pub(crate) fn not_a_constant(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is not a constant"))
}

pub(crate) fn not_a_type(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is not a type"))
}

pub(crate) fn not_a_variable(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is not a variable"))
}

pub(crate) fn not_a_procedure(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is not a procedure"))
}

pub(crate) fn not_a_value(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is not a value"))
}

pub(crate) fn not_assignable(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} cannot be assigned to"))
}

pub(crate) fn not_an_int_constant(pos: Pos, name: &str) -> Error {
    Error::new(pos, format!("Symbol {name} is not a numeric constant"))
}

pub(crate) fn type_mismatch(pos: Pos, expected: impl Display, got: impl Display) -> Error {
    Error::new(pos, format!("Cannot use {got} for type {expected}"))
}

pub(crate) fn not_numeric(pos: Pos, ty: impl Display) -> Error {
    Error::new(pos, format!("Cannot perform arithmetic operation on {ty}"))
}

pub(crate) fn modulo_on_non_integer(pos: Pos, ty: impl Display) -> Error {
    Error::new(pos, format!("Cannot perform '%' operation on {ty}"))
}

pub(crate) fn not_indexable(pos: Pos, ty: impl Display) -> Error {
    Error::new(pos, format!("Cannot index into {ty}"))
}

pub(crate) fn string_compound_assignment(pos: Pos) -> Error {
    Error::new(
        pos,
        String::from("Cannot use compound assignment on a string"),
    )
}

pub(crate) fn argument_count_mismatch(pos: Pos, name: &str) -> Error {
    Error::new(
        pos,
        format!("Arguments of {name} do not match its parameter list"),
    )
}

pub(crate) fn reference_needs_lvalue(pos: Pos) -> Error {
    Error::new(
        pos,
        String::from("Expression cannot be passed by reference"),
    )
}

pub(crate) fn int_literal_out_of_range(pos: Pos, raw: &str) -> Error {
    Error::new(pos, format!("Integer literal {raw} is out of range"))
}
