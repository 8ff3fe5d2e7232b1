use crate::errors;
use crate::object::{ObjectId, ObjectKind, ParamMode};
use crate::parser::Parser;
use crate::ty::{check_modulo, check_numeric, check_type_equality, Type};
use kpl_syntax::{Error, ErrorReporter, Pos, TokenKind};

/// Tokens that may legally follow a complete expression. Seeing one of
/// these ends the additive chain; anything else is a malformed
/// expression.
fn follows_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::KwTo
            | TokenKind::KwDo
            | TokenKind::CloseBrac
            | TokenKind::Comma
            | TokenKind::Eq
            | TokenKind::NEq
            | TokenKind::LEq
            | TokenKind::Lt
            | TokenKind::GEq
            | TokenKind::Gt
            | TokenKind::CloseSel
            | TokenKind::CloseSquare
            | TokenKind::Semicolon
            | TokenKind::KwEnd
            | TokenKind::KwElse
            | TokenKind::KwThen
    )
}

fn follows_term(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Percent | TokenKind::Plus | TokenKind::Minus
    ) || follows_expression(kind)
}

fn follows_arguments(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Times | TokenKind::Slash) || follows_term(kind)
}

/// What an identifier in an expression resolved to; borrowed data is
/// cloned out of the symbol table before any sub-expression parsing
/// mutates the parser again.
enum Resolved {
    Value(Type),
    IndexedArray(Type),
    Call {
        params: Vec<ObjectId>,
        return_type: Option<Type>,
    },
}

impl<'a, E: ErrorReporter> Parser<'a, E> {
    /// Expression := [`+` | `-`] Term { (`+` | `-` | `%`) Term }.
    /// The expression's type is its first term's; each operand is
    /// checked on its own.
    pub(crate) fn parse_expression(&mut self) -> Result<Type, Error> {
        match self.lookahead.kind {
            TokenKind::Plus | TokenKind::Minus => {
                self.advance();
                let ty = self.parse_expression2()?;
                check_numeric(self.current.pos, &ty)?;
                Ok(ty)
            }
            _ => self.parse_expression2(),
        }
    }

    fn parse_expression2(&mut self) -> Result<Type, Error> {
        let ty = self.parse_term()?;
        self.parse_expression_tail()?;
        Ok(ty)
    }

    fn parse_expression_tail(&mut self) -> Result<(), Error> {
        loop {
            match self.lookahead.kind {
                TokenKind::Plus | TokenKind::Minus => {
                    self.advance();
                    let ty = self.parse_term()?;
                    check_numeric(self.current.pos, &ty)?;
                }
                // `%` sits at the additive level, not the multiplicative
                // one, and only takes integers.
                TokenKind::Percent => {
                    self.advance();
                    let ty = self.parse_term()?;
                    check_modulo(self.current.pos, &ty)?;
                }
                kind if follows_expression(kind) => return Ok(()),
                _ => {
                    return Err(errors::unexpected(
                        self.lookahead.pos,
                        "expression",
                        self.lookahead.kind,
                    ))
                }
            }
        }
    }

    fn parse_term(&mut self) -> Result<Type, Error> {
        let ty = self.parse_factor()?;
        self.parse_term_tail()?;
        Ok(ty)
    }

    fn parse_term_tail(&mut self) -> Result<(), Error> {
        loop {
            match self.lookahead.kind {
                TokenKind::Times | TokenKind::Slash => {
                    self.advance();
                    let ty = self.parse_factor()?;
                    check_numeric(self.current.pos, &ty)?;
                }
                kind if follows_term(kind) => return Ok(()),
                _ => {
                    return Err(errors::unexpected(
                        self.lookahead.pos,
                        "term",
                        self.lookahead.kind,
                    ))
                }
            }
        }
    }

    fn parse_factor(&mut self) -> Result<Type, Error> {
        match self.lookahead.kind {
            TokenKind::Number => {
                self.eat(TokenKind::Number)?;
                Ok(Type::Int)
            }
            TokenKind::Float => {
                self.eat(TokenKind::Float)?;
                Ok(Type::Float)
            }
            TokenKind::CharLit => {
                self.eat(TokenKind::CharLit)?;
                Ok(Type::Char)
            }
            TokenKind::StringLit => {
                self.eat(TokenKind::StringLit)?;
                Ok(Type::String)
            }
            TokenKind::Ident => {
                self.eat(TokenKind::Ident)?;
                let name = self.current.value.clone();
                let pos = self.current.pos;
                let id = self.check_declared_ident()?;

                let resolved = match &self.symtab.object(id).kind {
                    ObjectKind::Constant(value) => Resolved::Value(value.ty()),
                    ObjectKind::Variable(ty @ Type::Array { .. }) => {
                        Resolved::IndexedArray(ty.clone())
                    }
                    ObjectKind::Variable(ty) => Resolved::Value(ty.clone()),
                    ObjectKind::Parameter { ty, .. } => Resolved::Value(ty.clone()),
                    ObjectKind::Function {
                        params,
                        return_type,
                        ..
                    } => Resolved::Call {
                        params: params.clone(),
                        return_type: return_type.clone(),
                    },
                    _ => return Err(errors::not_a_value(pos, &name)),
                };

                match resolved {
                    Resolved::Value(ty) => Ok(ty),
                    Resolved::IndexedArray(ty) => self.parse_indexes(ty),
                    Resolved::Call {
                        params,
                        return_type,
                    } => {
                        let params: Vec<(Type, ParamMode)> = params
                            .iter()
                            .filter_map(|param| self.symtab.parameter_info(*param))
                            .collect();
                        self.parse_arguments(&name, &params)?;
                        return_type.ok_or_else(|| errors::not_a_value(pos, &name))
                    }
                }
            }
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                "expression",
                self.lookahead.kind,
            )),
        }
    }

    /// Walks an index chain, descending one array dimension per index.
    /// Each index expression must be numeric; indexing anything that is
    /// not (or no longer) an array is a dimensionality error.
    pub(crate) fn parse_indexes(&mut self, mut ty: Type) -> Result<Type, Error> {
        while matches!(
            self.lookahead.kind,
            TokenKind::OpenSquare | TokenKind::OpenSel
        ) {
            let element = match ty {
                Type::Array { element, .. } => element,
                other => return Err(errors::not_indexable(self.lookahead.pos, &other)),
            };
            self.eat_index_open()?;
            let index = self.parse_expression()?;
            check_numeric(self.current.pos, &index)?;
            self.eat_index_close()?;
            ty = *element;
        }
        Ok(ty)
    }

    /// An lvalue: a variable (possibly indexed), a parameter, or the
    /// current function's name standing for its return slot.
    pub(crate) fn parse_lvalue(&mut self) -> Result<Type, Error> {
        self.eat(TokenKind::Ident)?;
        let name = self.current.value.clone();
        let pos = self.current.pos;
        let id = self.check_lvalue_ident(&name, pos)?;

        let resolved = match &self.symtab.object(id).kind {
            ObjectKind::Variable(ty @ (Type::Array { .. } | Type::String)) => {
                Resolved::IndexedArray(ty.clone())
            }
            ObjectKind::Variable(ty) => Resolved::Value(ty.clone()),
            ObjectKind::Parameter { ty, .. } => Resolved::Value(ty.clone()),
            ObjectKind::Function { return_type, .. } => match return_type {
                Some(ty) => Resolved::Value(ty.clone()),
                None => return Err(errors::not_assignable(pos, &name)),
            },
            _ => return Err(errors::not_assignable(pos, &name)),
        };

        match resolved {
            Resolved::Value(ty) => Ok(ty),
            Resolved::IndexedArray(ty) => self.parse_indexes(ty),
            Resolved::Call { .. } => Err(errors::not_assignable(pos, &name)),
        }
    }

    /// Resolves `name` and checks it can stand on the left of an
    /// assignment or be passed by reference. A function name qualifies
    /// only inside that function's own body.
    pub(crate) fn check_lvalue_ident(&self, name: &str, pos: Pos) -> Result<ObjectId, Error> {
        let Some(id) = self.symtab.lookup(name) else {
            return Err(errors::undeclared_symbol(pos, name));
        };
        match &self.symtab.object(id).kind {
            ObjectKind::Variable(..) | ObjectKind::Parameter { .. } => Ok(id),
            ObjectKind::Function { .. } => {
                let owner = self
                    .symtab
                    .current_scope()
                    .and_then(|scope| self.symtab.scope(scope).owner);
                if owner == Some(id) {
                    Ok(id)
                } else {
                    Err(errors::not_assignable(pos, name))
                }
            }
            _ => Err(errors::not_assignable(pos, name)),
        }
    }

    /// Condition := Expression relop Expression; both sides must have
    /// the same type.
    pub(crate) fn parse_condition(&mut self) -> Result<(), Error> {
        let left = self.parse_expression()?;
        match self.lookahead.kind {
            TokenKind::Eq
            | TokenKind::NEq
            | TokenKind::LEq
            | TokenKind::Lt
            | TokenKind::GEq
            | TokenKind::Gt => self.advance(),
            _ => {
                return Err(errors::unexpected(
                    self.lookahead.pos,
                    "comparison operator",
                    self.lookahead.kind,
                ))
            }
        }
        let right = self.parse_expression()?;
        check_type_equality(self.current.pos, &left, &right)
    }

    /// Positional argument list for a call. Too few or too many
    /// arguments, and a non-lvalue where a reference parameter expects
    /// one, are all rejected here.
    pub(crate) fn parse_arguments(
        &mut self,
        name: &str,
        params: &[(Type, ParamMode)],
    ) -> Result<(), Error> {
        match self.lookahead.kind {
            TokenKind::OpenBrac => {
                let mut remaining = params.iter();
                let Some(first) = remaining.next() else {
                    return Err(errors::argument_count_mismatch(self.current.pos, name));
                };
                self.eat(TokenKind::OpenBrac)?;
                self.parse_argument(first)?;
                while self.lookahead.kind == TokenKind::Comma {
                    self.eat(TokenKind::Comma)?;
                    match remaining.next() {
                        Some(param) => self.parse_argument(param)?,
                        None => {
                            return Err(errors::argument_count_mismatch(
                                self.current.pos,
                                name,
                            ))
                        }
                    }
                }
                if remaining.next().is_some() {
                    return Err(errors::argument_count_mismatch(self.current.pos, name));
                }
                self.eat(TokenKind::CloseBrac)
            }
            // No argument list at all: fine for a parameterless callee
            // when the lookahead may legally follow a call.
            kind if follows_arguments(kind) => {
                if params.is_empty() {
                    Ok(())
                } else {
                    Err(errors::argument_count_mismatch(self.current.pos, name))
                }
            }
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                "arguments",
                self.lookahead.kind,
            )),
        }
    }

    fn parse_argument(&mut self, param: &(Type, ParamMode)) -> Result<(), Error> {
        let (param_ty, mode) = param;
        if *mode == ParamMode::Reference {
            // The argument must be a bare lvalue identifier; checked
            // before the expression consumes it.
            if self.lookahead.kind == TokenKind::Ident {
                let name = self.lookahead.value.clone();
                self.check_lvalue_ident(&name, self.lookahead.pos)?;
            } else {
                return Err(errors::reference_needs_lvalue(self.lookahead.pos));
            }
        }
        let arg_ty = self.parse_expression()?;
        check_type_equality(self.current.pos, param_ty, &arg_ty)
    }
}
