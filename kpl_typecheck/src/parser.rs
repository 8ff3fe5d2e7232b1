use crate::errors;
use crate::object::{Object, ObjectId, ObjectKind, ParamMode};
use crate::scope::SymbolTable;
use crate::ty::{check_numeric, check_type_equality, Type};
use crate::value::ConstantValue;
use kpl_syntax::{Error, ErrorReporter, File, Number, Scanner, Token, TokenKind};

/// Parses one source file, building the symbol table and type checking
/// every construct as it is recognized. The first syntax or semantic
/// error aborts the parse; lexical errors were already recovered inside
/// the scanner and only show up in the error reporter.
pub fn parse(errors: &impl ErrorReporter, file: &File) -> Result<SymbolTable, Error> {
    let mut parser = Parser::new(errors, file);
    parser.parse_program()?;
    Ok(parser.symtab)
}

/// Predictive recursive descent with one token of lookahead. `current`
/// is the token most recently consumed, `lookahead` the one that decides
/// which rule applies next; no other token is ever live.
pub(crate) struct Parser<'a, E> {
    scanner: Scanner<'a, E>,
    pub(crate) current: Token,
    pub(crate) lookahead: Token,
    pub(crate) symtab: SymbolTable,
}

impl<'a, E: ErrorReporter> Parser<'a, E> {
    fn new(errors: &'a E, file: &'a File) -> Self {
        let mut scanner = Scanner::new(errors, file);
        let lookahead = scanner.next_valid_token();
        Self {
            scanner,
            current: Token {
                kind: TokenKind::Eof,
                value: String::new(),
                pos: file.offset,
            },
            lookahead,
            symtab: SymbolTable::new(),
        }
    }

    pub(crate) fn advance(&mut self) {
        let next = self.scanner.next_valid_token();
        self.current = std::mem::replace(&mut self.lookahead, next);
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Result<(), Error> {
        if self.lookahead.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(errors::unexpected(
                self.lookahead.pos,
                kind,
                self.lookahead.kind,
            ))
        }
    }

    fn parse_program(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwProgram)?;
        self.eat(TokenKind::Ident)?;

        let program = self.symtab.create_program(self.current.value.clone());
        if let Some(scope) = self.symtab.scope_of(program) {
            self.symtab.enter_scope(scope);
        }

        self.eat(TokenKind::Semicolon)?;
        self.parse_block()?;
        self.eat(TokenKind::Period)?;

        self.symtab.exit_scope();
        Ok(())
    }

    fn parse_block(&mut self) -> Result<(), Error> {
        if self.lookahead.kind == TokenKind::KwConst {
            self.eat(TokenKind::KwConst)?;
            loop {
                self.eat(TokenKind::Ident)?;
                let name = self.current.value.clone();
                self.check_fresh_ident()?;
                self.eat(TokenKind::Eq)?;
                let value = self.parse_constant()?;
                let object = self.symtab.alloc(Object::constant(name, value));
                self.symtab.declare(object);
                self.eat(TokenKind::Semicolon)?;
                if self.lookahead.kind != TokenKind::Ident {
                    break;
                }
            }
        }

        if self.lookahead.kind == TokenKind::KwType {
            self.eat(TokenKind::KwType)?;
            loop {
                self.eat(TokenKind::Ident)?;
                let name = self.current.value.clone();
                self.check_fresh_ident()?;
                self.eat(TokenKind::Eq)?;
                // The declared name binds the *resolved* structural type,
                // so later lookups never chase a name.
                let ty = self.parse_type()?;
                let object = self.symtab.alloc(Object::type_def(name, ty));
                self.symtab.declare(object);
                self.eat(TokenKind::Semicolon)?;
                if self.lookahead.kind != TokenKind::Ident {
                    break;
                }
            }
        }

        if self.lookahead.kind == TokenKind::KwVar {
            self.eat(TokenKind::KwVar)?;
            loop {
                self.eat(TokenKind::Ident)?;
                let name = self.current.value.clone();
                self.check_fresh_ident()?;
                self.eat(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                let object = self.symtab.alloc(Object::variable(name, ty));
                self.symtab.declare(object);
                self.eat(TokenKind::Semicolon)?;
                if self.lookahead.kind != TokenKind::Ident {
                    break;
                }
            }
        }

        self.parse_sub_decls()?;

        self.eat(TokenKind::KwBegin)?;
        self.parse_statements()?;
        self.eat(TokenKind::KwEnd)?;
        Ok(())
    }

    fn parse_sub_decls(&mut self) -> Result<(), Error> {
        loop {
            match self.lookahead.kind {
                TokenKind::KwFunction => self.parse_func_decl()?,
                TokenKind::KwProcedure => self.parse_proc_decl()?,
                _ => return Ok(()),
            }
        }
    }

    /// A subroutine's name lives in the enclosing scope; its parameters
    /// and body live in its own.
    fn parse_func_decl(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwFunction)?;
        self.eat(TokenKind::Ident)?;
        self.check_fresh_ident()?;

        let func = self.symtab.create_function(self.current.value.clone());
        self.symtab.declare(func);
        if let Some(scope) = self.symtab.scope_of(func) {
            self.symtab.enter_scope(scope);
        }

        self.parse_params(func)?;
        self.eat(TokenKind::Colon)?;
        let return_type = self.parse_basic_type()?;
        self.symtab.set_return_type(func, return_type);
        self.eat(TokenKind::Semicolon)?;
        self.parse_block()?;
        self.eat(TokenKind::Semicolon)?;

        self.symtab.exit_scope();
        Ok(())
    }

    fn parse_proc_decl(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwProcedure)?;
        self.eat(TokenKind::Ident)?;
        self.check_fresh_ident()?;

        let proc = self.symtab.create_procedure(self.current.value.clone());
        self.symtab.declare(proc);
        if let Some(scope) = self.symtab.scope_of(proc) {
            self.symtab.enter_scope(scope);
        }

        self.parse_params(proc)?;
        self.eat(TokenKind::Semicolon)?;
        self.parse_block()?;
        self.eat(TokenKind::Semicolon)?;

        self.symtab.exit_scope();
        Ok(())
    }

    fn parse_params(&mut self, owner: ObjectId) -> Result<(), Error> {
        if self.lookahead.kind != TokenKind::OpenBrac {
            return Ok(());
        }
        self.eat(TokenKind::OpenBrac)?;
        self.parse_param(owner)?;
        while self.lookahead.kind == TokenKind::Semicolon {
            self.eat(TokenKind::Semicolon)?;
            self.parse_param(owner)?;
        }
        self.eat(TokenKind::CloseBrac)
    }

    fn parse_param(&mut self, owner: ObjectId) -> Result<(), Error> {
        let mode = match self.lookahead.kind {
            TokenKind::Ident => ParamMode::Value,
            TokenKind::KwVar => {
                self.eat(TokenKind::KwVar)?;
                ParamMode::Reference
            }
            _ => {
                return Err(errors::unexpected(
                    self.lookahead.pos,
                    "parameter",
                    self.lookahead.kind,
                ))
            }
        };

        self.eat(TokenKind::Ident)?;
        let name = self.current.value.clone();
        self.check_fresh_ident()?;
        self.eat(TokenKind::Colon)?;
        let ty = self.parse_basic_type()?;

        let param = self.symtab.alloc(Object::parameter(name, ty, mode));
        self.symtab.declare(param);
        self.symtab.push_param(owner, param);
        Ok(())
    }

    fn parse_constant(&mut self) -> Result<ConstantValue, Error> {
        match self.lookahead.kind {
            TokenKind::Plus => {
                self.eat(TokenKind::Plus)?;
                self.parse_numeric_constant()
            }
            TokenKind::Minus => {
                self.eat(TokenKind::Minus)?;
                Ok(self.parse_numeric_constant()?.negated())
            }
            TokenKind::CharLit => {
                self.eat(TokenKind::CharLit)?;
                Ok(ConstantValue::Char(
                    self.current.value.chars().next().unwrap_or('\0'),
                ))
            }
            _ => self.parse_numeric_constant(),
        }
    }

    /// The operand of a signed constant, and the default constant form:
    /// a numeric literal or a reference to a numeric constant.
    fn parse_numeric_constant(&mut self) -> Result<ConstantValue, Error> {
        match self.lookahead.kind {
            TokenKind::Number => {
                self.eat(TokenKind::Number)?;
                Ok(ConstantValue::Int(self.int_value()?))
            }
            TokenKind::Float => {
                self.eat(TokenKind::Float)?;
                Ok(ConstantValue::Float(
                    Number::parse(&self.current.value).to_f64(),
                ))
            }
            TokenKind::Ident => {
                self.eat(TokenKind::Ident)?;
                let value = self.check_declared_constant()?;
                if value.is_numeric() {
                    Ok(value)
                } else {
                    Err(errors::not_an_int_constant(
                        self.current.pos,
                        &self.current.value,
                    ))
                }
            }
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                "constant",
                self.lookahead.kind,
            )),
        }
    }

    pub(crate) fn int_value(&self) -> Result<i64, Error> {
        let number = Number::parse(&self.current.value);
        i64::try_from(&number).map_err(|_| {
            errors::int_literal_out_of_range(self.current.pos, &self.current.value)
        })
    }

    fn parse_type(&mut self) -> Result<Type, Error> {
        match self.lookahead.kind {
            TokenKind::KwInteger => {
                self.eat(TokenKind::KwInteger)?;
                Ok(Type::Int)
            }
            TokenKind::KwFloat => {
                self.eat(TokenKind::KwFloat)?;
                Ok(Type::Float)
            }
            TokenKind::KwChar => {
                self.eat(TokenKind::KwChar)?;
                Ok(Type::Char)
            }
            TokenKind::KwString => {
                self.eat(TokenKind::KwString)?;
                Ok(Type::String)
            }
            TokenKind::KwArray => {
                self.eat(TokenKind::KwArray)?;
                self.eat_index_open()?;
                self.eat(TokenKind::Number)?;
                let size = self.int_value()?;
                self.eat_index_close()?;
                self.eat(TokenKind::KwOf)?;
                let element = self.parse_type()?;
                Ok(Type::array(size, element))
            }
            TokenKind::Ident => {
                self.eat(TokenKind::Ident)?;
                self.check_declared_type()
            }
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                "type",
                self.lookahead.kind,
            )),
        }
    }

    fn parse_basic_type(&mut self) -> Result<Type, Error> {
        match self.lookahead.kind {
            TokenKind::KwInteger => {
                self.eat(TokenKind::KwInteger)?;
                Ok(Type::Int)
            }
            TokenKind::KwFloat => {
                self.eat(TokenKind::KwFloat)?;
                Ok(Type::Float)
            }
            TokenKind::KwChar => {
                self.eat(TokenKind::KwChar)?;
                Ok(Type::Char)
            }
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                "basic type",
                self.lookahead.kind,
            )),
        }
    }

    /// `[` and `]` have the digraph spellings `(.` and `.)`; both open
    /// an array bound or an index.
    pub(crate) fn eat_index_open(&mut self) -> Result<(), Error> {
        match self.lookahead.kind {
            TokenKind::OpenSquare | TokenKind::OpenSel => {
                self.advance();
                Ok(())
            }
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                TokenKind::OpenSquare,
                self.lookahead.kind,
            )),
        }
    }

    pub(crate) fn eat_index_close(&mut self) -> Result<(), Error> {
        match self.lookahead.kind {
            TokenKind::CloseSquare | TokenKind::CloseSel => {
                self.advance();
                Ok(())
            }
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                TokenKind::CloseSquare,
                self.lookahead.kind,
            )),
        }
    }

    fn parse_statements(&mut self) -> Result<(), Error> {
        self.parse_statement()?;
        while self.lookahead.kind == TokenKind::Semicolon {
            self.eat(TokenKind::Semicolon)?;
            self.parse_statement()?;
        }
        Ok(())
    }

    fn parse_statement(&mut self) -> Result<(), Error> {
        match self.lookahead.kind {
            TokenKind::Ident => self.parse_assignment(),
            TokenKind::KwCall => self.parse_call_statement(),
            TokenKind::KwBegin => self.parse_group_statement(),
            TokenKind::KwIf => self.parse_if_statement(),
            TokenKind::KwWhile => self.parse_while_statement(),
            TokenKind::KwFor => self.parse_for_statement(),
            // The empty statement: legal exactly where a statement may
            // be followed by one of these.
            TokenKind::Semicolon | TokenKind::KwEnd | TokenKind::KwElse => Ok(()),
            _ => Err(errors::unexpected(
                self.lookahead.pos,
                "statement",
                self.lookahead.kind,
            )),
        }
    }

    fn parse_assignment(&mut self) -> Result<(), Error> {
        let lvalue = self.parse_lvalue()?;

        match self.lookahead.kind {
            TokenKind::AddAssign
            | TokenKind::SubAssign
            | TokenKind::MulAssign
            | TokenKind::DivAssign => {
                if lvalue == Type::String {
                    return Err(errors::string_compound_assignment(self.lookahead.pos));
                }
                self.advance();
            }
            _ => self.eat(TokenKind::Assign)?,
        }

        let rhs = self.parse_expression()?;
        check_type_equality(self.current.pos, &lvalue, &rhs)
    }

    fn parse_call_statement(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwCall)?;
        self.eat(TokenKind::Ident)?;
        let name = self.current.value.clone();
        let params = self.check_declared_procedure()?;
        self.parse_arguments(&name, &params)
    }

    fn parse_group_statement(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwBegin)?;
        self.parse_statements()?;
        self.eat(TokenKind::KwEnd)
    }

    fn parse_if_statement(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwIf)?;
        self.parse_condition()?;
        self.eat(TokenKind::KwThen)?;
        self.parse_statement()?;
        if self.lookahead.kind == TokenKind::KwElse {
            self.eat(TokenKind::KwElse)?;
            self.parse_statement()?;
        }
        Ok(())
    }

    fn parse_while_statement(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwWhile)?;
        self.parse_condition()?;
        self.eat(TokenKind::KwDo)?;
        self.parse_statement()
    }

    fn parse_for_statement(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::KwFor)?;
        self.eat(TokenKind::Ident)?;

        let ty = self.check_declared_variable()?;
        check_numeric(self.current.pos, &ty)?;
        self.eat(TokenKind::Assign)?;
        let from = self.parse_expression()?;
        check_type_equality(self.current.pos, &ty, &from)?;
        self.eat(TokenKind::KwTo)?;
        let to = self.parse_expression()?;
        check_type_equality(self.current.pos, &ty, &to)?;
        self.eat(TokenKind::KwDo)?;
        self.parse_statement()
    }

    // Name resolution helpers. `current` holds the identifier token the
    // caller just consumed.

    pub(crate) fn check_fresh_ident(&self) -> Result<(), Error> {
        if self.symtab.declared_in_current(&self.current.value) {
            Err(errors::redeclared_symbol(
                self.current.pos,
                &self.current.value,
            ))
        } else {
            Ok(())
        }
    }

    pub(crate) fn check_declared_ident(&self) -> Result<ObjectId, Error> {
        self.symtab
            .lookup(&self.current.value)
            .ok_or_else(|| errors::undeclared_symbol(self.current.pos, &self.current.value))
    }

    /// Referencing a constant hands out a copy of its value; mutating
    /// one binding can never reach another.
    fn check_declared_constant(&self) -> Result<ConstantValue, Error> {
        let id = self.check_declared_ident()?;
        match &self.symtab.object(id).kind {
            ObjectKind::Constant(value) => Ok(value.clone()),
            _ => Err(errors::not_a_constant(
                self.current.pos,
                &self.current.value,
            )),
        }
    }

    fn check_declared_type(&self) -> Result<Type, Error> {
        let id = self.check_declared_ident()?;
        match &self.symtab.object(id).kind {
            ObjectKind::TypeDef(ty) => Ok(ty.clone()),
            _ => Err(errors::not_a_type(self.current.pos, &self.current.value)),
        }
    }

    fn check_declared_variable(&self) -> Result<Type, Error> {
        let id = self.check_declared_ident()?;
        match &self.symtab.object(id).kind {
            ObjectKind::Variable(ty) => Ok(ty.clone()),
            _ => Err(errors::not_a_variable(
                self.current.pos,
                &self.current.value,
            )),
        }
    }

    fn check_declared_procedure(&self) -> Result<Vec<(Type, ParamMode)>, Error> {
        let id = self.check_declared_ident()?;
        match &self.symtab.object(id).kind {
            ObjectKind::Procedure { params, .. } => Ok(params
                .iter()
                .filter_map(|param| self.symtab.parameter_info(*param))
                .collect()),
            _ => Err(errors::not_a_procedure(
                self.current.pos,
                &self.current.value,
            )),
        }
    }
}
