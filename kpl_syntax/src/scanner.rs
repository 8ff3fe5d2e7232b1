use crate::char_class::{char_class, CharClass};
use crate::error::ErrorReporter;
use crate::token::{File, Pos, Token, TokenKind};

pub const MAX_IDENT_LEN: usize = 15;
pub const MAX_STRING_LEN: usize = 255;

/// Scans a whole file into a token vector, ending with the EOF token.
/// The parser doesn't use this; it pulls tokens one at a time.
pub fn scan(errors: &impl ErrorReporter, file: &File) -> Vec<Token> {
    let mut scanner = Scanner::new(errors, file);
    let mut tokens = Vec::default();
    loop {
        let token = scanner.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

pub struct Scanner<'a, Error> {
    errors: &'a Error,
    file_offset: Pos,
    text: &'a str,
    offset: usize,
}

impl<'a, Error: ErrorReporter> Scanner<'a, Error> {
    pub fn new(errors: &'a Error, file: &'a File) -> Self {
        Self {
            errors,
            file_offset: file.offset,
            text: &file.text,
            offset: 0,
        }
    }

    /// Returns the next token, advancing past it. Never fails: lexical
    /// errors are reported and the offending lexeme becomes an `Invalid`
    /// token. At end of input every call returns the EOF token.
    pub fn next_token(&mut self) -> Token {
        self.skip_blank();

        let Some((c, pos)) = self.peek() else {
            return self.make_token(TokenKind::Eof, String::new(), self.get_pos());
        };

        match char_class(c) {
            CharClass::Letter => self.read_ident_or_keyword(),
            CharClass::Digit => self.read_number(),
            CharClass::SingleQuote => self.read_char_lit(),
            CharClass::DoubleQuote => self.read_string_lit(),
            CharClass::Space => unreachable!("blanks were skipped"),
            _ => {
                self.next();
                self.read_symbol(c, pos)
            }
        }
    }

    /// The parser-facing wrapper: skips `Invalid` tokens so a bad lexeme
    /// costs one diagnostic and nothing else.
    pub fn next_valid_token(&mut self) -> Token {
        loop {
            let token = self.next_token();
            if token.kind != TokenKind::Invalid {
                return token;
            }
        }
    }

    fn skip_blank(&mut self) {
        while let Some((c, _)) = self.peek() {
            if char_class(c) == CharClass::Space {
                self.next();
            } else {
                break;
            }
        }
    }

    /// Inside `(* ... *)`. State 0 is the default, state 1 means the last
    /// character was `*`, state 2 is reached after `*)`.
    fn skip_comment(&mut self, start: Pos) {
        let mut state = 0;
        while state < 2 {
            let Some((c, _)) = self.next() else {
                self.errors.unterminated_comment(start);
                return;
            };
            state = match char_class(c) {
                CharClass::Times => 1,
                CharClass::CloseBrac if state == 1 => 2,
                _ => 0,
            };
        }
    }

    fn read_ident_or_keyword(&mut self) -> Token {
        let (c, pos) = self.next().expect("caller peeked a letter");
        let mut value = String::from(c);

        let ident_char = |c: char| {
            matches!(char_class(c), CharClass::Letter | CharClass::Digit)
        };
        while let Some((c, _)) = self.next_if(ident_char) {
            value.push(c);
        }

        if value.len() > MAX_IDENT_LEN {
            self.errors.ident_too_long(pos);
            return self.make_token(TokenKind::Invalid, value, pos);
        }

        let kind = TokenKind::from_keyword(&value).unwrap_or(TokenKind::Ident);
        self.make_token(kind, value, pos)
    }

    /// A maximal run of digits and periods. One period makes the token a
    /// float; a second one invalidates it, but the run is still consumed
    /// to its end so `1.2.3` is one bad token, not two.
    fn read_number(&mut self) -> Token {
        let (c, pos) = self.next().expect("caller peeked a digit");
        let mut value = String::from(c);
        let mut dots = 0;

        let number_char = |c: char| {
            matches!(char_class(c), CharClass::Digit | CharClass::Period)
        };
        while let Some((c, _)) = self.next_if(number_char) {
            if char_class(c) == CharClass::Period {
                dots += 1;
            }
            value.push(c);
        }

        if dots > 1 {
            self.errors.invalid_symbol(pos, &value);
            return self.make_token(TokenKind::Invalid, value, pos);
        }

        let kind = if dots == 0 {
            TokenKind::Number
        } else {
            TokenKind::Float
        };
        self.make_token(kind, value, pos)
    }

    fn read_char_lit(&mut self) -> Token {
        let (_, pos) = self.next().expect("caller peeked a quote");

        let Some((c, _)) = self.next() else {
            self.errors.invalid_char_constant(pos);
            return self.make_token(TokenKind::Invalid, String::new(), pos);
        };

        match self.next_if(|c| char_class(c) == CharClass::SingleQuote) {
            Some(_) => self.make_token(TokenKind::CharLit, String::from(c), pos),
            None => {
                self.errors.invalid_char_constant(pos);
                self.make_token(TokenKind::Invalid, String::from(c), pos)
            }
        }
    }

    fn read_string_lit(&mut self) -> Token {
        let (_, pos) = self.next().expect("caller peeked a quote");

        if self.peek().is_none() {
            self.errors.invalid_constant(pos);
            return self.make_token(TokenKind::Invalid, String::new(), pos);
        }

        let mut value = String::new();
        loop {
            let Some((c, _)) = self.peek() else {
                self.errors.unterminated_string(pos);
                return self.make_token(TokenKind::Invalid, value, pos);
            };

            match char_class(c) {
                CharClass::DoubleQuote => {
                    self.next();
                    return self.make_token(TokenKind::StringLit, value, pos);
                }
                // A statement separator or line break inside a string
                // means the closing quote was forgotten.
                CharClass::Semicolon => {
                    self.errors.unterminated_string(pos);
                    return self.make_token(TokenKind::Invalid, value, pos);
                }
                _ if c == '\n' => {
                    self.errors.unterminated_string(pos);
                    return self.make_token(TokenKind::Invalid, value, pos);
                }
                _ => {
                    self.next();
                    value.push(c);
                    if value.len() > MAX_STRING_LEN {
                        self.errors.string_too_long(pos);
                        return self.make_token(TokenKind::Invalid, value, pos);
                    }
                }
            }
        }
    }

    /// `c` has already been consumed. Two-character symbols peek exactly
    /// one character further and either extend the token or leave the
    /// peeked character for the next call.
    fn read_symbol(&mut self, c: char, pos: Pos) -> Token {
        let kind = match char_class(c) {
            CharClass::Comma => TokenKind::Comma,
            CharClass::Semicolon => TokenKind::Semicolon,
            CharClass::CloseBrac => TokenKind::CloseBrac,
            CharClass::OpenSquare => TokenKind::OpenSquare,
            CharClass::CloseSquare => TokenKind::CloseSquare,
            CharClass::Percent => TokenKind::Percent,
            CharClass::Equal => TokenKind::Eq,
            CharClass::Plus => self.extend_with_equal(TokenKind::Plus, TokenKind::AddAssign),
            CharClass::Minus => self.extend_with_equal(TokenKind::Minus, TokenKind::SubAssign),
            CharClass::Times => self.extend_with_equal(TokenKind::Times, TokenKind::MulAssign),
            CharClass::Slash => self.extend_with_equal(TokenKind::Slash, TokenKind::DivAssign),
            CharClass::Lt => self.extend_with_equal(TokenKind::Lt, TokenKind::LEq),
            CharClass::Gt => self.extend_with_equal(TokenKind::Gt, TokenKind::GEq),
            CharClass::Colon => self.extend_with_equal(TokenKind::Colon, TokenKind::Assign),
            CharClass::Period => {
                if self.next_if(|c| char_class(c) == CharClass::CloseBrac).is_some() {
                    TokenKind::CloseSel
                } else {
                    TokenKind::Period
                }
            }
            CharClass::Exclamation => {
                if self.next_if(|c| char_class(c) == CharClass::Equal).is_some() {
                    TokenKind::NEq
                } else {
                    self.errors.invalid_symbol(pos, "!");
                    return self.make_token(TokenKind::Invalid, String::from(c), pos);
                }
            }
            CharClass::OpenBrac => {
                if self.next_if(|c| char_class(c) == CharClass::Period).is_some() {
                    TokenKind::OpenSel
                } else if self.next_if(|c| char_class(c) == CharClass::Times).is_some() {
                    self.skip_comment(pos);
                    return self.next_token();
                } else {
                    TokenKind::OpenBrac
                }
            }
            _ => {
                self.errors.invalid_symbol(pos, &String::from(c));
                return self.make_token(TokenKind::Invalid, String::from(c), pos);
            }
        };

        let value = format!("{kind}").trim_matches('\'').to_string();
        self.make_token(kind, value, pos)
    }

    fn extend_with_equal(&mut self, short: TokenKind, long: TokenKind) -> TokenKind {
        if self.next_if(|c| char_class(c) == CharClass::Equal).is_some() {
            long
        } else {
            short
        }
    }

    fn make_token(&self, kind: TokenKind, value: String, pos: Pos) -> Token {
        Token { kind, value, pos }
    }

    fn next_if(&mut self, func: impl FnOnce(char) -> bool) -> Option<(char, Pos)> {
        let ch = self.peek()?.0;
        if func(ch) {
            self.next()
        } else {
            None
        }
    }

    fn next(&mut self) -> Option<(char, Pos)> {
        let c = self.text.chars().next()?;
        let len = c.len_utf8();
        self.text = &self.text[len..];
        let pos = self.get_pos();
        self.offset += len;
        Some((c, pos))
    }

    fn get_pos(&self) -> Pos {
        self.file_offset.with_offset(self.offset)
    }

    fn peek(&self) -> Option<(char, Pos)> {
        let c = self.text.chars().next()?;
        let pos = self.get_pos();
        Some((c, pos))
    }
}

trait ScanningError: ErrorReporter {
    fn invalid_symbol(&self, pos: Pos, lexeme: &str) {
        self.report(pos, format!("Invalid symbol '{lexeme}'"));
    }

    fn unterminated_comment(&self, pos: Pos) {
        self.report(pos, String::from("End of comment expected"));
    }

    fn ident_too_long(&self, pos: Pos) {
        self.report(
            pos,
            format!("Identifier longer than {MAX_IDENT_LEN} characters"),
        );
    }

    fn invalid_char_constant(&self, pos: Pos) {
        self.report(pos, String::from("Invalid char constant"));
    }

    fn invalid_constant(&self, pos: Pos) {
        self.report(pos, String::from("Invalid constant"));
    }

    fn unterminated_string(&self, pos: Pos) {
        self.report(pos, String::from("Missing closing quote in string literal"));
    }

    fn string_too_long(&self, pos: Pos) {
        self.report(
            pos,
            format!("String literal longer than {MAX_STRING_LEN} characters"),
        );
    }
}

impl<T> ScanningError for T where T: ErrorReporter {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorManager;
    use crate::token::FileManager;
    use std::path::PathBuf;

    fn scan_source(source: &str) -> (Vec<Token>, Vec<crate::error::Error>) {
        let mut files = FileManager::default();
        let file = files.add_file(PathBuf::from("dummy.kpl"), source.to_string());
        let mut error_manager = ErrorManager::default();
        let tokens = scan(&error_manager, &file);
        (tokens, error_manager.take())
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_idents() {
        let (tokens, errors) = scan_source("PROGRAM example1; BEGIN END.");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::KwProgram,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::KwBegin,
                TokenKind::KwEnd,
                TokenKind::Period,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[1].value, "example1");
        assert!(errors.is_empty());
    }

    #[test]
    fn keyword_match_is_case_sensitive() {
        let (tokens, errors) = scan_source("begin Begin BEGIN");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::KwBegin,
                TokenKind::Eof,
            ]
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn number_literals() {
        let (tokens, errors) = scan_source("123 12.34");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Number, TokenKind::Float, TokenKind::Eof]
        );
        assert_eq!(tokens[0].value, "123");
        assert_eq!(tokens[1].value, "12.34");
        assert!(errors.is_empty());
    }

    #[test]
    fn number_with_two_dots_is_one_invalid_token() {
        let (tokens, errors) = scan_source("1.2.3 99");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Invalid, TokenKind::Number, TokenKind::Eof]
        );
        assert_eq!(tokens[0].value, "1.2.3");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid symbol '1.2.3'");
    }

    #[test]
    fn comment_is_skipped() {
        let (tokens, errors) = scan_source("a (* anything (* even stars * ) *) b");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
        assert_eq!(tokens[1].value, "b");
        assert!(errors.is_empty());
    }

    #[test]
    fn unterminated_comment() {
        let (tokens, errors) = scan_source("a (* unterminated");
        assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "End of comment expected");
    }

    #[test]
    fn identifier_too_long() {
        let (tokens, errors) = scan_source("abcdefghijklmnop x");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Invalid, TokenKind::Ident, TokenKind::Eof]
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Identifier longer than 15 characters");
    }

    #[test]
    fn char_literals() {
        let (tokens, errors) = scan_source("'a' 'b");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::CharLit, TokenKind::Invalid, TokenKind::Eof]
        );
        assert_eq!(tokens[0].value, "a");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid char constant");
    }

    #[test]
    fn string_literals() {
        let (tokens, errors) = scan_source("\"hello world\"");
        assert_eq!(kinds(&tokens), vec![TokenKind::StringLit, TokenKind::Eof]);
        assert_eq!(tokens[0].value, "hello world");
        assert!(errors.is_empty());
    }

    #[test]
    fn string_hitting_semicolon_is_unterminated() {
        let (tokens, errors) = scan_source("\"oops; BEGIN");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Invalid,
                TokenKind::Semicolon,
                TokenKind::KwBegin,
                TokenKind::Eof,
            ]
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Missing closing quote in string literal");
    }

    #[test]
    fn string_hitting_newline_is_unterminated() {
        let (tokens, errors) = scan_source("\"oops\nBEGIN");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Invalid, TokenKind::KwBegin, TokenKind::Eof]
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Missing closing quote in string literal");
    }

    #[test]
    fn string_too_long() {
        let source = format!("\"{}", "a".repeat(MAX_STRING_LEN + 1));
        let (tokens, errors) = scan_source(&source);
        assert_eq!(kinds(&tokens), vec![TokenKind::Invalid, TokenKind::Eof]);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "String literal longer than 255 characters"
        );
    }

    #[test]
    fn symbols() {
        let (tokens, errors) =
            scan_source(", ; ) [ ] % = + - * / < > : . += -= *= /= <= >= := != (. .) (");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::CloseBrac,
                TokenKind::OpenSquare,
                TokenKind::CloseSquare,
                TokenKind::Percent,
                TokenKind::Eq,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Times,
                TokenKind::Slash,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Colon,
                TokenKind::Period,
                TokenKind::AddAssign,
                TokenKind::SubAssign,
                TokenKind::MulAssign,
                TokenKind::DivAssign,
                TokenKind::LEq,
                TokenKind::GEq,
                TokenKind::Assign,
                TokenKind::NEq,
                TokenKind::OpenSel,
                TokenKind::CloseSel,
                TokenKind::OpenBrac,
                TokenKind::Eof,
            ]
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn symbol_pair_without_spaces() {
        // The scanner commits the peeked character to the next token.
        let (tokens, errors) = scan_source("a:=b");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn bare_exclamation_is_invalid() {
        let (tokens, errors) = scan_source("! !=");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Invalid, TokenKind::NEq, TokenKind::Eof]
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid symbol '!'");
    }

    #[test]
    fn unknown_character() {
        let (tokens, errors) = scan_source("#");
        assert_eq!(kinds(&tokens), vec![TokenKind::Invalid, TokenKind::Eof]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid symbol '#'");
    }

    #[test]
    fn next_valid_token_skips_invalid() {
        let mut files = FileManager::default();
        let file = files.add_file(PathBuf::from("dummy.kpl"), "# ! 42".to_string());
        let error_manager = ErrorManager::default();
        let mut scanner = Scanner::new(&error_manager, &file);

        let token = scanner.next_valid_token();
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.value, "42");
        assert_eq!(scanner.next_valid_token().kind, TokenKind::Eof);
        assert!(error_manager.has_errors());
    }
}
