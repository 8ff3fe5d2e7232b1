use std::fmt::Display;
use std::fs::read_to_string;
use std::path::PathBuf;

/// A position in the source, stored as a global byte offset. Line and
/// column are only computed when a diagnostic needs them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos(usize);

impl From<usize> for Pos {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl Pos {
    pub fn with_offset(&self, offset: usize) -> Self {
        Self(self.0 + offset)
    }
}

impl std::cmp::Ord for Pos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::cmp::PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.line, self.col)
    }
}

#[derive(Default)]
pub struct FileManager {
    file_offset: Vec<usize>,
    file_path: Vec<PathBuf>,
    lines: Vec<Vec<usize>>,
    last_offset: usize,
}

pub struct File {
    pub offset: Pos,
    pub text: String,
}

impl FileManager {
    pub fn open(&mut self, path: PathBuf) -> Result<File, std::io::Error> {
        let source_code = read_to_string(&path)?;
        Ok(self.add_file(path, source_code))
    }

    pub fn add_file(&mut self, path: PathBuf, source: String) -> File {
        let file_offset = self.last_offset;

        let mut lines = Vec::default();
        for (i, c) in source.char_indices() {
            if c == '\n' {
                lines.push(i);
            }
            self.last_offset += 1;
        }

        self.file_offset.push(file_offset);
        self.file_path.push(path);
        self.lines.push(lines);

        File {
            offset: Pos(file_offset),
            text: source,
        }
    }

    pub fn location(&self, pos: Pos) -> Location {
        let i = self.file_offset.partition_point(|x| *x <= pos.0) - 1;

        let file_offset = self.file_offset[i];
        let lines = &self.lines[i];

        let offset = pos.0 - file_offset;
        let line = lines.partition_point(|x| *x < offset) + 1;

        let col = if line == 1 {
            offset + 1
        } else {
            offset - lines[line - 2]
        };

        Location { line, col }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: Pos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Invalid,
    Eof,
    Ident,
    Number,
    Float,
    CharLit,
    StringLit,
    KwProgram,
    KwConst,
    KwType,
    KwVar,
    KwInteger,
    KwFloat,
    KwChar,
    KwString,
    KwArray,
    KwOf,
    KwFunction,
    KwProcedure,
    KwBegin,
    KwEnd,
    KwCall,
    KwIf,
    KwThen,
    KwElse,
    KwWhile,
    KwDo,
    KwFor,
    KwTo,
    Semicolon,
    Colon,
    Period,
    Comma,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Eq,
    NEq,
    Lt,
    LEq,
    Gt,
    GEq,
    Plus,
    Minus,
    Times,
    Slash,
    Percent,
    OpenBrac,
    CloseBrac,
    OpenSquare,
    CloseSquare,
    OpenSel,
    CloseSel,
}

impl TokenKind {
    /// Keyword table used by the scanner. Matching is case sensitive, so
    /// `BEGIN` is a keyword while `begin` is an ordinary identifier.
    pub(crate) fn from_keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "PROGRAM" => TokenKind::KwProgram,
            "CONST" => TokenKind::KwConst,
            "TYPE" => TokenKind::KwType,
            "VAR" => TokenKind::KwVar,
            "INTEGER" => TokenKind::KwInteger,
            "FLOAT" => TokenKind::KwFloat,
            "CHAR" => TokenKind::KwChar,
            "STRING" => TokenKind::KwString,
            "ARRAY" => TokenKind::KwArray,
            "OF" => TokenKind::KwOf,
            "FUNCTION" => TokenKind::KwFunction,
            "PROCEDURE" => TokenKind::KwProcedure,
            "BEGIN" => TokenKind::KwBegin,
            "END" => TokenKind::KwEnd,
            "CALL" => TokenKind::KwCall,
            "IF" => TokenKind::KwIf,
            "THEN" => TokenKind::KwThen,
            "ELSE" => TokenKind::KwElse,
            "WHILE" => TokenKind::KwWhile,
            "DO" => TokenKind::KwDo,
            "FOR" => TokenKind::KwFor,
            "TO" => TokenKind::KwTo,
            _ => return None,
        })
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => write!(f, "INVALID"),
            Self::Eof => write!(f, "EOF"),
            Self::Ident => write!(f, "IDENT"),
            Self::Number => write!(f, "NUMBER"),
            Self::Float => write!(f, "FLOAT_LIT"),
            Self::CharLit => write!(f, "CHAR_LIT"),
            Self::StringLit => write!(f, "STRING_LIT"),
            Self::KwProgram => write!(f, "'PROGRAM'"),
            Self::KwConst => write!(f, "'CONST'"),
            Self::KwType => write!(f, "'TYPE'"),
            Self::KwVar => write!(f, "'VAR'"),
            Self::KwInteger => write!(f, "'INTEGER'"),
            Self::KwFloat => write!(f, "'FLOAT'"),
            Self::KwChar => write!(f, "'CHAR'"),
            Self::KwString => write!(f, "'STRING'"),
            Self::KwArray => write!(f, "'ARRAY'"),
            Self::KwOf => write!(f, "'OF'"),
            Self::KwFunction => write!(f, "'FUNCTION'"),
            Self::KwProcedure => write!(f, "'PROCEDURE'"),
            Self::KwBegin => write!(f, "'BEGIN'"),
            Self::KwEnd => write!(f, "'END'"),
            Self::KwCall => write!(f, "'CALL'"),
            Self::KwIf => write!(f, "'IF'"),
            Self::KwThen => write!(f, "'THEN'"),
            Self::KwElse => write!(f, "'ELSE'"),
            Self::KwWhile => write!(f, "'WHILE'"),
            Self::KwDo => write!(f, "'DO'"),
            Self::KwFor => write!(f, "'FOR'"),
            Self::KwTo => write!(f, "'TO'"),
            Self::Semicolon => write!(f, "';'"),
            Self::Colon => write!(f, "':'"),
            Self::Period => write!(f, "'.'"),
            Self::Comma => write!(f, "','"),
            Self::Assign => write!(f, "':='"),
            Self::AddAssign => write!(f, "'+='"),
            Self::SubAssign => write!(f, "'-='"),
            Self::MulAssign => write!(f, "'*='"),
            Self::DivAssign => write!(f, "'/='"),
            Self::Eq => write!(f, "'='"),
            Self::NEq => write!(f, "'!='"),
            Self::Lt => write!(f, "'<'"),
            Self::LEq => write!(f, "'<='"),
            Self::Gt => write!(f, "'>'"),
            Self::GEq => write!(f, "'>='"),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Times => write!(f, "'*'"),
            Self::Slash => write!(f, "'/'"),
            Self::Percent => write!(f, "'%'"),
            Self::OpenBrac => write!(f, "'('"),
            Self::CloseBrac => write!(f, "')'"),
            Self::OpenSquare => write!(f, "'['"),
            Self::CloseSquare => write!(f, "']'"),
            Self::OpenSel => write!(f, "'(.'"),
            Self::CloseSel => write!(f, "'.)'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_location() {
        let mut file_manager = FileManager::default();
        let path = PathBuf::from("some_dummy_file");
        let file1 = file_manager.add_file(path, String::from("aaa\nbbb\nccc\n"));

        let cases = [
            (0, 1, 1),
            (1, 1, 2),
            (2, 1, 3),
            (3, 1, 4),
            (4, 2, 1),
            (5, 2, 2),
            (6, 2, 3),
            (7, 2, 4),
            (8, 3, 1),
            (9, 3, 2),
            (10, 3, 3),
            (11, 3, 4),
        ];
        for (offset, line, col) in cases {
            let loc = file_manager.location(file1.offset.with_offset(offset));
            assert_eq!((loc.line, loc.col), (line, col));
        }

        let path = PathBuf::from("other_file");
        let file2 = file_manager.add_file(path, String::from("some other\nfile"));

        let loc = file_manager.location(file2.offset.with_offset(1));
        assert_eq!((loc.line, loc.col), (1, 2));

        let loc = file_manager.location(file2.offset.with_offset(12));
        assert_eq!((loc.line, loc.col), (2, 2));

        let loc = file_manager.location(file1.offset.with_offset(4));
        assert_eq!((loc.line, loc.col), (2, 1));
    }

    #[test]
    fn test_location_format() {
        let mut file_manager = FileManager::default();
        let file = file_manager.add_file(PathBuf::from("dump"), String::from("a\nbc"));
        let loc = file_manager.location(file.offset.with_offset(3));
        assert_eq!(format!("{loc}"), "2-2");
    }

    #[test]
    fn test_keyword_table_is_case_sensitive() {
        assert_eq!(TokenKind::from_keyword("BEGIN"), Some(TokenKind::KwBegin));
        assert_eq!(TokenKind::from_keyword("begin"), None);
        assert_eq!(TokenKind::from_keyword("Begin"), None);
    }
}
