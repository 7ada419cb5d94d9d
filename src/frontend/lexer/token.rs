use std::fmt;

use super::source_position::SourcePosition;
use crate::ast::Mnemonic;

/// TokenKind defines the lexical categories found in source code.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum TokenKind {
    /// Eof marks the end of input
    #[default]
    Eof,
    /// Any `.directive` other than the data markers
    Directive,
    /// Identifier, or a quoted string which is passed through as an opaque name
    Name,
    /// Identifier immediately followed by `:`, e.g. `Start:`
    Label,
    /// `.db`
    DataBytes,
    /// `.dw`
    DataWords,
    /// `$` followed by hex digits
    HexConst,
    /// `%` followed by binary digits
    BinConst,
    /// Decimal number
    DecConst,
    /// Instruction mnemonic
    Instruction(Mnemonic),
    /// `=`
    Equals,
    /// `,`
    Comma,
    /// `#`
    Hash,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `(`
    ParenLeft,
    /// `)`
    ParenRight,
    /// `:` not attached to a name
    Colon,
    /// `x` index register
    XReg,
    /// `y` index register
    YReg,
}

impl TokenKind {
    /// The kind of a single punctuation character, if it is one.
    pub fn from_punctuation(ch: char) -> Option<TokenKind> {
        Some(match ch {
            '=' => TokenKind::Equals,
            ',' => TokenKind::Comma,
            '#' => TokenKind::Hash,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '(' => TokenKind::ParenLeft,
            ')' => TokenKind::ParenRight,
            ':' => TokenKind::Colon,
            _ => return None,
        })
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            TokenKind::HexConst | TokenKind::BinConst | TokenKind::DecConst
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Directive => write!(f, "directive"),
            TokenKind::Name => write!(f, "name"),
            TokenKind::Label => write!(f, "label"),
            TokenKind::DataBytes => write!(f, "'.db'"),
            TokenKind::DataWords => write!(f, "'.dw'"),
            TokenKind::HexConst => write!(f, "hex constant"),
            TokenKind::BinConst => write!(f, "binary constant"),
            TokenKind::DecConst => write!(f, "decimal constant"),
            TokenKind::Instruction(mnemonic) => write!(f, "instruction {}", mnemonic),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Hash => write!(f, "'#'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Less => write!(f, "'<'"),
            TokenKind::Greater => write!(f, "'>'"),
            TokenKind::ParenLeft => write!(f, "'('"),
            TokenKind::ParenRight => write!(f, "')'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::XReg => write!(f, "register x"),
            TokenKind::YReg => write!(f, "register y"),
        }
    }
}

/// Token is a lexical unit of source code.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token exactly as written, e.g. `"lda"`, `"$1F"`, `"Start:"`
    pub text: String,
    /// Where the first character of the token is found
    pub position: SourcePosition,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, position: SourcePosition) -> Self {
        Self {
            kind,
            text: text.to_owned(),
            position,
        }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "{}: {}", self.position, self.kind),
            _ => write!(f, "{}: {} '{}'", self.position, self.kind, self.text),
        }
    }
}
