use thiserror::Error;

use self::source_position::SourcePosition;
use self::token::{Token, TokenKind};
use super::CommentTable;
use crate::ast::Mnemonic;

pub mod source_position;
pub mod token;

// Example input:
//
//   Start:
//       lda #$00        ; clear
//       sta PPU_CTRL
//       jsr InitScreen
//   Palette:
//       .db $0f,$30,%00010110,42
//
// ';' = comment, recorded per line, no token
// '.' = directive, `.db` and `.dw` are data markers
// '$' = hex constant, '%' = binary constant
// 'name:' = label, except the `z:`/`a:` addressing-mode prefixes of ca65 output

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LexerError {
    #[error("{position}: invalid character '{ch}'")]
    UnexpectedCharacter { ch: char, position: SourcePosition },
}

/// Dialect switches of the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerOptions {
    /// Drop the `z:` and `a:` zero-page/absolute prefixes that ca65 output places in front of
    /// operands instead of turning them into labels.
    pub strip_addressing_prefixes: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            strip_addressing_prefixes: true,
        }
    }
}

const ADDRESSING_PREFIXES: [&str; 2] = ["z", "a"];

/// Converts source text into tokens.
///
/// Comments do not become tokens; they are recorded in the [`CommentTable`] instead.
pub struct Lexer<'a> {
    input: Vec<char>,
    index: usize,                // Index of the current char
    ch: Option<char>,            // Current char under examination
    position: SourcePosition,    // Position of the current char
    options: LexerOptions,
    comments: &'a mut CommentTable,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &str, options: LexerOptions, comments: &'a mut CommentTable) -> Self {
        let input: Vec<char> = input.chars().collect();
        let ch = input.first().copied();
        Self {
            input,
            index: 0,
            ch,
            position: SourcePosition::default(),
            options,
            comments,
        }
    }

    fn read_char(&mut self) {
        if let Some(ch) = self.ch {
            self.position.advance(ch);
            self.index += 1;
        }
        self.ch = self.input.get(self.index).copied();
    }

    fn read_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.ch.filter(|ch| predicate(*ch)) {
            text.push(ch);
            self.read_char();
        }
        text
    }

    fn skip_whitespace(&mut self) {
        self.read_while(|ch| matches!(ch, ' ' | '\t' | '\r' | '\n'));
    }

    /// Read a comment up to, but not including, the newline. The text is kept verbatim.
    fn read_comment(&mut self) -> String {
        self.read_while(|ch| ch != '\n')
    }

    /// Read a prefix character followed by the characters accepted by `predicate`.
    fn read_prefixed(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        if let Some(ch) = self.ch {
            text.push(ch);
            self.read_char();
        }
        text.push_str(&self.read_while(predicate));
        text
    }

    /// Read a quoted string including its quotes. A backslash escapes the next character.
    fn read_string(&mut self) -> String {
        let mut text = String::new();
        let Some(quote) = self.ch else {
            return text;
        };
        text.push(quote);
        self.read_char();

        while let Some(ch) = self.ch {
            text.push(ch);
            self.read_char();
            if ch == quote {
                break;
            }
            if ch == '\\' {
                if let Some(escaped) = self.ch {
                    text.push(escaped);
                    self.read_char();
                }
            }
        }
        text
    }

    fn read_name(&mut self) -> String {
        self.read_while(|ch| ch.is_alphanumeric() || ch == '_')
    }

    fn name_kind(name: &str) -> TokenKind {
        match name {
            "x" => TokenKind::XReg,
            "y" => TokenKind::YReg,
            _ => match Mnemonic::from_lowercase(&name.to_lowercase()) {
                Some(mnemonic) => TokenKind::Instruction(mnemonic),
                None => TokenKind::Name,
            },
        }
    }

    /// Produce the next token. Once the input is exhausted every call returns an `Eof` token.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        loop {
            self.skip_whitespace();
            let start = self.position;

            let Some(ch) = self.ch else {
                return Ok(Token::new(TokenKind::Eof, "", start));
            };

            let token = match ch {
                ';' => {
                    let comment = self.read_comment();
                    self.comments.record(start.line, &comment);
                    continue;
                }
                '.' => {
                    let directive = self.read_while(|ch| ch.is_alphabetic() || ch == '.');
                    let kind = match directive.as_str() {
                        ".db" => TokenKind::DataBytes,
                        ".dw" => TokenKind::DataWords,
                        _ => TokenKind::Directive,
                    };
                    Token::new(kind, &directive, start)
                }
                '$' => Token::new(
                    TokenKind::HexConst,
                    &self.read_prefixed(|ch| ch.is_ascii_hexdigit()),
                    start,
                ),
                '%' => Token::new(
                    TokenKind::BinConst,
                    &self.read_prefixed(|ch| ch == '0' || ch == '1'),
                    start,
                ),
                '"' | '\'' => Token::new(TokenKind::Name, &self.read_string(), start),
                '0'..='9' => Token::new(
                    TokenKind::DecConst,
                    &self.read_while(|ch| ch.is_ascii_digit()),
                    start,
                ),
                _ if ch.is_alphabetic() || ch == '_' => {
                    let name = self.read_name();
                    if self.ch == Some(':') {
                        self.read_char();
                        if self.options.strip_addressing_prefixes
                            && ADDRESSING_PREFIXES.contains(&name.as_str())
                        {
                            tracing::trace!("{}: dropped addressing prefix '{}:'", start, name);
                            continue;
                        }
                        Token::new(TokenKind::Label, &format!("{}:", name), start)
                    } else {
                        Token::new(Self::name_kind(&name), &name, start)
                    }
                }
                _ => match TokenKind::from_punctuation(ch) {
                    Some(kind) => {
                        self.read_char();
                        Token::new(kind, &ch.to_string(), start)
                    }
                    None => {
                        return Err(LexerError::UnexpectedCharacter {
                            ch,
                            position: start,
                        })
                    }
                },
            };

            return Ok(token);
        }
    }

    /// Lex the whole input. The returned tokens always end with a single `Eof` token.
    #[tracing::instrument(skip(self))]
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tracing::debug!(
            "lexed {} tokens, {} comments",
            tokens.len(),
            self.comments.len()
        );
        Ok(tokens)
    }
}
