use std::collections::HashMap;

/// Trailing comments of a compilation unit, keyed by source line.
///
/// The lexer records every comment it skips. Later consumers claim a comment with
/// [`CommentTable::consume`], which hands it out at most once so the same comment is never
/// attached to two different nodes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommentTable {
    comments: HashMap<usize, String>,
}

impl CommentTable {
    pub fn new() -> CommentTable {
        CommentTable::default()
    }

    /// Record the comment of `line`, replacing any earlier one.
    pub fn record(&mut self, line: usize, text: &str) {
        self.comments.insert(line, text.to_owned());
    }

    /// Claim the comment of `line`. Returns `None` if there is none or it was already claimed.
    pub fn consume(&mut self, line: usize) -> Option<String> {
        self.comments.remove(&line)
    }

    pub fn peek(&self, line: usize) -> Option<&str> {
        self.comments.get(&line).map(String::as_str)
    }

    /// Forget all comments. Must be called before lexing the next compilation unit.
    pub fn reset(&mut self) {
        self.comments.clear();
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}
