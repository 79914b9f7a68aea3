//! Character cursor over template text.

use fpath_ir::Span;

use crate::syntax::Ident;

/// Byte-offset cursor. Positions always sit on a `char` boundary.
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    pub fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consume characters while `pred` holds and return them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    pub fn text_since(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }

    pub fn span_from(&self, start: usize) -> Span {
        Span::from_range(start..self.pos)
    }

    /// Span of the next character, or an empty span at end of input.
    pub fn here(&self) -> Span {
        let len = self.peek().map_or(0, char::len_utf8);
        Span::from_range(self.pos..self.pos + len)
    }

    /// Description of the next character for diagnostics.
    pub fn found(&self) -> String {
        match self.peek() {
            Some(c) => format!("`{c}`"),
            None => "end of input".to_owned(),
        }
    }

    pub fn at_ident_start(&self) -> bool {
        self.peek().is_some_and(|c| c.is_alphabetic() || c == '_')
    }

    pub fn ident(&mut self) -> Option<Ident> {
        if !self.at_ident_start() {
            return None;
        }
        let start = self.pos;
        let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
        Some(Ident { name: name.to_owned(), span: self.span_from(start) })
    }

    /// Whether the next word is exactly `word`.
    pub fn at_keyword(&self, word: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(word)
            && !rest[word.len()..].chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
    }
}
