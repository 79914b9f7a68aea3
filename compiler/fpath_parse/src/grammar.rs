//! Recursive descent over template text.
//!
//! ```text
//! template    := (text | "$$" | "${" expr "}")*
//! expr        := alternation ("??" default)?
//! alternation := chain ("|" chain)*
//! chain       := head step* math? cast?
//! head        := ident | ident "(" args? ")" | "[" key "]"
//! step        := "." ident | "." ident "()" | "[" key "]" | "." "{" item ("," item)* "}"
//! item        := quoted | expr
//! math        := ("+" | "-" | "*" | "/" | "%") number
//! cast        := "as" ("byte" | "short" | "int" | "long" | "float" | "double" | "string")
//! default     := quoted | number | "true" | "false" | "$" ident
//! arg         := quoted | number | "true" | "false" | chain
//! key         := quoted | characters up to "]"
//! ```

use fpath_ir::{ensure_sufficient_stack, MathOp, Number, Span, Ty};
use tracing::trace;

use crate::cursor::Cursor;
use crate::syntax::{
    Arg, Cast, Chain, Expr, Head, JoinItem, Key, Literal, LiteralKind, Math, Segment, Step,
    Template,
};
use crate::{ParseError, ParseErrorKind};

type Result<T> = std::result::Result<T, ParseError>;

/// Deepest allowed nesting of paths inside function arguments and joins.
pub const MAX_NESTING: usize = 128;

pub(crate) struct Parser<'a> {
    cur: Cursor<'a>,
    /// Chains currently being parsed.
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Parser { cur: Cursor::new(src), depth: 0 }
    }

    fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError::new(kind, span)
    }

    fn expected(&self, expected: &'static str) -> ParseError {
        self.error(ParseErrorKind::Expected { expected, found: self.cur.found() }, self.cur.here())
    }

    pub(crate) fn template(mut self) -> Result<Template> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut text_start = 0;

        while let Some(c) = self.cur.peek() {
            if c == '$' {
                match self.cur.peek_nth(1) {
                    Some('$') => {
                        self.cur.eat_str("$$");
                        text.push('$');
                        continue;
                    }
                    Some('{') => {
                        let open = self.cur.pos();
                        if !text.is_empty() {
                            segments.push(Segment::Text {
                                text: std::mem::take(&mut text),
                                span: Span::from_range(text_start..open),
                            });
                        }
                        self.cur.eat_str("${");
                        let expr = self.expression_body(open)?;
                        segments.push(Segment::Expr(expr));
                        text_start = self.cur.pos();
                        continue;
                    }
                    _ => {}
                }
            }
            text.push(c);
            self.cur.bump();
        }

        if !text.is_empty() {
            segments.push(Segment::Text { text, span: self.cur.span_from(text_start) });
        }
        Ok(Template { segments })
    }

    /// Everything after `${` up to and including the closing `}`.
    fn expression_body(&mut self, open: usize) -> Result<Expr> {
        self.cur.skip_ws();
        if self.cur.at_end() {
            let span = self.cur.span_from(open);
            return Err(self.error(ParseErrorKind::UnterminatedExpression, span));
        }
        if self.cur.eat('}') {
            return Err(self.error(ParseErrorKind::EmptyExpression, self.cur.span_from(open)));
        }

        let expr = self.expr()?;
        self.cur.skip_ws();
        if self.cur.eat('}') {
            return Ok(expr);
        }
        if self.cur.at_end() {
            let span = self.cur.span_from(open);
            return Err(self.error(ParseErrorKind::UnterminatedExpression, span));
        }
        Err(self.expected("`}`"))
    }

    fn expr(&mut self) -> Result<Expr> {
        let start = self.cur.pos();
        trace!(pos = start, "expr");

        let mut alternatives = vec![self.chain()?];
        loop {
            self.cur.skip_ws();
            if self.cur.peek() == Some('|') {
                self.cur.bump();
                self.cur.skip_ws();
                alternatives.push(self.chain()?);
            } else {
                break;
            }
        }

        let default = if self.cur.eat_str("??") {
            self.cur.skip_ws();
            Some(self.default_literal()?)
        } else {
            None
        };

        Ok(Expr { alternatives, default, span: self.cur.span_from(start) })
    }

    fn chain(&mut self) -> Result<Chain> {
        if self.depth == MAX_NESTING {
            let kind = ParseErrorKind::TooDeep { max: MAX_NESTING };
            return Err(self.error(kind, self.cur.here()));
        }
        self.depth += 1;
        let chain = ensure_sufficient_stack(|| self.chain_inner());
        self.depth -= 1;
        chain
    }

    fn chain_inner(&mut self) -> Result<Chain> {
        let start = self.cur.pos();
        let head = self.head()?;
        trace!(pos = start, ?head, "chain");

        let mut steps = Vec::new();
        loop {
            let step_start = self.cur.pos();
            let step = if self.cur.eat('.') {
                if self.cur.peek() == Some('{') {
                    let items = self.join_items()?;
                    Step::Join { items, span: self.cur.span_from(step_start) }
                } else {
                    let name =
                        self.cur.ident().ok_or_else(|| self.expected("member name after `.`"))?;
                    if self.cur.eat('(') {
                        self.cur.skip_ws();
                        if !self.cur.eat(')') {
                            return Err(self.expected("`)` (methods take no arguments)"));
                        }
                        Step::Call(name)
                    } else {
                        Step::Member(name)
                    }
                }
            } else if self.cur.peek() == Some('[') {
                Step::Key(self.key()?)
            } else {
                break;
            };

            if matches!(steps.last(), Some(Step::Join { .. })) {
                return Err(self.error(ParseErrorKind::JoinNotLast, self.cur.span_from(step_start)));
            }
            steps.push(step);
        }
        let joined = matches!(steps.last(), Some(Step::Join { .. }));

        self.cur.skip_ws();
        let math = match self.cur.peek().and_then(MathOp::from_symbol) {
            Some(op) => {
                let op_start = self.cur.pos();
                self.cur.bump();
                self.cur.skip_ws();
                let operand = self.number()?;
                let span = self.cur.span_from(op_start);
                if joined {
                    return Err(self.error(ParseErrorKind::JoinNotLast, span));
                }
                Some(Math { op, operand, span })
            }
            None => None,
        };

        self.cur.skip_ws();
        let cast = if self.cur.at_keyword("as") {
            let cast_start = self.cur.pos();
            self.cur.eat_str("as");
            self.cur.skip_ws();
            let target = self.cur.ident().ok_or_else(|| self.expected("cast target type"))?;
            let to = cast_target(&target.name).ok_or_else(|| {
                self.error(ParseErrorKind::UnknownCastType(target.name.clone()), target.span)
            })?;
            let span = self.cur.span_from(cast_start);
            if joined {
                return Err(self.error(ParseErrorKind::JoinNotLast, span));
            }
            Some(Cast { to, span })
        } else {
            None
        };

        Ok(Chain { head, steps, math, cast, span: self.cur.span_from(start) })
    }

    fn head(&mut self) -> Result<Head> {
        if self.cur.peek() == Some('[') {
            return self.key().map(Head::Key);
        }
        let name = self.cur.ident().ok_or_else(|| self.expected("field, method or function name"))?;
        if self.cur.eat('(') {
            let args = self.args()?;
            return Ok(Head::Call { name, args });
        }
        Ok(Head::Name(name))
    }

    /// Arguments after `(`, including the closing `)`.
    fn args(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        self.cur.skip_ws();
        if self.cur.eat(')') {
            return Ok(args);
        }
        loop {
            args.push(self.arg()?);
            self.cur.skip_ws();
            if self.cur.eat(',') {
                self.cur.skip_ws();
            } else if self.cur.eat(')') {
                return Ok(args);
            } else {
                return Err(self.expected("`,` or `)`"));
            }
        }
    }

    fn arg(&mut self) -> Result<Arg> {
        if self.at_quote() || self.at_number() {
            return self.literal().map(Arg::Literal);
        }
        if let Some(b) = self.bool_word() {
            let start = self.cur.pos();
            self.cur.eat_str(if b { "true" } else { "false" });
            return Ok(Arg::Literal(Literal {
                kind: LiteralKind::Bool(b),
                span: self.cur.span_from(start),
            }));
        }
        self.chain().map(Arg::Path)
    }

    /// `true`/`false` as a standalone word, not the start of a path.
    fn bool_word(&self) -> Option<bool> {
        let value = if self.cur.at_keyword("true") {
            true
        } else if self.cur.at_keyword("false") {
            false
        } else {
            return None;
        };
        let len = if value { 4 } else { 5 };
        match self.cur.peek_nth(len) {
            Some('.' | '(' | '[') => None,
            _ => Some(value),
        }
    }

    fn default_literal(&mut self) -> Result<Literal> {
        let start = self.cur.pos();
        if self.cur.eat('$') {
            let name = self.cur.ident().ok_or_else(|| self.expected("parameter name after `$`"))?;
            let span = self.cur.span_from(start);
            return Ok(Literal { kind: LiteralKind::Param(name.name), span });
        }
        if let Some(b) = self.bool_word() {
            self.cur.eat_str(if b { "true" } else { "false" });
            return Ok(Literal { kind: LiteralKind::Bool(b), span: self.cur.span_from(start) });
        }
        if self.at_quote() || self.at_number() {
            return self.literal();
        }
        Err(self.expected("default value"))
    }

    /// Quoted string or number.
    fn literal(&mut self) -> Result<Literal> {
        let start = self.cur.pos();
        let kind = if self.at_quote() {
            LiteralKind::Str(self.string()?)
        } else {
            LiteralKind::Number(self.number()?)
        };
        Ok(Literal { kind, span: self.cur.span_from(start) })
    }

    fn at_quote(&self) -> bool {
        matches!(self.cur.peek(), Some('"' | '\''))
    }

    fn at_number(&self) -> bool {
        match self.cur.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('-' | '+') => self.cur.peek_nth(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn string(&mut self) -> Result<String> {
        let start = self.cur.pos();
        let quote = self.cur.bump().unwrap_or('"');
        let mut out = String::new();
        loop {
            match self.cur.bump() {
                None => {
                    let span = self.cur.span_from(start);
                    return Err(self.error(ParseErrorKind::UnterminatedString, span));
                }
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.cur.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '"' | '\'')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => {
                        let span = self.cur.span_from(start);
                        return Err(self.error(ParseErrorKind::UnterminatedString, span));
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Number> {
        let start = self.cur.pos();
        if !self.at_number() {
            return Err(self.expected("number"));
        }
        if !self.cur.eat('-') {
            self.cur.eat('+');
        }
        self.cur.take_while(|c| c.is_ascii_digit());
        let mut float = false;
        if self.cur.peek() == Some('.')
            && self.cur.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            float = true;
            self.cur.bump();
            self.cur.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.cur.peek(), Some('e' | 'E')) {
            float = true;
            self.cur.bump();
            if !self.cur.eat('-') {
                self.cur.eat('+');
            }
            self.cur.take_while(|c| c.is_ascii_digit());
        }

        let span = self.cur.span_from(start);
        let text = self.cur.text_since(start).to_owned();
        let parsed = if float {
            text.parse::<f64>().ok().map(Number::Float)
        } else {
            text.parse::<i64>().ok().map(Number::Int)
        };
        parsed.ok_or_else(|| self.error(ParseErrorKind::InvalidNumber(text), span))
    }

    fn key(&mut self) -> Result<Key> {
        let open = self.cur.pos();
        self.cur.bump();
        self.cur.skip_ws();

        let key = if self.at_quote() {
            let s = self.string()?;
            self.cur.skip_ws();
            s
        } else {
            let bare = self.cur.take_while(|c| c != ']');
            bare.trim().to_owned()
        };

        if self.cur.eat(']') {
            if key.is_empty() {
                return Err(self.error(
                    ParseErrorKind::Expected { expected: "map key", found: "`]`".to_owned() },
                    self.cur.span_from(open),
                ));
            }
            return Ok(Key { key, span: self.cur.span_from(open) });
        }
        if self.cur.at_end() {
            return Err(self.error(ParseErrorKind::UnterminatedKey, self.cur.span_from(open)));
        }
        Err(self.expected("`]`"))
    }

    /// `{item, ...}` after the `.` of a join step.
    fn join_items(&mut self) -> Result<Vec<JoinItem>> {
        self.cur.bump();
        let mut items = Vec::new();
        loop {
            self.cur.skip_ws();
            if self.at_quote() {
                let start = self.cur.pos();
                let text = self.string()?;
                items.push(JoinItem::Text { text, span: self.cur.span_from(start) });
            } else if self.cur.at_ident_start() || self.cur.peek() == Some('[') {
                items.push(JoinItem::Expr(self.expr()?));
            } else {
                return Err(self.expected("join item"));
            }

            self.cur.skip_ws();
            if self.cur.eat(',') {
                continue;
            }
            if self.cur.eat('}') {
                return Ok(items);
            }
            return Err(self.expected("`,` or `}`"));
        }
    }
}

fn cast_target(name: &str) -> Option<Ty> {
    Some(match name {
        "byte" => Ty::Byte,
        "short" => Ty::Short,
        "int" => Ty::Int,
        "long" => Ty::Long,
        "float" => Ty::Float,
        "double" => Ty::Double,
        "string" => Ty::Str,
        _ => return None,
    })
}
