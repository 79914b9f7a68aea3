//! Parser for fpath templates.
//!
//! Turns template text into a [`Template`]: literal text segments and
//! expression syntax trees, each carrying byte spans into the source.
//! Parsing never looks at the input type; name resolution happens later.
//!
//! ```text
//! Hello, ${user.name | user.login ?? "anonymous"}!
//! ${order.total * 100 as long} ${tags.{first, ",", second}}
//! ```

mod cursor;
mod error;
mod grammar;
mod syntax;

pub use error::{ParseError, ParseErrorKind};
pub use grammar::MAX_NESTING;
pub use syntax::{
    Arg, Cast, Chain, Expr, Head, Ident, JoinItem, Key, Literal, LiteralKind, Math, Segment, Step,
    Template,
};

/// Parse a complete template.
pub fn parse(template: &str) -> Result<Template, ParseError> {
    grammar::Parser::new(template).template()
}
