//! Driver errors.
//!
//! Every compile-time failure ends up as a [`CompileError`]: the template
//! plus one [`Diagnostic`] per problem, each tagged with the pipeline stage
//! that found it. Renders never fail.

use std::fmt::{self, Write};
use std::io;
use std::path::PathBuf;

use fpath_codegen::CodegenError;
use fpath_ir::Span;
use fpath_lower::LowerError;
use fpath_parse::ParseError;
use thiserror::Error;

/// Pipeline stage that reported a diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Parse,
    Resolve,
    Type,
    Generate,
    Link,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Resolve => "resolve",
            Stage::Type => "type",
            Stage::Generate => "generate",
            Stage::Link => "link",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
    /// Location in the template, when the problem has one.
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(stage: Stage, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic { stage, message: message.into(), span }
    }

    /// Render with the offending template line and a caret underline:
    ///
    /// ```text
    /// error[resolve]: `User` has no field or method `nmae`
    ///   |
    /// 1 | Hello ${nmae}!
    ///   |         ^^^^
    /// ```
    pub fn render(&self, source: &str) -> String {
        let mut out = format!("error[{}]: {}", self.stage, self.message);
        let Some(span) = self.span.filter(|s| !(s.is_empty() && s.start == 0)) else {
            return out;
        };

        let start = (span.start as usize).min(source.len());
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[start..].find('\n').map_or(source.len(), |i| start + i);
        let line_no = source[..line_start].matches('\n').count() + 1;
        let line = &source[line_start..line_end];

        let col = source[line_start..start].chars().count();
        let end = (span.end as usize).clamp(start, line_end);
        let width = source[start..end].chars().count().max(1);

        let gutter = line_no.to_string();
        let pad = " ".repeat(gutter.len());
        let _ = write!(
            out,
            "\n{pad} |\n{gutter} | {line}\n{pad} | {}{}",
            " ".repeat(col),
            "^".repeat(width)
        );
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} error at {span}: {}", self.stage, self.message),
            None => write!(f, "{} error: {}", self.stage, self.message),
        }
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic::new(Stage::Parse, err.kind.to_string(), Some(err.span))
    }
}

impl From<&LowerError> for Diagnostic {
    fn from(err: &LowerError) -> Self {
        let stage = match err {
            LowerError::Resolve(_) => Stage::Resolve,
            LowerError::Type(_) => Stage::Type,
        };
        Diagnostic::new(stage, err.to_string(), Some(err.span()))
    }
}

impl From<&CodegenError> for Diagnostic {
    fn from(err: &CodegenError) -> Self {
        Diagnostic::new(Stage::Generate, err.to_string(), Some(err.span()))
    }
}

/// A template that failed to compile. Nothing is cached for it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("failed to compile `{template}`: {}", summary(.diagnostics))]
pub struct CompileError {
    pub template: String,
    pub diagnostics: Vec<Diagnostic>,
}

fn summary(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => String::from("unknown error"),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

impl CompileError {
    pub fn new(template: &str, diagnostics: Vec<Diagnostic>) -> Self {
        CompileError { template: template.to_owned(), diagnostics }
    }

    pub fn single(template: &str, diagnostic: Diagnostic) -> Self {
        Self::new(template, vec![diagnostic])
    }

    /// Stage of the first diagnostic.
    pub fn stage(&self) -> Option<Stage> {
        self.diagnostics.first().map(|d| d.stage)
    }

    /// All diagnostics rendered against the template.
    pub fn render(&self) -> String {
        let rendered: Vec<String> =
            self.diagnostics.iter().map(|d| d.render(&self.template)).collect();
        rendered.join("\n\n")
    }
}

/// Disk cache and sweeper failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode artifact")]
    Encode(#[from] bincode::Error),

    #[error("failed to start the sweeper thread")]
    Spawn(#[source] io::Error),
}

/// Invalid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is not set")]
    Missing { var: &'static str },

    #[error("{var}={value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("type `{name}` is not registered in the schema")]
    UnregisteredType { name: &'static str },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn as_compile(&self) -> Option<&CompileError> {
        match self {
            Error::Compile(err) => Some(err),
            _ => None,
        }
    }
}
