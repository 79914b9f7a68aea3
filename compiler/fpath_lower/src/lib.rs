//! Lowering from syntax to the typed AST.
//!
//! Two passes run between parsing and code generation:
//! - [`Resolver`] binds names to schema members and registered functions,
//!   checks types, and inserts presence guards.
//! - [`compact`] merges sibling paths that share a navigation prefix.

mod compact;
mod error;
mod resolve;

#[cfg(test)]
mod fixtures;

pub use compact::compact;
pub use error::{LowerError, ResolveError, TypeError};
pub use resolve::{ResolutionPolicy, Resolver};
