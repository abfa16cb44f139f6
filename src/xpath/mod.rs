//! `XPath` 1.0 expression front end.
//!
//! This module turns `XPath` 1.0 expression strings
//! (<https://www.w3.org/TR/xpath-10/>) into [`Node`] trees for a downstream
//! evaluator. Evaluation itself is out of scope.
//!
//! # Quick Start
//!
//! ```
//! use xpathoxide::xpath::{self, Axis, Node};
//!
//! let tree = xpath::get_or_parse("child::foo").unwrap().unwrap();
//! assert_eq!(*tree, Node::axis(Axis::Child, Node::test(None, "foo")));
//!
//! // Parsing the same string again is served from the cache.
//! let again = xpath::get_or_parse("child::foo").unwrap().unwrap();
//! assert_eq!(tree, again);
//! ```
//!
//! # Submodules
//!
//! - [`ast`]: the tree produced by the parser.
//! - [`token`]: tokens exchanged between a lexer and the parser.
//! - [`lexer`]: the default tokenizer for expression strings.
//! - [`stream`]: the pull-based adapter the parser reads tokens through.
//! - [`parser`]: the recursive descent parser.
//! - [`cache`]: a bounded, thread-safe memoizing parse cache.

pub mod ast;
pub mod cache;
pub mod lexer;
pub mod parser;
pub mod stream;
pub mod token;

pub use ast::{Axis, BinaryOp, Node, NodeKind};
pub use cache::{CachedTree, ParseCache};
pub use parser::{parse, parse_with_options, ParseOptions, Parser};

use crate::error::XPathError;

/// Parses `expression` through the process-wide [`ParseCache`].
///
/// Returns `Ok(None)` for an empty expression.
///
/// # Errors
///
/// Returns [`XPathError`] if the expression is malformed. Failed parses are
/// not cached.
pub fn get_or_parse(expression: &str) -> Result<CachedTree, XPathError> {
    ParseCache::global().get_or_parse(expression)
}
