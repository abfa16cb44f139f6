//! # xpathoxide
//!
//! An `XPath` 1.0 expression parser. Expression strings are tokenized, parsed
//! by a recursive descent parser into an immutable [`Node`] tree, and
//! memoized in a bounded least-recently-used cache.
//!
//! ## Quick Start
//!
//! ```
//! use xpathoxide::xpath;
//!
//! let tree = xpath::parse("1 + 2 * 3").unwrap().unwrap();
//! assert_eq!(tree.to_string(), "(add (int 1) (mul (int 2) (int 3)))");
//! ```

pub mod error;
pub mod xpath;

// Re-export primary types at the crate root for convenience.
pub use error::XPathError;
pub use xpath::{get_or_parse, Node};
