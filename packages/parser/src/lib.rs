//! # Tandem Parser
//!
//! Lossless parser for component source files (JSX/TSX).
//!
//! Script text is kept verbatim; markup is parsed into elements so edits can
//! be applied structurally while everything else round-trips untouched.
//! Declarations and dynamic regions (`.map(...)` callbacks, ternaries,
//! `&&`/`||`) are recorded as scopes so source locations can be classified.

pub mod ast;
pub mod error;
pub mod ids;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use ids::{collect_oids, deduplicate_oids, ensure_oid, tag_element_tree, tag_oids};
pub use parser::{parse, parse_fragment, Parser};
pub use serializer::{serialize, serialize_element, Serializer};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let tokens = tokenize("export function Button");
        assert_eq!(tokens.len(), 5);
    }
}
