pub mod error;
mod structural;

pub use error::ParseError;
pub use structural::parse_document;

use crate::document::Document;
use crate::project::{self, ParseResult};

/// Parser entry point for a single document.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: impl Into<String>, file_id: usize) -> Self {
        Parser {
            source: source.into(),
            file_id,
        }
    }

    /// The heading/code node sequence of the source.
    pub fn document(&self) -> Document {
        structural::parse_document(&self.source)
    }

    /// Compile the source into a virtual filesystem, keeping only the code
    /// blocks selected by `ids` (all of them when `ids` is empty).
    pub fn parse(&self, ids: &[&str]) -> ParseResult {
        project::compile(&self.document(), ids, self.file_id)
    }
}
