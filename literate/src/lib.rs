pub mod document;
pub mod filter;
pub mod ident;
pub mod merge;
pub mod namer;
pub mod parser;
pub mod project;
pub mod protocol;
pub mod scope;
pub mod vfs;

pub use merge::multiparse;
pub use parser::{ParseError, Parser};
pub use project::ParseResult;
pub use vfs::{FileEntry, FileSystemTree};

/// Compile a single Markdown document. Convenience for
/// `Parser::new(source, 0).parse(ids)`.
pub fn parse(source: &str, ids: &[&str]) -> ParseResult {
    Parser::new(source, 0).parse(ids)
}
