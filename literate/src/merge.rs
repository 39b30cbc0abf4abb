use tracing::debug;

use crate::parser::{ParseError, Parser};
use crate::project::ParseResult;

/// Folds per-document results into one.
///
/// Filesystems merge entry by entry, startup scripts are concatenated in
/// document order, diagnostics are kept in order and followed by the merge
/// conflicts each document introduced.
#[derive(Debug, Default)]
pub struct Merger {
    merged: ParseResult,
    scripts: Vec<String>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the result of the document registered as `file_id`.
    pub fn add(&mut self, result: ParseResult, file_id: usize) {
        let ParseResult {
            filesystem,
            startup,
            errors,
        } = result;

        self.merged.errors.extend(errors);
        self.scripts.extend(startup);

        for conflict in self.merged.filesystem.merge(filesystem) {
            debug!(file_id, %conflict, "merge conflict");
            self.merged
                .errors
                .push(ParseError::error(conflict.to_string(), None, file_id));
        }
    }

    pub fn finish(self) -> ParseResult {
        let Merger {
            mut merged,
            scripts,
        } = self;
        if !scripts.is_empty() {
            merged.startup = Some(scripts.join("\n"));
        }
        merged
    }
}

/// Compile every document with the same id filter and merge the results.
/// Document `i` is reported with file id `i`.
pub fn multiparse(documents: &[&str], ids: &[&str]) -> ParseResult {
    let mut merger = Merger::new();
    for (file_id, source) in documents.iter().enumerate() {
        merger.add(Parser::new(*source, file_id).parse(ids), file_id);
    }
    merger.finish()
}
