use serde::{Serialize, Serializer};
use tracing::debug;

use crate::document::Document;
use crate::filter;
use crate::namer::FallbackNamer;
use crate::parser::ParseError;
use crate::protocol::{self, BlockKind, Directive};
use crate::scope::{LocalizedCodeBlock, Outline};
use crate::vfs::FileSystemTree;

/// Language a startup block must be written in.
pub const STARTUP_LANGUAGE: &str = "bash";

/// Output of compiling one document, or several merged together.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseResult {
    pub filesystem: FileSystemTree,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup: Option<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_messages"
    )]
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// The diagnostics as plain strings.
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn apply_startup(&mut self, block: &LocalizedCodeBlock, file_id: usize) {
        let span = Some(block.span.clone());

        if self.startup.is_some() {
            self.errors.push(ParseError::warning(
                "Multiple startup blocks provided, using the first one",
                span,
                file_id,
            ));
            return;
        }

        if block.code.language.as_deref() != Some(STARTUP_LANGUAGE) {
            self.errors.push(
                ParseError::error("Startup blocks must be bash scripts", span, file_id).with_note(
                    format!(
                        "found language: {}",
                        block.code.language.as_deref().unwrap_or("(none)")
                    ),
                ),
            );
            return;
        }

        self.startup = Some(block.code.content.clone());
    }
}

fn serialize_messages<S: Serializer>(errors: &[ParseError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.message.as_str()))
}

/// Run the single-document pipeline: localize, filter, classify, then write
/// files or apply directives, in one pass over the blocks.
pub fn compile(document: &Document, ids: &[&str], file_id: usize) -> ParseResult {
    let outline = Outline::of(document);
    let mut namer = FallbackNamer::new();
    let mut result = ParseResult::default();

    for block in outline.blocks() {
        if !filter::is_included(&outline, block, ids) {
            debug!(span = ?block.span, "code block filtered out");
            continue;
        }

        let kind = match protocol::resolve(block.code.meta.as_deref()) {
            Ok(kind) => kind,
            Err(err) => {
                debug!(span = ?block.span, %err, "skipping code block");
                result
                    .errors
                    .push(ParseError::error(err.to_string(), Some(block.span.clone()), file_id));
                continue;
            }
        };

        match kind {
            BlockKind::File { path } => {
                let path = path.unwrap_or_else(|| namer.name(&outline, block));
                if let Err(err) = result.filesystem.insert(&path, &block.code.content) {
                    debug!(span = ?block.span, %path, %err, "skipping code block");
                    result.errors.push(
                        ParseError::error(err.to_string(), Some(block.span.clone()), file_id)
                            .with_note(format!("while writing `{}`", path)),
                    );
                }
            }
            BlockKind::Directive(Directive::Startup) => result.apply_startup(block, file_id),
        }
    }

    debug!(
        file_id,
        blocks = outline.blocks().len(),
        files = result.filesystem.files().len(),
        errors = result.errors.len(),
        "compiled document"
    );
    result
}
