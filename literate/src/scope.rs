use std::ops::Range;

use tracing::trace;

use crate::document::{CodeBlockNode, Document, HeadingNode, Visitor};

/// Index of a heading in an [`Outline`]. Stable for the lifetime of the
/// outline, so it can key per-heading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadingId(usize);

/// A code block together with the headings whose scope encloses it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedCodeBlock {
    pub code: CodeBlockNode,
    /// Enclosing headings, outermost first, nearest last.
    pub ancestors: Vec<HeadingId>,
    /// Byte span of the code block in the source.
    pub span: Range<usize>,
}

impl LocalizedCodeBlock {
    /// The nearest enclosing heading, if any.
    pub fn parent(&self) -> Option<HeadingId> {
        self.ancestors.last().copied()
    }
}

/// Every heading of a document (the arena) plus every code block localized
/// against it, both in document order.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    headings: Vec<HeadingNode>,
    blocks: Vec<LocalizedCodeBlock>,
}

impl Outline {
    /// Walk `document` once, tracking which headings are in scope.
    pub fn of(document: &Document) -> Self {
        let mut tracker = ScopeTracker::default();
        document.accept(&mut tracker);
        tracker.outline
    }

    pub fn heading(&self, id: HeadingId) -> &HeadingNode {
        &self.headings[id.0]
    }

    pub fn headings(&self) -> &[HeadingNode] {
        &self.headings
    }

    pub fn blocks(&self) -> &[LocalizedCodeBlock] {
        &self.blocks
    }

    /// Resolve a block's ancestor ids, outermost first.
    pub fn ancestors<'a>(
        &'a self,
        block: &'a LocalizedCodeBlock,
    ) -> impl Iterator<Item = &'a HeadingNode> + 'a {
        block.ancestors.iter().map(move |id| self.heading(*id))
    }
}

#[derive(Default)]
struct ScopeTracker {
    outline: Outline,
    /// Open headings; depths strictly increase from bottom to top.
    stack: Vec<HeadingId>,
}

impl Visitor for ScopeTracker {
    fn visit_heading(&mut self, heading: &HeadingNode, _span: Range<usize>) {
        // Close headings at the same or deeper level.
        while let Some(top) = self.stack.last() {
            if self.outline.heading(*top).depth >= heading.depth {
                self.stack.pop();
            } else {
                break;
            }
        }

        let id = HeadingId(self.outline.headings.len());
        self.outline.headings.push(heading.clone());
        self.stack.push(id);
    }

    fn visit_code(&mut self, code: &CodeBlockNode, span: Range<usize>) {
        trace!(
            language = ?code.language,
            meta = ?code.meta,
            depth = self.stack.len(),
            "localized code block"
        );
        self.outline.blocks.push(LocalizedCodeBlock {
            code: code.clone(),
            ancestors: self.stack.clone(),
            span,
        });
    }
}
