use std::fmt;
use std::ops::Range;

/// A Document is the flat, document-order sequence of nodes the compiler
/// cares about. Everything that is neither a heading nor a code block
/// collapses into [`Node::Other`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<Spanned<Node>>,
}

impl Document {
    /// Dispatch every node to `visitor` in document order.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        for spanned in &self.nodes {
            let span = spanned.span.clone();
            match &spanned.node {
                Node::Heading(heading) => visitor.visit_heading(heading, span),
                Node::Code(code) => visitor.visit_code(code, span),
                Node::Other => visitor.visit_other(span),
            }
        }
    }
}

/// A node paired with its byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Heading(HeadingNode),
    Code(CodeBlockNode),
    Other,
}

/// A Markdown heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    /// 1 for `#`, up to 6 for `######`.
    pub depth: u8,
    /// Literal text children joined together. `None` when the heading holds
    /// only inline structure (emphasis, links, code spans) or nothing at all.
    pub text: Option<String>,
}

impl HeadingNode {
    pub fn new(depth: u8, text: impl Into<String>) -> Self {
        HeadingNode {
            depth,
            text: Some(text.into()),
        }
    }
}

/// A fenced or indented code block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeBlockNode {
    /// First word of the info string.
    pub language: Option<String>,
    /// Remainder of the info string after the language.
    pub meta: Option<String>,
    /// Block body without the final line ending.
    pub content: String,
}

impl CodeBlockNode {
    pub fn new(language: Option<&str>, meta: Option<&str>, content: impl Into<String>) -> Self {
        CodeBlockNode {
            language: language.map(str::to_string),
            meta: meta.map(str::to_string),
            content: content.into(),
        }
    }
}

/// Callbacks for walking a [`Document`]. Only headings and code blocks carry
/// state; `visit_other` exists so implementors can observe the rest.
pub trait Visitor {
    fn visit_heading(&mut self, heading: &HeadingNode, span: Range<usize>);
    fn visit_code(&mut self, code: &CodeBlockNode, span: Range<usize>);
    fn visit_other(&mut self, _span: Range<usize>) {}
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for spanned in &self.nodes {
            match &spanned.node {
                Node::Heading(heading) => writeln!(f, "{}", heading)?,
                Node::Code(code) => write!(f, "{}", code)?,
                Node::Other => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for HeadingNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            write!(f, "#")?;
        }
        if let Some(text) = &self.text {
            write!(f, " {}", text)?;
        }
        Ok(())
    }
}

impl fmt::Display for CodeBlockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "```")?;
        if let Some(lang) = &self.language {
            write!(f, "{}", lang)?;
        }
        if let Some(meta) = &self.meta {
            write!(f, " {}", meta)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.content)?;
        writeln!(f, "```")
    }
}
