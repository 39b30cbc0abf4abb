use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::document::{CodeBlockNode, Document, HeadingNode, Node, Spanned};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse Markdown source text into the flat node sequence the compiler walks.
///
/// Headings and code blocks nested in lists or block quotes are reported at
/// their position in document order, like top-level ones.
pub fn parse_document(source: &str) -> Document {
    let parser = CmarkParser::new_ext(source, Options::empty());
    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();

    let mut nodes = Vec::new();
    let mut i = 0;

    while i < events.len() {
        let (ref ev, ref range) = events[i];

        match ev {
            Event::Start(Tag::Heading { level, .. }) => {
                let depth = heading_level_to_u8(level);
                i += 1;
                let text = collect_heading_text(&events, &mut i);
                nodes.push(Spanned {
                    node: Node::Heading(HeadingNode { depth, text }),
                    span: range.clone(),
                });
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                let (language, meta) = match kind {
                    CodeBlockKind::Fenced(info) => split_info_string(info),
                    CodeBlockKind::Indented => (None, None),
                };
                i += 1;
                let content = collect_text_until(&events, &mut i, |e| {
                    matches!(e, TagEnd::CodeBlock)
                });
                nodes.push(Spanned {
                    node: Node::Code(CodeBlockNode {
                        language,
                        meta,
                        content: strip_final_line_ending(content),
                    }),
                    span: range.clone(),
                });
            }

            Event::Start(
                Tag::Paragraph
                | Tag::BlockQuote(_)
                | Tag::List(_)
                | Tag::Table(_)
                | Tag::HtmlBlock,
            )
            | Event::Rule => {
                nodes.push(Spanned {
                    node: Node::Other,
                    span: range.clone(),
                });
                i += 1;
            }

            _ => {
                i += 1;
            }
        }
    }

    Document { nodes }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Collect the literal text directly under a heading, up to End(Heading).
///
/// Adjacent text events form one run; runs separated by inline structure
/// (emphasis, links, code spans, hard breaks) are joined with a space. Text
/// nested inside that structure is not literal heading text and is skipped.
fn collect_heading_text(events: &[(Event<'_>, Range<usize>)], i: &mut usize) -> Option<String> {
    let mut runs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut depth = 0u32;

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        *i += 1;
        match ev {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Start(_) => {
                depth += 1;
                runs.extend(current.take());
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Text(s) if depth == 0 => {
                current.get_or_insert_with(String::new).push_str(s);
            }
            Event::SoftBreak if depth == 0 => {
                current.get_or_insert_with(String::new).push('\n');
            }
            _ if depth == 0 => {
                runs.extend(current.take());
            }
            _ => {}
        }
    }
    runs.extend(current.take());

    if runs.is_empty() {
        None
    } else {
        Some(runs.join(" "))
    }
}

/// Split a fence info string into language (first word) and meta (the rest).
fn split_info_string(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    let (lang, meta) = match info.find(char::is_whitespace) {
        Some(pos) => (&info[..pos], info[pos..].trim()),
        None => (info, ""),
    };
    let non_empty = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
    (non_empty(lang), non_empty(meta))
}

/// Collect all text content until a matching End tag.
fn collect_text_until(
    events: &[(Event<'_>, Range<usize>)],
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Text(s) => {
                text.push_str(s);
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    text
}

/// The body of a code block ends with the newline that precedes the closing
/// fence; that newline is not part of the content.
fn strip_final_line_ending(mut content: String) -> String {
    if content.ends_with('\n') {
        content.pop();
        if content.ends_with('\r') {
            content.pop();
        }
    }
    content
}
