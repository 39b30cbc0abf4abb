use std::collections::HashMap;

use crate::ident;
use crate::scope::{HeadingId, LocalizedCodeBlock, Outline};

/// Names code blocks that carry no `file://` path.
///
/// One namer lives for one document: numbering restarts on every parse.
#[derive(Debug)]
pub struct FallbackNamer {
    next_orphan: usize,
    per_heading: HashMap<HeadingId, usize>,
}

impl Default for FallbackNamer {
    fn default() -> Self {
        FallbackNamer {
            next_orphan: 1,
            per_heading: HashMap::new(),
        }
    }
}

impl FallbackNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// File name for `block`, in order of preference:
    ///
    /// 1. the nearest heading's text, when it already ends in `.<lang>`;
    /// 2. the block's own `#id` plus `.<lang>`;
    /// 3. `<heading-slug>-<n>.<lang>`, counting unnamed blocks per heading;
    /// 4. `<n>.<lang>` for blocks outside any heading (or under a heading
    ///    with no literal text), counting per document.
    pub fn name(&mut self, outline: &Outline, block: &LocalizedCodeBlock) -> String {
        let lang = block.code.language.as_deref();
        let code_id = ident::code_id(&block.code);

        let Some(parent) = block.parent() else {
            return match code_id {
                Some(id) => with_extension(id, lang),
                None => self.orphan(lang),
            };
        };

        let heading = outline.heading(parent);
        if let (Some(text), Some(lang)) = (heading.text.as_deref(), lang) {
            if text.ends_with(&format!(".{}", lang)) {
                return text.to_string();
            }
        }

        if let Some(id) = code_id {
            return with_extension(id, lang);
        }

        match ident::heading_id(heading) {
            Some(slug) => {
                let count = self.per_heading.entry(parent).or_insert(0);
                *count += 1;
                with_extension(&format!("{}-{}", slug, count), lang)
            }
            None => self.orphan(lang),
        }
    }

    fn orphan(&mut self, lang: Option<&str>) -> String {
        let n = self.next_orphan;
        self.next_orphan += 1;
        with_extension(&n.to_string(), lang)
    }
}

fn with_extension(stem: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!("{}.{}", stem, lang),
        None => stem.to_string(),
    }
}
