use crate::ident;
use crate::scope::{LocalizedCodeBlock, Outline};

/// Whether `block` is selected by `ids`.
///
/// An empty id list selects everything. Otherwise the block is selected when
/// its own `#id` or the slug of any enclosing heading is listed.
pub fn is_included(outline: &Outline, block: &LocalizedCodeBlock, ids: &[&str]) -> bool {
    if ids.is_empty() {
        return true;
    }

    let requested = |id: &str| !id.is_empty() && ids.contains(&id);

    if ident::code_id(&block.code).is_some_and(requested) {
        return true;
    }

    outline
        .ancestors(block)
        .filter_map(ident::heading_id)
        .any(|slug| requested(&slug))
}
