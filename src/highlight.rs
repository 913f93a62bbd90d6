use std::collections::HashMap;

use crate::dom::{Dom, NodeId};
use crate::matcher::Matcher;
use crate::Result;

pub const HIGHLIGHT_CLASS: &str = "highlight";

const TREE_WALK_STACK_BYTES: usize = 32 * 1024 * 1024;

// Derived fresh per invocation; nothing is persisted.
pub fn canonical_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// Single-page search entry point: always clears previous markers, then
// highlights the input unless it canonicalizes to an empty query.
pub fn search_in_page(dom: &mut Dom, root: NodeId, raw_input: &str) -> Result<()> {
    let query = canonical_query(raw_input);
    clear_highlights(dom, root)?;
    if query.is_empty() {
        return Ok(());
    }
    apply_highlights(dom, root, &query)
}

// Unwraps every highlight marker under root into a text leaf, then merges
// adjacent leaves so each wrapped run collapses back to one. Repeated
// searches therefore never nest markers, and stripping restores the
// original text byte for byte.
pub fn clear_highlights(dom: &mut Dom, root: NodeId) -> Result<()> {
    stacker::grow(TREE_WALK_STACK_BYTES, || -> Result<()> {
        let markers = dom.elements_with_class(root, HIGHLIGHT_CLASS);
        if markers.is_empty() {
            return Ok(());
        }
        for marker in markers {
            let text = dom.text_content(marker);
            let leaf = dom.create_detached_text(text);
            dom.replace_with(marker, leaf)?;
        }
        dom.normalize(root);
        Ok(())
    })
}

// Wraps every case-insensitive occurrence of the query under root. Each
// matching text leaf is replaced by a <span> wrapper whose children
// alternate plain text fragments and highlight markers, one marker per
// non-overlapping occurrence, left to right. Matching never crosses leaf
// boundaries: a query split by markup between two adjacent leaves is not
// found. The query is expected case-folded and non-empty; an empty query
// returns without touching the tree.
pub fn apply_highlights(dom: &mut Dom, root: NodeId, query: &str) -> Result<()> {
    if query.is_empty() {
        return Ok(());
    }
    let matcher = Matcher::literal(query)?;

    stacker::grow(TREE_WALK_STACK_BYTES, || -> Result<()> {
        let leaves = dom.text_leaves_in(root);
        for leaf in leaves {
            let Some(text) = dom.text(leaf).map(str::to_string) else {
                continue;
            };
            let ranges = matcher.find_ranges(&text)?;
            if ranges.is_empty() {
                continue;
            }

            let wrapper = dom.create_detached_element("span");
            let mut cursor = 0usize;
            for range in ranges {
                if range.start > cursor {
                    dom.create_text(wrapper, &text[cursor..range.start]);
                }
                let marker = dom.create_element(wrapper, "span", HashMap::new());
                dom.class_add(marker, HIGHLIGHT_CLASS)?;
                dom.create_text(marker, &text[range.clone()]);
                cursor = range.end;
            }
            if cursor < text.len() {
                dom.create_text(wrapper, &text[cursor..]);
            }

            dom.replace_with(leaf, wrapper)?;
        }
        Ok(())
    })
}

// Raw-markup variant used by cross-page search. Operates on the markup
// string itself, not a parsed tree, preserving the matched casing.
pub fn highlight_markup(markup: &str, query: &str) -> Result<String> {
    if query.is_empty() {
        return Ok(markup.to_string());
    }
    let matcher = Matcher::literal(query)?;
    let ranges = matcher.find_ranges(markup)?;
    if ranges.is_empty() {
        return Ok(markup.to_string());
    }

    let mut out = String::with_capacity(markup.len() + ranges.len() * 32);
    let mut cursor = 0usize;
    for range in ranges {
        out.push_str(&markup[cursor..range.start]);
        out.push_str("<span class=\"");
        out.push_str(HIGHLIGHT_CLASS);
        out.push_str("\">");
        out.push_str(&markup[range.clone()]);
        out.push_str("</span>");
        cursor = range.end;
    }
    out.push_str(&markup[cursor..]);
    Ok(out)
}
