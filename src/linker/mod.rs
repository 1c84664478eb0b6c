//! Content linker.
//!
//! Rewrites the text of an archived HTML fragment so that bare URLs become
//! external links and cross-reference tokens become in-archive links. Markup is
//! never touched: the fragment is parsed once, text leaves are scanned in
//! document order and only leaves with matches are re-serialized.
//!
//! Cross-reference forms (board and thread default to the current ones):
//!
//! ```text
//! >>5          response 5 of this thread
//! >>5-10       responses 5..=10 of this thread
//! >1234>       thread 1234 on this board
//! tuna>1234>   thread 1234 on board tuna
//! >1234>5      response 5 of thread 1234 (also 5-10, and with a board prefix)
//! ```

pub mod html;

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

use crate::router::build_href;
use html::{DecodedText, Fragment, decode_text};

/// Text under these elements is left alone: existing links and raw text bodies
const SKIP: [&str; 4] = ["a", "script", "style", "textarea"];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(https?://[^\s<>"{}|\\^`\[\]]+)|([a-z]*)>([0-9]*)>([0-9]*)(?:-([0-9]+))?"#)
            .expect("link token regex should be valid")
    })
}

/// Board and thread the content belongs to
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    pub board_id: &'a str,
    pub thread_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// Opens outside the archive
    External(String),
    /// Location path inside the archive, e.g. `/tuna/42/5-10`
    Internal(String),
}

/// One recognised token in a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub range: Range<usize>,
    pub kind: LinkKind,
}

/// Find every URL and cross-reference in `text`, left to right, without overlap
pub fn scan(text: &str, ctx: LinkContext<'_>) -> Vec<LinkSpan> {
    token_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let kind = match caps.get(1) {
                Some(url) => LinkKind::External(url.as_str().to_string()),
                None => LinkKind::Internal(cross_reference_href(&caps, ctx)),
            };
            Some(LinkSpan { range: whole.range(), kind })
        })
        .collect()
}

fn cross_reference_href(caps: &Captures<'_>, ctx: LinkContext<'_>) -> String {
    let group = |i: usize| caps.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty());
    let board = group(2).unwrap_or(ctx.board_id);
    let thread = group(3).unwrap_or(ctx.thread_id);
    let mut href = build_href(board, thread, None);
    // Sequence digits are copied as written; ranges are not checked for order
    if let Some(start) = group(4) {
        href.push('/');
        href.push_str(start);
        if let Some(end) = group(5) {
            href.push('-');
            href.push_str(end);
        }
    }
    href
}

/// Render decoded text with its spans turned into `<a>` elements.
/// Returns `None` when nothing in the text is linkable.
pub fn link_text(decoded: &DecodedText, ctx: LinkContext<'_>) -> Option<String> {
    let text = decoded.text.as_str();
    let spans = scan(text, ctx);
    if spans.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(text.len() * 2);
    let mut last = 0;
    for span in spans {
        out.push_str(&decoded.escape(last..span.range.start));
        let label = decoded.escape(span.range.clone());
        match span.kind {
            LinkKind::External(url) => out.push_str(&format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                escape_attr(&url), label
            )),
            LinkKind::Internal(path) => out.push_str(&format!(
                r##"<a href="#{}" class="anchor-link">{}</a>"##,
                escape_attr(&path), label
            )),
        }
        last = span.range.end;
    }
    out.push_str(&decoded.escape(last..text.len()));
    Some(out)
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Link URLs and cross-references in an HTML fragment
pub fn process_content(content: &str, ctx: LinkContext<'_>) -> String {
    let fragment = Fragment::parse(content);
    let replacements: HashMap<usize, String> = fragment
        .text_leaves(&SKIP)
        .into_iter()
        .filter(|leaf| !leaf.inside_skipped)
        .filter_map(|leaf| link_text(&decode_text(leaf.raw), ctx).map(|html| (leaf.index, html)))
        .collect();
    if replacements.is_empty() {
        return content.to_string();
    }
    fragment.serialize_with(&replacements)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: LinkContext<'static> = LinkContext { board_id: "tuna", thread_id: "42" };

    fn hrefs(text: &str) -> Vec<LinkKind> {
        scan(text, CTX).into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn dash_without_start_links_thread() {
        assert_eq!(hrefs(">>-5"), [LinkKind::Internal("/tuna/42".into())]);
    }

    #[test]
    fn board_prefix_without_thread_uses_current_thread() {
        assert_eq!(hrefs("situplay>>3"), [LinkKind::Internal("/situplay/42/3".into())]);
    }

    #[test]
    fn url_stops_at_delimiters() {
        assert_eq!(
            hrefs("see https://ex.com/a?b=1&c=2]rest"),
            [LinkKind::External("https://ex.com/a?b=1&c=2".into())]
        );
    }

    #[test]
    fn url_ends_before_gt() {
        assert_eq!(
            hrefs("http://x.io/>>5"),
            [LinkKind::External("http://x.io/".into()), LinkKind::Internal("/tuna/42/5".into())]
        );
    }

    #[test]
    fn untouched_content_is_returned_verbatim() {
        let html = "<p>nothing &amp; here</p>";
        assert_eq!(process_content(html, CTX), html);
    }
}
