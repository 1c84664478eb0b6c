//! HTML rendering.
//!
//! Every function here is a plain `data -> String` transform; the only input
//! besides domain data is the [`Config`] (board names, attachment URLs) and, for
//! the page shell, the explicit [`UiState`].

pub mod detail;
pub mod list;

use chrono::{Local, TimeZone};
use regex::{Regex, RegexBuilder};

use crate::browser::state::{UiState, View};
use crate::config::Config;
use crate::source::model::parse_timestamp;

pub use detail::{extract_youtube_id, render_response, render_thread_detail};
pub use list::{render_pagination, render_thread_list, render_thread_results};

/// Escape text for element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `YYYY-MM-DD HH:MM` in the viewer's local time
pub fn format_timestamp(raw: &str) -> String {
    format_timestamp_in(raw, &Local)
}

/// Like [`format_timestamp`] for an explicit zone; unreadable input is shown as-is
pub fn format_timestamp_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_timestamp(raw) {
        Some(utc) => utc.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// Case-insensitive search-term marker
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new(query: &str) -> Self {
        let pattern = if query.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build().ok()
        };
        Highlighter { pattern }
    }

    /// Escaped `text` with every match wrapped in `<mark class="search-highlight">`
    pub fn apply(&self, text: &str) -> String {
        let Some(re) = &self.pattern else {
            return escape_html(text);
        };
        let mut out = String::with_capacity(text.len() + 32);
        let mut last = 0;
        for m in re.find_iter(text) {
            out.push_str(&escape_html(&text[last..m.start()]));
            out.push_str(r#"<mark class="search-highlight">"#);
            out.push_str(&escape_html(m.as_str()));
            out.push_str("</mark>");
            last = m.end();
        }
        out.push_str(&escape_html(&text[last..]));
        out
    }
}

pub fn render_loading() -> String {
    r#"<div class="loading">Loading...</div>"#.to_string()
}

pub fn render_error(message: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, escape_html(message))
}

/// Document title for a page heading
pub fn document_title(title: Option<&str>) -> String {
    match title {
        Some(t) => format!("{} - Archive", t),
        None => "Archive - Tunaground".to_string(),
    }
}

/// Board navigation with the active board marked
pub fn render_sidebar(config: &Config, active_board: Option<&str>) -> String {
    config.archive.boards.iter()
        .map(|board| {
            let active = if Some(board.id.as_str()) == active_board { " active" } else { "" };
            format!(
                "<li><a href=\"#/{}\" class=\"sidebar-item{}\">{}</a></li>",
                escape_html(&crate::router::encode_component(&board.id)),
                active,
                escape_html(&board.name)
            )
        })
        .collect()
}

/// Main region for the current view
pub fn render_view(state: &UiState, config: &Config) -> String {
    match &state.view {
        View::Blank => String::new(),
        View::Loading => render_loading(),
        View::Error(message) => render_error(message),
        View::ThreadList(list_view) => list::render_list_view(list_view, config),
        View::ThreadDetail(html) => html.clone(),
    }
}

/// Whole document for the given UI state
pub fn render_page(state: &UiState, config: &Config) -> String {
    let open = if state.sidebar_open { " open" } else { "" };
    let heading = state.title.as_deref().unwrap_or("Archive");
    format!(
        r#"<!DOCTYPE html>
<html lang="ko" data-theme="{theme}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="style.css">
</head>
<body>
<header class="topbar">
<button type="button" id="menu-toggle" class="menu-toggle" aria-label="Menu">&#9776;</button>
<span id="page-title">{heading}</span>
<button type="button" id="theme-toggle" class="theme-toggle" aria-label="Toggle theme"></button>
</header>
<div id="sidebar-overlay" class="sidebar-overlay{open}"></div>
<nav id="sidebar" class="sidebar{open}"><ul id="board-list">{boards}</ul></nav>
<main id="app">{main}</main>
</body>
</html>
"#,
        theme = state.theme.as_str(),
        title = escape_html(&document_title(state.title.as_deref())),
        heading = escape_html(heading),
        open = open,
        boards = render_sidebar(config, state.active_board.as_deref()),
        main = render_view(state, config),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn highlight_is_case_insensitive_and_escaped() {
        let h = Highlighter::new("foo");
        assert_eq!(
            h.apply("<Foo> & foo"),
            r#"&lt;<mark class="search-highlight">Foo</mark>&gt; &amp; <mark class="search-highlight">foo</mark>"#
        );
    }

    #[test]
    fn highlight_treats_query_literally() {
        let h = Highlighter::new("a.b");
        assert_eq!(h.apply("axb a.b"), r#"axb <mark class="search-highlight">a.b</mark>"#);
        assert_eq!(Highlighter::new("").apply("<x>"), "&lt;x&gt;");
    }

    #[test]
    fn timestamps_format_in_zone() {
        assert_eq!(format_timestamp_in("2024-03-01T03:05:09Z", &Utc), "2024-03-01 03:05");
        assert_eq!(format_timestamp_in("2024-03-01T12:30:00+09:00", &Utc), "2024-03-01 03:30");
        assert_eq!(format_timestamp_in("someday", &Utc), "someday");
    }

    #[test]
    fn titles() {
        assert_eq!(document_title(Some("Tuna")), "Tuna - Archive");
        assert_eq!(document_title(None), "Archive - Tunaground");
    }
}
