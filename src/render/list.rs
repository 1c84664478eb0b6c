//! Thread list page: header, search box, result cards and pagination.

use std::borrow::Borrow;

use crate::browser::state::ListView;
use crate::config::Config;
use crate::router::encode_component;
use crate::source::ThreadSummary;
use super::{Highlighter, escape_html, format_timestamp};

/// Slots used by the numbered part of the pagination bar
const MAX_VISIBLE: usize = 5;

/// `ceil(count / page_size)`
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 { 0 } else { count.div_ceil(page_size) }
}

/// Items on a 1-based page; past the end this is empty
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Numbers shown in the pagination bar.
///
/// First and last page are always present; up to three pages around `current`
/// fill the middle, shifted near either edge so five slots are used, and an
/// ellipsis marks each gap. A single page needs no bar at all.
pub fn page_items(current: usize, total: usize) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }
    let mut start = current.saturating_sub(1).max(2);
    let mut end = (current + 1).min(total - 1);
    if current <= 3 {
        end = (total - 1).min(MAX_VISIBLE - 1);
    } else if current + 2 >= total {
        start = (total + 2).saturating_sub(MAX_VISIBLE).max(2);
    }

    let mut items = vec![PageItem::Page(1)];
    if start > 2 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total - 1 {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total));
    items
}

pub fn render_pagination(board_id: &str, current: usize, total: usize, query: &str) -> String {
    let items = page_items(current, total);
    if items.is_empty() {
        return String::new();
    }
    let board = escape_html(&encode_component(board_id));
    let query_param = if query.is_empty() { String::new() } else { format!("&amp;q={}", encode_component(query)) };
    let links: String = items.iter()
        .map(|item| match *item {
            PageItem::Ellipsis => r#"<span class="pagination-ellipsis">...</span>"#.to_string(),
            PageItem::Page(p) if p == current => format!(r#"<span class="pagination-current">{}</span>"#, p),
            PageItem::Page(p) => format!(
                r##"<a href="#/{}?page={}{}" class="pagination-link">{}</a>"##,
                board, p, query_param, p
            ),
        })
        .collect();
    format!(r#"<nav class="pagination" aria-label="Pagination">{}</nav>"#, links)
}

pub fn render_search_box(query: &str) -> String {
    format!(
        r#"<div class="search-box">
<input type="text" id="search-input" class="search-input" placeholder="검색어 입력..." value="{}" autocomplete="off">
<button type="button" id="search-btn" class="search-btn" aria-label="Search">&#128269;</button>
</div>"#,
        escape_html(query)
    )
}

pub fn render_thread_card(board_id: &str, thread: &ThreadSummary, highlighter: &Highlighter) -> String {
    format!(
        r##"<article class="thread-card">
<h2 class="thread-card-title"><span class="thread-id">#{id}</span> <a href="#/{board}/{id}">{title}</a> <span class="thread-size">({size})</span></h2>
<div class="thread-card-meta"><span>{user}</span></div>
<div class="thread-card-meta"><span>{created} - {updated}</span></div>
</article>
"##,
        id = thread.thread_id,
        board = escape_html(&encode_component(board_id)),
        title = highlighter.apply(&thread.title),
        size = thread.size,
        user = highlighter.apply(&thread.username),
        created = escape_html(&format_timestamp(&thread.created_at)),
        updated = escape_html(&format_timestamp(&thread.updated_at)),
    )
}

/// Cards for one page of threads followed by the pagination bar
pub fn render_thread_results<T: Borrow<ThreadSummary>>(board_id: &str, threads: &[T], page: usize, total: usize, query: &str) -> String {
    if threads.is_empty() {
        let message = if query.is_empty() { "No threads found." } else { "검색 결과가 없습니다." };
        return format!(r#"<div class="empty">{}</div>"#, message);
    }
    let highlighter = Highlighter::new(query);
    let cards: String = threads.iter().map(|t| render_thread_card(board_id, t.borrow(), &highlighter)).collect();
    format!(
        "<div class=\"thread-list\">\n{}</div>\n{}",
        cards,
        render_pagination(board_id, page, total, query)
    )
}

/// Full list page around an already rendered results region
pub fn render_thread_list(config: &Config, board_id: &str, query: &str, results_html: &str) -> String {
    let name = escape_html(config.board_name(board_id));
    format!(
        r#"<div class="page-header">
<h1 class="page-title">{name} Archive</h1>
<p class="page-description">Archived threads from {name} board</p>
</div>
{search}
<div id="thread-results">
{results}
</div>"#,
        name = name,
        search = render_search_box(query),
        results = results_html,
    )
}

pub(crate) fn render_list_view(view: &ListView, config: &Config) -> String {
    render_thread_list(config, &view.board_id, &view.query, &view.results_html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis as E, Page as P};

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(45, 20), 3);
    }

    #[test]
    fn slices_past_the_end_are_empty() {
        let items: Vec<u32> = (0..45).collect();
        assert_eq!(page_slice(&items, 3, 20).len(), 5);
        assert!(page_slice(&items, 4, 20).is_empty());
        assert_eq!(page_slice(&items, 0, 20), page_slice(&items, 1, 20));
    }

    #[test]
    fn near_start() {
        assert_eq!(page_items(1, 10), [P(1), P(2), P(3), P(4), E, P(10)]);
        assert_eq!(page_items(3, 10), [P(1), P(2), P(3), P(4), E, P(10)]);
    }

    #[test]
    fn middle() {
        assert_eq!(page_items(5, 10), [P(1), E, P(4), P(5), P(6), E, P(10)]);
    }

    #[test]
    fn near_end() {
        assert_eq!(page_items(10, 10), [P(1), E, P(7), P(8), P(9), P(10)]);
        assert_eq!(page_items(8, 10), [P(1), E, P(7), P(8), P(9), P(10)]);
    }

    #[test]
    fn small_totals() {
        assert!(page_items(1, 1).is_empty());
        assert_eq!(page_items(1, 2), [P(1), P(2)]);
        assert_eq!(page_items(2, 3), [P(1), P(2), P(3)]);
        assert_eq!(page_items(4, 5), [P(1), P(2), P(3), P(4), P(5)]);
    }

    #[test]
    fn pagination_markup() {
        let html = render_pagination("tuna", 2, 3, "a b");
        assert!(html.contains(r#"<span class="pagination-current">2</span>"#));
        assert!(html.contains(r##"href="#/tuna?page=3&amp;q=a%20b""##));
        assert!(render_pagination("tuna", 1, 1, "").is_empty());
    }
}
