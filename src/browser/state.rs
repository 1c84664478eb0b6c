use std::collections::{BTreeSet, VecDeque};

use crate::router::{Params, Query};
use super::theme::Theme;

/// What the browser is showing, as plain data. The page markup is a pure
/// function of this value (see [`crate::render::render_page`]).
#[derive(Debug, Clone)]
pub struct UiState {
    pub sidebar_open: bool,
    pub current_route: Option<CurrentRoute>,
    pub highlight_seqs: BTreeSet<u32>,
    pub title: Option<String>,
    pub active_board: Option<String>,
    pub view: View,
    /// Element id to bring into view after a render, if it exists
    pub scroll_target: Option<String>,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRoute {
    pub path: String,
    pub query: Query,
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Blank,
    Loading,
    Error(String),
    ThreadList(ListView),
    /// Rendered detail markup; response bodies are already linked
    ThreadDetail(String),
}

/// Thread list with its separately replaceable results region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub board_id: String,
    pub query: String,
    pub page: usize,
    pub total_pages: usize,
    pub results_html: String,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        UiState {
            sidebar_open: false,
            current_route: None,
            highlight_seqs: BTreeSet::new(),
            title: None,
            active_board: None,
            view: View::Blank,
            scroll_target: None,
            theme,
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
    }

    pub fn show_loading(&mut self) {
        self.view = View::Loading;
        self.scroll_target = None;
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.view = View::Error(message.into());
        self.scroll_target = None;
    }

    pub fn list_view(&self) -> Option<&ListView> {
        match &self.view {
            View::ThreadList(list) => Some(list),
            _ => None,
        }
    }

    pub fn list_view_mut(&mut self) -> Option<&mut ListView> {
        match &mut self.view {
            View::ThreadList(list) => Some(list),
            _ => None,
        }
    }
}

/// Hash location plus history, standing in for the browser's `location`.
///
/// `push` and `redirect` queue a hash-change notification; `replace_silently`
/// only rewrites the visible location.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    hash: String,
    history: Vec<String>,
    pending: VecDeque<String>,
}

impl Navigator {
    pub fn new() -> Self { Self::default() }

    pub fn with_hash(hash: &str) -> Self {
        Navigator { hash: normalize(hash), history: Vec::new(), pending: VecDeque::new() }
    }

    /// Current hash including the leading `#`, or empty
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Entries pushed before the current one
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// New history entry. Setting the hash to its current value is not a change.
    pub fn push(&mut self, path: &str) {
        let next = normalize(path);
        if next == self.hash {
            return;
        }
        let prev = std::mem::replace(&mut self.hash, next.clone());
        if !prev.is_empty() {
            self.history.push(prev);
        }
        self.pending.push_back(next);
    }

    /// Replace the current entry and still notify listeners
    pub fn redirect(&mut self, path: &str) {
        self.hash = normalize(path);
        self.pending.push_back(self.hash.clone());
    }

    /// Replace the current entry without a hash-change event
    pub fn replace_silently(&mut self, path: &str) {
        self.hash = normalize(path);
    }

    /// Step back one entry, queueing a change event
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(prev) => {
                self.hash = prev.clone();
                self.pending.push_back(prev);
                true
            }
            None => false,
        }
    }

    pub fn next_event(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn normalize(path: &str) -> String {
    if path.is_empty() || path.starts_with('#') {
        path.to_string()
    } else {
        format!("#{}", path)
    }
}
