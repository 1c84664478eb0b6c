use log::{debug, error, info, trace, warn};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::config::Config;
use crate::render::{self, detail::scroll_target, list::{page_slice, total_pages}};
use crate::router::{Router, SeqTarget, build_board_href, parse_location};
use crate::source::model::sort_by_updated_desc;
use crate::source::{DataSource, ThreadSummary};
use super::search::{Debouncer, filter_threads};
use super::state::{CurrentRoute, ListView, Navigator, UiState, View};
use super::theme::{PreferenceError, Theme, ThemeManager};

/// What a registered route does when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteHandler {
    BoardIndex,
    ThreadDetail,
    ThreadResponses,
}

/// Thread list of the board currently on screen, newest first
#[derive(Debug, Clone)]
struct BoardThreads {
    board_id: String,
    threads: Vec<ThreadSummary>,
}

/// The archive browser: router, data source, location, UI state and live search
/// in one owned value.
pub struct App {
    config: Config,
    source: DataSource,
    router: Router<RouteHandler>,
    navigator: Navigator,
    ui: UiState,
    board_threads: Option<BoardThreads>,
    debouncer: Debouncer,
    theme: ThemeManager,
}

impl App {
    pub fn new(config: Config, source: DataSource, theme: ThemeManager) -> Self {
        let mut router = Router::new();
        register_routes(&mut router);
        let debouncer = Debouncer::new(config.search_debounce());
        let ui = UiState::new(theme.current());
        App {
            config,
            source,
            router,
            navigator: Navigator::new(),
            ui,
            board_threads: None,
            debouncer,
            theme,
        }
    }

    /// Start at a given location, as if the page had been opened with that hash
    pub fn with_location(mut self, hash: &str) -> Self {
        self.navigator = Navigator::with_hash(hash);
        self
    }

    pub fn config(&self) -> &Config { &self.config }
    pub fn ui(&self) -> &UiState { &self.ui }
    pub fn navigator(&self) -> &Navigator { &self.navigator }
    pub fn source(&self) -> &DataSource { &self.source }
    pub fn source_mut(&mut self) -> &mut DataSource { &mut self.source }
    pub fn router(&self) -> &Router<RouteHandler> { &self.router }
    pub fn debouncer(&self) -> &Debouncer { &self.debouncer }

    /// Initial route: an empty location goes to the default board
    pub async fn start(&mut self) {
        info!("Archive browser starting at '{}'", self.navigator.hash());
        if self.navigator.hash().is_empty() {
            let home = format!("/{}", self.config.archive.default_board);
            self.navigate(&home);
        } else {
            self.handle_route_change().await;
        }
        self.run_pending().await;
    }

    /// Change the location; the new view is rendered by the next [`run_pending`](Self::run_pending)
    pub fn navigate(&mut self, path: &str) {
        debug!("navigate {}", path);
        self.navigator.push(path);
    }

    pub fn go_back(&mut self) -> bool {
        self.navigator.back()
    }

    /// Handle queued hash changes one at a time, each to completion.
    /// Returns how many were handled.
    pub async fn run_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(hash) = self.navigator.next_event() {
            trace!("hashchange {}", hash);
            self.ui.close_sidebar();
            self.handle_route_change().await;
            handled += 1;
        }
        handled
    }

    /// Route the current location. Unknown locations redirect to the default board.
    pub async fn handle_route_change(&mut self) {
        let location = parse_location(self.navigator.hash());
        let matched = self.router.match_path(&location.path)
            .map(|m| (m.route.handler, m.params));

        let Some((handler, params)) = matched else {
            warn!("No route matched: {}", location.path);
            let home = format!("/{}", self.config.archive.default_board);
            self.navigator.redirect(&home);
            return;
        };

        self.ui.current_route = Some(CurrentRoute {
            path: location.path.clone(),
            query: location.query.clone(),
            params: params.clone(),
        });

        let board_id = params.get("boardId").cloned().unwrap_or_default();
        match handler {
            RouteHandler::BoardIndex => {
                let page = location.query.get("page").map(|p| parse_page(p)).unwrap_or(1);
                let query = location.query.get("q").map(|q| q.trim().to_string()).unwrap_or_default();
                self.handle_board_index(&board_id, page, &query).await;
            }
            RouteHandler::ThreadDetail | RouteHandler::ThreadResponses => {
                let thread_id = params.get("threadId").cloned().unwrap_or_default();
                let seq = params.get("seq").map(String::as_str);
                self.handle_thread_detail(&board_id, &thread_id, seq).await;
            }
        }
    }

    async fn handle_board_index(&mut self, board_id: &str, page: usize, query: &str) {
        self.ui.show_loading();
        self.ui.highlight_seqs.clear();
        self.debouncer.cancel();

        match self.source.fetch_index(board_id).await {
            Ok(mut threads) => {
                sort_by_updated_desc(&mut threads);
                debug!("board {} has {} threads", board_id, threads.len());
                self.board_threads = Some(BoardThreads { board_id: board_id.to_string(), threads });
                self.show_board(board_id, page, query);
            }
            Err(e) => {
                self.ui.show_error(format!("Failed to load threads: {}", e));
            }
        }
    }

    async fn handle_thread_detail(&mut self, board_id: &str, thread_id: &str, seq: Option<&str>) {
        self.ui.show_loading();
        self.debouncer.cancel();

        match self.source.fetch_thread(board_id, thread_id).await {
            Ok(thread) => {
                let target = seq.and_then(SeqTarget::parse);
                let highlight: BTreeSet<u32> = thread.responses.iter()
                    .map(|r| r.sequence)
                    .filter(|s| target.is_some_and(|t| t.contains(*s)))
                    .collect();
                let html = render::render_thread_detail(&self.config, board_id, &thread, &highlight);
                self.ui.scroll_target = scroll_target(&thread, &highlight);
                self.ui.title = Some(thread.title.clone());
                self.ui.active_board = Some(board_id.to_string());
                self.ui.highlight_seqs = highlight;
                self.ui.view = View::ThreadDetail(html);
            }
            Err(e) => {
                self.ui.show_error(format!("Failed to load thread: {}", e));
            }
        }
    }

    /// Render the list page for the cached board threads
    fn show_board(&mut self, board_id: &str, page: usize, query: &str) {
        let Some(board) = &self.board_threads else { return };
        let filtered = filter_threads(&board.threads, query);
        let per_page = self.config.archive.threads_per_page;
        let total = total_pages(filtered.len(), per_page);
        let results_html = render::render_thread_results(
            board_id,
            page_slice(&filtered, page, per_page),
            page,
            total,
            query,
        );
        self.ui.title = Some(self.config.board_name(board_id).to_string());
        self.ui.active_board = Some(board_id.to_string());
        self.ui.view = View::ThreadList(ListView {
            board_id: board_id.to_string(),
            query: query.to_string(),
            page,
            total_pages: total,
            results_html,
        });
    }

    /// A keystroke in the search box; filtering happens once the input settles
    pub fn search_input(&mut self, text: &str, now: Instant) {
        if self.ui.list_view().is_none() {
            debug!("search input ignored outside the thread list");
            return;
        }
        self.debouncer.input(text, now);
    }

    /// Fire a settled search, if any. Returns whether the results changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(query) => self.apply_search(&query),
            None => false,
        }
    }

    /// Enter or the search button: skip the delay
    pub fn submit_search(&mut self, text: &str) -> bool {
        self.debouncer.cancel();
        self.apply_search(text.trim())
    }

    /// Re-filter the active board, back to page 1, replacing only the results
    /// region and rewriting the location without a hash change
    fn apply_search(&mut self, query: &str) -> bool {
        let (Some(list), Some(board)) = (self.ui.list_view_mut(), &self.board_threads) else {
            return false;
        };
        if list.board_id != board.board_id {
            return false;
        }
        let filtered = filter_threads(&board.threads, query);
        let per_page = self.config.archive.threads_per_page;
        let total = total_pages(filtered.len(), per_page);
        list.results_html = render::render_thread_results(
            &list.board_id,
            page_slice(&filtered, 1, per_page),
            1,
            total,
            query,
        );
        list.query = query.to_string();
        list.page = 1;
        list.total_pages = total;
        debug!("search '{}' on {} matched {} threads", query, list.board_id, filtered.len());

        let href = build_board_href(&list.board_id, 1, query);
        self.navigator.replace_silently(&href);
        if let Some(route) = self.ui.current_route.as_mut() {
            route.query.remove("page");
            if query.is_empty() {
                route.query.remove("q");
            } else {
                route.query.insert("q".to_string(), query.to_string());
            }
        }
        true
    }

    pub fn toggle_sidebar(&mut self) {
        self.ui.toggle_sidebar();
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, PreferenceError> {
        let theme = self.theme.toggle()?;
        self.ui.theme = theme;
        Ok(theme)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), PreferenceError> {
        self.theme.set(theme)?;
        self.ui.theme = theme;
        Ok(())
    }

    pub fn system_theme_changed(&mut self, prefers_dark: bool) -> Theme {
        let theme = self.theme.system_preference_changed(prefers_dark);
        self.ui.theme = theme;
        theme
    }

    /// Full document for the current state
    pub fn render(&self) -> String {
        render::render_page(&self.ui, &self.config)
    }

    /// Markup of the main region only
    pub fn render_main(&self) -> String {
        render::render_view(&self.ui, &self.config)
    }

    /// One-line description of what is on screen
    pub fn summary(&self) -> String {
        let what = match &self.ui.view {
            View::Blank => "(nothing shown)".to_string(),
            View::Loading => "Loading...".to_string(),
            View::Error(message) => format!("Error: {}", message),
            View::ThreadList(list) => {
                let name = self.config.board_name(&list.board_id);
                if list.query.is_empty() {
                    format!("{}: page {}/{}", name, list.page, list.total_pages.max(1))
                } else {
                    format!("{}: '{}' page {}/{}", name, list.query, list.page, list.total_pages.max(1))
                }
            }
            View::ThreadDetail(_) => {
                let title = self.ui.title.as_deref().unwrap_or("");
                match &self.ui.scroll_target {
                    Some(target) => format!("Thread '{}' at {}", title, target),
                    None => format!("Thread '{}'", title),
                }
            }
        };
        format!("{} | {}", self.navigator.hash(), what)
    }

    /// Thread counts for every configured board, or the fetch error text
    pub async fn board_status(&mut self) -> Vec<(String, Result<usize, String>)> {
        let ids: Vec<String> = self.config.archive.boards.iter().map(|b| b.id.clone()).collect();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let count = match self.source.fetch_index(&id).await {
                Ok(threads) => Ok(threads.len()),
                Err(e) => {
                    error!("status for board {} failed: {}", id, e);
                    Err(e.to_string())
                }
            };
            out.push((id, count));
        }
        out
    }
}

/// Board list, thread, and thread with a response or range, in that order
pub fn register_routes(router: &mut Router<RouteHandler>) {
    router.register("/:boardId", RouteHandler::BoardIndex);
    router.register("/:boardId/:threadId", RouteHandler::ThreadDetail);
    router.register("/:boardId/:threadId/:seq", RouteHandler::ThreadResponses);
}

/// Leading digits of a `page` parameter; anything else, or 0, is page 1
fn parse_page(raw: &str) -> usize {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok().filter(|&p| p > 0).unwrap_or(1)
}
