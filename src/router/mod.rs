//! Hash-fragment router.
//!
//! Locations look like `#/tuna/42/5-10?q=foo`. Patterns are registered once at
//! startup with `:name` segments; matching is first-match-wins in registration
//! order, so a broad pattern registered early shadows a narrower one that comes
//! later.

use log::trace;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;
use std::fmt;

/// Characters left alone by URI-component encoding
pub const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub type Params = BTreeMap<String, String>;
pub type Query = BTreeMap<String, String>;

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub fn decode_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
pub struct Route<H> {
    pub pattern: String,
    segments: Vec<Segment>,
    pub param_names: Vec<String>,
    pub handler: H,
}

impl<H> Route<H> {
    fn compile(pattern: &str, handler: H) -> Self {
        let segments: Vec<Segment> = split_path(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        let param_names = segments.iter()
            .filter_map(|s| match s { Segment::Param(n) => Some(n.clone()), Segment::Literal(_) => None })
            .collect();
        Route { pattern: pattern.to_string(), segments, param_names, handler }
    }

    /// Bind params if `path` has the same arity and literal segments
    fn bind(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => { params.insert(name.clone(), decode_component(part)); }
            }
        }
        Some(params)
    }
}

fn split_path(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    pub params: Params,
}

/// Path and query of the current location
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: Query,
}

/// Parse a hash fragment (with or without the leading `#`)
pub fn parse_location(hash: &str) -> Location {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    let hash = if hash.is_empty() { "/" } else { hash };
    let (path, query_string) = match hash.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (hash, None),
    };
    Location { path: path.to_string(), query: query_string.map(parse_query).unwrap_or_default() }
}

/// `a=1&b&c=x%20y` into a map; a key without `=` gets an empty value
pub fn parse_query(query_string: &str) -> Query {
    query_string
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode_component(k), decode_component(v)),
            None => (decode_component(pair), String::new()),
        })
        .collect()
}

/// Which responses a thread link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqTarget {
    Single(u32),
    Range(u32, u32),
}

impl SeqTarget {
    /// Parse `5` or `5-10`. Ranges are kept as written, even when reversed.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.split_once('-') {
            Some((a, b)) => Some(SeqTarget::Range(a.trim().parse().ok()?, b.trim().parse().ok()?)),
            None => raw.trim().parse().ok().map(SeqTarget::Single),
        }
    }

    /// Whether `seq` is one of the targeted responses; a reversed range covers nothing
    pub fn contains(self, seq: u32) -> bool {
        match self {
            SeqTarget::Single(n) => seq == n,
            SeqTarget::Range(a, b) => (a..=b).contains(&seq),
        }
    }
}

impl fmt::Display for SeqTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqTarget::Single(n) => write!(f, "{}", n),
            SeqTarget::Range(a, b) => write!(f, "{}-{}", a, b),
        }
    }
}

/// `/{board}/{thread}` with an optional `/{n}` or `/{n}-{m}` suffix
pub fn build_href(board_id: &str, thread_id: &str, target: Option<SeqTarget>) -> String {
    let mut href = format!("/{}/{}", encode_component(board_id), encode_component(thread_id));
    if let Some(t) = target {
        href.push('/');
        href.push_str(&t.to_string());
    }
    href
}

/// `/{board}` with `page` and `q` when they are not the defaults
pub fn build_board_href(board_id: &str, page: usize, query: &str) -> String {
    let mut href = format!("/{}", encode_component(board_id));
    let mut sep = '?';
    if page > 1 {
        href.push_str(&format!("{}page={}", sep, page));
        sep = '&';
    }
    if !query.is_empty() {
        href.push_str(&format!("{}q={}", sep, encode_component(query)));
    }
    href
}

/// Ordered route table; `H` is whatever the application dispatches on
#[derive(Debug, Clone)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self { Router { routes: Vec::new() } }
}

impl<H> Router<H> {
    pub fn new() -> Self { Self::default() }

    pub fn register(&mut self, pattern: &str, handler: H) {
        let route = Route::compile(pattern, handler);
        trace!("registered route {} params={:?}", route.pattern, route.param_names);
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    /// First registered route that fits `path`
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        self.routes.iter().find_map(|route| {
            route.bind(path).map(|params| RouteMatch { route, params })
        })
    }
}
