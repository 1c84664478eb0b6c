//! Lenient HTML fragment tree.
//!
//! Only as much structure as the linker needs: elements keep their original
//! open/close tag text, comments and other markup are opaque, and text keeps its
//! raw source so untouched nodes serialize byte-for-byte.

use std::collections::HashMap;
use std::ops::Range;

/// Elements whose content is never parsed as markup
const RAW_TEXT: [&str; 4] = ["script", "style", "textarea", "title"];

const VOID: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Character data exactly as written (entities still encoded)
    Text(String),
    Element(Element),
    /// Comments, doctypes, stray end tags and raw-text element bodies
    Markup(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name
    pub name: String,
    pub open: String,
    pub children: Vec<Node>,
    /// `None` for void, self-closed or never-closed elements
    pub close: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

/// A text leaf in document order, with whether any ancestor is in `skip`
#[derive(Debug)]
pub struct TextLeaf<'a> {
    pub index: usize,
    pub raw: &'a str,
    pub inside_skipped: bool,
}

impl Fragment {
    pub fn parse(html: &str) -> Self {
        Parser { src: html, pos: 0 }.run()
    }

    /// Every text leaf, numbered in document order
    pub fn text_leaves<'a>(&'a self, skip: &[&str]) -> Vec<TextLeaf<'a>> {
        fn walk<'a>(nodes: &'a [Node], skip: &[&str], skipped: bool, out: &mut Vec<TextLeaf<'a>>) {
            for node in nodes {
                match node {
                    Node::Text(raw) => {
                        let index = out.len();
                        out.push(TextLeaf { index, raw: raw.as_str(), inside_skipped: skipped });
                    }
                    Node::Element(el) => {
                        let skipped = skipped || skip.contains(&el.name.as_str());
                        walk(&el.children, skip, skipped, out);
                    }
                    Node::Markup(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, skip, false, &mut out);
        out
    }

    /// Serialize, substituting text leaves by their document-order index
    pub fn serialize_with(&self, replacements: &HashMap<usize, String>) -> String {
        fn write(nodes: &[Node], repl: &HashMap<usize, String>, counter: &mut usize, out: &mut String) {
            for node in nodes {
                match node {
                    Node::Text(raw) => {
                        match repl.get(&*counter) {
                            Some(html) => out.push_str(html),
                            None => out.push_str(raw),
                        }
                        *counter += 1;
                    }
                    Node::Element(el) => {
                        out.push_str(&el.open);
                        write(&el.children, repl, counter, out);
                        if let Some(close) = &el.close {
                            out.push_str(close);
                        }
                    }
                    Node::Markup(m) => out.push_str(m),
                }
            }
        }
        let mut out = String::new();
        let mut counter = 0;
        write(&self.nodes, replacements, &mut counter, &mut out);
        out
    }

    pub fn serialize(&self) -> String {
        self.serialize_with(&HashMap::new())
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

/// An element still waiting for its end tag
struct Open {
    name: String,
    open: String,
    children: Vec<Node>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn run(mut self) -> Fragment {
        let mut root: Vec<Node> = Vec::new();
        let mut stack: Vec<Open> = Vec::new();

        while self.pos < self.src.len() {
            let rest = self.rest();
            let node = if rest.starts_with("<!--") {
                let len = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
                Some(Node::Markup(self.take(len).to_string()))
            } else if rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                let raw = self.take(tag_len(rest)).to_string();
                let name = tag_name(&raw[2..]);
                match stack.iter().rposition(|o| o.name == name) {
                    Some(at) => {
                        // Anything opened after the matching element closes implicitly
                        while stack.len() > at + 1 {
                            close_top(&mut stack, &mut root, None);
                        }
                        close_top(&mut stack, &mut root, Some(raw));
                        None
                    }
                    None => Some(Node::Markup(raw)),
                }
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                Some(Node::Markup(self.take(tag_len(rest)).to_string()))
            } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                let open = self.take(tag_len(rest)).to_string();
                let name = tag_name(&open[1..]);
                if VOID.contains(&name.as_str()) || open.ends_with("/>") {
                    Some(Node::Element(Element { name, open, children: Vec::new(), close: None }))
                } else if RAW_TEXT.contains(&name.as_str()) {
                    Some(Node::Element(self.raw_text_element(name, open)))
                } else {
                    stack.push(Open { name, open, children: Vec::new() });
                    None
                }
            } else {
                // Text runs to the next thing that can start markup
                let len = next_markup(rest).unwrap_or(rest.len());
                Some(Node::Text(self.take(len).to_string()))
            };

            if let Some(node) = node {
                push_node(&mut stack, &mut root, node);
            }
        }

        while !stack.is_empty() {
            close_top(&mut stack, &mut root, None);
        }
        Fragment { nodes: root }
    }

    fn take(&mut self, len: usize) -> &'a str {
        let s = &self.src[self.pos..self.pos + len];
        self.pos += len;
        s
    }

    fn raw_text_element(&mut self, name: String, open: String) -> Element {
        let rest = self.rest();
        let needle = format!("</{}", name);
        let body_len = rest.to_ascii_lowercase().find(&needle).unwrap_or(rest.len());
        let body = self.take(body_len).to_string();
        let close = if self.pos < self.src.len() {
            Some(self.take(tag_len(self.rest())).to_string())
        } else {
            None
        };
        let children = if body.is_empty() { Vec::new() } else { vec![Node::Markup(body)] };
        Element { name, open, children, close }
    }
}

fn push_node(stack: &mut [Open], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

fn close_top(stack: &mut Vec<Open>, root: &mut Vec<Node>, close: Option<String>) {
    if let Some(o) = stack.pop() {
        let el = Node::Element(Element { name: o.name, open: o.open, children: o.children, close });
        push_node(stack, root, el);
    }
}

/// Length of a tag starting at `s[0] == '<'`, honouring quoted attribute values
fn tag_len(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    s.len()
}

fn tag_name(after_lt: &str) -> String {
    after_lt
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Offset of the next `<` that begins a tag, comment or declaration
fn next_markup(s: &str) -> Option<usize> {
    s.char_indices().skip(1).map(|(i, _)| i).find(|&i| starts_markup(&s[i..]))
}

fn starts_markup(s: &str) -> bool {
    let mut chars = s.chars();
    if chars.next() != Some('<') {
        return false;
    }
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '!' || c == '?' => true,
        Some('/') => chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false),
        _ => false,
    }
}

/// Longest reference name looked at; the HTML named-reference table tops out below this
const MAX_REFERENCE_LEN: usize = 32;

/// Text with character references decoded.
///
/// Only a handful of references are decoded. Any other named reference stays as
/// written, and the offset of its `&` is kept so escaping passes it through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    verbatim: Vec<usize>,
}

impl DecodedText {
    /// Plain text; every `&` in it is literal
    pub fn plain(text: &str) -> Self {
        DecodedText { text: text.to_string(), verbatim: Vec::new() }
    }

    /// Escape `text[range]` for element content the way a DOM serializer does
    pub fn escape(&self, range: Range<usize>) -> String {
        let start = range.start;
        let mut out = String::with_capacity(range.len());
        for (i, c) in self.text[range].char_indices() {
            if c == '&' && self.verbatim.binary_search(&(start + i)).is_ok() {
                out.push('&');
                continue;
            }
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '\u{a0}' => out.push_str("&nbsp;"),
                c => out.push(c),
            }
        }
        out
    }
}

/// Decode character references in raw text
pub fn decode_text(raw: &str) -> DecodedText {
    let mut out = String::with_capacity(raw.len());
    let mut verbatim = Vec::new();
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let name = rest[1..]
            .find(';')
            .filter(|&semi| semi <= MAX_REFERENCE_LEN)
            .map(|semi| &rest[1..semi + 1]);
        match name.and_then(|n| decode_reference(n).map(|c| (c, n.len() + 2))) {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                if name.is_some_and(is_reference_name) {
                    verbatim.push(out.len());
                }
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    DecodedText { text: out, verbatim }
}

fn is_reference_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic()) && name.chars().all(|c| c.is_ascii_alphanumeric())
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
