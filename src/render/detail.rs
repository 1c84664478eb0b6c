//! Thread detail page and response cards.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::config::Config;
use crate::linker::{LinkContext, process_content};
use crate::router::{SeqTarget, build_href, encode_component};
use crate::source::{Response, ThreadDetail};
use super::{escape_html, format_timestamp};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

fn youtube_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^[a-zA-Z0-9_-]{11}$",
            r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
            r"youtube\.com/v/([a-zA-Z0-9_-]{11})",
        ]
        .map(|p| Regex::new(p).expect("youtube regex should be valid"))
    })
}

/// Video id from a bare id or a YouTube watch/short/embed link
pub fn extract_youtube_id(input: &str) -> Option<String> {
    let [bare, links @ ..] = youtube_patterns();
    if bare.is_match(input) {
        return Some(input.to_string());
    }
    links.iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_image_attachment(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

fn render_attachment(config: &Config, board_id: &str, filename: &str) -> String {
    let url = escape_html(&config.attachment_url(board_id, filename));
    if is_image_attachment(filename) {
        format!(
            r#"<div class="response-attachment"><a href="{url}" target="_blank"><img src="{url}" alt="Attachment" class="attachment-image" loading="lazy"></a></div>"#,
            url = url
        )
    } else {
        format!(
            r#"<div class="response-attachment"><a href="{}" target="_blank" class="attachment-link">{}</a></div>"#,
            url,
            escape_html(filename)
        )
    }
}

fn render_youtube(video_id: &str) -> String {
    format!(
        r#"<div class="response-attachment"><div class="youtube-embed"><iframe src="https://www.youtube.com/embed/{}" allowfullscreen loading="lazy"></iframe></div></div>"#,
        escape_html(video_id)
    )
}

pub fn render_response(config: &Config, board_id: &str, thread_id: &str, response: &Response, highlighted: bool) -> String {
    let attachment = response.attachment.as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| render_attachment(config, board_id, a))
        .unwrap_or_default();
    let youtube = response.youtube.as_deref()
        .and_then(extract_youtube_id)
        .map(|id| render_youtube(&id))
        .unwrap_or_default();
    let ctx = LinkContext { board_id, thread_id };
    format!(
        r##"<article class="response-card{hl}" id="response-{seq}">
<header class="response-header">
<span class="response-seq"><a href="#{permalink}">#{seq}</a></span>
<span class="response-username">{user}</span>
<span class="response-author-id">({uid})</span>
<span class="response-date">{date}</span>
</header>
{attachment}{youtube}<div class="response-content">{content}</div>
</article>
"##,
        hl = if highlighted { " highlighted" } else { "" },
        seq = response.sequence,
        permalink = escape_html(&build_href(board_id, thread_id, Some(SeqTarget::Single(response.sequence)))),
        user = escape_html(&response.username),
        uid = escape_html(&response.user_id),
        date = escape_html(&format_timestamp(&response.created_at)),
        attachment = attachment,
        youtube = youtube,
        content = process_content(&response.content, ctx),
    )
}

/// Element id the view should scroll to: the first highlighted sequence that
/// actually exists in this thread
pub fn scroll_target(thread: &ThreadDetail, highlight: &BTreeSet<u32>) -> Option<String> {
    highlight.iter()
        .find(|seq| thread.response(**seq).is_some())
        .map(|seq| format!("response-{}", seq))
}

pub fn render_thread_detail(config: &Config, board_id: &str, thread: &ThreadDetail, highlight: &BTreeSet<u32>) -> String {
    let thread_id = thread.thread_id.to_string();
    let responses: String = thread.responses.iter()
        .map(|r| render_response(config, board_id, &thread_id, r, highlight.contains(&r.sequence)))
        .collect();
    format!(
        r##"<a href="#/{board}" class="back-link">&larr; Back to list</a>
<header class="thread-header">
<h1 class="thread-title">{title}</h1>
<div class="thread-meta">
<div class="thread-meta-item"><span class="thread-meta-label">Author:</span> <span class="thread-meta-value">{user}</span></div>
<div class="thread-meta-item"><span class="thread-meta-label">Responses:</span> <span class="thread-meta-value">{size}</span></div>
<div class="thread-meta-item"><span class="thread-meta-label">Created:</span> <span class="thread-meta-value">{created}</span></div>
<div class="thread-meta-item"><span class="thread-meta-label">Updated:</span> <span class="thread-meta-value">{updated}</span></div>
</div>
</header>
<div class="response-list">
{responses}</div>"##,
        board = escape_html(&encode_component(board_id)),
        title = escape_html(&thread.title),
        user = escape_html(&thread.username),
        size = thread.size,
        created = escape_html(&format_timestamp(&thread.created_at)),
        updated = escape_html(&format_timestamp(&thread.updated_at)),
        responses = responses,
    )
}
