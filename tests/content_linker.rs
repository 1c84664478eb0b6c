use bbsarchive::linker::{LinkContext, LinkKind, process_content, scan};

const CTX: LinkContext<'static> = LinkContext { board_id: "tuna", thread_id: "42" };

fn internal(text: &str) -> Vec<String> {
    scan(text, CTX)
        .into_iter()
        .filter_map(|s| match s.kind {
            LinkKind::Internal(path) => Some(path),
            LinkKind::External(_) => None,
        })
        .collect()
}

#[test]
fn cross_reference_forms() {
    assert_eq!(internal(">>5"), ["/tuna/42/5"]);
    assert_eq!(internal(">>5-10"), ["/tuna/42/5-10"]);
    assert_eq!(internal(">99>"), ["/tuna/99"]);
    assert_eq!(internal(">99>3"), ["/tuna/99/3"]);
    assert_eq!(internal("anchor>7>2-4"), ["/anchor/7/2-4"]);
    assert_eq!(internal("see >>1 and >>2"), ["/tuna/42/1", "/tuna/42/2"]);
}

#[test]
fn plain_comparisons_are_not_links() {
    assert!(scan("3 > 2", CTX).is_empty());
    assert!(scan("no links here", CTX).is_empty());
}

#[test]
fn escaped_references_in_html_are_linked() {
    let out = process_content("<p>&gt;&gt;5 thanks</p>", CTX);
    assert_eq!(
        out,
        r##"<p><a href="#/tuna/42/5" class="anchor-link">&gt;&gt;5</a> thanks</p>"##
    );
}

#[test]
fn external_urls_open_in_new_tab() {
    let out = process_content("go to https://example.com/x?a=1&amp;b=2 now", CTX);
    assert_eq!(
        out,
        r#"go to <a href="https://example.com/x?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">https://example.com/x?a=1&amp;b=2</a> now"#
    );
}

#[test]
fn surrounding_markup_is_preserved() {
    let html = r#"<div class="q"><b>&gt;&gt;3</b><br><img src="a.png" alt="x > y"> tail</div>"#;
    let out = process_content(html, CTX);
    assert!(out.starts_with(r##"<div class="q"><b><a href="#/tuna/42/3" class="anchor-link">&gt;&gt;3</a></b><br><img src="a.png" alt="x > y"> tail</div>"##));
}

#[test]
fn existing_anchors_are_left_alone() {
    let html = r#"<a href="https://x.io">https://x.io</a> &gt;&gt;1"#;
    let out = process_content(html, CTX);
    assert_eq!(
        out,
        r##"<a href="https://x.io">https://x.io</a> <a href="#/tuna/42/1" class="anchor-link">&gt;&gt;1</a>"##
    );
}

#[test]
fn linking_twice_changes_nothing() {
    let samples = [
        "&gt;&gt;5-10 and https://a.b/c",
        "<p>anchor&gt;7&gt;2-4</p><p>&gt;99&gt;</p>",
        "<script>var s = '>>1';</script>&gt;&gt;2",
        "plain text",
    ];
    for html in samples {
        let once = process_content(html, CTX);
        assert_eq!(process_content(&once, CTX), once, "input: {}", html);
    }
}

#[test]
fn script_bodies_are_not_scanned() {
    let html = "<script>if (a >>1 > b) {}</script>";
    assert_eq!(process_content(html, CTX), html);
}

#[test]
fn unknown_named_references_pass_through() {
    let out = process_content("wait&hellip; &gt;&gt;1 &copy;", CTX);
    assert_eq!(
        out,
        r##"wait&hellip; <a href="#/tuna/42/1" class="anchor-link">&gt;&gt;1</a> &copy;"##
    );

    let out = process_content("&amp;copy; &gt;&gt;2", CTX);
    assert!(out.starts_with("&amp;copy; <a "), "{}", out);
}
