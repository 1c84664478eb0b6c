use bbsarchive::router::{Router, SeqTarget, build_board_href, build_href, parse_location};

fn archive_router() -> Router<&'static str> {
    let mut r = Router::new();
    r.register("/:boardId", "board");
    r.register("/:boardId/:threadId", "thread");
    r.register("/:boardId/:threadId/:seq", "responses");
    r
}

#[test]
fn archive_routes_resolve_by_segment_count() {
    let r = archive_router();
    let m = r.match_path("/tuna").expect("board");
    assert_eq!(m.route.handler, "board");
    assert_eq!(m.params["boardId"], "tuna");

    let m = r.match_path("/tuna/42").expect("thread");
    assert_eq!(m.route.handler, "thread");
    assert_eq!(m.params["threadId"], "42");

    let m = r.match_path("/tuna/42/5-10").expect("responses");
    assert_eq!(m.route.handler, "responses");
    assert_eq!(m.params["seq"], "5-10");

    assert!(r.match_path("/").is_none());
    assert!(r.match_path("/a/b/c/d").is_none());
}

#[test]
fn first_registered_match_wins() {
    let mut r = Router::new();
    r.register("/:boardId/:threadId", "generic");
    r.register("/tuna/:threadId", "specific");
    assert_eq!(r.match_path("/tuna/1").unwrap().route.handler, "generic");
}

#[test]
fn params_are_percent_decoded() {
    let r = archive_router();
    let m = r.match_path("/%ED%95%9C/7").unwrap();
    assert_eq!(m.params["boardId"], "한");
}

#[test]
fn location_splits_on_first_question_mark() {
    let loc = parse_location("#/tuna?page=2&q=a?b");
    assert_eq!(loc.path, "/tuna");
    assert_eq!(loc.query["page"], "2");
    assert_eq!(loc.query["q"], "a?b");

    let empty = parse_location("");
    assert_eq!(empty.path, "/");
    assert!(empty.query.is_empty());
}

#[test]
fn built_hrefs_route_back_to_their_parts() {
    let r = archive_router();
    let cases = [
        ("tuna", "42", None),
        ("situplay", "7", Some(SeqTarget::Single(3))),
        ("anchor", "1001", Some(SeqTarget::Range(2, 9))),
        ("보드 이름", "5", Some(SeqTarget::Single(1))),
    ];
    for (board, thread, target) in cases {
        let href = build_href(board, thread, target);
        let m = r.match_path(&href).expect("built href should match");
        assert_eq!(m.params["boardId"], board);
        assert_eq!(m.params["threadId"], thread);
        assert_eq!(m.params.get("seq").and_then(|s| SeqTarget::parse(s)), target);
    }
}

#[test]
fn board_hrefs_omit_defaults() {
    assert_eq!(build_board_href("tuna", 1, ""), "/tuna");
    assert_eq!(build_board_href("tuna", 3, ""), "/tuna?page=3");
    assert_eq!(build_board_href("tuna", 1, "a b"), "/tuna?q=a%20b");
    assert_eq!(build_board_href("tuna", 2, "x&y"), "/tuna?page=2&q=x%26y");

    let loc = parse_location(&build_board_href("tuna", 2, "x&y"));
    assert_eq!(loc.query["q"], "x&y");
}

#[test]
fn sequence_targets() {
    assert_eq!(SeqTarget::parse("5"), Some(SeqTarget::Single(5)));
    let range = SeqTarget::parse("5-7").unwrap();
    assert!(range.contains(5) && range.contains(7));
    assert!(!range.contains(4) && !range.contains(8));
    let reversed = SeqTarget::parse("9-3").unwrap();
    assert!((0..20).all(|n| !reversed.contains(n)));
    assert_eq!(SeqTarget::parse("abc"), None);
}
