use anyhow::Result;
use log::debug;
use std::time::Instant;

use crate::router::build_board_href;
use super::app::App;
use super::theme::Theme;

const HELP: &str = "Commands:
  go <path>       open a location, e.g. go /tuna/42/5
  search <text>   type into the search box (filters after a short pause)
  enter <text>    search immediately
  page <n>        jump to a page of the current list
  back            previous location
  theme [light|dark]  toggle or set the theme
  menu            open/close the board menu
  show            print the current page
  status          thread counts per board
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Go(String),
    Search(String),
    Enter(String),
    Page(usize),
    Back,
    Theme(Option<Theme>),
    Menu,
    Show,
    Status,
    Help,
    Quit,
    Unknown(String),
    Invalid(String),
}

/// Parser for one line typed at the browse prompt
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self { Self }

    pub fn parse(&self, raw: &str) -> BrowseCommand {
        let trimmed = raw.trim();
        let (word, raw_rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
        let rest = raw_rest.trim();
        match word.to_ascii_lowercase().as_str() {
            "go" | "g" => {
                if rest.is_empty() {
                    return BrowseCommand::Invalid("Location required".into());
                }
                BrowseCommand::Go(normalize_location(rest))
            }
            // the raw remainder is kept; a search box sees untrimmed input
            "search" | "s" => BrowseCommand::Search(raw_rest.to_string()),
            "enter" | "e" => BrowseCommand::Enter(rest.to_string()),
            "page" | "p" => match rest.parse::<usize>() {
                Ok(n) if n >= 1 => BrowseCommand::Page(n),
                _ => BrowseCommand::Invalid("Page number required".into()),
            },
            "back" | "b" => BrowseCommand::Back,
            "theme" | "t" => match rest {
                "" => BrowseCommand::Theme(None),
                other => match Theme::parse(other) {
                    Some(theme) => BrowseCommand::Theme(Some(theme)),
                    None => BrowseCommand::Invalid(format!("Unknown theme '{}'", other)),
                },
            },
            "menu" | "m" => BrowseCommand::Menu,
            "show" => BrowseCommand::Show,
            "status" => BrowseCommand::Status,
            "help" | "h" | "?" => BrowseCommand::Help,
            "quit" | "q" | "exit" => BrowseCommand::Quit,
            "" => BrowseCommand::Unknown(String::new()),
            _ => BrowseCommand::Unknown(trimmed.to_string()),
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self { Self::new() }
}

fn normalize_location(raw: &str) -> String {
    let path = raw.trim_start_matches('#');
    if path.starts_with('/') { path.to_string() } else { format!("/{}", path) }
}

/// Text to print after a command, and whether the session is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Reply { text: text.into(), quit: false }
    }
}

/// Applies browse commands to an [`App`]
pub struct CommandProcessor {
    parser: CommandParser,
}

impl CommandProcessor {
    pub fn new() -> Self {
        CommandProcessor { parser: CommandParser::new() }
    }

    pub async fn process(&self, app: &mut App, line: &str, now: Instant) -> Result<Reply> {
        let command = self.parser.parse(line);
        debug!("browse command {:?}", command);

        let reply = match command {
            BrowseCommand::Go(path) => {
                app.navigate(&path);
                app.run_pending().await;
                Reply::say(app.summary())
            }
            BrowseCommand::Search(text) => {
                if app.ui().list_view().is_none() {
                    Reply::say("Search is only available on a thread list.")
                } else {
                    app.search_input(&text, now);
                    Reply::say("")
                }
            }
            BrowseCommand::Enter(text) => {
                if app.submit_search(&text) {
                    Reply::say(app.summary())
                } else {
                    Reply::say("Search is only available on a thread list.")
                }
            }
            BrowseCommand::Page(n) => match app.ui().list_view() {
                Some(list) => {
                    let href = build_board_href(&list.board_id, n, &list.query);
                    app.navigate(&href);
                    app.run_pending().await;
                    Reply::say(app.summary())
                }
                None => Reply::say("Not on a thread list."),
            },
            BrowseCommand::Back => {
                if app.go_back() {
                    app.run_pending().await;
                    Reply::say(app.summary())
                } else {
                    Reply::say("No previous location.")
                }
            }
            BrowseCommand::Theme(None) => {
                let theme = app.toggle_theme()?;
                Reply::say(format!("Theme: {}", theme.as_str()))
            }
            BrowseCommand::Theme(Some(theme)) => {
                app.set_theme(theme)?;
                Reply::say(format!("Theme: {}", theme.as_str()))
            }
            BrowseCommand::Menu => {
                app.toggle_sidebar();
                let state = if app.ui().sidebar_open { "open" } else { "closed" };
                Reply::say(format!("Menu {}", state))
            }
            BrowseCommand::Show => Reply::say(app.render()),
            BrowseCommand::Status => {
                let mut out = String::from("Boards:\n");
                for (id, count) in app.board_status().await {
                    let name = app.config().board_name(&id).to_string();
                    match count {
                        Ok(n) => out.push_str(&format!("  {} ({}): {} threads\n", name, id, n)),
                        Err(e) => out.push_str(&format!("  {} ({}): unavailable ({})\n", name, id, e)),
                    }
                }
                out.push_str(&format!("Cached responses: {}", app.source().cached_len()));
                Reply::say(out)
            }
            BrowseCommand::Help => Reply::say(HELP),
            BrowseCommand::Quit => Reply { text: "Bye.".into(), quit: true },
            BrowseCommand::Unknown(raw) if raw.is_empty() => Reply::say(""),
            BrowseCommand::Unknown(_) => Reply::say("Unknown command. Type HELP for commands."),
            BrowseCommand::Invalid(reason) => Reply::say(reason),
        };
        Ok(reply)
    }
}

impl Default for CommandProcessor {
    fn default() -> Self { Self::new() }
}
