use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, sleep_until};

use bbsarchive::browser::theme::{MemoryPreferenceStore, PreferenceStore, STORAGE_KEY, open_store};
use bbsarchive::browser::{App, CommandProcessor, Theme, ThemeManager};
use bbsarchive::config::Config;
use bbsarchive::source::DataSource;

#[derive(Parser)]
#[command(name = "bbsarchive")]
#[command(about = "Read-only browser for archived bulletin board threads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Behave as if the system prefers a dark colour scheme
    #[arg(long, global = true)]
    system_dark: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Render one location (e.g. /tuna/42/5) as a full HTML page
    Render {
        location: String,
        /// Write the page to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Theme for this page only; the stored preference is left alone
        #[arg(long)]
        theme: Option<String>,
    },
    /// Browse interactively from the terminal
    Browse {
        /// Starting location; the default board when omitted
        location: Option<String>,
    },
    /// Show configured boards and their thread counts
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        init_logging(cli.verbose, "info");
        info!("Initializing new archive configuration");
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = Config::load_or_default(&cli.config).await?;
    init_logging(cli.verbose, &config.logging.level);
    info!("Starting bbsarchive v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Init => {}
        Commands::Render { location, output, theme } => {
            let store: Box<dyn PreferenceStore> = match theme.as_deref() {
                Some(raw) => {
                    let theme = Theme::parse(raw).ok_or_else(|| anyhow!("Unknown theme '{}'", raw))?;
                    let mut memory = MemoryPreferenceStore::new();
                    memory.set(STORAGE_KEY, theme.as_str())?;
                    Box::new(memory)
                }
                None => open_store(config.preferences.file.as_deref())?,
            };
            let mut app = build_app(config, store, cli.system_dark, &location);
            app.start().await;
            let page = app.render();
            match output {
                Some(path) => {
                    tokio::fs::write(&path, page).await
                        .map_err(|e| anyhow!("Failed to write page {}: {}", path, e))?;
                    info!("Wrote {} ({})", path, app.summary());
                }
                None => println!("{}", page),
            }
        }
        Commands::Browse { location } => {
            let store = open_store(config.preferences.file.as_deref())?;
            let start = location.unwrap_or_default();
            let mut app = build_app(config, store, cli.system_dark, &start);
            app.start().await;
            browse(&mut app).await?;
        }
        Commands::Status => {
            let mut app = build_app(config, Box::new(MemoryPreferenceStore::new()), cli.system_dark, "");
            println!("Data: {}", app.config().archive.data_base_url);
            for (id, count) in app.board_status().await {
                let name = app.config().board_name(&id).to_string();
                match count {
                    Ok(n) => println!("{:<12} {:<16} {} threads", id, name, n),
                    Err(e) => {
                        error!("Board {} unavailable: {}", id, e);
                        println!("{:<12} {:<16} unavailable", id, name);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Logging based on verbosity; `RUST_LOG` still wins
fn init_logging(verbose: u8, configured: &str) {
    let log_level = match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .init();
}

fn build_app(config: Config, store: Box<dyn PreferenceStore>, system_dark: bool, location: &str) -> App {
    let theme = ThemeManager::init(store, system_dark);
    let source = DataSource::from_config(config.clone());
    let location = location.trim();
    let hash = if location.is_empty() || location.starts_with('#') {
        location.to_string()
    } else if location.starts_with('/') {
        format!("#{}", location)
    } else {
        format!("#/{}", location)
    };
    App::new(config, source, theme).with_location(&hash)
}

/// Read commands from stdin until quit or EOF, firing debounced searches in between
async fn browse(app: &mut App) -> Result<()> {
    let processor = CommandProcessor::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", app.summary());
    prompt()?;
    loop {
        let deadline = app.debouncer().deadline().map(Instant::from_std);
        let wake = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let reply = processor.process(app, &line, std::time::Instant::now()).await?;
                if !reply.text.is_empty() {
                    println!("{}", reply.text);
                }
                if reply.quit {
                    break;
                }
                prompt()?;
            }
            _ = sleep_until(wake), if deadline.is_some() => {
                if app.tick(std::time::Instant::now()) {
                    println!();
                    println!("{}", app.summary());
                    prompt()?;
                }
            }
        }
    }
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
