mod app;
mod event;
mod overlays;
mod render;
mod view;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use gitscope_core::ai::DEFAULT_PROXY_BASE;
use gitscope_core::cache::DiskStore;

use app::App;
use event::{spawn_terminal_reader, spawn_tick};

#[derive(Parser)]
#[command(name = "gitscope")]
#[command(about = "Explore a public repository in the terminal with an AI guide", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository to open directly (URL or owner/repo shorthand)
    repo: Option<String>,

    /// Base URL of the gitscope AI proxy
    #[arg(long, default_value = DEFAULT_PROXY_BASE)]
    ai_base: String,

    /// Log file (default: <cache dir>/gitscope.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    url::Url::parse(&cli.ai_base).context("--ai-base is not a valid URL")?;
    init_logging(cli.log_file.clone())?;

    // raw-mode guard: the terminal must be restored on every exit path
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let result = run(cli).await;
    io::stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;

    result
}

async fn run(cli: Cli) -> Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_terminal_reader(tx.clone());
    spawn_tick(tx.clone());

    let mut app = App::new(tx, cli.ai_base);
    app.request_trending();
    if let Some(repo) = cli.repo {
        app.explore(&repo);
    }

    while !app.should_quit {
        let Some(event) = rx.recv().await else {
            break;
        };
        app.handle(event);
        // drain whatever arrived in a burst before paying for a redraw
        while let Ok(pending) = rx.try_recv() {
            app.handle(pending);
            if app.should_quit {
                break;
            }
        }

        if app.dirty && !app.should_quit {
            terminal.draw(|frame| render::render(frame, &mut app))?;
            app.dirty = false;
        }
    }

    Ok(())
}

fn init_logging(log_file: Option<PathBuf>) -> Result<()> {
    let path = log_file.unwrap_or_else(|| DiskStore::open().dir().join("gitscope.log"));
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gitscope=info".into()),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
