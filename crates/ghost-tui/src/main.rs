use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ghost_core::{Config, Conversation, Dispatch, Endpoints, PicoClient};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "ghost")]
#[command(about = "Terminal chat with a hosted LLM and image generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Text-completion endpoint for this run
    #[arg(long, global = true)]
    text_endpoint: Option<String>,

    /// Image-generation endpoint for this run
    #[arg(long, global = true)]
    image_endpoint: Option<String>,

    /// Log file (defaults to the user cache directory)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single prompt and print the reply (prefix with /image for an image link)
    Ask {
        /// The prompt
        prompt: String,
    },
    /// Show the effective endpoints; with flags, save them to the config file
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match cli.log_file.clone() {
        Some(path) => Ok(path),
        None => logging::default_log_path(),
    };
    if let Err(e) = log_path.and_then(|path| logging::init(&path)) {
        eprintln!("warning: logging disabled: {}", e);
    }

    // A config file that fails to load must not be overwritten
    if let Some(Commands::Config) = cli.command {
        let path = Config::get_config_path()?;
        return update_config(&path, cli.text_endpoint, cli.image_endpoint, &mut io::stdout());
    }

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::new()
    });
    let endpoints =
        Endpoints::from_config(&config).with_overrides(cli.text_endpoint, cli.image_endpoint);

    match cli.command {
        Some(Commands::Ask { prompt }) => {
            let dispatcher = Arc::new(PicoClient::new(endpoints));
            ask(dispatcher, &prompt, &mut io::stdout()).await
        }
        _ => run_tui(endpoints).await,
    }
}

fn update_config(
    path: &Path,
    text: Option<String>,
    image: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    let mut config = Config::load_from(path)?;

    if text.is_some() || image.is_some() {
        if text.is_some() {
            config.text_endpoint = text;
        }
        if image.is_some() {
            config.image_endpoint = image;
        }
        config.save_to(path)?;
        writeln!(out, "Saved {}", path.display())?;
    }

    let endpoints = Endpoints::from_config(&config);
    writeln!(out, "text:  {}", endpoints.text)?;
    writeln!(out, "image: {}", endpoints.image)?;
    Ok(())
}

/// Send one prompt and write the reply. A blank prompt sends nothing.
async fn ask(dispatcher: Arc<dyn Dispatch>, prompt: &str, out: &mut impl Write) -> Result<()> {
    let mut conversation = Conversation::new(dispatcher);

    if !conversation.submit(prompt) {
        return Ok(());
    }
    conversation.wait().await;

    if let Some(reply) = conversation.messages().last() {
        writeln!(out, "{}", reply.content())?;
    }
    Ok(())
}

async fn run_tui(endpoints: Endpoints) -> Result<()> {
    tracing::info!("starting ghost");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(Arc::new(PicoClient::new(endpoints)));

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    app.shutdown();
    tui::restore()?;
    tracing::info!("ghost exited");
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
