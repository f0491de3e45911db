use std::sync::Arc;

use anyhow::{bail, Result};
use askdocs_core::{AskClient, ChatSession, Config, MessageKind};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "askdocs")]
#[command(version, about = "Chat with a documentation Q&A service from the terminal")]
struct Cli {
    /// Base URL of the Q&A service (overrides ASKDOCS_ENDPOINT and the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Check whether the service has its index loaded
    Health,
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the endpoint that would be used and where config is stored
    Show,
    /// Save the endpoint to the config file
    SetEndpoint { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {}", e);
        Config::new()
    });
    let env_endpoint = std::env::var(askdocs_core::config::ENDPOINT_ENV).ok();
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref(), env_endpoint.as_deref());

    match cli.command {
        None => run_tui(endpoint, cli.verbose).await,
        Some(command) => {
            logging::init_stderr(cli.verbose);
            match command {
                Commands::Ask { question } => ask_once(&endpoint, &question.join(" ")).await,
                Commands::Health => check_health(&endpoint).await,
                Commands::Config { action } => run_config(action, &endpoint),
            }
        }
    }
}

async fn run_tui(endpoint: String, verbose: u8) -> Result<()> {
    let (_guard, log_path) = logging::init_file(verbose)?;
    info!(%endpoint, log = %log_path.display(), "starting askdocs");

    let client = AskClient::new(&endpoint);
    let session = ChatSession::new(Arc::new(client));
    let mut app = App::new(session, endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            warn!("event stream closed");
            break;
        };
        handler::handle_event(app, event).await?;
    }
    Ok(())
}

async fn ask_once(endpoint: &str, question: &str) -> Result<()> {
    let client = AskClient::new(endpoint);
    let mut session = ChatSession::new(Arc::new(client));

    let reply = match session.ask_once(question).await {
        Ok(reply) => reply,
        Err(_) => bail!("Please provide a question. Usage: askdocs ask \"your question here\""),
    };

    println!("\nQ: {}", question.trim());
    match reply.kind {
        MessageKind::Error => bail!("{}", reply.content),
        _ => {
            println!("\nA: {}", reply.content);
            if !reply.sources.is_empty() {
                println!("\nSources:");
                for url in &reply.sources {
                    println!("- {}", url);
                }
            }
        }
    }
    Ok(())
}

async fn check_health(endpoint: &str) -> Result<()> {
    let client = AskClient::new(endpoint);
    let health = client.health().await?;

    println!("Service:      {} ({})", client.base_url(), health.status);
    println!("Index loaded: {}", if health.index_loaded { "yes" } else { "no" });
    println!("QA ready:     {}", if health.qa_chain_ready { "yes" } else { "no" });

    if !health.is_ready() {
        bail!("Service is up but not ready to answer questions");
    }
    Ok(())
}

fn run_config(action: ConfigAction, endpoint: &str) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Endpoint: {}", endpoint);
            println!("Config:   {}", Config::get_config_path()?.display());
        }
        ConfigAction::SetEndpoint { url } => {
            Config::save_endpoint(&url)?;
            println!("Saved endpoint {}", url);
        }
    }
    Ok(())
}
