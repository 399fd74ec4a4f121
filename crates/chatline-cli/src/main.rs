//! chatline CLI: Terminal chat client for a `/chat` endpoint

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chatline_engine::{config_dir, Config, ConversationClient, HttpTransport, MessageList};
use chatline_tui::Theme;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "CHATLINE_LOG";

/// Terminal chat client for a `/chat` endpoint
#[derive(Parser)]
#[command(name = "chatline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/chatline/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chat endpoint URL, overriding the config file
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat window (default when no command specified)
    Tui {
        /// Color theme
        #[arg(long, value_enum, default_value_t = ThemeName::Dark)]
        theme: ThemeName,
    },

    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,

        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ThemeName {
    Dark,
    Light,
    HighContrast,
}

impl ThemeName {
    fn theme(self) -> Theme {
        match self {
            ThemeName::Dark => Theme::mocha(),
            ThemeName::Light => Theme::latte(),
            ThemeName::HighContrast => Theme::high_contrast(),
        }
    }
}

/// Where log output goes.
enum LogTarget {
    /// Append to a file; stderr belongs to the terminal UI.
    File(PathBuf),
    Stderr,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        None => {
            init_logging(&tui_log_target());
            let config = resolve_config(cli.config.as_deref(), cli.endpoint);
            cmd_tui(config, ThemeName::Dark);
        }
        Some(Commands::Tui { theme }) => {
            init_logging(&tui_log_target());
            let config = resolve_config(cli.config.as_deref(), cli.endpoint);
            cmd_tui(config, theme);
        }
        Some(Commands::Send { message, json }) => {
            init_logging(&LogTarget::Stderr);
            let config = resolve_config(cli.config.as_deref(), cli.endpoint);
            cmd_send(config, &message, json);
        }
        Some(Commands::Init { force }) => {
            cmd_init(cli.config.as_deref(), force);
        }
        Some(Commands::Config) => {
            let config = resolve_config(cli.config.as_deref(), cli.endpoint);
            cmd_config(&config);
        }
    }
}

fn tui_log_target() -> LogTarget {
    match config_dir() {
        Ok(dir) => LogTarget::File(dir.join("chatline.log")),
        Err(_) => LogTarget::Stderr,
    }
}

fn init_logging(target: &LogTarget) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::File(path) => {
            let file = path
                .parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|()| OpenOptions::new().create(true).append(true).open(path));
            match file {
                Ok(file) => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                        .init();
                }
                // Logging is optional; the chat window still runs without it.
                Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
            }
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Load the config file, then apply command-line overrides.
fn resolve_config(path: Option<&Path>, endpoint: Option<String>) -> Config {
    let path = config_path(path);
    let mut config = match Config::load_or_default(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    config
}

fn config_path(path: Option<&Path>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    match Config::default_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_tui(config: Config, theme: ThemeName) {
    let rt = runtime();
    if let Err(e) = rt.block_on(chatline_tui::run_tui(config, theme.theme())) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_send(config: Config, message: &str, json: bool) {
    let endpoint = match config.endpoint_url() {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let transport = Arc::new(HttpTransport::new(endpoint));
    info!(endpoint = %transport.endpoint(), "Sending one turn");

    let mut client = ConversationClient::with_config(transport, MessageList::new(), config);

    let rt = runtime();
    let Some(outcome) = rt.block_on(client.send_turn(message)) else {
        eprintln!("Error: message is empty");
        std::process::exit(1);
    };

    if json {
        match serde_json::to_string_pretty(client.transcript()) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Error: failed to serialize transcript: {e}");
                std::process::exit(1);
            }
        }
    } else if let Some(entry) = client.transcript().last() {
        println!("{}", entry.content);
    }

    if !outcome.is_reply() {
        warn!(?outcome, "Turn did not produce a reply");
        std::process::exit(1);
    }
}

fn cmd_init(path: Option<&Path>, force: bool) {
    let path = config_path(path);

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite");
        return;
    }

    match Config::default().save(&path) {
        Ok(()) => println!("Created {}", path.display()),
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config(config: &Config) {
    match serde_json::to_string_pretty(config) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("Error: failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}
