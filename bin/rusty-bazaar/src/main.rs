//! # Rusty-Bazaar Binary
//!
//! A headless shell for the marketplace controller: each subcommand builds
//! the page the browser would show, boots the router on it, performs one
//! user action and prints what the page ended up displaying.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bz_api::{MarketApi, RequestGateway};
use bz_core::{KeyValueStore, SessionStore};
use clap::{Parser, Subcommand};
use configs::{ClientConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

mod commands;
mod console;

use commands::Shell;
use console::{ConsoleDialogs, ConsoleNotifier};

// Feature-gated imports: the session backend is picked at compile time
#[cfg(feature = "store-file")]
use bz_store_file::FileStore;

#[cfg(not(feature = "store-file"))]
use bz_core::MemoryStore;

#[derive(Parser)]
#[command(name = "rusty-bazaar")]
#[command(about = "Headless client for a Rusty-Bazaar marketplace", long_about = None)]
struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Overrides `BAZAAR_API_ROOT`
    #[arg(long, global = true)]
    api_root: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and persist the session
    Login { email: String, password: String },
    /// Create an account
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Browse active ads
    Ads {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        category: Option<Uuid>,
    },
    /// Show one ad
    Ad { id: Uuid },
    /// Report an ad to the moderators
    Report { id: Uuid, reason: String },
    /// Close one of your active ads
    Close { id: Uuid },
    /// Message the seller of an ad
    Contact { id: Uuid, text: String },
    /// List your own ads
    MyAds,
    /// Reopen one of your closed ads
    Reopen { id: Uuid },
    /// List your conversations, or open one and optionally reply
    Conversations {
        id: Option<Uuid>,
        #[arg(long)]
        send: Option<String>,
    },
    /// Publish a new ad with optional image files
    CreateAd {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        price: String,
        #[arg(long)]
        category: Uuid,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        location: Option<String>,
        /// Image files, uploaded one by one after the ad is saved
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Show or change your profile
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Admin dashboard: users, categories and reports
    Admin {
        /// Create a category with this name
        #[arg(long)]
        new_category: Option<String>,
    },
    /// Moderator report queue
    Moderator,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::load().context("loading configuration")?;
    if let Some(api_root) = cli.api_root {
        config.api_root = api_root;
    }
    init_tracing(&config);

    let shell = build_shell(&config, cli.yes)?;
    commands::run(&shell, cli.command).await
}

fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},reqwest=warn", config.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Plain => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn build_shell(config: &ClientConfig, assume_yes: bool) -> anyhow::Result<Shell> {
    // 1. Session storage implementation
    #[cfg(feature = "store-file")]
    let storage: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.storage_path)
            .with_context(|| format!("opening session file {}", config.storage_path))?,
    );

    #[cfg(not(feature = "store-file"))]
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let session = Arc::new(SessionStore::new(storage));
    if let Some(token) = &config.access_token {
        if !session.is_authenticated() {
            session
                .set_session(token.clone(), None)
                .context("seeding session from BAZAAR_ACCESS_TOKEN")?;
        }
    }

    // 2. HTTP client and typed API
    let mut client = reqwest::Client::builder();
    if let Some(timeout) = config.request_timeout() {
        client = client.timeout(timeout);
    }
    let client = client.build().context("building HTTP client")?;
    let api = MarketApi::new(RequestGateway::with_client(client, &config.api_root, session));

    tracing::info!(api_root = %config.api_root, "rusty-bazaar ready");

    // 3. The page itself is built per command
    Ok(Shell {
        api: Arc::new(api),
        notifier: Arc::new(ConsoleNotifier),
        dialogs: Arc::new(ConsoleDialogs { assume_yes }),
        search_debounce: config.search_debounce(),
    })
}
