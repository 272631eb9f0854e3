//! `EcoFinds` CLI - database migrations, profiles and carts.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! eco-cli migrate
//!
//! # Create a profile
//! eco-cli profile create -n "Mira"
//!
//! # Work with the local (signed-out) cart
//! eco-cli cart add p1 --title Lamp --price 1200 --qty 2
//! eco-cli cart show
//!
//! # Work with an account's cart
//! eco-cli cart --account 3f2a... checkout
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `profile` - Create, show and rename profiles
//! - `cart` - Cart and checkout operations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecofinds_storefront::config::StorefrontConfig;

mod commands;

use commands::CliError;
use commands::cart::CartAction;
use commands::profile::ProfileAction;

#[derive(Parser)]
#[command(name = "eco-cli")]
#[command(author, version, about = "EcoFinds CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Cart and checkout
    Cart {
        /// Account whose cart to use (omit for the local cart)
        #[arg(short, long, global = true)]
        account: Option<String>,

        #[command(subcommand)]
        action: CartAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels to Sentry: errors and warnings become events, the rest
/// breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Failed to load configuration: {e}");
            }
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ecofinds_storefront=info,ecofinds_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        sentry::capture_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(&config).await,
        Commands::Profile { action } => commands::profile::run(config, action).await,
        Commands::Cart { account, action } => {
            commands::cart::run(config, account.as_deref(), action).await
        }
    }
}
