//! Java Cafe CLI - browse the menu, fill the cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! javacafe menu
//! javacafe menu --category coffee
//! javacafe product 5
//!
//! # Cart
//! javacafe cart add 5 -q 2
//! javacafe cart inc 5
//! javacafe cart show
//!
//! # Check out
//! javacafe checkout guest -f Ada -l Lovelace -e ada@example.com
//! javacafe login -e ada@example.com -p secret
//! javacafe checkout member
//! ```
//!
//! The cart and the sign-in persist in `JAVACAFE_DATA_DIR` between runs.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr, reason = "command output")]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use javacafe_core::ProductId;
use javacafe_storefront::config::StorefrontConfig;
use javacafe_storefront::error::AppError;
use javacafe_storefront::state::{AppState, Storefront};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "javacafe")]
#[command(author, version, about = "Java Cafe storefront")]
struct Cli {
    /// Directory holding the cart and sign-in (overrides `JAVACAFE_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the menu
    Menu {
        /// Only show this category (e.g. `coffee`)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show a product with its description
    Product { id: ProductId },
    /// View or edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "JAVACAFE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "JAVACAFE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(short, long)]
        first_name: String,
        #[arg(short, long)]
        last_name: String,
    },
    /// Sign out
    Logout,
    /// Show who is signed in
    Whoami,
    /// Place an order for the cart
    Checkout {
        #[command(subcommand)]
        mode: CheckoutAction,
    },
    /// Send a general inquiry
    Contact {
        #[arg(short, long)]
        first_name: String,
        #[arg(short, long)]
        last_name: String,
        #[arg(short, long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(short, long)]
        subject: String,
        #[arg(short, long)]
        message: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List the cart
    Show,
    /// Add a product
    Add {
        id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        id: ProductId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Add one to a line
    Inc { id: ProductId },
    /// Take one from a line
    Dec { id: ProductId },
    /// Remove a line
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Order as a guest
    Guest {
        #[arg(short, long)]
        first_name: String,
        #[arg(short, long)]
        last_name: String,
        #[arg(short, long)]
        email: String,
    },
    /// Order as the signed-in member, signing in first if credentials are given
    Member {
        #[arg(short, long, requires = "password")]
        email: Option<String>,
        #[arg(short, long, env = "JAVACAFE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
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

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let mut config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "javacafe_storefront=info,javacafe=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        e.report();
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let state = AppState::new(config)?;
    let mut store = Storefront::open(state)?;

    match cli.command {
        Commands::Menu { category } => commands::menu::list(&store, category.as_deref()).await?,
        Commands::Product { id } => commands::menu::show(&store, id).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&store),
            CartAction::Add { id, quantity } => commands::cart::add(&mut store, id, quantity).await?,
            CartAction::Set { id, quantity } => commands::cart::set(&mut store, id, quantity)?,
            CartAction::Inc { id } => commands::cart::adjust(&mut store, id, 1)?,
            CartAction::Dec { id } => commands::cart::adjust(&mut store, id, -1)?,
            CartAction::Remove { id } => commands::cart::remove(&mut store, id)?,
            CartAction::Clear => commands::cart::clear(&mut store)?,
        },
        Commands::Login { email, password } => {
            commands::account::login(&mut store, &email, password).await?;
        }
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            commands::account::register(&mut store, &email, password, &first_name, &last_name)
                .await?;
        }
        Commands::Logout => commands::account::logout(&mut store)?,
        Commands::Whoami => commands::account::whoami(&store),
        Commands::Checkout { mode } => match mode {
            CheckoutAction::Guest {
                first_name,
                last_name,
                email,
            } => commands::checkout::guest(&mut store, &first_name, &last_name, &email).await?,
            CheckoutAction::Member { email, password } => {
                commands::checkout::member(&mut store, email.as_deref(), password).await?;
            }
        },
        Commands::Contact {
            first_name,
            last_name,
            email,
            phone,
            subject,
            message,
        } => {
            let form = javacafe_storefront::contact::ContactForm {
                first_name,
                last_name,
                phone,
                email,
                subject,
                message,
            };
            commands::contact::submit(&store, &form).await?;
        }
    }
    Ok(())
}
