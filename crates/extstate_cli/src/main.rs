//! extstate CLI
//!
//! Command-line tools for inspecting and editing a file-backed session store.
//!
//! # Commands
//!
//! - `inspect` - Display every reserved field and the login state
//! - `login` - Write a login record with a fresh one-hour expiry
//! - `consent` / `searching` - Read or write a boolean flag
//! - `user-id` - Read (creating if absent) or overwrite the user identifier
//! - `metadata` - Read or overwrite the cached profile metadata

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// extstate session store tools.
#[derive(Parser)]
#[command(name = "extstate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Namespace prepended to the reserved keys
    #[arg(global = true, long)]
    prefix: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display every reserved field and the login state
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a login record expiring one hour from now
    Login {
        /// Whether the user is logged in
        #[arg(action = clap::ArgAction::Set)]
        logged_in: bool,
    },

    /// Read or write the consent flag
    Consent {
        /// New value; omit to read
        value: Option<bool>,
    },

    /// Read or write the searching flag
    Searching {
        /// New value; omit to read
        value: Option<bool>,
    },

    /// Read the user identifier, creating one if absent
    UserId {
        /// Overwrite the identifier instead of reading it
        #[arg(short, long)]
        set: Option<String>,
    },

    /// Read or overwrite the cached profile metadata
    Metadata {
        /// JSON file holding the new metadata record
        #[arg(short, long)]
        set: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("extstate CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("extstate core v{}", extstate_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Store path required (--path)")?;
    let session = commands::open_session(&path, cli.prefix.as_deref())?;

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&session, &path, &format).await?,
        Commands::Login { logged_in } => commands::flags::login(&session, logged_in).await?,
        Commands::Consent { value } => commands::flags::consent(&session, value).await?,
        Commands::Searching { value } => commands::flags::searching(&session, value).await?,
        Commands::UserId { set } => commands::user::user_id(&session, set.as_deref()).await?,
        Commands::Metadata { set } => commands::user::metadata(&session, set.as_deref()).await?,
        Commands::Version => {}
    }

    Ok(())
}
