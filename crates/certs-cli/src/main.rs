//! # certs CLI entry point
//!
//! Parses command-line arguments, opens the selected certificate backend,
//! and dispatches to subcommand handlers.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certs_cli::issue::{run_issue, run_update, IssueArgs, UpdateArgs};
use certs_cli::lookup::{run_email, run_list, run_search, run_show, run_verify};
use certs_cli::revoke::{run_clear, run_revoke, ClearArgs};
use certs_cli::store::StoreArgs;

/// Participation certificate administration.
#[derive(Parser, Debug)]
#[command(name = "certs", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a new certificate.
    Issue(IssueArgs),

    /// Show one certificate by id.
    Show {
        /// Certificate ID.
        id: String,
    },

    /// List certificates issued to an email address, newest first.
    Email {
        /// Recipient email (case-insensitive).
        email: String,
    },

    /// Find certificates whose recipient name starts with a prefix.
    Search {
        /// Name prefix (case-sensitive).
        prefix: String,
    },

    /// List every certificate, newest first.
    List,

    /// Amend fields of an existing certificate.
    Update(UpdateArgs),

    /// Revoke a certificate. Cannot be undone.
    Revoke {
        /// Certificate ID.
        id: String,
    },

    /// Check whether a certificate is valid. Exits 2 when it is not.
    Verify {
        /// Certificate ID.
        id: String,
    },

    /// Delete every certificate.
    Clear(ClearArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level. Logs go to stderr so
    // stdout stays machine-readable.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let store = cli.store.open().await?;
    let base_url = cli.store.base_url.as_str();
    let mut out = std::io::stdout().lock();

    let result = match &cli.command {
        Commands::Issue(args) => run_issue(args, &store, base_url, &mut out).await,
        Commands::Show { id } => run_show(id, &store, base_url, &mut out).await,
        Commands::Email { email } => run_email(email, &store, &mut out).await,
        Commands::Search { prefix } => run_search(prefix, &store, &mut out).await,
        Commands::List => run_list(&store, &mut out).await,
        Commands::Update(args) => run_update(args, &store, &mut out).await,
        Commands::Revoke { id } => run_revoke(id, &store, &mut out).await,
        Commands::Verify { id } => run_verify(id, &store, &mut out).await,
        Commands::Clear(args) => run_clear(args, &store, &mut out).await,
    };

    store.close().await?;
    result
}
