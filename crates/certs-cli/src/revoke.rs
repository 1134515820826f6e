//! # Revoke & Clear Subcommands
//!
//! Both are irreversible. `revoke` marks one certificate invalid; `clear`
//! deletes every record and requires `--yes`.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use certs_core::CertificateStore;

use crate::store::print_json;

/// Arguments for `certs clear`.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm deletion of every certificate.
    #[arg(long)]
    pub yes: bool,
}

/// Execute `certs revoke <id>`.
pub async fn run_revoke(id: &str, store: &CertificateStore, out: &mut impl Write) -> Result<u8> {
    let revoked = store
        .revoke(id)
        .await
        .with_context(|| format!("could not revoke {id}"))?;
    print_json(out, &revoked)?;
    Ok(0)
}

/// Execute `certs clear --yes`.
pub async fn run_clear(
    args: &ClearArgs,
    store: &CertificateStore,
    out: &mut impl Write,
) -> Result<u8> {
    let removed = store
        .clear_all(args.yes)
        .await
        .context("pass --yes to delete every certificate")?;
    print_json(out, &json!({ "removed": removed }))?;
    Ok(0)
}
