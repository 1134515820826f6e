//! # Lookup & Verification Subcommands
//!
//! - `show`: one certificate by id.
//! - `email`: every certificate issued to an address, newest first.
//! - `search`: certificates whose recipient name starts with a prefix.
//! - `list`: every certificate, newest first.
//! - `verify`: the public validity verdict for an id.

use std::io::Write;

use anyhow::{bail, Result};

use certs_core::{CertificateStore, VerificationReport};

use crate::store::{print_json, CertificateView};

/// Exit code for `verify` when the certificate is not valid.
pub const EXIT_INVALID: u8 = 2;

/// Execute `certs show <id>`.
pub async fn run_show(
    id: &str,
    store: &CertificateStore,
    base_url: &str,
    out: &mut impl Write,
) -> Result<u8> {
    let Some(cert) = store.get_by_id(id).await? else {
        bail!("certificate {id} not found");
    };
    print_json(out, &CertificateView::new(&cert, base_url))?;
    Ok(0)
}

/// Execute `certs email <address>`.
pub async fn run_email(email: &str, store: &CertificateStore, out: &mut impl Write) -> Result<u8> {
    let found = store.get_by_email(email).await?;
    print_json(out, &found)?;
    Ok(0)
}

/// Execute `certs search <prefix>`.
pub async fn run_search(
    prefix: &str,
    store: &CertificateStore,
    out: &mut impl Write,
) -> Result<u8> {
    let found = store.search_by_name(prefix).await?;
    print_json(out, &found)?;
    Ok(0)
}

/// Execute `certs list`.
pub async fn run_list(store: &CertificateStore, out: &mut impl Write) -> Result<u8> {
    let all = store.list_all().await?;
    tracing::info!(count = all.len(), "listed certificates");
    print_json(out, &all)?;
    Ok(0)
}

/// Execute `certs verify <id>`. Exits with [`EXIT_INVALID`] when the
/// certificate is unknown or revoked.
pub async fn run_verify(id: &str, store: &CertificateStore, out: &mut impl Write) -> Result<u8> {
    let verdict = store.verify(id).await?;
    let valid = verdict.is_valid();
    print_json(out, &VerificationReport::from(verdict))?;
    Ok(if valid { 0 } else { EXIT_INVALID })
}
