//! # Issue & Update Subcommands
//!
//! - `issue`: issue a new certificate.
//! - `update`: merge field changes into an existing certificate.

use std::io::Write;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Args;

use certs_core::{CertificatePatch, CertificateStore, NewCertificate};

use crate::store::{print_json, CertificateView};

/// Arguments for `certs issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Recipient's full name as printed on the certificate.
    #[arg(long)]
    pub name: String,
    /// Recipient's email address.
    #[arg(long)]
    pub email: String,
    /// Course or program completed.
    #[arg(long)]
    pub course: String,
    /// Issue date (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    pub issue_date: Option<NaiveDate>,
    #[arg(long)]
    pub instructor: Option<String>,
    #[arg(long)]
    pub organization: Option<String>,
}

impl IssueArgs {
    fn to_input(&self) -> NewCertificate {
        NewCertificate {
            recipient_name: self.name.clone(),
            email: self.email.clone(),
            course_name: self.course.clone(),
            issue_date: self.issue_date,
            instructor_name: self.instructor.clone(),
            organization: self.organization.clone(),
        }
    }
}

/// Arguments for `certs update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Certificate ID.
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub course: Option<String>,
    /// Issue date (YYYY-MM-DD).
    #[arg(long)]
    pub issue_date: Option<NaiveDate>,
    #[arg(long)]
    pub instructor: Option<String>,
    #[arg(long)]
    pub organization: Option<String>,
}

impl UpdateArgs {
    fn to_patch(&self) -> CertificatePatch {
        CertificatePatch {
            recipient_name: self.name.clone(),
            email: self.email.clone(),
            course_name: self.course.clone(),
            issue_date: self.issue_date,
            instructor_name: self.instructor.clone(),
            organization: self.organization.clone(),
            is_revoked: None,
        }
    }
}

/// Execute `certs issue`.
pub async fn run_issue(
    args: &IssueArgs,
    store: &CertificateStore,
    base_url: &str,
    out: &mut impl Write,
) -> Result<u8> {
    let cert = store.create(args.to_input()).await?;
    print_json(out, &CertificateView::new(&cert, base_url))?;
    Ok(0)
}

/// Execute `certs update`.
pub async fn run_update(
    args: &UpdateArgs,
    store: &CertificateStore,
    out: &mut impl Write,
) -> Result<u8> {
    let patch = args.to_patch();
    if patch == CertificatePatch::default() {
        bail!("nothing to update: pass at least one field flag");
    }
    let updated = store.update(&args.id, patch).await?;
    print_json(out, &updated)?;
    Ok(0)
}
