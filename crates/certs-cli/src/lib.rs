//! # certs-cli: Command-Line Tool for Participation Certificates
//!
//! Provides the `certs` command for operators: issuing certificates,
//! looking them up, amending and revoking them, and checking the same
//! validity verdict the public verification page shows.
//!
//! ## Subcommands
//!
//! - `certs issue`: issue a certificate.
//! - `certs show`, `certs email`, `certs search`, `certs list`: lookups.
//! - `certs update`: merge field changes.
//! - `certs revoke`: revoke a certificate.
//! - `certs verify`: validity verdict (exit code 2 when invalid).
//! - `certs clear --yes`: delete every certificate.
//!
//! Records are read from a local JSON file by default, or from PostgreSQL
//! when `--database-url` / `DATABASE_URL` is set:
//!
//! ```bash
//! certs issue --name "Ada Lovelace" --email ada@example.com --course "Volunteer Program"
//! certs verify 0b9f6c1e-5d0e-4b5e-9a53-6f1f0f2a7c11
//! ```

pub mod issue;
pub mod lookup;
pub mod revoke;
pub mod store;
