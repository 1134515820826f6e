//! # API Route Modules
//!
//! - `certificates`: issuance, lookup, amendment, revocation, bulk clear.
//! - `verify`: public verification of a certificate id.

pub mod certificates;
pub mod verify;
