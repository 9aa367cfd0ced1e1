//! Courier credential storage: per-account identity and nonce blobs on disk.
//!
//! This crate provides:
//! - Account key normalization and JID helpers
//! - Storage root configuration (`~`-relative paths expanded at startup)
//! - An identity store writing each record atomically under `<root>/<account>/`
//! - A provisioning helper producing fresh random identity bytes

pub mod account;
pub mod config;
pub mod error;
pub mod jid;
pub mod provision;
pub mod store;

pub use account::AccountKey;
pub use config::StoreConfig;
pub use error::StoreError;
pub use provision::{generate_identity, IDENTITY_LEN};
pub use store::{IdentityStore, IDENTITY_FILE, NONCE_FILE};
