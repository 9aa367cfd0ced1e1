//! Identity provisioning.
//!
//! A freshly provisioned account gets random identity bytes; the store
//! itself treats them as an opaque blob.

use rand::rngs::OsRng;
use rand::RngCore;

/// Length of a freshly generated identity.
pub const IDENTITY_LEN: usize = 20;

/// Generate fresh identity bytes from the OS RNG.
pub fn generate_identity() -> [u8; IDENTITY_LEN] {
    let mut identity = [0u8; IDENTITY_LEN];
    OsRng.fill_bytes(&mut identity);
    identity
}
