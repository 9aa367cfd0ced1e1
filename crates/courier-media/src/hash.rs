use std::fs::File;
use std::io;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::MediaError;

/// Base64 of the SHA-256 digest of a file, as announced before an upload.
pub fn upload_hash(path: &Path) -> Result<String, MediaError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(STANDARD.encode(hasher.finalize()))
}
