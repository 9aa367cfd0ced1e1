//! Layered MIME type tables.
//!
//! The standard layer is a compiled-in default table, optionally merged with
//! the platform `mime.types` files. The bundled domain table is layered on
//! top and wins every conflict in both directions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::MimeConfig;
use crate::error::MediaError;

/// The bundled domain table, in `mime.types` format.
pub const BUNDLED_TABLE: &str = include_str!("mime.types");

/// Platform table locations, read in order when system tables are enabled.
const SYSTEM_TABLES: &[&str] = &[
    "/etc/mime.types",
    "/etc/httpd/mime.types",
    "/etc/httpd/conf/mime.types",
    "/etc/apache2/mime.types",
    "/usr/local/etc/mime.types",
];

const STANDARD_TYPES: &[(&str, &[&str])] = &[
    ("application/json", &["json"]),
    ("application/octet-stream", &["bin"]),
    ("application/pdf", &["pdf"]),
    ("application/zip", &["zip"]),
    ("audio/aac", &["aac"]),
    ("audio/flac", &["flac"]),
    ("audio/mp4", &["m4a"]),
    ("audio/mpeg", &["mp3"]),
    ("audio/ogg", &["ogg", "oga"]),
    ("audio/opus", &["opus"]),
    ("audio/x-wav", &["wav"]),
    ("image/bmp", &["bmp"]),
    ("image/gif", &["gif"]),
    ("image/jpeg", &["jpg", "jpeg", "jpe"]),
    ("image/png", &["png"]),
    ("image/svg+xml", &["svg"]),
    ("image/tiff", &["tiff", "tif"]),
    ("image/webp", &["webp"]),
    ("text/csv", &["csv"]),
    ("text/html", &["html", "htm"]),
    ("text/plain", &["txt", "text"]),
    ("video/mp4", &["mp4"]),
    ("video/mpeg", &["mpeg", "mpg"]),
    ("video/quicktime", &["mov", "qt"]),
    ("video/webm", &["webm"]),
    ("video/x-matroska", &["mkv"]),
    ("video/x-msvideo", &["avi"]),
];

/// One MIME table: extension → type and type → preferred extension.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    types: HashMap<String, String>,
    extensions: HashMap<String, String>,
}

impl MimeTable {
    /// Parse `mime.types` text: `type/subtype ext1 ext2 ...` per line, `#`
    /// comments. The first extension of a type is its preferred one.
    pub fn parse(text: &str) -> Result<Self, MediaError> {
        let mut table = Self::default();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default();
            let mut tokens = line.split_whitespace();
            let Some(mime) = tokens.next() else { continue };
            if !mime.contains('/') {
                return Err(MediaError::MalformedTable {
                    line: index + 1,
                    content: raw.to_string(),
                });
            }
            for ext in tokens {
                table.insert(mime, ext);
            }
        }
        Ok(table)
    }

    /// Compiled-in defaults.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (mime, exts) in STANDARD_TYPES {
            for ext in *exts {
                table.insert(mime, ext);
            }
        }
        table
    }

    /// The bundled domain table.
    pub fn bundled() -> Result<Self, MediaError> {
        Self::parse(BUNDLED_TABLE)
    }

    /// Compiled-in defaults merged with every readable platform table.
    pub fn standard(system_tables: bool) -> Self {
        let mut table = Self::builtin();
        if !system_tables {
            return table;
        }
        for path in SYSTEM_TABLES.iter().map(Path::new).filter(|p| p.is_file()) {
            match Self::read(path) {
                Ok(system) => {
                    debug!(path = %path.display(), entries = system.len(), "loaded system MIME table");
                    table.merge(&system);
                }
                Err(e) => warn!(path = %path.display(), "skipping system MIME table: {e}"),
            }
        }
        table
    }

    pub fn read(path: &Path) -> Result<Self, MediaError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Register `ext` for `mime`. A later registration of an extension
    /// replaces its type; a type keeps its first extension.
    pub fn insert(&mut self, mime: &str, ext: &str) {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let mime = mime.to_ascii_lowercase();
        if ext.is_empty() {
            return;
        }
        self.extensions.entry(mime.clone()).or_insert_with(|| ext.clone());
        self.types.insert(ext, mime);
    }

    /// Layer `other` on top of `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &MimeTable) {
        for (ext, mime) in &other.types {
            self.types.insert(ext.clone(), mime.clone());
        }
        for (mime, ext) in &other.extensions {
            self.extensions.insert(mime.clone(), ext.clone());
        }
    }

    pub fn type_for(&self, ext: &str) -> Option<&str> {
        self.types.get(&ext.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn extension_for(&self, mime: &str) -> Option<&str> {
        self.extensions.get(&mime.to_ascii_lowercase()).map(String::as_str)
    }

    /// Number of known extensions.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `(extension, type)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.types.iter().map(|(ext, mime)| (ext.as_str(), mime.as_str()))
    }
}

/// Path ↔ MIME type resolution over a standard layer and an override layer.
#[derive(Debug, Clone)]
pub struct MimeResolver {
    standard: MimeTable,
    overrides: MimeTable,
}

impl MimeResolver {
    pub fn new(standard: MimeTable, overrides: MimeTable) -> Self {
        Self { standard, overrides }
    }

    /// Compiled-in defaults plus the bundled table, no platform files.
    pub fn bundled() -> Self {
        Self::new(MimeTable::builtin(), bundled_or_empty())
    }

    /// One-time startup load. A broken bundled or extra table is logged and
    /// skipped; resolution then falls back to the remaining layers.
    pub fn load(config: &MimeConfig) -> Self {
        let standard = MimeTable::standard(config.system_tables);
        let mut overrides = bundled_or_empty();

        if let Some(extra) = &config.extra_table {
            match MimeTable::read(extra) {
                Ok(table) => overrides.merge(&table),
                Err(e) => warn!(path = %extra.display(), "extra MIME table can't be read, ignoring it: {e}"),
            }
        }

        debug!(
            standard = standard.len(),
            overrides = overrides.len(),
            "MIME tables loaded"
        );
        Self::new(standard, overrides)
    }

    pub fn overrides(&self) -> &MimeTable {
        &self.overrides
    }

    /// MIME type for `path`, by extension.
    pub fn resolve(&self, path: &Path) -> Result<String, MediaError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| {
                self.overrides
                    .type_for(ext)
                    .or_else(|| self.standard.type_for(ext))
            })
            .map(str::to_string)
            .ok_or_else(|| MediaError::UnrecognizedType {
                path: PathBuf::from(path),
            })
    }

    /// Preferred extension (no leading dot) for `mime`; parameters after `;`
    /// are ignored.
    pub fn extension_for(&self, mime: &str) -> Result<String, MediaError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        self.overrides
            .extension_for(essence)
            .or_else(|| self.standard.extension_for(essence))
            .map(str::to_string)
            .ok_or_else(|| MediaError::UnrecognizedMime {
                mime: mime.to_string(),
            })
    }
}

fn bundled_or_empty() -> MimeTable {
    MimeTable::bundled().unwrap_or_else(|e| {
        warn!("bundled MIME types can't be read, using system types only: {e}");
        MimeTable::default()
    })
}
