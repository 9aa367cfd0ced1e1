use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Media pipeline configuration, the `[media]` table of the courier config file.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Bounding box of generated previews.
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,

    #[serde(default = "default_preview_height")]
    pub preview_height: u32,

    /// External video inspection executable, looked up on `PATH` unless absolute.
    #[serde(default = "default_inspection_tool")]
    pub inspection_tool: String,

    /// Upper bound for the `-ver` availability probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Upper bound for a single inspection run.
    #[serde(default = "default_inspect_timeout_ms")]
    pub inspect_timeout_ms: u64,

    /// Directory for preview scratch files. None = system temp directory.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    #[serde(default)]
    pub mime: MimeConfig,
}

/// MIME table layering, the `[media.mime]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct MimeConfig {
    /// Merge the platform tables (`/etc/mime.types` etc.) into the standard layer.
    #[serde(default = "default_system_tables")]
    pub system_tables: bool,

    /// Additional override table, applied on top of the bundled one.
    #[serde(default)]
    pub extra_table: Option<PathBuf>,
}

fn default_preview_width() -> u32 {
    64
}

fn default_preview_height() -> u32 {
    64
}

fn default_inspection_tool() -> String {
    "exiftool".into()
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_inspect_timeout_ms() -> u64 {
    15_000
}

fn default_system_tables() -> bool {
    true
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            preview_width: default_preview_width(),
            preview_height: default_preview_height(),
            inspection_tool: default_inspection_tool(),
            probe_timeout_ms: default_probe_timeout_ms(),
            inspect_timeout_ms: default_inspect_timeout_ms(),
            scratch_dir: None,
            mime: MimeConfig::default(),
        }
    }
}

impl Default for MimeConfig {
    fn default() -> Self {
        Self {
            system_tables: default_system_tables(),
            extra_table: None,
        }
    }
}

impl MediaConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn inspect_timeout(&self) -> Duration {
        Duration::from_millis(self.inspect_timeout_ms)
    }
}
