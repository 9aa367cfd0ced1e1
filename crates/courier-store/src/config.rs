use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StoreError;

/// Storage configuration, the `[storage]` table of the courier config file.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Root directory holding one subdirectory per account.
    /// A leading `~` is expanded to the user's home directory.
    #[serde(default = "default_root")]
    pub root: String,
}

fn default_root() -> String {
    "~/.courier".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl StoreConfig {
    /// The storage root with `~` expanded.
    pub fn resolved_root(&self) -> Result<PathBuf, StoreError> {
        expand_home(&self.root)
    }
}

/// Expand a leading `~` or `~/` to the home directory; other paths are
/// returned as-is.
pub fn expand_home(path: &str) -> Result<PathBuf, StoreError> {
    let rest = if path == "~" {
        ""
    } else if let Some(rest) = path.strip_prefix("~/") {
        rest
    } else {
        return Ok(PathBuf::from(path));
    };
    let home = dirs::home_dir().ok_or(StoreError::HomeDirUnavailable)?;
    Ok(if rest.is_empty() {
        home
    } else {
        home.join(Path::new(rest))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_home_relative() {
        assert_eq!(StoreConfig::default().root, "~/.courier");
    }

    #[test]
    fn config_toml_deserialization() {
        let config: StoreConfig = toml::from_str(r#"root = "/tmp/store""#).unwrap();
        assert_eq!(config.resolved_root().unwrap(), PathBuf::from("/tmp/store"));
    }

    #[test]
    fn missing_root_uses_default() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.root, "~/.courier");
    }

    #[test]
    fn tilde_is_expanded() {
        let Some(home) = dirs::home_dir() else { return };
        assert_eq!(expand_home("~/.courier").unwrap(), home.join(".courier"));
        assert_eq!(expand_home("~").unwrap(), home);
    }

    #[test]
    fn tilde_user_form_is_left_alone() {
        assert_eq!(expand_home("~bob/x").unwrap(), PathBuf::from("~bob/x"));
    }
}
