//! User-facing configuration, merged over defaults on load

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::model::{DeletionScope, RewritePolicy};

/// Settings directory inside a vault: .cascade/
pub const SETTINGS_DIR: &str = ".cascade";

/// Settings file name
pub const SETTINGS_FILE: &str = "config.toml";

/// Default settings file location for a vault root.
pub fn default_settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_DIR).join(SETTINGS_FILE)
}

/// Recognized options. Missing keys keep their defaults; both snake_case and
/// the host's camelCase key names are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ask before anything is removed.
    #[serde(alias = "confirmBeforeDelete")]
    pub confirm_before_delete: bool,
    /// Follow links transitively instead of one level deep.
    #[serde(alias = "recursiveDescent")]
    pub recursive_descent: bool,
    #[serde(alias = "deletionScope")]
    pub deletion_scope: DeletionScope,
    /// Rewrite references to removed documents.
    #[serde(alias = "cleanupReferences")]
    pub cleanup_references: bool,
    #[serde(alias = "backupEnabled")]
    pub backup_enabled: bool,
    #[serde(alias = "backupDestination", skip_serializing_if = "Option::is_none")]
    pub backup_destination: Option<PathBuf>,
    #[serde(alias = "referenceRewritePolicy")]
    pub reference_rewrite_policy: RewritePolicy,
    /// `- [[Note]]` counts as a standalone reference line.
    #[serde(alias = "treatListItemReferenceAsStandalone")]
    pub treat_list_item_reference_as_standalone: bool,
    /// Refuse to delete a document whose backup did not succeed.
    #[serde(alias = "requireBackup")]
    pub require_backup: bool,
    /// Re-read a referrer before writing and skip the write if it changed.
    #[serde(alias = "verifyBeforeWrite")]
    pub verify_before_write: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            confirm_before_delete: true,
            recursive_descent: true,
            deletion_scope: DeletionScope::All,
            cleanup_references: false,
            backup_enabled: false,
            backup_destination: None,
            reference_rewrite_policy: RewritePolicy::Strip,
            treat_list_item_reference_as_standalone: false,
            require_backup: false,
            verify_before_write: false,
        }
    }
}

impl Settings {
    /// Load settings from a `.toml` or `.json` file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&text).map_err(|source| SettingsError::Json {
                path: path.to_path_buf(),
                source,
            })
        } else {
            Self::from_toml_str(&text).map_err(|source| SettingsError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Where backups go, `None` when backup is disabled.
    ///
    /// An enabled backup without a destination is a configuration error.
    pub fn backup_destination(&self) -> Result<Option<&Path>, SettingsError> {
        if !self.backup_enabled {
            return Ok(None);
        }
        match self.backup_destination.as_deref() {
            Some(dest) if !dest.as_os_str().is_empty() => Ok(Some(dest)),
            _ => Err(SettingsError::MissingBackupDestination),
        }
    }
}
