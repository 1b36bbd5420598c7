//! External-provider settings, loaded from config files and the environment.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::app_dirs;

/// User-facing knobs for the external provider set.
///
/// Defaults come from `Default`, then file sources, then `OMNISEARCH__`
/// environment variables, later sources winning per key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Drop every externally discovered provider.
    pub disable_external: bool,
    /// Default-disabled providers the user explicitly turned on.
    pub enabled: Vec<String>,
    /// Default-enabled providers the user explicitly turned off.
    pub disabled: Vec<String>,
    /// Explicit section order; unlisted providers follow in discovery order.
    pub sort_order: Vec<String>,
    /// Rows shown in the application grid section.
    pub app_rows: Option<usize>,
}

impl SearchSettings {
    /// Load settings from the default file locations, an optional explicit
    /// file, and the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for path in default_config_files() {
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("omnisearch")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build().map_err(|err| match err {
            ConfigError::Frozen => anyhow!("configuration builder is frozen"),
            other => other.into(),
        })?;
        config
            .try_deserialize()
            .map_err(|err| anyhow!("failed to deserialize search settings: {err}"))
    }

    /// Whether a discovered provider should be registered.
    ///
    /// `disable_external` overrides everything; otherwise `disabled` hides a
    /// default-enabled provider and `enabled` restores a default-disabled one.
    #[must_use]
    pub fn allows(&self, id: &str, default_disabled: bool) -> bool {
        if self.disable_external {
            return false;
        }
        if default_disabled {
            self.enabled.iter().any(|entry| entry == id)
        } else {
            !self.disabled.iter().any(|entry| entry == id)
        }
    }

    /// Order provider ids per `sort_order`; listed ids first in the configured
    /// order, unlisted ones after in their incoming order.
    #[must_use]
    pub fn sort(&self, ids: Vec<String>) -> Vec<String> {
        let mut sorted = Vec::with_capacity(ids.len());
        for wanted in &self.sort_order {
            if ids.contains(wanted) && !sorted.contains(wanted) {
                sorted.push(wanted.clone());
            }
        }
        for id in ids {
            if !sorted.contains(&id) {
                sorted.push(id);
            }
        }
        sorted
    }
}

/// Discover the default configuration file locations that should be consulted.
fn default_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(dir) = app_dirs::get_config_dir() {
        files.push(dir.join("config.toml"));
    }

    if let Ok(current_dir) = env::current_dir() {
        files.push(current_dir.join(".omnisearch.toml"));
        files.push(current_dir.join("omnisearch.toml"));
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn settings() -> SearchSettings {
        SearchSettings {
            disable_external: false,
            enabled: vec!["calc".to_string()],
            disabled: vec!["files".to_string()],
            sort_order: vec!["settings".to_string(), "files".to_string()],
            app_rows: None,
        }
    }

    #[test]
    fn disable_external_wins_over_enable_lists() {
        let mut settings = settings();
        settings.disable_external = true;
        assert!(!settings.allows("calc", true));
        assert!(!settings.allows("settings", false));
    }

    #[test]
    fn enabled_and_disabled_lists_gate_by_default_state() {
        let settings = settings();
        // Default-enabled providers are on unless listed in `disabled`.
        assert!(settings.allows("settings", false));
        assert!(!settings.allows("files", false));
        // Default-disabled providers are off unless listed in `enabled`.
        assert!(settings.allows("calc", true));
        assert!(!settings.allows("web", true));
    }

    #[test]
    fn sort_order_leads_and_unlisted_ids_follow() {
        let settings = settings();
        let sorted = settings.sort(vec![
            "files".to_string(),
            "calc".to_string(),
            "settings".to_string(),
        ]);
        assert_eq!(sorted, ["settings", "files", "calc"]);
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "disable_external = false\ndisabled = [\"files\"]\nsort_order = [\"settings\"]\napp_rows = 4\n",
        )
        .expect("write settings");

        let settings = SearchSettings::load(Some(&path)).expect("load settings");
        assert_eq!(settings.disabled, ["files"]);
        assert_eq!(settings.sort_order, ["settings"]);
        assert_eq!(settings.app_rows, Some(4));
    }

    #[test]
    fn default_files_include_current_directory_variants() {
        let files = default_config_files();
        assert!(files.iter().any(|path| path.ends_with(".omnisearch.toml")));
        assert!(files.iter().any(|path| path.ends_with("omnisearch.toml")));
    }
}
