use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::{
    GroupOptions, NumericDetection, DEFAULT_CONDITION_DELIMITER, DEFAULT_TOP_N,
};

/// Environment variable pointing at a settings file.
pub const SETTINGS_ENV: &str = "RUSTY_LIKERT_SETTINGS";

/// Looked up in the working directory when the variable is unset.
pub const DEFAULT_SETTINGS_FILE: &str = "rusty-likert.json";

/// Dashboard tuning, read from an optional JSON file:
///
/// ```json
/// { "debounceMs": 300, "topN": 20, "numericDetection": "majority" }
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Settings {
    /// Quiet period before a selection change triggers a recompute.
    pub debounce_ms: u64,
    /// Ranked groups kept in the Likert chart; `null` keeps all of them.
    pub top_n: Option<usize>,
    pub numeric_detection: NumericDetection,
    pub split_multi_valued: bool,
    pub condition_delimiter: String,
    /// Reject uploads that lack the Likert template columns.
    pub require_template_columns: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debounce_ms: 300,
            top_n: Some(DEFAULT_TOP_N),
            numeric_detection: NumericDetection::FirstRow,
            split_multi_valued: true,
            condition_delimiter: DEFAULT_CONDITION_DELIMITER.to_string(),
            require_template_columns: false,
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Settings from `$RUSTY_LIKERT_SETTINGS` or `./rusty-likert.json`.
    ///
    /// A missing file means defaults; a broken one is logged and ignored.
    pub fn load() -> Self {
        let path = std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Settings::default();
        }
        match Settings::from_path(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}: {settings:?}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings: {e:#}");
                Settings::default()
            }
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn group_options(&self) -> GroupOptions {
        GroupOptions {
            split_multi_valued: self.split_multi_valued,
            delimiter: self.condition_delimiter.clone(),
            numeric_detection: self.numeric_detection,
            limit: self.top_n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "topN": null, "numericDetection": "majority" }}"#).unwrap();
        let settings = Settings::from_path(file.path()).unwrap();
        assert_eq!(settings.top_n, None);
        assert_eq!(settings.numeric_detection, NumericDetection::Majority);
        assert_eq!(settings.debounce(), Duration::from_millis(300));
        assert_eq!(settings.group_options().limit, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "debounce": 10 }}"#).unwrap();
        let err = Settings::from_path(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing settings file"));
    }

    #[test]
    fn defaults_match_group_defaults() {
        assert_eq!(Settings::default().group_options(), GroupOptions::default());
    }
}
