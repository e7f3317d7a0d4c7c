// Grid engine settings
// Loaded from ~/.config/gridbase/settings.json (or any .json/.toml path)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for settings I/O.
#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read or written
    Io(String),
    /// File contents did not parse
    Parse(String),
    /// Settings could not be serialized
    Serialize(String),
    /// Extension is neither .json nor .toml
    UnsupportedFormat(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::Serialize(msg) => write!(f, "Serialize error: {}", msg),
            ConfigError::UnsupportedFormat(path) => {
                write!(f, "Unsupported settings format: {} (expected .json or .toml)", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    // Update queue
    #[serde(rename = "queue.debounceMs")]
    pub debounce_ms: u64,

    /// Flush queued writes at the end of every commit gesture instead of
    /// waiting for the debounce timer.
    #[serde(rename = "queue.flushOnCommit")]
    pub flush_on_commit: bool,

    // Viewport windowing
    #[serde(rename = "viewport.bufferRows")]
    pub buffer_rows: usize,

    #[serde(rename = "viewport.chunkSize")]
    pub chunk_size: usize,

    #[serde(rename = "viewport.maxWindows")]
    pub max_windows: usize,

    /// Rows loaded eagerly from the top of the table when a session opens.
    #[serde(rename = "viewport.primaryRows")]
    pub primary_rows: usize,

    // History
    #[serde(rename = "history.maxSteps")]
    pub max_history_steps: usize,

    // Editing
    #[serde(rename = "editing.enterMovesDown")]
    pub enter_moves_down: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            flush_on_commit: true,
            buffer_rows: 20,
            chunk_size: 100,
            max_windows: 24,
            primary_rows: 100,
            max_history_steps: 100,
            enter_moves_down: true,
        }
    }
}

impl GridSettings {
    /// Get the settings file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridbase")
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Error loading {}: {} (using defaults)", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from an explicit `.json` or `.toml` file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let format = Format::of(path)?;
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let settings: Self = match format {
            Format::Json => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");
                serde_json::from_str(&cleaned).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?,
        };
        Ok(settings.sanitized())
    }

    /// Save settings to an explicit `.json` or `.toml` file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let format = Format::of(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let text = match format {
            Format::Json => {
                serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        fs::write(path, text).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    /// Clamp sizes that would make the engine degenerate (zero-row chunks,
    /// a window cache that cannot hold the viewport).
    pub fn sanitized(mut self) -> Self {
        self.chunk_size = self.chunk_size.max(1);
        self.max_windows = self.max_windows.max(2);
        self.max_history_steps = self.max_history_steps.max(1);
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = GridSettings::default();
        assert_eq!(s.debounce(), Duration::from_millis(250));
        assert!(s.flush_on_commit);
        assert_eq!(s.chunk_size, 100);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
    // only override the chunk size
    "viewport.chunkSize": 50
}"#,
        )
        .unwrap();
        let s = GridSettings::load_from(&path).unwrap();
        assert_eq!(s.chunk_size, 50);
        assert_eq!(s.buffer_rows, 20);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.toml");
        let mut s = GridSettings::default();
        s.debounce_ms = 10;
        s.enter_moves_down = false;
        s.save_to(&path).unwrap();
        let back = GridSettings::load_from(&path).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_sanitized_clamps_zero_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"viewport.chunkSize": 0, "viewport.maxWindows": 0}"#).unwrap();
        let s = GridSettings::load_from(&path).unwrap();
        assert_eq!(s.chunk_size, 1);
        assert_eq!(s.max_windows, 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = GridSettings::load_from(Path::new("settings.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GridSettings::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
