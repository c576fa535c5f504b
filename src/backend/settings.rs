use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::cache::{DEFAULT_CAPACITY, DEFAULT_IMAGE_CAPACITY};
use super::loader::SizeHint;
use crate::render::ColorMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Translated language of the chapter feed.
    pub language: String,
    /// Items per fetch for the popular carousel.
    pub popular_page_size: usize,
    /// Rows per fetch for the featured, latest and search lists.
    pub list_page_size: usize,
    pub chapter_page_size: usize,
    pub carousel_cover: SizeHint,
    pub detail_cover: SizeHint,
    /// `original` reads full-quality pages, anything else the data-saver set.
    pub page_quality: SizeHint,
    pub color_mode: ColorMode,
    pub grid_cache_capacity: usize,
    /// Decoded covers and pages kept for revisits.
    pub image_cache_capacity: usize,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            popular_page_size: 5,
            list_page_size: 9,
            chapter_page_size: 100,
            carousel_cover: SizeHint::Small,
            detail_cover: SizeHint::Medium,
            page_quality: SizeHint::Small,
            color_mode: ColorMode::Auto,
            grid_cache_capacity: DEFAULT_CAPACITY,
            image_cache_capacity: DEFAULT_IMAGE_CAPACITY,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

pub fn app_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mangadex-tui")
}

fn settings_path() -> PathBuf {
    app_config_dir().join("settings.json")
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Settings::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("ignoring malformed settings {}: {}", path.display(), e);
                Settings::default()
            }),
            Err(e) => {
                warn!("failed to read settings {}: {}", path.display(), e);
                Settings::default()
            }
        }
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&settings_path())
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn log_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.popular_page_size, 5);
        assert_eq!(settings.chapter_page_size, 100);
        assert_eq!(settings.image_cache_capacity, DEFAULT_IMAGE_CAPACITY);
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            language: "fr".to_string(),
            page_quality: SizeHint::Original,
            color_mode: ColorMode::Ansi256,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"list_page_size": 20, "color_mode": "truecolor"}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.list_page_size, 20);
        assert_eq!(settings.color_mode, ColorMode::TrueColor);
        assert_eq!(settings.language, "en");
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_log_filter() {
        let mut settings = Settings::default();
        assert_eq!(settings.log_filter(), LevelFilter::Info);
        settings.log_level = "debug".to_string();
        assert_eq!(settings.log_filter(), LevelFilter::Debug);
        settings.log_level = "loud".to_string();
        assert_eq!(settings.log_filter(), LevelFilter::Info);
    }
}
