// ABOUTME: Configuration module for the beamer-reveal converter
// ABOUTME: Provides defaults, environment variable handling and the per-deck conversion options

use crate::charts::ChartMap;
use crate::colors::ColorTable;
use crate::errors::Result;
use crate::html::PageOptions;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_AUTHOR: &str = "Methods and Algorithms";
const DEFAULT_REVEAL_URL: &str = "https://unpkg.com/reveal.js@4.5.0";
const DEFAULT_MATHJAX_URL: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js";

/// Global configuration for the application
pub struct Config {
    pub chart_map_path: Option<PathBuf>,
    pub default_title: String,
    pub default_author: String,
    pub reveal_url: String,
    pub mathjax_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chart_map_path: None,
            default_title: DEFAULT_TITLE.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
            reveal_url: DEFAULT_REVEAL_URL.to_string(),
            mathjax_url: DEFAULT_MATHJAX_URL.to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let chart_map_path = env::var("BEAMER_CHART_MAP").ok().map(PathBuf::from);
        let default_title =
            env::var("BEAMER_DEFAULT_TITLE").unwrap_or_else(|_| DEFAULT_TITLE.to_string());
        let default_author =
            env::var("BEAMER_DEFAULT_AUTHOR").unwrap_or_else(|_| DEFAULT_AUTHOR.to_string());
        let reveal_url =
            env::var("BEAMER_REVEAL_URL").unwrap_or_else(|_| DEFAULT_REVEAL_URL.to_string());
        let mathjax_url =
            env::var("BEAMER_MATHJAX_URL").unwrap_or_else(|_| DEFAULT_MATHJAX_URL.to_string());

        Self {
            chart_map_path,
            default_title,
            default_author,
            reveal_url,
            mathjax_url,
        }
    }

    /// Load the chart map from an explicit path, else the configured one, else empty.
    pub fn load_chart_map(&self, explicit: Option<&Path>) -> Result<ChartMap> {
        match explicit.or(self.chart_map_path.as_deref()) {
            Some(path) => ChartMap::from_file(path),
            None => Ok(ChartMap::new()),
        }
    }

    /// Get conversion options with defaults from this config
    pub fn get_convert_options(&self, charts: ChartMap, lecture_name: &str) -> ConvertOptions {
        ConvertOptions {
            colors: ColorTable::default(),
            charts,
            lecture_name: lecture_name.to_string(),
            metadata_defaults: MetadataDefaults {
                title: self.default_title.clone(),
                author: self.default_author.clone(),
                ..MetadataDefaults::default()
            },
        }
    }

    pub fn get_page_options(&self) -> PageOptions {
        PageOptions {
            reveal_url: self.reveal_url.clone(),
            mathjax_url: self.mathjax_url.clone(),
        }
    }
}

/// Values used for document metadata the deck does not declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDefaults {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            subtitle: String::new(),
            author: DEFAULT_AUTHOR.to_string(),
            date: String::new(),
        }
    }
}

/// Immutable inputs of one conversion call, passed explicitly to the converter.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub colors: ColorTable,
    pub charts: ChartMap,
    /// Containing lecture's identifier, used only for synthesized image paths.
    pub lecture_name: String,
    pub metadata_defaults: MetadataDefaults,
}

impl ConvertOptions {
    pub fn new(charts: ChartMap, lecture_name: &str) -> Self {
        Self {
            charts,
            lecture_name: lecture_name.to_string(),
            ..Self::default()
        }
    }

    /// Lecture name derived from the deck's parent directory, as the build layout uses.
    pub fn lecture_name_for(path: &Path) -> String {
        path.parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_options_carry_config_defaults() {
        let config = Config {
            default_title: "Deck".to_string(),
            default_author: "Staff".to_string(),
            ..Config::default()
        };
        let options = config.get_convert_options(ChartMap::new(), "L01");

        assert_eq!(options.lecture_name, "L01");
        assert_eq!(options.metadata_defaults.title, "Deck");
        assert_eq!(options.metadata_defaults.author, "Staff");
        assert_eq!(options.metadata_defaults.subtitle, "");
        assert_eq!(options.colors.resolve("MLBlue"), "#0066CC");
    }

    #[test]
    fn test_lecture_name_from_parent_directory() {
        let path = Path::new("slides/L03_KNN_KMeans/L03_KNN_KMeans.tex");
        assert_eq!(ConvertOptions::lecture_name_for(path), "L03_KNN_KMeans");
        assert_eq!(ConvertOptions::lecture_name_for(Path::new("deck.tex")), "");
    }

    #[test]
    fn test_missing_chart_map_is_empty() {
        let config = Config::default();
        let charts = config.load_chart_map(None).expect("no map configured");
        assert!(charts.is_empty());
    }
}
