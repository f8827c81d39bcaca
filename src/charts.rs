// ABOUTME: Chart map and figure path resolver for \includegraphics references
// ABOUTME: Resolution is total: map hit, then chart-directory synthesis, then the path unchanged

use crate::errors::Result;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Extension of the rasterised, web-servable chart images.
pub const WEB_EXTENSION: &str = "png";

lazy_static! {
    static ref CHART_DIR: Regex = Regex::new(r"(\d+_[^/]+)/chart\.pdf").expect("invalid regex expression");
}

/// Mapping from a figure artifact's source path to its web path.
///
/// Entries keep their insertion (or file) order, which decides the winner
/// when several entries match a reference by substring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartMap {
    entries: IndexMap<String, String>,
}

impl ChartMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, source: &str, web_path: &str) -> Self {
        self.entries.insert(source.to_string(), web_path.to_string());
        self
    }

    /// Parse a JSON object of `"source": "web path"` pairs.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading chart map from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact key first, then the first entry whose key contains the
    /// reference or is contained in it.
    pub fn lookup(&self, reference: &str) -> Option<&str> {
        if let Some(hit) = self.entries.get(reference) {
            return Some(hit);
        }
        self.entries
            .iter()
            .filter(|(source, _)| !source.is_empty())
            .find(|(source, _)| reference.contains(source.as_str()) || source.contains(reference))
            .map(|(_, web_path)| web_path.as_str())
    }
}

/// Map a figure reference to the path the HTML should load.
pub fn resolve_image_path(reference: &str, charts: &ChartMap, lecture_name: &str) -> String {
    let reference = reference.trim();

    if !reference.is_empty() {
        if let Some(web_path) = charts.lookup(reference) {
            return web_path.to_string();
        }
    }

    if let Some(caps) = CHART_DIR.captures(reference) {
        let synthesized = format!("images/{}/{}.{}", lecture_name, &caps[1], WEB_EXTENSION);
        debug!("Synthesized chart path {} for {}", synthesized, reference);
        return synthesized;
    }

    reference.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_map_hit() {
        let charts = ChartMap::new().with_entry("01_foo/chart.pdf", "images/L01/01_foo.png");
        assert_eq!(
            resolve_image_path("01_foo/chart.pdf", &charts, "L01"),
            "images/L01/01_foo.png"
        );
    }

    #[test]
    fn test_substring_match_either_direction() {
        let charts = ChartMap::new().with_entry("slides/L02/03_bar/chart.pdf", "img/bar.png");
        assert_eq!(resolve_image_path("03_bar/chart.pdf", &charts, "L02"), "img/bar.png");

        let charts = ChartMap::new().with_entry("04_baz/chart.pdf", "img/baz.png");
        assert_eq!(resolve_image_path("../04_baz/chart.pdf", &charts, "L02"), "img/baz.png");
    }

    #[test]
    fn test_map_wins_over_synthesis() {
        let charts = ChartMap::new().with_entry("05_qux/chart.pdf", "custom/qux.webp");
        assert_eq!(resolve_image_path("05_qux/chart.pdf", &charts, "L03"), "custom/qux.webp");
    }

    #[test]
    fn test_synthesis_without_map_hit() {
        let charts = ChartMap::new();
        assert_eq!(
            resolve_image_path("01_scree_plot/chart.pdf", &charts, "L05_PCA_tSNE"),
            "images/L05_PCA_tSNE/01_scree_plot.png"
        );
    }

    #[test]
    fn test_unresolved_path_is_unchanged() {
        let charts = ChartMap::new().with_entry("", "never.png");
        assert_eq!(resolve_image_path("images/logo.png", &charts, "L01"), "images/logo.png");
    }

    #[test]
    fn test_first_entry_wins_in_file_order() {
        let charts = ChartMap::from_json_str(
            r#"{"06_x/chart.pdf": "first.png", "L01/06_x/chart.pdf": "second.png"}"#,
        )
        .expect("valid chart map");
        assert_eq!(charts.len(), 2);
        assert_eq!(charts.lookup("deck/06_x/chart.pdf"), Some("first.png"));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(ChartMap::from_json_str("[1, 2]").is_err());
    }
}
