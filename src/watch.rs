// ABOUTME: Watch module for monitoring a deck and regenerating its output
// ABOUTME: Re-converts the deck when the source or the chart map changes

use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::new_debouncer;

use crate::batch;
use crate::config::{Config as AppConfig, ConvertOptions};
use crate::document::ConversionResult;
use crate::errors::{BeamerError, Result};
use crate::html::{self, OutputFormat};
use crate::utils;

/// Configuration for watch mode
pub struct WatchConfig {
    /// Path to the Beamer source to watch
    pub tex_path: PathBuf,

    /// Output file path
    pub output: PathBuf,

    /// Chart map overriding the configured one
    pub chart_map: Option<PathBuf>,

    /// Lecture name; derived from the source's directory when absent
    pub lecture_name: Option<String>,

    pub format: OutputFormat,

    /// Debounce time in milliseconds
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            tex_path: PathBuf::new(),
            output: PathBuf::new(),
            chart_map: None,
            lecture_name: None,
            format: OutputFormat::Html,
            debounce_ms: 500,
        }
    }
}

/// Starts watching a deck and regenerates its output when changes occur
pub fn watch_deck(config: WatchConfig, app_config: &AppConfig) -> Result<()> {
    utils::validate_file_exists(&config.tex_path)?;
    utils::ensure_parent_directory_exists(&config.output)?;
    if config.debounce_ms == 0 {
        return Err(BeamerError::ConfigError("debounce must be at least 1 ms".to_string()));
    }

    // Initial generation
    regenerate_outputs(&config, app_config)?;

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), None, tx)
        .map_err(|e| BeamerError::WatchError(format!("Failed to create file watcher: {}", e)))?;

    // If no parent (just a filename) or empty parent, use current directory
    let watch_path = match config.tex_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let abs_watch_path = utils::get_absolute_path(watch_path)?;
    debug!("Watching absolute path: {:?}", abs_watch_path);

    debouncer
        .watcher()
        .watch(&abs_watch_path, RecursiveMode::Recursive)
        .map_err(|e| {
            BeamerError::WatchError(format!(
                "Failed to start watching directory {:?}: {}",
                abs_watch_path, e
            ))
        })?;
    if let Some(chart_map) = config.chart_map.as_deref().filter(|path| path.exists()) {
        let abs_chart_map = utils::get_absolute_path(chart_map)?;
        if !abs_chart_map.starts_with(&abs_watch_path) {
            debouncer
                .watcher()
                .watch(&abs_chart_map, RecursiveMode::NonRecursive)
                .map_err(|e| BeamerError::WatchError(format!("Failed to watch chart map: {}", e)))?;
        }
    }

    info!("Watching for changes in {:?}", watch_path);
    println!("Watching for changes in {:?} (Press Ctrl+C to stop)", watch_path);

    let mut last_processed = Instant::now();
    for result in rx {
        match result {
            Ok(events) => {
                let relevant_changes = events.iter().any(|event| {
                    event.paths.iter().any(|path| {
                        let is_relevant = is_relevant_path(path, &config);
                        if is_relevant {
                            debug!("Detected relevant change in {:?}", path);
                        }
                        is_relevant
                    })
                });

                let now = Instant::now();
                if relevant_changes && now.duration_since(last_processed) > Duration::from_millis(config.debounce_ms) {
                    match regenerate_outputs(&config, app_config) {
                        Ok(_) => {
                            info!("Regenerated output successfully");
                            last_processed = now;
                        }
                        Err(e) => error!("Failed to regenerate output: {}", e),
                    }
                }
            }
            Err(errors) => error!("Watch error: {:?}", errors),
        }
    }

    Ok(())
}

/// The deck, the chart map or any other `.tex`/`.sty` file; never our own output.
pub fn is_relevant_path(path: &Path, config: &WatchConfig) -> bool {
    let same_file = |a: &Path, b: &Path| {
        a == b
            || match (utils::get_absolute_path(a), utils::get_absolute_path(b)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
    };

    if same_file(path, &config.output) {
        return false;
    }
    if same_file(path, &config.tex_path) {
        return true;
    }
    if let Some(chart_map) = &config.chart_map {
        if same_file(path, chart_map) {
            return true;
        }
    }

    match path.extension() {
        Some(ext) => {
            let ext_str = ext.to_string_lossy().to_lowercase();
            ext_str == "tex" || ext_str == "sty"
        }
        None => false,
    }
}

/// Convert the deck and write the output once.
pub fn regenerate_outputs(config: &WatchConfig, app_config: &AppConfig) -> Result<ConversionResult> {
    info!("Regenerating output...");

    let charts = app_config.load_chart_map(config.chart_map.as_deref())?;
    let lecture_name = config
        .lecture_name
        .clone()
        .unwrap_or_else(|| ConvertOptions::lecture_name_for(&config.tex_path));

    let result = batch::convert_file(&config.tex_path, app_config, &charts, &lecture_name)?;
    let rendered = html::render_output(&result, config.format, &app_config.get_page_options())?;
    html::write_html_to_file(&rendered, &config.output)?;
    info!("Output regenerated: {:?}", config.output);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn watch_config(dir: &Path) -> WatchConfig {
        WatchConfig {
            tex_path: dir.join("deck.tex"),
            output: dir.join("deck.html"),
            chart_map: Some(dir.join("charts.json")),
            ..WatchConfig::default()
        }
    }

    #[test]
    fn test_relevant_paths() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = watch_config(dir.path());

        assert!(is_relevant_path(&dir.path().join("deck.tex"), &config));
        assert!(is_relevant_path(&dir.path().join("charts.json"), &config));
        assert!(is_relevant_path(&dir.path().join("macros.sty"), &config));
        assert!(!is_relevant_path(&dir.path().join("deck.html"), &config));
        assert!(!is_relevant_path(&dir.path().join("notes.txt"), &config));
    }

    #[test]
    fn test_regenerate_writes_output() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = WatchConfig {
            lecture_name: Some("L03".to_string()),
            ..watch_config(dir.path())
        };
        fs::write(
            &config.tex_path,
            "\\begin{frame}{Watched}\\includegraphics{01_foo/chart.pdf}\\end{frame}",
        )
        .expect("write deck");
        fs::write(dir.path().join("charts.json"), "{}").expect("write chart map");

        let result = regenerate_outputs(&config, &AppConfig::default()).expect("regenerates");
        assert_eq!(result.sections.len(), 1);

        let html = fs::read_to_string(&config.output).expect("output written");
        assert!(html.contains("<h2>Watched</h2>"));
        assert!(html.contains("images/L03/01_foo.png"));
    }

    #[test]
    fn test_missing_deck_is_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        let err = watch_deck(watch_config(dir.path()), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, BeamerError::PathNotFoundError(_)));
    }
}
