// ABOUTME: Multi-file conversion driven by a glob pattern
// ABOUTME: Decks are converted in parallel; results keep sorted input order and per-file errors

use crate::charts::ChartMap;
use crate::config::{Config, ConvertOptions};
use crate::document::{convert_document, ConversionResult};
use crate::errors::{BeamerError, Result};
use crate::html::{self, OutputFormat, PageOptions};
use crate::utils;
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of converting one input file.
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub lecture_name: String,
    pub outcome: Result<ConversionResult>,
}

/// What `write_outputs` did.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub degraded: usize,
}

/// Expand a glob pattern into a sorted list of files.
pub fn collect_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut inputs: Vec<PathBuf> = glob::glob(pattern)?
        .flatten()
        .filter(|path| path.is_file())
        .collect();
    inputs.sort();

    info!("Found {} input files for {}", inputs.len(), pattern);
    if inputs.is_empty() {
        return Err(BeamerError::NoInputsFoundError(pattern.to_string()));
    }
    Ok(inputs)
}

/// Read and convert a single deck.
pub fn convert_file(path: &Path, config: &Config, charts: &ChartMap, lecture_name: &str) -> Result<ConversionResult> {
    utils::validate_file_exists(path)?;
    let source = fs::read_to_string(path)?;
    let options = config.get_convert_options(charts.clone(), lecture_name);

    info!("Converting {:?} (lecture '{}')", path, lecture_name);
    let result = convert_document(&source, &options);
    if result.degraded {
        warn!("{:?} was converted with the text fallback", path);
    }
    Ok(result)
}

/// Convert every file matching `pattern`, each with its own lecture name.
pub fn convert_glob(pattern: &str, config: &Config, charts: &ChartMap) -> Result<Vec<BatchItem>> {
    let inputs = collect_inputs(pattern)?;

    let items = inputs
        .into_par_iter()
        .map(|input| {
            let lecture_name = ConvertOptions::lecture_name_for(&input);
            let outcome = convert_file(&input, config, charts, &lecture_name);
            BatchItem {
                input,
                lecture_name,
                outcome,
            }
        })
        .collect();
    Ok(items)
}

/// Output location for one input: `<out_dir>/<lecture>/<stem>.<ext>`.
pub fn output_path_for(item: &BatchItem, out_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = item
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string());
    let file_name = format!("{}.{}", stem, format.extension());

    if item.lecture_name.is_empty() {
        out_dir.join(file_name)
    } else {
        out_dir.join(&item.lecture_name).join(file_name)
    }
}

/// Write every successful conversion; failures are collected, not raised.
pub fn write_outputs(
    items: &[BatchItem],
    out_dir: &Path,
    format: OutputFormat,
    page: &PageOptions,
) -> Result<BatchSummary> {
    utils::ensure_directory_exists(out_dir)?;
    let mut summary = BatchSummary::default();

    for item in items {
        let result = match &item.outcome {
            Ok(result) => result,
            Err(e) => {
                warn!("Skipping {:?}: {}", item.input, e);
                summary.failed.push((item.input.clone(), e.to_string()));
                continue;
            }
        };

        if result.degraded {
            summary.degraded += 1;
        }
        let output = output_path_for(item, out_dir, format);
        let rendered = html::render_output(result, format, page)?;
        html::write_html_to_file(&rendered, &output)?;
        summary.written.push(output);
    }

    info!(
        "Wrote {} outputs ({} failed, {} degraded)",
        summary.written.len(),
        summary.failed.len(),
        summary.degraded
    );
    Ok(summary)
}
