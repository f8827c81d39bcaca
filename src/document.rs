// ABOUTME: End-to-end conversion of one Beamer source text into ordered HTML sections
// ABOUTME: Protects math, builds the tree, converts frames in parallel, degrades to the text fallback

use crate::config::ConvertOptions;
use crate::convert::Converter;
use crate::fallback;
use crate::frames::{self, Metadata};
use crate::math;
use crate::parser::{strip_comments, LatexTreeBuilder, TreeBuilder};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered HTML fragments for one deck plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub sections: Vec<String>,
    pub metadata: Metadata,
    /// Set when the text fallback produced some of the output.
    #[serde(default)]
    pub degraded: bool,
}

/// Convert a deck with the bundled tree-builder.
pub fn convert_document(source: &str, options: &ConvertOptions) -> ConversionResult {
    convert_document_with(source, options, &LatexTreeBuilder)
}

/// Convert a deck with a caller-supplied tree-builder.
///
/// Never fails: if the tree cannot be built for the whole file, frames are
/// recovered one by one from the source text instead.
pub fn convert_document_with(
    source: &str,
    options: &ConvertOptions,
    builder: &dyn TreeBuilder,
) -> ConversionResult {
    let protected = math::protect(&strip_comments(source));
    info!("Protected {} math regions", protected.spans.len());

    let nodes = match builder.build(&protected.text) {
        Ok(nodes) => nodes,
        Err(err) => {
            warn!("Document tree could not be built ({}), falling back to per-frame conversion", err);
            return fallback::convert_segmented(&protected.text, options, builder);
        }
    };

    let metadata = frames::extract_metadata(&nodes, &options.metadata_defaults);
    let located = frames::locate_frames(&nodes);
    if located.is_empty() {
        warn!("No frames found in document");
    }

    let converter = Converter::new(options, builder);
    let sections: Vec<String> = located
        .par_iter()
        .map(|frame| frames::convert_frame(&converter, frame))
        .collect();
    info!("Converted {} frames", sections.len());

    ConversionResult {
        sections,
        metadata,
        degraded: false,
    }
}
