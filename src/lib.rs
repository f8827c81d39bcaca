// ABOUTME: Library module for the beamer-reveal program.
// ABOUTME: Converts Beamer LaTeX decks into ordered reveal.js HTML sections plus metadata.

// Reexport modules
pub mod batch;
pub mod charts;
pub mod colors;
pub mod config;
pub mod convert;
pub mod document;
mod environments;
pub mod errors;
pub mod fallback;
pub mod frames;
pub mod html;
pub mod math;
pub mod node;
pub mod parser;
pub mod text;
pub mod utils;
pub mod watch;

// Reexport common types and functions
pub use batch::{convert_file, convert_glob, BatchItem, BatchSummary};
pub use charts::{resolve_image_path, ChartMap};
pub use colors::ColorTable;
pub use config::{Config, ConvertOptions, MetadataDefaults};
pub use convert::Converter;
pub use document::{convert_document, convert_document_with, ConversionResult};
pub use errors::{BeamerError, Result};
pub use frames::{Metadata, TITLE_SLIDE};
pub use html::{render_output, render_page, write_html_to_file, OutputFormat, PageOptions};
pub use node::{Arg, Node};
pub use parser::{LatexTreeBuilder, TreeBuilder};
pub use watch::{watch_deck, WatchConfig};
