// ABOUTME: HTML page assembly for converted decks
// ABOUTME: Wraps the sections in a reveal.js + MathJax skeleton, or serialises the result as JSON

use crate::document::ConversionResult;
use crate::errors::{BeamerError, Result};
use crate::frames::{Metadata, TITLE_SLIDE};
use crate::text::escape_html;
use log::info;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Script locations used by the page skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub reveal_url: String,
    pub mathjax_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = BeamerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(BeamerError::ValidationError(format!(
                "Unknown output format '{}', expected html or json",
                other
            ))),
        }
    }
}

/// Build the title slide that replaces the placeholder section.
pub fn render_title_slide(metadata: &Metadata) -> String {
    let mut html = String::from("<section class=\"title-slide\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", metadata.title));
    if !metadata.subtitle.is_empty() {
        html.push_str(&format!("<h3>{}</h3>\n", metadata.subtitle));
    }
    if !metadata.author.is_empty() {
        html.push_str(&format!("<p class=\"author\">{}</p>\n", metadata.author));
    }
    if !metadata.date.is_empty() {
        html.push_str(&format!("<p class=\"date\">{}</p>\n", metadata.date));
    }
    html.push_str("</section>");
    html
}

/// Assemble a standalone reveal.js page from a conversion result.
pub fn render_page(result: &ConversionResult, page: &PageOptions) -> String {
    let reveal = page.reveal_url.trim_end_matches('/');
    let title_slide = render_title_slide(&result.metadata);

    let mut html_doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    // metadata is already escaped text, possibly with restored math
    html_doc.push_str(&format!("<title>{}</title>\n", result.metadata.title));
    html_doc.push_str(&format!("<link rel=\"stylesheet\" href=\"{}/dist/reveal.css\">\n", reveal));
    html_doc.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{}/dist/theme/white.css\" id=\"theme\">\n",
        reveal
    ));
    html_doc.push_str(STYLE);
    html_doc.push_str("</head>\n<body>\n<div class=\"reveal\">\n<div class=\"slides\">\n");

    for section in &result.sections {
        if section == TITLE_SLIDE {
            html_doc.push_str(&title_slide);
        } else {
            html_doc.push_str(section);
        }
        html_doc.push('\n');
    }

    html_doc.push_str("</div>\n</div>\n");
    html_doc.push_str("<script>window.MathJax = { tex: { inlineMath: [['\\\\(', '\\\\)']], displayMath: [['\\\\[', '\\\\]']] } };</script>\n");
    html_doc.push_str(&format!("<script src=\"{}\"></script>\n", escape_html(&page.mathjax_url)));
    html_doc.push_str(&format!("<script src=\"{}/dist/reveal.js\"></script>\n", reveal));
    html_doc.push_str("<script>Reveal.initialize({ hash: true, slideNumber: true });</script>\n");
    html_doc.push_str("</body>\n</html>\n");
    html_doc
}

const STYLE: &str = "<style>\n\
.reveal .beamer-table { border-collapse: collapse; margin: 0 auto; font-size: 0.7em; }\n\
.reveal .beamer-table th, .reveal .beamer-table td { border: 1px solid #ccc; padding: 0.2em 0.6em; }\n\
.reveal .columns { display: flex; gap: 1em; }\n\
.reveal .column { flex: 1; }\n\
.reveal .block, .reveal .alertblock, .reveal .exampleblock { border-left: 4px solid #3333B2; padding: 0.3em 0.8em; text-align: left; }\n\
.reveal .alertblock { border-color: #D62728; }\n\
.reveal .exampleblock { border-color: #2CA02C; }\n\
.reveal .bottomnote { font-size: 0.6em; color: #666666; margin-top: 1em; }\n\
</style>\n";

/// Render a conversion result in the requested output format.
pub fn render_output(result: &ConversionResult, format: OutputFormat, page: &PageOptions) -> Result<String> {
    match format {
        OutputFormat::Html => Ok(render_page(result, page)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

/// Utility function to write output content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing output to file: {:?}", output_path);

    // Ensure parent directory exists
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(BeamerError::FileReadError)?;
        }
    }

    fs::write(output_path, html_content).map_err(BeamerError::FileReadError)?;

    Ok(())
}
