// ABOUTME: Text-based conversion used when the tree-builder rejects a whole file
// ABOUTME: Frames are re-built one by one; frames that still fail get a coarse regex rendering

use crate::config::{ConvertOptions, MetadataDefaults};
use crate::convert::Converter;
use crate::document::ConversionResult;
use crate::frames::{self, Metadata, TITLE_SLIDE};
use crate::math;
use crate::parser::{strip_comments, TreeBuilder};
use crate::text;
use lazy_static::lazy_static;
use log::{debug, warn};
use rayon::prelude::*;
use regex::Regex;

lazy_static! {
    static ref FRAME_BLOCK: Regex =
        Regex::new(r"(?s)\\begin\{frame\}.*?\\end\{frame\}").expect("invalid regex expression");
    static ref FRAME_HEAD: Regex =
        Regex::new(r"^\\begin\{frame\}(?:\[[^\]]*\])?(?:\{([^{}]*)\})?").expect("invalid regex expression");
    static ref FRAME_TAIL: Regex = Regex::new(r"\\end\{frame\}$").expect("invalid regex expression");
    static ref FRAMETITLE: Regex = Regex::new(r"\\frametitle\{([^}]*)\}").expect("invalid regex expression");
    static ref ITEM: Regex = Regex::new(r"\\item\b(?:\[[^\]]*\])?").expect("invalid regex expression");
    static ref LINE_BREAK: Regex = Regex::new(r"\\\\(?:\[[^\]]*\])?").expect("invalid regex expression");
    static ref BEGIN_END: Regex = Regex::new(r"\\(?:begin|end)\{[^}]*\}").expect("invalid regex expression");
    static ref DROPPED_WITH_ARGS: Regex = Regex::new(
        r"\\(?:vspace\*?|hspace\*?|includegraphics|label|frametitle|framesubtitle)(?:\[[^\]]*\])?(?:\{[^}]*\})?"
    )
    .expect("invalid regex expression");
    static ref COMMAND_NAME: Regex =
        Regex::new(r"\\[A-Za-z]+\*?(?:\[[^\]]*\])?").expect("invalid regex expression");
    static ref METADATA_FIELDS: Vec<(&'static str, Regex)> = ["title", "subtitle", "author", "date"]
        .iter()
        .map(|name| {
            let pattern = format!(r"(?s)\\{}(?:\[[^\]]*\])?\{{(.+?)\}}", name);
            (*name, Regex::new(&pattern).expect("invalid regex expression"))
        })
        .collect();
}

/// Convert math-protected source whose tree could not be built as a whole.
///
/// Each `\begin{frame}..\end{frame}` block is tree-built on its own; a
/// block that still fails is rendered by [`coarse_frame`]. Output order
/// follows the source.
pub fn convert_segmented(
    protected: &str,
    options: &ConvertOptions,
    builder: &dyn TreeBuilder,
) -> ConversionResult {
    let source = strip_comments(protected);
    let metadata = extract_metadata(&source, &options.metadata_defaults);
    let segments: Vec<&str> = FRAME_BLOCK.find_iter(&source).map(|m| m.as_str()).collect();
    debug!("Segmented source into {} frame blocks", segments.len());

    let sections: Vec<String> = segments
        .par_iter()
        .enumerate()
        .flat_map_iter(|(index, segment)| match builder.build(segment) {
            Ok(nodes) => {
                let converter = Converter::new(options, builder);
                let located = frames::locate_frames(&nodes);
                located
                    .iter()
                    .map(|frame| frames::convert_frame(&converter, frame))
                    .collect::<Vec<_>>()
            }
            Err(err) => {
                warn!("Frame {} could not be parsed ({}), using coarse text extraction", index + 1, err);
                vec![coarse_frame(segment)]
            }
        })
        .collect();

    ConversionResult {
        sections,
        metadata,
        degraded: true,
    }
}

/// Regex metadata lookup over raw source, used when no tree is available.
pub fn extract_metadata(source: &str, defaults: &MetadataDefaults) -> Metadata {
    let mut metadata = Metadata::from_defaults(defaults);
    for (name, pattern) in METADATA_FIELDS.iter() {
        let Some(caps) = pattern.captures(source) else {
            continue;
        };
        let value = math::restore(&coarse_text(&caps[1]));
        if value.is_empty() {
            continue;
        }
        match *name {
            "title" => metadata.title = value,
            "subtitle" => metadata.subtitle = value,
            "author" => metadata.author = value,
            _ => metadata.date = value,
        }
    }
    metadata
}

/// Render one raw frame block without a tree.
pub fn coarse_frame(segment: &str) -> String {
    if segment.contains("\\titlepage") {
        return TITLE_SLIDE.to_string();
    }

    let head = FRAME_HEAD.captures(segment);
    let title = head
        .as_ref()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .or_else(|| FRAMETITLE.captures(segment).and_then(|caps| caps.get(1)).map(|m| m.as_str()))
        .map(coarse_text)
        .unwrap_or_default();

    let head_len = head.and_then(|caps| caps.get(0)).map_or(0, |m| m.end());
    let body = FRAME_TAIL.replace(&segment[head_len..], "");

    let mut parts = vec!["<section>".to_string()];
    if !title.is_empty() {
        parts.push(format!("<h2>{}</h2>", title));
    }

    let mut pieces = ITEM.split(&body);
    let lead = pieces.next().map(coarse_text).unwrap_or_default();
    if !lead.is_empty() {
        parts.push(lead);
    }
    let items: Vec<String> = pieces
        .map(coarse_text)
        .filter(|item| !item.is_empty())
        .map(|item| format!("<li>{}</li>", item))
        .collect();
    if !items.is_empty() {
        parts.push(format!("<ul>\n{}\n</ul>", items.join("\n")));
    }
    parts.push("</section>".to_string());

    math::restore(&parts.join("\n"))
}

/// Strip LaTeX markup from raw text and normalize what is left.
pub(crate) fn coarse_text(raw: &str) -> String {
    let stripped = LINE_BREAK.replace_all(raw, " ");
    let stripped = BEGIN_END.replace_all(&stripped, " ");
    let stripped = DROPPED_WITH_ARGS.replace_all(&stripped, "");
    let stripped = COMMAND_NAME.replace_all(&stripped, "");
    text::normalize_trimmed(&strip_braces(&stripped))
}

/// Drop unescaped `{` and `}`; escaped pairs are left for the normalizer.
fn strip_braces(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '{' | '}' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LatexTreeBuilder;

    #[test]
    fn test_coarse_text_strips_markup() {
        assert_eq!(
            coarse_text("\\textbf{Bold} and \\emph{soft}\\\\ next \\vspace{2mm}line"),
            "Bold and soft next line"
        );
        assert_eq!(coarse_text("\\includegraphics[width=3cm]{a.pdf} caption"), "caption");
        assert_eq!(coarse_text("50\\% \\& more"), "50% &amp; more");
    }

    #[test]
    fn test_coarse_frame_with_items() {
        let html = coarse_frame("\\begin{frame}[t]{Broken}\\begin{itemize}\\item one \\item \\textbf{two\\end{itemize}\\end{frame}");
        assert_eq!(
            html,
            "<section>\n<h2>Broken</h2>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n</section>"
        );
    }

    #[test]
    fn test_coarse_frame_frametitle_and_math() {
        let protected = math::protect("\\begin{frame}\\frametitle{Loss}Minimise $f(x)$ {\\end{frame}");
        let html = coarse_frame(&protected.text);
        assert_eq!(html, "<section>\n<h2>Loss</h2>\nMinimise \\(f(x)\\)\n</section>");
    }

    #[test]
    fn test_coarse_frame_title_page() {
        assert_eq!(coarse_frame("\\begin{frame}\\titlepage{\\end{frame}"), TITLE_SLIDE);
    }

    #[test]
    fn test_broken_frame_does_not_lose_neighbours() {
        let source = "\\title{Deck}\n\\begin{document}\n\
            \\begin{frame}{One}First\\end{frame}\n\
            \\begin{frame}{Two}\\textbf{oops\\end{frame}\n\
            \\begin{frame}{Three}Third\\end{frame}\n\
            \\end{document}";
        let options = ConvertOptions::default();
        let result = convert_segmented(source, &options, &LatexTreeBuilder);

        assert!(result.degraded);
        assert_eq!(result.metadata.title, "Deck");
        assert_eq!(result.sections.len(), 3);
        assert_eq!(result.sections[0], "<section>\n<h2>One</h2>\nFirst\n</section>");
        assert!(result.sections[1].contains("<h2>Two</h2>"));
        assert!(result.sections[1].contains("oops"));
        assert_eq!(result.sections[2], "<section>\n<h2>Three</h2>\nThird\n</section>");
    }

    #[test]
    fn test_regex_metadata() {
        let source = "\\title[Short]{Full \\emph{Title}}\n\\author{A. Person}";
        let metadata = extract_metadata(source, &MetadataDefaults::default());
        assert_eq!(metadata.title, "Full Title");
        assert_eq!(metadata.author, "A. Person");
        assert_eq!(metadata.date, "");
    }
}
