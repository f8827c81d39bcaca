// ABOUTME: Metadata extraction and frame location over the parsed document tree
// ABOUTME: Each frame becomes one <section>, or the title-slide placeholder

use crate::config::MetadataDefaults;
use crate::convert::Converter;
use crate::math;
use crate::node::{find_command, find_environments, Arg, Node};
use crate::text;
use serde::{Deserialize, Serialize};

/// Emitted for title-page frames; the page template swaps in the real title slide.
pub const TITLE_SLIDE: &str = "<section id=\"title-slide\"></section>";

const TITLE_PAGE_MARKER: &str = "\\titlepage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

impl Metadata {
    pub fn from_defaults(defaults: &MetadataDefaults) -> Self {
        Self {
            title: defaults.title.clone(),
            subtitle: defaults.subtitle.clone(),
            author: defaults.author.clone(),
            date: defaults.date.clone(),
        }
    }
}

/// One slide's logical unit, borrowing from the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<'a> {
    pub raw_options: String,
    pub title: Option<&'a [Node]>,
    pub subtitle: Option<&'a [Node]>,
    pub body: Vec<&'a Node>,
    pub is_title_slide: bool,
}

/// Pull title/subtitle/author/date from their commands, falling back to the defaults.
pub fn extract_metadata(nodes: &[Node], defaults: &MetadataDefaults) -> Metadata {
    let field = |name: &str, default: &str| {
        find_command(nodes, name)
            .and_then(|command| command.required_arg(0))
            .map(|arg| math::restore(&text::normalize_trimmed(&plain_text(arg.nodes()))))
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    Metadata {
        title: field("title", &defaults.title),
        subtitle: field("subtitle", &defaults.subtitle),
        author: field("author", &defaults.author),
        date: field("date", &defaults.date),
    }
}

/// Text content of a subtree with command names dropped; `\\` stays for the normalizer.
fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(raw) => out.push_str(raw),
            _ => {
                for child in node.children() {
                    out.push_str(&plain_text(std::slice::from_ref(child)));
                }
            }
        }
    }
    out
}

/// All `frame` environments in source order.
pub fn locate_frames(nodes: &[Node]) -> Vec<Frame<'_>> {
    find_environments(nodes, "frame")
        .into_iter()
        .map(frame_from_node)
        .collect()
}

fn frame_from_node(node: &Node) -> Frame<'_> {
    let raw_options = node.optional_arg(0).map(Arg::inner_source).unwrap_or_default();
    // containment anywhere in the subtree, not a structural check
    let is_title_slide = node.to_source().contains(TITLE_PAGE_MARKER);

    let title = node
        .required_arg(0)
        .or_else(|| node.find_command("frametitle").and_then(|cmd| cmd.required_arg(0)))
        .map(Arg::nodes);
    let subtitle = node
        .required_arg(1)
        .or_else(|| node.find_command("framesubtitle").and_then(|cmd| cmd.required_arg(0)))
        .map(Arg::nodes);

    Frame {
        raw_options,
        title,
        subtitle,
        body: node.children(),
        is_title_slide,
    }
}

/// Render one frame to its HTML section, with math restored.
pub fn convert_frame(converter: &Converter, frame: &Frame) -> String {
    if frame.is_title_slide {
        return TITLE_SLIDE.to_string();
    }

    let mut parts = vec!["<section>".to_string()];
    if let Some(title) = frame.title {
        let title = converter.render_nodes(title);
        if !title.trim().is_empty() {
            parts.push(format!("<h2>{}</h2>", title.trim()));
        }
    }
    if let Some(subtitle) = frame.subtitle {
        let subtitle = converter.render_nodes(subtitle);
        if !subtitle.trim().is_empty() {
            parts.push(format!("<h3>{}</h3>", subtitle.trim()));
        }
    }
    for child in &frame.body {
        let html = converter.render(child);
        let html = html.trim();
        if !html.is_empty() {
            parts.push(html.to_string());
        }
    }
    parts.push("</section>".to_string());

    math::restore(&parts.join("\n"))
}
