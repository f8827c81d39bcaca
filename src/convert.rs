// ABOUTME: Node dispatcher turning document tree nodes into HTML, plus the inline converters
// ABOUTME: Dispatch goes through static name tables; unknown commands keep their children

use crate::charts::{resolve_image_path, ChartMap};
use crate::colors::{ColorTable, HIGHLIGHT_COLOR};
use crate::config::ConvertOptions;
use crate::node::{Arg, Node};
use crate::parser::TreeBuilder;
use crate::text;
use lazy_static::lazy_static;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Itemize,
    Enumerate,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    List(ListKind),
    Table,
    Columns,
    Column,
    Block(&'static str),
    MathBlock,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineKind {
    Bold,
    Italic,
    Underline,
    Monospace,
    /// Font/box wrappers whose content renders unchanged.
    Plain,
    Color,
    Highlight,
    Image,
    BottomNote,
    Link,
    Url,
    /// Table helpers like `\multicolumn{2}{c}{x}`: only the last argument is content.
    LastArg,
}

/// How the dispatcher treats a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Text,
    Group,
    Suppressed,
    Environment(EnvironmentKind),
    Inline(InlineKind),
    Unknown,
}

lazy_static! {
    /// Layout-only or preamble commands with no visual output.
    static ref SUPPRESSED: HashSet<&'static str> = [
        "frametitle", "framesubtitle", "titlepage", "tableofcontents", "pause",
        "vspace", "vspace*", "hspace", "hspace*", "vfill", "hfill", "centering",
        "setlength", "item", "section", "subsection", "label", "maketitle",
        "documentclass", "usepackage", "usetheme", "usecolortheme", "setbeamercolor",
        "setbeamertemplate", "definecolor", "newcommand", "renewcommand", "color",
        "title", "subtitle", "author", "date", "institute", "noindent",
        "smallskip", "medskip", "bigskip", "toprule", "midrule", "bottomrule", "hline",
    ]
    .into_iter()
    .collect();

    static ref ENVIRONMENTS: HashMap<&'static str, EnvironmentKind> = {
        let mut table = HashMap::new();
        table.insert("itemize", EnvironmentKind::List(ListKind::Itemize));
        table.insert("enumerate", EnvironmentKind::List(ListKind::Enumerate));
        table.insert("description", EnvironmentKind::List(ListKind::Description));
        for name in ["tabular", "tabular*", "tabularx", "table", "table*"] {
            table.insert(name, EnvironmentKind::Table);
        }
        table.insert("columns", EnvironmentKind::Columns);
        table.insert("column", EnvironmentKind::Column);
        table.insert("block", EnvironmentKind::Block("block"));
        table.insert("alertblock", EnvironmentKind::Block("block alertblock"));
        table.insert("exampleblock", EnvironmentKind::Block("block exampleblock"));
        for name in [
            "equation", "equation*", "align", "align*", "gather", "gather*",
            "multline", "multline*", "displaymath", "eqnarray", "eqnarray*",
        ] {
            table.insert(name, EnvironmentKind::MathBlock);
        }
        table.insert("center", EnvironmentKind::Center);
        table
    };

    static ref COMMANDS: HashMap<&'static str, InlineKind> = {
        let mut table = HashMap::new();
        table.insert("textbf", InlineKind::Bold);
        table.insert("textit", InlineKind::Italic);
        table.insert("emph", InlineKind::Italic);
        table.insert("underline", InlineKind::Underline);
        table.insert("texttt", InlineKind::Monospace);
        for name in ["textrm", "textsf", "textsc", "textnormal", "text", "mbox"] {
            table.insert(name, InlineKind::Plain);
        }
        table.insert("textcolor", InlineKind::Color);
        table.insert("highlight", InlineKind::Highlight);
        table.insert("includegraphics", InlineKind::Image);
        table.insert("bottomnote", InlineKind::BottomNote);
        table.insert("href", InlineKind::Link);
        table.insert("url", InlineKind::Url);
        table.insert("multicolumn", InlineKind::LastArg);
        table.insert("multirow", InlineKind::LastArg);
        table
    };
}

/// Environments whose body is display math and must be read verbatim.
pub(crate) fn is_math_block(name: &str) -> bool {
    matches!(ENVIRONMENTS.get(name), Some(EnvironmentKind::MathBlock))
}

/// Pick the handler for a node, in dispatch priority order.
pub fn classify(node: &Node) -> Handler {
    match node {
        Node::Text(_) => Handler::Text,
        Node::Group(_) => Handler::Group,
        Node::Command { name, .. } if SUPPRESSED.contains(name.as_str()) => Handler::Suppressed,
        Node::Environment { name, .. } if SUPPRESSED.contains(name.as_str()) => Handler::Suppressed,
        Node::Environment { name, .. } => ENVIRONMENTS
            .get(name.as_str())
            .map_or(Handler::Unknown, |kind| Handler::Environment(*kind)),
        Node::Command { name, .. } => COMMANDS
            .get(name.as_str())
            .map_or(Handler::Unknown, |kind| Handler::Inline(*kind)),
    }
}

/// Converts document tree nodes to HTML.
///
/// Holds only shared references to immutable tables, so one converter can be
/// used from many threads at once.
pub struct Converter<'a> {
    pub(crate) colors: &'a ColorTable,
    pub(crate) charts: &'a ChartMap,
    pub(crate) lecture_name: &'a str,
    pub(crate) builder: &'a dyn TreeBuilder,
}

impl<'a> Converter<'a> {
    pub fn new(options: &'a ConvertOptions, builder: &'a dyn TreeBuilder) -> Self {
        Self {
            colors: &options.colors,
            charts: &options.charts,
            lecture_name: &options.lecture_name,
            builder,
        }
    }

    pub fn render(&self, node: &Node) -> String {
        match classify(node) {
            Handler::Text => match node {
                Node::Text(raw) => text::normalize(raw),
                _ => String::new(),
            },
            Handler::Group => self.render_children(node),
            Handler::Suppressed => String::new(),
            Handler::Environment(kind) => self.render_environment(node, kind),
            Handler::Inline(kind) => self.render_inline(node, kind),
            Handler::Unknown => {
                debug!(
                    "Unknown command `{}`, rendering its children",
                    node.name().unwrap_or_default()
                );
                self.render_children(node)
            }
        }
    }

    pub fn render_nodes(&self, nodes: &[Node]) -> String {
        nodes.iter().map(|node| self.render(node)).collect()
    }

    pub fn render_refs(&self, nodes: &[&Node]) -> String {
        nodes.iter().map(|node| self.render(node)).collect()
    }

    pub fn render_children(&self, node: &Node) -> String {
        self.render_refs(&node.children())
    }

    fn render_arg(&self, arg: Option<&Arg>) -> String {
        arg.map(|arg| self.render_nodes(arg.nodes())).unwrap_or_default()
    }

    /// Tree-build and render a standalone source fragment, or normalize it
    /// as plain text if it does not parse.
    pub fn render_fragment(&self, source: &str) -> String {
        match self.builder.build(source) {
            Ok(nodes) => self.render_nodes(&nodes),
            Err(err) => {
                debug!("Fragment did not parse ({}), using plain text", err);
                text::normalize(source)
            }
        }
    }

    fn render_inline(&self, node: &Node, kind: InlineKind) -> String {
        match kind {
            InlineKind::Bold => format!("<strong>{}</strong>", self.render_children(node)),
            InlineKind::Italic => format!("<em>{}</em>", self.render_children(node)),
            InlineKind::Underline => format!("<u>{}</u>", self.render_children(node)),
            InlineKind::Monospace => format!("<code>{}</code>", self.render_children(node)),
            InlineKind::Plain => self.render_children(node),
            InlineKind::Color => self.convert_textcolor(node),
            InlineKind::Highlight => format!(
                "<span style=\"color: {}\"><strong>{}</strong></span>",
                HIGHLIGHT_COLOR,
                self.render_children(node)
            ),
            InlineKind::Image => self.convert_image(node),
            InlineKind::BottomNote => format!(
                "<p class=\"bottomnote\" style=\"color: #666666; font-size: 0.85em; margin-top: 1em;\"><em>{}</em></p>",
                self.render_children(node)
            ),
            InlineKind::Link => {
                let href = node.required_arg(0).map(Arg::inner_source).unwrap_or_default();
                let label = self.render_arg(node.required_arg(1));
                format!(
                    "<a href=\"{}\">{}</a>",
                    text::escape_attribute(href.trim()),
                    if label.trim().is_empty() { text::escape_html(href.trim()) } else { label }
                )
            }
            InlineKind::Url => {
                let href = node.required_arg(0).map(Arg::inner_source).unwrap_or_default();
                let href = href.trim();
                format!(
                    "<a href=\"{}\">{}</a>",
                    text::escape_attribute(href),
                    text::escape_html(href)
                )
            }
            InlineKind::LastArg => {
                let count = node.args().iter().filter(|arg| arg.is_required()).count();
                match count.checked_sub(1) {
                    Some(last) => self.render_arg(node.required_arg(last)),
                    None => String::new(),
                }
            }
        }
    }

    /// `\textcolor[model]{name}{content}`
    fn convert_textcolor(&self, node: &Node) -> String {
        let (Some(name), Some(content)) = (node.required_arg(0), node.required_arg(1)) else {
            return self.render_children(node);
        };
        let model = node.optional_arg(0).map(Arg::inner_source);
        let name = name.inner_source();
        if model.is_none() && self.colors.get(&name).is_none() {
            warn!("Unknown color `{}`, using default", name.trim());
        }
        let hex = self.colors.resolve_spec(model.as_deref(), &name);
        format!(
            "<span style=\"color: {}\">{}</span>",
            hex,
            self.render_nodes(content.nodes())
        )
    }

    /// `\includegraphics[opts]{path}`
    fn convert_image(&self, node: &Node) -> String {
        let reference = node.required_arg(0).map(Arg::inner_source).unwrap_or_default();
        let reference = reference.trim();
        if reference.is_empty() {
            return String::new();
        }

        let src = resolve_image_path(reference, self.charts, self.lecture_name);
        if src == reference && reference.ends_with(".pdf") {
            warn!("Figure `{}` has no web rendition; linking the PDF", reference);
        }
        format!(
            "<img src=\"{}\" style=\"max-width:100%; max-height:500px;\">",
            text::escape_attribute(&src)
        )
    }
}
