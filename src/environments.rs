// ABOUTME: Environment converters for lists, tables, column layouts, blocks and display math
// ABOUTME: Lists and tables parse the tree first and fall back to the raw source text

use crate::convert::{Converter, EnvironmentKind, ListKind};
use crate::fallback;
use crate::math;
use crate::node::Node;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

const TABULAR_NAMES: &[&str] = &["tabular", "tabular*", "tabularx"];

lazy_static! {
    static ref ITEM_MARKER: Regex = Regex::new(r"\\item\b(?:\[[^\]]*\])?\s*").expect("invalid regex expression");
    static ref LIST_END: Regex =
        Regex::new(r"(?s)\\end\{(?:itemize|enumerate|description)\}.*").expect("invalid regex expression");
    static ref TABLE_RULE: Regex = Regex::new(
        r"\\(?:toprule|midrule|bottomrule|hline)\b|\\cline\{[^}]*\}|\\cmidrule(?:\([^)]*\))?\{[^}]*\}"
    )
    .expect("invalid regex expression");
    static ref ROW_SEPARATOR: Regex = Regex::new(r"\\\\(?:\[[^\]]*\])?").expect("invalid regex expression");
    static ref BOLD_WRAPPER: Regex = Regex::new(r"\\textbf\{([^{}]*)\}").expect("invalid regex expression");
    static ref WIDTH_NUMBER: Regex = Regex::new(r"^[\d.]+$").expect("invalid regex expression");
}

impl<'a> Converter<'a> {
    pub(crate) fn render_environment(&self, node: &Node, kind: EnvironmentKind) -> String {
        match kind {
            EnvironmentKind::List(list) => self.convert_list(node, list),
            EnvironmentKind::Table => self.convert_table(node),
            EnvironmentKind::Columns => self.convert_columns(node),
            EnvironmentKind::Column => format!("<div class=\"column\">{}</div>", self.column_contents(node)),
            EnvironmentKind::Block(class) => self.convert_block(node, class),
            EnvironmentKind::MathBlock => convert_math_block(node),
            EnvironmentKind::Center => format!("<div class=\"center\">{}</div>", self.render_children(node)),
        }
    }

    /// Split children at `\item` markers; anything before the first marker is a preamble.
    fn convert_list(&self, node: &Node, kind: ListKind) -> String {
        let tag = match kind {
            ListKind::Enumerate => "ol",
            ListKind::Itemize | ListKind::Description => "ul",
        };

        let mut preamble: Vec<&Node> = Vec::new();
        let mut segments: Vec<(&Node, Vec<&Node>)> = Vec::new();
        for child in node.children() {
            if child.is_command("item") {
                segments.push((child, Vec::new()));
            } else if let Some((_, body)) = segments.last_mut() {
                body.push(child);
            } else {
                preamble.push(child);
            }
        }

        if segments.is_empty() {
            debug!("No \\item nodes in `{}`, splitting raw source", node.name().unwrap_or_default());
            let items = fallback_list_items(node);
            if items.is_empty() {
                return String::new();
            }
            return format!("<{tag}>\n{}\n</{tag}>", items.join("\n"));
        }

        let items: Vec<String> = segments
            .iter()
            .filter_map(|(marker, body)| self.render_item(marker, body))
            .collect();

        let preamble = self.render_refs(&preamble);
        let preamble = preamble.trim();
        let list = format!("<{tag}>\n{}\n</{tag}>", items.join("\n"));
        if preamble.is_empty() {
            list
        } else {
            format!("{}\n{}", preamble, list)
        }
    }

    fn render_item(&self, marker: &Node, body: &[&Node]) -> Option<String> {
        let mut content = self.render_children(marker);
        content.push_str(&self.render_refs(body));
        let content = content.trim();

        let label = marker
            .optional_arg(0)
            .map(|arg| self.render_nodes(arg.nodes()).trim().to_string())
            .unwrap_or_default();

        match (label.is_empty(), content.is_empty()) {
            (true, true) => None,
            (true, false) => Some(format!("<li>{}</li>", content)),
            (false, true) => Some(format!("<li><strong>{}</strong></li>", label)),
            (false, false) => Some(format!("<li><strong>{}</strong> {}</li>", label, content)),
        }
    }

    fn convert_table(&self, node: &Node) -> String {
        let tabular = TABULAR_NAMES
            .iter()
            .find_map(|name| node.find_environments(name).into_iter().next());
        let body: String = tabular
            .unwrap_or(node)
            .children()
            .iter()
            .map(|child| child.to_source())
            .collect();

        let body = TABLE_RULE.replace_all(&body, "");
        let rows: Vec<String> = ROW_SEPARATOR
            .split(&body)
            .map(str::trim)
            .filter(|row| !row.is_empty())
            .map(|row| {
                let cells: String = split_cells(row)
                    .into_iter()
                    .map(|cell| self.render_cell(cell))
                    .collect();
                format!("<tr>{}</tr>", cells)
            })
            .collect();

        if rows.is_empty() {
            return String::new();
        }
        format!("<table class=\"beamer-table\">\n{}\n</table>", rows.join("\n"))
    }

    /// Cells containing a bold wrapper become header cells, shown without the wrapper.
    fn render_cell(&self, cell: &str) -> String {
        let cell = cell.trim();
        if cell.contains("\\textbf") {
            let unwrapped = BOLD_WRAPPER.replace_all(cell, "$1");
            format!("<th>{}</th>", self.render_fragment(&unwrapped).trim())
        } else {
            format!("<td>{}</td>", self.render_fragment(cell).trim())
        }
    }

    fn convert_columns(&self, node: &Node) -> String {
        let columns: Vec<&Node> = node
            .children()
            .into_iter()
            .flat_map(|child| child.find_environments("column"))
            .collect();
        if columns.is_empty() {
            return self.render_children(node);
        }

        let mut html = String::from("<div class=\"columns\">");
        for column in columns {
            html.push_str(&format!("<div class=\"column\">{}</div>", self.column_contents(column)));
        }
        html.push_str("</div>");
        html
    }

    fn column_contents(&self, column: &Node) -> String {
        column
            .children()
            .into_iter()
            .filter(|child| !is_width_spec(child))
            .map(|child| self.render(child))
            .collect()
    }

    fn convert_block(&self, node: &Node, class: &str) -> String {
        let title = node
            .required_arg(0)
            .map(|arg| self.render_nodes(arg.nodes()).trim().to_string())
            .unwrap_or_default();
        let content = self.render_children(node);

        let mut html = format!("<div class=\"{}\">\n", class);
        if !title.is_empty() {
            html.push_str(&format!("<div class=\"block-title\"><strong>{}</strong></div>\n", title));
        }
        html.push_str(content.trim());
        html.push_str("\n</div>");
        html
    }
}

/// Raw `\item` splitting, used only when the tree holds no item markers.
fn fallback_list_items(node: &Node) -> Vec<String> {
    let source = node.to_source();
    ITEM_MARKER
        .split(&source)
        .skip(1)
        .map(|item| fallback::coarse_text(&LIST_END.replace(item, "")))
        .filter(|item| !item.is_empty())
        .map(|item| format!("<li>{}</li>", item))
        .collect()
}

/// Display math keeps its source verbatim so the browser renderer sees its own syntax.
fn convert_math_block(node: &Node) -> String {
    let raw: String = node.children().iter().map(|child| child.to_source()).collect();
    format!("\\[{}\\]", math::unprotect(raw.trim()))
}

/// Split a table row on unescaped `&`.
fn split_cells(row: &str) -> Vec<&str> {
    let bytes = row.as_bytes();
    let mut cells = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'&' => {
                cells.push(&row[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    cells.push(&row[start.min(row.len())..]);
    cells
}

/// Column width leftovers such as `0.48` or `\textwidth`.
fn is_width_spec(node: &Node) -> bool {
    match node {
        Node::Text(raw) => {
            let raw = raw.trim();
            !raw.is_empty() && (WIDTH_NUMBER.is_match(raw) || raw.contains("textwidth"))
        }
        Node::Command { name, args } => args.is_empty() && (name == "textwidth" || name == "linewidth"),
        Node::Environment { .. } | Node::Group(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::parser::LatexTreeBuilder;

    fn render(source: &str) -> String {
        let options = ConvertOptions::default();
        let converter = Converter::new(&options, &LatexTreeBuilder);
        converter.render_fragment(source)
    }

    #[test]
    fn test_itemize_items() {
        let html = render("\\begin{itemize}\\item A\\item B\\end{itemize}");
        assert_eq!(html, "<ul>\n<li>A</li>\n<li>B</li>\n</ul>");
    }

    #[test]
    fn test_enumerate_with_formatting_keeps_count() {
        let html = render(
            "\\begin{enumerate}\n\\item \\textbf{one} two\n\\item $x$ and \\emph{y}\n\\item three\n\\end{enumerate}",
        );
        assert!(html.starts_with("<ol>"));
        assert_eq!(html.matches("<li>").count(), 3);
        assert!(html.contains("<li><strong>one</strong> two</li>"));
    }

    #[test]
    fn test_empty_items_are_dropped() {
        let html = render("\\begin{itemize}\\item A\\item \\item B\\end{itemize}");
        assert_eq!(html.matches("<li>").count(), 2);
    }

    #[test]
    fn test_list_preamble_is_rendered() {
        let html = render("\\begin{itemize}Intro\\item A\\end{itemize}");
        assert_eq!(html, "Intro\n<ul>\n<li>A</li>\n</ul>");
    }

    #[test]
    fn test_nested_lists() {
        let html = render(
            "\\begin{itemize}\\item outer\\begin{itemize}\\item inner\\end{itemize}\\end{itemize}",
        );
        assert_eq!(html, "<ul>\n<li>outer<ul>\n<li>inner</li>\n</ul></li>\n</ul>");
    }

    #[test]
    fn test_item_labels() {
        let html = render("\\begin{description}\\item[Term] meaning\\end{description}");
        assert_eq!(html, "<ul>\n<li><strong>Term</strong> meaning</li>\n</ul>");
    }

    #[test]
    fn test_list_without_item_nodes_uses_raw_split() {
        // markers hidden inside a group are invisible to the tree walk
        let html = render("\\begin{itemize}{\\item first \\item second}\\end{itemize}");
        assert_eq!(html.matches("<li>").count(), 2);
        assert!(html.contains("<li>first</li>"));
        assert!(html.contains("<li>second</li>"));
        assert!(!html.contains("first second"));
    }

    #[test]
    fn test_table_headers_and_rules() {
        let html = render(
            "\\begin{tabular}{lc}\n\\toprule\n\\textbf{Model} & \\textbf{Acc} \\\\\n\\midrule\nKNN & 0.9 \\\\\n\\bottomrule\n\\end{tabular}",
        );
        assert_eq!(
            html,
            "<table class=\"beamer-table\">\n<tr><th>Model</th><th>Acc</th></tr>\n<tr><td>KNN</td><td>0.9</td></tr>\n</table>"
        );
    }

    #[test]
    fn test_table_inside_table_environment() {
        let html = render(
            "\\begin{table}\\centering\\begin{tabular}{ll}a & b\\\\ c & \\textit{d}\\end{tabular}\\end{table}",
        );
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("<td><em>d</em></td>"));
    }

    #[test]
    fn test_table_escaped_ampersand_stays_in_cell() {
        let html = render("\\begin{tabular}{ll}R\\&D & x\\end{tabular}");
        assert!(html.contains("<td>R&amp;D</td><td>x</td>"));
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        assert_eq!(render("\\begin{tabular}{l}\\hline\\end{tabular}"), "");
    }

    #[test]
    fn test_columns_filter_width_tokens() {
        let html = render(
            "\\begin{columns}\\begin{column}{0.48\\textwidth}Left\\end{column}\\begin{column}{0.5\\textwidth}Right\\end{column}\\end{columns}",
        );
        assert_eq!(
            html,
            "<div class=\"columns\"><div class=\"column\">Left</div><div class=\"column\">Right</div></div>"
        );
    }

    #[test]
    fn test_width_tokens_in_body_are_filtered() {
        let column = Node::environment(
            "column",
            vec![],
            vec![Node::text("0.48"), Node::command("textwidth", vec![]), Node::text("Body")],
        );
        assert!(is_width_spec(&Node::text(" 0.48 ")));
        assert!(!is_width_spec(&Node::text("Body")));

        let options = ConvertOptions::default();
        let converter = Converter::new(&options, &LatexTreeBuilder);
        assert_eq!(converter.column_contents(&column), "Body");
    }

    #[test]
    fn test_block_with_title() {
        let html = render("\\begin{block}{Key idea}Content here\\end{block}");
        assert_eq!(
            html,
            "<div class=\"block\">\n<div class=\"block-title\"><strong>Key idea</strong></div>\nContent here\n</div>"
        );
    }

    #[test]
    fn test_alertblock_class() {
        let html = render("\\begin{alertblock}{Careful}x\\end{alertblock}");
        assert!(html.starts_with("<div class=\"block alertblock\">"));
    }

    #[test]
    fn test_math_block_is_verbatim() {
        let html = render("\\begin{align*}\n  a &= \\frac{1}{2} \\\\\n  b &= c\n\\end{align*}");
        assert_eq!(html, "\\[a &= \\frac{1}{2} \\\\\n  b &= c\\]");
    }

    #[test]
    fn test_center() {
        assert_eq!(render("\\begin{center}mid\\end{center}"), "<div class=\"center\">mid</div>");
    }

    #[test]
    fn test_list_without_items_renders_nothing() {
        assert_eq!(render("\\begin{itemize}\\end{itemize}"), "");
        assert_eq!(render("\\begin{enumerate}\n\\end{enumerate}"), "");
    }

    #[test]
    fn test_math_block_with_brackets() {
        assert_eq!(
            render("\\begin{equation}p\\in\\left[0, 1\\right)\\end{equation}"),
            "\\[p\\in\\left[0, 1\\right)\\]"
        );
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("a & b\\&c & d"), vec!["a ", " b\\&c ", " d"]);
        assert_eq!(split_cells("only"), vec!["only"]);
    }
}
