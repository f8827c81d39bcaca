// ABOUTME: Document tree model produced by the tree-builder and consumed by the converter
// ABOUTME: Nodes are text, commands, environments or bare brace groups, with raw-source rendering

use std::fmt::Write;

/// An argument attached to a command or environment, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// `[...]`
    Optional(Vec<Node>),
    /// `{...}`
    Required(Vec<Node>),
}

impl Arg {
    pub fn nodes(&self) -> &[Node] {
        match self {
            Arg::Optional(nodes) | Arg::Required(nodes) => nodes,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Arg::Required(_))
    }

    /// Source text between the delimiters.
    pub fn inner_source(&self) -> String {
        nodes_to_source(self.nodes())
    }

    fn write_source(&self, out: &mut String) {
        let (open, close) = match self {
            Arg::Optional(_) => ('[', ']'),
            Arg::Required(_) => ('{', '}'),
        };
        out.push(open);
        for node in self.nodes() {
            node.write_source(out);
        }
        out.push(close);
    }
}

/// A node of the parsed document tree.
///
/// A command's payload lives in its arguments; `children()` exposes the
/// required arguments' nodes so that generic traversal treats commands and
/// environments alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Command {
        name: String,
        args: Vec<Arg>,
    },
    Environment {
        name: String,
        args: Vec<Arg>,
        children: Vec<Node>,
    },
    /// A brace group not attached to any command, e.g. `{\small x}`.
    Group(Vec<Node>),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn command(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Node::Command {
            name: name.into(),
            args,
        }
    }

    pub fn environment(name: impl Into<String>, args: Vec<Arg>, children: Vec<Node>) -> Self {
        Node::Environment {
            name: name.into(),
            args,
            children,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Command { name, .. } | Node::Environment { name, .. } => Some(name),
            Node::Text(_) | Node::Group(_) => None,
        }
    }

    pub fn args(&self) -> &[Arg] {
        match self {
            Node::Command { args, .. } | Node::Environment { args, .. } => args,
            Node::Text(_) | Node::Group(_) => &[],
        }
    }

    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Text(_) => Vec::new(),
            Node::Command { args, .. } => args
                .iter()
                .filter(|arg| arg.is_required())
                .flat_map(|arg| arg.nodes())
                .collect(),
            Node::Environment { children, .. } | Node::Group(children) => children.iter().collect(),
        }
    }

    pub fn is_command(&self, wanted: &str) -> bool {
        matches!(self, Node::Command { name, .. } if name == wanted)
    }

    pub fn is_environment(&self, wanted: &str) -> bool {
        matches!(self, Node::Environment { name, .. } if name == wanted)
    }

    /// The `index`-th brace argument, skipping bracketed ones.
    pub fn required_arg(&self, index: usize) -> Option<&Arg> {
        self.args().iter().filter(|arg| arg.is_required()).nth(index)
    }

    pub fn optional_arg(&self, index: usize) -> Option<&Arg> {
        self.args().iter().filter(|arg| !arg.is_required()).nth(index)
    }

    /// Re-serialise the subtree as LaTeX source.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Command { name, args } => {
                out.push('\\');
                out.push_str(name);
                for arg in args {
                    arg.write_source(out);
                }
            }
            Node::Environment {
                name,
                args,
                children,
            } => {
                let _ = write!(out, "\\begin{{{}}}", name);
                for arg in args {
                    arg.write_source(out);
                }
                for child in children {
                    child.write_source(out);
                }
                let _ = write!(out, "\\end{{{}}}", name);
            }
            Node::Group(children) => {
                out.push('{');
                for child in children {
                    child.write_source(out);
                }
                out.push('}');
            }
        }
    }

    /// Every node directly below this one, arguments included.
    fn descendants_and_args(&self) -> Vec<&Node> {
        let mut nested: Vec<&Node> = self.args().iter().flat_map(|arg| arg.nodes()).collect();
        match self {
            Node::Environment { children, .. } | Node::Group(children) => nested.extend(children),
            Node::Text(_) | Node::Command { .. } => {}
        }
        nested
    }

    /// Depth-first search for the first command called `name`.
    pub fn find_command(&self, name: &str) -> Option<&Node> {
        if self.is_command(name) {
            return Some(self);
        }
        self.descendants_and_args()
            .into_iter()
            .find_map(|child| child.find_command(name))
    }

    /// All environments called `name`, without descending into a match.
    pub fn find_environments(&self, name: &str) -> Vec<&Node> {
        let mut found = Vec::new();
        self.collect_environments(name, &mut found);
        found
    }

    fn collect_environments<'a>(&'a self, name: &str, found: &mut Vec<&'a Node>) {
        if self.is_environment(name) {
            found.push(self);
            return;
        }
        for child in self.descendants_and_args() {
            child.collect_environments(name, found);
        }
    }
}

pub fn nodes_to_source(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_source(&mut out);
    }
    out
}

/// Depth-first search over a node list.
pub fn find_command<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Node> {
    nodes.iter().find_map(|node| node.find_command(name))
}

pub fn find_environments<'a>(nodes: &'a [Node], name: &str) -> Vec<&'a Node> {
    nodes
        .iter()
        .flat_map(|node| node.find_environments(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(text: &str) -> Node {
        Node::command("textbf", vec![Arg::Required(vec![Node::text(text)])])
    }

    #[test]
    fn test_to_source_round_trips_structure() {
        let frame = Node::environment(
            "frame",
            vec![Arg::Optional(vec![Node::text("t")]), Arg::Required(vec![Node::text("Intro")])],
            vec![Node::text("\n"), bold("A"), Node::Group(vec![Node::text("x")])],
        );

        assert_eq!(
            frame.to_source(),
            "\\begin{frame}[t]{Intro}\n\\textbf{A}{x}\\end{frame}"
        );
    }

    #[test]
    fn test_children_of_command_are_required_args_only() {
        let color = Node::command(
            "textcolor",
            vec![
                Arg::Optional(vec![Node::text("HTML")]),
                Arg::Required(vec![Node::text("FF0000")]),
                Arg::Required(vec![Node::text("Warning")]),
            ],
        );

        let children = color.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1], &Node::text("Warning"));
        assert_eq!(color.required_arg(1).map(Arg::inner_source), Some("Warning".to_string()));
        assert_eq!(color.optional_arg(0).map(Arg::inner_source), Some("HTML".to_string()));
    }

    #[test]
    fn test_find_command_searches_arguments() {
        let block = Node::environment(
            "block",
            vec![Arg::Required(vec![bold("Title")])],
            vec![Node::text("body")],
        );

        assert!(block.find_command("textbf").is_some());
        assert!(block.find_command("textit").is_none());
    }

    #[test]
    fn test_find_environments_does_not_descend_into_match() {
        let inner = Node::environment("column", vec![], vec![Node::text("inner")]);
        let outer = Node::environment("column", vec![], vec![inner]);
        let columns = Node::environment("columns", vec![], vec![outer]);

        assert_eq!(columns.find_environments("column").len(), 1);
    }
}
