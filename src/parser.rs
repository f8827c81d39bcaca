// ABOUTME: Tree-builder turning (math-protected) LaTeX source into a Node tree
// ABOUTME: Exposed behind the TreeBuilder trait so another parser can be plugged in

use crate::convert;
use crate::errors::{BeamerError, Result};
use crate::node::{Arg, Node};
use log::debug;

/// Anything that can turn LaTeX source into a document tree.
pub trait TreeBuilder: Sync {
    fn build(&self, source: &str) -> Result<Vec<Node>>;
}

/// Small recursive-descent LaTeX reader covering the subset used by lecture decks.
///
/// Control words become commands (with directly attached `[..]`/`{..}`
/// arguments), `\begin`/`\end` pairs become environments and control
/// symbols such as `\\` or `\&` are kept verbatim inside text.
/// Unescaped `%` starts a comment that runs to the end of the line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatexTreeBuilder;

impl TreeBuilder for LatexTreeBuilder {
    fn build(&self, source: &str) -> Result<Vec<Node>> {
        let mut parser = Parser::new(source);
        let nodes = parser.parse_nodes(Until::Eof)?;
        debug!("Built tree with {} top-level nodes", nodes.len());
        Ok(nodes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Until<'a> {
    Eof,
    Brace,
    Bracket,
    End(&'a str),
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn parse_nodes(&mut self, until: Until<'a>) -> Result<Vec<Node>> {
        let start = self.pos;
        let mut nodes = Vec::new();
        let mut text = String::new();

        loop {
            let Some(c) = self.peek() else {
                return match until {
                    Until::Eof => {
                        flush_text(&mut text, &mut nodes);
                        Ok(nodes)
                    }
                    Until::Brace => Err(BeamerError::parse("unterminated `{` group", start)),
                    Until::Bracket => Err(BeamerError::parse("unterminated `[` argument", start)),
                    Until::End(name) => Err(BeamerError::parse(
                        format!("environment `{}` is never closed", name),
                        start,
                    )),
                };
            };

            match c {
                '}' => {
                    if until == Until::Brace {
                        self.bump();
                        flush_text(&mut text, &mut nodes);
                        return Ok(nodes);
                    }
                    return Err(BeamerError::parse("unexpected `}`", self.pos));
                }
                ']' if until == Until::Bracket => {
                    self.bump();
                    flush_text(&mut text, &mut nodes);
                    return Ok(nodes);
                }
                '{' => {
                    self.bump();
                    flush_text(&mut text, &mut nodes);
                    let children = self.parse_nodes(Until::Brace)?;
                    nodes.push(Node::Group(children));
                }
                '%' => self.skip_comment(),
                '\\' => {
                    let at = self.pos;
                    self.bump();
                    match self.peek() {
                        Some(next) if next.is_ascii_alphabetic() => {
                            let name = self.read_control_word();
                            match name {
                                "begin" => {
                                    flush_text(&mut text, &mut nodes);
                                    nodes.push(self.parse_environment(at)?);
                                }
                                "end" => {
                                    let closing = self.read_env_name(at)?;
                                    if until == Until::End(closing) {
                                        flush_text(&mut text, &mut nodes);
                                        return Ok(nodes);
                                    }
                                    return Err(BeamerError::parse(
                                        format!("unexpected `\\end{{{}}}`", closing),
                                        at,
                                    ));
                                }
                                _ => {
                                    flush_text(&mut text, &mut nodes);
                                    let args = self.parse_args()?;
                                    nodes.push(Node::command(name, args));
                                }
                            }
                        }
                        Some(symbol) => {
                            self.bump();
                            text.push('\\');
                            text.push(symbol);
                        }
                        None => text.push('\\'),
                    }
                }
                _ => {
                    self.bump();
                    text.push(c);
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        match self.src[self.pos..].find('\n') {
            Some(offset) => self.pos += offset,
            None => self.pos = self.src.len(),
        }
    }

    /// Letters, plus one trailing `*` for starred forms.
    fn read_control_word(&mut self) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.bump();
        }
        if self.peek() == Some('*') {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn read_env_name(&mut self, at: usize) -> Result<&'a str> {
        if self.peek() != Some('{') {
            return Err(BeamerError::parse("expected `{` after \\begin/\\end", at));
        }
        self.bump();
        let rest = &self.src[self.pos..];
        let close = rest
            .find('}')
            .ok_or_else(|| BeamerError::parse("unterminated environment name", at))?;
        let name = rest[..close].trim();
        self.pos += close + 1;
        Ok(name)
    }

    fn parse_environment(&mut self, at: usize) -> Result<Node> {
        let name = self.read_env_name(at)?;
        if convert::is_math_block(name) {
            let body = self.read_verbatim_body(name, at)?;
            let children = if body.is_empty() { Vec::new() } else { vec![Node::text(body)] };
            return Ok(Node::environment(name, Vec::new(), children));
        }
        let args = self.parse_args()?;
        let children = self.parse_nodes(Until::End(name))?;
        Ok(Node::environment(name, args, children))
    }

    /// Raw text up to `\end{name}`, which is consumed.
    fn read_verbatim_body(&mut self, name: &str, at: usize) -> Result<&'a str> {
        let closing = format!("\\end{{{}}}", name);
        let rest = &self.src[self.pos..];
        let offset = rest
            .find(&closing)
            .ok_or_else(|| BeamerError::parse(format!("environment `{}` is never closed", name), at))?;
        self.pos += offset + closing.len();
        Ok(&rest[..offset])
    }

    /// Arguments must follow the command name directly. Once a `{..}`
    /// argument has been read, a following `[` is ordinary text, and so is
    /// a `[` that never closes.
    fn parse_args(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some('[') if !args.iter().any(|arg| matches!(arg, Arg::Required(_))) => {
                    let rewind = self.pos;
                    self.bump();
                    match self.parse_nodes(Until::Bracket) {
                        Ok(nodes) => args.push(Arg::Optional(nodes)),
                        Err(err) => {
                            debug!("Treating `[` at {} as text: {}", rewind, err);
                            self.pos = rewind;
                            return Ok(args);
                        }
                    }
                }
                Some('{') => {
                    self.bump();
                    args.push(Arg::Required(self.parse_nodes(Until::Brace)?));
                }
                _ => return Ok(args),
            }
        }
    }
}

/// Drop `%` comments (escaped `\%` survives) while keeping line structure.
pub fn strip_comments(source: &str) -> String {
    source
        .split('\n')
        .map(|line| {
            let bytes = line.as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    b'%' => return &line[..i],
                    _ => i += 1,
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}
