// ABOUTME: Color resolver mapping symbolic LaTeX color names to CSS hex codes
// ABOUTME: Lookups are case-insensitive and never fail; unknown names resolve to neutral gray

use std::collections::HashMap;

/// Returned for any name the table does not know.
pub const DEFAULT_COLOR: &str = "#666666";

/// Accent used by `\highlight`.
pub const HIGHLIGHT_COLOR: &str = "#FF7F0E";

/// Course palette from the Beamer theme definitions.
const PALETTE: &[(&str, &str)] = &[
    ("MLPurple", "#3333B2"),
    ("MLBlue", "#0066CC"),
    ("MLOrange", "#FF7F0E"),
    ("MLGreen", "#2CA02C"),
    ("MLRed", "#D62728"),
    ("MLLavender", "#ADADE0"),
    ("gray", "#666666"),
    ("grey", "#666666"),
    ("red", "#D62728"),
    ("blue", "#0066CC"),
    ("green", "#2CA02C"),
    ("orange", "#FF7F0E"),
    ("purple", "#3333B2"),
    ("black", "#000000"),
];

/// Read-only mapping from lowercased color name to hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: HashMap<String, String>,
}

impl Default for ColorTable {
    fn default() -> Self {
        PALETTE
            .iter()
            .fold(Self::empty(), |table, (name, hex)| table.with_color(name, hex))
    }
}

impl ColorTable {
    pub fn empty() -> Self {
        Self {
            colors: HashMap::new(),
        }
    }

    /// Builder-style insertion; names are stored lowercased.
    pub fn with_color(mut self, name: &str, hex: &str) -> Self {
        self.colors.insert(name.to_lowercase(), hex.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.colors.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn resolve(&self, name: &str) -> &str {
        self.get(name).unwrap_or(DEFAULT_COLOR)
    }

    /// Resolve a `\textcolor` specification, honouring an `[HTML]` model argument.
    pub fn resolve_spec(&self, model: Option<&str>, value: &str) -> String {
        match model.map(str::trim) {
            Some(model) if model.eq_ignore_ascii_case("html") && is_hex(value.trim()) => {
                format!("#{}", value.trim().to_uppercase())
            }
            _ => self.resolve(value).to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn is_hex(value: &str) -> bool {
    value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit())
}
