// ABOUTME: Text normalizer applied to every leaf text run before it reaches the HTML output
// ABOUTME: Handles HTML escaping, LaTeX escapes, quotes, dashes and spacing commands

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LINE_BREAK: Regex = Regex::new(r"\\\\(?:\[[^\]]*\])?").expect("invalid regex expression");
    static ref SPACING_WITH_ARG: Regex =
        Regex::new(r"\\(?:vspace|hspace)\*?\{[^}]*\}").expect("invalid regex expression");
    static ref SPACING_BARE: Regex = Regex::new(
        r"\\(?:vspace|hspace|vfill|hfill|centering|pause|noindent|smallskip|medskip|bigskip)\b"
    )
    .expect("invalid regex expression");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("invalid regex expression");
}

/// Literal LaTeX escapes and their HTML-side replacement, applied in order.
const ESCAPES: &[(&str, &str)] = &[
    ("\\&amp;", "&amp;"),
    ("\\$", "$"),
    ("``", "\""),
    ("''", "\""),
    ("---", "-"),
    ("--", "-"),
    ("~", " "),
    ("\\,", " "),
    ("\\;", " "),
    ("\\:", " "),
    ("\\ ", " "),
    ("\\!", ""),
    ("\\%", "%"),
    ("\\#", "#"),
    ("\\_", "_"),
    ("\\{", "{"),
    ("\\}", "}"),
];

/// Normalize a raw text run. Whitespace runs collapse to a single space;
/// leading and trailing whitespace is kept so adjacent inline output stays separated.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result = escape_html(text);
    result = LINE_BREAK.replace_all(&result, "<br>").into_owned();
    for (from, to) in ESCAPES {
        if result.contains(from) {
            result = result.replace(from, to);
        }
    }
    result = SPACING_WITH_ARG.replace_all(&result, "").into_owned();
    result = SPACING_BARE.replace_all(&result, "").into_owned();
    WHITESPACE.replace_all(&result, " ").into_owned()
}

/// Normalize and trim, for titles and other standalone strings.
pub fn normalize_trimmed(text: &str) -> String {
    normalize(text).trim().to_string()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_and_dashes() {
        assert_eq!(normalize("``quoted'' 1--2 a---b"), "\"quoted\" 1-2 a-b");
    }

    #[test]
    fn test_latex_escapes() {
        assert_eq!(normalize("50\\% of \\$10 \\& more \\#1"), "50% of $10 &amp; more #1");
    }

    #[test]
    fn test_line_breaks_with_spacing() {
        assert_eq!(normalize("one\\\\two\\\\[2mm]three"), "one<br>two<br>three");
    }

    #[test]
    fn test_spacing_commands_are_dropped() {
        assert_eq!(normalize("a\\,b~c\\!d"), "a b cd");
        assert_eq!(normalize("x \\vspace{2mm} y \\pause z"), "x y z");
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(normalize("a < b > c"), "a &lt; b &gt; c");
        assert_eq!(escape_attribute("a\"b"), "a&quot;b");
    }

    #[test]
    fn test_whitespace_collapses_but_is_not_trimmed() {
        assert_eq!(normalize("  lots \n\n of   space "), " lots of space ");
        assert_eq!(normalize_trimmed("  padded  "), "padded");
    }

    #[test]
    fn test_math_placeholders_pass_through() {
        let token = "@@INLINEMATH:XHNpZ21hXjI=@@";
        assert_eq!(normalize(token), token);
    }
}
