// ABOUTME: Math region protection before tree-building and restoration after HTML generation
// ABOUTME: Placeholders carry their math base64-encoded, so no registry is shared between phases

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use log::warn;
use regex::{Captures, Regex};

const INLINE_TAG: &str = "INLINEMATH";
const DISPLAY_TAG: &str = "DISPLAYMATH";

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"@@(INLINEMATH|DISPLAYMATH):([A-Za-z0-9+/=]*)@@").expect("invalid regex expression");
    static ref LEGACY_MARKER: Regex =
        Regex::new(r"(INLINEMATH|DISPLAYMATH)\{([^{}]+)\}").expect("invalid regex expression");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathKind {
    Inline,
    Display,
}

impl MathKind {
    fn tag(self) -> &'static str {
        match self {
            MathKind::Inline => INLINE_TAG,
            MathKind::Display => DISPLAY_TAG,
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            INLINE_TAG => Some(MathKind::Inline),
            DISPLAY_TAG => Some(MathKind::Display),
            _ => None,
        }
    }

    /// Wrap math source in the delimiters the browser renderer expects.
    pub fn delimit(self, raw: &str) -> String {
        match self {
            MathKind::Inline => format!("\\({}\\)", raw),
            MathKind::Display => format!("\\[{}\\]", raw),
        }
    }
}

/// One protected math region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    pub placeholder: String,
    pub raw: String,
    pub kind: MathKind,
}

impl MathSpan {
    pub fn new(kind: MathKind, raw: &str) -> Self {
        let placeholder = format!("@@{}:{}@@", kind.tag(), STANDARD.encode(raw.as_bytes()));
        Self {
            placeholder,
            raw: raw.to_string(),
            kind,
        }
    }

    /// Recover the span a placeholder token stands for.
    pub fn decode(token: &str) -> Option<Self> {
        let caps = PLACEHOLDER.captures(token)?;
        if caps.get(0)?.as_str() != token {
            return None;
        }
        let kind = MathKind::from_tag(caps.get(1)?.as_str())?;
        let bytes = STANDARD.decode(caps.get(2)?.as_str()).ok()?;
        let raw = String::from_utf8(bytes).ok()?;
        Some(Self {
            placeholder: token.to_string(),
            raw,
            kind,
        })
    }
}

/// Source text with every math region swapped for a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    pub text: String,
    pub spans: Vec<MathSpan>,
}

/// Replace `$$..$$`, `$..$`, `\[..\]` and `\(..\)` regions with placeholder tokens.
///
/// Escaped characters (`\$`, `\\`, ...) are skipped as a pair. Display
/// `$$` is tried before single `$`. An unterminated region is left as
/// literal text.
pub fn protect(source: &str) -> Protected {
    let bytes = source.as_bytes();
    let mut text = String::with_capacity(source.len());
    let mut spans = Vec::new();
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        // (kind, content start, content end, resume position)
        let found = match bytes[i] {
            b'\\' => match bytes.get(i + 1) {
                Some(b'(') => {
                    find_closing(bytes, i + 2, b"\\)").map(|end| (MathKind::Inline, i + 2, end, end + 2))
                }
                Some(b'[') => {
                    find_closing(bytes, i + 2, b"\\]").map(|end| (MathKind::Display, i + 2, end, end + 2))
                }
                _ => {
                    i += 2;
                    continue;
                }
            },
            b'$' if bytes.get(i + 1) == Some(&b'$') => {
                find_closing(bytes, i + 2, b"$$").map(|end| (MathKind::Display, i + 2, end, end + 2))
            }
            b'$' => find_inline_dollar(bytes, i + 1).map(|end| (MathKind::Inline, i + 1, end, end + 1)),
            _ => None,
        };

        match found {
            Some((kind, start, end, resume)) => {
                text.push_str(&source[last..i]);
                let span = MathSpan::new(kind, &source[start..end]);
                text.push_str(&span.placeholder);
                spans.push(span);
                i = resume;
                last = resume;
            }
            None if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'$') => i += 2,
            None => i += 1,
        }
    }

    text.push_str(&source[last..]);
    Protected { text, spans }
}

/// First unescaped occurrence of `delim` at or after `from`; empty regions do not count.
fn find_closing(bytes: &[u8], from: usize, delim: &[u8]) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j..].starts_with(delim) {
            return (j > from).then_some(j);
        }
        j += if bytes[j] == b'\\' { 2 } else { 1 };
    }
    None
}

/// Closing `$` of an inline region; it must not be part of a `$$`.
fn find_inline_dollar(bytes: &[u8], from: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'$' => {
                if j == from || bytes.get(j + 1) == Some(&b'$') {
                    return None;
                }
                return Some(j);
            }
            _ => j += 1,
        }
    }
    None
}

/// Swap placeholder tokens in generated HTML back to delimited math.
///
/// A token that fails to decode is left in place verbatim.
pub fn restore(html: &str) -> String {
    let restored = PLACEHOLDER.replace_all(html, |caps: &Captures| {
        let token = &caps[0];
        match MathSpan::decode(token) {
            Some(span) => span.kind.delimit(&span.raw),
            None => {
                warn!("Leaving undecodable math placeholder in place: {}", token);
                token.to_string()
            }
        }
    });

    LEGACY_MARKER
        .replace_all(&restored, |caps: &Captures| {
            let kind = MathKind::from_tag(&caps[1]).unwrap_or(MathKind::Inline);
            kind.delimit(&caps[2])
        })
        .into_owned()
}

/// Put `$`-delimited math back into source text that is emitted verbatim
/// inside another math region.
pub fn unprotect(text: &str) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match MathSpan::decode(&caps[0]) {
            Some(MathSpan {
                raw,
                kind: MathKind::Inline,
                ..
            }) => format!("${}$", raw),
            Some(MathSpan {
                raw,
                kind: MathKind::Display,
                ..
            }) => format!("$${}$$", raw),
            None => caps[0].to_string(),
        })
        .into_owned()
}
