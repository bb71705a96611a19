//! Normalisation: join block contributions and collapse redundant whitespace.
//!
//! Passes, in order:
//! 1. join contributions with `\n`
//! 2. collapse a newline, any whitespace, and another newline into one `\n`
//! 3. collapse runs of spaces and tabs into one space
//! 4. trim both ends
//!
//! Applying [`normalize_text`] to its own output returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Join block contributions in order and normalise the result.
pub fn join_contributions<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    normalize_text(&joined)
}

/// Apply the whitespace passes to already-joined text.
pub fn normalize_text(input: &str) -> String {
    let s = collapse_blank_lines(input);
    let s = collapse_horizontal_whitespace(&s);
    s.trim().to_string()
}

// ── Pass 2: blank lines ──────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n").into_owned()
}

// ── Pass 3: spaces and tabs ──────────────────────────────────────────────

static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_horizontal_whitespace(input: &str) -> String {
    RE_HORIZONTAL_WS.replace_all(input, " ").into_owned()
}
