//! Text clean-up before it is spoken

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));

static LINE_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:#{1,6}\s+|[-*+]\s+|>\s*)").expect("valid regex"));

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|__|\*|`").expect("valid regex"));

/// Strip markdown and cap the length for speech
///
/// Code blocks are dropped, links keep their label, emphasis markers go and
/// whitespace is collapsed. Text longer than `max_chars` is cut at the last
/// sentence end that fits.
#[must_use]
pub fn normalize_for_speech(text: &str, max_chars: usize) -> String {
    let text = CODE_BLOCK.replace_all(text, " ");
    let text = LINK.replace_all(&text, "$1");
    let text = LINE_MARKUP.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "");
    truncate_at_sentence(&collapse_whitespace(&text), max_chars)
}

/// Reduce an HTML fragment to plain text
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let spaced = html
        .replace("</p>", "</p> ")
        .replace("</li>", "</li> ")
        .replace("<br>", " ")
        .replace("<br/>", " ")
        .replace("<br />", " ");
    let fragment = Html::parse_fragment(&spaced);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

/// Cut text to at most `max_chars` characters
///
/// Prefers the last sentence end in the allowed prefix; falls back to a
/// word boundary with an ellipsis.
#[must_use]
pub fn truncate_at_sentence(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    let prefix = &text[..cut];

    let sentence_end = prefix
        .char_indices()
        .filter(|(idx, c)| {
            matches!(c, '.' | '!' | '?')
                && prefix[idx + c.len_utf8()..]
                    .chars()
                    .next()
                    .is_none_or(char::is_whitespace)
        })
        .map(|(idx, c)| idx + c.len_utf8())
        .last();

    if let Some(end) = sentence_end.filter(|end| *end >= prefix.len() / 3) {
        return prefix[..end].to_string();
    }

    let word_end = prefix.rfind(char::is_whitespace).unwrap_or(prefix.len());
    format!("{}...", prefix[..word_end].trim_end())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
