use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Render an ISO 8601 timestamp for display in `tz`.
///
/// Timestamps without an offset are taken as UTC. Anything unparsable is
/// returned as given.
pub fn format_timestamp(iso: &str, tz: Tz) -> String {
    match parse_timestamp(iso) {
        Some(instant) => instant.with_timezone(&tz).format(DISPLAY_FORMAT).to_string(),
        None => iso.to_string(),
    }
}

pub fn parse_timestamp(iso: &str) -> Option<DateTime<Utc>> {
    let iso = iso.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(iso) {
        return Some(instant.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(iso, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Piece of notification content, for rendering bare URLs as links
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSegment {
    Text(String),
    Link(String),
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("valid URL pattern"))
}

/// Split content into plain text and links, preserving every character
pub fn segment_content(text: &str) -> Vec<ContentSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in url_pattern().find_iter(text) {
        let link = trim_link(found.as_str());
        if link.is_empty() {
            continue;
        }
        let end = found.start() + link.len();

        if found.start() > cursor {
            segments.push(ContentSegment::Text(text[cursor..found.start()].to_string()));
        }
        segments.push(ContentSegment::Link(link.to_string()));
        cursor = end;
    }

    if cursor < text.len() {
        segments.push(ContentSegment::Text(text[cursor..].to_string()));
    }
    segments
}

// Sentence punctuation right after a URL belongs to the text. A closing
// parenthesis stays when the URL opened one itself.
fn trim_link(candidate: &str) -> &str {
    let mut link = candidate;
    loop {
        let trimmed =
            link.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'));
        if trimmed.ends_with(')') && trimmed.matches(')').count() > trimmed.matches('(').count() {
            link = &trimmed[..trimmed.len() - 1];
        } else {
            return trimmed;
        }
    }
}

/// Single line preview of at most `max_chars` graphemes
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let graphemes: Vec<&str> = collapsed.graphemes(true).collect();
    if graphemes.len() <= max_chars {
        return collapsed;
    }
    let mut short: String = graphemes[..max_chars.saturating_sub(1)].concat();
    short.truncate(short.trim_end().len());
    short.push('…');
    short
}
