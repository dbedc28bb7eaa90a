use contextvocab_lib::cards::{AggregateStatus, ReviewStatus};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";
    pub const RED: &'static str = "\x1b[31m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const YELLOW: &'static str = "\x1b[33m";
    pub const BLUE: &'static str = "\x1b[34m";
    pub const MAGENTA: &'static str = "\x1b[35m";
    pub const GRAY: &'static str = "\x1b[90m";
}

/// Wrap text in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn status_color(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::New => Color::BLUE,
        ReviewStatus::Learning => Color::YELLOW,
        ReviewStatus::Review => Color::MAGENTA,
        ReviewStatus::Graduated => Color::GREEN,
    }
}

pub fn aggregate_color(status: AggregateStatus) -> &'static str {
    match status {
        AggregateStatus::NoUnits => Color::GRAY,
        AggregateStatus::HasNew => Color::BLUE,
        AggregateStatus::Learning => Color::YELLOW,
        AggregateStatus::ReviewMixed => Color::MAGENTA,
        AggregateStatus::Graduated => Color::GREEN,
    }
}

/// Blank out every occurrence of `word` in `sentence` (ASCII case-insensitive)
pub fn cloze(sentence: &str, word: &str) -> String {
    if word.is_empty() {
        return sentence.to_string();
    }

    // ASCII lowercasing keeps byte offsets aligned with the original
    let haystack = sentence.to_ascii_lowercase();
    let needle = word.to_ascii_lowercase();
    let blank = "_".repeat(word.chars().count().max(3));

    let mut out = String::with_capacity(sentence.len());
    let mut last = 0;
    for (start, _) in haystack.match_indices(&needle) {
        out.push_str(&sentence[last..start]);
        out.push_str(&blank);
        last = start + needle.len();
    }
    out.push_str(&sentence[last..]);
    out
}

/// Shorten text to `width` characters, ending in "..." when cut
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
