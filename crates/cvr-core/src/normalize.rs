use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Evidence snippets are capped at this many chars.
pub const SNIPPET_MAX_CHARS: usize = 220;

// Trailing whitespace before the break is tolerated so the pass stays
// idempotent once line-level trimming has run.
static HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{L})-[ \t]*\n(\p{L})").unwrap());

static INLINE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Raw extracted PDF text → canonical text.
///
/// Contract (applied in order):
/// 1. line endings unified to `\n`
/// 2. U+00A0 → space, U+00AD removed
/// 3. NUL → ` - ` (NUL frequently replaces en-dashes in PDF date ranges)
/// 4. remaining ASCII control chars except `\n`/`\t` removed
/// 5. line-break hyphenation joined (`letter-\nletter`)
/// 6. space/tab runs collapsed per line, lines right-trimmed
/// 7. at most two consecutive blank lines
/// 8. outer whitespace trimmed
///
/// `normalize(normalize(x)) == normalize(x)` for all inputs.
pub fn normalize(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                text.push('\n');
            }
            '\u{00A0}' => text.push(' '),
            '\u{00AD}' => {}
            '\0' => text.push_str(" - "),
            c if c.is_ascii_control() && c != '\n' && c != '\t' => {}
            c => text.push(c),
        }
    }

    // Chains like "mo-\nder-\nnise" need repeated joining.
    loop {
        match HYPHEN_BREAK.replace_all(&text, "${1}${2}") {
            Cow::Borrowed(_) => break,
            Cow::Owned(joined) => text = joined,
        }
    }

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0usize;
    for line in text.split('\n') {
        let collapsed = INLINE_WS.replace_all(line, " ");
        let collapsed = collapsed.trim_end();
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                lines.push(String::new());
            }
        } else {
            blank_run = 0;
            lines.push(collapsed.to_string());
        }
    }

    lines.join("\n").trim().to_string()
}

/// Case/diacritic fold for matching: NFKD, combining marks stripped,
/// lowercased, curly apostrophes unified. Newlines are preserved, so a
/// folded text has the same line structure as its canonical source.
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            '\u{2019}' | '\u{02BC}' => '\'',
            c => c,
        })
        .collect()
}

/// The trimmed line surrounding `index` (a byte offset into canonical
/// text), middle-truncated to `SNIPPET_MAX_CHARS`. An empty line falls
/// back to a character window centered on the index.
pub fn snippet_at(text: &str, index: usize) -> String {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }

    let line_start = text[..index].rfind('\n').map(|p| p + 1).unwrap_or(0);
    let line_end = text[index..]
        .find('\n')
        .map(|p| index + p)
        .unwrap_or(text.len());

    let line = text[line_start..line_end].trim();
    if !line.is_empty() {
        return truncate_middle(line, SNIPPET_MAX_CHARS);
    }

    let window = char_window(text, index, SNIPPET_MAX_CHARS);
    truncate_middle(window.trim(), SNIPPET_MAX_CHARS)
}

/// Middle-truncates to at most `max` chars, marking the cut with an
/// ellipsis. `max` must be ≥ 3.
pub fn truncate_middle(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }

    let head_len = max / 2;
    let tail_len = max - head_len - 1;
    let head: String = text.chars().take(head_len).collect();
    let tail: String = text
        .chars()
        .skip(count - tail_len)
        .collect();
    format!("{head}…{tail}")
}

fn char_window(text: &str, index: usize, width: usize) -> &str {
    let half = width / 2;

    let mut start = index;
    let mut taken = 0;
    while start > 0 && taken < half {
        start -= 1;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        taken += 1;
    }

    let mut end = index;
    let mut taken = 0;
    while end < text.len() && taken < width - half {
        end += 1;
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        taken += 1;
    }

    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_line_endings_and_nbsp() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(normalize("a\u{00A0}b"), "a b");
        assert_eq!(normalize("soft\u{00AD}ware"), "software");
    }

    #[test]
    fn nul_becomes_dash_separator() {
        // PDF extractors replace en-dashes in date ranges with NUL.
        assert_eq!(normalize("2019\u{0}2024"), "2019 - 2024");
    }

    #[test]
    fn strips_control_chars_but_keeps_tabs() {
        assert_eq!(normalize("a\u{0008}b\tc"), "ab c");
    }

    #[test]
    fn joins_hyphenated_line_breaks() {
        assert_eq!(normalize("develop-\nment"), "development");
        assert_eq!(normalize("mo-\nder-\nnise"), "modernise");
        // trailing spaces before the break still join
        assert_eq!(normalize("develop- \nment"), "development");
        // digits never join
        assert_eq!(normalize("2019-\n2024"), "2019-\n2024");
    }

    #[test]
    fn collapses_whitespace_and_blank_runs() {
        assert_eq!(normalize("a   b\t\tc   "), "a b c");
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "Sr  Engineer\u{00A0}— 2019\u{0}present\r\nLed   a team",
            "develop- \nment\n\n\n\n\nof the plat-\nform",
            "  \t spaced \t \n\nlines \u{0007}here  ",
        ];
        for raw in samples {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn fold_strips_diacritics_and_case() {
        assert_eq!(fold("Présent"), "present");
        assert_eq!(fold("Aujourd\u{2019}hui"), "aujourd'hui");
        assert_eq!(fold("FÉVRIER"), "fevrier");
        assert_eq!(fold("a\nb").matches('\n').count(), 1);
    }

    #[test]
    fn snippet_returns_trimmed_surrounding_line() {
        let text = "first line\n  Sr Engineer at Acme  \nlast line";
        let idx = text.find("Acme").unwrap();
        assert_eq!(snippet_at(text, idx), "Sr Engineer at Acme");
    }

    #[test]
    fn snippet_truncates_long_lines_in_the_middle() {
        let long = "x".repeat(500);
        let snip = snippet_at(&long, 250);
        assert_eq!(snip.chars().count(), SNIPPET_MAX_CHARS);
        assert!(snip.contains('…'));
    }

    #[test]
    fn snippet_windows_around_index_on_empty_line() {
        let text = format!("{}\n\n{}", "a".repeat(300), "b".repeat(300));
        let idx = 301; // on the blank line
        let snip = snippet_at(&text, idx);
        assert!(!snip.is_empty());
        assert!(snip.chars().count() <= SNIPPET_MAX_CHARS);
    }
}
