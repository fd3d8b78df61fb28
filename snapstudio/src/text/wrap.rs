//! Greedy word wrap with binary-search hard breaking.

use crate::cache::MeasurementCache;
use crate::text::FontSpec;

/// Wrap `text` into lines no wider than `max_width`.
///
/// Paragraph breaks (`\n`) are honored first; within a paragraph, whitespace
/// tokens are packed greedily, joined by single spaces, while the measured
/// trial line fits. A token that alone measures wider than `max_width` is
/// hard-broken: a binary search over char-boundary prefixes finds the
/// longest prefix that fits, that prefix becomes its own line, and the
/// remainder is re-examined. The search never yields a prefix shorter than
/// one character, so progress is guaranteed even when `max_width` is
/// narrower than a single glyph; in that case the glyph overflows and is
/// emitted anyway.
pub fn wrap(text: &str, font: &FontSpec, max_width: f32, measure: &MeasurementCache) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        wrap_paragraph(paragraph, font, max_width, measure, &mut lines);
    }
    lines
}

fn wrap_paragraph(
    paragraph: &str,
    font: &FontSpec,
    max_width: f32,
    measure: &MeasurementCache,
    lines: &mut Vec<String>,
) {
    let mut current = String::new();
    for token in paragraph.split_whitespace() {
        let trial = if current.is_empty() {
            token.to_string()
        } else {
            format!("{current} {token}")
        };
        if measure.measure(&trial, font).width <= max_width {
            current = trial;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        // The token starts a fresh line; hard-break it while it cannot fit
        // on a line of its own.
        let mut rest = token;
        while !rest.is_empty() && measure.measure(rest, font).width > max_width {
            let split = fitting_prefix_len(rest, font, max_width, measure);
            let (head, tail) = rest.split_at(split);
            lines.push(head.to_string());
            rest = tail;
        }
        current = rest.to_string();
    }
    if !current.is_empty() {
        lines.push(current);
    }
}

/// Byte length of the longest char-boundary prefix of `token` that measures
/// within `max_width`, never shorter than one character.
fn fitting_prefix_len(
    token: &str,
    font: &FontSpec,
    max_width: f32,
    measure: &MeasurementCache,
) -> usize {
    let boundaries: Vec<usize> = token
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .collect();
    let mut lo = 1usize;
    let mut hi = boundaries.len();
    let mut fit = 1usize;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let width = measure.measure(&token[..boundaries[mid - 1]], font).width;
        if width <= max_width {
            fit = mid;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    boundaries[fit - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::PipelineMetrics;
    use crate::text::FixedAdvanceEngine;
    use proptest::prelude::*;
    use std::sync::Arc;

    // FixedAdvanceEngine: each char is 0.6 * size wide. At size 10 a char
    // is 6 px, so max_width 60 fits exactly 10 chars.
    fn cache() -> MeasurementCache {
        MeasurementCache::new(
            Arc::new(FixedAdvanceEngine),
            4096,
            Arc::new(PipelineMetrics::new()),
        )
    }

    fn font() -> FontSpec {
        FontSpec::new("test", 10.0)
    }

    #[test]
    fn test_short_text_single_line() {
        let lines = wrap("hello world", &font(), 200.0, &cache());
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn test_greedy_fill_breaks_between_words() {
        // 10-char budget: "alpha beta" is 10 chars and fits; adding " gamma"
        // does not.
        let lines = wrap("alpha beta gamma", &font(), 60.0, &cache());
        assert_eq!(lines, vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn test_paragraph_breaks_preserved() {
        let lines = wrap("12 Main St\nSpringfield 01101, USA", &font(), 200.0, &cache());
        assert_eq!(lines, vec!["12 Main St", "Springfield 01101, USA"]);
    }

    #[test]
    fn test_blank_paragraphs_skipped() {
        let lines = wrap("top\n\n  \nbottom", &font(), 200.0, &cache());
        assert_eq!(lines, vec!["top", "bottom"]);
    }

    #[test]
    fn test_oversize_token_hard_broken() {
        // 20 chars at 6 px each against a 10-char budget.
        let lines = wrap("aaaaaaaaaaaaaaaaaaaa", &font(), 60.0, &cache());
        assert_eq!(lines, vec!["aaaaaaaaaa", "aaaaaaaaaa"]);
    }

    #[test]
    fn test_oversize_token_remainder_joins_next_words() {
        let lines = wrap("aaaaaaaaaaaa bb", &font(), 60.0, &cache());
        // 12 a's: 10 hard-broken, remainder "aa" starts the next line and
        // accepts "bb".
        assert_eq!(lines, vec!["aaaaaaaaaa", "aa bb"]);
    }

    #[test]
    fn test_oversize_first_token_still_hard_broken() {
        // The token arrives with an empty current line and must not be
        // accepted whole.
        let lines = wrap("cccccccccccc d", &font(), 60.0, &cache());
        assert_eq!(lines, vec!["cccccccccc", "cc d"]);
    }

    #[test]
    fn test_narrower_than_one_char_still_progresses() {
        let lines = wrap("abc", &font(), 1.0, &cache());
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_multibyte_chars_split_on_boundaries() {
        let lines = wrap("ééééé", &font(), 18.0, &cache());
        assert_eq!(lines, vec!["ééé", "éé"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(wrap("", &font(), 60.0, &cache()).is_empty());
        assert!(wrap("   \n  ", &font(), 60.0, &cache()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_no_line_exceeds_budget(
            text in "[ a-zA-Z0-9]{0,120}",
            budget_chars in 1u32..20,
        ) {
            let cache = cache();
            let font = font();
            let max_width = budget_chars as f32 * 6.0;
            let lines = wrap(&text, &font, max_width, &cache);
            for line in &lines {
                let width = cache.measure(line, &font).width;
                // A single char may legitimately overflow a sub-char budget.
                prop_assert!(
                    width <= max_width || line.chars().count() == 1,
                    "line {line:?} measures {width} against budget {max_width}"
                );
            }
        }

        #[test]
        fn prop_wrap_preserves_content(
            words in proptest::collection::vec("[a-z]{1,12}", 0..12),
        ) {
            let cache = cache();
            let font = font();
            let text = words.join(" ");
            let lines = wrap(&text, &font, 60.0, &cache);
            let rejoined: String = lines.join("").replace(' ', "");
            let original: String = text.replace(' ', "");
            prop_assert_eq!(rejoined, original);
        }
    }
}
