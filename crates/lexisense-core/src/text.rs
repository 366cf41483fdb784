/// Lowercased runs of word characters (alphanumerics and `_`).
///
/// No stemming and no stopword removal: `"Revenue"` and `"revenues"` are
/// distinct terms.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Whitespace-delimited word count, the unit every chunk budget is measured in.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((clip_idx, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let mut out = text[..clip_idx].to_string();
    out.push_str("...");
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits_on_non_word_chars() {
        assert_eq!(
            tokenize("Revenue increased by 20%, year-over-year!"),
            vec!["revenue", "increased", "by", "20", "year", "over", "year"]
        );
    }

    #[test]
    fn tokenize_keeps_underscores_and_unicode_letters() {
        assert_eq!(tokenize("snake_case Ünïcode"), vec!["snake_case", "ünïcode"]);
    }

    #[test]
    fn tokenize_returns_empty_for_punctuation_only() {
        assert!(tokenize(" ... !!! ").is_empty());
    }

    #[test]
    fn word_count_uses_whitespace_runs() {
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn truncate_text_preserves_utf8_char_boundaries() {
        let input = "\u{C548}\u{B155}\u{D558}\u{C138}\u{C694}-hello";
        let clipped = truncate_text(input, 5);
        let expected = format!("{}...", "\u{C548}\u{B155}\u{D558}\u{C138}\u{C694}");
        assert_eq!(clipped, expected);
    }

    #[test]
    fn truncate_text_returns_original_when_input_fits_limit() {
        assert_eq!(truncate_text("hello", 5), "hello");
    }
}
