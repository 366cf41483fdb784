//! Word-budgeted splitting of extracted text into overlapping chunks.
//!
//! Paragraphs are the preferred unit. A paragraph larger than the budget is
//! broken into sentences, which then go through the same buffer. Chunk
//! boundaries never fall inside a unit.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::models::Chunk;
use crate::text::word_count;

const UNIT_SEPARATOR: &str = "\n\n";

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));
static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(Page|Slide) (\d+)\]").expect("page marker pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size_words: usize,
    overlap_words: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from(&ChunkingConfig::default())
    }
}

impl From<&ChunkingConfig> for Chunker {
    fn from(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size_words, config.overlap_words)
    }
}

impl Chunker {
    /// A zero budget is treated as one word so every unit still fits somewhere.
    #[must_use]
    pub fn new(chunk_size_words: usize, overlap_words: usize) -> Self {
        Self {
            chunk_size_words: chunk_size_words.max(1),
            overlap_words,
        }
    }

    #[must_use]
    pub const fn chunk_size_words(&self) -> usize {
        self.chunk_size_words
    }

    #[must_use]
    pub const fn overlap_words(&self) -> usize {
        self.overlap_words
    }

    /// Splits `text` into chunks numbered `0..n` in emission order.
    ///
    /// Blank input yields no chunks. Output depends only on the arguments.
    #[must_use]
    pub fn chunk(&self, text: &str, filename: &str, file_type: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut buffer = UnitBuffer::new(self, filename, file_type);
        for paragraph in split_paragraphs(text) {
            let paragraph_words = word_count(paragraph);
            if paragraph_words > self.chunk_size_words {
                buffer.flush();
                for sentence in split_sentences(paragraph) {
                    buffer.push(sentence);
                }
            } else {
                buffer.push(paragraph);
            }
        }
        let chunks = buffer.finish();

        debug!(
            filename,
            chunks = chunks.len(),
            chunk_size_words = self.chunk_size_words,
            overlap_words = self.overlap_words,
            "chunked document"
        );
        chunks
    }
}

/// Pending units plus the chunks already emitted from them.
struct UnitBuffer<'a> {
    chunk_size_words: usize,
    overlap_words: usize,
    filename: &'a str,
    file_type: &'a str,
    units: Vec<&'a str>,
    words: usize,
    emitted: Vec<Chunk>,
}

impl<'a> UnitBuffer<'a> {
    fn new(chunker: &Chunker, filename: &'a str, file_type: &'a str) -> Self {
        Self {
            chunk_size_words: chunker.chunk_size_words,
            overlap_words: chunker.overlap_words,
            filename,
            file_type,
            units: Vec::new(),
            words: 0,
            emitted: Vec::new(),
        }
    }

    fn push(&mut self, unit: &'a str) {
        let unit_words = word_count(unit);
        if self.words + unit_words > self.chunk_size_words {
            self.flush();
        }
        self.units.push(unit);
        self.words += unit_words;
    }

    /// Emits the pending units and refills with their overlap tail.
    fn flush(&mut self) {
        if self.units.is_empty() {
            return;
        }
        self.emit();
        self.units = overlap_tail(&self.units, self.overlap_words);
        self.words = self.units.iter().map(|unit| word_count(unit)).sum();
    }

    fn emit(&mut self) {
        let content = self.units.join(UNIT_SEPARATOR);
        let page_info = detect_page_marker(&content);
        self.emitted.push(Chunk::new(
            content,
            self.emitted.len(),
            self.filename,
            self.file_type,
            page_info,
        ));
    }

    fn finish(mut self) -> Vec<Chunk> {
        if !self.units.is_empty() {
            self.emit();
        }
        self.emitted
    }
}

fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Splits after `.`, `!` or `?` when whitespace and then an uppercase letter follow.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if idx < start || !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let end = idx + ch.len_utf8();
        let rest = &text[end..];
        let next = rest.trim_start();
        let gap = rest.len() - next.len();
        if gap > 0 && next.chars().next().is_some_and(char::is_uppercase) {
            sentences.push(&text[start..end]);
            start = end + gap;
        }
    }
    sentences.push(&text[start..]);
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Trailing whole units totalling at most `overlap_words`, but never fewer
/// than one unit.
fn overlap_tail<'a>(units: &[&'a str], overlap_words: usize) -> Vec<&'a str> {
    let mut start = units.len();
    let mut words = 0;
    for (idx, unit) in units.iter().enumerate().rev() {
        let unit_words = word_count(unit);
        if words + unit_words > overlap_words && start < units.len() {
            break;
        }
        start = idx;
        words += unit_words;
    }
    units[start..].to_vec()
}

fn detect_page_marker(content: &str) -> Option<String> {
    PAGE_MARKER
        .captures(content)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(prefix: &str, count: usize) -> String {
        (0..count)
            .map(|idx| format!("{prefix}{idx}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn indices(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(Chunk::chunk_index).collect()
    }

    #[test]
    fn blank_input_yields_no_chunks() {
        let chunker = Chunker::new(10, 2);
        assert!(chunker.chunk("", "a.txt", "txt").is_empty());
        assert!(chunker.chunk(" \n\n\t ", "a.txt", "txt").is_empty());
    }

    #[test]
    fn short_input_is_one_trimmed_chunk() {
        let chunks = Chunker::new(50, 10).chunk("  alpha beta gamma.  \n", "a.txt", "txt");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content(), "alpha beta gamma.");
        assert_eq!(chunks[0].chunk_index(), 0);
        assert_eq!(chunks[0].source_filename(), "a.txt");
        assert_eq!(chunks[0].source_file_type(), "txt");
        assert_eq!(chunks[0].page_info(), None);
    }

    #[test]
    fn paragraphs_fill_chunks_and_carry_overlap_tail() {
        let text = [words("a", 4), words("b", 4), words("c", 4)].join("\n\n");
        let chunks = Chunker::new(8, 4).chunk(&text, "a.txt", "txt");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content(), format!("{}\n\n{}", words("a", 4), words("b", 4)));
        assert_eq!(chunks[1].content(), format!("{}\n\n{}", words("b", 4), words("c", 4)));
        assert_eq!(indices(&chunks), vec![0, 1]);
    }

    #[test]
    fn overlap_keeps_one_unit_even_when_it_exceeds_budget() {
        let text = [words("a", 5), words("b", 5), words("c", 5)].join("\n\n");
        let chunks = Chunker::new(10, 2).chunk(&text, "a.txt", "txt");
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].content().starts_with(&words("b", 5)));
    }

    #[test]
    fn zero_overlap_still_keeps_last_unit() {
        let text = [words("a", 3), words("b", 3), words("c", 3)].join("\n\n");
        let chunks = Chunker::new(6, 0).chunk(&text, "a.txt", "txt");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content(), format!("{}\n\n{}", words("b", 3), words("c", 3)));
    }

    #[test]
    fn long_paragraph_is_split_into_sentences_with_overlap() {
        let sentence = |tag: &str| format!("Sentence {tag} has exactly six words.");
        let paragraph = ["one", "two", "three", "four"]
            .iter()
            .map(|tag| sentence(*tag))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = Chunker::new(12, 6).chunk(&paragraph, "a.txt", "txt");
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let previous_last = pair[0].content().rsplit(UNIT_SEPARATOR).next().expect("unit");
            assert!(pair[1].content().starts_with(previous_last));
        }
        assert_eq!(indices(&chunks), (0..chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn long_paragraph_flushes_pending_buffer_first() {
        let short = words("s", 2);
        let long = "First sentence is here. Second sentence is here. Third sentence is here.";
        let text = format!("{short}\n\n{long}");
        let chunks = Chunker::new(10, 0).chunk(&text, "a.txt", "txt");
        assert_eq!(chunks[0].content(), short);
        assert!(chunks[1].content().starts_with(&short));
        assert!(chunks[1].content().contains("First sentence is here."));
    }

    #[test]
    fn overlap_at_or_above_chunk_size_terminates() {
        let text = (0..40).map(|idx| format!("w{idx}")).collect::<Vec<_>>().join("\n\n");
        let chunks = Chunker::new(4, 10).chunk(&text, "a.txt", "txt");
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= 40);
        assert_eq!(indices(&chunks), (0..chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = [words("x", 7), words("y", 9), words("z", 3)].join("\n\n");
        let chunker = Chunker::new(10, 3);
        assert_eq!(
            chunker.chunk(&text, "a.txt", "txt"),
            chunker.chunk(&text, "a.txt", "txt")
        );
    }

    #[test]
    fn page_marker_becomes_page_info() {
        let text = "[Page 3]\nrevenue grew\n\n[Page 4]\ncosts fell";
        let chunks = Chunker::new(100, 0).chunk(text, "r.pdf", "pdf");
        assert_eq!(chunks[0].page_info(), Some("Page 3"));

        let slides = Chunker::new(100, 0).chunk("[Slide 12]\nagenda", "d.pptx", "pptx");
        assert_eq!(slides[0].page_info(), Some("Slide 12"));
    }

    #[test]
    fn split_sentences_requires_uppercase_after_punctuation() {
        assert_eq!(
            split_sentences("Costs fell 2.5 percent. Revenue rose! Why? because."),
            vec!["Costs fell 2.5 percent.", "Revenue rose!", "Why? because."]
        );
        assert_eq!(split_sentences("Übersicht. Ärger folgt."), vec!["Übersicht.", "Ärger folgt."]);
    }

    #[test]
    fn split_paragraphs_accepts_whitespace_only_separator_lines() {
        assert_eq!(split_paragraphs("a b\n  \t\nc\n\n\n d "), vec!["a b", "c", "d"]);
    }

    #[test]
    fn overlap_tail_accumulates_whole_units_from_the_end() {
        let units = ["a b c", "d e", "f"];
        assert_eq!(overlap_tail(&units, 3), vec!["d e", "f"]);
        assert_eq!(overlap_tail(&units, 0), vec!["f"]);
        assert_eq!(overlap_tail(&units, 100), units.to_vec());
    }
}
