use anyhow::{Context, Result};
use regex::Regex;

pub const EMBEDDING_TEXT_MAX_CHARS: usize = 1024;

/// Compiled markup patterns used to clean text before embedding.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    link: Regex,
    emphasis: Regex,
    heading: Regex,
    fenced_code: Regex,
    inline_code: Regex,
    blockquote: Regex,
    rule: Regex,
    bullet: Regex,
    style_delimiter: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            link: Regex::new(r"\[.*?\]\(.*?\)").context("failed to compile link regex")?,
            emphasis: Regex::new(r"\*\*|__|\*|_").context("failed to compile emphasis regex")?,
            heading: Regex::new(r"#+\s*").context("failed to compile heading regex")?,
            fenced_code: Regex::new(r"(?s)```.*?```")
                .context("failed to compile fenced code regex")?,
            inline_code: Regex::new(r"`[^`]*`").context("failed to compile inline code regex")?,
            blockquote: Regex::new(r"(?m)^\s*>\s*")
                .context("failed to compile blockquote regex")?,
            rule: Regex::new(r"(?m)^\s*(?:-{3,}|\*{3,}|_{3,})")
                .context("failed to compile horizontal rule regex")?,
            bullet: Regex::new(r"(?m)^\s*[-+*]\s*").context("failed to compile bullet regex")?,
            style_delimiter: Regex::new(r"[.!?]+")
                .context("failed to compile sentence delimiter regex")?,
        })
    }

    /// Strips lightweight markup and collapses the text onto a single line.
    ///
    /// Removal passes repeat until nothing changes, so a construct exposed by
    /// an earlier removal (a link split by a code span, for instance) is also
    /// removed and `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.normalize_pass(text);
        loop {
            let next = self.normalize_pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    pub fn normalize_opt(&self, text: Option<&str>) -> String {
        text.map(|value| self.normalize(value)).unwrap_or_default()
    }

    fn normalize_pass(&self, text: &str) -> String {
        let text = self.link.replace_all(text, "");
        let text = self.emphasis.replace_all(&text, "");
        let text = self.heading.replace_all(&text, "");
        let text = self.fenced_code.replace_all(&text, "");
        let text = self.inline_code.replace_all(&text, "");
        let text = self.blockquote.replace_all(&text, "");
        // Rules go before bullets, which would otherwise eat one dash and leave "--".
        let text = self.rule.replace_all(&text, "");
        let text = self.bullet.replace_all(&text, "");
        collapse_whitespace(&text)
    }

    /// Normalized text cut down to what an embedding request accepts.
    pub fn embeddable_text(&self, text: &str, max_chars: usize) -> String {
        let normalized = self.normalize(text);
        truncate_chars(&normalized, max_chars).to_string()
    }

    /// Splits an ideal answer into normalized, non-empty sentences.
    ///
    /// A boundary is one whitespace character right after `.`, `?` or `!`,
    /// unless the punctuation closes an initialism such as "e.g." or a short
    /// capitalized abbreviation such as "Mr.".
    pub fn split_answer_sentences(&self, text: &str) -> Vec<String> {
        let chars = text.chars().collect::<Vec<char>>();
        let mut pieces = Vec::<String>::new();
        let mut start = 0usize;

        for index in 1..chars.len() {
            if !chars[index].is_whitespace() || !is_sentence_boundary(&chars, index) {
                continue;
            }
            pieces.push(chars[start..index].iter().collect());
            start = index + 1;
        }
        pieces.push(chars[start.min(chars.len())..].iter().collect());

        pieces
            .iter()
            .map(|piece| self.normalize(piece))
            .filter(|sentence| !sentence.is_empty())
            .collect()
    }

    /// Splits free text on runs of `.`, `!` and `?` with no abbreviation handling.
    pub fn split_style_sentences(&self, text: &str) -> Vec<String> {
        self.style_delimiter
            .split(text)
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn is_sentence_boundary(chars: &[char], index: usize) -> bool {
    if !matches!(chars[index - 1], '.' | '?' | '!') {
        return false;
    }

    if index >= 4
        && is_word_char(chars[index - 4])
        && chars[index - 3] == '.'
        && is_word_char(chars[index - 2])
    {
        return false;
    }

    !(index >= 3
        && chars[index - 3].is_ascii_uppercase()
        && chars[index - 2].is_ascii_lowercase()
        && chars[index - 1] == '.')
}

fn is_word_char(value: char) -> bool {
    value.is_alphanumeric() || value == '_'
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Hard cut at a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new().expect("patterns compile")
    }

    #[test]
    fn normalize_removes_headings_and_emphasis() {
        let text = "# Title\n\nThis **bold** and _italic_ text";
        assert_eq!(normalizer().normalize(text), "Title This bold and italic text");
    }

    #[test]
    fn normalize_drops_links_and_code_entirely() {
        let text = "See [docs](http://example.com) `code`\n```python\nprint('hi')\n```";
        assert_eq!(normalizer().normalize(text), "See");
    }

    #[test]
    fn normalize_strips_quotes_bullets_and_rules() {
        let text = "> quoted line\n- first item\n+ second item\n---\n***\nplain";
        assert_eq!(
            normalizer().normalize(text),
            "quoted line first item second item plain"
        );
    }

    #[test]
    fn normalize_is_idempotent_for_every_markup_class() {
        let normalizer = normalizer();
        let samples = [
            "# Heading\nbody",
            "**strong** __also__ *em* _em_",
            "[label](https://example.com) trailing",
            "```\nlet x = 1;\n```\nafter",
            "inline `code` span",
            "> quote\n>> nested",
            "- a\n* b\n+ c",
            "___\n---\n***",
            "[a]`x`(b) exposed link",
            "  lots \n\n of\twhitespace  ",
        ];
        for sample in samples {
            let once = normalizer.normalize(sample);
            assert_eq!(normalizer.normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn normalize_removes_link_exposed_by_code_removal() {
        assert_eq!(normalizer().normalize("[a]`x`(b) tail"), "tail");
    }

    #[test]
    fn normalize_opt_handles_missing_text() {
        let normalizer = normalizer();
        assert_eq!(normalizer.normalize_opt(None), "");
        assert_eq!(normalizer.normalize_opt(Some("*x*")), "x");
    }

    #[test]
    fn truncate_chars_cuts_on_character_boundary() {
        assert_eq!(truncate_chars("ação rápida", 3), "açã");
        assert_eq!(truncate_chars("short", 10), "short");

        let long = "a".repeat(EMBEDDING_TEXT_MAX_CHARS + 10);
        let embeddable = normalizer().embeddable_text(&long, EMBEDDING_TEXT_MAX_CHARS);
        assert_eq!(embeddable.chars().count(), EMBEDDING_TEXT_MAX_CHARS);
    }

    #[test]
    fn split_answer_sentences_breaks_on_terminal_punctuation() {
        let sentences =
            normalizer().split_answer_sentences("First one. Second one? Third one! Fourth");
        assert_eq!(
            sentences,
            vec!["First one.", "Second one?", "Third one!", "Fourth"]
        );
    }

    #[test]
    fn split_answer_sentences_keeps_initialisms_and_abbreviations() {
        let sentences = normalizer()
            .split_answer_sentences("Use a token, e.g. an API key. Ask Mr. Smith for access.");
        assert_eq!(
            sentences,
            vec!["Use a token, e.g. an API key.", "Ask Mr. Smith for access."]
        );
    }

    #[test]
    fn split_answer_sentences_drops_markup_only_pieces() {
        let normalizer = normalizer();
        assert!(normalizer.split_answer_sentences("").is_empty());
        assert!(normalizer.split_answer_sentences("```\ncode only\n```").is_empty());
        assert_eq!(normalizer.split_answer_sentences("**Bold.** `x`"), vec!["Bold."]);
    }

    #[test]
    fn split_style_sentences_uses_plain_delimiters() {
        let normalizer = normalizer();
        assert_eq!(
            normalizer.split_style_sentences("good sentence. bad style."),
            vec!["good sentence", "bad style"]
        );
        assert_eq!(
            normalizer.split_style_sentences("e.g. this!! and that?"),
            vec!["e", "g", "this", "and that"]
        );
    }
}
