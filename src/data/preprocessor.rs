// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Turns free-text catalog fields (titles, genres, blurbs) into
// the normalised tokens the bag-of-words and TF-IDF embedders
// count.
//
// Analysis steps (applied in order):
//   1. Clean characters: tabs, NBSP, zero-width spaces, BOM and
//      control characters become plain spaces; runs of spaces
//      collapse to one
//   2. Lowercase, and rewrite "sci-fi" as "scifi" so the genre
//      survives tokenisation as a single word
//   3. Split into \w+ tokens
//   4. Drop English stop words
//   5. Keep decade tokens ("1980s") verbatim, stem the rest
//
// Reference: Porter (1980) An algorithm for suffix stripping
//            rust-stemmers crate documentation (Snowball English)

use std::sync::LazyLock;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// NLTK's English stop-word list.
pub const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
    "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
    "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do",
    "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because",
    "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below",
    "to", "from", "up", "down", "in", "out", "on", "off", "over", "under", "again",
    "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t",
    "can", "will", "just", "don", "don't", "should", "should've", "now", "d", "ll",
    "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't",
    "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't",
    "haven", "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn",
    "mustn't", "needn", "needn't", "shan", "shan't", "shouldn", "shouldn't",
    "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));
static DECADE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-3][0-9]{3}s$").expect("decade pattern is valid"));

/// Normalise whitespace and invisible characters, one line at a time.
pub fn clean(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
            '\r' => '\n',
            c if c.is_control() && c != '\n' => ' ',
            c => c,
        })
        .collect();

    mapped
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ─── TextAnalyzer ─────────────────────────────────────────────────────────────
/// Tokeniser + stop-word filter + stemmer used by the bag-of-words
/// embedder and vocabulary builder.
pub struct TextAnalyzer {
    stemmer: Stemmer,
}

impl TextAnalyzer {
    pub fn new() -> Self {
        Self { stemmer: Stemmer::create(Algorithm::English) }
    }

    /// Full analysis of one text field into vocabulary tokens.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = clean(text).to_lowercase().replace("sci-fi", "scifi");

        WORD
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !is_stop_word(token))
            .map(|token| self.normalize_token(token))
            .collect()
    }

    /// Decades stay as written ("1990s"); everything else is stemmed.
    pub fn normalize_token(&self, token: &str) -> String {
        if DECADE.is_match(token) {
            token.to_string()
        } else {
            self.stemmer.stem(token).into_owned()
        }
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  hello\t\u{00A0}  world  "), "hello world");
        assert_eq!(clean("a\x01b"), "a b");
        assert_eq!(clean("line1\r\n\n\nline2"), "line1\nline2");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_stop_words_removed() {
        let a = TextAnalyzer::new();
        let tokens = a.analyze("The story of a robot");
        assert!(!tokens.iter().any(|t| t == "the" || t == "of" || t == "a"));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_scifi_kept_as_one_token() {
        let a = TextAnalyzer::new();
        assert_eq!(a.analyze("Sci-Fi"), vec![a.normalize_token("scifi")]);
    }

    #[test]
    fn test_decades_not_stemmed() {
        let a = TextAnalyzer::new();
        assert_eq!(a.normalize_token("1980s"), "1980s");
        assert_eq!(
            a.analyze("movies from the 1990s"),
            vec![a.normalize_token("movies"), "1990s".to_string()],
        );
    }

    #[test]
    fn test_stemming_merges_inflections() {
        let a = TextAnalyzer::new();
        assert_eq!(a.normalize_token("running"), a.normalize_token("runs"));
    }
}
