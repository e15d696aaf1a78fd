//! Title normalization.
//!
//! Reduces a free-text project title to a comparable token sequence:
//!
//! 1. Drop everything up to and including the first colon (grant mechanism
//!    labels such as `EAGER:` or `CAREER:`).
//! 2. Strip characters that are not ASCII alphanumerics, whitespace, or `-`.
//!    If nothing is left, fall back to the untouched title.
//! 3. Split on whitespace, drop stop words (case-insensitive), rejoin with
//!    single spaces.
//!
//! Casing of surviving tokens is preserved. The function is idempotent.

use std::collections::HashSet;
use std::sync::LazyLock;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "via", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Whether `word` is a stop word, ignoring case.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word.to_ascii_lowercase().as_str())
}

/// Normalize a project title for similarity comparison.
pub fn normalize_title(title: &str) -> String {
    let unprefixed = match title.split_once(':') {
        Some((_, rest)) => rest,
        None => title,
    };

    let stripped: String = unprefixed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let base = if stripped.trim().is_empty() {
        title
    } else {
        stripped.as_str()
    };

    base.split_whitespace()
        .filter(|w| !is_stop_word(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized title tokens, as sent to the award search.
pub fn title_keywords(title: &str) -> Vec<String> {
    normalize_title(title)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_mechanism_prefix_punctuation_and_stop_words() {
        assert_eq!(normalize_title("EAGER: Cool Study of X!!"), "Cool Study X");
    }

    #[test]
    fn only_first_colon_is_a_prefix() {
        assert_eq!(
            normalize_title("CAREER: Ice: A Frozen History"),
            "Ice Frozen History"
        );
    }

    #[test]
    fn keeps_hyphens_and_digits() {
        assert_eq!(
            normalize_title("Long-term Monitoring of 3D Structures"),
            "Long-term Monitoring 3D Structures"
        );
    }

    #[test]
    fn stop_words_ignore_case() {
        assert_eq!(normalize_title("THE Study OF The Sea"), "Study Sea");
        assert!(is_stop_word("And"));
        assert!(!is_stop_word("Andes"));
    }

    #[test]
    fn falls_back_to_original_when_strip_empties() {
        assert_eq!(normalize_title("EAGER: ???"), "EAGER: ???");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_title("  Coral \t  Reefs\n"), "Coral Reefs");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "EAGER: Cool Study of X!!",
            "Research on Coral Reefs",
            "EAGER: ???",
            "The: of the",
            "RAPID: Hurricane-Induced Erosion (2017) -- a field study",
            "",
            "   ",
        ];
        for s in samples {
            let once = normalize_title(s);
            assert_eq!(normalize_title(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn keywords_split_normalized_title() {
        assert_eq!(
            title_keywords("Research on Coral Reefs"),
            vec!["Research", "Coral", "Reefs"]
        );
        assert!(title_keywords("of the").is_empty());
    }
}
