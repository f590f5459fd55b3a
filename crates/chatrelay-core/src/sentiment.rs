//! Keyword sentiment estimate for response metadata.

use chatrelay_types::sentiment::Sentiment;

/// Pluggable estimator used by the relay engine.
pub type SentimentFn = fn(&str) -> Sentiment;

const POSITIVE_WORDS: &[&str] = &[
    "happy",
    "good",
    "great",
    "excellent",
    "positive",
    "wonderful",
    "amazing",
    "love",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "bad", "terrible", "poor", "negative", "awful", "hate",
];

/// Classify `text` by counting keyword hits.
///
/// Matching is case-insensitive substring containment, and each keyword
/// counts at most once however often it appears. More positive hits than
/// negative is positive, the reverse is negative, a tie is neutral.
pub fn estimate_sentiment(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    let hits = |words: &[&str]| words.iter().filter(|w| lowered.contains(*w)).count();

    let positive = hits(POSITIVE_WORDS);
    let negative = hits(NEGATIVE_WORDS);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_examples() {
        assert_eq!(estimate_sentiment("I love this, it is wonderful"), Sentiment::Positive);
        assert_eq!(estimate_sentiment("this is terrible and awful"), Sentiment::Negative);
        assert_eq!(estimate_sentiment("the sky is blue"), Sentiment::Neutral);
        assert_eq!(estimate_sentiment("LOVE"), Sentiment::Positive);
    }

    #[test]
    fn test_positive() {
        assert_eq!(estimate_sentiment("This is great and I love it"), Sentiment::Positive);
    }

    #[test]
    fn test_negative() {
        assert_eq!(estimate_sentiment("awful, just bad"), Sentiment::Negative);
    }

    #[test]
    fn test_tie_is_neutral() {
        assert_eq!(estimate_sentiment("good and bad"), Sentiment::Neutral);
    }

    #[test]
    fn test_no_keywords_is_neutral() {
        assert_eq!(estimate_sentiment(""), Sentiment::Neutral);
        assert_eq!(estimate_sentiment("hi there"), Sentiment::Neutral);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(estimate_sentiment("AMAZING"), Sentiment::Positive);
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        // "good" twice is still one hit, so one "sad" and one "hate" win.
        assert_eq!(
            estimate_sentiment("good good good, sad, hate"),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_substring_matches() {
        // "badge" contains "bad".
        assert_eq!(estimate_sentiment("a shiny badge"), Sentiment::Negative);
    }
}
