//! Heuristic title generation from the first user message.
//!
//! Three strategies, tried in order: question keywords, action verb plus its
//! object, plain truncation with an ellipsis.

use regex::Regex;

use crate::core::config::TitlingConfig;
use crate::core::types::Conversation;

/// Tokens ignored when extracting question keywords.
const STOPWORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "are", "as", "at", "be", "by", "can", "could", "do", "does",
    "for", "from", "had", "has", "have", "he", "how", "i", "if", "in", "is", "it", "me", "my",
    "no", "not", "of", "on", "or", "please", "she", "should", "tell", "that", "the", "they",
    "this", "to", "was", "we", "what", "when", "where", "which", "who", "why", "will", "with",
    "would", "you", "your",
];

/// Leading verbs that mark an actionable request.
const ACTION_VERBS: &[&str] = &[
    "analyze", "brainstorm", "build", "compare", "compose", "create", "debug", "design", "draft",
    "draw", "explain", "find", "fix", "generate", "help", "improve", "list", "make", "outline",
    "plan", "refactor", "review", "search", "show", "summarize", "translate", "write",
];

/// Question marks recognized as such (ASCII and full-width).
const QUESTION_MARKS: [char; 2] = ['?', '？'];

/// Generates display titles from raw user messages.
pub struct TitleGenerator {
    max_chars: usize,
    max_keywords: usize,
    word_re: Regex,
}

impl TitleGenerator {
    /// Create a title generator.
    ///
    /// # Errors
    /// Returns an error if the tokenizer pattern is invalid.
    pub fn new(config: &TitlingConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            max_chars: config.max_chars,
            max_keywords: config.max_keywords,
            word_re: Regex::new(r"[\p{Alphabetic}\p{N}']+")?,
        })
    }

    /// Generate a title for `message`.
    ///
    /// Blank input falls back to the default conversation title.
    #[must_use]
    pub fn generate(&self, message: &str) -> String {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Conversation::DEFAULT_TITLE.to_string();
        }

        if let Some(title) = self.question_title(trimmed) {
            return title;
        }
        if let Some(title) = self.action_title(trimmed) {
            return title;
        }
        self.truncated_title(trimmed)
    }

    /// Keyword title for messages carrying a question mark.
    fn question_title(&self, text: &str) -> Option<String> {
        let mark = text.find(&QUESTION_MARKS[..])?;
        let keywords: Vec<&str> = self
            .word_re
            .find_iter(&text[..mark])
            .map(|m| m.as_str())
            .filter(|token| !STOPWORDS.contains(&token.to_lowercase().as_str()))
            .take(self.max_keywords)
            .collect();
        if keywords.is_empty() {
            return None;
        }

        let mut title = capitalize(&keywords.join(" "));
        title.push('?');
        Some(title)
    }

    /// Verb-plus-object title for actionable requests.
    fn action_title(&self, text: &str) -> Option<String> {
        let tokens: Vec<&str> = self.word_re.find_iter(text).map(|m| m.as_str()).collect();
        let verb_at = tokens
            .iter()
            .position(|token| ACTION_VERBS.contains(&token.to_lowercase().as_str()))?;

        let mut title = capitalize(tokens[verb_at]);
        if let Some(object) = tokens.get(verb_at + 1) {
            title.push(' ');
            title.push_str(object);
        }
        Some(title)
    }

    /// Raw message, truncated at the character budget with an ellipsis.
    fn truncated_title(&self, text: &str) -> String {
        if text.chars().count() <= self.max_chars {
            return text.to_string();
        }
        let mut title: String = text.chars().take(self.max_chars).collect();
        title.push_str("...");
        title
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TitleGenerator {
        TitleGenerator::new(&TitlingConfig::default()).unwrap()
    }

    #[test]
    fn test_question_keeps_at_most_three_keywords() {
        let title = generator().generate("what is the rust borrow checker doing here exactly?");
        assert_eq!(title, "Rust borrow checker?");

        let stripped = title.strip_suffix('?').unwrap();
        assert!(stripped.split_whitespace().count() <= 3);
        assert!(
            stripped
                .split_whitespace()
                .all(|token| !STOPWORDS.contains(&token.to_lowercase().as_str()))
        );
    }

    #[test]
    fn test_fullwidth_question_mark_detected() {
        let title = generator().generate("东京的天气怎么样？");
        assert!(title.ends_with('?'));
    }

    #[test]
    fn test_all_stopword_question_falls_through() {
        // No usable keywords: short message passes through untouched.
        let title = generator().generate("what is it?");
        assert_eq!(title, "what is it?");
    }

    #[test]
    fn test_action_verb_with_object() {
        assert_eq!(generator().generate("write an essay about whales"), "Write an");
        assert_eq!(generator().generate("please summarize yesterday's meeting"), "Summarize yesterday's");
    }

    #[test]
    fn test_truncation_at_exact_budget() {
        let message = "x".repeat(45);
        let title = generator().generate(&message);
        assert_eq!(title.chars().count(), 30 + 3);
        assert!(title.ends_with("..."));
        assert_eq!(&title[..30], &message[..30]);
    }

    #[test]
    fn test_short_message_passes_through() {
        assert_eq!(generator().generate("good morning"), "good morning");
    }

    #[test]
    fn test_blank_message_gets_default_title() {
        assert_eq!(generator().generate("   "), Conversation::DEFAULT_TITLE);
    }
}
