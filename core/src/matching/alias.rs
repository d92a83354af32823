//! Per-alias message comparison

use chatsound_types::MatchType;
use regex::Regex;
use tracing::warn;

/// One trigger alias of a rule, with its whole-word pattern precompiled
/// when the rule matches by `ContainsWord`.
#[derive(Debug, Clone)]
pub struct Alias {
    text: String,
    word: Option<Regex>,
}

impl Alias {
    pub fn new(text: impl Into<String>, match_type: MatchType) -> Self {
        let text = text.into();
        let word = match match_type {
            MatchType::ContainsWord => {
                match Regex::new(&format!(r"\b{}\b", regex::escape(&text))) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(alias = %text, error = %e, "Failed to build word pattern");
                        None
                    }
                }
            }
            _ => None,
        };
        Self { text, word }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Compare against a message. `trimmed` must be `raw.trim()`.
    ///
    /// Comparisons are case-sensitive.
    pub fn matches(&self, match_type: MatchType, raw: &str, trimmed: &str) -> bool {
        match match_type {
            MatchType::Equals => trimmed == self.text,
            MatchType::StartsWith => trimmed.starts_with(self.text.as_str()),
            MatchType::StartsWithWord => trimmed.split_whitespace().next() == Some(self.text.as_str()),
            MatchType::ContainsWord => self.word.as_ref().is_some_and(|re| re.is_match(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(match_type: MatchType, alias: &str, message: &str) -> bool {
        Alias::new(alias, match_type).matches(match_type, message, message.trim())
    }

    #[test]
    fn equals_is_exact_after_trim() {
        assert!(check(MatchType::Equals, "pog", "  pog "));
        assert!(!check(MatchType::Equals, "pog", "pogger"));
        assert!(!check(MatchType::Equals, "pog", "POG"));
    }

    #[test]
    fn starts_with_trims_message() {
        assert!(check(MatchType::StartsWith, "foo", "foobar"));
        assert!(check(MatchType::StartsWith, "foo", " foo "));
        assert!(!check(MatchType::StartsWith, "foo", "a foo"));
    }

    #[test]
    fn starts_with_word_needs_whole_first_token() {
        assert!(check(MatchType::StartsWithWord, "go", "go now"));
        assert!(check(MatchType::StartsWithWord, "go", "  go"));
        assert!(!check(MatchType::StartsWithWord, "go", "going now"));
        assert!(!check(MatchType::StartsWithWord, "go", "now go"));
        assert!(!check(MatchType::StartsWithWord, "go", "   "));
    }

    #[test]
    fn contains_word_respects_boundaries() {
        assert!(check(MatchType::ContainsWord, "cat", "a cat ran"));
        assert!(check(MatchType::ContainsWord, "cat", "cat"));
        assert!(check(MatchType::ContainsWord, "cat", "cat!"));
        assert!(!check(MatchType::ContainsWord, "cat", "concatenate"));
        assert!(!check(MatchType::ContainsWord, "cat", "cats"));
    }

    #[test]
    fn contains_word_escapes_metacharacters() {
        assert!(check(MatchType::ContainsWord, "a.b", "say a.b now"));
        assert!(!check(MatchType::ContainsWord, "a.b", "say axb now"));
    }
}
