// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises a raw news article into lowercase words separated
// by single spaces.
//
// Cleaning steps (applied in order):
//   1. Replace every run of digits with the token NUM
//   2. Spell out the dollar sign
//   3. Lowercase
//   4. Replace everything outside a-z with a space
//   5. Collapse whitespace and trim
//
// After cleaning, the only characters left are a-z and single
// spaces, so splitting on ' ' yields the word sequence exactly.

use regex::Regex;

pub struct Preprocessor {
    digits:      Regex,
    non_letters: Regex,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            digits:      Regex::new(r"\d+").expect("valid digit pattern"),
            non_letters: Regex::new(r"[^a-z]").expect("valid letter pattern"),
        }
    }

    /// Clean a raw text string for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        let text = self.digits.replace_all(text, " NUM ");
        let text = text.replace('$', " dollar ").to_lowercase();
        let text = self.non_letters.replace_all(&text, " ");

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  hello world  \n"), "hello world");
    }

    #[test]
    fn test_substitutes_numbers() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("Launched in 1969, 3 men"), "launched in num num men");
    }

    #[test]
    fn test_spells_dollar() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("costs $5"), "costs dollar num");
    }

    #[test]
    fn test_strips_punctuation_and_non_ascii() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("From: bob@sci.space (Bob) café!"), "from bob sci space bob caf");
    }

    #[test]
    fn test_output_alphabet() {
        let p   = Preprocessor::new();
        let out = p.clean("Subject: Re: [TEST] \t 42\u{00A0}things... ÜBER");
        assert!(out.chars().all(|c| c.is_ascii_lowercase() || c == ' '));
        assert!(!out.contains("  "));
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }
}
