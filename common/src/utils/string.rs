//! String helpers.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[A-Za-z]+('[A-Za-z]+)?").unwrap_or_else(|e| panic!("invalid word regex: {e}"))
    })
}

/// Capitalises the first letter of every word and lower-cases the rest.
///
/// Apostrophes inside a word do not start a new word, so `don't` becomes
/// `Don't`. Non-letters are left untouched.
pub fn titlecase(s: &str) -> String {
    word_pattern()
        .replace_all(s, |caps: &Captures<'_>| {
            let word = &caps[0];
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::with_capacity(word.len());
                    out.push(first.to_ascii_uppercase());
                    out.push_str(&chars.as_str().to_ascii_lowercase());
                    out
                }
                None => String::new(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_correct_titlecased_strings() {
        let actual: Vec<String> = ["FOX", "fox", "Fox", "foX", "FoX", "a Fox jump over The SHEEP"]
            .iter()
            .map(|s| titlecase(s))
            .collect();
        assert_eq!(
            actual,
            vec!["Fox", "Fox", "Fox", "Fox", "Fox", "A Fox Jump Over The Sheep"]
        );
    }

    #[test]
    fn test_apostrophes_and_punctuation() {
        assert_eq!(titlecase("they're BACK, 2day!"), "They're Back, 2Day!");
        assert_eq!(titlecase(""), "");
    }
}
