//! Cleanup and acceptance checks for generated text.
//!
//! Generated output is untrusted: models echo the prompt's role labels,
//! trail off mid-list or answer with a question. Anything that survives
//! [`Sanitizer::validate_and_clean`] is safe to hand back as prose.

use thiserror::Error;

/// Role labels a template may cause the model to echo, matched
/// case-insensitively at the start of the text.
const DEFAULT_ROLE_MARKERS: &[&str] = &[
    "expert analysis:",
    "sustainability expert",
    "question:",
    "answer:",
    "q:",
    "a:",
];

/// Characters that signal an echoed prompt or an unsure, malformed answer.
const FORBIDDEN_CHARS: &[char] = &['?', '(', ')', '[', ']'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("too short: {len} chars, minimum {min}")]
    TooShort { len: usize, min: usize },

    #[error("contains forbidden character '{0}'")]
    ForbiddenChar(char),

    #[error("contains list marker '{0}'")]
    ListMarker(String),
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::TooShort { .. } => "too_short",
            Rejection::ForbiddenChar(_) => "forbidden_char",
            Rejection::ListMarker(_) => "list_marker",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    min_length: usize,
    role_markers: Vec<String>,
}

impl Sanitizer {
    pub fn new(min_length: usize) -> Self {
        Self {
            min_length,
            role_markers: DEFAULT_ROLE_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Strip echoed role labels, normalize whitespace, then accept or reject.
    pub fn validate_and_clean(&self, raw: &str) -> Result<String, Rejection> {
        let stripped = self.strip_role_markers(raw);
        let cleaned = collapse_whitespace(stripped);

        let len = cleaned.chars().count();
        if len == 0 || len < self.min_length {
            return Err(Rejection::TooShort {
                len,
                min: self.min_length,
            });
        }

        if let Some(c) = cleaned.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
            return Err(Rejection::ForbiddenChar(c));
        }

        // A marker must introduce something; "since 1900." ends a sentence.
        let tokens: Vec<&str> = cleaned.split(' ').collect();
        if let Some(marker) = tokens[..tokens.len().saturating_sub(1)]
            .iter()
            .find(|t| is_list_marker(t))
        {
            return Err(Rejection::ListMarker(marker.to_string()));
        }

        Ok(cleaned)
    }

    /// Remove leading role labels, repeatedly, so "Answer: A: text" loses
    /// both. A colon trailing a label without one ("sustainability expert:")
    /// goes with it.
    fn strip_role_markers<'a>(&self, raw: &'a str) -> &'a str {
        let mut rest = raw.trim_start();
        loop {
            let Some(marker) = self
                .role_markers
                .iter()
                .find(|m| starts_with_marker(rest, m))
            else {
                return rest;
            };
            rest = rest[marker.len()..].trim_start();
            if let Some(after_colon) = rest.strip_prefix(':') {
                rest = after_colon.trim_start();
            }
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(20)
    }
}

/// A label without its own colon must end at a word boundary, so
/// "Sustainability experts agree" keeps its first word.
fn starts_with_marker(text: &str, marker: &str) -> bool {
    let Some(head) = text.get(..marker.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(marker) {
        return false;
    }
    marker.ends_with(':')
        || text[marker.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `1.` or `12.`: one or two digits then a period. `2.5` is a number.
fn is_list_marker(token: &str) -> bool {
    token.strip_suffix('.').is_some_and(|digits| {
        (1..=2).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(20)
    }

    #[test]
    fn strips_stacked_role_markers() {
        let cleaned = sanitizer()
            .validate_and_clean("Answer: A: Solar panels turn sunlight into power.")
            .unwrap();
        assert_eq!(cleaned, "Solar panels turn sunlight into power.");
    }

    #[test]
    fn strips_markers_case_insensitively() {
        let cleaned = sanitizer()
            .validate_and_clean("EXPERT ANALYSIS:   wind farms produce clean electricity")
            .unwrap();
        assert_eq!(cleaned, "wind farms produce clean electricity");
    }

    #[test]
    fn strips_expert_label_with_colon() {
        let cleaned = sanitizer()
            .validate_and_clean("Sustainability expert: composting reduces landfill methane.")
            .unwrap();
        assert_eq!(cleaned, "composting reduces landfill methane.");
    }

    #[test]
    fn keeps_words_that_merely_start_with_a() {
        let cleaned = sanitizer()
            .validate_and_clean("Air quality improves when cities cut traffic.")
            .unwrap();
        assert_eq!(cleaned, "Air quality improves when cities cut traffic.");
    }

    #[test]
    fn keeps_prose_that_starts_with_a_label_word() {
        let cleaned = sanitizer()
            .validate_and_clean("Sustainability experts agree that recycling saves energy.")
            .unwrap();
        assert_eq!(cleaned, "Sustainability experts agree that recycling saves energy.");
    }

    #[test]
    fn strips_bare_expert_label() {
        let cleaned = sanitizer()
            .validate_and_clean("Sustainability expert   reusable bags cut plastic waste.")
            .unwrap();
        assert_eq!(cleaned, "reusable bags cut plastic waste.");
    }

    #[test]
    fn collapses_whitespace() {
        let cleaned = sanitizer()
            .validate_and_clean("  Recycling\n\nsaves   raw\tmaterials and energy.  ")
            .unwrap();
        assert_eq!(cleaned, "Recycling saves raw materials and energy.");
    }

    #[test]
    fn rejects_short_output() {
        assert_eq!(
            sanitizer().validate_and_clean("A: yes."),
            Err(Rejection::TooShort { len: 4, min: 20 })
        );
    }

    #[test]
    fn rejects_echoed_prompt() {
        let err = sanitizer()
            .validate_and_clean("Q: what about wind turbines? A: (unclear)")
            .unwrap_err();
        assert_eq!(err, Rejection::ForbiddenChar('?'));
    }

    #[test]
    fn rejects_brackets() {
        let err = sanitizer()
            .validate_and_clean("Solar power is renewable [citation needed] and clean")
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden_char");
    }

    #[test]
    fn rejects_numbered_lists_but_not_decimals() {
        let err = sanitizer()
            .validate_and_clean("Ways to help: 1. recycle more 2. drive less")
            .unwrap_err();
        assert_eq!(err, Rejection::ListMarker("1.".to_string()));

        assert!(sanitizer()
            .validate_and_clean("Global temperatures have risen about 1.1 degrees since 1900.")
            .is_ok());
        assert!(sanitizer()
            .validate_and_clean("The best rating an efficient appliance can get is 5.")
            .is_ok());
        // Years and other long numbers end sentences rather than number items.
        assert!(sanitizer()
            .validate_and_clean("Since 2015. emissions dropped across the whole region")
            .is_ok());
        assert_eq!(
            sanitizer()
                .validate_and_clean("Three steps help most 12. insulate the attic")
                .unwrap_err(),
            Rejection::ListMarker("12.".to_string())
        );
    }

    #[test]
    fn marker_only_output_is_rejected_without_a_minimum() {
        assert_eq!(
            Sanitizer::new(0).validate_and_clean("Answer: Q:"),
            Err(Rejection::TooShort { len: 0, min: 0 })
        );
    }

    #[test]
    fn empty_output_is_too_short() {
        assert_eq!(
            sanitizer().validate_and_clean("   "),
            Err(Rejection::TooShort { len: 0, min: 20 })
        );
    }
}
