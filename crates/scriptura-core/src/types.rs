use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation language. French is the default whenever detection is
/// inconclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    #[default]
    Fr,
    Mg,
}

impl Language {
    /// Two-letter tag used in cache keys and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "FR",
            Language::Mg => "MG",
        }
    }

    /// Prefix prepended to the user turn so the model answers in the right language.
    pub fn prompt_tag(&self) -> &'static str {
        match self {
            Language::Fr => "[FR] ",
            Language::Mg => "[MG] ",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FR" => Ok(Language::Fr),
            "MG" => Ok(Language::Mg),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

/// Shorten a platform sender ID for logs: first 10 characters plus `...`.
pub fn redact_sender(id: &str) -> String {
    let head: String = id.chars().take(10).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes() {
        assert_eq!(Language::Fr.code(), "FR");
        assert_eq!(Language::Mg.to_string(), "MG");
        assert_eq!(Language::Mg.prompt_tag(), "[MG] ");
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("mg".parse::<Language>().unwrap(), Language::Mg);
        assert_eq!("FR".parse::<Language>().unwrap(), Language::Fr);
        assert!("en".parse::<Language>().is_err());
    }

    #[test]
    fn language_serde_uses_uppercase_tags() {
        assert_eq!(serde_json::to_string(&Language::Mg).unwrap(), "\"MG\"");
        let back: Language = serde_json::from_str("\"FR\"").unwrap();
        assert_eq!(back, Language::Fr);
    }

    #[test]
    fn redact_keeps_ten_chars() {
        assert_eq!(redact_sender("1234567890123456"), "1234567890...");
        assert_eq!(redact_sender("42"), "42...");
    }
}
