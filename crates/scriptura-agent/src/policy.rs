//! Content policy checked before any backend call.

use std::sync::LazyLock;

use regex::Regex;

use scriptura_core::config::PolicyConfig;

static PERSONAL_PROPHECY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)proph[ée]tie.*personnelle|faminaniana.*manokana").expect("valid regex")
});
static PROSPERITY_GOSPEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)richesses?.*b[ée]n[ée]diction|harena.*fahombiazana").expect("valid regex")
});
static WORKS_SALVATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)sauv[ée]?.*par.*(?:[œo]e?uvres)|famonjena.*amin.*asa").expect("valid regex")
});
static OCCULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)magie|sorcellerie|occult|majika|mpamosavy").expect("valid regex")
});
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?://|www\.)\S+").expect("valid regex"));
static APOCRYPHAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)apocryph|livres?.*rejet[ée]s?|boky.*apokrifa").expect("valid regex")
});

/// Why a question was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    TooShort,
    TooLong,
    PersonalProphecy,
    ProsperityGospel,
    WorksSalvation,
    Occult,
    Link,
}

/// A question that passed the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Screened {
    /// The question mentions books outside the 66-book canon.
    pub apocryphal: bool,
}

#[derive(Debug, Clone)]
pub struct ContentPolicy {
    min_chars: usize,
    max_chars: usize,
}

impl ContentPolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            min_chars: config.min_chars,
            max_chars: config.max_chars,
        }
    }

    /// Length bounds first, then the topic patterns in a fixed order.
    pub fn check(&self, question: &str) -> Result<Screened, Violation> {
        let len = question.trim().chars().count();
        if len < self.min_chars {
            return Err(Violation::TooShort);
        }
        if len > self.max_chars {
            return Err(Violation::TooLong);
        }

        let rules: [(&LazyLock<Regex>, Violation); 5] = [
            (&PERSONAL_PROPHECY, Violation::PersonalProphecy),
            (&PROSPERITY_GOSPEL, Violation::ProsperityGospel),
            (&WORKS_SALVATION, Violation::WorksSalvation),
            (&OCCULT, Violation::Occult),
            (&LINK, Violation::Link),
        ];
        for (pattern, violation) in rules {
            if pattern.is_match(question) {
                return Err(violation);
            }
        }

        Ok(Screened {
            apocryphal: APOCRYPHAL.is_match(question),
        })
    }
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(q: &str) -> Result<Screened, Violation> {
        ContentPolicy::default().check(q)
    }

    #[test]
    fn ordinary_questions_pass() {
        assert_eq!(check("Comment pardonner selon la Bible ?"), Ok(Screened::default()));
        assert_eq!(check("Inona no atao hoe finoana?"), Ok(Screened::default()));
    }

    #[test]
    fn length_bounds() {
        assert_eq!(check(" ab "), Err(Violation::TooShort));
        assert_eq!(check("abc"), Ok(Screened::default()));
        assert_eq!(check(&"a".repeat(501)), Err(Violation::TooLong));
        assert!(check(&"é".repeat(500)).is_ok());
    }

    #[test]
    fn blocked_topics() {
        assert_eq!(
            check("Donne-moi une prophétie personnelle pour 2025"),
            Err(Violation::PersonalProphecy)
        );
        assert_eq!(
            check("Omeo faminaniana manokana aho"),
            Err(Violation::PersonalProphecy)
        );
        assert_eq!(
            check("Les richesses sont-elles une bénédiction de Dieu ?"),
            Err(Violation::ProsperityGospel)
        );
        assert_eq!(
            check("Peut-on être sauvé par nos œuvres ?"),
            Err(Violation::WorksSalvation)
        );
        assert_eq!(
            check("Que penser de la sorcellerie ?"),
            Err(Violation::Occult)
        );
        assert_eq!(check("Ny majika ve ratsy?"), Err(Violation::Occult));
    }

    #[test]
    fn bare_urls_are_rejected() {
        assert_eq!(
            check("Regarde https://example.com/verset stp"),
            Err(Violation::Link)
        );
        assert_eq!(check("voir www.eglise.org"), Err(Violation::Link));
    }

    #[test]
    fn apocrypha_is_a_warning_not_a_rejection() {
        assert_eq!(
            check("Le livre de Tobie est-il apocryphe ?"),
            Ok(Screened { apocryphal: true })
        );
    }
}
