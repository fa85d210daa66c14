//! French / Malagasy language classifier.
//!
//! Pure and deterministic: a weighted score per language from three signals
//! (lexicon substrings, characteristic diacritics, common function words),
//! then a ratio comparison with a fixed margin. Close calls fall back to
//! whole-phrase matches and finally to average word length, since Malagasy
//! words run noticeably longer than French ones.

use scriptura_core::Language;

const MG_KEYWORDS: &[&str] = &[
    "manao ahoana", "misaotra", "azafady", "tsara", "ratsy", "miala tsiny", "tongasoa",
    "veloma", "maraina", "hariva", "baiboly", "jesosy", "kristy", "andriamanitra", "vavaka",
    "finoana", "fahasoavana", "ota", "famonjena", "fiangonana", "mpitory", "filazantsara",
    "teny", "tany", "lanitra", "olona", "zavatra", "zoma", "sabotsy", "alahady", "ankizy",
    "ray", "reny", "namana", "sakaiza",
];

const FR_KEYWORDS: &[&str] = &[
    "bonjour", "salut", "merci", "s'il vous plaît", "désolé", "bienvenue", "au revoir",
    "matin", "soir", "nuit", "bible", "jésus", "christ", "dieu", "prière", "foi", "grâce",
    "péché", "église", "pasteur", "évangile", "parole", "terre", "ciel", "personne",
    "chose", "vendredi", "samedi", "dimanche", "enfant", "père", "mère", "ami", "amie",
];

const MG_DIACRITICS: &str = "àáâèéêìíîòóôùúûñ";
const FR_DIACRITICS: &str = "éèêëàâäîïôöùûüçœæ";

const MG_COMMON: &[&str] = &["ny", "ho", "dia", "ary", "fa", "raha", "tsy"];
const FR_COMMON: &[&str] = &["le", "la", "de", "et", "mais", "si", "ne"];

const MG_PHRASES: &[&str] = &[
    "manao ahoana ianao",
    "misaotra betsaka",
    "azafady kely",
    "veloma tompoko",
    "maraina tsara",
];
const FR_PHRASES: &[&str] = &[
    "comment allez-vous",
    "merci beaucoup",
    "s'il vous plaît",
    "au revoir",
    "bonne journée",
];

const KEYWORD_WEIGHT: f32 = 1.0;
const DIACRITIC_WEIGHT: f32 = 0.5;
const COMMON_WORD_WEIGHT: f32 = 1.0;

/// One language must lead the other's share of the score by more than this.
const MARGIN: f32 = 0.1;
/// Average word length above which the fallback picks Malagasy.
const LONG_WORD_AVG: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub language: Language,
    /// Share of the total score held by `language`; 0 when nothing matched.
    pub confidence: f32,
}

/// Raw per-language scores.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scores {
    pub fr: f32,
    pub mg: f32,
}

impl Scores {
    pub fn total(&self) -> f32 {
        self.fr + self.mg
    }

    fn share(&self, language: Language) -> f32 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        match language {
            Language::Fr => self.fr / total,
            Language::Mg => self.mg / total,
        }
    }
}

pub fn scores(text: &str) -> Scores {
    let lower = text.to_lowercase();
    let tokens = tokens(&lower);
    let mut s = Scores::default();

    s.mg += KEYWORD_WEIGHT * MG_KEYWORDS.iter().filter(|k| lower.contains(*k)).count() as f32;
    s.fr += KEYWORD_WEIGHT * FR_KEYWORDS.iter().filter(|k| lower.contains(*k)).count() as f32;

    for ch in lower.chars() {
        if MG_DIACRITICS.contains(ch) {
            s.mg += DIACRITIC_WEIGHT;
        }
        if FR_DIACRITICS.contains(ch) {
            s.fr += DIACRITIC_WEIGHT;
        }
    }

    s.mg += COMMON_WORD_WEIGHT
        * MG_COMMON.iter().filter(|w| tokens.contains(*w)).count() as f32;
    s.fr += COMMON_WORD_WEIGHT
        * FR_COMMON.iter().filter(|w| tokens.contains(*w)).count() as f32;

    s
}

pub fn classify(text: &str) -> Classification {
    let s = scores(text);
    if s.total() <= 0.0 {
        return Classification {
            language: Language::Fr,
            confidence: 0.0,
        };
    }

    let fr = s.share(Language::Fr);
    let mg = s.share(Language::Mg);
    let language = if mg - fr > MARGIN {
        Language::Mg
    } else if fr - mg > MARGIN {
        Language::Fr
    } else {
        fallback(text)
    };

    Classification {
        language,
        confidence: s.share(language),
    }
}

/// Shorthand for `classify(text).language`.
pub fn detect(text: &str) -> Language {
    classify(text).language
}

fn fallback(text: &str) -> Language {
    let lower = text.to_lowercase();
    if MG_PHRASES.iter().any(|p| lower.contains(p)) {
        return Language::Mg;
    }
    if FR_PHRASES.iter().any(|p| lower.contains(p)) {
        return Language::Fr;
    }

    let words = tokens(&lower);
    if words.is_empty() {
        return Language::Fr;
    }
    let avg = words.iter().map(|w| w.chars().count()).sum::<usize>() as f32 / words.len() as f32;
    if avg > LONG_WORD_AVG {
        Language::Mg
    } else {
        Language::Fr
    }
}

/// Whitespace-separated words with surrounding punctuation removed.
fn tokens(lower: &str) -> Vec<&str> {
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_question() {
        let c = classify("Que dit la Bible sur le pardon et la grâce de Dieu ?");
        assert_eq!(c.language, Language::Fr);
        assert!(c.confidence > 0.5);
    }

    #[test]
    fn malagasy_question() {
        let c = classify("Inona no lazain'ny Baiboly momba ny famonjena sy ny fahasoavana?");
        assert_eq!(c.language, Language::Mg);
        assert!(c.confidence > 0.5);
    }

    #[test]
    fn empty_and_unmatched_default_to_french() {
        assert_eq!(
            classify(""),
            Classification {
                language: Language::Fr,
                confidence: 0.0
            }
        );
        assert_eq!(classify("123 456").language, Language::Fr);
    }

    #[test]
    fn common_words_count_only_as_whole_tokens() {
        // "dia" inside "diable" must not score for Malagasy.
        let s = scores("diable");
        assert_eq!(s.mg, 0.0);
        let s = scores("dia, tsara");
        assert_eq!(s.mg, 2.0);
    }

    #[test]
    fn diacritics_add_half_points() {
        let s = scores("ç");
        assert_eq!(s.fr, 0.5);
        assert_eq!(s.mg, 0.0);
        let s = scores("ñ");
        assert_eq!(s.mg, 0.5);
    }

    #[test]
    fn tie_falls_back_to_phrases() {
        // One keyword each ("merci", "tsara"); the phrase wins over word length.
        assert_eq!(detect("merci beaucoup tsaratsaratsara"), Language::Fr);
    }

    #[test]
    fn tie_falls_back_to_word_length() {
        // "ray" scores MG, "si" scores FR; long words tip it to MG.
        assert_eq!(detect("ray si fanantenana fahagagana"), Language::Mg);
        assert_eq!(detect("ray si oui"), Language::Fr);
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "Manao ahoana! Je voudrais comprendre Jaona 3:16";
        let first = classify(text);
        for _ in 0..10 {
            assert_eq!(classify(text), first);
        }
    }
}
