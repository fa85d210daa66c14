//! Response shaping pipeline.
//!
//! Stages run in a fixed order, each a pure function over the text:
//!
//! 1. [`clean`]: strip markup, normalize quotes, drop a trailing
//!    stop-sequence artifact, collapse whitespace.
//! 2. [`correct_language`]: best-effort token substitution when the
//!    generated text came back in the other language.
//! 3. [`truncate`]: enforce the character budget, appending the localized
//!    notice when anything was cut.
//! 4. [`reflow`]: wrap long lines at word boundaries.
//! 5. Conclusion: appended from a localized pool unless one is present.
//! 6. Enrichment: one supplementary verse when the question has a topic.
//!
//! Room for the stage 5/6 tails is reserved before truncating, so the final
//! text never exceeds `max_chars` characters.

use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use scriptura_core::{config::ShapingConfig, Language};

use crate::{language, locale};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["\u{201C}\u{201D}\u{2018}\u{2019}]"#).expect("valid regex"));
static HSPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid regex"));
/// Generation artifact: a marker on the final line, cut through to the end.
static TRAILING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:###|\*\*\*|---)[^\n]*$").expect("valid regex"));

static MG_NY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bny\b").expect("valid regex"));
static MG_DIA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdia\b").expect("valid regex"));
static FR_LE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\ble\b").expect("valid regex"));
static FR_EST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\best\b").expect("valid regex"));

/// How far back from the ceiling a hard cut looks for whitespace.
const HARD_CUT_LOOKBACK: usize = 100;

/// Shaped text plus what the pipeline did to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessedResponse {
    pub text: String,
    pub language_corrected: bool,
    pub truncated: bool,
    pub reflowed: bool,
    pub conclusion_added: bool,
    pub enriched: bool,
}

pub struct ResponseShaper {
    max_chars: usize,
    wrap_width: usize,
    rng: Mutex<fastrand::Rng>,
}

impl ResponseShaper {
    /// A configured `seed` makes conclusion and verse picks reproducible.
    pub fn new(config: &ShapingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            max_chars: config.max_chars,
            wrap_width: config.wrap_width,
            rng: Mutex::new(rng),
        }
    }

    pub fn shape(&self, raw: &str, question: &str, lang: Language) -> ProcessedResponse {
        let topic = locale::topic_for(question);

        let cleaned = clean(raw);
        let (text, language_corrected) = correct_language(&cleaned, lang);

        let budget = self.max_chars.saturating_sub(tail_reserve(lang, topic));
        let (text, truncated) = truncate(&text, budget, locale::truncation_notice(lang));

        let reflowed_text = reflow(&text, self.wrap_width);
        let reflowed = reflowed_text != text;
        let mut text = reflowed_text;

        let mut conclusion_added = false;
        if !has_conclusion(&text) {
            let pool = locale::conclusions(lang);
            let pick = pool[self.pick(pool.len())];
            if fits(&text, pick, self.max_chars) {
                text.push_str(pick);
                conclusion_added = true;
            }
        }

        let mut enriched = false;
        if let Some(topic) = topic {
            let pool = locale::verses(topic);
            let line = locale::verse_line(&pool[self.pick(pool.len())], lang);
            if fits(&text, &line, self.max_chars) {
                text.push_str(&line);
                enriched = true;
            }
        }

        if text.chars().count() > self.max_chars {
            text = text.chars().take(self.max_chars).collect();
        }

        ProcessedResponse {
            text,
            language_corrected,
            truncated,
            reflowed,
            conclusion_added,
            enriched,
        }
    }

    fn pick(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .usize(..len)
    }
}

fn has_conclusion(text: &str) -> bool {
    locale::CONCLUSION_MARKERS.iter().any(|m| text.contains(m))
}

fn fits(text: &str, tail: &str, max_chars: usize) -> bool {
    text.chars().count() + tail.chars().count() <= max_chars
}

/// Characters kept free for the longest conclusion and, when the question
/// has a topic, the longest verse line.
fn tail_reserve(lang: Language, topic: Option<locale::Topic>) -> usize {
    let conclusion = locale::conclusions(lang)
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0);
    let verse = topic
        .map(|t| {
            locale::verses(t)
                .iter()
                .map(|v| locale::verse_line(v, lang).chars().count())
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    conclusion + verse
}

// ── Stages ─────────────────────────────────────────────────

pub fn clean(raw: &str) -> String {
    let text = TAG.replace_all(raw, "");
    let text = QUOTES.replace_all(&text, "'");

    let text = TRAILING_MARKER.replace(text.trim_end(), "");

    let text = HSPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Returns the text and whether a substitution was applied.
pub fn correct_language(text: &str, expected: Language) -> (String, bool) {
    let detected = language::detect(text);
    if detected == expected {
        return (text.to_string(), false);
    }

    let corrected = match expected {
        Language::Fr => {
            let t = MG_NY.replace_all(text, "le");
            MG_DIA.replace_all(&t, "c'est").into_owned()
        }
        Language::Mg => {
            let t = FR_LE.replace_all(text, "ny");
            FR_EST.replace_all(&t, "dia").into_owned()
        }
    };
    let changed = corrected != text;
    (corrected, changed)
}

/// Cut `text` so that body plus `notice` fits in `budget` characters.
///
/// Cut points by priority: last sentence end (`.`/`!` before whitespace),
/// last paragraph break, last `?`. When the chosen point lands in the
/// first half, the cut is made at the last whitespace near the ceiling
/// instead (or exactly at it).
pub fn truncate(text: &str, budget: usize, notice: &str) -> (String, bool) {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= budget {
        return (text.to_string(), false);
    }

    let ceiling = budget.saturating_sub(notice.chars().count());
    let half = ceiling / 2;

    let sentence = (0..ceiling)
        .rev()
        .find(|&i| {
            matches!(chars[i], '.' | '!')
                && chars.get(i + 1).map_or(true, |c| c.is_whitespace())
        })
        .map(|i| i + 1);
    let paragraph = (0..ceiling.saturating_sub(1))
        .rev()
        .find(|&i| chars[i] == '\n' && chars[i + 1] == '\n');
    let question = (0..ceiling).rev().find(|&i| chars[i] == '?').map(|i| i + 1);

    let cut = match sentence.or(paragraph).or(question) {
        Some(cut) if cut >= half => cut,
        _ => (ceiling.saturating_sub(HARD_CUT_LOOKBACK)..ceiling)
            .rev()
            .find(|&i| chars[i].is_whitespace())
            .filter(|&i| i > 0)
            .unwrap_or(ceiling),
    };

    let body: String = chars[..cut].iter().collect();
    let mut out = body.trim_end().to_string();
    out.push_str(notice);
    (out, true)
}

/// Wrap lines longer than `width` at spaces. Lines containing `**` keep
/// their layout. Only spaces become newlines, so the length is unchanged.
pub fn reflow(text: &str, width: usize) -> String {
    text.split('\n')
        .map(|line| {
            if line.chars().count() > width && !line.contains("**") {
                wrap_line(line, width)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    for (i, word) in line.split(' ').enumerate() {
        let len = word.chars().count();
        if i > 0 {
            if col > 0 && col + 1 + len > width {
                out.push('\n');
                col = 0;
            } else {
                out.push(' ');
                col += 1;
            }
        }
        out.push_str(word);
        col += len;
    }
    out
}
