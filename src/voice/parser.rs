//! Best-effort parse of a spoken medication-course description.
//!
//! Output is advisory: the caller shows it for confirmation and nothing here
//! writes to the store.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use super::dates::extract_dates;
use crate::dosage::codec::{first_match, rule, KeywordRule};
use crate::dosage::{decode, PartialDosage};
use crate::models::enums::{CourseType, DoseRhythm};

pub const EXACT_CONFIDENCE: f32 = 0.95;
pub const FUZZY_CONFIDENCE: f32 = 0.75;
pub const HEURISTIC_CONFIDENCE: f32 = 0.5;

/// Minimum Jaro-Winkler similarity for a fuzzy catalog hit.
pub const FUZZY_THRESHOLD: f64 = 0.88;

/// Shortest token considered as a medication name.
const MIN_NAME_LEN: usize = 4;

/// Suffixes typical for migraine-relevant drug names.
const DRUG_SUFFIXES: &[&str] = &[
    "triptan", "mab", "gepant", "ditan", "olol", "amat", "profen", "tylin", "izin", "sartan",
    "proat", "tamol", "salicyl", "pyrin", "enac", "oxen",
];

/// Words that precede a dose but are never a medication.
const STOPWORDS: &[&str] = &[
    "ich", "nehme", "nahm", "habe", "hatte", "seit", "since", "von", "mit", "und", "oder", "dann",
    "noch", "also", "bitte", "etwa", "circa", "ungefähr", "about", "around", "take", "took",
    "taking", "every", "daily", "täglich", "morgens", "mittags", "abends", "nachts", "jeden",
    "eine", "einen", "einer", "the", "and", "with", "from", "bis", "until", "immer", "jetzt",
    "heute", "gestern", "mal", "dosis", "dose", "insgesamt", "zusätzlich",
];

static COURSE_TYPE_RULES: LazyLock<Vec<KeywordRule<CourseType>>> = LazyLock::new(|| {
    vec![
        rule(
            r"\bprophyla\w*|\bvorbeug\w*|\bprävent\w*|\bprevent\w*|\bdauermedikation\b",
            CourseType::Prophylaxis,
        ),
        rule(
            r"\bakut\w*|\bacute\b|\battacke\w*|\banfall\w*|\bbei (?:kopfschmerz\w*|migräne)|\brescue\b|\bnotfall\w*",
            CourseType::Acute,
        ),
    ]
});

static STOPPED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:abgesetzt|aufgehört|nicht mehr|keine? mehr|genommen|nahm|beendet|gestoppt|abgebrochen|stopped|quit|no longer|used to|took|discontinued|ended)\b",
    )
    .expect("static voice pattern")
});

/// Word directly in front of a dose, e.g. "sumatriptan" in "sumatriptan 50 mg".
static WORD_BEFORE_DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{L}[\p{L}-]*)\s+\d+(?:[.,]\d+)?\s*(?:mg|ml|g|tablet|tbl|tropfen|spritze|hub|hübe|puff)")
        .expect("static voice pattern")
});

/// How the medication name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    Exact,
    Fuzzy,
    Heuristic,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParseResult {
    pub transcript: String,
    pub medication_name: Option<String>,
    pub name_confidence: f32,
    pub name_source: NameSource,
    pub course_type: CourseType,
    pub dosage: PartialDosage,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

/// Parses one utterance against the user's known medication names.
/// Never fails; unrecognised parts stay empty.
pub fn parse_utterance(transcript: &str, known: &[String], today: NaiveDate) -> VoiceParseResult {
    let lower = transcript.to_lowercase();

    let dates = extract_dates(&lower, today);
    let mut spans = dates.spans.clone();
    spans.sort_by_key(|s| std::cmp::Reverse(s.start));
    let mut without_dates = lower.clone();
    for span in spans {
        without_dates.replace_range(span, " ");
    }

    let dosage = decode(&without_dates);
    let (medication_name, name_source) = resolve_name(&without_dates, known);
    let course_type = first_match(&COURSE_TYPE_RULES, &lower)
        .unwrap_or_else(|| course_type_from_rhythm(dosage.dose_rhythm));

    let ended = dates.end.is_some_and(|end| end <= today);
    let is_active = !(STOPPED_PATTERN.is_match(&lower) || ended);

    let result = VoiceParseResult {
        transcript: transcript.to_string(),
        name_confidence: confidence(name_source),
        medication_name,
        name_source,
        course_type,
        dosage,
        start_date: dates.start,
        end_date: dates.end,
        is_active,
    };
    tracing::debug!(
        name = ?result.medication_name,
        source = ?result.name_source,
        active = result.is_active,
        "Parsed voice utterance"
    );
    result
}

fn confidence(source: NameSource) -> f32 {
    match source {
        NameSource::Exact => EXACT_CONFIDENCE,
        NameSource::Fuzzy => FUZZY_CONFIDENCE,
        NameSource::Heuristic => HEURISTIC_CONFIDENCE,
        NameSource::None => 0.0,
    }
}

fn course_type_from_rhythm(rhythm: Option<DoseRhythm>) -> CourseType {
    match rhythm {
        Some(DoseRhythm::AsNeeded) => CourseType::Acute,
        Some(_) => CourseType::Prophylaxis,
        None => CourseType::Other,
    }
}

// ═══════════════════════════════════════════
// Name resolution
// ═══════════════════════════════════════════

fn resolve_name(lower: &str, known: &[String]) -> (Option<String>, NameSource) {
    if let Some(name) = exact_match(lower, known) {
        return (Some(name), NameSource::Exact);
    }
    if let Some(name) = fuzzy_match(lower, known) {
        return (Some(name), NameSource::Fuzzy);
    }
    if let Some(name) = heuristic_name(lower) {
        return (Some(name), NameSource::Heuristic);
    }
    (None, NameSource::None)
}

/// Longest catalog name occurring as whole words.
fn exact_match(lower: &str, known: &[String]) -> Option<String> {
    let mut candidates: Vec<&String> = known.iter().filter(|k| !k.trim().is_empty()).collect();
    candidates.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));
    candidates
        .into_iter()
        .find(|k| contains_words(lower, &k.trim().to_lowercase()))
        .cloned()
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Best Jaro-Winkler hit between a transcript word and the first word of a
/// catalog name.
fn fuzzy_match(lower: &str, known: &[String]) -> Option<String> {
    let words: Vec<&str> = words(lower).filter(|w| w.chars().count() >= MIN_NAME_LEN).collect();
    let mut best: Option<(f64, &String)> = None;
    for name in known {
        let Some(head) = name.split_whitespace().next() else {
            continue;
        };
        let head = head.to_lowercase();
        for word in &words {
            let score = jaro_winkler(word, &head);
            if score >= FUZZY_THRESHOLD && best.map_or(true, |(b, _)| score > b) {
                best = Some((score, name));
            }
        }
    }
    best.map(|(_, name)| name.clone())
}

/// A drug-like token: known suffix first, else the word in front of a dose.
fn heuristic_name(lower: &str) -> Option<String> {
    let by_suffix = words(lower).find(|w| {
        w.chars().count() >= MIN_NAME_LEN + 2
            && !is_stopword(w)
            && DRUG_SUFFIXES.iter().any(|s| w.ends_with(s))
    });
    if let Some(word) = by_suffix {
        return Some(capitalize(word));
    }

    WORD_BEFORE_DOSE
        .captures_iter(lower)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .find(|w| w.chars().count() >= MIN_NAME_LEN && !is_stopword(w))
        .map(capitalize)
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_alphabetic() || c == '-'))
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
