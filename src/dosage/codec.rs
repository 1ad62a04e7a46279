//! Dosage text codec: `StructuredDosage` <-> short dose text such as
//! `50 mg 1-0-1-0` or `70 mg s.c. monatlich`.
//!
//! Decoding is a fixed, ordered list of rules per field. The order is part
//! of the contract: earlier rules win, so reordering changes results.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::enums::{AdministrationRoute, DosePeriod, DoseRhythm, DoseUnit};
use crate::models::{DoseSchedule, MaxPerPeriod, StructuredDosage};

/// A keyword pattern and the field value it selects.
pub(crate) struct KeywordRule<T> {
    regex: Regex,
    value: T,
}

pub(crate) fn rule<T>(pattern: &str, value: T) -> KeywordRule<T> {
    KeywordRule {
        regex: Regex::new(pattern).expect("static dosage pattern"),
        value,
    }
}

/// Number (decimal point or comma) directly followed by a unit token.
static DOSE_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+(?:[.,]\d+)?)\s*(mg|ml|g|tablet\w*|tbl|tropfen|drops?|spritze\w*|injektion\w*|injection\w*|hübe|hub|puffs?|sprühstö\w*)\b",
    )
    .expect("static dosage pattern")
});

/// Explicit morning-noon-evening-night schedule.
static SCHEDULE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d)\s*-\s*(\d)\s*-\s*(\d)\s*-\s*(\d)\b").expect("static dosage pattern")
});

/// `max. N` with an optional period, e.g. `max. 10/monat`.
static MAX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bmax\.?\s*(\d+)(?:\s*(?:x|mal|tage?|days?|einnahmen)?\s*(?:/|pro|per|im|je|a)\s*(tag|woche|monat|day|week|month)\b)?",
    )
    .expect("static dosage pattern")
});

/// Route keywords: subcutaneous, then intramuscular, then nasal.
static ROUTE_RULES: LazyLock<Vec<KeywordRule<AdministrationRoute>>> = LazyLock::new(|| {
    vec![
        rule(
            r"\bsubkutan\w*|\bsubcutan\w*|\bs\.\s?c\.|unter die haut",
            AdministrationRoute::Subcutaneous,
        ),
        rule(
            r"\bintramuskul\w*|\bintramuscular\w*|\bi\.\s?m\.|in den muskel",
            AdministrationRoute::Intramuscular,
        ),
        rule(
            r"\bnasal\w*|\bnasenspray\w*|in die nase|\bnose spray",
            AdministrationRoute::Nasal,
        ),
        rule(r"\bsonstige anwendung\b|\bother route\b", AdministrationRoute::Other),
    ]
});

/// Rhythm keywords: monthly, weekly, as needed, daily.
static RHYTHM_RULES: LazyLock<Vec<KeywordRule<DoseRhythm>>> = LazyLock::new(|| {
    vec![
        rule(
            r"\bmonatlich\b|\bmonthly\b|\b(?:pro|im|je|jeden)\s+monat\b|\b(?:per|a|every)\s+month\b",
            DoseRhythm::Monthly,
        ),
        rule(
            r"\bwöchentlich\b|\bweekly\b|\b(?:pro|je|jede)\s+woche\b|\b(?:per|a|every)\s+week\b",
            DoseRhythm::Weekly,
        ),
        rule(
            r"\bbei bedarf\b|\bnach bedarf\b|\bbedarfsweise\b|\bas needed\b|\bwhen needed\b|\bprn\b",
            DoseRhythm::AsNeeded,
        ),
        rule(
            r"\btäglich\b|\btägl\b|\bdaily\b|\b(?:pro|am|je|jeden)\s+tag\b|\b(?:per|a|every)\s+day\b|\bmorgens\b|\bmittags\b|\babends\b|\bnachts\b",
            DoseRhythm::Daily,
        ),
    ]
});

/// Fields recovered from free text; `None` means "not mentioned".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialDosage {
    pub dose_value: Option<String>,
    pub dose_unit: Option<DoseUnit>,
    pub dose_rhythm: Option<DoseRhythm>,
    pub dose_schedule: Option<DoseSchedule>,
    pub administration_route: Option<AdministrationRoute>,
    pub max_per_period: Option<MaxPerPeriod>,
}

impl PartialDosage {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays the recovered fields on `base`.
    pub fn merge_onto(self, base: StructuredDosage) -> StructuredDosage {
        StructuredDosage {
            dose_value: self.dose_value.unwrap_or(base.dose_value),
            dose_unit: self.dose_unit.unwrap_or(base.dose_unit),
            dose_rhythm: self.dose_rhythm.unwrap_or(base.dose_rhythm),
            dose_schedule: self.dose_schedule.unwrap_or(base.dose_schedule),
            administration_route: self
                .administration_route
                .unwrap_or(base.administration_route),
            max_per_period: self.max_per_period.or(base.max_per_period),
        }
    }

    /// Merge over `StructuredDosage::default()` (oral, daily, mg).
    pub fn into_dosage(self) -> StructuredDosage {
        self.merge_onto(StructuredDosage::default())
    }
}

// ═══════════════════════════════════════════
// Encode
// ═══════════════════════════════════════════

/// Renders a dosage as dose text. Absent fields are omitted, never padded.
pub fn encode(dosage: &StructuredDosage) -> String {
    let mut parts: Vec<String> = Vec::new();

    let value = dosage.dose_value.trim();
    if !value.is_empty() {
        parts.push(format!("{value} {}", dosage.dose_unit.label()));
    }

    if let Some(tag) = route_tag(dosage.administration_route) {
        parts.push(tag.to_string());
    }

    parts.push(rhythm_text(dosage));
    parts.join(" ")
}

fn route_tag(route: AdministrationRoute) -> Option<&'static str> {
    match route {
        AdministrationRoute::Oral => None,
        AdministrationRoute::Subcutaneous => Some("s.c."),
        AdministrationRoute::Intramuscular => Some("i.m."),
        AdministrationRoute::Nasal => Some("nasal"),
        AdministrationRoute::Other => Some("sonstige Anwendung"),
    }
}

fn rhythm_text(dosage: &StructuredDosage) -> String {
    match dosage.dose_rhythm {
        DoseRhythm::Daily if !dosage.dose_schedule.is_empty() => {
            let [m, n, e, nt] = dosage.dose_schedule.slots();
            format!("{m}-{n}-{e}-{nt}")
        }
        DoseRhythm::Daily => "täglich".into(),
        DoseRhythm::Weekly => "wöchentlich".into(),
        DoseRhythm::Monthly => "monatlich".into(),
        DoseRhythm::AsNeeded => match dosage.max_per_period {
            Some(max) => format!("bei Bedarf ({})", max_text(&max)),
            None => "bei Bedarf".into(),
        },
    }
}

fn max_text(max: &MaxPerPeriod) -> String {
    match max.period {
        Some(period) => format!("max. {}/{}", max.count, period_label(period)),
        None => format!("max. {}", max.count),
    }
}

fn period_label(period: DosePeriod) -> &'static str {
    match period {
        DosePeriod::Day => "Tag",
        DosePeriod::Week => "Woche",
        DosePeriod::Month => "Monat",
    }
}

// ═══════════════════════════════════════════
// Decode
// ═══════════════════════════════════════════

/// Best-effort extraction from free text. Never fails.
pub fn decode(text: &str) -> PartialDosage {
    let lower = text.to_lowercase();
    let mut partial = PartialDosage::default();

    if let Some(caps) = DOSE_VALUE_PATTERN.captures(&lower) {
        if let Some(unit) = normalize_unit(&caps[2]) {
            partial.dose_value = Some(caps[1].replace(',', "."));
            partial.dose_unit = Some(unit);
        }
    }

    partial.administration_route = first_match(&ROUTE_RULES, &lower);

    // The max clause may name a period ("/monat") that is not the rhythm.
    let without_max = MAX_PATTERN.replace_all(&lower, " ");
    partial.dose_rhythm = first_match(&RHYTHM_RULES, &without_max);

    if let Some(caps) = SCHEDULE_PATTERN.captures(&lower) {
        let slot = |i: usize| caps[i].parse::<u8>().unwrap_or(0);
        partial.dose_schedule = Some(DoseSchedule::new(slot(1), slot(2), slot(3), slot(4)));
        partial.dose_rhythm = Some(DoseRhythm::Daily);
    }

    if let Some(caps) = MAX_PATTERN.captures(&lower) {
        if let Ok(count) = caps[1].parse::<u32>() {
            partial.max_per_period = Some(MaxPerPeriod {
                count,
                period: caps.get(2).and_then(|m| parse_period(m.as_str())),
            });
        }
    }

    tracing::debug!(input = text, ?partial, "Decoded dose text");
    partial
}

pub(crate) fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    rules
        .iter()
        .find(|r| r.regex.is_match(text))
        .map(|r| r.value)
}

/// Maps a matched unit token onto the canonical unit (prefix normalization).
fn normalize_unit(token: &str) -> Option<DoseUnit> {
    match token {
        "mg" => return Some(DoseUnit::Mg),
        "g" => return Some(DoseUnit::G),
        "ml" => return Some(DoseUnit::Ml),
        _ => {}
    }
    const PREFIXES: &[(&str, DoseUnit)] = &[
        ("tablet", DoseUnit::Tablets),
        ("tbl", DoseUnit::Tablets),
        ("tropfen", DoseUnit::Drops),
        ("drop", DoseUnit::Drops),
        ("spritze", DoseUnit::Injections),
        ("injektion", DoseUnit::Injections),
        ("injection", DoseUnit::Injections),
        ("hub", DoseUnit::Puffs),
        ("hübe", DoseUnit::Puffs),
        ("puff", DoseUnit::Puffs),
        ("sprühstö", DoseUnit::Puffs),
    ];
    PREFIXES
        .iter()
        .find(|(prefix, _)| token.starts_with(prefix))
        .map(|(_, unit)| *unit)
}

fn parse_period(token: &str) -> Option<DosePeriod> {
    match token {
        "tag" | "day" => Some(DosePeriod::Day),
        "woche" | "week" => Some(DosePeriod::Week),
        "monat" | "month" => Some(DosePeriod::Month),
        _ => None,
    }
}
