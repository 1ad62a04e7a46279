//! Date phrases in spoken German or English, resolved to a month start.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::reminders::add_months_clamped;

/// Month name spellings, index + 1 is the month number.
const MONTH_NAMES: [&[&str]; 12] = [
    &["januar", "january", "jänner", "jan"],
    &["februar", "february", "feb"],
    &["märz", "maerz", "march", "mär", "mar"],
    &["april", "apr"],
    &["mai", "may"],
    &["juni", "june", "jun"],
    &["juli", "july", "jul"],
    &["august", "aug"],
    &["september", "sept", "sep"],
    &["oktober", "october", "okt", "oct"],
    &["november", "nov"],
    &["dezember", "december", "dez", "dec"],
];

/// Short month names that are also everyday English words. They only count
/// as a month next to a preposition, a qualifier, or a year.
const AMBIGUOUS_MONTH_NAMES: [&str; 2] = ["may", "mar"];

/// Optional preposition, optional qualifier, month name, optional
/// four-digit year.
static MONTH_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    let mut names: Vec<&str> = MONTH_NAMES.iter().flat_map(|n| n.iter().copied()).collect();
    // longest first so "märz" wins over "mär"
    names.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));
    let pattern = format!(
        r"\b(?:(seit|since|ab|from|von|in|im|bis|until|till)\s+)?(?:(anfang|mitte|ende|beginning of|end of)\s+)?({})\b(?:\s+(\d{{4}}))?",
        names.join("|")
    );
    Regex::new(&pattern).expect("static month pattern")
});

/// "vor 3 Monaten", "seit zwei Monaten", "3 months ago", "for two months".
static MONTHS_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:vor|seit)\s+(\d+|\p{L}+)\s+monate?n?\b|(\d+|\p{L}+)\s+months?\s+ago\b|for\s+(\d+|\p{L}+)\s+months?\b)",
    )
    .expect("static months-ago pattern")
});

/// Dates found in one utterance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateMatches {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Byte ranges of the matched phrases in the input.
    pub spans: Vec<Range<usize>>,
}

/// Scans lowercased text for start and end phrases relative to `today`.
///
/// A month without a year resolves to the first of that month in the current
/// year, or the previous year if that would lie in the future.
pub fn extract_dates(lower: &str, today: NaiveDate) -> DateMatches {
    let mut found = DateMatches::default();

    for caps in MONTH_PHRASE.captures_iter(lower) {
        let Some(name) = caps.get(3).map(|m| m.as_str()) else {
            continue;
        };
        let anchored = caps.get(1).is_some() || caps.get(2).is_some() || caps.get(4).is_some();
        if AMBIGUOUS_MONTH_NAMES.contains(&name) && !anchored {
            continue;
        }
        let Some(month) = month_number(name) else {
            continue;
        };
        let year = caps.get(4).and_then(|y| y.as_str().parse::<i32>().ok());
        let Some(date) = resolve_month(month, year, today) else {
            continue;
        };
        let is_end = matches!(
            caps.get(1).map(|p| p.as_str()),
            Some("bis" | "until" | "till")
        );
        let slot = if is_end { &mut found.end } else { &mut found.start };
        if slot.is_none() {
            *slot = Some(date);
            if let Some(m) = caps.get(0) {
                found.spans.push(m.range());
            }
        }
    }

    if found.start.is_none() {
        for caps in MONTHS_AGO.captures_iter(lower) {
            let count = (1..=3)
                .filter_map(|i| caps.get(i))
                .find_map(|m| parse_count(m.as_str()));
            if let Some(n) = count {
                let first = today.with_day(1).unwrap_or(today);
                found.start = add_months_clamped(first, -(n as i32));
                if let Some(m) = caps.get(0) {
                    found.spans.push(m.range());
                }
                break;
            }
        }
    }

    found
}

fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|names| names.contains(&name))
        .map(|i| i as u32 + 1)
}

fn resolve_month(month: u32, year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, 1)?;
    if this_year <= today {
        Some(this_year)
    } else {
        NaiveDate::from_ymd_opt(today.year() - 1, month, 1)
    }
}

/// Digits or a spelled-out count up to twelve.
fn parse_count(word: &str) -> Option<u32> {
    if let Ok(n) = word.parse::<u32>() {
        return (1..=240).contains(&n).then_some(n);
    }
    let n = match word {
        "ein" | "einem" | "einen" | "eins" | "one" | "a" => 1,
        "zwei" | "two" => 2,
        "drei" | "three" => 3,
        "vier" | "four" => 4,
        "fünf" | "five" => 5,
        "sechs" | "six" => 6,
        "sieben" | "seven" => 7,
        "acht" | "eight" => 8,
        "neun" | "nine" => 9,
        "zehn" | "ten" => 10,
        "elf" | "eleven" => 11,
        "zwölf" | "twelve" => 12,
        _ => return None,
    };
    Some(n)
}
