use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Alternation of Portuguese month names, full names before abbreviations so
/// leftmost-first matching prefers "março" over "mar".
pub const MONTH_NAMES: &str = "janeiro|fevereiro|março|marco|abril|maio|junho|julho|agosto|setembro|outubro|novembro|dezembro|jan|fev|mar|abr|mai|jun|jul|ago|set|out|nov|dez";

static NUMERIC_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(0[1-9]|1[0-2])/(\d{4})").expect("numeric period regex is valid")
});

static NAMED_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_NAMES})\b\s*(?:/|-|\bde\b)\s*(\d{{4}})\b"
    ))
    .expect("named period regex is valid")
});

static MONTH_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({MONTH_NAMES})\b")).expect("month word regex is valid")
});

static YEAR_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("year regex is valid"));

/// Reference month of an obligation ("competência").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Period> {
        if (1..=12).contains(&month) {
            Some(Period { year, month })
        } else {
            None
        }
    }

    /// Zero-padded month, as stored on task instances.
    pub fn month_padded(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Find a period anywhere in `value`: `MM/YYYY` first, then month-name forms.
    pub fn find(value: &str) -> Option<Period> {
        find_numeric(value).or_else(|| find_named(value))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// First `MM/YYYY` whose month is not glued to a preceding digit or dot.
pub fn find_numeric(text: &str) -> Option<Period> {
    let caps = NUMERIC_PERIOD.captures(text)?;
    let month = caps.get(1)?.as_str().parse().ok()?;
    let year = caps.get(2)?.as_str().parse().ok()?;
    Period::new(year, month)
}

/// Month name joined to a year by "/", "-" or "de", or a month name and an
/// isolated year elsewhere in the same text.
pub fn find_named(text: &str) -> Option<Period> {
    if let Some(caps) = NAMED_PERIOD.captures(text) {
        let month = month_number(caps.get(1)?.as_str())?;
        let year = caps.get(2)?.as_str().parse().ok()?;
        return Period::new(year, month);
    }

    let month = MONTH_WORD
        .captures_iter(text)
        .find_map(|c| c.get(1).and_then(|m| month_number(m.as_str())))?;
    let year = YEAR_WORD.captures(text)?.get(1)?.as_str().parse().ok()?;
    Period::new(year, month)
}

/// Map a Portuguese (full or abbreviated) or English month name to 1..=12.
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_lowercase();
    let month = match lower.as_str() {
        "janeiro" | "jan" => 1,
        "fevereiro" | "fev" => 2,
        "março" | "marco" | "mar" => 3,
        "abril" | "abr" => 4,
        "maio" | "mai" => 5,
        "junho" | "jun" => 6,
        "julho" | "jul" => 7,
        "agosto" | "ago" => 8,
        "setembro" | "set" => 9,
        "outubro" | "out" => 10,
        "novembro" | "nov" => 11,
        "dezembro" | "dez" => 12,
        _ => return english_month_number(&lower),
    };
    Some(month)
}

fn english_month_number(lower: &str) -> Option<u32> {
    let month = match lower {
        "january" => 1,
        "february" | "feb" => 2,
        "march" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Whether `word` is a month name (full or abbreviated, any case).
pub fn is_month_name(word: &str) -> bool {
    month_number(word).is_some()
}
