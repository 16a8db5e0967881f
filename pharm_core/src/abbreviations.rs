//! Prescription shorthand used on labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dosing frequency abbreviations a label can carry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Om,
    On,
    Bd,
    Tds,
    Qds,
    Prn,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Om,
        Frequency::On,
        Frequency::Bd,
        Frequency::Tds,
        Frequency::Qds,
        Frequency::Prn,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Om => "om",
            Frequency::On => "on",
            Frequency::Bd => "bd",
            Frequency::Tds => "tds",
            Frequency::Qds => "qds",
            Frequency::Prn => "prn",
        }
    }

    /// Plain-language wording printed on the label
    pub fn label_text(&self) -> &'static str {
        match self {
            Frequency::Om => "every morning",
            Frequency::On => "every night",
            Frequency::Bd => "two times a day",
            Frequency::Tds => "three times a day",
            Frequency::Qds => "four times a day",
            Frequency::Prn => "when necessary",
        }
    }

    /// Parse a prescription frequency field, e.g. "qds or prn"
    ///
    /// Unknown parts are dropped; an empty result means nothing on the
    /// prescription is typeable.
    pub fn parse_alternatives(field: &str) -> Vec<Frequency> {
        field
            .split(" or ")
            .filter_map(|part| part.parse().ok())
            .collect()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Frequency::ALL
            .into_iter()
            .find(|f| f.code() == wanted || f.label_text() == wanted)
            .ok_or_else(|| format!("unknown frequency '{}'", s))
    }
}

const DICTIONARY: &[(&str, &str)] = &[
    ("om", "every morning"),
    ("on", "every night"),
    ("bd", "two times a day"),
    ("tds", "three times a day"),
    ("qds", "four times a day"),
    ("prn", "when necessary"),
    ("pc", "after meals"),
    ("ac", "before meals"),
    ("stat", "immediately"),
    ("tab", "tablet"),
    ("cap", "capsule"),
    ("ml", "milliliter"),
    ("mg", "milligram"),
    ("mcg", "microgram"),
    ("1/7", "1 day"),
    ("1/52", "1 week"),
    ("1/12", "1 month"),
];

/// Expand a medical abbreviation, if known
pub fn expand_abbreviation(code: &str) -> Option<&'static str> {
    let wanted = code.trim().to_lowercase();
    DICTIONARY
        .iter()
        .find(|(abbr, _)| *abbr == wanted)
        .map(|(_, meaning)| *meaning)
}

/// Convert "n/7", "n/52" and "n/12" durations to words; other text is kept
pub fn convert_duration(duration: &str) -> String {
    let units = [("/7", "day"), ("/52", "week"), ("/12", "month")];

    for (suffix, unit) in units {
        if let Some(count) = duration.trim().strip_suffix(suffix) {
            let plural = if count == "1" { "" } else { "s" };
            return format!("{} {}{}", count, unit, plural);
        }
    }

    duration.to_string()
}
