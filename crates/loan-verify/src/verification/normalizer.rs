//! Canonicalisation of raw extracted and declared values into comparable types.
//!
//! Every function here is pure. Failures are returned as [`NormalizationFailure`]
//! and degrade to an inconclusive comparison in the matchers; they never abort a run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{FieldKind, MaskedSsn};

const SSN_DIGITS: usize = 9;

const CURRENCY_SYMBOLS: [char; 6] = ['$', '€', '£', '¥', '₹', '¢'];
const CURRENCY_CODES: [&str; 6] = ["USD", "EUR", "GBP", "INR", "CAD", "AUD"];

const EMPLOYER_SUFFIXES: [&str; 12] = [
    "inc",
    "incorporated",
    "llc",
    "corp",
    "corporation",
    "co",
    "company",
    "ltd",
    "limited",
    "plc",
    "llp",
    "lp",
];

const MONTH_NAMES: [&str; 24] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

/// Per-field normalisation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationFailure {
    #[error("malformed SSN: expected 9 digits, found {digits}")]
    MalformedSsn { digits: usize },
    #[error("malformed amount '{raw}': not a non-negative number")]
    MalformedAmount { raw: String },
    #[error("blank {field} value")]
    Blank { field: &'static str },
}

/// Result of normalising one raw value, tagged by the field it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    Name(PersonName),
    Amount(f64),
    Period(PayPeriod),
    Employer(EmployerName),
    Ssn(Ssn),
}

/// Dispatch on the field kind; pay periods never fail and fall back to `Unknown`.
pub fn normalize(raw: &str, kind: FieldKind) -> Result<NormalizedValue, NormalizationFailure> {
    match kind {
        FieldKind::Name => normalize_name(raw).map(NormalizedValue::Name),
        FieldKind::PayAmount => normalize_amount(raw).map(NormalizedValue::Amount),
        FieldKind::PayPeriod => Ok(NormalizedValue::Period(normalize_pay_period(raw))),
        FieldKind::EmployerName => normalize_employer(raw).map(NormalizedValue::Employer),
        FieldKind::Ssn => normalize_ssn(raw).map(NormalizedValue::Ssn),
    }
}

/// Person name with whitespace collapsed. Casing is folded for comparison only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    display: String,
    folded: String,
    tokens: BTreeSet<String>,
}

impl PersonName {
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn tokens(&self) -> &BTreeSet<String> {
        &self.tokens
    }
}

pub fn normalize_name(raw: &str) -> Result<PersonName, NormalizationFailure> {
    let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let tokens: BTreeSet<String> = display
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.is_empty() {
        return Err(NormalizationFailure::Blank { field: "name" });
    }

    Ok(PersonName {
        folded: display.to_lowercase(),
        display,
        tokens,
    })
}

/// Employer name reduced to lowercase words with trailing legal suffixes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployerName {
    display: String,
    words: Vec<String>,
    stripped_suffixes: Vec<String>,
}

impl EmployerName {
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn canonical(&self) -> String {
        self.words.join(" ")
    }

    pub fn stripped_suffixes(&self) -> &[String] {
        &self.stripped_suffixes
    }
}

pub fn normalize_employer(raw: &str) -> Result<EmployerName, NormalizationFailure> {
    let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned: String = display
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c.is_alphanumeric() || c == '&' { c } else { ' ' })
        .collect();

    let mut words: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
    if words.is_empty() {
        return Err(NormalizationFailure::Blank { field: "employer" });
    }

    let mut stripped_suffixes = Vec::new();
    while words.len() > 1 {
        let is_suffix = words
            .last()
            .map(|word| EMPLOYER_SUFFIXES.contains(&word.as_str()))
            .unwrap_or(false);
        if !is_suffix {
            break;
        }
        if let Some(word) = words.pop() {
            stripped_suffixes.insert(0, word);
        }
    }

    Ok(EmployerName {
        display,
        words,
        stripped_suffixes,
    })
}

/// Nine-digit social security number.
#[derive(Clone, PartialEq, Eq)]
pub struct Ssn(String);

impl Ssn {
    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> MaskedSsn {
        MaskedSsn::from_raw(&self.0)
    }
}

impl std::fmt::Debug for Ssn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Ssn").field(&self.masked().as_str()).finish()
    }
}

pub fn normalize_ssn(raw: &str) -> Result<Ssn, NormalizationFailure> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != SSN_DIGITS {
        return Err(NormalizationFailure::MalformedSsn {
            digits: digits.len(),
        });
    }
    Ok(Ssn(digits))
}

pub fn normalize_amount(raw: &str) -> Result<f64, NormalizationFailure> {
    let malformed = || NormalizationFailure::MalformedAmount {
        raw: raw.trim().to_string(),
    };

    let mut text = raw.trim().to_string();
    for code in CURRENCY_CODES {
        let upper = text.to_ascii_uppercase();
        if upper.starts_with(code) {
            text = text[code.len()..].to_string();
        } else if upper.ends_with(code) {
            text = text[..text.len() - code.len()].to_string();
        }
    }

    // Commas are only thousands separators; one after the decimal point means
    // a European-style figure such as "1.234,56".
    if text
        .find('.')
        .is_some_and(|dot| text[dot..].contains(','))
    {
        return Err(malformed());
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && *c != '_' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(malformed());
    }

    let value = cleaned.parse::<f64>().map_err(|_| malformed())?;
    if !value.is_finite() || value < 0.0 {
        return Err(malformed());
    }
    Ok(value)
}

/// Closed set of pay frequencies recognised on pay stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriod {
    Weekly,
    Biweekly,
    Semimonthly,
    Monthly,
    Annual,
    Unknown,
}

impl PayPeriod {
    pub const fn label(self) -> &'static str {
        match self {
            PayPeriod::Weekly => "weekly",
            PayPeriod::Biweekly => "biweekly",
            PayPeriod::Semimonthly => "semimonthly",
            PayPeriod::Monthly => "monthly",
            PayPeriod::Annual => "annual",
            PayPeriod::Unknown => "unknown",
        }
    }

    pub const fn periods_per_year(self) -> Option<u32> {
        match self {
            PayPeriod::Weekly => Some(52),
            PayPeriod::Biweekly => Some(26),
            PayPeriod::Semimonthly => Some(24),
            PayPeriod::Monthly => Some(12),
            PayPeriod::Annual => Some(1),
            PayPeriod::Unknown => None,
        }
    }
}

pub fn normalize_pay_period(raw: &str) -> PayPeriod {
    let lowered = raw.trim().to_lowercase();
    let compact: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let has = |needles: &[&str]| needles.iter().any(|needle| compact.contains(needle));

    if compact.is_empty() || has(&["bimonthly", "daily", "hourly"]) {
        return PayPeriod::Unknown;
    }
    if has(&["biweekly", "fortnight", "2weeks", "twoweeks"]) {
        return PayPeriod::Biweekly;
    }
    if has(&["semimonthly", "twiceamonth", "twicemonthly", "twicepermonth"]) {
        return PayPeriod::Semimonthly;
    }
    if has(&["weekly", "perweek", "everyweek", "weekending"]) || compact == "week" {
        return PayPeriod::Weekly;
    }
    if has(&["monthly", "permonth", "everymonth"])
        || compact == "month"
        || names_calendar_month(&lowered)
    {
        return PayPeriod::Monthly;
    }
    if has(&["annual", "yearly", "peryear", "perannum"]) || compact == "year" {
        return PayPeriod::Annual;
    }
    PayPeriod::Unknown
}

/// "March 2024" style periods: exactly one month name and one four-digit year,
/// with no day numbers or second month that would make it a date range.
fn names_calendar_month(lowered: &str) -> bool {
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    let months = words
        .iter()
        .filter(|word| MONTH_NAMES.contains(word))
        .count();
    let numbers: Vec<&&str> = words
        .iter()
        .filter(|word| word.chars().any(|c| c.is_ascii_digit()))
        .collect();
    let bare_year = matches!(
        numbers.as_slice(),
        [year] if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())
    );
    months == 1 && bare_year
}
