//! Per-field comparators. Each returns a complete [`FieldComparison`] for any
//! input; malformed or absent extraction becomes an inconclusive verdict.

mod employer;
mod name;
mod salary;
mod ssn;

pub use employer::match_employer;
pub use name::match_name;
pub use salary::match_salary;
pub use ssn::match_ssn;

use std::collections::BTreeSet;

use super::domain::FieldComparison;
use super::normalizer::NormalizationFailure;

pub(crate) const NO_EXTRACTED_VALUE: &str = "no extracted value";

/// Normalised extracted value as handed to a matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<T> {
    Present(T),
    Missing,
    Unparsable(NormalizationFailure),
}

impl<T> Extracted<T> {
    pub fn from_result(value: Option<Result<T, NormalizationFailure>>) -> Self {
        match value {
            Some(Ok(value)) => Extracted::Present(value),
            Some(Err(failure)) => Extracted::Unparsable(failure),
            None => Extracted::Missing,
        }
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Extracted::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Short status used in stream diagnostics.
    pub fn status_label(&self) -> &'static str {
        match self {
            Extracted::Present(_) => "parsed",
            Extracted::Missing => "missing",
            Extracted::Unparsable(_) => "unparsable",
        }
    }

    /// The present value, or the inconclusive verdict for an absent/unparsable one.
    pub(crate) fn present_or_gap<V>(&self) -> Result<&T, FieldComparison<V>> {
        match self {
            Extracted::Present(value) => Ok(value),
            Extracted::Missing => Err(FieldComparison::inconclusive(NO_EXTRACTED_VALUE, None)),
            Extracted::Unparsable(failure) => Err(FieldComparison::inconclusive(
                format!("could not parse extracted value: {failure}"),
                None,
            )),
        }
    }
}

pub(crate) fn format_token_set(tokens: &BTreeSet<String>) -> String {
    let joined = tokens.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!("{{{joined}}}")
}
