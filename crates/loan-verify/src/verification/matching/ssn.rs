use super::super::domain::{FieldComparison, MaskedSsn};
use super::super::normalizer::Ssn;
use super::Extracted;

/// Exact comparison of normalised nine-digit SSNs. No fuzziness.
pub fn match_ssn(declared: &Ssn, extracted: &Extracted<Ssn>) -> FieldComparison<MaskedSsn> {
    let found = match extracted.present_or_gap() {
        Ok(found) => found,
        Err(gap) => return gap,
    };

    if declared == found {
        return FieldComparison::matched("exact match", found.masked());
    }

    let differing: Vec<usize> = declared
        .digits()
        .bytes()
        .zip(found.digits().bytes())
        .enumerate()
        .filter(|(_, (left, right))| left != right)
        .map(|(index, _)| index + 1)
        .collect();
    let first = differing.first().copied().unwrap_or_default();

    FieldComparison::mismatched(
        format!(
            "digits differ at position {first} ({} of 9 digits differ)",
            differing.len()
        ),
        found.masked(),
    )
}
