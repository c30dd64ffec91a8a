use super::super::domain::FieldComparison;
use super::super::normalizer::PersonName;
use super::{format_token_set, Extracted};

/// Case-insensitive, whitespace-normalised name comparison. Token subsets are
/// accepted so an omitted middle name or suffix still matches.
pub fn match_name(
    declared: &PersonName,
    extracted: &Extracted<PersonName>,
) -> FieldComparison<String> {
    let found = match extracted.present_or_gap() {
        Ok(found) => found,
        Err(gap) => return gap,
    };
    let value = found.display().to_string();

    if declared.folded() == found.folded() {
        return FieldComparison::matched(
            format!("exact match (case-insensitive): '{}'", found.folded()),
            value,
        );
    }

    let declared_tokens = declared.tokens();
    let found_tokens = found.tokens();

    if declared_tokens == found_tokens {
        return FieldComparison::matched(
            format!("token sets equal: {}", format_token_set(found_tokens)),
            value,
        );
    }

    let (smaller, larger) = if declared_tokens.len() <= found_tokens.len() {
        (declared_tokens, found_tokens)
    } else {
        (found_tokens, declared_tokens)
    };
    if smaller.is_subset(larger) {
        return FieldComparison::matched(
            format!(
                "token subset: {} contained in {}",
                format_token_set(smaller),
                format_token_set(larger)
            ),
            value,
        );
    }

    FieldComparison::mismatched(
        format!(
            "token sets differ: {} vs {}",
            format_token_set(declared_tokens),
            format_token_set(found_tokens)
        ),
        value,
    )
}
