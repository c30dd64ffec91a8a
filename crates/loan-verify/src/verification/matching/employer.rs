use super::super::domain::FieldComparison;
use super::super::normalizer::EmployerName;
use super::Extracted;

/// Case-insensitive employer comparison that ignores legal suffixes present on
/// one side only and accepts either canonical name appearing inside the other.
pub fn match_employer(
    declared: &EmployerName,
    extracted: &Extracted<EmployerName>,
) -> FieldComparison<String> {
    let found = match extracted.present_or_gap() {
        Ok(found) => found,
        Err(gap) => return gap,
    };
    let value = found.display().to_string();
    let left = declared.canonical();
    let right = found.canonical();

    if left == right {
        return FieldComparison::matched(format!("'{left}' equals '{right}'"), value);
    }

    if left.contains(right.as_str()) || right.contains(left.as_str()) {
        return FieldComparison::matched(format!("'{left}' and '{right}' overlap"), value);
    }

    FieldComparison::mismatched(format!("'{left}' differs from '{right}'"), value)
}
