use super::config::MissingFieldPolicy;
use super::domain::{ComparisonOutcome, OverallStatus};

/// Fold the four field outcomes into the overall verdict.
///
/// An SSN mismatch fails the run regardless of the other fields; an absent or
/// unparsable SSN fails it only under [`MissingFieldPolicy::Disqualifying`].
/// Otherwise all four matching yields `Verified` and anything else `Partial`.
pub fn aggregate_status(
    name: ComparisonOutcome,
    salary: ComparisonOutcome,
    employer: ComparisonOutcome,
    ssn: ComparisonOutcome,
    missing_ssn: MissingFieldPolicy,
) -> OverallStatus {
    match (ssn, missing_ssn) {
        (ComparisonOutcome::Mismatch, _) => return OverallStatus::Failed,
        (ComparisonOutcome::Inconclusive, MissingFieldPolicy::Disqualifying) => {
            return OverallStatus::Failed
        }
        _ => {}
    }

    let all_match = [name, salary, employer, ssn]
        .iter()
        .all(|outcome| *outcome == ComparisonOutcome::Match);
    if all_match {
        OverallStatus::Verified
    } else {
        OverallStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(matched: bool) -> ComparisonOutcome {
        if matched {
            ComparisonOutcome::Match
        } else {
            ComparisonOutcome::Mismatch
        }
    }

    #[test]
    fn precedence_holds_for_every_match_combination() {
        for mask in 0u8..16 {
            let name = mask & 0b0001 != 0;
            let salary = mask & 0b0010 != 0;
            let employer = mask & 0b0100 != 0;
            let ssn = mask & 0b1000 != 0;

            let status = aggregate_status(
                outcome(name),
                outcome(salary),
                outcome(employer),
                outcome(ssn),
                MissingFieldPolicy::Inconclusive,
            );

            let expected = if !ssn {
                OverallStatus::Failed
            } else if name && salary && employer {
                OverallStatus::Verified
            } else {
                OverallStatus::Partial
            };
            assert_eq!(status, expected, "mask {mask:04b}");
        }
    }

    #[test]
    fn inconclusive_ssn_is_partial_by_default() {
        let status = aggregate_status(
            ComparisonOutcome::Match,
            ComparisonOutcome::Match,
            ComparisonOutcome::Match,
            ComparisonOutcome::Inconclusive,
            MissingFieldPolicy::Inconclusive,
        );
        assert_eq!(status, OverallStatus::Partial);
    }

    #[test]
    fn inconclusive_ssn_fails_when_disqualifying() {
        let status = aggregate_status(
            ComparisonOutcome::Match,
            ComparisonOutcome::Match,
            ComparisonOutcome::Match,
            ComparisonOutcome::Inconclusive,
            MissingFieldPolicy::Disqualifying,
        );
        assert_eq!(status, OverallStatus::Failed);
    }

    #[test]
    fn inconclusive_non_identity_fields_never_fail() {
        let status = aggregate_status(
            ComparisonOutcome::Inconclusive,
            ComparisonOutcome::Inconclusive,
            ComparisonOutcome::Inconclusive,
            ComparisonOutcome::Match,
            MissingFieldPolicy::Disqualifying,
        );
        assert_eq!(status, OverallStatus::Partial);
    }
}
