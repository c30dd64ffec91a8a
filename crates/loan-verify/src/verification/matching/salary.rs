use super::super::annualizer::{format_money, AnnualSalary};
use super::super::domain::FieldComparison;
use super::Extracted;

const TOLERANCE_EPSILON: f64 = 1e-9;

/// Relative comparison of the declared annual salary against the annualized
/// pay-stub figure: `|declared - extracted| / declared <= tolerance`.
pub fn match_salary(
    declared_annual: u64,
    extracted: &Extracted<AnnualSalary>,
    tolerance: f64,
) -> FieldComparison<AnnualSalary> {
    let salary = match extracted.present_or_gap() {
        Ok(salary) => salary.clone(),
        Err(gap) => return gap,
    };

    if !salary.is_determinate() {
        return FieldComparison::inconclusive(
            format!("could not annualize extracted pay: {}", salary.basis),
            Some(salary),
        );
    }

    let declared = declared_annual as f64;
    if declared_annual == 0 {
        return FieldComparison::mismatched(
            format!(
                "declared salary is $0 but pay stub indicates {} ({}); relative difference undefined",
                format_money(salary.amount),
                salary.basis
            ),
            salary,
        );
    }

    let difference = (declared - salary.amount).abs();
    let ratio = difference / declared;
    let detail = format!(
        "declared {} vs extracted {} ({}): difference {} ({:.1}%)",
        format_money(declared),
        format_money(salary.amount),
        salary.basis,
        format_money(difference),
        ratio * 100.0
    );

    if ratio <= tolerance + TOLERANCE_EPSILON {
        FieldComparison::matched(
            format!("{detail} within {:.1}% tolerance", tolerance * 100.0),
            salary,
        )
    } else {
        FieldComparison::mismatched(
            format!("{detail} exceeds {:.1}% tolerance", tolerance * 100.0),
            salary,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::annualizer::annualize;
    use crate::verification::domain::ComparisonOutcome;
    use crate::verification::normalizer::{NormalizationFailure, PayPeriod};

    fn extracted(amount: f64, period: PayPeriod) -> Extracted<AnnualSalary> {
        Extracted::Present(annualize(amount, period, 15_000.0))
    }

    #[test]
    fn biweekly_pay_within_tolerance_matches() {
        let comparison = match_salary(60_000, &extracted(2_500.0, PayPeriod::Biweekly), 0.10);
        assert!(comparison.matched);
        assert_eq!(
            comparison.reason,
            "declared $60,000 vs extracted $65,000 ($2,500 biweekly x 26): difference $5,000 (8.3%) within 10.0% tolerance"
        );
        let value = comparison.extracted_value.expect("annualized value kept");
        assert_eq!(value.amount, 65_000.0);
    }

    #[test]
    fn deviation_beyond_tolerance_mismatches() {
        let comparison = match_salary(90_000, &extracted(5_000.0, PayPeriod::Monthly), 0.10);
        assert!(!comparison.matched);
        assert_eq!(comparison.outcome, ComparisonOutcome::Mismatch);
        assert!(comparison.reason.contains("(33.3%)"));
        assert!(comparison.reason.ends_with("exceeds 10.0% tolerance"));
    }

    #[test]
    fn exact_tolerance_boundary_matches() {
        let comparison = match_salary(100_000, &extracted(110_000.0, PayPeriod::Annual), 0.10);
        assert!(comparison.matched);
    }

    #[test]
    fn indeterminate_annualization_is_inconclusive() {
        let comparison = match_salary(60_000, &extracted(2_500.0, PayPeriod::Unknown), 0.10);
        assert!(!comparison.matched);
        assert_eq!(comparison.outcome, ComparisonOutcome::Inconclusive);
        assert!(comparison.reason.starts_with("could not annualize extracted pay"));
        assert!(comparison.extracted_value.is_some());
    }

    #[test]
    fn unparsable_amount_is_reported() {
        let comparison = match_salary(
            60_000,
            &Extracted::Unparsable(NormalizationFailure::MalformedAmount {
                raw: "two grand".to_string(),
            }),
            0.10,
        );
        assert!(!comparison.matched);
        assert!(comparison.reason.starts_with("could not parse extracted value"));
    }

    #[test]
    fn zero_declared_salary_never_matches() {
        let comparison = match_salary(0, &extracted(1_000.0, PayPeriod::Monthly), 0.10);
        assert!(!comparison.matched);
        assert!(comparison.reason.contains("relative difference undefined"));
    }
}
