use serde::{Deserialize, Serialize};

use super::normalizer::PayPeriod;

/// How much the annualized figure can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnualizationConfidence {
    /// Known pay period, fixed multiplier applied.
    Exact,
    /// Unknown pay period, figure already looked annual.
    Assumed,
    /// Zero, out-of-range, or an unknown period with a sub-annual magnitude.
    Indeterminate,
}

/// Pay figure converted to a yearly amount, with the basis for the conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSalary {
    pub amount: f64,
    pub pay_amount: f64,
    pub pay_period: PayPeriod,
    pub confidence: AnnualizationConfidence,
    pub basis: String,
}

impl AnnualSalary {
    pub fn is_determinate(&self) -> bool {
        self.confidence != AnnualizationConfidence::Indeterminate
    }
}

/// Convert a per-period amount to a yearly figure. Never fails; unusable input
/// yields a zero amount with `Indeterminate` confidence.
pub fn annualize(amount: f64, period: PayPeriod, annual_floor: f64) -> AnnualSalary {
    let indeterminate = |basis: String| AnnualSalary {
        amount: 0.0,
        pay_amount: amount,
        pay_period: period,
        confidence: AnnualizationConfidence::Indeterminate,
        basis,
    };

    if !amount.is_finite() || amount < 0.0 {
        return indeterminate(format!("pay amount {amount} is out of range"));
    }
    if amount == 0.0 {
        return indeterminate("pay amount is zero".to_string());
    }

    match period.periods_per_year() {
        Some(periods) => AnnualSalary {
            amount: amount * f64::from(periods),
            pay_amount: amount,
            pay_period: period,
            confidence: AnnualizationConfidence::Exact,
            basis: format!("{} {} x {periods}", format_money(amount), period.label()),
        },
        None if amount >= annual_floor => AnnualSalary {
            amount,
            pay_amount: amount,
            pay_period: period,
            confidence: AnnualizationConfidence::Assumed,
            basis: format!(
                "pay period unknown; {} treated as annual (plausibility floor {})",
                format_money(amount),
                format_money(annual_floor)
            ),
        },
        None => indeterminate(format!(
            "pay period unknown and {} is below the annual plausibility floor {}; no multiplier guessed",
            format_money(amount),
            format_money(annual_floor)
        )),
    }
}

/// `$65,000` for whole amounts, `$2,500.50` otherwise.
pub(crate) fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{fraction:02}")
    }
}
