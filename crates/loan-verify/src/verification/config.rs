use serde::{Deserialize, Serialize};

/// How an absent or unparsable extracted SSN weighs on the overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Absence is not evidence of a mismatch; the run can at best be partial.
    #[default]
    Inconclusive,
    /// Absence fails the run exactly like an explicit mismatch.
    Disqualifying,
}

impl MissingFieldPolicy {
    pub const fn label(self) -> &'static str {
        match self {
            MissingFieldPolicy::Inconclusive => "inconclusive",
            MissingFieldPolicy::Disqualifying => "disqualifying",
        }
    }
}

/// Tunables for one verification engine. Passed explicitly, never read from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Allowed relative deviation between declared and annualized salary.
    pub salary_tolerance: f64,
    /// Minimum figure treated as already annual when the pay period is unknown.
    pub annual_plausibility_floor: f64,
    pub missing_ssn: MissingFieldPolicy,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            salary_tolerance: 0.10,
            annual_plausibility_floor: 15_000.0,
            missing_ssn: MissingFieldPolicy::Inconclusive,
        }
    }
}
