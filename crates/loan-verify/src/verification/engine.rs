use serde::Serialize;
use tracing::debug;

use super::annualizer::{annualize, AnnualSalary};
use super::config::VerificationConfig;
use super::domain::{
    Application, ApplicationId, ExtractedData, FieldComparison, FieldKind, MaskedSsn,
    VerificationReport,
};
use super::matching::{match_employer, match_name, match_salary, match_ssn, Extracted};
use super::normalizer::{
    normalize_amount, normalize_employer, normalize_name, normalize_pay_period, normalize_ssn,
    EmployerName, NormalizationFailure, PayPeriod, PersonName, Ssn,
};
use super::policy::aggregate_status;
use super::stream::LiveVerification;

/// Raised when the declared side cannot be compared at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("application {application_id} has invalid declared {field}: {failure}")]
    InvalidApplication {
        application_id: ApplicationId,
        field: &'static str,
        failure: NormalizationFailure,
    },
}

/// Stateless engine comparing declared application data against OCR output.
#[derive(Debug, Clone, Default)]
pub struct VerificationEngine {
    config: VerificationConfig,
}

impl VerificationEngine {
    pub fn new(config: VerificationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Check that declared data normalises; used at intake so bad records never reach `verify`.
    pub fn validate(&self, application: &Application) -> Result<(), VerificationError> {
        DeclaredFields::from_application(application).map(|_| ())
    }

    /// Run every stage to completion. Fails only when the declared data is invalid.
    pub fn verify(
        &self,
        application: &Application,
        extracted: &ExtractedData,
    ) -> Result<VerificationReport, VerificationError> {
        let declared = DeclaredFields::from_application(application)?;
        let normalized = NormalizedExtraction::from_extracted(extracted, &self.config);

        let name = match_name(&declared.name, &normalized.name);
        let salary = match_salary(
            declared.annual_salary,
            &normalized.salary,
            self.config.salary_tolerance,
        );
        let employer = match_employer(&declared.employer, &normalized.employer);
        let ssn = match_ssn(&declared.ssn, &normalized.ssn);

        let report = assemble_report(name, salary, employer, ssn, extracted, &self.config);
        debug!(
            application_id = %application.id,
            status = report.overall_status.label(),
            matched = report.matched_fields(),
            "verification completed"
        );
        Ok(report)
    }

    /// Staged variant of [`verify`](Self::verify) yielding one event per stage.
    pub fn live(
        &self,
        application: &Application,
        extracted: ExtractedData,
    ) -> Result<LiveVerification, VerificationError> {
        let declared = DeclaredFields::from_application(application)?;
        Ok(LiveVerification::new(
            self.config.clone(),
            application.id.clone(),
            declared,
            extracted,
        ))
    }
}

/// Declared values after normalisation. Construction validates the application.
#[derive(Debug, Clone)]
pub(crate) struct DeclaredFields {
    pub(crate) name: PersonName,
    pub(crate) annual_salary: u64,
    pub(crate) employer: EmployerName,
    pub(crate) ssn: Ssn,
}

impl DeclaredFields {
    pub(crate) fn from_application(application: &Application) -> Result<Self, VerificationError> {
        let invalid = |field: &'static str| {
            let application_id = application.id.clone();
            move |failure| VerificationError::InvalidApplication {
                application_id,
                field,
                failure,
            }
        };

        Ok(Self {
            name: normalize_name(&application.name).map_err(invalid("name"))?,
            annual_salary: application.annual_salary,
            employer: normalize_employer(&application.employer_name)
                .map_err(invalid("employer_name"))?,
            ssn: normalize_ssn(&application.ssn).map_err(invalid("ssn"))?,
        })
    }
}

/// Extracted values after normalisation and salary annualization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedExtraction {
    pub name: Extracted<PersonName>,
    pub salary: Extracted<AnnualSalary>,
    pub employer: Extracted<EmployerName>,
    pub ssn: Extracted<Ssn>,
    pub pay_period: Option<PayPeriod>,
}

impl NormalizedExtraction {
    pub fn from_extracted(data: &ExtractedData, config: &VerificationConfig) -> Self {
        let pay_period = data.get(FieldKind::PayPeriod).map(normalize_pay_period);
        let period = pay_period.unwrap_or(PayPeriod::Unknown);

        let salary = data.get(FieldKind::PayAmount).map(|raw| {
            normalize_amount(raw)
                .map(|amount| annualize(amount, period, config.annual_plausibility_floor))
        });

        Self {
            name: Extracted::from_result(data.get(FieldKind::Name).map(normalize_name)),
            salary: Extracted::from_result(salary),
            employer: Extracted::from_result(
                data.get(FieldKind::EmployerName).map(normalize_employer),
            ),
            ssn: Extracted::from_result(data.get(FieldKind::Ssn).map(normalize_ssn)),
            pay_period,
        }
    }

    /// Per-field outcome of normalisation, in [`FieldKind::ALL`] order.
    pub fn diagnostics(&self) -> Vec<FieldDiagnostic> {
        FieldKind::ALL
            .iter()
            .map(|kind| {
                let (status, detail) = match kind {
                    FieldKind::Name => describe(&self.name, |name| name.display().to_string()),
                    FieldKind::PayAmount => describe(&self.salary, |salary| salary.basis.clone()),
                    FieldKind::PayPeriod => match self.pay_period {
                        Some(period) => ("parsed", Some(period.label().to_string())),
                        None => ("missing", None),
                    },
                    FieldKind::EmployerName => {
                        describe(&self.employer, |employer| employer.canonical())
                    }
                    FieldKind::Ssn => describe(&self.ssn, |ssn| ssn.masked().to_string()),
                };
                FieldDiagnostic {
                    field: *kind,
                    status,
                    detail,
                }
            })
            .collect()
    }
}

fn describe<T>(
    value: &Extracted<T>,
    detail: impl FnOnce(&T) -> String,
) -> (&'static str, Option<String>) {
    let text = match value {
        Extracted::Present(inner) => Some(detail(inner)),
        Extracted::Unparsable(failure) => Some(failure.to_string()),
        Extracted::Missing => None,
    };
    (value.status_label(), text)
}

/// Normalisation outcome for one raw field, reported by the live stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiagnostic {
    pub field: FieldKind,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub(crate) fn assemble_report(
    name: FieldComparison<String>,
    salary: FieldComparison<AnnualSalary>,
    employer: FieldComparison<String>,
    ssn: FieldComparison<MaskedSsn>,
    extracted: &ExtractedData,
    config: &VerificationConfig,
) -> VerificationReport {
    let overall_status = aggregate_status(
        name.outcome,
        salary.outcome,
        employer.outcome,
        ssn.outcome,
        config.missing_ssn,
    );

    VerificationReport {
        name,
        salary,
        employer,
        ssn,
        overall_status,
        extracted_data: extracted.redacted(),
    }
}
