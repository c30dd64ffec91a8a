//! Staged execution of the verification pipeline.
//!
//! [`LiveVerification`] is a finite, non-restartable iterator. Each call to
//! `next` performs exactly one stage and reports it; dropping the iterator
//! discards the remaining work. Stages always run in this order:
//! extraction received, normalisation, name, salary, employer, SSN, completed.

use std::iter::FusedIterator;
use std::mem;

use serde::Serialize;
use tracing::debug;

use super::annualizer::AnnualSalary;
use super::config::VerificationConfig;
use super::domain::{
    ApplicationId, ComparisonOutcome, ExtractedData, FieldComparison, FieldKind, MaskedSsn,
    VerificationReport, VerifiedField,
};
use super::engine::{assemble_report, DeclaredFields, FieldDiagnostic, NormalizedExtraction};
use super::matching::{match_employer, match_name, match_salary, match_ssn};

/// Progress notification for one completed stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum VerificationEvent {
    ExtractionReceived {
        fields_present: Vec<FieldKind>,
    },
    NormalizationComplete {
        fields: Vec<FieldDiagnostic>,
    },
    FieldCompared {
        field: VerifiedField,
        matched: bool,
        outcome: ComparisonOutcome,
        reason: String,
    },
    Completed {
        report: Box<VerificationReport>,
    },
}

impl VerificationEvent {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationEvent::ExtractionReceived { .. } => "extraction_received",
            VerificationEvent::NormalizationComplete { .. } => "normalization_complete",
            VerificationEvent::FieldCompared { field, .. } => match field {
                VerifiedField::Name => "name_compared",
                VerifiedField::Salary => "salary_compared",
                VerifiedField::Employer => "employer_compared",
                VerifiedField::Ssn => "ssn_compared",
            },
            VerificationEvent::Completed { .. } => "completed",
        }
    }

    /// Percentage of the pipeline finished once this event is emitted.
    pub fn progress(&self) -> u8 {
        match self {
            VerificationEvent::ExtractionReceived { .. } => 15,
            VerificationEvent::NormalizationComplete { .. } => 30,
            VerificationEvent::FieldCompared { field, .. } => match field {
                VerifiedField::Name => 45,
                VerifiedField::Salary => 60,
                VerifiedField::Employer => 75,
                VerifiedField::Ssn => 90,
            },
            VerificationEvent::Completed { .. } => 100,
        }
    }

    pub fn message(&self) -> String {
        match self {
            VerificationEvent::ExtractionReceived { fields_present } => {
                format!("extraction received with {} field(s)", fields_present.len())
            }
            VerificationEvent::NormalizationComplete { fields } => {
                let parsed = fields.iter().filter(|field| field.status == "parsed").count();
                format!("normalized {parsed}/{} extracted field(s)", fields.len())
            }
            VerificationEvent::FieldCompared { field, reason, .. } => {
                format!("{} compared: {reason}", field.label())
            }
            VerificationEvent::Completed { report } => {
                format!("verification {}", report.overall_status.label())
            }
        }
    }

    fn compared<T>(field: VerifiedField, comparison: &FieldComparison<T>) -> Self {
        VerificationEvent::FieldCompared {
            field,
            matched: comparison.matched,
            outcome: comparison.outcome,
            reason: comparison.reason.clone(),
        }
    }
}

enum Stage {
    Received,
    Normalize,
    CompareName(NormalizedExtraction),
    CompareSalary(NormalizedExtraction, FieldComparison<String>),
    CompareEmployer(
        NormalizedExtraction,
        FieldComparison<String>,
        FieldComparison<AnnualSalary>,
    ),
    CompareSsn(
        NormalizedExtraction,
        FieldComparison<String>,
        FieldComparison<AnnualSalary>,
        FieldComparison<String>,
    ),
    Aggregate(
        FieldComparison<String>,
        FieldComparison<AnnualSalary>,
        FieldComparison<String>,
        FieldComparison<MaskedSsn>,
    ),
    Done,
}

/// Lazily evaluated verification run. Built by [`VerificationEngine::live`].
///
/// [`VerificationEngine::live`]: super::engine::VerificationEngine::live
pub struct LiveVerification {
    config: VerificationConfig,
    application_id: ApplicationId,
    declared: DeclaredFields,
    extracted: ExtractedData,
    stage: Stage,
}

impl LiveVerification {
    pub(crate) fn new(
        config: VerificationConfig,
        application_id: ApplicationId,
        declared: DeclaredFields,
        extracted: ExtractedData,
    ) -> Self {
        Self {
            config,
            application_id,
            declared,
            extracted,
            stage: Stage::Received,
        }
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    fn advance(&self, stage: Stage) -> Option<(Stage, VerificationEvent)> {
        let step = match stage {
            Stage::Done => return None,
            Stage::Received => (
                Stage::Normalize,
                VerificationEvent::ExtractionReceived {
                    fields_present: self.extracted.present_fields(),
                },
            ),
            Stage::Normalize => {
                let normalized = NormalizedExtraction::from_extracted(&self.extracted, &self.config);
                let event = VerificationEvent::NormalizationComplete {
                    fields: normalized.diagnostics(),
                };
                (Stage::CompareName(normalized), event)
            }
            Stage::CompareName(normalized) => {
                let name = match_name(&self.declared.name, &normalized.name);
                let event = VerificationEvent::compared(VerifiedField::Name, &name);
                (Stage::CompareSalary(normalized, name), event)
            }
            Stage::CompareSalary(normalized, name) => {
                let salary = match_salary(
                    self.declared.annual_salary,
                    &normalized.salary,
                    self.config.salary_tolerance,
                );
                let event = VerificationEvent::compared(VerifiedField::Salary, &salary);
                (Stage::CompareEmployer(normalized, name, salary), event)
            }
            Stage::CompareEmployer(normalized, name, salary) => {
                let employer = match_employer(&self.declared.employer, &normalized.employer);
                let event = VerificationEvent::compared(VerifiedField::Employer, &employer);
                (Stage::CompareSsn(normalized, name, salary, employer), event)
            }
            Stage::CompareSsn(normalized, name, salary, employer) => {
                let ssn = match_ssn(&self.declared.ssn, &normalized.ssn);
                let event = VerificationEvent::compared(VerifiedField::Ssn, &ssn);
                (Stage::Aggregate(name, salary, employer, ssn), event)
            }
            Stage::Aggregate(name, salary, employer, ssn) => {
                let report =
                    assemble_report(name, salary, employer, ssn, &self.extracted, &self.config);
                debug!(
                    application_id = %self.application_id,
                    status = report.overall_status.label(),
                    "live verification completed"
                );
                (
                    Stage::Done,
                    VerificationEvent::Completed {
                        report: Box::new(report),
                    },
                )
            }
        };
        Some(step)
    }
}

impl Iterator for LiveVerification {
    type Item = VerificationEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let stage = mem::replace(&mut self.stage, Stage::Done);
        let (next_stage, event) = self.advance(stage)?;
        self.stage = next_stage;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.stage {
            Stage::Received => 7,
            Stage::Normalize => 6,
            Stage::CompareName(..) => 5,
            Stage::CompareSalary(..) => 4,
            Stage::CompareEmployer(..) => 3,
            Stage::CompareSsn(..) => 2,
            Stage::Aggregate(..) => 1,
            Stage::Done => 0,
        };
        (remaining, Some(remaining))
    }
}

impl FusedIterator for LiveVerification {}

impl ExactSizeIterator for LiveVerification {}
