use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::annualizer::AnnualSalary;

/// Identifier wrapper for submitted loan applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for uploaded financial documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Identifier wrapper for persisted verification runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerificationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applicant-declared data as received from the intake form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    #[serde(default)]
    pub owner_id: String,
    pub name: String,
    pub annual_salary: u64,
    pub employer_name: String,
    pub ssn: String,
}

/// Declared truth a document is verified against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: ApplicationId,
    pub owner_id: String,
    pub name: String,
    pub annual_salary: u64,
    pub employer_name: String,
    pub ssn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn from_submission(
        id: ApplicationId,
        submission: ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id: submission.owner_id,
            name: submission.name,
            annual_salary: submission.annual_salary,
            employer_name: submission.employer_name,
            ssn: submission.ssn,
            created_at: now,
            updated_at: now,
        }
    }

    /// Outbound representation with the SSN reduced to its last four digits.
    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            name: self.name.clone(),
            annual_salary: self.annual_salary,
            employer_name: self.employer_name.clone(),
            ssn: MaskedSsn::from_raw(&self.ssn),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub owner_id: String,
    pub name: String,
    pub annual_salary: u64,
    pub employer_name: String,
    pub ssn: MaskedSsn,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    PayStub,
    IncomeStatement,
}

/// Metadata submitted when a file has already been placed in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub file_name: String,
    pub storage_url: String,
    #[serde(default)]
    pub document_type: DocumentKind,
}

/// Stored reference to an uploaded financial document. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub application_id: ApplicationId,
    pub file_name: String,
    pub storage_url: String,
    pub content_type: String,
    pub document_type: DocumentKind,
    pub uploaded_at: DateTime<Utc>,
}

/// Discriminator for every raw value the OCR extractor may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Name,
    PayAmount,
    PayPeriod,
    EmployerName,
    Ssn,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Name,
        FieldKind::PayAmount,
        FieldKind::PayPeriod,
        FieldKind::EmployerName,
        FieldKind::Ssn,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::PayAmount => "pay_amount",
            FieldKind::PayPeriod => "pay_period",
            FieldKind::EmployerName => "employer_name",
            FieldKind::Ssn => "ssn",
        }
    }
}

const NULL_INDICATORS: [&str; 8] = [
    "",
    "null",
    "none",
    "n/a",
    "na",
    "not available",
    "unknown",
    "tbd",
];

/// OCR output for one document: raw strings keyed by field kind, any of which may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedData {
    fields: BTreeMap<FieldKind, String>,
}

impl ExtractedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: FieldKind, value: impl Into<String>) -> Self {
        self.insert(kind, value);
        self
    }

    /// Store a raw value; null indicators such as "N/A" are treated as absent.
    pub fn insert(&mut self, kind: FieldKind, value: impl Into<String>) {
        let value = value.into();
        if is_null_indicator(&value) {
            self.fields.remove(&kind);
        } else {
            self.fields.insert(kind, value);
        }
    }

    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        self.fields.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn present_fields(&self) -> Vec<FieldKind> {
        self.fields.keys().copied().collect()
    }

    /// Adapt the loosely-shaped JSON emitted by the OCR model.
    ///
    /// Recognised keys: `employee_name`/`name`, `company_name`/`employer_name`,
    /// `gross_pay`/`pay_amount` (falling back to `net_pay`, then to a direct
    /// `annual_salary` figure), `pay_period` and `ssn`. Numbers and strings are
    /// both accepted; anything else is ignored.
    pub fn from_ocr_value(value: &Value) -> Self {
        let mut data = Self::new();
        let Some(object) = value.as_object() else {
            return data;
        };

        let pick = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .filter_map(|key| object.get(*key))
                .filter_map(scalar_text)
                .find(|text| !is_null_indicator(text))
        };

        if let Some(name) = pick(&["employee_name", "name"]) {
            data.insert(FieldKind::Name, name);
        }
        if let Some(employer) = pick(&["company_name", "employer_name", "employer"]) {
            data.insert(FieldKind::EmployerName, employer);
        }
        if let Some(ssn) = pick(&["ssn"]) {
            data.insert(FieldKind::Ssn, ssn);
        }

        if let Some(amount) = pick(&["gross_pay", "pay_amount", "net_pay"]) {
            data.insert(FieldKind::PayAmount, amount);
            if let Some(period) = pick(&["pay_period", "pay_frequency"]) {
                data.insert(FieldKind::PayPeriod, period);
            }
        } else if let Some(annual) = pick(&["annual_salary"]) {
            data.insert(FieldKind::PayAmount, annual);
            data.insert(FieldKind::PayPeriod, "annual");
        }

        data
    }

    /// Copy suitable for persistence: the SSN keeps only its last four digits.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(raw) = self.fields.get(&FieldKind::Ssn) {
            copy.fields
                .insert(FieldKind::Ssn, MaskedSsn::from_raw(raw).to_string());
        }
        copy
    }
}

fn is_null_indicator(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    NULL_INDICATORS.contains(&lowered.as_str())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// SSN representation exposing at most the last four digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskedSsn(String);

impl MaskedSsn {
    pub fn from_raw(raw: &str) -> Self {
        let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
        let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        Self(format!("***-**-{tail}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaskedSsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four attributes compared for every verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedField {
    Name,
    Salary,
    Employer,
    Ssn,
}

impl VerifiedField {
    pub const fn label(self) -> &'static str {
        match self {
            VerifiedField::Name => "name",
            VerifiedField::Salary => "salary",
            VerifiedField::Employer => "employer",
            VerifiedField::Ssn => "ssn",
        }
    }
}

/// How a comparison resolved. `Inconclusive` covers absent or unparsable extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Match,
    Mismatch,
    Inconclusive,
}

/// Verdict for one verified field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison<T> {
    pub matched: bool,
    pub outcome: ComparisonOutcome,
    pub reason: String,
    pub extracted_value: Option<T>,
}

impl<T> FieldComparison<T> {
    pub fn matched(reason: impl Into<String>, extracted_value: T) -> Self {
        Self {
            matched: true,
            outcome: ComparisonOutcome::Match,
            reason: reason.into(),
            extracted_value: Some(extracted_value),
        }
    }

    pub fn mismatched(reason: impl Into<String>, extracted_value: T) -> Self {
        Self {
            matched: false,
            outcome: ComparisonOutcome::Mismatch,
            reason: reason.into(),
            extracted_value: Some(extracted_value),
        }
    }

    pub fn inconclusive(reason: impl Into<String>, extracted_value: Option<T>) -> Self {
        Self {
            matched: false,
            outcome: ComparisonOutcome::Inconclusive,
            reason: reason.into(),
            extracted_value,
        }
    }
}

/// Aggregate verdict across the four field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Verified,
    Partial,
    Failed,
}

impl OverallStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OverallStatus::Verified => "verified",
            OverallStatus::Partial => "partial",
            OverallStatus::Failed => "failed",
        }
    }
}

/// Output of one engine run before it is bound to a document and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub name: FieldComparison<String>,
    pub salary: FieldComparison<AnnualSalary>,
    pub employer: FieldComparison<String>,
    pub ssn: FieldComparison<MaskedSsn>,
    pub overall_status: OverallStatus,
    pub extracted_data: ExtractedData,
}

impl VerificationReport {
    pub const TOTAL_FIELDS: usize = 4;

    pub fn outcomes(&self) -> [(VerifiedField, ComparisonOutcome); 4] {
        [
            (VerifiedField::Name, self.name.outcome),
            (VerifiedField::Salary, self.salary.outcome),
            (VerifiedField::Employer, self.employer.outcome),
            (VerifiedField::Ssn, self.ssn.outcome),
        ]
    }

    pub fn matched_fields(&self) -> usize {
        self.outcomes()
            .iter()
            .filter(|(_, outcome)| *outcome == ComparisonOutcome::Match)
            .count()
    }

    pub fn unmatched_fields(&self) -> Vec<VerifiedField> {
        self.outcomes()
            .iter()
            .filter(|(_, outcome)| *outcome != ComparisonOutcome::Match)
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn summary(&self) -> String {
        let unmatched = self.unmatched_fields();
        if unmatched.is_empty() {
            return format!("all {} fields match", Self::TOTAL_FIELDS);
        }

        let labels: Vec<&str> = unmatched.iter().map(|field| field.label()).collect();
        format!(
            "{}: {}/{} fields match, unmatched {}",
            self.overall_status.label(),
            self.matched_fields(),
            Self::TOTAL_FIELDS,
            labels.join(", ")
        )
    }

    pub fn into_result(
        self,
        id: VerificationId,
        application_id: ApplicationId,
        document_id: DocumentId,
        now: DateTime<Utc>,
    ) -> VerificationResult {
        VerificationResult {
            id,
            application_id,
            document_id,
            report: self,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persisted record of one verification run. Superseded, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub id: VerificationId,
    pub application_id: ApplicationId,
    pub document_id: DocumentId,
    #[serde(flatten)]
    pub report: VerificationReport,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
