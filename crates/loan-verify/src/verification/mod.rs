//! Document verification for loan applications.
//!
//! Declared application data is compared against OCR output for an uploaded
//! pay stub. Raw values pass through the normalizer and annualizer before the
//! per-field matchers run; the policy module folds the four outcomes into an
//! overall status. [`VerificationEngine`] is pure and synchronous, while
//! [`VerificationService`] wires it to the storage and extraction
//! collaborators and [`verification_router`] exposes it over HTTP.

pub mod annualizer;
pub mod config;
pub mod domain;
pub mod engine;
pub mod matching;
pub mod normalizer;
pub(crate) mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod stream;

#[cfg(test)]
mod tests;

pub use annualizer::{annualize, AnnualSalary, AnnualizationConfidence};
pub use config::{MissingFieldPolicy, VerificationConfig};
pub use domain::{
    Application, ApplicationId, ApplicationSubmission, ApplicationView, ComparisonOutcome,
    Document, DocumentId, DocumentKind, DocumentUpload, ExtractedData, FieldComparison, FieldKind,
    MaskedSsn, OverallStatus, VerificationId, VerificationReport, VerificationResult,
    VerifiedField,
};
pub use engine::{FieldDiagnostic, NormalizedExtraction, VerificationEngine, VerificationError};
pub use normalizer::{NormalizationFailure, PayPeriod};
pub use repository::{
    ApplicationRepository, ExtractionError, OcrExtractor, RepositoryError, VerificationStore,
};
pub use router::verification_router;
pub use service::{
    LiveRun, ServiceError, VerificationService, VerificationStatusView, VerificationSummary,
};
pub use stream::{LiveVerification, VerificationEvent};
