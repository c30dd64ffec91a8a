use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::config::VerificationConfig;
use super::domain::{
    Application, ApplicationId, ApplicationSubmission, Document, DocumentId, DocumentUpload,
    OverallStatus, VerificationId, VerificationReport, VerificationResult,
};
use super::engine::{VerificationEngine, VerificationError};
use super::repository::{
    ApplicationRepository, ExtractionError, OcrExtractor, RepositoryError, VerificationStore,
};
use super::stream::LiveVerification;

/// Service composing the application repository, result store, OCR adapter and engine.
pub struct VerificationService<R, V, O> {
    repository: Arc<R>,
    results: Arc<V>,
    extractor: Arc<O>,
    engine: Arc<VerificationEngine>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static VERIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

fn next_verification_id() -> VerificationId {
    let id = VERIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VerificationId(format!("ver-{id:06}"))
}

const ACCEPTED_CONTENT_TYPES: [mime::Mime; 3] =
    [mime::APPLICATION_PDF, mime::IMAGE_PNG, mime::IMAGE_JPEG];

/// A staged run ready to be driven by a streaming transport.
pub struct LiveRun {
    pub application_id: ApplicationId,
    pub document_id: DocumentId,
    pub events: LiveVerification,
}

impl<R, V, O> VerificationService<R, V, O>
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    pub fn new(
        repository: Arc<R>,
        results: Arc<V>,
        extractor: Arc<O>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            repository,
            results,
            extractor,
            engine: Arc::new(VerificationEngine::new(config)),
        }
    }

    pub fn engine(&self) -> &VerificationEngine {
        &self.engine
    }

    /// Validate and store a new application.
    pub fn submit_application(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Application, ServiceError> {
        let application = Application::from_submission(next_application_id(), submission, Utc::now());
        self.engine.validate(&application)?;

        let stored = self.repository.insert_application(application)?;
        info!(application_id = %stored.id, "application submitted");
        Ok(stored)
    }

    /// Replace the declared data. Rejected once any verification result exists.
    pub fn update_application(
        &self,
        application_id: &ApplicationId,
        submission: ApplicationSubmission,
    ) -> Result<Application, ServiceError> {
        let existing = self.get_application(application_id)?;
        if self.results.has_any(application_id)? {
            warn!(application_id = %application_id, "update rejected after verification");
            return Err(ServiceError::Locked(application_id.clone()));
        }

        let mut updated =
            Application::from_submission(existing.id.clone(), submission, existing.created_at);
        updated.updated_at = Utc::now();
        self.engine.validate(&updated)?;

        self.repository.update_application(updated.clone())?;
        info!(application_id = %application_id, "application updated");
        Ok(updated)
    }

    pub fn get_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ServiceError> {
        self.repository
            .fetch_application(application_id)?
            .ok_or_else(|| ServiceError::ApplicationNotFound(application_id.clone()))
    }

    /// Attach an already-stored file to an application. Only PDF, PNG and JPEG are accepted.
    pub fn register_document(
        &self,
        application_id: &ApplicationId,
        upload: DocumentUpload,
    ) -> Result<Document, ServiceError> {
        self.get_application(application_id)?;

        let file_name = upload.file_name.trim();
        if file_name.is_empty() || upload.storage_url.trim().is_empty() {
            return Err(ServiceError::InvalidDocument(
                "file_name and storage_url are required".to_string(),
            ));
        }

        let content_type = mime_guess::from_path(file_name).first_or_octet_stream();
        if !ACCEPTED_CONTENT_TYPES.contains(&content_type) {
            return Err(ServiceError::UnsupportedDocument {
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
            });
        }

        let document = Document {
            id: next_document_id(),
            application_id: application_id.clone(),
            file_name: file_name.to_string(),
            storage_url: upload.storage_url.trim().to_string(),
            content_type: content_type.to_string(),
            document_type: upload.document_type,
            uploaded_at: Utc::now(),
        };

        let stored = self.repository.insert_document(document)?;
        info!(
            application_id = %application_id,
            document_id = %stored.id,
            content_type = %stored.content_type,
            "document registered"
        );
        Ok(stored)
    }

    /// Documents registered for an application, oldest first.
    pub fn documents(&self, application_id: &ApplicationId) -> Result<Vec<Document>, ServiceError> {
        self.get_application(application_id)?;
        Ok(self.repository.documents_for_application(application_id)?)
    }

    pub fn get_document(&self, document_id: &DocumentId) -> Result<Document, ServiceError> {
        self.repository
            .fetch_document(document_id)?
            .ok_or_else(|| ServiceError::DocumentNotFound(document_id.clone()))
    }

    /// Delete a document together with every verification result bound to it.
    pub fn delete_document(&self, document_id: &DocumentId) -> Result<usize, ServiceError> {
        self.get_document(document_id)?;

        let removed = self.results.delete_for_document(document_id)?;
        self.repository.delete_document(document_id)?;
        info!(document_id = %document_id, removed_results = removed, "document deleted");
        Ok(removed)
    }

    /// Extract, verify and persist. Without a document id the latest upload is used.
    pub fn verify_document(
        &self,
        application_id: &ApplicationId,
        document_id: Option<&DocumentId>,
    ) -> Result<VerificationResult, ServiceError> {
        let (application, document) = self.resolve_target(application_id, document_id)?;
        let extracted = self.extractor.extract(&document)?;
        let report = self.engine.verify(&application, &extracted)?;
        self.record_report(&application.id, &document.id, report)
    }

    /// Extract up front and hand back the staged engine run. Nothing is stored
    /// until the caller passes the final report to [`record_report`](Self::record_report).
    pub fn live_verification(
        &self,
        application_id: &ApplicationId,
        document_id: Option<&DocumentId>,
    ) -> Result<LiveRun, ServiceError> {
        let (application, document) = self.resolve_target(application_id, document_id)?;
        let extracted = self.extractor.extract(&document)?;
        let events = self.engine.live(&application, extracted)?;
        info!(
            application_id = %application.id,
            document_id = %document.id,
            "live verification started"
        );
        Ok(LiveRun {
            application_id: application.id,
            document_id: document.id,
            events,
        })
    }

    pub fn record_report(
        &self,
        application_id: &ApplicationId,
        document_id: &DocumentId,
        report: VerificationReport,
    ) -> Result<VerificationResult, ServiceError> {
        let result = report.into_result(
            next_verification_id(),
            application_id.clone(),
            document_id.clone(),
            Utc::now(),
        );
        let stored = self.results.record(result)?;
        info!(
            application_id = %application_id,
            document_id = %document_id,
            verification_id = %stored.id,
            status = stored.report.overall_status.label(),
            "verification recorded"
        );
        Ok(stored)
    }

    /// All results for an application, newest first.
    pub fn results(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<VerificationResult>, ServiceError> {
        self.get_application(application_id)?;
        Ok(self.results.for_application(application_id)?)
    }

    pub fn latest_summary(
        &self,
        application_id: &ApplicationId,
    ) -> Result<VerificationSummary, ServiceError> {
        self.get_application(application_id)?;
        let latest = self
            .results
            .latest(application_id)?
            .ok_or_else(|| ServiceError::NoResults(application_id.clone()))?;
        Ok(VerificationSummary::from_result(latest))
    }

    pub fn status(
        &self,
        application_id: &ApplicationId,
    ) -> Result<VerificationStatusView, ServiceError> {
        self.get_application(application_id)?;
        let view = match self.results.latest(application_id)? {
            Some(latest) => VerificationStatusView {
                application_id: application_id.clone(),
                status: latest.report.overall_status.label(),
                message: format!("Verification {}", latest.report.overall_status.label()),
                last_updated: Some(latest.updated_at),
            },
            None => VerificationStatusView {
                application_id: application_id.clone(),
                status: "no_documents",
                message: "No documents uploaded for verification".to_string(),
                last_updated: None,
            },
        };
        Ok(view)
    }

    fn resolve_target(
        &self,
        application_id: &ApplicationId,
        document_id: Option<&DocumentId>,
    ) -> Result<(Application, Document), ServiceError> {
        let application = self.get_application(application_id)?;

        let document = match document_id {
            Some(document_id) => self
                .repository
                .fetch_document(document_id)?
                .filter(|document| &document.application_id == application_id)
                .ok_or_else(|| ServiceError::DocumentNotFound(document_id.clone()))?,
            None => self
                .repository
                .documents_for_application(application_id)?
                .into_iter()
                .last()
                .ok_or_else(|| ServiceError::NoDocuments(application_id.clone()))?,
        };

        Ok((application, document))
    }
}

/// Condensed view of the latest result for an application.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub application_id: ApplicationId,
    pub verification_id: VerificationId,
    pub document_id: DocumentId,
    pub overall_status: OverallStatus,
    pub total_fields: usize,
    pub matched_fields: usize,
    pub mismatched_fields: usize,
    pub summary: String,
    pub verification_details: VerificationReport,
    pub created_at: DateTime<Utc>,
}

impl VerificationSummary {
    pub fn from_result(result: VerificationResult) -> Self {
        let matched_fields = result.report.matched_fields();
        Self {
            application_id: result.application_id,
            verification_id: result.id,
            document_id: result.document_id,
            overall_status: result.report.overall_status,
            total_fields: VerificationReport::TOTAL_FIELDS,
            matched_fields,
            mismatched_fields: VerificationReport::TOTAL_FIELDS - matched_fields,
            summary: result.report.summary(),
            verification_details: result.report,
            created_at: result.created_at,
        }
    }
}

/// Current verification state exposed to polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub message: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Error raised by the verification service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidApplication(#[from] VerificationError),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),
    #[error("application {0} has no documents to verify")]
    NoDocuments(ApplicationId),
    #[error("no verification results for application {0}")]
    NoResults(ApplicationId),
    #[error("application {0} is locked once verification has started")]
    Locked(ApplicationId),
    #[error("unsupported document type {content_type} for {file_name}; expected PDF, PNG or JPEG")]
    UnsupportedDocument {
        file_name: String,
        content_type: String,
    },
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
