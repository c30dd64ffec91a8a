use super::domain::{
    Application, ApplicationId, Document, DocumentId, ExtractedData, VerificationResult,
};

/// Storage for applicant-declared data and the documents attached to it.
pub trait ApplicationRepository: Send + Sync {
    fn insert_application(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;

    fn insert_document(&self, document: Document) -> Result<Document, RepositoryError>;
    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError>;
    /// Documents for one application, oldest upload first.
    fn documents_for_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<Document>, RepositoryError>;
    fn delete_document(&self, id: &DocumentId) -> Result<(), RepositoryError>;
}

/// Append-only store for verification results.
pub trait VerificationStore: Send + Sync {
    fn record(&self, result: VerificationResult) -> Result<VerificationResult, RepositoryError>;
    /// Every result for the application, newest first.
    fn for_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<VerificationResult>, RepositoryError>;
    fn latest(&self, id: &ApplicationId) -> Result<Option<VerificationResult>, RepositoryError>;
    /// Remove results bound to a document, returning how many were dropped.
    fn delete_for_document(&self, id: &DocumentId) -> Result<usize, RepositoryError>;
    fn has_any(&self, id: &ApplicationId) -> Result<bool, RepositoryError>;
}

/// Adapter around the external OCR model.
pub trait OcrExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<ExtractedData, ExtractionError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Extraction failures surfaced by the OCR adapter.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no extraction available for document {0}")]
    NotReady(DocumentId),
    #[error("extractor unavailable: {0}")]
    Unavailable(String),
}
