use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::verification::domain::{
    Application, ApplicationId, ApplicationSubmission, Document, DocumentId, DocumentKind,
    DocumentUpload, ExtractedData, FieldKind, VerificationResult,
};
use crate::verification::repository::{
    ApplicationRepository, ExtractionError, OcrExtractor, RepositoryError, VerificationStore,
};
use crate::verification::{verification_router, VerificationConfig, VerificationService};

pub(super) type MemoryService = VerificationService<MemoryRepository, MemoryResults, StaticExtractor>;

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        owner_id: "owner-17".to_string(),
        name: "Jane A. Doe".to_string(),
        annual_salary: 60_000,
        employer_name: "Acme Inc.".to_string(),
        ssn: "123-45-6789".to_string(),
    }
}

pub(super) fn application() -> Application {
    let submitted = Utc
        .with_ymd_and_hms(2024, 3, 4, 15, 30, 0)
        .single()
        .expect("valid timestamp");
    Application::from_submission(ApplicationId("app-fixture".to_string()), submission(), submitted)
}

pub(super) fn pay_stub() -> ExtractedData {
    ExtractedData::new()
        .with(FieldKind::Name, "Jane Doe")
        .with(FieldKind::PayAmount, "2500")
        .with(FieldKind::PayPeriod, "biweekly")
        .with(FieldKind::EmployerName, "Acme")
        .with(FieldKind::Ssn, "123456789")
}

pub(super) fn upload(file_name: &str) -> DocumentUpload {
    DocumentUpload {
        file_name: file_name.to_string(),
        storage_url: format!("gs://loan-docs/uploads/{file_name}"),
        document_type: DocumentKind::PayStub,
    }
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryResults>) {
    build_service_with(pay_stub(), VerificationConfig::default())
}

pub(super) fn build_service_with(
    extraction: ExtractedData,
    config: VerificationConfig,
) -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryResults>) {
    let repository = Arc::new(MemoryRepository::default());
    let results = Arc::new(MemoryResults::default());
    let service = VerificationService::new(
        repository.clone(),
        results.clone(),
        Arc::new(StaticExtractor(extraction)),
        config,
    );
    (service, repository, results)
}

/// Application plus one registered pay stub, ready to verify.
pub(super) fn seeded(service: &MemoryService) -> (Application, Document) {
    let application = service
        .submit_application(submission())
        .expect("submission succeeds");
    let document = service
        .register_document(&application.id, upload("stub-march.pdf"))
        .expect("document registers");
    (application, document)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    applications: Mutex<HashMap<ApplicationId, Application>>,
    documents: Mutex<BTreeMap<DocumentId, Document>>,
}

impl MemoryRepository {
    pub(super) fn document_count(&self) -> usize {
        self.documents.lock().expect("documents mutex poisoned").len()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert_application(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.applications.lock().expect("applications mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.applications.lock().expect("applications mutex poisoned");
        guard.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.applications.lock().expect("applications mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert_document(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut guard = self.documents.lock().expect("documents mutex poisoned");
        guard.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        let guard = self.documents.lock().expect("documents mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn documents_for_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.documents.lock().expect("documents mutex poisoned");
        Ok(guard
            .values()
            .filter(|document| &document.application_id == id)
            .cloned()
            .collect())
    }

    fn delete_document(&self, id: &DocumentId) -> Result<(), RepositoryError> {
        let mut guard = self.documents.lock().expect("documents mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub(super) struct MemoryResults {
    results: Mutex<Vec<VerificationResult>>,
}

impl MemoryResults {
    pub(super) fn len(&self) -> usize {
        self.results.lock().expect("results mutex poisoned").len()
    }
}

impl VerificationStore for MemoryResults {
    fn record(&self, result: VerificationResult) -> Result<VerificationResult, RepositoryError> {
        self.results
            .lock()
            .expect("results mutex poisoned")
            .push(result.clone());
        Ok(result)
    }

    fn for_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<VerificationResult>, RepositoryError> {
        let guard = self.results.lock().expect("results mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|result| &result.application_id == id)
            .cloned()
            .collect())
    }

    fn latest(&self, id: &ApplicationId) -> Result<Option<VerificationResult>, RepositoryError> {
        Ok(self.for_application(id)?.into_iter().next())
    }

    fn delete_for_document(&self, id: &DocumentId) -> Result<usize, RepositoryError> {
        let mut guard = self.results.lock().expect("results mutex poisoned");
        let before = guard.len();
        guard.retain(|result| &result.document_id != id);
        Ok(before - guard.len())
    }

    fn has_any(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        let guard = self.results.lock().expect("results mutex poisoned");
        Ok(guard.iter().any(|result| &result.application_id == id))
    }
}

/// Returns the same extraction for every document.
pub(super) struct StaticExtractor(pub(super) ExtractedData);

impl OcrExtractor for StaticExtractor {
    fn extract(&self, _document: &Document) -> Result<ExtractedData, ExtractionError> {
        Ok(self.0.clone())
    }
}

pub(super) struct FailingExtractor;

impl OcrExtractor for FailingExtractor {
    fn extract(&self, _document: &Document) -> Result<ExtractedData, ExtractionError> {
        Err(ExtractionError::Unavailable("model quota exhausted".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert_application(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_application(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_document(&self, _document: Document) -> Result<Document, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_document(&self, _id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn documents_for_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Vec<Document>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_document(&self, _id: &DocumentId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    verification_router(Arc::new(service))
}
