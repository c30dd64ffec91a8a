use loan_verify::verification::{
    Application, ApplicationId, ApplicationRepository, Document, DocumentId, ExtractedData,
    ExtractionError, OcrExtractor, RepositoryError, VerificationResult, VerificationStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) documents: Arc<InMemoryApplicationRepository>,
    pub(crate) extractions: Arc<InMemoryOcrExtractor>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    applications: Arc<Mutex<HashMap<ApplicationId, Application>>>,
    documents: Arc<Mutex<HashMap<DocumentId, Document>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert_application(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = lock(&self.applications)?;
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.applications)?;
        if guard.contains_key(&application.id) {
            guard.insert(application.id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(lock(&self.applications)?.get(id).cloned())
    }

    fn insert_document(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut guard = lock(&self.documents)?;
        if guard.contains_key(&document.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn fetch_document(&self, id: &DocumentId) -> Result<Option<Document>, RepositoryError> {
        Ok(lock(&self.documents)?.get(id).cloned())
    }

    fn documents_for_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<Document>, RepositoryError> {
        let mut documents: Vec<Document> = lock(&self.documents)?
            .values()
            .filter(|document| &document.application_id == id)
            .cloned()
            .collect();
        documents.sort_by(|left, right| {
            left.uploaded_at
                .cmp(&right.uploaded_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(documents)
    }

    fn delete_document(&self, id: &DocumentId) -> Result<(), RepositoryError> {
        lock(&self.documents)?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryVerificationStore {
    results: Arc<Mutex<Vec<VerificationResult>>>,
}

impl VerificationStore for InMemoryVerificationStore {
    fn record(&self, result: VerificationResult) -> Result<VerificationResult, RepositoryError> {
        lock(&self.results)?.push(result.clone());
        Ok(result)
    }

    fn for_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<VerificationResult>, RepositoryError> {
        Ok(lock(&self.results)?
            .iter()
            .rev()
            .filter(|result| &result.application_id == id)
            .cloned()
            .collect())
    }

    fn latest(&self, id: &ApplicationId) -> Result<Option<VerificationResult>, RepositoryError> {
        Ok(lock(&self.results)?
            .iter()
            .rev()
            .find(|result| &result.application_id == id)
            .cloned())
    }

    fn delete_for_document(&self, id: &DocumentId) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.results)?;
        let before = guard.len();
        guard.retain(|result| &result.document_id != id);
        Ok(before - guard.len())
    }

    fn has_any(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.results)?
            .iter()
            .any(|result| &result.application_id == id))
    }
}

/// Holds OCR output pushed through the extraction route until a verification asks for it.
#[derive(Default)]
pub(crate) struct InMemoryOcrExtractor {
    extractions: Mutex<HashMap<DocumentId, ExtractedData>>,
}

impl InMemoryOcrExtractor {
    pub(crate) fn store(
        &self,
        document_id: DocumentId,
        data: ExtractedData,
    ) -> Result<(), ExtractionError> {
        self.extractions
            .lock()
            .map_err(|_| ExtractionError::Unavailable("extraction cache poisoned".to_string()))?
            .insert(document_id, data);
        Ok(())
    }
}

impl OcrExtractor for InMemoryOcrExtractor {
    fn extract(&self, document: &Document) -> Result<ExtractedData, ExtractionError> {
        self.extractions
            .lock()
            .map_err(|_| ExtractionError::Unavailable("extraction cache poisoned".to_string()))?
            .get(&document.id)
            .cloned()
            .ok_or_else(|| ExtractionError::NotReady(document.id.clone()))
    }
}
