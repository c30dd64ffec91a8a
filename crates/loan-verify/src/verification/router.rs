use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use tracing::warn;

use super::domain::{
    ApplicationId, ApplicationSubmission, DocumentId, DocumentUpload, VerificationResult,
};
use super::repository::{ApplicationRepository, OcrExtractor, RepositoryError, VerificationStore};
use super::service::{LiveRun, ServiceError, VerificationService};
use super::stream::VerificationEvent;

/// Router builder exposing application intake, document registration and verification.
pub fn verification_router<R, V, O>(service: Arc<VerificationService<R, V, O>>) -> Router
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<R, V, O>))
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<R, V, O>).put(update_handler::<R, V, O>),
        )
        .route(
            "/api/v1/applications/:application_id/documents",
            get(documents_handler::<R, V, O>).post(register_document_handler::<R, V, O>),
        )
        .route(
            "/api/v1/documents/:document_id",
            get(document_handler::<R, V, O>).delete(delete_document_handler::<R, V, O>),
        )
        .route(
            "/api/v1/verification/application/:application_id",
            get(results_handler::<R, V, O>),
        )
        .route(
            "/api/v1/verification/application/:application_id/verify",
            post(verify_latest_handler::<R, V, O>),
        )
        .route(
            "/api/v1/verification/application/:application_id/documents/:document_id/verify",
            post(verify_document_handler::<R, V, O>),
        )
        .route(
            "/api/v1/verification/application/:application_id/latest",
            get(latest_handler::<R, V, O>),
        )
        .route(
            "/api/v1/verification/application/:application_id/status",
            get(status_handler::<R, V, O>),
        )
        .route(
            "/api/v1/verification/application/:application_id/live-verify",
            get(live_verify_handler::<R, V, O>),
        )
        .with_state(service)
}

type SharedService<R, V, O> = State<Arc<VerificationService<R, V, O>>>;

pub(crate) async fn submit_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.submit_application(submission) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn application_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.get_application(&ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.update_application(&ApplicationId(application_id), submission) {
        Ok(application) => (StatusCode::OK, axum::Json(application.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_document_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
    axum::Json(upload): axum::Json<DocumentUpload>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.register_document(&ApplicationId(application_id), upload) {
        Ok(document) => (StatusCode::CREATED, axum::Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn documents_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.documents(&ApplicationId(application_id)) {
        Ok(documents) => (StatusCode::OK, axum::Json(documents)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn document_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(document_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.get_document(&DocumentId(document_id)) {
        Ok(document) => (StatusCode::OK, axum::Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_document_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(document_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    let id = DocumentId(document_id);
    match service.delete_document(&id) {
        Ok(removed) => {
            let payload = json!({
                "document_id": id.0,
                "deleted_verifications": removed,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_latest_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.verify_document(&ApplicationId(application_id), None) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_document_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path((application_id, document_id)): Path<(String, String)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    let document_id = DocumentId(document_id);
    match service.verify_document(&ApplicationId(application_id), Some(&document_id)) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn results_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.results(&ApplicationId(application_id)) {
        Ok(results) => (StatusCode::OK, axum::Json(results)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn latest_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.latest_summary(&ApplicationId(application_id)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    match service.status(&ApplicationId(application_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Server-sent events for a verification of the latest document.
///
/// One event per engine stage, then `complete` with the stored result. The
/// result is only persisted when the final stage is reached, so a client that
/// disconnects early leaves nothing behind.
pub(crate) async fn live_verify_handler<R, V, O>(
    State(service): SharedService<R, V, O>,
    Path(application_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    let application_id = ApplicationId(application_id);

    let stream = async_stream::stream! {
        match service.live_verification(&application_id, None) {
            Err(error) => {
                warn!(application_id = %application_id, error = %error, "live verification rejected");
                yield Ok(error_event(&error.to_string()));
            }
            Ok(LiveRun { application_id, document_id, events }) => {
                for event in events {
                    match event {
                        VerificationEvent::Completed { report } => {
                            match service.record_report(&application_id, &document_id, *report) {
                                Ok(result) => yield Ok(complete_event(&result)),
                                Err(error) => {
                                    warn!(application_id = %application_id, error = %error, "live verification not recorded");
                                    yield Ok(error_event(&error.to_string()));
                                }
                            }
                        }
                        other => yield Ok(stage_event(&other)),
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn stage_event(event: &VerificationEvent) -> Event {
    let payload = json!({
        "step": event.label(),
        "message": event.message(),
        "progress": event.progress(),
        "detail": event,
    });
    Event::default().event(event.label()).data(payload.to_string())
}

fn complete_event(result: &VerificationResult) -> Event {
    let payload = json!({
        "step": "complete",
        "message": "Verification completed",
        "progress": 100,
        "verification_id": result.id,
        "overall_status": result.report.overall_status,
        "verification_results": result,
    });
    Event::default().event("complete").data(payload.to_string())
}

fn error_event(message: &str) -> Event {
    let payload = json!({
        "step": "error",
        "message": message,
        "progress": 0,
        "error": true,
    });
    Event::default().event("error").data(payload.to_string())
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::InvalidApplication(_) | ServiceError::InvalidDocument(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::ApplicationNotFound(_)
        | ServiceError::DocumentNotFound(_)
        | ServiceError::NoDocuments(_)
        | ServiceError::NoResults(_)
        | ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Locked(_) | ServiceError::Repository(RepositoryError::Conflict) => {
            StatusCode::CONFLICT
        }
        ServiceError::UnsupportedDocument { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ServiceError::Extraction(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload: Value = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
