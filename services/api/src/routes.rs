use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_verify::verification::{
    verification_router, ApplicationRepository, DocumentId, ExtractedData, FieldKind,
    OcrExtractor, VerificationService, VerificationStore,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub(crate) struct ExtractionReceipt {
    pub(crate) document_id: DocumentId,
    pub(crate) fields_present: Vec<FieldKind>,
}

pub(crate) fn with_verification_routes<R, V, O>(
    service: Arc<VerificationService<R, V, O>>,
) -> axum::Router
where
    R: ApplicationRepository + 'static,
    V: VerificationStore + 'static,
    O: OcrExtractor + 'static,
{
    verification_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/documents/:document_id/extraction",
            axum::routing::put(extraction_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Record raw OCR output for a registered document so later verifications can consume it.
pub(crate) async fn extraction_endpoint(
    Extension(state): Extension<AppState>,
    Path(document_id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> axum::response::Response {
    let document_id = DocumentId(document_id);
    match state.documents.fetch_document(&document_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            let payload = json!({ "error": format!("document {document_id} not found") });
            return (StatusCode::NOT_FOUND, Json(payload)).into_response();
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response();
        }
    }

    let data = ExtractedData::from_ocr_value(&payload);
    let fields_present = data.present_fields();

    match state.extractions.store(document_id.clone(), data) {
        Ok(()) => {
            info!(document_id = %document_id, fields = fields_present.len(), "extraction stored");
            let receipt = ExtractionReceipt {
                document_id,
                fields_present,
            };
            (StatusCode::ACCEPTED, Json(receipt)).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        InMemoryApplicationRepository, InMemoryOcrExtractor, InMemoryVerificationStore,
    };
    use axum::body::Body;
    use axum::http::Request;
    use loan_verify::verification::VerificationConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let repository = Arc::new(InMemoryApplicationRepository::default());
        let extractions = Arc::new(InMemoryOcrExtractor::default());
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            documents: repository.clone(),
            extractions: extractions.clone(),
        };
        let service = Arc::new(VerificationService::new(
            repository,
            Arc::new(InMemoryVerificationStore::default()),
            extractions,
            VerificationConfig::default(),
        ));
        with_verification_routes(service).layer(Extension(state))
    }

    async fn send(
        router: &axum::Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("serialize"))
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(request.body(body).expect("request builds"))
            .await
            .expect("route executes");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, payload)
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (status, payload) = send(&app(false), "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], "initializing");

        let (status, _) = send(&app(true), "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn extraction_for_unknown_document_is_rejected() {
        let (status, payload) = send(
            &app(true),
            "PUT",
            "/api/v1/documents/doc-unregistered/extraction",
            Some(json!({ "employee_name": "Jane Doe" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload["error"], "document doc-unregistered not found");
    }

    #[tokio::test]
    async fn verification_waits_for_extraction() {
        let router = app(true);

        let (status, application) = send(
            &router,
            "POST",
            "/api/v1/applications",
            Some(json!({
                "owner_id": "owner-9",
                "name": "Jane A. Doe",
                "annual_salary": 60000,
                "employer_name": "Acme Inc.",
                "ssn": "123-45-6789",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let application_id = application["id"].as_str().expect("id").to_string();

        let (status, document) = send(
            &router,
            "POST",
            &format!("/api/v1/applications/{application_id}/documents"),
            Some(json!({ "file_name": "stub.pdf", "storage_url": "gs://loan-docs/stub.pdf" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let document_id = document["id"].as_str().expect("id").to_string();

        let verify_uri = format!("/api/v1/verification/application/{application_id}/verify");
        let (status, _) = send(&router, "POST", &verify_uri, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, receipt) = send(
            &router,
            "PUT",
            &format!("/api/v1/documents/{document_id}/extraction"),
            Some(json!({
                "employee_name": "Jane Doe",
                "gross_pay": 2500,
                "pay_period": "biweekly",
                "company_name": "Acme",
                "ssn": "123456789",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(receipt["fields_present"].as_array().map(Vec::len), Some(5));

        let (status, result) = send(&router, "POST", &verify_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["overall_status"], "verified");

        let (status, view) = send(
            &router,
            "GET",
            &format!("/api/v1/verification/application/{application_id}/status"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["status"], "verified");
    }
}
