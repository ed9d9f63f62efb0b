use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::ApplicationId;
use super::documents::UploadError;
use super::repository::{
    ApplicationRepository, ApplicationStatusView, DocumentStorage, RepositoryError,
};
use super::selection::SelectionConfig;
use super::service::{AdmissionsService, AdmissionsServiceError, RegistrationSubmission};

/// Router builder exposing the admissions endpoints.
pub fn admissions_router<R, S>(service: Arc<AdmissionsService<R, S>>) -> Router
where
    R: ApplicationRepository + 'static,
    S: DocumentStorage + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/applications",
            post(register_handler::<R, S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id",
            get(status_handler::<R, S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/checklist",
            get(checklist_handler::<R, S>),
        )
        .route(
            "/api/v1/admissions/selection",
            post(selection_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R, S>(
    State(service): State<Arc<AdmissionsService<R, S>>>,
    axum::Json(submission): axum::Json<RegistrationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStorage + 'static,
{
    match service.register(submission) {
        Ok(application) => {
            let view = ApplicationStatusView::from_application(&application);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, S>(
    State(service): State<Arc<AdmissionsService<R, S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStorage + 'static,
{
    let id = ApplicationId(application_id);
    match service.get(&id) {
        Ok(application) => {
            let view = ApplicationStatusView::from_application(&application);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn checklist_handler<R, S>(
    State(service): State<Arc<AdmissionsService<R, S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStorage + 'static,
{
    let id = ApplicationId(application_id);
    match service.submission_checklist(&id) {
        Ok(unmet) => {
            let payload = json!({
                "application_id": id.0,
                "ready": unmet.is_empty(),
                "unmet": unmet
                    .iter()
                    .map(|requirement| requirement.to_string())
                    .collect::<Vec<_>>(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn selection_handler<R, S>(
    State(service): State<Arc<AdmissionsService<R, S>>>,
    axum::Json(config): axum::Json<SelectionConfig>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStorage + 'static,
{
    match service.run_selection(&config) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AdmissionsServiceError) -> Response {
    match error {
        AdmissionsServiceError::Locked(locked) => {
            let payload = json!({ "error": locked.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        AdmissionsServiceError::Upload(UploadError::Rejected(reasons)) => {
            let payload = json!({
                "error": "upload rejected",
                "reasons": reasons,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        AdmissionsServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "application not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        AdmissionsServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": "conflicting write, retry the request" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
