use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::documents::{FileStorage, MAX_DOCUMENT_BYTES};
use super::domain::{ApplicationId, DocumentType, ProgramId, UserId};
use super::payload::StepData;
use super::profile::ProfileStore;
use super::registry::Locale;
use super::repository::{ApplicationRepository, RepositoryError};
use super::service::{ApplicationService, ApplicationServiceError};

type SharedService<R, P, S> = Arc<ApplicationService<R, P, S>>;

/// Upload bodies up to twice the document limit reach the validator, which
/// answers 422 `too_large`. Larger bodies are refused by the transport with a
/// plain 413 before the handler runs.
const UPLOAD_BODY_LIMIT: usize = 2 * MAX_DOCUMENT_BYTES as usize;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub user_id: String,
    pub program_id: String,
}

/// Router builder exposing the application wizard over HTTP.
pub fn application_router<R, P, S>(service: SharedService<R, P, S>) -> Router
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    Router::new()
        .route("/api/v1/application-steps", get(steps_handler::<R, P, S>))
        .route("/api/v1/applications", post(create_handler::<R, P, S>))
        .route(
            "/api/v1/applications/:application_id",
            get(summary_handler::<R, P, S>),
        )
        .route(
            "/api/v1/applications/:application_id/steps/:step",
            get(load_step_handler::<R, P, S>).put(save_step_handler::<R, P, S>),
        )
        .route(
            "/api/v1/applications/:application_id/advance",
            post(advance_handler::<R, P, S>),
        )
        .route(
            "/api/v1/applications/:application_id/retreat",
            post(retreat_handler::<R, P, S>),
        )
        .route(
            "/api/v1/applications/:application_id/submit",
            post(submit_handler::<R, P, S>),
        )
        .route(
            "/api/v1/applications/:application_id/documents/:document_type/:file_name",
            put(upload_handler::<R, P, S>).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/applications/:application_id/documents/:document_type",
            axum::routing::delete(remove_document_handler::<R, P, S>),
        )
        .route(
            "/api/v1/users/:user_id/applications",
            get(user_applications_handler::<R, P, S>),
        )
        .with_state(service)
}

impl ApplicationServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplicationServiceError::ApplicationNotFound(_)
            | ApplicationServiceError::StepNotFound(_)
            | ApplicationServiceError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ApplicationServiceError::StepDataMismatch { .. }
            | ApplicationServiceError::Validation(_)
            | ApplicationServiceError::IncompleteApplication { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApplicationServiceError::AlreadySubmitted(_)
            | ApplicationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            ApplicationServiceError::Storage(_)
            | ApplicationServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn error_response(error: ApplicationServiceError) -> Response {
    let status = error.status_code();
    let mut payload = json!({ "error": error.to_string() });
    match &error {
        ApplicationServiceError::IncompleteApplication { missing } => {
            payload["missing_steps"] = json!(missing);
        }
        ApplicationServiceError::Validation(rejection) => {
            payload["rejection"] = json!(rejection);
        }
        _ => {}
    }
    (status, Json(payload)).into_response()
}

pub(crate) fn locale_from(headers: &HeaderMap) -> Locale {
    let preferred = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if preferred.starts_with("fr") {
        Locale::Fr
    } else {
        Locale::En
    }
}

pub(crate) async fn steps_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    let steps = service.registry().definitions();
    (StatusCode::OK, Json(json!({ "steps": steps }))).into_response()
}

pub(crate) async fn create_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    headers: HeaderMap,
    Json(request): Json<CreateApplicationRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    let user_id = UserId(request.user_id);
    let program_id = ProgramId(request.program_id);
    match service.resume_or_create(&user_id, &program_id) {
        Ok(application) => {
            let view = application.summary(service.registry(), locale_from(&headers));
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(application) => {
            let view = application.summary(service.registry(), locale_from(&headers));
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn load_step_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    Path((application_id, step)): Path<(String, u32)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    match service.load_step(&ApplicationId(application_id), step) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_step_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    Path((application_id, step)): Path<(String, u32)>,
    Json(data): Json<StepData>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    let application_id = ApplicationId(application_id);
    let record = match service.save_step(&application_id, step, data) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match service.get(&application_id) {
        Ok(application) => {
            let payload = json!({
                "record": record,
                "progress_percentage": application.progress_percentage,
                "can_submit": application.can_submit,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    match service.advance(&ApplicationId(application_id)) {
        Ok(application) => {
            let view = application.summary(service.registry(), locale_from(&headers));
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn retreat_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    match service.retreat(&ApplicationId(application_id)) {
        Ok(application) => {
            let view = application.summary(service.registry(), locale_from(&headers));
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    match service.submit(&ApplicationId(application_id)) {
        Ok(application) => {
            let view = application.summary(service.registry(), locale_from(&headers));
            (StatusCode::ACCEPTED, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upload_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    Path((application_id, document_type, file_name)): Path<(String, String, String)>,
    body: Bytes,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    match service.upload_document(
        &ApplicationId(application_id),
        DocumentType::from(document_type),
        &file_name,
        &body,
    ) {
        Ok(document) => (StatusCode::CREATED, Json(document)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_document_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    Path((application_id, document_type)): Path<(String, String)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    let document_type = DocumentType::from(document_type);
    match service.remove_document(&ApplicationId(application_id), &document_type) {
        Ok(Some(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(None) => {
            let payload = json!({
                "error": format!("no {document_type} document on file"),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn user_applications_handler<R, P, S>(
    State(service): State<SharedService<R, P, S>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    let locale = locale_from(&headers);
    match service.applications_for(&UserId(user_id)) {
        Ok(applications) => {
            let views: Vec<_> = applications
                .iter()
                .map(|application| application.summary(service.registry(), locale))
                .collect();
            (StatusCode::OK, Json(json!({ "applications": views }))).into_response()
        }
        Err(error) => error_response(error),
    }
}
