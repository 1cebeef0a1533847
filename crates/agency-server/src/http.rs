//! HTTP routes
//!
//! - `POST /api/projects/generate`: body `{ "wizardData": ProjectBlueprint }`
//! - `GET /healthz`
//!
//! Failures keep the `{ "error": string }` body shape; the status code
//! follows the error kind.

use agency_model::{GenerateProjectRequest, ProjectId};
use agency_provision::{bearer_credential, ErrorKind, ProvisionError, Provisioner, RunControl};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Shared request state
#[derive(Debug)]
pub struct AppState {
    pub provisioner: Provisioner,
}

impl AppState {
    #[must_use]
    pub fn new(provisioner: Provisioner) -> Self {
        Self { provisioner }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<ProjectId>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            violations: None,
            project_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

/// Status code for an error kind
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Provisioning | ErrorKind::Assembly => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// All routes, with rejections recovered into JSON errors
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let generate = warp::path!("api" / "projects" / "generate")
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_state(state))
        .then(generate_project);

    let health = warp::path!("healthz").and(warp::get()).map(|| {
        warp::reply::json(&Health {
            status: "ok",
            version: crate::VERSION,
        })
    });

    generate.or(health).recover(handle_rejection)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn generate_project(
    authorization: Option<String>,
    body: Bytes,
    state: Arc<AppState>,
) -> Response {
    let credential = match bearer_credential(authorization.as_deref()) {
        Ok(credential) => credential,
        Err(e) => return provision_error(&e),
    };
    let request: GenerateProjectRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                ErrorBody::new(format!("invalid request body: {e}")),
            )
        }
    };

    // Runs on its own task: a dropped handler trips the guard and the
    // saga compensates whatever it already created.
    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();
    let control = RunControl::new().with_cancellation(token);
    let task = tokio::spawn(async move {
        state
            .provisioner
            .provision(&credential, &request.wizard_data, &control)
            .await
    });

    match task.await {
        Ok(Ok(outcome)) => match outcome.view {
            Ok(view) => warp::reply::with_status(warp::reply::json(&view), StatusCode::OK)
                .into_response(),
            Err(e) => json_error(
                status_for(e.kind()),
                ErrorBody {
                    error: e.to_string(),
                    violations: None,
                    project_id: Some(outcome.project_id),
                },
            ),
        },
        Ok(Err(e)) => provision_error(&e),
        Err(join) => {
            tracing::error!(error = %join, "provisioning task aborted");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("internal error"),
            )
        }
    }
}

fn provision_error(err: &ProvisionError) -> Response {
    let status = status_for(err.kind());
    if status.is_server_error() {
        tracing::error!(error = %err, "project generation failed");
    } else {
        tracing::info!(error = %err, status = status.as_u16(), "project generation rejected");
    }
    let violations = match err {
        ProvisionError::Validation(v) => {
            Some(v.violations.iter().map(ToString::to_string).collect())
        }
        _ => None,
    };
    json_error(
        status,
        ErrorBody {
            error: err.to_string(),
            violations,
            project_id: None,
        },
    )
}

fn json_error(status: StatusCode, body: ErrorBody) -> Response {
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "content-length required".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::warn!(rejection = ?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    };
    Ok(json_error(status, ErrorBody::new(message)))
}
