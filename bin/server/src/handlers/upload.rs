use crate::handlers::error::{handle_server_error, ApiError};
use crate::handlers::upload_form::{FormError, UploadForm};
use crate::state::AppState;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use common::file_utils::{self, PathError};
use common::{UploadResponse, UPLOAD_PASSWORD_HEADER};
use serde::Deserialize;
use storage::StoreError;
use tracing::{info, warn};

#[derive(Deserialize)]
struct UploadQuery {
    password: Option<String>,
}

/// Handle file upload (multipart/form-data)
pub async fn upload(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    if req.method() != Method::POST {
        return Err(ApiError::method_not_allowed(
            Method::POST,
            "Only POST requests are supported (file upload)",
        ));
    }

    let header_password = req
        .headers()
        .get(UPLOAD_PASSWORD_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .filter(|value| !value.is_empty());

    // A header secret is checked before any of the body is read
    if let Some(password) = &header_password {
        authorize(&req, &state, password)?;
    }

    let form = UploadForm::receive(
        req.headers(),
        payload,
        state.max_upload_size,
        &state.spool_dir,
    )
    .await;

    if header_password.is_none() {
        let form_password = form.password.clone().filter(|value| !value.is_empty());
        let password = form_password
            .or_else(|| query_password(&req))
            .unwrap_or_default();
        authorize(&req, &state, &password)?;
    }

    let form = form.into_result().map_err(|e| match e {
        FormError::TooLarge { .. } | FormError::FieldTooLarge { .. } => {
            warn!("POST /upload - {}", e);
            ApiError::PayloadTooLarge(e.to_string())
        }
        FormError::Malformed(_) => {
            warn!("POST /upload - {}", e);
            ApiError::BadRequest(e.to_string())
        }
        FormError::Spool(err) => handle_server_error("Failed to buffer uploaded file", err),
    })?;

    let file = form.file.ok_or_else(|| {
        ApiError::BadRequest("Failed to get uploaded file: no file part named \"file\"".to_string())
    })?;

    info!(
        filename = ?file.filename,
        size = file.size,
        "POST /upload - Request received"
    );

    let filename = file_utils::sanitize_filename(&file.filename)
        .ok_or_else(|| ApiError::BadRequest("Filename cannot be empty".to_string()))?;

    let mut content = file
        .open()
        .await
        .map_err(|e| handle_server_error("Failed to upload file", e))?;

    let save_path = state
        .store
        .store(&filename, &mut content)
        .await
        .map_err(|e| match e {
            StoreError::Path(path_error) => rejected_path(&req, &filename, path_error),
            StoreError::Create(err) => handle_server_error("Failed to create file", err),
            StoreError::Write(err) => handle_server_error("Failed to upload file", err),
            other => handle_server_error("Failed to store file", other),
        })?;

    info!(
        filename = ?filename,
        size = file.size,
        save_path = ?save_path,
        "POST /upload - File uploaded"
    );

    Ok(HttpResponse::Ok().json(UploadResponse::success(
        filename,
        save_path.to_string_lossy(),
    )))
}

fn query_password(req: &HttpRequest) -> Option<String> {
    web::Query::<UploadQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().password)
        .filter(|value| !value.is_empty())
}

fn authorize(req: &HttpRequest, state: &AppState, password: &str) -> Result<(), ApiError> {
    if state.is_authorized(password) {
        return Ok(());
    }

    let remote_addr = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    warn!(
        remote_addr = %remote_addr,
        attempted_password = ?password,
        "POST /upload - Wrong password, upload rejected"
    );
    Err(ApiError::Unauthorized)
}

fn rejected_path(req: &HttpRequest, filename: &str, e: PathError) -> ApiError {
    warn!(
        filename = ?filename,
        path = req.path(),
        "Rejected file path: {}",
        e
    );
    if e.is_traversal() {
        ApiError::Forbidden("Illegal file name".to_string())
    } else {
        ApiError::BadRequest(e.to_string())
    }
}
