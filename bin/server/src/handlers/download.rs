use crate::handlers::error::{handle_server_error, ApiError};
use crate::state::AppState;
use actix_files::NamedFile;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use std::io::ErrorKind;
use tracing::{info, warn};

/// Serve a file from the storage directory.
///
/// The filename is the request path without its leading `/`. Range and
/// conditional requests are answered by `NamedFile`.
pub async fn download(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    if req.method() != Method::GET {
        return Err(ApiError::method_not_allowed(
            Method::GET,
            "Only GET requests are supported (file download)",
        ));
    }

    let raw = req.path().strip_prefix('/').unwrap_or(req.path());
    let filename = urlencoding::decode(raw)
        .map_err(|_| ApiError::BadRequest("File name is not valid UTF-8".to_string()))?;

    if filename.is_empty() {
        return Err(ApiError::BadRequest(
            "Please specify a file name (e.g. /example.zip)".to_string(),
        ));
    }

    let path = state.store.resolve(&filename).map_err(|e| {
        if e.is_traversal() {
            warn!(
                filename = ?filename,
                remote_addr = ?req.peer_addr(),
                "GET - Rejected path traversal attempt: {}",
                e
            );
            ApiError::Forbidden("Illegal file path".to_string())
        } else {
            ApiError::BadRequest(e.to_string())
        }
    })?;

    // No directory listings: anything that is not a regular file is reported missing
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(ApiError::Forbidden("Permission denied".to_string()));
        }
        _ => {
            return Err(ApiError::NotFound(format!("File {} not found", filename)));
        }
    }

    let file = NamedFile::open_async(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ApiError::NotFound(format!("File {} not found", filename)),
        _ => handle_server_error("Failed to open file", e),
    })?;

    info!(filename = ?filename, "GET - Serving file");

    Ok(file.into_response(&req))
}
