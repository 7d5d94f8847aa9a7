pub mod file_utils;

use serde::{Deserialize, Serialize};

/// Upload endpoint path
pub const UPLOAD_ENDPOINT: &str = "/upload";

/// Header carrying the upload shared secret
pub const UPLOAD_PASSWORD_HEADER: &str = "X-Upload-Password";

/// Multipart field and query parameter carrying the upload shared secret
pub const PASSWORD_FIELD: &str = "password";

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// Message returned with a successful upload
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

/// Response body of a successful upload
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub code: u16,
    pub message: String,
    pub filename: String,  // Sanitized filename as stored
    pub save_path: String, // Absolute path inside the storage directory
}

impl UploadResponse {
    pub fn success(filename: impl Into<String>, save_path: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            filename: filename.into(),
            save_path: save_path.into(),
        }
    }
}
