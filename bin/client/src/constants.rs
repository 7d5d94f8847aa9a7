/// Default server URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Default directory for downloaded files
pub const DOWNLOADED_DIR: &str = "downloaded";

/// Environment variable holding the upload secret
pub const UPLOAD_PASSWORD_ENV: &str = "UPLOAD_PASSWORD";
