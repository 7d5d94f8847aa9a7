/// Default server host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: &str = "8080";

/// Default storage directory for uploaded and downloadable files
pub const DEFAULT_STORAGE_DIR: &str = "download";

/// Default maximum upload size in bytes (10 GiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024 * 1024;

/// Maximum size of a non-file multipart field such as `password`
pub const MAX_TEXT_FIELD_SIZE: usize = 4 * 1024;

/// Prefix of spool files holding in-flight uploads
pub const SPOOL_FILE_PREFIX: &str = ".upload-";

pub const ENV_SERVER_HOST: &str = "SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "SERVER_PORT";
pub const ENV_STORAGE_DIR: &str = "STORAGE_DIR";
pub const ENV_MAX_UPLOAD_SIZE: &str = "MAX_UPLOAD_SIZE";
pub const ENV_UPLOAD_PASSWORD: &str = "UPLOAD_PASSWORD";
pub const ENV_SPOOL_DIR: &str = "SPOOL_DIR";
