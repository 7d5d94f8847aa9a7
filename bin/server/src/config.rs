use crate::constants::{
    DEFAULT_HOST, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PORT, DEFAULT_STORAGE_DIR, ENV_MAX_UPLOAD_SIZE,
    ENV_SERVER_HOST, ENV_SERVER_PORT, ENV_SPOOL_DIR, ENV_STORAGE_DIR, ENV_UPLOAD_PASSWORD,
};
use clap::{Arg, ArgMatches, Command};
use std::fmt;
use std::path::PathBuf;

/// Server configuration, built once at startup and never reloaded
#[derive(Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory holding every uploaded and downloadable file
    pub storage_dir: PathBuf,
    /// Upper bound on an upload request body, in bytes
    pub max_upload_size: u64,
    /// Shared secret required for uploads
    pub upload_password: String,
    /// Directory for spool files of in-flight uploads
    pub spool_dir: PathBuf,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("storage_dir", &self.storage_dir)
            .field("max_upload_size", &self.max_upload_size)
            .field("upload_password", &"<redacted>")
            .field("spool_dir", &self.spool_dir)
            .finish()
    }
}

fn invalid_input(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
}

impl ServerConfig {
    pub fn command() -> Command {
        Command::new("server")
            .about("HTTP file transfer server backed by a single flat directory")
            .arg(
                Arg::new("host")
                    .long("host")
                    .value_name("HOST")
                    .help("Server host (default: 0.0.0.0, or SERVER_HOST env var)"),
            )
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_name("PORT")
                    .help("Server port (default: 8080, or SERVER_PORT env var)"),
            )
            .arg(
                Arg::new("storage-dir")
                    .long("storage-dir")
                    .value_name("DIR")
                    .help("Directory for stored files (default: ./download, or STORAGE_DIR env var)"),
            )
            .arg(
                Arg::new("max-upload-size")
                    .long("max-upload-size")
                    .value_name("BYTES")
                    .help("Maximum upload request size in bytes (default: 10 GiB, or MAX_UPLOAD_SIZE env var)"),
            )
            .arg(
                Arg::new("upload-password")
                    .long("upload-password")
                    .value_name("SECRET")
                    .help("Shared secret required for uploads (or UPLOAD_PASSWORD env var)"),
            )
            .arg(
                Arg::new("spool-dir")
                    .long("spool-dir")
                    .value_name("DIR")
                    .help("Directory for in-flight uploads (default: system temp dir, or SPOOL_DIR env var)"),
            )
    }

    /// Load configuration from command line arguments and environment variables.
    /// Priority: command-line args > environment variables > defaults
    pub fn load() -> Result<Self, std::io::Error> {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches, |key| std::env::var(key).ok())
    }

    pub fn from_matches<F>(matches: &ArgMatches, env: F) -> Result<Self, std::io::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |name: &str, env_key: &str| -> Option<String> {
            matches
                .get_one::<String>(name)
                .cloned()
                .or_else(|| env(env_key))
        };

        let host = setting("host", ENV_SERVER_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port_str = setting("port", ENV_SERVER_PORT).unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = port_str
            .parse()
            .map_err(|_| invalid_input(format!("Invalid port number: {}", port_str)))?;

        let storage_dir = PathBuf::from(
            setting("storage-dir", ENV_STORAGE_DIR)
                .unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string()),
        );

        let max_upload_size = match setting("max-upload-size", ENV_MAX_UPLOAD_SIZE) {
            Some(value) => match value.parse::<u64>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(invalid_input(format!(
                        "Invalid maximum upload size: {}. Must be a positive number of bytes",
                        value
                    )))
                }
            },
            None => DEFAULT_MAX_UPLOAD_SIZE,
        };

        let upload_password = setting("upload-password", ENV_UPLOAD_PASSWORD)
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| {
                invalid_input(
                    "Upload password required. Set --upload-password or UPLOAD_PASSWORD env var"
                        .to_string(),
                )
            })?;

        let spool_dir = setting("spool-dir", ENV_SPOOL_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Ok(ServerConfig {
            host,
            port,
            storage_dir,
            max_upload_size,
            upload_password,
            spool_dir,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
