use anyhow::{Context, Result};
use common::{UploadResponse, FILE_FIELD, UPLOAD_ENDPOINT, UPLOAD_PASSWORD_HEADER};
use log::{debug, info};
use reqwest::blocking::{multipart, Client};
use std::path::Path;
use std::time::Duration;

/// Handles file uploads to the server
pub struct FileUploader {
    server: String,
    password: String,
    client: Client,
}

impl FileUploader {
    /// Create a new file uploader
    pub fn new(server: &str, password: &str) -> Result<Self> {
        // Large uploads must not be cut off by the default request timeout
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            password: password.to_string(),
            client,
        })
    }

    /// Upload a single file, stored on the server as `name`
    pub fn upload(&self, path: &Path, name: &str) -> Result<UploadResponse> {
        let part = multipart::Part::file(path)
            .with_context(|| format!("Failed to read file: {:?}", path))?
            .file_name(name.to_string())
            .mime_str("application/octet-stream")
            .context("Failed to set MIME type")?;
        let form = multipart::Form::new().part(FILE_FIELD, part);

        let url = format!("{}{}", self.server, UPLOAD_ENDPOINT);
        debug!("POST {} (file {:?} as {})", url, path, name);

        let response = self
            .client
            .post(&url)
            .header(UPLOAD_PASSWORD_HEADER, &self.password)
            .multipart(form)
            .send()
            .context("Failed to connect to server")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Upload failed for file {}: {} - {}", name, status, error_text);
        }

        let result: UploadResponse = response
            .json()
            .context("Failed to parse upload response")?;
        info!("Uploaded file: {} -> {}", result.filename, result.save_path);
        Ok(result)
    }
}

/// Upload a file and print the server's reply (convenience function)
pub fn upload_file(server: &str, password: &str, path: &Path, name: Option<&str>) -> Result<()> {
    anyhow::ensure!(path.is_file(), "Not a file: {:?}", path);

    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Cannot determine a file name for {:?}", path))?,
    };

    let uploader = FileUploader::new(server, password)?;
    let result = uploader.upload(path, &name)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to format upload response")?
    );
    Ok(())
}
