use anyhow::{Context, Result};
use common::file_utils;
use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to do with the local file once the server has answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Server sent the full file: start over
    Truncate,
    /// Server sent the remaining bytes: append to the partial file
    Append,
    /// Nothing left to fetch
    Complete,
    /// The local file is not a prefix of the remote one: fetch it all again
    Restart,
}

/// `remote_size` is the total from a `Content-Range: bytes */N` header
fn write_mode(
    status: StatusCode,
    resume_from: u64,
    remote_size: Option<u64>,
) -> Option<WriteMode> {
    match status {
        StatusCode::OK => Some(WriteMode::Truncate),
        StatusCode::PARTIAL_CONTENT if resume_from > 0 => Some(WriteMode::Append),
        StatusCode::RANGE_NOT_SATISFIABLE if resume_from > 0 => {
            if remote_size == Some(resume_from) {
                Some(WriteMode::Complete)
            } else {
                Some(WriteMode::Restart)
            }
        }
        _ => None,
    }
}

fn unsatisfied_range_size(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .trim()
        .strip_prefix("bytes */")?
        .parse()
        .ok()
}

/// Handles file downloads
pub struct FileDownloader {
    server: String,
    client: Client,
}

impl FileDownloader {
    /// Create a new file downloader
    pub fn new(server: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Download `filename` into `output_dir`, returning the local path.
    ///
    /// With `resume`, an existing local file is treated as a prefix of the
    /// remote one and only the missing bytes are requested.
    pub fn download(&self, filename: &str, output_dir: &Path, resume: bool) -> Result<PathBuf> {
        let local_name = file_utils::sanitize_filename(filename)
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {:?}", filename))?;

        fs::create_dir_all(output_dir).context("Failed to create output directory")?;
        let file_path = output_dir.join(&local_name);

        let resume_from = if resume {
            fs::metadata(&file_path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        let url = format!("{}/{}", self.server, urlencoding::encode(filename));
        let (mut response, mut mode) = self.request(&url, resume_from)?;

        if mode == WriteMode::Restart {
            warn!(
                "Local copy of {} ({} bytes) does not match the server, downloading again",
                filename, resume_from
            );
            (response, mode) = self.request(&url, 0)?;
        }

        if mode == WriteMode::Complete {
            info!("{} is already complete ({} bytes)", filename, resume_from);
            return Ok(file_path);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(mode == WriteMode::Append)
            .truncate(mode == WriteMode::Truncate)
            .open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;

        let received = response
            .copy_to(&mut file)
            .context("Failed to write downloaded file")?;

        info!(
            "Downloaded {} ({} bytes{})",
            filename,
            received,
            if mode == WriteMode::Append {
                " appended"
            } else {
                ""
            }
        );
        Ok(file_path)
    }

    fn request(&self, url: &str, resume_from: u64) -> Result<(Response, WriteMode)> {
        let mut request = self.client.get(url);
        if resume_from > 0 {
            debug!("Resuming {} from byte {}", url, resume_from);
            request = request.header(RANGE, format!("bytes={}-", resume_from));
        }
        let response = request.send().context("Failed to connect to server")?;

        let status = response.status();
        let remote_size = unsatisfied_range_size(response.headers());
        match write_mode(status, resume_from, remote_size) {
            Some(mode) => Ok((response, mode)),
            None => {
                let error_text = response
                    .text()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                anyhow::bail!("Download failed: {} - {}", status, error_text);
            }
        }
    }
}

/// Download a file and report where it was saved (convenience function)
pub fn download_file(server: &str, filename: &str, output_dir: &Path, resume: bool) -> Result<()> {
    let downloader = FileDownloader::new(server)?;
    let file_path = downloader.download(filename, output_dir, resume)?;
    println!("File saved to: {:?}", file_path);
    Ok(())
}
