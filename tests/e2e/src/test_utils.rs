use anyhow::{Context, Result};
use common::{UploadResponse, UPLOAD_ENDPOINT, UPLOAD_PASSWORD_HEADER};
use reqwest::StatusCode;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tokio::time::sleep;

/// Size of the file used to exercise resumed downloads
pub const LARGE_FILE_SIZE: usize = 256 * 1024;

pub fn create_test_files(dir: &Path, count: usize) -> Result<Vec<String>> {
    let mut filenames = Vec::with_capacity(count + 1);
    for i in 0..count {
        let filename = format!("file{}.txt", i);
        let content = format!("Test file {} content\n", i);
        let file_path = dir.join(&filename);
        fs::write(&file_path, content)
            .with_context(|| format!("Failed to create test file: {:?}", file_path))?;
        filenames.push(filename);
    }

    let filename = "large.bin".to_string();
    let content: Vec<u8> = (0..LARGE_FILE_SIZE).map(|i| (i % 251) as u8).collect();
    let file_path = dir.join(&filename);
    fs::write(&file_path, content)
        .with_context(|| format!("Failed to create test file: {:?}", file_path))?;
    filenames.push(filename);

    Ok(filenames)
}

/// Any HTTP answer on `/` means the server is accepting connections
pub async fn wait_for_server(url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let probe_url = format!("{}/", url);

    println!("Waiting for server to be ready...");
    for i in 0..30 {
        match client.get(&probe_url).send().await {
            Ok(_) => {
                println!("Server is ready!");
                return Ok(());
            }
            Err(_) => {
                if i < 29 {
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    anyhow::bail!("Server did not become ready within 30 seconds");
}

pub fn upload_file(
    client_binary: &Path,
    server_url: &str,
    password: &str,
    file_path: &Path,
) -> Result<UploadResponse> {
    let output = Command::new(client_binary)
        .arg("upload")
        .arg(file_path)
        .arg("--server")
        .arg(server_url)
        .env("UPLOAD_PASSWORD", password)
        .output()
        .with_context(|| format!("Failed to run client binary: {:?}", client_binary))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Upload failed:\nSTDOUT: {}\nSTDERR: {}", stdout, stderr);
    }

    serde_json::from_str(&stdout)
        .with_context(|| format!("Failed to parse upload response: {}", stdout))
}

pub fn download_file(
    client_binary: &Path,
    server_url: &str,
    output_dir: &Path,
    filename: &str,
    resume: bool,
) -> Result<()> {
    let mut command = Command::new(client_binary);
    command
        .arg("download")
        .arg(filename)
        .arg("--server")
        .arg(server_url)
        .arg("--output-dir")
        .arg(output_dir);
    if resume {
        command.arg("--resume");
    }

    let output = command
        .output()
        .with_context(|| "Failed to run download command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        anyhow::bail!("Download failed:\nSTDOUT: {}\nSTDERR: {}", stdout, stderr);
    }

    Ok(())
}

/// POST a small file directly, bypassing the client binary
pub async fn raw_upload(
    server_url: &str,
    password: &str,
    filename: &str,
    content: &[u8],
) -> Result<StatusCode> {
    let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name(filename.to_string());
    let form = reqwest::multipart::Form::new().part(common::FILE_FIELD, part);

    let response = reqwest::Client::new()
        .post(format!("{}{}", server_url, UPLOAD_ENDPOINT))
        .header(UPLOAD_PASSWORD_HEADER, password)
        .multipart(form)
        .send()
        .await
        .context("Failed to send upload request")?;

    Ok(response.status())
}

/// GET a raw path; the caller is responsible for any percent-encoding
pub async fn raw_get(server_url: &str, path: &str) -> Result<(StatusCode, Vec<u8>)> {
    let response = reqwest::get(format!("{}{}", server_url, path))
        .await
        .with_context(|| format!("Failed to send GET {}", path))?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();
    Ok((status, body))
}
