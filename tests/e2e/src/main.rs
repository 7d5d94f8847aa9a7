mod test_utils;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use test_utils::*;
use tracing::info;

const TEST_FILES_COUNT: usize = 2;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("e2e_tests=debug,info")
        .init();

    println!("📁 Running E2E tests against the file server...");
    run_file_server_tests().await?;

    println!("\n✅ All E2E tests passed!");

    Ok(())
}

async fn run_file_server_tests() -> Result<()> {
    let server_url =
        std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let password =
        std::env::var("UPLOAD_PASSWORD").context("UPLOAD_PASSWORD must match the server's secret")?;
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .and_then(Path::parent)
        .context("Failed to locate workspace root")?
        .to_path_buf();
    let server_data_dir = std::env::var("SERVER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| workspace_root.join("download"));
    let client_binary = workspace_root.join("target").join("release").join("client");

    // Create temporary test directories
    let test_data_dir = manifest_dir.join("test_data");
    let test_files_dir = test_data_dir.join("test_files");
    let download_dir = test_data_dir.join("downloaded");

    std::fs::create_dir_all(&test_files_dir)?;
    std::fs::create_dir_all(&download_dir)?;

    println!("Server URL: {}", server_url);
    println!("Server data dir: {:?}", server_data_dir);
    println!("Client binary: {:?}", client_binary);

    // Wait for server to be ready
    wait_for_server(&server_url).await?;

    let filenames = create_test_files(&test_files_dir, TEST_FILES_COUNT)?;

    let test_result = async {
        // Test upload
        println!("\n📤 Testing upload...");
        for filename in &filenames {
            let response = upload_file(
                &client_binary,
                &server_url,
                &password,
                &test_files_dir.join(filename),
            )?;
            anyhow::ensure!(
                response.code == 200 && &response.filename == filename,
                "Unexpected upload response: {:?}",
                response
            );
            info!(filename = %filename, save_path = %response.save_path, "uploaded");
        }
        println!("Upload completed successfully");

        // Validate server filesystem
        println!("\n🔍 Validating server filesystem...");
        filesystem_validator::validate_upload(&server_data_dir, &test_files_dir, &filenames)?;
        println!("✅ Server filesystem validation passed");

        // Test download
        println!("\n📥 Testing download...");
        download_file(&client_binary, &server_url, &download_dir, "file0.txt", false)?;
        filesystem_validator::validate_downloaded_file(&download_dir, &test_files_dir, "file0.txt")?;
        println!("✅ Downloaded file validation passed");

        // Test resumed download from a truncated local copy
        println!("\n⏯️  Testing resumed download...");
        let partial = download_dir.join("large.bin");
        let original = std::fs::read(test_files_dir.join("large.bin"))?;
        std::fs::write(&partial, &original[..LARGE_FILE_SIZE / 3])?;
        download_file(&client_binary, &server_url, &download_dir, "large.bin", true)?;
        filesystem_validator::validate_downloaded_file(&download_dir, &test_files_dir, "large.bin")?;
        download_file(&client_binary, &server_url, &download_dir, "large.bin", true)?;
        filesystem_validator::validate_downloaded_file(&download_dir, &test_files_dir, "large.bin")?;
        let mut oversized = original.clone();
        oversized.extend_from_slice(b"stale trailing bytes");
        std::fs::write(&partial, &oversized)?;
        download_file(&client_binary, &server_url, &download_dir, "large.bin", true)?;
        filesystem_validator::validate_downloaded_file(&download_dir, &test_files_dir, "large.bin")?;
        println!("✅ Resumed download validation passed");

        // Test wrong password
        println!("\n🔒 Testing upload with wrong password...");
        let before = filesystem_validator::snapshot(&server_data_dir)?;
        let status =
            raw_upload(&server_url, "definitely-wrong", "file0.txt", b"overwritten").await?;
        anyhow::ensure!(
            status == StatusCode::UNAUTHORIZED,
            "Expected 401 for wrong password, got {}",
            status
        );
        let status = raw_upload(&server_url, "", "intruder.txt", b"no secret").await?;
        anyhow::ensure!(
            status == StatusCode::UNAUTHORIZED,
            "Expected 401 without password, got {}",
            status
        );
        filesystem_validator::validate_unchanged(&server_data_dir, &before)?;
        println!("✅ Unauthorized uploads rejected");

        // Test path traversal and missing files
        println!("\n🛡️  Testing path traversal...");
        for path in [
            "/..%2F..%2Fetc%2Fpasswd",
            "/..%2Ffile0.txt",
            "/%2E%2E%2F%2E%2E%2Fetc%2Fhosts",
        ] {
            let (status, _) = raw_get(&server_url, path).await?;
            anyhow::ensure!(
                status == StatusCode::FORBIDDEN || status == StatusCode::NOT_FOUND,
                "Expected 403 or 404 for {}, got {}",
                path,
                status
            );
        }
        let (status, _) = raw_get(&server_url, "/nonexistent.txt").await?;
        anyhow::ensure!(
            status == StatusCode::NOT_FOUND,
            "Expected 404 for missing file, got {}",
            status
        );
        println!("✅ Path traversal and missing file checks passed");

        Ok::<(), anyhow::Error>(())
    };

    let result = test_result.await;

    // Always cleanup, even on error
    if let Err(e) = cleanup_test_data(&test_data_dir) {
        eprintln!("Warning: Failed to cleanup test data: {}", e);
    }
    if let Err(e) = cleanup_server_data(&server_data_dir, &filenames) {
        eprintln!("Warning: Failed to cleanup server data: {}", e);
    }

    result
}

fn keep_test_data() -> bool {
    std::env::var("KEEP_TEST_DATA").map(|v| v == "true").unwrap_or(false)
}

fn cleanup_test_data(test_data_dir: &Path) -> Result<()> {
    if keep_test_data() {
        println!(
            "\n⚠️  Keeping test data (KEEP_TEST_DATA=true): {:?}",
            test_data_dir
        );
        return Ok(());
    }

    println!("\n🧹 Cleaning up test data: {:?}", test_data_dir);
    if test_data_dir.exists() {
        std::fs::remove_dir_all(test_data_dir).with_context(|| {
            format!("Failed to remove test data directory: {:?}", test_data_dir)
        })?;
        println!("✅ Test data cleaned up");
    }
    Ok(())
}

/// Remove only the files this run uploaded; the storage directory may be shared
fn cleanup_server_data(server_data_dir: &Path, filenames: &[String]) -> Result<()> {
    if keep_test_data() {
        println!(
            "\n⚠️  Keeping server data (KEEP_TEST_DATA=true): {:?}",
            server_data_dir
        );
        return Ok(());
    }

    println!("\n🧹 Cleaning up uploaded files in: {:?}", server_data_dir);
    for filename in filenames {
        let path = server_data_dir.join(filename);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove uploaded file: {:?}", path))?;
        }
    }
    println!("✅ Server data cleaned up");
    Ok(())
}
