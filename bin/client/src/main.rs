//! File transfer client

mod constants;
mod download;
mod logger;
mod upload;

use clap::{Parser, Subcommand};
use constants::{DEFAULT_SERVER_URL, DOWNLOADED_DIR, UPLOAD_PASSWORD_ENV};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Upload files to and download files from the file server")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file to the server
    Upload {
        /// File to upload
        file: PathBuf,
        /// Name to store the file under (default: the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER_URL)]
        server: String,
        /// Upload shared secret
        #[arg(short, long, env = UPLOAD_PASSWORD_ENV, hide_env_values = true)]
        password: String,
    },
    /// Download a file from the server
    Download {
        /// Filename to download
        filename: String,
        /// Server URL
        #[arg(short, long, default_value = DEFAULT_SERVER_URL)]
        server: String,
        /// Output directory for downloaded file
        #[arg(short, long, default_value = DOWNLOADED_DIR)]
        output_dir: PathBuf,
        /// Continue a partial download already present in the output directory
        #[arg(short, long)]
        resume: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match cli.command {
        Commands::Upload {
            file,
            name,
            server,
            password,
        } => upload::upload_file(&server, &password, &file, name.as_deref()),
        Commands::Download {
            filename,
            server,
            output_dir,
            resume,
        } => download::download_file(&server, &filename, &output_dir, resume),
    }
}
