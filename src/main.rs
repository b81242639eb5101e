// src/main.rs
use anyhow::Context;
use clap::{Parser, Subcommand};
use hubdrop::{Config, FileBlob, UploadManager};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "hubdrop",
    version,
    about = "Upload files to anonymous hosts with automatic fallback",
    long_about = None
)]
struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", env = "HUBDROP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a file through the fallback chain.
    Upload {
        path: PathBuf,

        /// Require an image type and apply image preprocessing.
        #[arg(long)]
        image: bool,

        /// Downscale and re-encode images before upload.
        #[arg(long, requires = "image")]
        compress: bool,
    },
    /// Print every recorded upload.
    History,
    /// Print the URL recorded under a short id.
    Get { id: String },
    /// Forget all recorded uploads.
    Clear,
    /// Print limits and record count.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = CliArgs::parse();
    let config = Config::load(args.config.as_deref())?;
    let manager = UploadManager::from_config(&config).await?;

    match args.command {
        Command::Upload {
            path,
            image,
            compress,
        } => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            let file = FileBlob::new(filename, content_type, data);

            let validator = manager.validator();
            let class = if validator.is_image(&file) {
                "image"
            } else if validator.is_audio(&file) {
                "audio"
            } else {
                "file"
            };
            info!(
                "Read {} as {} ({}, {} bytes)",
                path.display(),
                class,
                file.content_type,
                file.size()
            );

            let mut options = config.upload_options();
            if compress {
                options.compression = Some(config.compression);
            }

            let result = if image {
                manager.upload_image(&file, &options).await?
            } else {
                manager.upload_file(&file, &options).await?
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::History => {
            let history = manager.get_history().await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Command::Get { id } => match manager.get_url_by_id(&id).await? {
            Some(url) => println!("{}", url),
            None => anyhow::bail!("no upload recorded under {}", id),
        },
        Command::Clear => {
            manager.clear_history().await?;
            info!("History cleared");
        }
        Command::Status => {
            let status = manager.get_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
