use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use crate::config::Config;
use crate::core::infrastructure::ImportStatus;
use crate::core::model::FileKind;
use crate::core::services::DataFileUpload;
use crate::error::Result;
use crate::services::SimpleServices;

use super::resolve_actor;

#[derive(Args)]
pub struct FilesArgs {
    #[command(subcommand)]
    command: FilesCommands,
}

#[derive(Subcommand)]
enum FilesCommands {
    /// Upload a data/metadata pair, optionally with their source archive
    UploadData {
        release: Uuid,

        /// Data set display name
        #[arg(long)]
        name: String,

        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        meta: PathBuf,

        #[arg(long)]
        archive: Option<PathBuf>,

        /// Data file this upload replaces
        #[arg(long)]
        replacing: Option<Uuid>,
    },

    /// List a release's files
    List {
        release: Uuid,

        #[arg(long, value_parser = parse_kind)]
        kind: Option<FileKind>,
    },

    /// Apply a complete new data-file order
    Reorder { release: Uuid, ids: Vec<Uuid> },

    /// Delete a data file with its metadata pair and, when unshared, its
    /// source archive
    DeleteData { release: Uuid, id: Uuid },

    UploadAncillary {
        release: Uuid,

        #[arg(long)]
        name: String,

        #[arg(long)]
        file: PathBuf,
    },

    DeleteAncillary { release: Uuid, id: Uuid },

    /// Record the outcome of a data file import
    SetImportStatus {
        file: Uuid,

        #[arg(long, value_parser = parse_import_status)]
        status: ImportStatus,
    },

    /// Upload an image and print the path to embed in html bodies
    UploadImage {
        release: Uuid,

        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value = "image/png")]
        content_type: String,
    },
}

fn parse_kind(s: &str) -> std::result::Result<FileKind, String> {
    FileKind::parse(s).ok_or_else(|| format!("unknown file kind: {s}"))
}

fn parse_import_status(s: &str) -> std::result::Result<ImportStatus, String> {
    ImportStatus::parse(s).ok_or_else(|| format!("unknown import status: {s}"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub async fn execute(args: FilesArgs, services: &SimpleServices, actor: Option<&str>) -> Result<()> {
    let config: std::sync::Arc<Config> = services.config();
    let set = services.create_services().await?;

    match args.command {
        FilesCommands::UploadData {
            release,
            name,
            data,
            meta,
            archive,
            replacing,
        } => {
            let actor = resolve_actor(actor, &config)?;

            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .expect("valid spinner template"),
            );
            pb.set_message(format!("Uploading {}", data.display()));

            let data_contents = tokio::fs::read(&data).await?;
            let meta_contents = tokio::fs::read(&meta).await?;
            let source_archive = match &archive {
                Some(path) => Some((file_name(path), tokio::fs::read(path).await?)),
                None => None,
            };

            let info = set
                .files
                .upload_data(
                    release,
                    DataFileUpload {
                        name,
                        data_filename: file_name(&data),
                        data_contents,
                        meta_filename: file_name(&meta),
                        meta_contents,
                        source_archive,
                        replacing_file_id: replacing,
                    },
                    &actor,
                )
                .await?;

            pb.finish_with_message(format!(
                "✓ Uploaded {} as {} (position {})",
                info.file.filename, info.file.id, info.link.ord
            ));
        }
        FilesCommands::List { release, kind } => {
            for info in set.files.list(release, kind).await? {
                println!(
                    "{}  {}  {:<9} {}  {}",
                    info.link.ord,
                    info.file.id,
                    info.file.kind.as_str(),
                    info.file.filename,
                    info.link.name.as_deref().unwrap_or("-"),
                );
            }
        }
        FilesCommands::Reorder { release, ids } => {
            set.files.reorder_data(release, ids).await?;
            println!("Data files reordered");
        }
        FilesCommands::DeleteData { release, id } => {
            set.files.delete_data(release, id).await?;
            println!("Deleted data file {id}");
        }
        FilesCommands::UploadAncillary {
            release,
            name,
            file,
        } => {
            let actor = resolve_actor(actor, &config)?;
            let contents = tokio::fs::read(&file).await?;
            let info = set
                .files
                .upload_ancillary(release, &name, &file_name(&file), &contents, &actor)
                .await?;
            println!("Uploaded ancillary file {}", info.file.id);
        }
        FilesCommands::DeleteAncillary { release, id } => {
            set.files.delete_ancillary(release, id).await?;
            println!("Deleted ancillary file {id}");
        }
        FilesCommands::SetImportStatus { file, status } => {
            set.imports.set_import_status(file, status).await?;
            println!("Import for {} marked {}", file, status.as_str());
        }
        FilesCommands::UploadImage {
            release,
            file,
            content_type,
        } => {
            let actor = resolve_actor(actor, &config)?;
            let contents = tokio::fs::read(&file).await?;
            let (image, path) = set
                .images
                .upload(release, &file_name(&file), &content_type, &contents, &actor)
                .await?;
            println!("Uploaded image {}", image.id);
            println!("Embed path: {path}");
        }
    }

    Ok(())
}
