//! Command-line front end
//!
//! Drives the engine headlessly: restore the persisted collage for a set of
//! items, then export it, print its layout, or reset it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use collage::capture::{CaptureOptions, FileLoader, HttpLoader, RoutingLoader};
use collage::domain::CollageItem;
use collage::export::{self, ExportFormat, Exporter};
use collage::persistence::{FileStore, SnapshotStore};
use collage::{CollageEngine, EngineConfig};

/// Default container width when none is given (the `lg` breakpoint)
const DEFAULT_WIDTH: f32 = 1250.0;

#[derive(Parser, Debug)]
#[command(
    name = "collage",
    version,
    about = "Lay out images as a responsive collage and export it"
)]
pub struct CliArgs {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted collage state
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export the collage to PNG, JPEG or PDF
    Export {
        #[command(flatten)]
        collage: CollageArgs,

        /// Output format: png, jpeg or pdf
        #[arg(short, long, default_value = "png")]
        format: ExportFormat,

        /// Output directory (defaults to the configured one, else Pictures)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// File name prefix; the date and extension are appended
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the placements of every breakpoint as JSON
    Layout {
        #[command(flatten)]
        collage: CollageArgs,
    },
    /// Regenerate the default layout, keeping transforms
    Reset {
        #[command(flatten)]
        collage: CollageArgs,
    },
    /// Forget all persisted layout and transform state
    Clear,
    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the config file, filling in missing fields
        #[arg(long)]
        write: bool,
    },
}

#[derive(Args, Debug)]
pub struct CollageArgs {
    /// JSON array of items: `[{"id": "...", "imageUrl": "..."}]`
    #[arg(short, long)]
    pub items: PathBuf,

    /// Container width in pixels
    #[arg(short, long, default_value_t = DEFAULT_WIDTH)]
    pub width: f32,
}

pub async fn run(args: CliArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    let store_dir = args
        .store
        .clone()
        .or_else(|| config.store_dir.clone())
        .or_else(EngineConfig::default_store_dir)
        .context("could not determine a directory for the collage state")?;
    log::debug!("Using state directory {}", store_dir.display());
    let store = SnapshotStore::new(FileStore::new(store_dir));

    match args.command {
        Command::Export {
            collage,
            format,
            out_dir,
            name,
        } => {
            let items = read_items(&collage.items)?;
            let engine = CollageEngine::new(config.clone(), items, store, collage.width);
            let root = collage
                .items
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let options = CaptureOptions::from(&config.export);
            // The blocking client parks on its runtime thread while building
            let timeout = options.timeout;
            let http = tokio::task::spawn_blocking(move || HttpLoader::new(timeout))
                .await?
                .context("building the HTTP client")?;
            let loader = RoutingLoader::new(FileLoader::with_root(root), http);
            let exporter = Exporter::new(Arc::new(loader), options);
            let artifact = exporter
                .export(engine.visual_tree(), format)
                .await
                .map_err(|err| {
                    let message = err.user_message();
                    anyhow::Error::new(err).context(message)
                })?;
            let out_dir = out_dir.unwrap_or_else(|| config.export.resolved_output_dir());
            let name = name.unwrap_or_else(|| config.export.file_base_name.clone());
            let path = export::save_artifact(
                &artifact,
                &out_dir,
                &export::file_name_today(&name, format),
            )?;
            println!("{}", path.display());
        }
        Command::Layout { collage } => {
            let items = read_items(&collage.items)?;
            let engine = CollageEngine::new(config, items, store, collage.width);
            let json = serde_json::to_string_pretty(engine.layouts())?;
            println!("{json}");
        }
        Command::Reset { collage } => {
            let items = read_items(&collage.items)?;
            let mut engine = CollageEngine::new(config, items, store, collage.width);
            engine.reset_layout();
            log::info!("Layout reset to defaults");
        }
        Command::Clear => {
            let mut store = store;
            store.clear();
            log::info!("Cleared persisted collage state");
        }
        Command::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if write {
                let path = args
                    .config
                    .clone()
                    .or_else(EngineConfig::default_path)
                    .context("could not determine the config file location")?;
                config.save_to(&path)?;
                log::info!("Wrote config to {}", path.display());
            }
        }
    }
    Ok(())
}

fn read_items(path: &Path) -> Result<Vec<CollageItem>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing items in {}", path.display()))
}
