use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use maskpaint_editor::{ApiClient, EditorConfig, MaskPayload};

mod commands;
mod error;

use crate::commands::PreviewArgs;
use crate::error::CliError;

/// Paint masks over images and manage saved image pairs.
#[derive(Parser, Debug)]
#[command(name = "maskpaint", author, version, about)]
struct Args {
    /// Storage backend base URL. Overrides MASKPAINT_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a stroke draft over an image and write the PNG
    Preview {
        #[arg(long)]
        image: PathBuf,
        /// Binary draft file or JSON stroke list
        #[arg(long)]
        strokes: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Also write the bare mask at display size
        #[arg(long)]
        mask_out: Option<PathBuf>,
        /// Also write the strokes as a binary draft
        #[arg(long)]
        draft_out: Option<PathBuf>,
    },
    /// Upload an image and its mask to the backend
    Submit {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        strokes: PathBuf,
        /// What to send as the mask image: composite or mask
        #[arg(long)]
        payload: Option<MaskPayload>,
    },
    /// List saved image pairs
    List,
    /// Delete one saved image pair
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn config_from(args: &Args) -> EditorConfig {
    let config = EditorConfig::from_env();
    match &args.api_url {
        Some(url) => config.with_api_base_url(url.as_str()),
        None => config,
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = config_from(&args);
    log::debug!("Using configuration {config:?}");
    match args.command {
        Command::Preview {
            image,
            strokes,
            out,
            mask_out,
            draft_out,
        } => {
            commands::preview(
                &config,
                PreviewArgs {
                    image,
                    strokes,
                    out,
                    mask_out,
                    draft_out,
                },
            )
            .await
        }
        Command::Submit {
            image,
            strokes,
            payload,
        } => {
            let api = ApiClient::new(&config)?;
            commands::submit(&config, &api, &image, &strokes, payload).await
        }
        Command::List => commands::list(&ApiClient::new(&config)?).await,
        Command::Delete { id, yes } => commands::delete(&ApiClient::new(&config)?, id, yes).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error}");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
