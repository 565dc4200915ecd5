use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use maskpaint_editor::data_uri;
use maskpaint_editor::notice::{DELETE_CONFIRMATION, DELETE_FAILED};
use maskpaint_editor::{
    ApiClient, DeleteOutcome, EditorConfig, EditorSession, GalleryState, LoadOutcome,
    MaskPayload, SubmitOutcome,
};
use maskpaint_shared::{encode_draft_file, parse_draft};

use crate::error::CliError;

async fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path).await.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Loads the image and replays the stroke draft over it.
async fn open_session(
    config: &EditorConfig,
    image: &Path,
    strokes: &Path,
) -> Result<EditorSession, CliError> {
    let mut session = EditorSession::new(config);
    let bytes = read_file(image).await?;
    session.load_image_bytes(&bytes)?;
    let draft_bytes = read_file(strokes).await?;
    let draft = parse_draft(&draft_bytes).map_err(|source| CliError::Draft {
        path: strokes.to_path_buf(),
        source,
    })?;
    session.load_draft(&draft)?;
    if let Some(surface) = session.surface() {
        log::info!(
            "Replayed {} strokes on a {} surface",
            surface.strokes().len(),
            surface.size()
        );
    }
    Ok(session)
}

pub struct PreviewArgs {
    pub image: PathBuf,
    pub strokes: PathBuf,
    pub out: PathBuf,
    pub mask_out: Option<PathBuf>,
    pub draft_out: Option<PathBuf>,
}

pub async fn preview(config: &EditorConfig, args: PreviewArgs) -> Result<(), CliError> {
    let mut session = open_session(config, &args.image, &args.strokes).await?;
    let composite = data_uri::decode(&session.render_preview()?.data_uri)?;
    write_file(&args.out, &composite).await?;
    if let Some(path) = &args.mask_out {
        if let Some(surface) = session.surface() {
            let mask = data_uri::encode_png(&surface.export())?;
            write_file(path, &mask).await?;
        }
    }
    if let Some(path) = &args.draft_out {
        if let Some(draft) = session.draft() {
            let bytes = encode_draft_file(&draft).map_err(|source| CliError::Draft {
                path: path.clone(),
                source,
            })?;
            write_file(path, &bytes).await?;
        }
    }
    Ok(())
}

pub async fn submit(
    config: &EditorConfig,
    api: &ApiClient,
    image: &Path,
    strokes: &Path,
    payload: Option<MaskPayload>,
) -> Result<(), CliError> {
    let mut session = open_session(config, image, strokes).await?;
    if let Some(payload) = payload {
        session.set_mask_payload(payload);
    }
    let outcome = session.submit(api).await?;
    let notice = outcome.notice();
    match outcome {
        SubmitOutcome::Saved(response) => {
            if let Some(notice) = notice {
                println!("{notice}");
            }
            if let Some(url) = response.original_url {
                println!("original: {url}");
            }
            if let Some(url) = response.mask_url {
                println!("mask: {url}");
            }
            Ok(())
        }
        SubmitOutcome::Failed(source) => Err(CliError::Rejected {
            message: notice.map(|notice| notice.message).unwrap_or_default(),
            source,
        }),
        SubmitOutcome::Stale => Ok(()),
    }
}

pub async fn list(api: &ApiClient) -> Result<(), CliError> {
    let mut gallery = GalleryState::new();
    if let LoadOutcome::Failed(error) = gallery.refresh(api).await {
        return Err(error.into());
    }
    if gallery.is_empty() {
        println!("No saved image pairs.");
        return Ok(());
    }
    for pair in gallery.pairs() {
        println!(
            "{}\t{}\t{}\t{}",
            pair.id,
            pair.created_label(),
            pair.original_url,
            pair.mask_url
        );
    }
    Ok(())
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn ask(question: &str) -> bool {
    let mut stdout = tokio::io::stdout();
    let prompt = format!("{question} [y/N] ");
    if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
        return false;
    }
    let mut answer = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    match stdin.read_line(&mut answer).await {
        Ok(_) => is_yes(&answer),
        Err(error) => {
            log::warn!("Could not read confirmation: {error}");
            false
        }
    }
}

pub async fn delete(api: &ApiClient, id: i64, yes: bool) -> Result<(), CliError> {
    let confirmed = yes || ask(DELETE_CONFIRMATION).await;
    let mut gallery = GalleryState::new();
    match gallery.delete(api, id, |_| confirmed).await {
        None => {
            println!("Cancelled.");
            Ok(())
        }
        Some(DeleteOutcome::Deleted { id }) => {
            println!("Deleted image pair {id}.");
            Ok(())
        }
        Some(DeleteOutcome::Failed { error, .. }) => Err(CliError::Rejected {
            message: DELETE_FAILED.to_string(),
            source: error,
        }),
    }
}
