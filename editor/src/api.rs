//! Client for the storage backend's REST surface.

use maskpaint_shared::{ImagePair, UploadRequest, UploadResponse};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};

use crate::config::EditorConfig;
use crate::error::ApiError;

#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &EditorConfig) -> Result<Self, ApiError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder =
            builder.timeout(std::time::Duration::from_secs(config.request_timeout_secs));
        let http = builder
            .build()
            .map_err(|error| ApiError::Transport(format!("failed to build HTTP client: {error}")))?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `POST /upload`. Only HTTP 200 counts as stored.
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, ApiError> {
        let url = self.endpoint("upload");
        let body = serde_json::to_vec(request)
            .map_err(|error| ApiError::Transport(format!("failed to encode request: {error}")))?;
        log::info!("Uploading image pair url={url} bytes={}", body.len());
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(response).await);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(UploadResponse::default());
        }
        match serde_json::from_str::<UploadResponse>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(error) => {
                log::debug!("Upload acknowledged with unrecognized body: {error}");
                Ok(UploadResponse::default())
            }
        }
    }

    /// `GET /images`, in backend order.
    pub async fn list_images(&self) -> Result<Vec<ImagePair>, ApiError> {
        let url = self.endpoint("images");
        log::debug!("Fetching image pairs url={url}");
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|error| ApiError::InvalidResponse(error.to_string()))
    }

    /// `DELETE /images/{id}`. Any 2xx status counts as deleted.
    pub async fn delete_image(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("images/{id}"));
        log::info!("Deleting image pair id={id}");
        let response = self.http.delete(&url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}

async fn status_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    log::warn!("Backend rejected request status={status} body={body:?}");
    ApiError::Status { status, body }
}
