use std::fmt;
use std::str::FromStr;

use maskpaint_shared::MAX_DISPLAY_WIDTH;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which raster travels as `mask_image` when a pair is submitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskPayload {
    /// The original with the strokes drawn over it.
    #[default]
    Composite,
    /// The strokes alone on a transparent background, at native resolution.
    Mask,
}

impl FromStr for MaskPayload {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "composite" => Ok(MaskPayload::Composite),
            "mask" => Ok(MaskPayload::Mask),
            other => Err(format!("unknown mask payload {other:?}, expected composite or mask")),
        }
    }
}

impl fmt::Display for MaskPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskPayload::Composite => f.write_str("composite"),
            MaskPayload::Mask => f.write_str("mask"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    /// Base URL of the storage backend, without a trailing slash.
    pub api_base_url: String,
    pub max_display_width: u32,
    pub mask_payload: MaskPayload,
    /// Ignored on wasm, where the browser owns request timeouts.
    pub request_timeout_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_display_width: MAX_DISPLAY_WIDTH,
            mask_payload: MaskPayload::Composite,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EditorConfig {
    /// Reads `MASKPAINT_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Values that fail to parse keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("MASKPAINT_API_URL").filter(|value| !value.trim().is_empty()) {
            config = config.with_api_base_url(url);
        }
        if let Some(width) = lookup("MASKPAINT_MAX_DISPLAY_WIDTH")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|width| *width > 0)
        {
            config.max_display_width = width;
        }
        if let Some(payload) = lookup("MASKPAINT_MASK_PAYLOAD").and_then(|value| value.parse().ok())
        {
            config.mask_payload = payload;
        }
        if let Some(timeout) = lookup("MASKPAINT_TIMEOUT_SECS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|timeout| *timeout > 0)
        {
            config.request_timeout_secs = timeout;
        }
        config
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }
}
