//! Headless engine behind the mask editor.
//!
//! Holds everything that does not touch a DOM: decoding and sizing the
//! chosen image, the stroke surface and its rasterizer, compositing, the
//! session state machine, the gallery, and the HTTP client for the storage
//! backend. The browser front end and the CLI both drive it.

pub mod api;
pub mod compositor;
pub mod config;
pub mod data_uri;
pub mod error;
pub mod gallery;
pub mod lifecycle;
pub mod loader;
pub mod notice;
pub mod raster;
pub mod session;
pub mod surface;

pub use api::ApiClient;
pub use compositor::Compositor;
pub use config::{EditorConfig, MaskPayload};
pub use error::{ApiError, EditorError};
pub use gallery::{DeleteOutcome, DeleteTicket, GalleryState, LoadOutcome};
pub use lifecycle::{RequestSequence, RequestToken, ScopeHandle, ViewScope};
pub use loader::LoadedImage;
pub use notice::{Notice, NoticeKind};
pub use session::{
    CompositePreview, EditorPhase, EditorSession, PreviewOutcome, PreviewTicket, SubmitOutcome,
    SubmitTicket,
};
pub use surface::MaskSurface;
