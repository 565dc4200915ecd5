use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use image::{ImageFormat, Rgba, RgbaImage};
use maskpaint_editor::{
    data_uri, ApiClient, ApiError, DeleteOutcome, EditorConfig, EditorPhase, EditorSession,
    GalleryState, LoadOutcome, SubmitOutcome,
};
use maskpaint_shared::{Color, ImagePair, Point, UploadRequest};
use tokio::sync::Mutex;

#[derive(Default)]
struct Backend {
    upload_status: u16,
    uploads: Vec<UploadRequest>,
    pairs: Vec<ImagePair>,
    deleted: Vec<i64>,
}

type Shared = Arc<Mutex<Backend>>;

async fn upload(
    State(backend): State<Shared>,
    Json(request): Json<UploadRequest>,
) -> (StatusCode, String) {
    let mut backend = backend.lock().await;
    backend.uploads.push(request);
    let status = StatusCode::from_u16(backend.upload_status).unwrap_or(StatusCode::OK);
    let body = if status == StatusCode::OK {
        r#"{"original_url":"/files/1.png","mask_url":"/files/1_mask.png"}"#.to_string()
    } else {
        "storage unavailable".to_string()
    };
    (status, body)
}

async fn list(State(backend): State<Shared>) -> Json<Vec<ImagePair>> {
    Json(backend.lock().await.pairs.clone())
}

async fn remove(State(backend): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    let mut backend = backend.lock().await;
    let before = backend.pairs.len();
    backend.pairs.retain(|pair| pair.id != id);
    if backend.pairs.len() == before {
        return StatusCode::NOT_FOUND;
    }
    backend.deleted.push(id);
    StatusCode::NO_CONTENT
}

async fn spawn_backend(backend: Backend) -> (ApiClient, Shared) {
    let shared = Arc::new(Mutex::new(backend));
    let app = Router::new()
        .route("/upload", post(upload))
        .route("/images", get(list))
        .route("/images/:id", delete(remove))
        .with_state(shared.clone());
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let config = EditorConfig::default().with_api_base_url(format!("http://{addr}"));
    (ApiClient::new(&config).unwrap(), shared)
}

fn pair(id: i64) -> ImagePair {
    ImagePair {
        id,
        original_url: format!("/files/{id}.png"),
        mask_url: format!("/files/{id}_mask.png"),
        created_at: "2024-05-01 09:30:00".into(),
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn decode_base64_png(payload: &str) -> RgbaImage {
    let bytes = data_uri::decode(&format!("data:image/png;base64,{payload}")).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

#[tokio::test]
async fn upload_succeeds_only_on_200() {
    let (api, backend) = spawn_backend(Backend {
        upload_status: 200,
        ..Default::default()
    })
    .await;
    let request = UploadRequest {
        original_image: "AAAA".into(),
        mask_image: "BBBB".into(),
    };
    let response = api.upload(&request).await.unwrap();
    assert_eq!(response.mask_url.as_deref(), Some("/files/1_mask.png"));

    backend.lock().await.upload_status = 201;
    assert!(matches!(
        api.upload(&request).await,
        Err(ApiError::Status { status: 201, .. })
    ));

    backend.lock().await.upload_status = 500;
    match api.upload(&request).await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "storage unavailable");
        }
        other => panic!("unexpected upload result: {other:?}"),
    }
    assert_eq!(backend.lock().await.uploads.len(), 3);
    assert_eq!(backend.lock().await.uploads[0], request);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let config = EditorConfig::default().with_api_base_url("http://127.0.0.1:9");
    let api = ApiClient::new(&config).unwrap();
    assert!(matches!(
        api.list_images().await,
        Err(ApiError::Transport(_))
    ));
}

#[tokio::test]
async fn gallery_lists_and_deletes_one_pair() {
    let (api, backend) = spawn_backend(Backend {
        pairs: vec![pair(1), pair(2), pair(3)],
        ..Default::default()
    })
    .await;
    let mut gallery = GalleryState::new();
    assert_eq!(gallery.refresh(&api).await, LoadOutcome::Loaded(3));

    let declined = gallery.delete(&api, 2, |_| false).await;
    assert_eq!(declined, None);
    assert!(backend.lock().await.deleted.is_empty());

    let outcome = gallery.delete(&api, 2, |_| true).await;
    assert_eq!(outcome, Some(DeleteOutcome::Deleted { id: 2 }));
    let ids: Vec<i64> = gallery.pairs().iter().map(|pair| pair.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(backend.lock().await.deleted, vec![2]);

    let missing = gallery.delete(&api, 42, |_| true).await.unwrap();
    assert!(missing.notice().is_some());
    assert_eq!(gallery.pairs().len(), 2);
}

#[tokio::test]
async fn submitting_a_drawn_mask_resets_the_session() {
    let (api, backend) = spawn_backend(Backend {
        upload_status: 200,
        ..Default::default()
    })
    .await;
    let mut session = EditorSession::new(&EditorConfig::default());
    session.load_image_bytes(&png(1600, 900)).unwrap();
    session.set_color(Color::RED);
    session.begin_stroke(Point::new(100.0, 100.0));
    session.extend_stroke(Point::new(300.0, 100.0));
    session.end_stroke();
    session.render_preview().unwrap();
    assert_eq!(session.phase(), EditorPhase::PreviewReady);

    let outcome = session.submit(&api).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Saved(_)));
    assert_eq!(session.phase(), EditorPhase::Empty);

    let backend = backend.lock().await;
    let request = &backend.uploads[0];
    assert!(!request.original_image.starts_with("data:"));
    assert_eq!(decode_base64_png(&request.original_image).dimensions(), (1600, 900));
    let composite = decode_base64_png(&request.mask_image);
    assert_eq!(composite.dimensions(), (1600, 900));
    let stroke = composite.get_pixel(400, 200);
    assert!(stroke[0] > 250 && stroke[1] < 5 && stroke[2] < 5);
}

#[tokio::test]
async fn failed_submission_keeps_the_drawing() {
    let (api, _backend) = spawn_backend(Backend {
        upload_status: 503,
        ..Default::default()
    })
    .await;
    let mut session = EditorSession::new(&EditorConfig::default());
    session.load_image_bytes(&png(64, 64)).unwrap();
    session.begin_stroke(Point::new(4.0, 4.0));
    session.end_stroke();

    let outcome = session.submit(&api).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert!(outcome.notice().is_some());
    assert_ne!(session.phase(), EditorPhase::Empty);
    assert_eq!(session.surface().unwrap().strokes().len(), 1);
}
