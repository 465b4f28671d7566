//! End-to-end workflow scenarios
//!
//! A filesystem media source and the real HTTP client run against a stub
//! server, so every transition goes through the same code the CLI uses.

mod common;

use common::{removal_body, write_test_image, StubResponse, StubServer};
use serde_json::json;
use snapclean::client::{RECENT_EDITS_PATH, REMOVE_BACKGROUND_PATH};
use snapclean::workflow::PROCESS_FAILURE_PREFIX;
use snapclean::{
    ClientConfig, FailureStage, FileMediaSource, HomeView, HttpRemovalClient, ImageSource,
    RecentEditId, ResultExporter, ResultOrigin, ResultsView, StateKind, WorkflowConfig,
    WorkflowController, WorkflowState,
};
use std::sync::Arc;
use tempfile::TempDir;

fn controller(server: &StubServer, media: FileMediaSource) -> WorkflowController {
    let config = ClientConfig::builder()
        .base_url(server.base_url())
        .build()
        .unwrap();
    let client = Arc::new(HttpRemovalClient::new(config).unwrap());
    WorkflowController::new(
        Arc::new(media),
        client.clone(),
        client,
        WorkflowConfig::builder().without_timeline().build().unwrap(),
    )
}

#[tokio::test]
async fn test_library_pick_is_cropped_submitted_and_recorded() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let photo = write_test_image(dir.path(), "photo.png", 300, 200);
    let server = StubServer::builder()
        .route(
            "POST",
            REMOVE_BACKGROUND_PATH,
            StubResponse::json(
                200,
                removal_body("file:///edited.jpg", "https://cdn.test/out.png", 200, 200),
            ),
        )
        .route("POST", RECENT_EDITS_PATH, StubResponse::json(201, json!({"id": 9})))
        .start()
        .await;

    let media = FileMediaSource::new(dir.path().join("work")).with_library_selection(&photo);
    let mut instance = controller(&server, media).run(ImageSource::Library).await;
    instance.settle_persistence().await;

    assert_eq!(
        instance.history(),
        &[
            StateKind::Idle,
            StateKind::Acquiring,
            StateKind::Submitting,
            StateKind::Persisting,
            StateKind::Succeeded
        ]
    );

    let submitted = server.requests_to("POST", REMOVE_BACKGROUND_PATH);
    assert_eq!(submitted.len(), 1);
    let body = submitted[0].json();
    assert_eq!(body["imageWidth"], 200);
    assert_eq!(body["imageHeight"], 200);
    let uri = body["imageUri"].as_str().unwrap();
    assert!(uri.starts_with("file://"));
    assert!(uri.ends_with(".jpg"));

    let recorded = server.requests_to("POST", RECENT_EDITS_PATH);
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].json()["processed_image_uri"], "https://cdn.test/out.png");

    let delivery = instance.delivery().unwrap();
    assert_eq!(delivery.origin, ResultOrigin::Removal);
    assert_eq!(delivery.result.processing_time_ms, 1200);
}

#[tokio::test]
async fn test_server_failure_fails_without_recording() {
    let dir = TempDir::new().unwrap();
    let photo = write_test_image(dir.path(), "photo.png", 64, 64);
    let server = StubServer::builder()
        .route(
            "POST",
            REMOVE_BACKGROUND_PATH,
            StubResponse::raw(500, "out of GPUs"),
        )
        .start()
        .await;

    let media = FileMediaSource::new(dir.path().join("work"))
        .with_library_selection(&photo);
    let mut instance = controller(&server, media).run(ImageSource::Library).await;
    instance.settle_persistence().await;

    let failure = instance.failure().unwrap();
    assert_eq!(failure.stage, FailureStage::Submission);
    assert_eq!(
        failure.message,
        format!(
            "{}Background removal failed (HTTP 500): out of GPUs",
            PROCESS_FAILURE_PREFIX
        )
    );
    assert!(server.requests_to("POST", RECENT_EDITS_PATH).is_empty());
}

#[tokio::test]
async fn test_recording_failure_does_not_change_the_outcome() {
    let dir = TempDir::new().unwrap();
    let photo = write_test_image(dir.path(), "photo.png", 64, 64);
    let server = StubServer::builder()
        .route(
            "POST",
            REMOVE_BACKGROUND_PATH,
            StubResponse::json(200, removal_body("a", "https://cdn.test/b.png", 64, 64)),
        )
        .route("POST", RECENT_EDITS_PATH, StubResponse::raw(500, "db locked"))
        .start()
        .await;

    let media = FileMediaSource::new(dir.path().join("work")).with_library_selection(&photo);
    let mut instance = controller(&server, media).run(ImageSource::Library).await;
    instance.settle_persistence().await;

    assert_eq!(instance.state().kind(), StateKind::Succeeded);
    assert_eq!(server.requests_to("POST", RECENT_EDITS_PATH).len(), 1);
}

#[tokio::test]
async fn test_camera_without_capture_dir_is_denied() {
    let dir = TempDir::new().unwrap();
    let server = StubServer::builder().start().await;

    let media = FileMediaSource::new(dir.path().join("work"));
    let instance = controller(&server, media).run(ImageSource::Camera).await;

    assert_eq!(instance.state(), &WorkflowState::Idle);
    assert_eq!(
        instance.notice().unwrap().message,
        "Please allow camera access to take photos."
    );
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_camera_captures_newest_image() {
    let dir = TempDir::new().unwrap();
    let captures = dir.path().join("dcim");
    std::fs::create_dir_all(&captures).unwrap();
    write_test_image(&captures, "shot.png", 120, 80);
    let server = StubServer::builder()
        .route(
            "POST",
            REMOVE_BACKGROUND_PATH,
            StubResponse::json(200, removal_body("a", "https://cdn.test/b.png", 120, 80)),
        )
        .route("POST", RECENT_EDITS_PATH, StubResponse::json(201, json!({})))
        .start()
        .await;

    let media = FileMediaSource::new(dir.path().join("work")).with_capture_dir(&captures);
    let config = ClientConfig::builder()
        .base_url(server.base_url())
        .build()
        .unwrap();
    let client = Arc::new(HttpRemovalClient::new(config).unwrap());
    let controller = WorkflowController::new(
        Arc::new(media),
        client.clone(),
        client,
        WorkflowConfig::builder()
            .without_timeline()
            .pick_options(snapclean::PickOptions {
                allow_editing: false,
                ..snapclean::PickOptions::default()
            })
            .build()
            .unwrap(),
    );

    let mut instance = controller.run(ImageSource::Camera).await;
    instance.settle_persistence().await;

    assert_eq!(instance.state().kind(), StateKind::Succeeded);
    let body = server.requests_to("POST", REMOVE_BACKGROUND_PATH)[0].json();
    assert!(body["imageUri"].as_str().unwrap().ends_with("shot.png"));
    assert_eq!(body["imageWidth"], 120);
    assert_eq!(body["imageHeight"], 80);
}

#[tokio::test]
async fn test_missing_library_file_is_a_silent_cancel() {
    let dir = TempDir::new().unwrap();
    let server = StubServer::builder().start().await;

    let media = FileMediaSource::new(dir.path().join("work"))
        .with_library_selection(dir.path().join("gone.jpg"));
    let instance = controller(&server, media).run(ImageSource::Library).await;

    assert_eq!(instance.state(), &WorkflowState::Idle);
    assert!(instance.notice().is_none());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_reopen_recent_edit_and_save_it() {
    let dir = TempDir::new().unwrap();
    let server = StubServer::builder()
        .route("GET", "/files/out.png", StubResponse::raw(200, "PNGDATA"))
        .start()
        .await;
    let processed = server.url("/files/out.png");
    let list = StubServer::builder()
        .route(
            "GET",
            RECENT_EDITS_PATH,
            StubResponse::json(
                200,
                json!({"recent_edits": [{
                    "id": "edit-1",
                    "original_image_uri": "file:///a.jpg",
                    "processed_image_uri": processed,
                    "image_width": 10,
                    "image_height": 10,
                    "processing_time": 300
                }]}),
            ),
        )
        .start()
        .await;

    let config = ClientConfig::builder()
        .base_url(list.base_url())
        .build()
        .unwrap();
    let client = HttpRemovalClient::new(config).unwrap();

    let mut home = HomeView::new();
    home.refresh(&client).await;
    let edit = home.open(0).unwrap().clone();
    assert_eq!(edit.id, RecentEditId::Text("edit-1".to_string()));

    let media = FileMediaSource::new(dir.path().join("work"));
    let instance = controller(&list, media).open_recent(&edit);
    assert_eq!(instance.history(), &[StateKind::Idle, StateKind::Succeeded]);
    assert!(list.requests_to("POST", REMOVE_BACKGROUND_PATH).is_empty());

    let mut view = ResultsView::new(instance.delivery().unwrap());
    assert_eq!(view.displayed_uri(), processed);
    view.toggle_comparison();
    assert_eq!(view.displayed_uri(), "file:///a.jpg");

    let exporter = ResultExporter::with_default_dir(dir.path()).unwrap();
    let target = dir.path().join("saved.png");
    let saved = exporter.save(view.result(), Some(&target)).await.unwrap();
    assert_eq!(std::fs::read(saved).unwrap(), b"PNGDATA");
}

#[tokio::test]
async fn test_home_view_degrades_to_empty() {
    let server = StubServer::builder()
        .route("GET", RECENT_EDITS_PATH, StubResponse::raw(500, "nope"))
        .start()
        .await;
    let config = ClientConfig::builder()
        .base_url(server.base_url())
        .build()
        .unwrap();
    let client = HttpRemovalClient::new(config).unwrap();

    let mut home = HomeView::new();
    home.refresh(&client).await;

    assert!(home.is_empty());
    assert!(!home.loading);
}
