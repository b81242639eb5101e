use hubdrop::config::{BackendDescriptor, BackendKind, CompressionOptions, StorageConfig};
use hubdrop::{Config, FileBlob, UploadError, UploadManager, UploadOptions, ValidationError};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn manager() -> UploadManager {
    let config = Config {
        storage: StorageConfig::Memory,
        ..Config::default()
    };
    UploadManager::from_config(&config).await.unwrap()
}

fn catbox(server: &MockServer) -> BackendDescriptor {
    BackendDescriptor::new(BackendKind::Catbox).with_endpoint(format!("{}/catbox", server.uri()))
}

fn imgbb(server: &MockServer, key: Option<&str>) -> BackendDescriptor {
    let descriptor =
        BackendDescriptor::new(BackendKind::Imgbb).with_endpoint(format!("{}/imgbb", server.uri()));
    match key {
        Some(key) => descriptor.with_api_key(key),
        None => descriptor,
    }
}

fn png_file(width: u32, height: u32) -> FileBlob {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 220])));
    let mut data = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut data), ImageFormat::Png)
        .unwrap();
    FileBlob::new("shot.png", "image/png", data)
}

#[tokio::test]
async fn oversized_file_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager().await;
    let file = FileBlob::new("huge.bin", "application/octet-stream", vec![0u8; 11 * 1024 * 1024]);
    let err = manager
        .upload_file(&file, &UploadOptions::new(vec![catbox(&server)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UploadError::Validation(ValidationError::FileTooLarge { .. })
    ));
    assert!(manager.get_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn image_path_rejects_non_images_but_file_path_does_not() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catbox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://files.catbox.moe/notes.txt"))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager().await;
    let options = UploadOptions::new(vec![catbox(&server)]);
    let file = FileBlob::new("notes.txt", "text/plain", b"hello".to_vec());

    let err = manager.upload_image(&file, &options).await.unwrap_err();
    assert_eq!(
        err,
        UploadError::Validation(ValidationError::UnsupportedType("text/plain".to_string()))
    );

    let result = manager.upload_file(&file, &options).await.unwrap();
    assert_eq!(result.url, "https://files.catbox.moe/notes.txt");
}

#[tokio::test]
async fn untyped_file_still_uploads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catbox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://files.catbox.moe/raw.bin"))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager().await;
    let result = manager
        .upload_file(
            &FileBlob::new("data", "", b"abc".to_vec()),
            &UploadOptions::new(vec![catbox(&server)]),
        )
        .await
        .unwrap();

    assert_eq!(result.service, "catbox");
    assert_eq!(result.url, "https://files.catbox.moe/raw.bin");
    assert_eq!(result.content_type, "");
}

#[tokio::test]
async fn compressed_webp_keeps_type_and_name_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catbox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://files.catbox.moe/pic.webp"))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager().await;
    let mut options = UploadOptions::new(vec![catbox(&server)]);
    options.compression = Some(CompressionOptions {
        enabled: true,
        max_width: 100,
        quality: 0.8,
    });

    let png = png_file(400, 200);
    let file = FileBlob::new("pic.webp", "image/webp", png.data);
    let result = manager.upload_image(&file, &options).await.unwrap();
    assert_eq!(result.filename, "pic.webp");
    assert_eq!(result.content_type, "image/webp");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("filename=\"pic.webp\""));
    assert!(body.contains("Content-Type: image/webp"));
    assert!(!body.contains("image/jpeg"));
}

#[tokio::test]
async fn catbox_success_is_recorded_before_returning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catbox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://files.catbox.moe/abc123.png"))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager().await;
    let file = FileBlob::new("abc.png", "image/png", b"\x89PNG".to_vec());
    let result = manager
        .upload_image(&file, &UploadOptions::new(vec![catbox(&server)]))
        .await
        .unwrap();

    assert_eq!(result.url, "https://files.catbox.moe/abc123.png");
    assert_eq!(result.service, "catbox");
    assert_eq!(result.filename, "abc.png");
    assert_eq!(result.size, 4);
    assert_eq!(result.content_type, "image/png");

    let history = manager.get_history().await.unwrap();
    assert_eq!(history.len(), 1);
    let (id, record) = history.into_iter().next().unwrap();
    assert_eq!(record.upload, result);
    assert_eq!(
        manager.get_url_by_id(&id).await.unwrap().as_deref(),
        Some("https://files.catbox.moe/abc123.png")
    );
}

#[tokio::test]
async fn falls_back_from_catbox_to_imgbb() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catbox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("error: something went wrong"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/imgbb"))
        .and(query_param("key", "valid-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "url": "https://i.ibb.co/xyz.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager().await;
    let options = UploadOptions::new(vec![catbox(&server), imgbb(&server, Some("valid-key"))]);
    let result = manager
        .upload_file(&FileBlob::new("xyz.png", "image/png", b"img".to_vec()), &options)
        .await
        .unwrap();

    assert_eq!(result.service, "imgbb");
    assert_eq!(result.url, "https://i.ibb.co/xyz.png");
}

#[tokio::test]
async fn imgbb_without_key_alone_is_aggregate_config_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager().await;
    let err = manager
        .upload_file(
            &FileBlob::new("a.png", "image/png", b"img".to_vec()),
            &UploadOptions::new(vec![imgbb(&server, None)]),
        )
        .await
        .unwrap_err();

    match err {
        UploadError::AggregateUploadFailure { last } => {
            assert!(matches!(*last, UploadError::Config(_)))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(manager.get_status().await.unwrap().record_count, 0);
}

#[tokio::test]
async fn all_failures_report_the_last_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catbox"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/imgbb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": { "message": "Rate limit reached." }
        })))
        .mount(&server)
        .await;

    let manager = manager().await;
    let options = UploadOptions::new(vec![catbox(&server), imgbb(&server, Some("k"))]);
    let err = manager
        .upload_file(&FileBlob::new("a.png", "image/png", b"img".to_vec()), &options)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        UploadError::AggregateUploadFailure {
            last: Box::new(UploadError::ResponseFormat(
                "ImgBB: Rate limit reached.".to_string()
            ))
        }
    );
}

#[tokio::test]
async fn compressed_image_is_what_gets_uploaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/catbox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://files.catbox.moe/small.png"))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager().await;
    let mut options = UploadOptions::new(vec![catbox(&server)]);
    options.compression = Some(CompressionOptions {
        enabled: true,
        max_width: 200,
        quality: 0.8,
    });

    let original = png_file(800, 600);
    let result = manager.upload_image(&original, &options).await.unwrap();
    assert_eq!(result.filename, "shot.png");
    assert_eq!(result.content_type, "image/png");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = &requests[0].body;
    let png_start = body
        .windows(8)
        .position(|w| w == b"\x89PNG\r\n\x1a\n")
        .expect("png payload in multipart body");
    let decoded = image::load_from_memory(&body[png_start..]).unwrap();
    assert_eq!(decoded.dimensions(), (200, 150));
}

#[tokio::test]
async fn clear_history_empties_ledger() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://files.catbox.moe/x.bin"))
        .mount(&server)
        .await;

    let manager = manager().await;
    let options = UploadOptions::new(vec![catbox(&server)]);
    for name in ["a.bin", "b.bin"] {
        manager
            .upload_file(&FileBlob::new(name, "application/octet-stream", b"data".to_vec()), &options)
            .await
            .unwrap();
    }
    assert_eq!(manager.get_status().await.unwrap().record_count, 2);

    manager.clear_history().await.unwrap();
    assert!(manager.get_history().await.unwrap().is_empty());
    assert_eq!(manager.get_url_by_id("anything").await.unwrap(), None);
}
