use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use image::{ImageBuffer, Luma, Rgb};
use meter_seg_service::{
    model::{ModelError, SegmentationModel},
    pipeline::InferencePipeline,
    readiness::ModelState,
    routes::{api_routes, PredictResponse},
    server::SharedState,
    telemetry::Metrics,
};
use ndarray::{Array4, ArrayView4};
use rand::Rng;
use std::io::Cursor;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;

struct MockModel {
    calls: AtomicUsize,
}

impl MockModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl SegmentationModel for MockModel {
    fn infer(&self, input: ArrayView4<f32>) -> Result<Array4<f32>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(input.shape(), &[1, 3, 512, 512]);

        let mut rng = rand::rng();
        Ok(Array4::from_shape_fn((1, 1, 512, 512), |_| {
            rng.random_range(-4.0..4.0)
        }))
    }
}

struct TestApp {
    router: Router,
    state: SharedState,
    model: Option<Arc<MockModel>>,
}

fn spawn_app(with_model: bool) -> TestApp {
    let model_state = Arc::new(ModelState::new());
    let model = if with_model {
        let model = MockModel::new();
        model_state.set_ready(model.clone());
        Some(model)
    } else {
        None
    };

    let metrics = Arc::new(Metrics::new());
    let pipeline = Arc::new(InferencePipeline::new(
        model_state.clone(),
        metrics.clone(),
    ));

    let state = SharedState {
        pipeline,
        model_state,
        metrics,
    };

    TestApp {
        router: api_routes().with_state(state.clone()),
        state,
        model,
    }
}

fn rgb_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(width, height, Rgb([255, 0, 0]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn grayscale_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_pixel(width, height, Luma([128]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn predict_request(filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_is_healthy_when_model_is_loaded() {
    let app = spawn_app(true);

    for _ in 0..3 {
        let response = app.router.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], true);
    }
}

#[tokio::test]
async fn health_is_unhealthy_without_a_model() {
    let app = spawn_app(false);

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn predict_returns_a_binary_mask_with_metadata() {
    let app = spawn_app(true);

    let response = app
        .router
        .clone()
        .oneshot(predict_request("meter.png", "image/png", &rgb_png(256, 256)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payload: PredictResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(payload.status, "success");
    assert_eq!(payload.metadata.output_size, [512, 512]);
    assert!(payload.metadata.latency_seconds >= 0.0);

    let png = STANDARD.decode(&payload.mask_base64).unwrap();
    let mask = image::load_from_memory(&png).unwrap().to_luma8();
    assert_eq!(mask.dimensions(), (512, 512));
    assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));

    assert_eq!(app.model.unwrap().calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.state.metrics.outcome_count("success"), 1);
}

#[tokio::test]
async fn predict_accepts_grayscale_uploads() {
    let app = spawn_app(true);

    let response = app
        .router
        .clone()
        .oneshot(predict_request(
            "meter.png",
            "image/png",
            &grayscale_png(512, 512),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn predict_rejects_undecodable_uploads_without_calling_the_model() {
    let app = spawn_app(true);

    let response = app
        .router
        .clone()
        .oneshot(predict_request("meter.txt", "text/plain", b"not an image"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.model.unwrap().calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.state.metrics.outcome_count("decode_error"), 1);
    assert_eq!(app.state.metrics.outcome_count("success"), 0);
}

#[tokio::test]
async fn predict_without_a_model_returns_service_unavailable() {
    let app = spawn_app(false);

    let response = app
        .router
        .clone()
        .oneshot(predict_request("meter.png", "image/png", &rgb_png(64, 64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.state.metrics.outcome_count("model_unavailable"), 1);
}

#[tokio::test]
async fn predict_without_an_image_field_is_a_bad_request() {
    let app = spawn_app(true);

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.model.unwrap().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn metrics_report_totals_per_outcome() {
    let app = spawn_app(true);

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(predict_request("meter.png", "image/png", &rgb_png(32, 32)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app
        .router
        .clone()
        .oneshot(predict_request("meter.txt", "text/plain", b"garbage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(app.state.metrics.outcome_count("success"), 2);
    assert_eq!(app.state.metrics.outcome_count("decode_error"), 1);

    let response = app.router.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("wms_predictions_total"));
    assert!(body.contains("wms_predict_latency_seconds"));
    assert!(body.contains("wms_model_loaded 1"));
}

#[tokio::test]
async fn index_serves_the_landing_page() {
    let app = spawn_app(true);

    let response = app.router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Water Meters"));
}
