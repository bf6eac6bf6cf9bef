//! Export Gateway Integration Tests
//!
//! Exercises the gateway against a mock classifier endpoint:
//! - Request shape (method, content type, data URL payload)
//! - Label publication and loading transitions
//! - Failure handling under both failure policies
//! - Overlapping submissions
//! - Local saves

use std::cell::Cell;
use std::time::Duration;

use async_trait::async_trait;
use digit_core::{ClientRect, PadConfig, PointerEvent, PointerPhase, Sketchpad, SurfaceBuffer};
use digit_gateway::{
    Classifier, DirectoryDownloads, ExportGateway, FailurePolicy, GatewayConfig, GatewayError,
    GatewayResult, HttpClassifier, PredictionRequest,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A 28×28 surface with a short diagonal stroke.
fn drawn_surface() -> SurfaceBuffer {
    let mut pad = Sketchpad::new(PadConfig::default()).expect("pad");
    pad.set_geometry(ClientRect {
        left: 0.0,
        top: 0.0,
        width: 28.0,
        height: 28.0,
    });
    pad.handle_event(&PointerEvent::mouse(PointerPhase::Down, 60.0, 60.0));
    pad.handle_event(&PointerEvent::mouse(PointerPhase::Move, 120.0, 120.0));
    pad.handle_event(&PointerEvent::mouse(PointerPhase::Up, 120.0, 120.0));
    pad.surface().expect("surface").clone()
}

fn http_gateway(server: &MockServer, policy: FailurePolicy) -> ExportGateway<HttpClassifier> {
    let config = GatewayConfig::default()
        .with_endpoint(&format!("{}/predict", server.uri()))
        .expect("endpoint")
        .with_failure_policy(policy);
    let classifier = HttpClassifier::from_config(&config).expect("classifier");
    ExportGateway::new(classifier, config)
}

// ============================================================================
// Successful Predictions
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_prediction_publishes_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"7\""))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = http_gateway(&server, FailurePolicy::Swallow);
    assert_eq!(gateway.view().label, "");

    let label = gateway
        .submit_for_prediction(&drawn_surface())
        .await
        .expect("label");
    assert_eq!(label, "7");

    let view = gateway.view();
    assert_eq!(view.label, "7");
    assert!(!view.loading);
    assert!(!view.failed);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_request_carries_exact_png_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("4"))
        .mount(&server)
        .await;

    let surface = drawn_surface();
    let gateway = http_gateway(&server, FailurePolicy::Swallow);
    gateway.submit_for_prediction(&surface).await.expect("label");

    let requests = server.received_requests().await.expect("recording on");
    assert_eq!(requests.len(), 1);
    let body: PredictionRequest = serde_json::from_slice(&requests[0].body).expect("json body");
    assert!(body.image.starts_with("data:image/png;base64,"));

    let decoded = digit_renderer::surface_from_data_url(&body.image).expect("decode");
    assert_eq!(decoded, surface);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_loading_is_true_while_request_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("\"7\"")
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let gateway = http_gateway(&server, FailurePolicy::Swallow);
    let mut rx = gateway.subscribe();
    let surface = drawn_surface();

    let (result, loading_mid_call) = tokio::join!(gateway.submit_for_prediction(&surface), async {
        rx.changed().await.expect("sender alive");
        let loading = rx.borrow_and_update().loading;
        loading
    });

    assert!(loading_mid_call);
    assert_eq!(result.expect("label"), "7");
    assert!(!gateway.view().loading);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_plain_text_body_is_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("seven"))
        .mount(&server)
        .await;

    let gateway = http_gateway(&server, FailurePolicy::Swallow);
    let label = gateway
        .submit_for_prediction(&SurfaceBuffer::default())
        .await
        .expect("label");
    assert_eq!(label, "seven");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_server_error_leaves_label_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"2\""))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let gateway = http_gateway(&server, FailurePolicy::Swallow);
    let surface = drawn_surface();
    gateway.submit_for_prediction(&surface).await.expect("first");

    let err = gateway.submit_for_prediction(&surface).await.unwrap_err();
    match err {
        GatewayError::Status { code, body } => {
            assert_eq!(code, 500);
            assert_eq!(body, "model crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let view = gateway.view();
    assert_eq!(view.label, "2");
    assert!(!view.loading);
    // Default policy: the failure is invisible in the view.
    assert!(!view.failed);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_unreachable_endpoint_is_transport_error() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let config = GatewayConfig::default()
        .with_endpoint(&format!("{uri}/predict"))
        .expect("endpoint");
    let gateway = ExportGateway::new(
        HttpClassifier::from_config(&config).expect("classifier"),
        config,
    );

    let err = gateway
        .submit_for_prediction(&SurfaceBuffer::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Http(_)), "got {err:?}");

    let view = gateway.view();
    assert_eq!(view.label, "");
    assert!(!view.loading);
    assert!(!view.failed);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_surface_policy_exposes_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let gateway = http_gateway(&server, FailurePolicy::Surface);
    assert!(gateway
        .submit_for_prediction(&SurfaceBuffer::default())
        .await
        .is_err());

    let view = gateway.view();
    assert!(view.failed);
    assert_eq!(view.label, "");
    assert!(!view.loading);
}

// ============================================================================
// Overlapping Submissions
// ============================================================================

/// Answers the n-th call with `labels[n]` after `delays[n]`.
struct DelayedClassifier {
    labels: Vec<&'static str>,
    delays: Vec<Duration>,
    calls: Cell<usize>,
}

#[async_trait(?Send)]
impl Classifier for DelayedClassifier {
    async fn classify(&self, _request: &PredictionRequest) -> GatewayResult<String> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        tokio::time::sleep(self.delays[n]).await;
        Ok(self.labels[n].to_string())
    }
}

#[tokio::test]
async fn test_last_response_to_arrive_wins() {
    let classifier = DelayedClassifier {
        labels: vec!["1", "2"],
        delays: vec![Duration::from_millis(150), Duration::from_millis(10)],
        calls: Cell::new(0),
    };
    let gateway = ExportGateway::new(classifier, GatewayConfig::default());
    let surface = SurfaceBuffer::default();
    let mut rx = gateway.subscribe();

    let (slow, fast, loading_after_fast) = tokio::join!(
        gateway.submit_for_prediction(&surface),
        gateway.submit_for_prediction(&surface),
        async {
            // Wait for the fast answer, then check the slow one still counts.
            loop {
                rx.changed().await.expect("sender alive");
                let view = rx.borrow_and_update().clone();
                if view.label == "2" {
                    return view.loading;
                }
            }
        }
    );

    assert_eq!(slow.expect("slow"), "1");
    assert_eq!(fast.expect("fast"), "2");
    assert!(loading_after_fast);

    let view = gateway.view();
    assert_eq!(view.label, "1");
    assert!(!view.loading);
}

// ============================================================================
// Local Saves
// ============================================================================

#[test]
fn test_save_locally_writes_drawing_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = ExportGateway::new(
        DelayedClassifier {
            labels: Vec::new(),
            delays: Vec::new(),
            calls: Cell::new(0),
        },
        GatewayConfig::default(),
    );
    let surface = drawn_surface();

    gateway
        .save_locally(&surface, &DirectoryDownloads::new(dir.path()))
        .expect("save");

    let bytes = std::fs::read(dir.path().join("drawing.png")).expect("file");
    assert_eq!(&bytes[0..4], &[137, 80, 78, 71]);
    let decoded = digit_renderer::surface_from_image_bytes(&bytes).expect("decode");
    assert_eq!(decoded, surface);
    // Saving never touches the prediction.
    assert_eq!(gateway.view().label, "");
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = ExportGateway::new(
        DelayedClassifier {
            labels: Vec::new(),
            delays: Vec::new(),
            calls: Cell::new(0),
        },
        GatewayConfig::default(),
    );
    let missing = DirectoryDownloads::new(dir.path().join("nope"));
    let err = gateway
        .save_locally(&SurfaceBuffer::default(), &missing)
        .unwrap_err();
    assert!(matches!(err, GatewayError::Io(_)));
}
