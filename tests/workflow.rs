//! End-to-end tests for the upload workflow.
//!
//! A local axum server stands in for the profile API, so these run offline.
//! The PDF test needs a real pdfium library and prints SKIP when none can be
//! bound.
//!
//! Run with:
//!   cargo test --test workflow -- --nocapture
//!
//! To exercise PDF extraction too:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test workflow -- --nocapture

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use docx_rs::{Docx, Paragraph, Run};
use jobmagnetic_cv::{
    CvUploadWidget, DocumentExtractor, ErrorCategory, ExtractionResult, ExtractionState,
    HttpProfileClient, Locale, PdfEngine, ProfileSubmitter, SubmitError, TextExtractor,
    UploadConfig, UploadEvent, UploadFile, UploadStatus, MIME_DOC, MIME_DOCX, MIME_PDF, MIME_TEXT,
};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

// ── Mock profile API ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    body: String,
}

#[derive(Clone, Default)]
struct MockApi {
    requests: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
    replies: Arc<Mutex<VecDeque<(u16, String)>>>,
}

impl MockApi {
    fn requests(&self) -> Vec<Vec<ReceivedPart>> {
        self.requests.lock().unwrap().clone()
    }
}

async fn create_from_cv(State(api): State<MockApi>, mut multipart: Multipart) -> (StatusCode, String) {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let body = field.text().await.unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            body,
        });
    }
    api.requests.lock().unwrap().push(parts);

    let (status, body) = api
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((200, r#"{"profileUrl":"default"}"#.to_string()));
    (StatusCode::from_u16(status).unwrap(), body)
}

/// Start the mock API with canned replies. Returns its base URL.
async fn spawn_api(replies: &[(u16, &str)]) -> (String, MockApi) {
    let api = MockApi::default();
    api.replies
        .lock()
        .unwrap()
        .extend(replies.iter().map(|(s, b)| (*s, b.to_string())));

    let app = Router::new()
        .route("/v1/profile/create-from-cv", post(create_from_cv))
        .with_state(api.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), api)
}

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("jobmagnetic_cv=debug")
        .with_test_writer()
        .try_init();
}

fn config(api_base: &str, locale: Locale) -> UploadConfig {
    UploadConfig::builder()
        .locale(locale)
        .api_base_url(api_base)
        .viewer_base_url("https://view.example/")
        .sample_profile_url("https://view.example/es/demo")
        .extraction_floor(Duration::ZERO)
        .build()
        .unwrap()
}

fn docx_bytes(lines: &[&str]) -> Vec<u8> {
    let mut docx = Docx::new();
    for line in lines {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*line)));
    }
    let mut buf = Cursor::new(Vec::new());
    docx.build().pack(&mut buf).unwrap();
    buf.into_inner()
}

/// Select a file and wait for extraction.
async fn select(widget: &CvUploadWidget, file: UploadFile) -> jobmagnetic_cv::UploadSnapshot {
    assert_ok!(widget.dispatch(UploadEvent::SelectFile(file)));
    widget.settled().await
}

/// A single-page PDF whose text layer reads "Hello World".
fn hello_world_pdf() -> Vec<u8> {
    let content = "BT /F1 24 Tf 72 700 Td (Hello World) Tj ET";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

/// Skip this test if pdfium cannot be bound.
macro_rules! skip_unless_pdfium {
    ($engine:expr) => {{
        if let Err(e) = $engine.ensure_ready().await {
            println!("SKIP — pdfium not available: {e}");
            return;
        }
    }};
}

// ── Submission ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn docx_cv_becomes_a_localised_profile_url() {
    init_logging();
    let (base, api) = spawn_api(&[(200, r#"{"profileUrl":"abc123"}"#)]).await;
    let widget = CvUploadWidget::new(config(&base, Locale::En));

    let file = UploadFile::from_bytes("resume.docx", MIME_DOCX, docx_bytes(&["Jane Doe", "Rust engineer"]));
    let snap = select(&widget, file).await;
    assert_eq!(snap.status, UploadStatus::FileSelected);
    assert_eq!(snap.extraction, Some(ExtractionState::Extracted));
    assert!(snap.can_submit);

    assert_ok!(widget.dispatch(UploadEvent::Submit));
    let snap = widget.settled().await;
    assert_eq!(snap.status, UploadStatus::Success);
    assert_eq!(
        snap.generated_site_url.as_deref(),
        Some("https://view.example/en/abc123")
    );

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let part = &requests[0][0];
    assert_eq!(part.name, "cvFile");
    assert_eq!(part.file_name.as_deref(), Some("resume.txt"));
    assert!(
        part.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/plain")),
        "got {:?}",
        part.content_type
    );
    assert!(part.body.contains("Jane Doe"), "got {:?}", part.body);
    assert!(part.body.contains("Rust engineer"), "got {:?}", part.body);
}

#[tokio::test]
async fn server_error_then_retry_resends_the_same_request() {
    init_logging();
    let (base, api) = spawn_api(&[
        (500, r#"{"message":"server busy"}"#),
        (201, r#"{"profileUrl":"abc123"}"#),
    ])
    .await;
    let widget = CvUploadWidget::new(config(&base, Locale::Es));

    select(&widget, UploadFile::from_bytes("cv.txt", MIME_TEXT, "Jane Doe\nRust")).await;
    assert_ok!(widget.dispatch(UploadEvent::Submit));
    let snap = widget.settled().await;
    assert_eq!(snap.status, UploadStatus::Error);
    assert_eq!(snap.error_detail.as_deref(), Some("server busy"));
    assert_eq!(snap.notice.map(|n| n.category), Some(ErrorCategory::ApiError));

    assert_ok!(widget.dispatch(UploadEvent::Retry));
    let snap = widget.settled().await;
    assert_eq!(snap.status, UploadStatus::Success);
    assert_eq!(
        snap.generated_site_url.as_deref(),
        Some("https://view.example/es/abc123")
    );

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(requests[0][0].body, "Jane Doe\nRust");
}

#[tokio::test]
async fn blank_text_never_reaches_the_network() {
    let (base, api) = spawn_api(&[]).await;
    let widget = CvUploadWidget::new(config(&base, Locale::Es));

    let snap = select(&widget, UploadFile::from_bytes("cv.txt", MIME_TEXT, "  \n\t ")).await;
    assert!(!snap.can_submit);

    assert_ok!(widget.dispatch(UploadEvent::Submit));
    let snap = widget.snapshot();
    assert_eq!(snap.status, UploadStatus::FileSelected);
    assert_eq!(
        snap.notice.map(|n| n.category),
        Some(ErrorCategory::EmptyExtraction)
    );
    assert!(api.requests().is_empty());

    let client = HttpProfileClient::new(Some(base));
    assert_eq!(
        client.submit("   ", "cv.pdf").await,
        Err(SubmitError::EmptyExtraction)
    );
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn unparsable_error_body_is_reported_generically() {
    let (base, _api) = spawn_api(&[(502, "<html>Bad Gateway</html>")]).await;
    let client = HttpProfileClient::new(Some(base));
    match client.submit("Jane Doe", "cv.pdf").await {
        Err(SubmitError::Api { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "malformed error response");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_field_is_used_when_message_is_absent() {
    let (base, _api) = spawn_api(&[(422, r#"{"error":"CV too short"}"#)]).await;
    let client = HttpProfileClient::new(Some(base));
    let err = assert_err!(client.submit("Jane", "cv.pdf").await);
    assert_eq!(err.to_string(), "CV too short");
}

#[tokio::test]
async fn success_without_profile_url_is_malformed() {
    let (base, _api) = spawn_api(&[(200, r#"{"ok":true}"#)]).await;
    let client = HttpProfileClient::new(Some(base));
    match client.submit("Jane Doe", "cv.pdf").await {
        Err(SubmitError::Api { message, .. }) => assert_eq!(message, "malformed success response"),
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_api_is_a_network_error() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let widget = CvUploadWidget::new(config(&format!("http://{addr}"), Locale::En));
    select(&widget, UploadFile::from_bytes("cv.txt", MIME_TEXT, "Jane Doe")).await;
    assert_ok!(widget.dispatch(UploadEvent::Submit));
    let snap = widget.settled().await;

    assert_eq!(snap.status, UploadStatus::Error);
    assert_eq!(
        snap.notice.map(|n| n.category),
        Some(ErrorCategory::NetworkError)
    );
}

#[tokio::test]
async fn missing_viewer_url_fails_before_any_request() {
    let (base, api) = spawn_api(&[]).await;
    let config = UploadConfig::builder()
        .api_base_url(base)
        .extraction_floor(Duration::ZERO)
        .build()
        .unwrap();
    let widget = CvUploadWidget::new(config);

    select(&widget, UploadFile::from_bytes("cv.txt", MIME_TEXT, "Jane Doe")).await;
    assert_ok!(widget.dispatch(UploadEvent::Submit));
    let snap = widget.settled().await;

    assert_eq!(snap.status, UploadStatus::Error);
    assert_eq!(
        snap.notice.map(|n| n.category),
        Some(ErrorCategory::ConfigurationError)
    );
    assert!(api.requests().is_empty());
}

// ── Selection ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_file_after_an_error_starts_a_clean_session() {
    let (base, _api) = spawn_api(&[(500, r#"{"message":"server busy"}"#)]).await;
    let widget = CvUploadWidget::new(config(&base, Locale::En));

    select(&widget, UploadFile::from_bytes("first.txt", MIME_TEXT, "first CV")).await;
    assert_ok!(widget.dispatch(UploadEvent::Submit));
    assert_eq!(widget.settled().await.status, UploadStatus::Error);

    let snap = select(&widget, UploadFile::from_bytes("second.txt", MIME_TEXT, "second CV")).await;
    assert_eq!(snap.status, UploadStatus::FileSelected);
    assert_eq!(snap.file.map(|f| f.name).as_deref(), Some("second.txt"));
    assert_eq!(snap.extracted_text.as_deref(), Some("second CV"));
    assert!(snap.error_detail.is_none());
    assert!(snap.notice.is_none());
    assert!(snap.generated_site_url.is_none());
}

#[tokio::test]
async fn oversized_and_unsupported_files_are_rejected_without_extraction() {
    let widget = CvUploadWidget::new(config("http://127.0.0.1:9", Locale::En));

    let mut big = UploadFile::from_bytes("cv.pdf", MIME_PDF, b"%PDF".to_vec());
    big.size = 5 * 1024 * 1024 + 1;
    assert_ok!(widget.dispatch(UploadEvent::SelectFile(big)));
    let snap = widget.snapshot();
    assert_eq!(snap.status, UploadStatus::Idle);
    assert!(snap.file.is_none());
    assert_eq!(
        snap.notice.map(|n| n.category),
        Some(ErrorCategory::ValidationError)
    );

    assert_ok!(widget.dispatch(UploadEvent::SelectFile(UploadFile::from_bytes(
        "cv.odt",
        "application/vnd.oasis.opendocument.text",
        vec![0u8; 8],
    ))));
    assert_eq!(widget.current_state(), UploadStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn legacy_doc_is_selected_quietly_after_the_floor() {
    let config = UploadConfig::builder().build().unwrap();
    let widget = CvUploadWidget::new(config);

    let start = tokio::time::Instant::now();
    let snap = select(
        &widget,
        UploadFile::from_bytes("cv.doc", MIME_DOC, vec![0xD0, 0xCF, 0x11, 0xE0]),
    )
    .await;
    assert!(start.elapsed() >= Duration::from_millis(5000));

    assert_eq!(snap.status, UploadStatus::FileSelected);
    assert_eq!(snap.extraction, Some(ExtractionState::Unavailable));
    assert!(snap.notice.is_none());
    assert!(!snap.can_submit);
}

// ── PDF (needs pdfium) ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn hello_world_pdf_is_extracted_after_the_floor() {
    init_logging();
    let engine = PdfEngine::global(None);
    skip_unless_pdfium!(engine);

    let extractor = DocumentExtractor::new(engine, Duration::from_millis(5000));
    let file = UploadFile::from_bytes("hello.pdf", MIME_PDF, hello_world_pdf());

    let start = tokio::time::Instant::now();
    let result = extractor.extract(&file).await;
    assert!(start.elapsed() >= Duration::from_millis(5000));

    match result {
        ExtractionResult::Success(text) => {
            let normalised = text.split_whitespace().collect::<Vec<_>>().join(" ");
            assert_eq!(normalised, "Hello World");
        }
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test]
async fn truncated_pdf_is_a_parse_error() {
    let engine = PdfEngine::global(None);
    skip_unless_pdfium!(engine);

    let mut bytes = hello_world_pdf();
    bytes.truncate(40);
    let extractor = DocumentExtractor::new(engine, Duration::ZERO);
    let file = UploadFile::from_bytes("broken.pdf", MIME_PDF, bytes);

    match extractor.extract(&file).await {
        ExtractionResult::Failure(e) => assert_eq!(e.category(), ErrorCategory::ParseError),
        other => panic!("expected parse error, got {other:?}"),
    }
}
