//! Shared helpers for integration tests: a canned HTTP server, an observer
//! that records events, and PDF fixtures.

#![allow(dead_code)]

use immigration_roadmap::{AssessmentObserver, ExtractionSource};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;

// ── Canned HTTP server ───────────────────────────────────────────────────────

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: String },
    Hang,
}

#[derive(Clone)]
struct ServerState {
    reply: Reply,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Answers every request with the same canned reply and records it.
pub struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// Reply to every request with `status` and a JSON `body`.
    pub async fn respond(status: u16, body: impl Into<String>) -> Self {
        Self::start(Reply::Respond {
            status,
            body: body.into(),
        })
        .await
    }

    /// Accept and read requests but never answer.
    pub async fn hang() -> Self {
        Self::start(Reply::Hang).await
    }

    async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/endpoint", post(record_and_reply))
            .with_state(ServerState {
                reply,
                requests: Arc::clone(&requests),
            });
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{addr}/endpoint"),
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn single_request(&self) -> RecordedRequest {
        let reqs = self.requests();
        assert_eq!(reqs.len(), 1, "expected exactly one request, got {reqs:?}");
        reqs.into_iter().next().unwrap()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record_and_reply(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let headers = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body: body.to_vec(),
    });

    match state.reply {
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        Reply::Respond { status, body } => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
    }
}

/// A URL on which nothing is listening.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/endpoint")
}

// ── Observer ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ExtractionStart { name: String, bytes: usize },
    Warning(String),
    Error(String),
    ExtractionComplete { source: ExtractionSource, chars: usize },
    RoadmapStart,
    RoadmapComplete,
    ReportReady { pages: usize, bytes: usize },
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Warning(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    fn push(&self, e: Event) {
        self.events.lock().unwrap().push(e);
    }
}

impl AssessmentObserver for RecordingObserver {
    fn on_extraction_start(&self, name: &str, bytes: usize) {
        self.push(Event::ExtractionStart {
            name: name.to_string(),
            bytes,
        });
    }

    fn on_warning(&self, message: &str) {
        self.push(Event::Warning(message.to_string()));
    }

    fn on_error(&self, message: &str) {
        self.push(Event::Error(message.to_string()));
    }

    fn on_extraction_complete(&self, source: ExtractionSource, chars: usize) {
        self.push(Event::ExtractionComplete { source, chars });
    }

    fn on_roadmap_start(&self) {
        self.push(Event::RoadmapStart);
    }

    fn on_roadmap_complete(&self) {
        self.push(Event::RoadmapComplete);
    }

    fn on_report_ready(&self, pages: usize, bytes: usize) {
        self.push(Event::ReportReady { pages, bytes });
    }
}

// ── PDF fixtures ─────────────────────────────────────────────────────────────

/// A PDF with one page per entry, each showing that line of text.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Starts with the PDF magic but is not a parseable document.
pub fn broken_pdf() -> Vec<u8> {
    b"%PDF-1.4\nnot really a pdf at all".to_vec()
}

/// A complete roadmap service response.
pub const FULL_ROADMAP: &str = r###"{
    "questionnaire": "● Age: 30 ● Education: Masters ● Work: 4 years",
    "job_roles": "**Software Engineer**",
    "noc_codes": ["21231 - Software engineers", "21211 - Data scientists"],
    "crs_score": "Total: 480",
    "roadmap": "1. Create an Express Entry profile\n2. Wait for an ITA"
}"###;
