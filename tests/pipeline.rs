//! Integration tests for the assessment pipeline against canned local
//! HTTP services. No network access is needed.
//!
//! Run with:
//!   cargo test --test pipeline

mod common;

use common::{broken_pdf, refused_url, text_pdf, Event, MockServer, RecordingObserver, FULL_ROADMAP};
use immigration_roadmap::pipeline::extract::FALLBACK_WARNING;
use immigration_roadmap::pipeline::markdown::SECTION_HEADINGS;
use immigration_roadmap::{
    assess, assess_from_bytes, assess_to_file, extract_text, AssessError, AssessmentConfig,
    AssessmentObserver, Extraction, ExtractionSource, OcrError, RoadmapError, UploadedDocument,
};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn config_for(ocr_url: &str, roadmap_url: &str, observer: &Arc<RecordingObserver>) -> AssessmentConfig {
    AssessmentConfig::builder()
        .api_key("test-key")
        .ocr_url(ocr_url)
        .ocr_host("ocr.test")
        .roadmap_url(roadmap_url)
        .ocr_timeout_secs(1)
        .roadmap_timeout_secs(5)
        .observer(Arc::clone(observer) as Arc<dyn AssessmentObserver>)
        .build()
        .unwrap()
}

fn observer() -> Arc<RecordingObserver> {
    Arc::new(RecordingObserver::default())
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ocr_text_is_normalised_and_sent_to_roadmap() {
    let ocr = MockServer::respond(200, r#"{"text": "A B  C\n"}"#).await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["ignored"]), "questionnaire.pdf", &config)
        .await
        .unwrap();

    assert_eq!(
        output.extraction,
        Extraction::Ocr {
            text: "A B C".to_string().into()
        }
    );

    let req = roadmap.single_request();
    assert_eq!(req.method, "POST");
    assert_eq!(req.json(), serde_json::json!({ "questionnaire": "A B C" }));

    assert_eq!(output.markdown.section_headings(), SECTION_HEADINGS.to_vec());
    assert_eq!(
        output.markdown.section_items(0),
        vec!["Age: 30", "Education: Masters", "Work: 4 years"]
    );

    let report = output.report.as_ref().expect("report rendered");
    assert_eq!(report.file_name, "immigration_assessment.pdf");
    assert!(report.bytes.starts_with(b"%PDF"));

    assert!(obs.warnings().is_empty());
    assert!(obs.errors().is_empty());
}

#[tokio::test]
async fn test_ocr_request_shape() {
    let ocr = MockServer::respond(200, r#"{"text": "hello"}"#).await;
    let roadmap = MockServer::respond(200, "{}").await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    assess_from_bytes(text_pdf(&["x"]), "my form.pdf", &config)
        .await
        .unwrap();

    let req = ocr.single_request();
    assert_eq!(req.method, "POST");
    assert_eq!(req.header("x-rapidapi-key"), Some("test-key"));
    assert_eq!(req.header("x-rapidapi-host"), Some("ocr.test"));
    assert!(req
        .header("content-type")
        .unwrap_or_default()
        .starts_with("multipart/form-data"));

    let body = req.body_text();
    assert!(body.contains(r#"name="pdf""#), "body: {body}");
    assert!(body.contains(r#"filename="my form.pdf""#), "body: {body}");
    assert!(body.contains("application/pdf"));
    assert!(body.contains("%PDF"));
}

#[tokio::test]
async fn test_observer_event_order() {
    let ocr = MockServer::respond(200, r#"{"text": "a b"}"#).await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);
    let pdf = text_pdf(&["x"]);
    let len = pdf.len();

    let output = assess_from_bytes(pdf, "q.pdf", &config).await.unwrap();
    let report = output.report.unwrap();

    assert_eq!(
        obs.events(),
        vec![
            Event::ExtractionStart {
                name: "q.pdf".into(),
                bytes: len
            },
            Event::ExtractionComplete {
                source: ExtractionSource::Ocr,
                chars: 3
            },
            Event::RoadmapStart,
            Event::RoadmapComplete,
            Event::ReportReady {
                pages: report.page_count,
                bytes: report.bytes.len()
            },
        ]
    );
}

// ── OCR fallback ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ocr_error_status_falls_back_to_local() {
    let ocr = MockServer::respond(500, r#"{"error": "boom"}"#).await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["A B  C", "D"]), "q.pdf", &config)
        .await
        .unwrap();

    match &output.extraction {
        Extraction::Fallback { text, reason } => {
            assert_eq!(text.as_str(), "A B C D");
            assert_eq!(reason, &OcrError::Status { status: 500 });
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert_eq!(obs.warnings(), vec![FALLBACK_WARNING.to_string()]);
    assert_eq!(
        roadmap.single_request().json(),
        serde_json::json!({ "questionnaire": "A B C D" })
    );
}

#[tokio::test]
async fn test_ocr_timeout_falls_back_to_local() {
    let ocr = MockServer::hang().await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["Age 30"]), "q.pdf", &config)
        .await
        .unwrap();

    match &output.extraction {
        Extraction::Fallback { text, reason } => {
            assert_eq!(text.as_str(), "Age 30");
            assert_eq!(reason, &OcrError::Timeout { secs: 1 });
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert!(obs.warnings().contains(&FALLBACK_WARNING.to_string()));
}

#[tokio::test]
async fn test_ocr_unreachable_falls_back_to_local() {
    let ocr_url = refused_url().await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let config = config_for(&ocr_url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["hello"]), "q.pdf", &config)
        .await
        .unwrap();

    match &output.extraction {
        Extraction::Fallback { reason, .. } => {
            assert!(matches!(reason, OcrError::Transport { .. }), "{reason:?}");
        }
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ocr_unparseable_body_falls_back_to_local() {
    let ocr = MockServer::respond(200, "<html>gateway</html>").await;
    let roadmap = MockServer::respond(200, "{}").await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["hello"]), "q.pdf", &config)
        .await
        .unwrap();

    assert!(matches!(
        output.extraction,
        Extraction::Fallback {
            reason: OcrError::InvalidResponse { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_both_extractors_fail_continues_with_empty_text() {
    let ocr = MockServer::respond(503, "{}").await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(broken_pdf(), "broken.pdf", &config)
        .await
        .unwrap();

    assert_eq!(output.extraction.source(), ExtractionSource::Unavailable);
    assert_eq!(output.extraction.text(), "");

    let errors = obs.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Error in text extraction"), "{errors:?}");

    assert_eq!(
        roadmap.single_request().json(),
        serde_json::json!({ "questionnaire": "" })
    );
    assert!(output.report.is_some());
}

#[tokio::test]
async fn test_ocr_without_text_field_yields_empty_text() {
    let ocr = MockServer::respond(200, r#"{"pages": 1}"#).await;
    let roadmap = MockServer::respond(200, "{}").await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["hello"]), "q.pdf", &config)
        .await
        .unwrap();

    assert_eq!(output.extraction.source(), ExtractionSource::Ocr);
    assert_eq!(output.extraction.text(), "");
    assert!(!obs.warnings().contains(&FALLBACK_WARNING.to_string()));
    assert_eq!(
        obs.warnings(),
        vec!["No text could be extracted from the PDF".to_string()]
    );
}

#[tokio::test]
async fn test_extract_text_alone() {
    let ocr = MockServer::respond(404, "{}").await;
    let obs = observer();
    let config = config_for(&ocr.url, "http://127.0.0.1:9/unused", &obs);
    let doc = UploadedDocument::new("q.pdf", text_pdf(&["one  two"])).unwrap();

    let extraction = extract_text(&doc, &config).await.unwrap();
    assert_eq!(extraction.text(), "one two");
    assert!(extraction.used_fallback());
    assert_eq!(extraction.into_text().preview(3), "one...");
}

// ── Roadmap failures ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_roadmap_not_found_is_fatal() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(404, r#"{"detail": "Not Found"}"#).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let err = assess_from_bytes(text_pdf(&["a"]), "q.pdf", &config)
        .await
        .unwrap_err();

    assert!(matches!(err, AssessError::Roadmap(RoadmapError::NotFound)));
    assert_eq!(err.to_string(), "API Error: Data Not Found (404)");
    assert_eq!(obs.errors(), vec!["API Error: Data Not Found (404)".to_string()]);
    assert!(!obs
        .events()
        .iter()
        .any(|e| matches!(e, Event::RoadmapComplete | Event::ReportReady { .. })));
}

#[tokio::test]
async fn test_roadmap_server_error_is_fatal() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(500, "{}").await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let err = assess_from_bytes(text_pdf(&["a"]), "q.pdf", &config)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AssessError::Roadmap(RoadmapError::Status { status: 500 })
    ));
    assert_eq!(err.to_string(), "API Error: 500");
}

#[tokio::test]
async fn test_roadmap_timeout_is_fatal() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::hang().await;
    let obs = observer();
    let config = AssessmentConfig::builder()
        .api_key("k")
        .ocr_url(&ocr.url)
        .roadmap_url(&roadmap.url)
        .roadmap_timeout_secs(1)
        .observer(Arc::clone(&obs) as Arc<dyn AssessmentObserver>)
        .build()
        .unwrap();

    let err = assess_from_bytes(text_pdf(&["a"]), "q.pdf", &config)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssessError::Roadmap(RoadmapError::Timeout { secs: 1 })
    ));
}

#[tokio::test]
async fn test_partial_roadmap_still_formats_all_sections() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(200, r#"{"roadmap": "Apply", "noc_codes": null}"#).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["a"]), "q.pdf", &config)
        .await
        .unwrap();

    assert_eq!(output.markdown.section_headings().len(), 5);
    assert!(output.markdown.section_items(2).is_empty());
    let panels = output.panels();
    assert_eq!(panels[0].title, "Roadmap");
    assert_eq!(panels[0].body, "Apply");
    assert_eq!(panels[3].body, "");
}

#[tokio::test]
async fn test_headings_inside_roadmap_keep_five_sections() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(
        200,
        r###"{"roadmap": "## Step 1\nApply", "job_roles": "- Dev\n- QA"}"###,
    )
    .await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let output = assess_from_bytes(text_pdf(&["a"]), "q.pdf", &config)
        .await
        .unwrap();

    assert_eq!(output.markdown.section_headings(), SECTION_HEADINGS.to_vec());
    assert_eq!(output.markdown.section_body(1), Some("- Dev\n- QA"));
    assert_eq!(output.markdown.section_body(4), Some("## Step 1\nApply"));
}

// ── Files and configuration ──────────────────────────────────────────────────

#[tokio::test]
async fn test_assess_to_file_writes_pdf() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("questionnaire.pdf");
    std::fs::write(&input, text_pdf(&["a"])).unwrap();
    let out = dir.path().join("out/immigration_assessment.pdf");

    let output = assess_to_file(input.to_str().unwrap(), &out, &config)
        .await
        .unwrap();

    let written = std::fs::read(&out).unwrap();
    assert_eq!(written, output.report.unwrap().bytes);
    let doc = lopdf::Document::load_mem(&written).unwrap();
    assert!(!doc.get_pages().is_empty());
    assert_eq!(output.document_name, "questionnaire.pdf");
}

#[tokio::test]
async fn test_failed_roadmap_writes_no_file() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(502, "{}").await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("q.pdf");
    std::fs::write(&input, text_pdf(&["a"])).unwrap();
    let out = dir.path().join("report.pdf");

    assert!(assess_to_file(input.to_str().unwrap(), &out, &config)
        .await
        .is_err());
    assert!(!out.exists());
}

#[tokio::test]
async fn test_no_pdf_skips_rendering() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(200, FULL_ROADMAP).await;
    let obs = observer();
    let mut config = config_for(&ocr.url, &roadmap.url, &obs);
    config.render_report = false;

    let output = assess_from_bytes(text_pdf(&["a"]), "q.pdf", &config)
        .await
        .unwrap();
    assert!(output.report.is_none());
    assert!(!obs
        .events()
        .iter()
        .any(|e| matches!(e, Event::ReportReady { .. })));
}

#[tokio::test]
async fn test_non_pdf_input_is_rejected_before_any_request() {
    let ocr = MockServer::respond(200, r#"{"text": "a"}"#).await;
    let roadmap = MockServer::respond(200, "{}").await;
    let obs = observer();
    let config = config_for(&ocr.url, &roadmap.url, &obs);

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, "just text").unwrap();

    let err = assess(input.to_str().unwrap(), &config).await.unwrap_err();
    assert!(matches!(err, AssessError::NotAPdf { .. }));
    assert!(ocr.requests().is_empty());
    assert!(roadmap.requests().is_empty());
}

#[test]
fn test_missing_secret_is_fatal() {
    let err = AssessmentConfig::builder().build().unwrap_err();
    assert!(matches!(err, AssessError::MissingSecret { .. }));
    assert!(err.to_string().contains("RAPIDAPI_KEY"));
}

#[test]
fn test_extraction_deserialises_from_json() {
    let json = serde_json::json!({
        "source": "fallback",
        "text": "a b",
        "reason": { "Status": { "status": 500 } }
    });
    let extraction: Extraction = serde_json::from_value(json).unwrap();
    assert_eq!(extraction.text(), "a b");
}
