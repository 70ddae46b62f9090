//! Input resolution: turn a user-supplied path or URL into an in-memory PDF.
//!
//! Both extractors work on bytes (the OCR upload is a multipart body and the
//! local parser loads from memory), so nothing is written to disk. The `%PDF`
//! magic is checked up front so a wrong file type is rejected with a clear
//! error instead of being uploaded to the OCR service.

use crate::error::AssessError;
use std::path::Path;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The raw bytes of one uploaded questionnaire.
///
/// Held only for the duration of a single request.
#[derive(Clone)]
pub struct UploadedDocument {
    name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl UploadedDocument {
    /// Wrap PDF bytes, rejecting anything that does not start with `%PDF`.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AssessError> {
        let name = name.into();
        if !bytes.starts_with(PDF_MAGIC) {
            let magic = bytes.iter().take(PDF_MAGIC.len()).copied().collect();
            return Err(AssessError::NotAPdf { name, magic });
        }
        Ok(Self { name, bytes })
    }

    /// Display name, used as the multipart file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory PDF.
///
/// If the input is a URL, download it. Otherwise read the local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedDocument, AssessError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<UploadedDocument, AssessError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => AssessError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AssessError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    UploadedDocument::new(file_name_of(path), bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedDocument, AssessError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AssessError::HttpClient(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AssessError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AssessError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AssessError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AssessError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    UploadedDocument::new(file_name_from_url(url), bytes.to_vec())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "questionnaire.pdf".to_string())
}

/// Last path segment of the URL when it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
