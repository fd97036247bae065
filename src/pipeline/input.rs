//! Input resolution: turn a document source into a readable local PDF path.
//!
//! Local sources are checked for existence, read permission and the `%PDF`
//! magic bytes, so a renamed JPEG fails with a clear [`ExtractionError`]
//! instead of an opaque pdfium message. URL sources are downloaded into a
//! `TempDir` that lives exactly as long as the returned [`ResolvedInput`].

use crate::error::ExtractionError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// File extension of the source, without the dot; `None` when absent or empty.
    pub fn extension(&self) -> Option<String> {
        self.path()
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .filter(|e| !e.is_empty())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the source string to a local PDF file path.
///
/// If the source is a URL, download it to a temporary directory.
/// If the source is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractionError> {
    if input.trim().is_empty() {
        return Err(ExtractionError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

const MAGIC: &[u8; 4] = b"%PDF";

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, ExtractionError> {
    let path = PathBuf::from(path_str);

    if !path.is_file() {
        return Err(ExtractionError::FileNotFound { path });
    }

    let file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractionError::PermissionDenied { path });
        }
        Err(_) => return Err(ExtractionError::FileNotFound { path }),
    };
    let mut head = Vec::with_capacity(MAGIC.len());
    file.take(MAGIC.len() as u64)
        .read_to_end(&mut head)
        .map_err(|e| ExtractionError::Internal(format!("{}: {e}", path.display())))?;
    check_magic(&path, &head)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// The first bytes of every source must be `%PDF`.
fn check_magic(path: &Path, head: &[u8]) -> Result<(), ExtractionError> {
    match <[u8; 4]>::try_from(head) {
        Ok(magic) if &magic == MAGIC => Ok(()),
        Ok(magic) => Err(ExtractionError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        }),
        Err(_) => Err(ExtractionError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "file is truncated".into(),
        }),
    }
}

fn download_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        ExtractionError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Stream a URL into a file inside a fresh `TempDir`.
///
/// The magic bytes are checked on the first chunk, so an HTML error page is
/// refused before the rest of it is written.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractionError> {
    info!("Downloading {}", url);
    let fail = |e: reqwest::Error| download_error(url, timeout_secs, e);
    let write_failed = |e: std::io::Error| ExtractionError::Internal(format!("temp file: {e}"));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(fail)?;
    let mut response = client.get(url).send().await.map_err(fail)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        });
    }

    let temp_dir = TempDir::new().map_err(write_failed)?;
    let path = temp_dir.path().join(filename_from_url(url));
    let mut file = tokio::fs::File::create(&path).await.map_err(write_failed)?;

    let mut head = Vec::with_capacity(MAGIC.len());
    let mut written = 0usize;
    while let Some(chunk) = response.chunk().await.map_err(fail)? {
        if head.len() < MAGIC.len() {
            let take = (MAGIC.len() - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
            if head.len() == MAGIC.len() {
                check_magic(&path, &head)?;
            }
        }
        file.write_all(&chunk).await.map_err(write_failed)?;
        written += chunk.len();
    }
    check_magic(&path, &head)?;
    file.flush().await.map_err(write_failed)?;

    debug!("Downloaded {} bytes to {}", written, path.display());
    Ok(ResolvedInput::Downloaded {
        path,
        _temp_dir: temp_dir,
    })
}

/// Pick a filename for a downloaded PDF from the URL path.
fn filename_from_url(url: &str) -> String {
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
