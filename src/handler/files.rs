//! File serving module
//!
//! Maps a request path onto one of the shared files and describes the
//! response: status, content type and the byte window to transmit.

use crate::config::ServedFiles;
use crate::http::mime::MimeResolver;
use crate::http::response::{self, ResponseBody};
use crate::http::{self, ByteWindow, RangeError};
use hyper::{Response, StatusCode};
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::str::Utf8Error;
use thiserror::Error;

/// Reasons a file request is not served
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("request path is not valid UTF-8: {0}")]
    Decode(#[from] Utf8Error),
    #[error("not found")]
    NotFound,
    #[error("unsupported Range header: {0}")]
    Range(RangeError),
    #[error("range not satisfiable for {size} byte file")]
    NotSatisfiable { size: u64 },
    #[error("unable to open {name}: {source}")]
    Open { name: String, source: io::Error },
    #[error("{0} is not a regular file")]
    NotAFile(String),
}

impl ServeError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Decode(_) | Self::Open { .. } | Self::NotAFile(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Range(_) => StatusCode::NOT_IMPLEMENTED,
            Self::NotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }

    /// Client-facing response; OS details stay in the error log
    pub fn into_response(self) -> Response<ResponseBody> {
        match self {
            Self::NotSatisfiable { size } => http::build_416_response(size),
            other => http::build_error_response(other.status()),
        }
    }
}

/// A file ready to be sent
#[derive(Debug)]
pub struct FileResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub size: u64,
    /// `None` for an empty file: nothing is transmitted
    pub window: Option<ByteWindow>,
    /// Positioned at the start of the window
    file: File,
}

impl FileResponse {
    /// `bytes first-last/size`, for partial responses only
    pub fn content_range(&self) -> Option<String> {
        if self.status != StatusCode::PARTIAL_CONTENT {
            return None;
        }
        self.window
            .map(|w| format!("bytes {}-{}/{}", w.first, w.last, self.size))
    }

    pub fn content_length(&self) -> u64 {
        self.window.map_or(0, |w| w.length())
    }

    pub fn into_response(self, is_head: bool) -> Response<ResponseBody> {
        let content_range = self.content_range();
        let content_length = self.content_length();
        let body = match self.window {
            Some(window) if !is_head => response::window_body(self.file, window),
            _ => response::empty(),
        };

        http::build_file_response(
            self.status,
            &self.content_type,
            content_range.as_deref(),
            content_length,
            body,
        )
    }
}

/// Resolve `uri_path` against the shared files
///
/// The Range header is validated before the file is touched, so a malformed
/// range on a shared file yields 501 even if the file has since vanished.
pub fn serve(
    uri_path: &str,
    range: Option<&str>,
    files: &ServedFiles,
    prefix: Option<&str>,
    mime: &dyn MimeResolver,
) -> Result<FileResponse, ServeError> {
    let encoded = uri_path.strip_prefix('/').ok_or(ServeError::NotFound)?;
    let decoded = http::decode_uri_path(encoded)?;

    let name = match prefix {
        Some(prefix) => decoded
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or(ServeError::NotFound)?,
        None => decoded.as_str(),
    };

    if !files.contains(name) {
        return Err(ServeError::NotFound);
    }

    let range = range
        .map(http::parse_range_header)
        .transpose()
        .map_err(ServeError::Range)?;

    let open_error = |source| ServeError::Open {
        name: name.to_string(),
        source,
    };
    let mut file = File::open(name).map_err(open_error)?;
    let metadata = file.metadata().map_err(open_error)?;
    if !metadata.is_file() {
        return Err(ServeError::NotAFile(name.to_string()));
    }
    let size = metadata.len();

    let content_type = mime.guess(name, &mut file);

    let (status, window) = match range {
        Some(spec) => match spec.resolve(size) {
            Ok(window) => (StatusCode::PARTIAL_CONTENT, Some(window)),
            Err(_) => return Err(ServeError::NotSatisfiable { size }),
        },
        None => (StatusCode::OK, ByteWindow::whole(size)),
    };

    if let Some(window) = window {
        file.seek(SeekFrom::Start(window.first))
            .map_err(open_error)?;
    }

    Ok(FileResponse {
        status,
        content_type,
        size,
        window,
        file,
    })
}
