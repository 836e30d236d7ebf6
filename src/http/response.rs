//! HTTP response building module
//!
//! Provides builders for the status codes the server produces. Builders never
//! panic: a header that fails to build is logged and the response degrades to
//! an empty body with the intended status.

use futures_util::TryStreamExt;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LOCATION,
};
use hyper::{Response, StatusCode};
use std::io;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use super::range::ByteWindow;

/// Body type shared by every response: in-memory pages and streamed file windows
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Fully buffered body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Body without any data
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// Stream `window.length()` bytes from `file`, which is already positioned
/// at `window.first`
pub fn window_body(file: std::fs::File, window: ByteWindow) -> ResponseBody {
    let reader = tokio::fs::File::from_std(file).take(window.length());
    let stream = ReaderStream::new(reader).map_ok(Frame::data);
    StreamBody::new(stream).boxed()
}

/// Build a plain-text error response: 404, 500, 501, ...
pub fn build_error_response(status: StatusCode) -> Response<ResponseBody> {
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_LENGTH, text.len())
        .body(full(text))
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED);
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static("GET, HEAD"));
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    let status = StatusCode::RANGE_NOT_SATISFIABLE;
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(full("416 Requested Range Not Satisfiable"))
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Build 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<ResponseBody> {
    let status = StatusCode::FOUND;
    Response::builder()
        .status(status)
        .header(LOCATION, target)
        .header(CONTENT_LENGTH, 0)
        .body(empty())
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Build generic HTML response
pub fn build_html_response(
    content: String,
    content_type: &str,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head { empty() } else { full(content) };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| fallback(StatusCode::OK, &e))
}

/// Build a 200 or 206 response around a file body
///
/// `content_length` is the size of the window, which is also what a HEAD
/// request reports even though its body stays empty.
pub fn build_file_response(
    status: StatusCode,
    content_type: &str,
    content_range: Option<&str>,
    content_length: u64,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes");

    if let Some(range) = content_range {
        builder = builder.header(CONTENT_RANGE, range);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status, &e);
        build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn fallback(status: StatusCode, error: &hyper::http::Error) -> Response<ResponseBody> {
    log_build_error(status, error);
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_response_has_no_details() {
        let response = build_error_response(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"404 Not Found");
    }

    #[test]
    fn test_416_reports_size() {
        let response = build_416_response(1234);
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes */1234");
    }

    #[test]
    fn test_405_lists_methods() {
        let response = build_405_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD");
    }

    #[test]
    fn test_redirect() {
        let response = build_redirect_response("only.txt");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "only.txt");
    }

    #[tokio::test]
    async fn test_head_html_keeps_length() {
        let response = build_html_response("<p>hi</p>".to_string(), "text/html", true);
        assert_eq!(response.headers()[CONTENT_LENGTH], "9");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
