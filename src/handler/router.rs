//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, index versus
//! file dispatch, the `Server` header and access logging.

use crate::config::AppState;
use crate::handler::{files, index};
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::header::{CONTENT_LENGTH, RANGE, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    peer: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let is_head = req.method() == Method::HEAD;
    let range = header_string(&req, RANGE);

    let mut response = match check_http_method(req.method()) {
        Some(resp) => resp,
        None => route_request(req.uri().path(), range.clone(), is_head, &state).await,
    };

    response
        .headers_mut()
        .insert(SERVER, state.server_header.clone());

    if state.access_log {
        let mut entry = AccessLogEntry::new(peer, req.method().to_string(), req.uri().to_string());
        entry.http_version = version_str(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = if is_head { 0 } else { content_length(&response) };
        entry.referer = header_string(&req, REFERER);
        entry.user_agent = header_string(&req, USER_AGENT);
        entry.range = range;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.access_log_format);
    }

    Ok(response)
}

/// Only GET and HEAD are served
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => Some(http::build_405_response()),
    }
}

/// Index on an exact `/` (or `/prefix/`) match of the decoded path, the
/// file engine otherwise
async fn route_request(
    path: &str,
    range: Option<String>,
    is_head: bool,
    state: &Arc<AppState>,
) -> Response<ResponseBody> {
    // Undecodable paths fall through and fail in the file engine
    let is_index = http::decode_uri_path(path).is_ok_and(|decoded| decoded == state.index_path);
    if is_index {
        return index::index_response(
            &state.files,
            state.redirect,
            &state.config.http.index_content_type,
            is_head,
        );
    }

    let path = path.to_string();
    let blocking_state = Arc::clone(state);
    let served = tokio::task::spawn_blocking(move || {
        files::serve(
            &path,
            range.as_deref(),
            &blocking_state.files,
            blocking_state.prefix.as_deref(),
            blocking_state.mime.as_ref(),
        )
    })
    .await;

    match served {
        Ok(Ok(file)) => file.into_response(is_head),
        Ok(Err(e)) => {
            if e.status() == StatusCode::INTERNAL_SERVER_ERROR {
                logger::log_error(&e.to_string());
            }
            e.into_response()
        }
        Err(e) => {
            logger::log_error(&format!("File task failed: {e}"));
            http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn header_string<B>(req: &Request<B>, name: hyper::header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn content_length(response: &Response<ResponseBody>) -> u64 {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

const fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
