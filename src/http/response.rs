//! HTTP response building module
//!
//! Body types shared by the static responder and the rendering engine,
//! plus builders for the few responses the gateway produces itself.

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use super::cache::CachePolicy;
use crate::logger;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body of every response leaving the gateway
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Body of every request handed to the rendering engine
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Box a complete in-memory body
pub fn full<T: Into<Bytes>>(chunk: T) -> ResponseBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Box an empty body
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Build 404 response for a static file that failed on first read
pub fn build_404_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "File not found")
}

/// Build 500 response
pub fn build_500_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Build 200 response around a streamed file body
pub fn build_file_response(
    body: ResponseBody,
    content_type: &str,
    content_length: Option<u64>,
    cache: CachePolicy,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CACHE_CONTROL, cache.to_header_value());

    if let Some(len) = content_length {
        builder = builder.header(CONTENT_LENGTH, len);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        let mut resp = Response::new(empty());
        *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        resp
    })
}

fn build_text_response(status: StatusCode, message: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .header(CACHE_CONTROL, CachePolicy::NoStore.to_header_value())
        .body(full(message))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut resp = Response::new(full(message));
            *resp.status_mut() = status;
            resp
        })
}

fn log_build_error(kind: &str, err: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {kind} response: {err}"));
}
