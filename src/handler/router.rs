//! Request dispatch module
//!
//! Entry point for every request: normalize forwarded headers, try the
//! static asset rules, otherwise hand the request to the rendering engine.

use futures_util::FutureExt;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http::{self, BoxError, RequestBody, ResponseBody};
use crate::logger::{self, AccessLogEntry, Disposition};
use crate::render::RenderError;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let req = req.map(|body| body.map_err(BoxError::from).boxed_unsync());
    Ok(dispatch(req, &state, remote_addr).await)
}

/// Route one request; always yields a response
///
/// Engine errors and panics are logged and answered with 500.
pub async fn dispatch(
    req: Request<RequestBody>,
    state: &AppState,
    remote_addr: SocketAddr,
) -> Response<ResponseBody> {
    let started = Instant::now();
    let logging = &state.config.logging;
    let entry = logging
        .access_log
        .then(|| AccessLogEntry::from_request(remote_addr.to_string(), &req));
    let target = req.uri().to_string();

    let (resp, disposition) = match AssertUnwindSafe(route(req, state)).catch_unwind().await {
        Ok(Ok(routed)) => routed,
        Ok(Err(e)) => {
            logger::log_error(&format!("Error occurred handling {target}: {e}"));
            (http::build_500_response(), Disposition::Failed)
        }
        Err(_) => {
            logger::log_error(&format!("Panic while handling {target}"));
            (http::build_500_response(), Disposition::Failed)
        }
    };

    if let Some(mut entry) = entry {
        entry.record_response(resp.status().as_u16(), resp.headers(), disposition);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &logging.access_log_format);
    }

    resp
}

async fn route(
    mut req: Request<RequestBody>,
    state: &AppState,
) -> Result<(Response<ResponseBody>, Disposition), RenderError> {
    state.forwarded.apply(&mut req);

    if let Some(resp) = state.assets.respond(req.uri().path()).await {
        return Ok((resp, Disposition::Static));
    }

    let resp = state.engine.handle(req).await?;
    Ok((resp, Disposition::Rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EnvLookup};
    use crate::http::response::{empty, full};
    use crate::render::RenderEngine;
    use async_trait::async_trait;
    use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, HOST};
    use hyper::{HeaderMap, StatusCode};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Behavior {
        Respond(u16),
        Fail,
        Panic,
    }

    struct RecordingEngine {
        behavior: Behavior,
        seen: Mutex<Vec<(String, HeaderMap)>>,
    }

    impl RecordingEngine {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, HeaderMap)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RenderEngine for RecordingEngine {
        async fn handle(
            &self,
            req: Request<RequestBody>,
        ) -> Result<Response<ResponseBody>, RenderError> {
            self.seen
                .lock()
                .unwrap()
                .push((req.uri().to_string(), req.headers().clone()));
            match self.behavior {
                Behavior::Respond(status) => Ok(Response::builder()
                    .status(status)
                    .body(full("rendered"))
                    .unwrap()),
                Behavior::Fail => Err(RenderError::Request {
                    target: req.uri().to_string(),
                    source: Response::builder().status(1000u16).body(()).unwrap_err(),
                }),
                Behavior::Panic => panic!("engine exploded"),
            }
        }
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public/img")).unwrap();
        std::fs::create_dir_all(dir.path().join(".next/static")).unwrap();
        std::fs::write(dir.path().join("public/img/logo.png"), b"png").unwrap();
        std::fs::write(dir.path().join(".next/static/chunk123.js"), b"js").unwrap();
        dir
    }

    fn state(dir: &tempfile::TempDir, mode: &str, engine: Arc<RecordingEngine>) -> AppState {
        let env = EnvLookup::from_map(HashMap::from([
            ("APP_ENV".to_string(), mode.to_string()),
            ("CANONICAL_HOST".to_string(), "shop.example.com".to_string()),
        ]));
        let mut config = Config::load_with("does-not-exist", &env).unwrap();
        config.assets.root = Some(dir.path().to_str().unwrap().to_string());
        config.logging.access_log = false;
        AppState::with_engine(&config, engine).unwrap()
    }

    fn request(uri: &str, host: Option<&str>) -> Request<RequestBody> {
        let mut builder = Request::builder().uri(uri);
        if let Some(h) = host {
            builder = builder.header(HOST, h);
        }
        builder.body(empty()).unwrap()
    }

    fn peer() -> SocketAddr {
        "203.0.113.9:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_existing_asset_served_without_engine() {
        let dir = site();
        let engine = RecordingEngine::new(Behavior::Respond(200));
        let state = state(&dir, "development", engine.clone());

        let resp = dispatch(request("/img/logo.png", Some("shop.example.com")), &state, peer()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/png");
        assert!(resp.headers()[CACHE_CONTROL]
            .to_str()
            .unwrap()
            .contains("immutable"));

        let resp = dispatch(request("/_next/static/chunk123.js", None), &state, peer()).await;
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/javascript");
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_asset_delegated() {
        let dir = site();
        let engine = RecordingEngine::new(Behavior::Respond(404));
        let state = state(&dir, "development", engine.clone());

        let resp = dispatch(request("/img/missing.png", None), &state, peer()).await;
        // Whatever the engine answers, not a gateway 404
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "rendered");
        assert_eq!(engine.calls().len(), 1);
        assert_eq!(engine.calls()[0].0, "/img/missing.png");
    }

    #[tokio::test]
    async fn test_page_delegated() {
        let dir = site();
        let engine = RecordingEngine::new(Behavior::Respond(200));
        let state = state(&dir, "development", engine.clone());

        let resp = dispatch(request("/properties?city=delhi", None), &state, peer()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(engine.calls()[0].0, "/properties?city=delhi");
    }

    #[tokio::test]
    async fn test_development_mode_headers_untouched() {
        let dir = site();
        let engine = RecordingEngine::new(Behavior::Respond(200));
        let state = state(&dir, "development", engine.clone());

        dispatch(request("/", Some("0.0.0.0:3000")), &state, peer()).await;
        let (_, headers) = &engine.calls()[0];
        assert_eq!(headers[HOST], "0.0.0.0:3000");
        assert!(headers.get("x-forwarded-proto").is_none());
    }

    #[tokio::test]
    async fn test_production_mode_normalizes_before_delegation() {
        let dir = site();
        let engine = RecordingEngine::new(Behavior::Respond(200));
        let state = state(&dir, "production", engine.clone());

        dispatch(request("http://0.0.0.0:3000/cart", Some("0.0.0.0:3000")), &state, peer()).await;
        let (uri, headers) = &engine.calls()[0];
        assert_eq!(uri, "https://0.0.0.0:3000/cart");
        assert_eq!(headers[HOST], "shop.example.com");
        assert_eq!(headers["x-forwarded-proto"], "https");
        assert_eq!(headers["x-forwarded-port"], "443");
        assert_eq!(headers["x-forwarded-host"], "0.0.0.0:3000");
    }

    #[tokio::test]
    async fn test_absolute_target_still_matches_assets() {
        let dir = site();
        let engine = RecordingEngine::new(Behavior::Respond(200));
        let state = state(&dir, "production", engine.clone());

        let resp = dispatch(request("http://localhost/img/logo.png", None), &state, peer()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_engine_error_becomes_500() {
        let dir = site();
        let state = state(&dir, "development", RecordingEngine::new(Behavior::Fail));

        let resp = dispatch(request("/", None), &state, peer()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "Internal server error");
    }

    #[tokio::test]
    async fn test_engine_panic_becomes_500() {
        let dir = site();
        let state = state(&dir, "development", RecordingEngine::new(Behavior::Panic));

        let resp = dispatch(request("/boom", None), &state, peer()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
