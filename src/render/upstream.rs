//! HTTP adapter for a rendering engine running as its own listener
//!
//! The normalized request is replayed against the engine with its method,
//! path, query, headers and body intact; the engine's response streams back
//! unchanged.

use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use hyper::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::{RenderEngine, RenderError};
use crate::error::StartupError;
use crate::http::{BoxError, RequestBody, ResponseBody};

pub struct UpstreamRenderer {
    client: Client<HttpConnector, RequestBody>,
    authority: Authority,
}

impl UpstreamRenderer {
    /// `upstream` must be a plain `http://host:port` URL
    pub fn new(upstream: &str) -> Result<Self, StartupError> {
        let reject = |reason: String| StartupError::RenderUpstream {
            url: upstream.to_string(),
            reason,
        };

        let uri: Uri = upstream.parse().map_err(|e| reject(format!("{e}")))?;
        if uri.scheme() != Some(&Scheme::HTTP) {
            return Err(reject("only http:// upstreams are supported".to_string()));
        }
        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| reject("missing host".to_string()))?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { client, authority })
    }

    pub const fn authority(&self) -> &Authority {
        &self.authority
    }

    fn target_uri(&self, original: &Uri) -> Result<Uri, hyper::http::Error> {
        let path_and_query = original
            .path_and_query()
            .map_or("/", PathAndQuery::as_str);
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

#[async_trait]
impl RenderEngine for UpstreamRenderer {
    async fn handle(&self, req: Request<RequestBody>) -> Result<Response<ResponseBody>, RenderError> {
        let (mut parts, body) = req.into_parts();
        parts.uri = self
            .target_uri(&parts.uri)
            .map_err(|source| RenderError::Request {
                target: parts.uri.to_string(),
                source,
            })?;

        let resp = self
            .client
            .request(Request::from_parts(parts, body))
            .await?;
        Ok(resp.map(|body| body.map_err(BoxError::from).boxed_unsync()))
    }
}
