//! Rendering engine seam
//!
//! Everything the static responder does not answer is handed to a
//! [`RenderEngine`]. Once delegated, the engine owns the response.

mod upstream;

use async_trait::async_trait;
use hyper::{Request, Response};
use thiserror::Error;

use crate::http::{RequestBody, ResponseBody};

pub use upstream::UpstreamRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot build upstream request for '{target}': {source}")]
    Request {
        target: String,
        #[source]
        source: hyper::http::Error,
    },

    #[error("rendering engine request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Produces the response for a request the gateway does not serve itself
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn handle(&self, req: Request<RequestBody>) -> Result<Response<ResponseBody>, RenderError>;
}
