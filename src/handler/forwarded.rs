//! Forwarded header normalization
//!
//! Behind a TLS-terminating proxy this process only ever sees plaintext
//! connections. In secure deployments the request is rewritten so the
//! rendering engine builds absolute URLs for the external `https` origin.

use hyper::header::{HeaderName, HeaderValue, HOST};
use hyper::http::uri::{Scheme, Uri};
use hyper::Request;

use crate::config::DeploymentConfig;
use crate::logger;

pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_PORT: HeaderName = HeaderName::from_static("x-forwarded-port");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const SECURE_SCHEME: &str = "https";
const SECURE_PORT: &str = "443";

/// Rewrite policy, fixed at startup
#[derive(Debug, Clone)]
pub struct ForwardedPolicy {
    pub secure: bool,
    pub canonical_host: HeaderValue,
    /// Host values containing any of these are replaced by `canonical_host`
    pub internal_host_markers: Vec<String>,
}

impl ForwardedPolicy {
    pub fn from_config(config: &DeploymentConfig) -> Result<Self, hyper::header::InvalidHeaderValue> {
        Ok(Self {
            secure: config.mode.is_secure(),
            canonical_host: HeaderValue::from_str(&config.canonical_host)?,
            internal_host_markers: config.internal_host_markers.clone(),
        })
    }

    /// Normalize headers and target URI in place; no-op unless secure
    pub fn apply<B>(&self, req: &mut Request<B>) {
        if !self.secure {
            return;
        }

        let headers = req.headers_mut();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(SECURE_SCHEME));
        headers.insert(X_FORWARDED_PORT, HeaderValue::from_static(SECURE_PORT));

        let host = headers.get(HOST).cloned();
        let forwarded_host = host.clone().unwrap_or_else(|| self.canonical_host.clone());
        headers.insert(X_FORWARDED_HOST, forwarded_host);

        if host.as_ref().map_or(true, |h| self.is_internal_host(h)) {
            headers.insert(HOST, self.canonical_host.clone());
        }

        if req.uri().scheme() == Some(&Scheme::HTTP) {
            let upgraded = upgrade_scheme(req.uri());
            *req.uri_mut() = upgraded;
        }
    }

    /// Substring match against the configured markers
    fn is_internal_host(&self, host: &HeaderValue) -> bool {
        host.to_str().is_ok_and(|h| {
            self.internal_host_markers
                .iter()
                .any(|marker| h.contains(marker.as_str()))
        })
    }
}

/// `http://` absolute-form target rewritten to `https://`
fn upgrade_scheme(uri: &Uri) -> Uri {
    let mut parts = uri.clone().into_parts();
    parts.scheme = Some(Scheme::HTTPS);
    Uri::from_parts(parts).unwrap_or_else(|e| {
        logger::log_warning(&format!("Keeping request target {uri}: {e}"));
        uri.clone()
    })
}
