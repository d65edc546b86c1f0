//! HTTP cache control module
//!
//! Cache-Control policies attached to directly served responses.

/// One year, the conventional ceiling for `max-age`
pub const ONE_YEAR_SECS: u32 = 31_536_000;

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Shared caches may keep the resource and never revalidate it
    Immutable(u32),
    /// No store
    NoStore,
}

impl CachePolicy {
    /// Policy for build artifacts whose URLs change with their content
    pub const fn versioned_asset() -> Self {
        Self::Immutable(ONE_YEAR_SECS)
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Immutable(max_age) => format!("public, max-age={max_age}, immutable"),
            Self::NoStore => "no-store".to_string(),
        }
    }
}
