//! Request handler module
//!
//! Forwarded-header normalization, static asset serving and dispatch to the
//! rendering engine.

pub mod forwarded;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use forwarded::ForwardedPolicy;
pub use router::handle_request;
pub use static_files::AssetResponder;
