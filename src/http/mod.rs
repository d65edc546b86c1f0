//! HTTP protocol layer module
//!
//! Content types, cache policies and response plumbing shared by the static
//! responder and the rendering engine adapter.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache::CachePolicy;
pub use mime::ContentTypeTable;
pub use response::{
    build_404_response, build_500_response, build_file_response, BoxError, RequestBody,
    ResponseBody,
};
