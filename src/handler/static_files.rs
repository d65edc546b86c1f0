//! Static file serving module
//!
//! Matches request paths against an ordered list of prefix rules and streams
//! the first existing file straight from disk. Paths without a matching file
//! are left to the rendering engine.

use futures_util::{stream, StreamExt, TryStreamExt};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::Response;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::config::AssetsConfig;
use crate::error::StartupError;
use crate::http::{self, BoxError, CachePolicy, ContentTypeTable, ResponseBody};
use crate::logger;

/// Read size per body frame
const CHUNK_SIZE: usize = 64 * 1024;

/// Prefixes served from `<root>/public` with the full request path
const PUBLIC_PREFIXES: &[&str] = &["/css/", "/js/", "/img/"];
const PUBLIC_DIR: &str = "public";

/// Build output prefix, stripped before joining with `<root>/.next/static`
const BUILD_PREFIX: &str = "/_next/static/";
const BUILD_DIR: &str = ".next/static";

/// One URL prefix -> directory mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPathRule {
    pub prefix: String,
    pub base_dir: PathBuf,
    /// Join only the part after `prefix` instead of the whole path
    pub strip_prefix: bool,
}

impl StaticPathRule {
    pub fn new(prefix: impl Into<String>, base_dir: impl Into<PathBuf>, strip_prefix: bool) -> Self {
        Self {
            prefix: prefix.into(),
            base_dir: base_dir.into(),
            strip_prefix,
        }
    }

    /// Filesystem path this rule maps `path` to, if the prefix matches
    ///
    /// Never touches the filesystem. Remainders with `..` or root components
    /// yield `None` so no candidate leaves `base_dir`.
    pub fn candidate(&self, path: &str) -> Option<PathBuf> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        let relative = if self.strip_prefix { rest } else { path };

        let mut candidate = self.base_dir.clone();
        for component in Path::new(relative.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => candidate.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(candidate)
    }
}

/// Built-in rules for the public assets and build output directories
pub fn default_rules(root: &Path) -> Vec<StaticPathRule> {
    let public = root.join(PUBLIC_DIR);
    let mut rules: Vec<StaticPathRule> = PUBLIC_PREFIXES
        .iter()
        .map(|prefix| StaticPathRule::new(*prefix, public.clone(), false))
        .collect();
    rules.push(StaticPathRule::new(BUILD_PREFIX, root.join(BUILD_DIR), true));
    rules
}

/// Serves files for the configured rules; immutable after startup
#[derive(Debug, Clone)]
pub struct AssetResponder {
    rules: Vec<StaticPathRule>,
    content_types: ContentTypeTable,
    cache: CachePolicy,
}

impl AssetResponder {
    pub const fn new(rules: Vec<StaticPathRule>, content_types: ContentTypeTable) -> Self {
        Self {
            rules,
            content_types,
            cache: CachePolicy::versioned_asset(),
        }
    }

    /// Build rules and content types from config, rooted at `assets.root`
    /// or the working directory
    pub fn from_config(config: &AssetsConfig) -> Result<Self, StartupError> {
        let root = match &config.root {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir().map_err(StartupError::AssetRoot)?,
        };

        let rules = if config.rules.is_empty() {
            default_rules(&root)
        } else {
            config
                .rules
                .iter()
                .map(|rule| {
                    validate_rule(&rule.prefix, &rule.dir)?;
                    Ok(StaticPathRule::new(
                        rule.prefix.clone(),
                        root.join(&rule.dir),
                        rule.strip_prefix,
                    ))
                })
                .collect::<Result<Vec<_>, StartupError>>()?
        };

        Ok(Self::new(
            rules,
            ContentTypeTable::with_overrides(&config.content_types),
        ))
    }

    pub fn rules(&self) -> &[StaticPathRule] {
        &self.rules
    }

    /// First candidate, in rule order, that is an existing regular file
    pub async fn resolve(&self, path: &str) -> Option<PathBuf> {
        for rule in &self.rules {
            let Some(candidate) = rule.candidate(path) else {
                continue;
            };
            match fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() => return Some(candidate),
                _ => {}
            }
        }
        None
    }

    /// Serve `path` if a rule maps it to an existing file
    pub async fn respond(&self, path: &str) -> Option<Response<ResponseBody>> {
        let file_path = self.resolve(path).await?;
        Some(self.serve(&file_path).await)
    }

    /// Stream a resolved file
    ///
    /// Open or metadata failures answer 500. A failure on the first read
    /// answers 404. Later read failures abort the body, which closes the
    /// connection since the status line is already sent.
    pub async fn serve(&self, file_path: &Path) -> Response<ResponseBody> {
        let content_type = self.content_types.for_path(file_path);

        let file = match File::open(file_path).await {
            Ok(f) => f,
            Err(e) => {
                logger::log_error(&format!(
                    "Error opening static file '{}': {e}",
                    file_path.display()
                ));
                return http::build_500_response();
            }
        };

        let content_length = match file.metadata().await {
            Ok(meta) => meta.len(),
            Err(e) => {
                logger::log_error(&format!(
                    "Error reading metadata for '{}': {e}",
                    file_path.display()
                ));
                return http::build_500_response();
            }
        };

        let mut chunks = ReaderStream::with_capacity(file, CHUNK_SIZE);
        let first = match chunks.next().await {
            Some(Ok(chunk)) => Some(chunk),
            Some(Err(e)) => {
                logger::log_error(&format!(
                    "Error serving static file '{}': {e}",
                    file_path.display()
                ));
                return http::build_404_response();
            }
            None => None,
        };

        let display = file_path.display().to_string();
        let body = stream_body(first, chunks, move |e| {
            logger::log_error(&format!("Static file stream aborted '{display}': {e}"));
        });
        http::build_file_response(body, content_type, Some(content_length), self.cache)
    }
}

/// Body yielding `first` and then the remaining chunks
///
/// A read error ends the body with that error after `on_error` has seen it;
/// hyper then closes the connection.
fn stream_body<R, F>(first: Option<Bytes>, rest: ReaderStream<R>, on_error: F) -> ResponseBody
where
    R: AsyncRead + Send + 'static,
    F: FnMut(&io::Error) + Send + 'static,
{
    let frames = stream::iter(first.map(Ok))
        .chain(rest.inspect_err(on_error))
        .map_ok(Frame::data)
        .map_err(BoxError::from);

    StreamBody::new(frames).boxed_unsync()
}

fn validate_rule(prefix: &str, dir: &str) -> Result<(), StartupError> {
    let reject = |reason| StartupError::AssetRule {
        prefix: prefix.to_string(),
        dir: dir.to_string(),
        reason,
    };

    if !prefix.starts_with('/') {
        return Err(reject("prefix must start with '/'"));
    }
    let escapes = Path::new(dir)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(reject("directory must stay under the asset root"));
    }
    Ok(())
}
