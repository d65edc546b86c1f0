//! MIME type detection module
//!
//! Maps file extensions to the Content-Type served for static assets.

use std::collections::HashMap;
use std::path::Path;

/// Content type for anything the table does not know
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Built-in entries, keyed by lower-cased extension with leading dot
const BUILTIN_TYPES: &[(&str, &str)] = &[
    // Text
    (".html", "text/html"),
    (".css", "text/css"),
    (".txt", "text/plain"),
    (".xml", "application/xml"),
    // JavaScript/WASM
    (".js", "application/javascript"),
    (".mjs", "application/javascript"),
    (".map", "application/json"),
    (".json", "application/json"),
    (".webmanifest", "application/manifest+json"),
    (".wasm", "application/wasm"),
    // Images
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".svg", "image/svg+xml"),
    (".ico", "image/x-icon"),
    (".webp", "image/webp"),
    (".avif", "image/avif"),
    // Fonts
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
    (".ttf", "font/ttf"),
    (".otf", "font/otf"),
    (".eot", "application/vnd.ms-fontobject"),
];

/// Read-only extension -> MIME lookup, built once at startup
#[derive(Debug, Clone)]
pub struct ContentTypeTable {
    entries: HashMap<String, String>,
}

impl ContentTypeTable {
    /// Table with the built-in entries only
    pub fn new() -> Self {
        let entries = BUILTIN_TYPES
            .iter()
            .map(|(ext, mime)| ((*ext).to_string(), (*mime).to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in entries plus configured ones; configured entries win
    ///
    /// Keys may be given with or without the leading dot, in any case.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut table = Self::new();
        for (ext, mime) in overrides {
            table.entries.insert(normalize_extension(ext), mime.clone());
        }
        table
    }

    /// Look up an extension such as `.png`; unknown maps to the default type
    pub fn lookup(&self, extension: &str) -> &str {
        self.entries
            .get(&normalize_extension(extension))
            .map_or(DEFAULT_CONTENT_TYPE, String::as_str)
    }

    /// Content type for a file path, based on its last extension
    pub fn for_path(&self, path: &Path) -> &str {
        extension_of(path).map_or(DEFAULT_CONTENT_TYPE, |ext| self.lookup(&ext))
    }
}

impl Default for ContentTypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower-cased extension with leading dot, e.g. `Logo.PNG` -> `.png`
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_ascii_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        let table = ContentTypeTable::new();
        assert_eq!(table.lookup(".html"), "text/html");
        assert_eq!(table.lookup(".css"), "text/css");
        assert_eq!(table.lookup(".js"), "application/javascript");
        assert_eq!(table.lookup(".json"), "application/json");
        assert_eq!(table.lookup(".png"), "image/png");
        assert_eq!(table.lookup(".woff2"), "font/woff2");
        assert_eq!(table.lookup(".eot"), "application/vnd.ms-fontobject");
    }

    #[test]
    fn test_unknown_extension() {
        let table = ContentTypeTable::new();
        assert_eq!(table.lookup(".xyz"), DEFAULT_CONTENT_TYPE);
        assert_eq!(table.for_path(Path::new("public/img/README")), DEFAULT_CONTENT_TYPE);
        assert_eq!(table.for_path(Path::new("public/.hidden")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_path_extension_is_case_insensitive() {
        let table = ContentTypeTable::new();
        assert_eq!(table.for_path(Path::new("img/Logo.PNG")), "image/png");
        assert_eq!(table.for_path(Path::new("archive.tar.JPEG")), "image/jpeg");
        assert_eq!(extension_of(Path::new("a/b/c.Svg")).as_deref(), Some(".svg"));
    }

    #[test]
    fn test_overrides() {
        let overrides = HashMap::from([
            ("TXT".to_string(), "text/plain; charset=utf-8".to_string()),
            (".avif".to_string(), "image/avif-custom".to_string()),
            ("glb".to_string(), "model/gltf-binary".to_string()),
        ]);
        let table = ContentTypeTable::with_overrides(&overrides);
        assert_eq!(table.lookup(".txt"), "text/plain; charset=utf-8");
        assert_eq!(table.lookup(".avif"), "image/avif-custom");
        assert_eq!(table.for_path(Path::new("model.glb")), "model/gltf-binary");
        assert_eq!(table.lookup(".png"), "image/png");
    }
}
