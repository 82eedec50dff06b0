use std::ffi::OsStr;
use std::path::Path;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Maps a filename to the MIME type used for its S3 object. Matching is on
/// the extension only and case-insensitive; anything unknown falls back to
/// `application/octet-stream`.
pub fn resolve(filename: &str) -> &'static str {
    let Some(extension) = Path::new(filename).extension().and_then(OsStr::to_str) else {
        return DEFAULT_CONTENT_TYPE;
    };
    match extension.to_ascii_lowercase().as_str() {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_use_the_table() {
        assert_eq!(resolve("index.html"), "text/html");
        assert_eq!(resolve("styles/app.css"), "text/css");
        assert_eq!(resolve("bundle.js"), "application/javascript");
        assert_eq!(resolve("photo.jpeg"), "image/jpeg");
        assert_eq!(resolve("favicon.ico"), "image/x-icon");
        assert_eq!(resolve("docs/guide.pdf"), "application/pdf");
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(resolve("INDEX.HTML"), "text/html");
        assert_eq!(resolve("logo.PNG"), "image/png");
        assert_eq!(resolve("Photo.JpG"), "image/jpeg");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert_eq!(resolve("archive.tar.gz"), "application/octet-stream");
        assert_eq!(resolve("binary.wasm"), "application/octet-stream");
        assert_eq!(resolve("LICENSE"), "application/octet-stream");
        assert_eq!(resolve(""), "application/octet-stream");
    }
}
