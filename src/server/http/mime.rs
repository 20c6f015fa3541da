pub const OCTET_STREAM: &str = "application/octet-stream";

pub fn content_type(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "7z" => "application/x-7z-compressed",
        "avi" => "video/x-msvideo",
        "azw" => "application/vnd.amazon.ebook",
        "bin" => OCTET_STREAM,
        "bmp" => "image/bmp",
        "cer" => "application/pkix-cert",
        "css" => "text/css",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "epub" => "application/epub+zip",
        "gif" => "image/gif",
        "htm" | "html" => "text/html",
        "ico" => "image/x-icon",
        "ics" => "text/calendar",
        "jpeg" | "jpg" => "image/jpeg",
        "jpgv" => "video/jpeg",
        "js" => "application/javascript",
        "json" => "application/json",
        "latex" => "application/x-latex",
        "md" => "text/markdown",
        "mpeg" => "video/mpeg",
        "pdf" => "application/pdf",
        "pki" => "application/pkixcmp",
        "png" => "image/png",
        "rar" => "application/x-rar-compressed",
        "rtf" => "application/rtf",
        "svg" => "image/svg+xml",
        "tar" => "application/x-tar",
        "tiff" => "image/tiff",
        "torrent" => "application/x-bittorrent",
        "tsv" => "text/tab-separated-values",
        "txt" => "text/plain",
        "uu" => "text/x-uuencode",
        "wasm" => "application/wasm",
        "wmv" => "video/x-ms-wmv",
        "xls" => "application/vnd.ms-excel",
        "xml" => "application/xml",
        "yaml" | "yml" => "text/yaml",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod mime_tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(content_type("HTML"), Some("text/html"));
        assert_eq!(content_type("json"), Some("application/json"));
        assert_eq!(content_type("nope"), None);
    }
}
