
pub const HTTP_HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HTTP_HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HTTP_HEADER_CONTENT_MD5: &str = "Content-MD5";
pub const HTTP_HEADER_ALLOW: &str = "Allow";
pub const HTTP_HEADER_CONNECTION: &str = "Connection";
pub const HTTP_HEADER_SERVER: &str = "Server";
pub const HTTP_HEADER_DATE: &str = "Date";
pub const HTTP_HEADER_LAST_MODIFIED: &str = "Last-Modified";
pub const HTTP_HEADER_CACHE_CONTROL: &str = "Cache-Control";
pub const HTTP_HEADER_PRAGMA: &str = "Pragma";
pub const HTTP_HEADER_EXPIRES: &str = "Expires";
pub const HTTP_HEADER_X_CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";
pub const HTTP_HEADER_X_XSS_PROTECTION: &str = "X-XSS-Protection";
