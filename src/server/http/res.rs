use {
    std::{
        collections,
        fmt,
        io,
    },
    chrono::{DateTime, Utc},
    log::debug,
    super::{
        checksum,
        headers::*,
        mime,
        status,
    },
};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// An HTTP response under construction.
///
/// `Content-Length` is owned by the body setters; `add_header` refuses it.
#[derive(Debug, Clone)]
pub struct Res {
    status_code: u16,
    status: String,
    headers: collections::HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl Default for Res {
    fn default() -> Self {
        let mut res = Res {
            status_code: 200,
            status: String::from("OK"),
            headers: collections::HashMap::new(),
            body: None,
        };
        res.set_defaults();
        res
    }
}

impl Res {
    pub fn new() -> Self {
        Res::default()
    }

    pub fn with_code(status_code: u16) -> Self {
        let mut res = Res::default();
        res.set_code(status_code);
        res
    }

    fn set_defaults(&mut self) {
        let now = Utc::now();
        self.set_plain_text_content_type()
            .add_header(HTTP_HEADER_SERVER, concat!("tidepool/", env!("CARGO_PKG_VERSION")))
            .add_header(HTTP_HEADER_CONNECTION, "close")
            .add_header(HTTP_HEADER_CACHE_CONTROL, "no-cache, no-store, max-age=0, must-revalidate")
            .add_header(HTTP_HEADER_PRAGMA, "no-cache")
            .add_header_num(HTTP_HEADER_EXPIRES, 0)
            .add_header(HTTP_HEADER_X_CONTENT_TYPE_OPTIONS, "nosniff")
            .add_header(HTTP_HEADER_X_XSS_PROTECTION, "1; mode=block")
            .add_header_date(HTTP_HEADER_DATE, &now)
            .add_header_date(HTTP_HEADER_LAST_MODIFIED, &now)
            .clear_body();
    }

    /// Sets the code and looks up its phrase. An unknown code keeps the
    /// current phrase.
    pub fn set_code(&mut self, status_code: u16) -> &mut Self {
        self.status_code = status_code;
        if let Some(phrase) = status::reason_phrase(status_code) {
            self.set_message(phrase);
        }
        self
    }

    pub fn code(&self) -> u16 {
        self.status_code
    }

    pub fn set_message(&mut self, message: &str) -> &mut Self {
        let message = message.trim();
        if !message.is_empty() {
            self.status = message.to_string();
        }
        self
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_body(&mut self, body: &str) -> &mut Self {
        self.set_body_bytes(body.as_bytes().to_vec())
    }

    pub fn set_body_bytes(&mut self, body: Vec<u8>) -> &mut Self {
        let length = body.len();
        self.body = if body.is_empty() { None } else { Some(body) };
        self.headers.insert(HTTP_HEADER_CONTENT_LENGTH.to_string(), length.to_string());
        self
    }

    pub fn clear_body(&mut self) -> &mut Self {
        self.set_body_bytes(Vec::new())
    }

    pub fn body(&self) -> Option<Vec<u8>> {
        self.body.clone()
    }

    pub fn has_body(&self) -> bool {
        self.body.as_ref().map_or(false, |b| !b.is_empty())
    }

    /// Stores a header. Empty names or values are ignored, and so is
    /// `Content-Length`, which only the body setters write.
    pub fn add_header(&mut self, key: &str, value: &str) -> &mut Self {
        if key.is_empty() || value.is_empty() {
            return self;
        }
        if key.eq_ignore_ascii_case(HTTP_HEADER_CONTENT_LENGTH) {
            debug!("ignoring {}: {}; it follows the body", key, value);
            return self;
        }
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn add_header_num<N: fmt::Display>(&mut self, key: &str, value: N) -> &mut Self {
        self.add_header(key, &value.to_string())
    }

    pub fn add_header_date(&mut self, key: &str, value: &DateTime<Utc>) -> &mut Self {
        self.add_header(key, &value.format(IMF_FIXDATE).to_string())
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_json_content_type(&mut self) -> &mut Self {
        self.set_content_type_by_ext("json")
    }

    pub fn set_plain_text_content_type(&mut self) -> &mut Self {
        self.set_content_type_by_ext("txt")
    }

    pub fn set_html_content_type(&mut self) -> &mut Self {
        self.set_content_type_by_ext("html")
    }

    pub fn set_content_type_by_ext(&mut self, ext: &str) -> &mut Self {
        let mime = mime::content_type(ext).unwrap_or(mime::OCTET_STREAM);
        self.add_header(HTTP_HEADER_CONTENT_TYPE, mime)
    }

    pub fn set_as_404(&mut self) -> &mut Self {
        self.set_code(404).clear_body()
    }

    /// Adds `Content-MD5` over the current body, if there is one.
    pub fn add_checksum(&mut self) -> &mut Self {
        if let Some(digest) = self.body.as_deref().map(checksum::md5_hex) {
            self.add_header(HTTP_HEADER_CONTENT_MD5, &digest);
        }
        self
    }

    pub fn write_to(&self, writer: &mut impl io::Write) -> io::Result<()> {
        write!(writer, "HTTP/1.1 {} {}\r\n", self.status_code, self.status)?;
        for (key, value) in self.headers.iter() {
            write!(writer, "{}: {}\r\n", key, value)?;
        }
        writer.write_all(b"\r\n")?;
        if let Some(body) = self.body.as_deref() {
            writer.write_all(body)?;
        }
        writer.flush()
    }
}

#[cfg(test)]
mod res_tests {
    use super::*;

    fn content_length(res: &Res) -> usize {
        res.header(HTTP_HEADER_CONTENT_LENGTH).unwrap().parse().unwrap()
    }

    #[test]
    fn defaults() {
        let res = Res::new();
        assert_eq!(res.code(), 200);
        assert_eq!(res.status(), "OK");
        assert_eq!(res.header(HTTP_HEADER_CONTENT_TYPE), Some("text/plain"));
        assert_eq!(res.header(HTTP_HEADER_CONNECTION), Some("close"));
        assert_eq!(res.header(HTTP_HEADER_X_CONTENT_TYPE_OPTIONS), Some("nosniff"));
        assert!(res.header(HTTP_HEADER_DATE).unwrap().ends_with(" GMT"));
        assert_eq!(content_length(&res), 0);
        assert!(!res.has_body());
    }

    #[test]
    fn content_length_follows_body() {
        let mut res = Res::new();
        res.set_body("héllo");
        assert_eq!(content_length(&res), "héllo".len());
        res.set_body_bytes(vec![0u8; 1024]);
        assert_eq!(content_length(&res), 1024);
        res.set_as_404();
        assert_eq!(content_length(&res), 0);
        assert_eq!(res.code(), 404);
        assert_eq!(res.status(), "Not Found");
        assert!(res.body().is_none());
    }

    #[test]
    fn content_length_cannot_be_set_by_hand() {
        let mut res = Res::new();
        res.set_body("hi")
            .add_header(HTTP_HEADER_CONTENT_LENGTH, "999")
            .add_header_num("CONTENT-LENGTH", 7);
        assert_eq!(content_length(&res), 2);
        assert!(res.header("CONTENT-LENGTH").is_none());

        let mut out: Vec<u8> = vec![];
        res.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\r\nContent-Length: 2\r\n"));
        assert_eq!(text.to_ascii_lowercase().matches("content-length").count(), 1);
    }

    #[test]
    fn body_is_returned_as_a_copy() {
        let mut res = Res::new();
        res.set_body("abc");
        let mut copy = res.body().unwrap();
        copy[0] = b'x';
        assert_eq!(res.body().unwrap(), b"abc".to_vec());
    }

    #[test]
    fn unknown_code_keeps_phrase() {
        let mut res = Res::with_code(418);
        assert_eq!(res.status(), "I'm a teapot");
        res.set_code(299);
        assert_eq!(res.code(), 299);
        assert_eq!(res.status(), "I'm a teapot");
    }

    #[test]
    fn empty_header_values_are_ignored() {
        let mut res = Res::new();
        res.add_header("X-Empty", "").add_header("", "v");
        assert!(res.header("X-Empty").is_none());
        assert!(res.header("").is_none());
    }

    #[test]
    fn checksum_covers_final_body() {
        let mut res = Res::new();
        res.add_checksum();
        assert!(res.header(HTTP_HEADER_CONTENT_MD5).is_none());
        res.set_body("hello").add_checksum();
        assert_eq!(res.header(HTTP_HEADER_CONTENT_MD5), Some("5D41402ABC4B2A76B9719D911017C592"));
    }

    #[test]
    fn serialization() {
        let mut res = Res::with_code(201);
        res.set_json_content_type().set_body("{}");
        let mut out: Vec<u8> = vec![];
        res.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.contains("\r\nContent-Type: application/json\r\n"));
        assert!(text.contains("\r\nContent-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\n{}"));
        assert_eq!(text.matches("Content-Length").count(), 1);
    }
}
