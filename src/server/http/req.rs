use {
    std::{
        borrow::Cow,
        collections,
        fmt,
        io::{self, BufRead, Read},
    },
    percent_encoding::percent_decode_str,
    log::{debug, warn},
    super::{
        method::Method,
        headers::*,
    },
    crate::error::ServerError,
};

const MAX_HTTP_LINE_LENGTH: usize = 8192;

#[derive(Debug, Default)]
pub struct Req {
    method: Method,
    endpoint: String,
    protocol: String,
    path: String,
    fragment: Option<String>,
    params: Vec<(String, String)>,
    path_vars: collections::HashMap<String, String>,
    headers: collections::HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl Req {
    /// Reads the request line. `Ok(None)` means the peer sent nothing. The
    /// returned request may still carry an unsupported protocol; see
    /// [`Req::is_valid_protocol`].
    pub fn new<R: BufRead>(reader: &mut R) -> Result<Option<Self>, ServerError> {
        match read_line(reader)? {
            Some(line) => Ok(Some(Req::from_request_line(&line))),
            None => Ok(None),
        }
    }

    /// Splits `VERB ENDPOINT PROTOCOL` on the first two spaces. A line that
    /// cannot be split yields a request with no protocol.
    pub fn from_request_line(line: &str) -> Self {
        let mut req = Req::default();
        let first = match line.find(' ') {
            Some(i) if i + 1 < line.len() => i,
            _ => return req,
        };
        let second = match line[first + 1..].find(' ') {
            Some(i) if first + 1 + i + 1 < line.len() => first + 1 + i,
            _ => return req,
        };

        req.method = Method::from(line[..first].trim());
        req.endpoint = percent_decode_str(line[first + 1..second].trim())
            .decode_utf8_lossy()
            .into_owned();
        req.protocol = line[second + 1..].trim().to_string();
        req
    }

    pub fn is_valid_protocol(&self) -> bool {
        self.protocol == "HTTP/1.0" || self.protocol == "HTTP/1.1"
    }

    /// Reads headers and body, and splits the endpoint into path, query
    /// parameters and fragment.
    pub fn read_remainder<R: BufRead>(&mut self, reader: &mut R) -> Result<(), ServerError> {
        self.parse_headers(reader)?;
        self.parse_url_and_params();
        self.read_body(reader)
    }

    fn parse_headers<R: BufRead>(&mut self, reader: &mut R) -> Result<(), ServerError> {
        while let Some(line) = read_line(reader)? {
            if line.is_empty() {
                break;
            }
            if let Some((k, v)) = split_header_line(&line) {
                self.add_header(k, v);
            }
        }
        Ok(())
    }

    fn read_body<R: BufRead>(&mut self, reader: &mut R) -> Result<(), ServerError> {
        let length = match self.header(HTTP_HEADER_CONTENT_LENGTH) {
            Some(v) => match v.trim().parse::<usize>() {
                Ok(n) => n,
                Err(e) => {
                    warn!("ignoring unparsable {} '{}': {}", HTTP_HEADER_CONTENT_LENGTH, v, e);
                    0
                },
            },
            None => 0,
        };
        if length == 0 {
            return Ok(());
        }

        let mut body = Vec::with_capacity(length.min(64 * 1024));
        let mut chunk = [0u8; 4096];
        while body.len() < length {
            let want = (length - body.len()).min(chunk.len());
            match reader.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => body.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // the client stopped sending but kept the socket open
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    debug!("body read stalled: {}", e);
                    break;
                },
                Err(e) => return Err(e.into()),
            }
        }
        if body.len() != length {
            warn!("expected {} bytes in the body but found {}", length, body.len());
        }
        if !body.is_empty() {
            self.body = Some(body);
        }
        Ok(())
    }

    pub fn parse_url_and_params(&mut self) {
        if self.endpoint.is_empty() {
            return;
        }
        let endpoint = self.endpoint.clone();
        let without_fragment = match endpoint.find('#') {
            Some(i) => {
                if i > 0 {
                    self.fragment = Some(endpoint[i + 1..].to_string());
                }
                &endpoint[..i]
            },
            None => endpoint.as_str(),
        };

        let query = match without_fragment.find('?') {
            Some(i) => {
                self.path = without_fragment[..i].to_string();
                &without_fragment[i + 1..]
            },
            None => {
                self.path = without_fragment.to_string();
                ""
            },
        };

        for pair in query.split('&') {
            if let Some((k, v)) = pair.split_once('=') {
                self.add_param(k, v);
            }
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn add_param(&mut self, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.params.push((key.to_string(), value.to_string())),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn add_path_var(&mut self, name: &str, value: &str) {
        self.path_vars.insert(name.to_string(), value.to_string());
    }

    pub fn path_var(&self, name: &str) -> Option<&str> {
        self.path_vars.get(name).map(String::as_str)
    }

    pub fn path_vars(&self) -> &collections::HashMap<String, String> {
        &self.path_vars
    }

    pub fn add_header(&mut self, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        self.headers.insert(key.to_string(), value.to_string());
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
            .or_else(|| self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
            .map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn body_text(&self) -> Option<Cow<str>> {
        self.body.as_deref().map(String::from_utf8_lossy)
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn cleanup(&mut self) {
        debug!("cleaning up request {}", self);
        *self = Req::default();
    }
}

impl fmt::Display for Req {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.endpoint, self.protocol)
    }
}

/// Reads one line, without its CRLF. `Ok(None)` at end of stream.
pub(crate) fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, ServerError> {
    let mut buf = Vec::with_capacity(256);
    // room for the CRLF on top of the content
    let limit = (MAX_HTTP_LINE_LENGTH + 2) as u64;
    let n = reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    if buf.len() > MAX_HTTP_LINE_LENGTH {
        return Err(ServerError::LineTooLong(MAX_HTTP_LINE_LENGTH));
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn split_header_line(line: &str) -> Option<(&str, &str)> {
    match line.find(':') {
        Some(i) if i > 0 => Some((&line[..i], line[i + 1..].trim())),
        _ => None,
    }
}
