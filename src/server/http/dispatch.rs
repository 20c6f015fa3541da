//! Per-connection request lifecycle: read the request, route it, fall back
//! to static files, and write exactly one response.

use {
    std::{
        io::{self, BufRead},
        sync,
    },
    log::{debug, info, warn},
    super::{
        checksum,
        headers::*,
        method::Method,
        registrar::{Registrar, Resolution},
        req::Req,
        res::Res,
        serve_static::{self, DirectorySource, FileSource},
    },
    crate::{
        config::Config,
        error::ServerError,
    },
};

pub struct Dispatcher {
    registrar: Registrar,
    config: sync::Arc<Config>,
    files: Box<dyn FileSource>,
}

impl Dispatcher {
    pub fn new(registrar: Registrar, config: sync::Arc<Config>) -> Self {
        let root = config.file_directory().map(|p| p.to_path_buf()).unwrap_or_default();
        Self::with_files(registrar, config, Box::new(DirectorySource::new(root)))
    }

    pub fn with_files(registrar: Registrar, config: sync::Arc<Config>, files: Box<dyn FileSource>) -> Self {
        Self { registrar, config, files }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handles one request from `reader` and writes its response to `writer`.
    /// Only transport errors are returned; everything else becomes a status.
    pub fn serve<R: BufRead, W: io::Write>(&self, reader: &mut R, writer: &mut W) -> Result<(), ServerError> {
        let mut res = match Req::new(reader)? {
            Some(mut req) if req.is_valid_protocol() => {
                req.read_remainder(reader)?;
                info!("{} {}", req.method(), req.endpoint());
                let res = self.respond(&mut req);
                req.cleanup();
                res
            },
            Some(req) => {
                debug!("unsupported request line: {}", req);
                Res::new()
            },
            None => Res::new(),
        };

        if self.config.should_compute_checksum() {
            res.add_checksum();
        }
        debug!("responding {} {}", res.code(), res.status());
        res.write_to(writer)?;
        Ok(())
    }

    pub fn respond(&self, req: &mut Req) -> Res {
        if let (Some(expected), Some(body)) = (req.header(HTTP_HEADER_CONTENT_MD5), req.body()) {
            if !checksum::verify(body, expected) {
                warn!("{} mismatch on {} {}", HTTP_HEADER_CONTENT_MD5, req.method(), req.endpoint());
                return Res::with_code(400);
            }
        }

        if *req.method() == Method::TRACE {
            return if self.config.trace_enabled() {
                trace_echo(req)
            } else {
                Res::with_code(405)
            };
        }

        match self.registrar.resolve(req) {
            Resolution::Handled(url_handler) => url_handler.handler().process(req),
            Resolution::VerbNotAllowed(verbs) => {
                let allow = verbs.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                let mut res = Res::with_code(405);
                res.add_header(HTTP_HEADER_ALLOW, &allow);
                res
            },
            Resolution::NoTemplate if self.config.can_download_files() => {
                serve_static::serve_file(req.path(), &self.config, self.files.as_ref())
            },
            Resolution::NoTemplate => {
                let mut res = Res::new();
                res.set_as_404();
                res
            },
        }
    }
}

/// Echoes the received request line and headers back as `message/http`.
fn trace_echo(req: &Req) -> Res {
    let mut echo = format!("{}\r\n", req);
    for (k, v) in req.headers() {
        echo.push_str(&format!("{}: {}\r\n", k, v));
    }
    let mut res = Res::with_code(200);
    res.add_header(HTTP_HEADER_CONTENT_TYPE, "message/http").set_body(&echo);
    res
}
