use {
    std::{io, path, fs},
    log::debug,
    super::res::Res,
    crate::config::Config,
};

/// Where static files come from. Paths handed in are already validated and
/// relative to the configured root.
pub trait FileSource: Send + Sync {
    fn read(&self, relative: &path::Path) -> io::Result<Vec<u8>>;
}

pub struct DirectorySource {
    root: path::PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for DirectorySource {
    fn read(&self, relative: &path::Path) -> io::Result<Vec<u8>> {
        let file = self.root.join(relative);
        if !file.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a regular file", file.display()),
            ));
        }
        fs::read(file)
    }
}

fn extension(url_path: &str) -> Option<&str> {
    let name = url_path.rsplit('/').next()?;
    match name.rfind('.') {
        Some(i) if i + 1 < name.len() => Some(&name[i + 1..]),
        _ => None,
    }
}

/// Serves `url_path` from `files` when the config allows it, otherwise 404.
pub fn serve_file(url_path: &str, cfg: &Config, files: &dyn FileSource) -> Res {
    let mut res = Res::new();
    let ext = match extension(url_path) {
        Some(ext) if cfg.can_download_extension(ext) => ext,
        _ => {
            debug!("static file {} has no allowed extension", url_path);
            res.set_as_404();
            return res;
        },
    };
    if url_path.contains("..") {
        debug!("rejecting traversal in {}", url_path);
        res.set_as_404();
        return res;
    }

    let relative = path::Path::new(url_path.trim_start_matches('/'));
    match files.read(relative) {
        Ok(data) => {
            res.set_code(200)
                .set_body_bytes(data)
                .set_content_type_by_ext(ext);
        },
        Err(e) => {
            debug!("failed to serve static file {}: {}", url_path, e);
            res.set_as_404();
        },
    }
    res
}

#[cfg(test)]
mod serve_static_tests {
    use {
        super::*,
        super::super::headers::*,
    };

    fn config_for(dir: &path::Path, extensions: &str) -> Config {
        let mut cfg = Config::default();
        cfg.files.download_allowed = true;
        cfg.files.set_extensions(extensions);
        cfg.files.directory = Some(dir.to_path_buf());
        cfg
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::create_dir(dir.path().join("assets.d")).unwrap();
        fs::write(dir.path().join("assets/main.css"), "#main-title {\n    color: green;\n}").unwrap();
        fs::write(dir.path().join("secret.key"), "hush").unwrap();
        dir
    }

    #[test]
    fn test_static() {
        let dir = fixture();
        let cfg = config_for(dir.path(), "css");
        let res = serve_file("/assets/main.css", &cfg, &DirectorySource::new(dir.path()));
        assert_eq!(res.code(), 200);
        assert_eq!(res.header(HTTP_HEADER_CONTENT_TYPE), Some("text/css"));
        assert_eq!(res.header(HTTP_HEADER_CONTENT_LENGTH), Some("33"));
        assert_eq!(res.body().unwrap(), b"#main-title {\n    color: green;\n}".to_vec());
    }

    #[test]
    fn disallowed_or_missing_extension_is_404() {
        let dir = fixture();
        let cfg = config_for(dir.path(), "css");
        let files = DirectorySource::new(dir.path());
        assert_eq!(serve_file("/secret.key", &cfg, &files).code(), 404);
        assert_eq!(serve_file("/assets", &cfg, &files).code(), 404);
        assert_eq!(serve_file("/assets.d/", &cfg, &files).code(), 404);
    }

    #[test]
    fn traversal_is_404() {
        let dir = fixture();
        let cfg = config_for(&dir.path().join("assets"), "*");
        let res = serve_file("/../secret.key", &cfg, &DirectorySource::new(dir.path().join("assets")));
        assert_eq!(res.code(), 404);
        assert!(!res.has_body());
    }

    #[test]
    fn missing_or_non_regular_file_is_404() {
        let dir = fixture();
        let cfg = config_for(dir.path(), "*");
        let files = DirectorySource::new(dir.path());
        assert_eq!(serve_file("/nope.css", &cfg, &files).code(), 404);
        assert_eq!(serve_file("/assets.d", &cfg, &files).code(), 404);
    }

    #[test]
    fn unknown_extension_is_served_as_octet_stream() {
        let dir = fixture();
        let cfg = config_for(dir.path(), "*");
        let res = serve_file("/secret.key", &cfg, &DirectorySource::new(dir.path()));
        assert_eq!(res.code(), 200);
        assert_eq!(res.header(HTTP_HEADER_CONTENT_TYPE), Some("application/octet-stream"));
    }
}
