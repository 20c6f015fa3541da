pub mod req;
pub mod res;
pub mod method;
pub mod template;
pub mod handler;
pub mod registrar;
pub mod dispatch;
pub mod serve_static;
pub mod checksum;
pub mod headers;
pub mod mime;
pub mod status;

pub use {
    req::Req,
    res::Res,
    method::Method,
    template::{Segment, UrlTemplate},
    handler::{Handler, HandlerRef},
    registrar::{Registrar, Resolution, UrlHandler},
    dispatch::Dispatcher,
    serve_static::{DirectorySource, FileSource},
};
