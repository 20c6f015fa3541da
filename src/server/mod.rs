pub mod http;
mod line;
mod server;

pub use {
    server::{Server, StopHandle},
    http::{Method, Req, Res, Registrar, Handler, UrlTemplate},
};
