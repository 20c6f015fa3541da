use {
    std::{
        net,
        sync::{Arc, atomic::{AtomicBool, Ordering}},
    },
    log::{error, info, trace},
    super::{
        http::{Dispatcher, Handler, Method, Registrar},
        line::LinePool,
    },
    crate::{
        config::Config,
        error::ServerError,
    },
};

pub struct Server {
    listener: net::TcpListener,
    stop: Arc<AtomicBool>,
    config: Arc<Config>,
    registrar: Registrar,
}

/// Asks a running [`Server`] to leave its accept loop.
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
    addr: net::SocketAddr,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // accept() only returns on a connection, so make one
        let mut wake = self.addr;
        if wake.ip().is_unspecified() {
            wake.set_ip(net::Ipv4Addr::LOCALHOST.into());
        }
        if let Err(e) = net::TcpStream::connect(wake) {
            trace!("wake-up connection to {} failed: {}", wake, e);
        }
    }
}

impl Server {
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = net::TcpListener::bind(&addr)?;
        info!("server created @ {}", addr);
        Ok(Server {
            listener,
            stop: Arc::new(AtomicBool::new(false)),
            config: Arc::new(config),
            registrar: Registrar::default(),
        })
    }

    pub fn add(&mut self, verb: Method, template: &str, handler: impl Handler + 'static) {
        self.registrar.register(verb, template, handler)
    }

    pub fn local_addr(&self) -> Result<net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn stop_handle(&self) -> Result<StopHandle, ServerError> {
        Ok(StopHandle {
            stop: self.stop.clone(),
            addr: self.local_addr()?,
        })
    }

    /// Freezes the registered handlers and serves connections until a
    /// [`StopHandle`] is triggered.
    pub fn start(self) -> Result<(), ServerError> {
        let Server { listener, stop, config, registrar } = self;
        info!("{} handler template(s) registered", registrar.len());
        let dispatcher = Arc::new(Dispatcher::new(registrar, config.clone()));
        let mut pool = LinePool::new(config.max_workers(), dispatcher);

        info!("server start listening @ {} with up to {} lines", listener.local_addr()?, config.max_workers());
        for incoming in listener.incoming() {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            match incoming {
                Ok(stream) => {
                    if let Ok(peer) = stream.peer_addr() {
                        trace!("incoming connection from {}", peer);
                    }
                    pool.handle(stream);
                },
                Err(e) => error!("failed to accept connection: {}", e),
            }
        }
        info!("server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod server_tests {
    use {
        super::*,
        std::{
            io::{Read, Write},
            thread,
        },
        super::super::http::{Req, Res},
    };

    fn test_config() -> Config {
        Config {
            port: 0,
            workers: Some(2),
            ..Config::default()
        }
    }

    fn request(addr: net::SocketAddr, raw: &str) -> String {
        let mut c = net::TcpStream::connect(addr).unwrap();
        c.write_all(raw.as_bytes()).unwrap();
        let mut out = String::new();
        c.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn serves_until_stopped() {
        let mut server = Server::new(test_config()).unwrap();
        server.add(Method::GET, "/greet/:name", |req: &Req| {
            let mut res = Res::new();
            res.set_body(&format!("hi {}", req.path_var("name").unwrap_or("?")));
            res
        });
        let addr = server.local_addr().unwrap();
        let stopper = server.stop_handle().unwrap();
        let running = thread::spawn(move || server.start());

        let reply = request(addr, "GET /greet/ana HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(reply.contains("Content-Length: 6\r\n"));
        assert!(reply.ends_with("\r\n\r\nhi ana"));

        let reply = request(addr, "POST /greet/ana HTTP/1.1\r\n\r\n");
        assert!(reply.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(reply.contains("Allow: GET\r\n"));

        let reply = request(addr, "GET /nowhere HTTP/1.1\r\n\r\n");
        assert!(reply.starts_with("HTTP/1.1 404 Not Found\r\n"));

        stopper.stop();
        assert!(running.join().unwrap().is_ok());
    }

    #[test]
    fn bind_failure_is_reported() {
        let taken = net::TcpListener::bind("127.0.0.1:0").unwrap();
        let cfg = Config {
            port: taken.local_addr().unwrap().port(),
            ..Config::default()
        };
        assert!(matches!(Server::new(cfg), Err(ServerError::Io(_))));
    }
}
