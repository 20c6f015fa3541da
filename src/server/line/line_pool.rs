use {
    std::{io::{self, Read}, net, sync},
    log::{debug, error, warn},
    super::*,
    super::super::http::{self, Dispatcher},
    crate::error::ServerError,
};

pub struct LinePool {
    lines: Vec<Line>,
    max_line: usize,
    dispatcher: sync::Arc<Dispatcher>,
}

impl LinePool {
    pub fn new(max_line: usize, dispatcher: sync::Arc<Dispatcher>) -> Self {
        LinePool {
            lines: vec![],
            max_line: max_line.max(1),
            dispatcher,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn handle(&mut self, s: net::TcpStream) {
        if self.lines.is_empty() {
            self.add_new_line();
        }
        if let Some(s) = self.send_to_line(s, 0) {
            warn!("out of capacity to handle incoming TCP stream");
            if let Err(e) = reject(s) {
                error!("failed to reject over capacity TCP stream: {}", e);
            }
        }
    }

    fn get_muxer(&self) -> impl FnMut(net::TcpStream) -> Result<(), ServerError> + Send + 'static {
        let dispatcher = self.dispatcher.clone();
        move |s: net::TcpStream| {
            let mut buf_read = io::BufReader::new(&s);
            let mut buf_write = io::BufWriter::new(&s);
            dispatcher.serve(&mut buf_read, &mut buf_write)?;
            drop(buf_write);
            s.shutdown(net::Shutdown::Both)?;
            Ok(())
        }
    }

    fn add_new_line(&mut self) {
        let m = self.get_muxer();
        self.lines.push(Line::new(m));
        debug!("new line added. line count:{}", self.lines.len());
    }

    /// Hands the stream to the first line that takes it, growing the pool
    /// when every line is busy. Gives the stream back when the pool is full.
    fn send_to_line(&mut self, s: net::TcpStream, idx: usize) -> Option<net::TcpStream> {
        if idx >= self.lines.len() {
            if self.lines.len() >= self.max_line {
                return Some(s);
            }
            self.add_new_line();
        }
        match self.lines[idx].send(s) {
            Ok(_) => None,
            Err((s_back, e)) => {
                debug!("e: {}", e);
                match e {
                    SendError::LineBusy => self.send_to_line(s_back, idx + 1),
                    SendError::Disconnected => {
                        self.lines.remove(idx);
                        debug!("line#{} removed due to disconnection", idx);
                        self.send_to_line(s_back, idx)
                    }
                }
            }
        }
    }
}

// whatever the client already sent is drained so closing does not reset
// the connection before the 503 arrives
fn reject(mut s: net::TcpStream) -> io::Result<()> {
    s.set_nonblocking(true)?;
    let mut scratch = [0u8; 4096];
    loop {
        match s.read(&mut scratch) {
            Ok(0) => break,
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(e),
        }
    }
    s.set_nonblocking(false)?;
    http::Res::with_code(503).write_to(&mut s)?;
    s.shutdown(net::Shutdown::Both)
}
