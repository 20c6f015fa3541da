use std::{
    net,
    sync::mpsc,
    thread,
    time,
    io,
    fmt,
};

use log::{error, trace};

const LINE_STREAM_TIMEOUT_SECS: u64 = 10;
const SYNC_CHANNEL_BUFFER_SIZE: usize = 2;

#[derive(Debug, PartialEq)]
pub enum SendError {
    LineBusy,
    Disconnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SendError::LineBusy => write!(f, "SendError::LineBusy"),
            SendError::Disconnected => write!(f, "SendError::Disconnected"),
        }
    }
}

/// A worker thread fed through a small bounded channel. Dropping the line
/// closes the channel, which ends the thread once its queue is drained.
pub struct Line {
    s: mpsc::SyncSender<net::TcpStream>,
}

impl Line {
    pub fn new<E: fmt::Display>(mut stream_handler: impl FnMut(net::TcpStream) -> Result<(), E> + Send + 'static) -> Self {
        let (s, r) = mpsc::sync_channel::<net::TcpStream>(SYNC_CHANNEL_BUFFER_SIZE);
        thread::spawn(move || {
            for st in r {
                if let Err(e) = set_timeouts(&st) {
                    error!("failed to set stream timeouts: {}", e);
                }
                let peer = st.peer_addr().map(|a| a.to_string()).unwrap_or_default();
                if let Err(e) = stream_handler(st) {
                    error!("connection {} failed: {}", peer, e);
                }
            }
            trace!("line stopped");
        });
        Self {
            s,
        }
    }

    pub fn send(&mut self, stream: net::TcpStream) -> Result<(), (net::TcpStream, SendError)> {
        self.s.try_send(stream).map_err(|e| {
            match e {
                mpsc::TrySendError::Full(s) => (s, SendError::LineBusy),
                mpsc::TrySendError::Disconnected(s) => (s, SendError::Disconnected),
            }
        })
    }
}

fn set_timeouts(st: &net::TcpStream) -> io::Result<()> {
    let t = Some(time::Duration::from_secs(LINE_STREAM_TIMEOUT_SECS));
    st.set_read_timeout(t)?;
    st.set_write_timeout(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        sync::{Mutex,Arc},
        net::{TcpListener,TcpStream},
        time,
    };

    #[test]
    fn handler_can_mutate_environment() -> std::io::Result<()> {
        let server = TcpListener::bind("127.0.0.1:0")?;
        let addr = server.local_addr()?;

        // handler closure and its captured values
        let buf = Arc::new(Mutex::new(vec![0u8]));
        let buf_ref = buf.clone();
        let mut l = Line::new(move |mut stream: net::TcpStream| -> io::Result<()> {
            let mut buf_guard = buf_ref.lock().unwrap();
            buf_guard.clear();

            let mut tempbuf = [0u8;3];
            stream.read_exact(&mut tempbuf)?;
            buf_guard.extend_from_slice(&tempbuf);
            Ok(())
        });

        let mut client1 = TcpStream::connect(addr)?;
        let (conn1, _) = server.accept()?;
        l.send(conn1).unwrap();
        client1.write_all("abc".as_bytes())?;
        thread::sleep(time::Duration::from_millis(300)); // server takes time to modify the target
        assert_eq!(buf.lock().unwrap().as_slice(), "abc".as_bytes());

        Ok(())
    }

    #[test]
    fn receive_busy_while_processing_stream() {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        let mut l = Line::new(move |_| -> io::Result<()> {
            thread::sleep(time::Duration::from_millis(600));
            Ok(())
        });

        let _c1 = TcpStream::connect(addr).unwrap();
        let _c2 = TcpStream::connect(addr).unwrap();
        let _c3 = TcpStream::connect(addr).unwrap();
        let (conn1, _) = server.accept().unwrap();
        let (conn2, _) = server.accept().unwrap();
        let (conn3, _) = server.accept().unwrap();
        assert!(l.send(conn1).is_ok());
        thread::sleep(time::Duration::from_millis(100));
        assert!(l.send(conn2).is_ok());
        thread::sleep(time::Duration::from_millis(100));
        assert!(l.send(conn3).is_ok());

        thread::sleep(time::Duration::from_millis(100));
        let _c4 = TcpStream::connect(addr).unwrap();
        let (conn4, _) = server.accept().unwrap();
        assert_eq!(l.send(conn4).map_err(|(_,e)| e), Err(SendError::LineBusy));

        thread::sleep(time::Duration::from_millis(800));
        let _c5 = TcpStream::connect(addr).unwrap();
        let (conn5, _) = server.accept().unwrap();
        assert!(l.send(conn5).is_ok());
    }
}
