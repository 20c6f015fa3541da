use {
    std::{
        io::{self, Write},
        sync::mpsc,
        thread,
    },
    chrono::{SecondsFormat, Utc},
    log::{Metadata, Record},
};

pub use log::{Level, LevelFilter, SetLoggerError};

enum Message {
    Line(String),
    Stop,
}

/// Formats records on the calling thread and writes them from a dedicated
/// one, so request threads never block on the destination.
pub struct TpLogger {
    sender: mpsc::SyncSender<Message>,
    jhand: Option<thread::JoinHandle<()>>,
    level: Level,
}

impl TpLogger {
    pub fn new<T: io::Write + Send + 'static>(buf_size: usize, mut destination: T, level: Level) -> Self {
        let (tx, rx) = mpsc::sync_channel(buf_size);
        let jh = thread::spawn(move || {
            for msg in rx {
                match msg {
                    Message::Line(line) => {
                        if let Err(e) = writeln!(destination, "{}", line) {
                            eprintln!("logger error: {}", e);
                        }
                    },
                    Message::Stop => break,
                }
            }
            if let Err(e) = destination.flush() {
                eprintln!("logger error: {}", e);
            }
        });
        Self {
            sender: tx,
            jhand: Some(jh),
            level,
        }
    }
}

impl log::Log for TpLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} [{}] {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            record.level(),
            record.args(),
        );
        if let Err(e) = self.sender.send(Message::Line(line)) {
            eprintln!("logger error: {}", e);
        }
    }

    fn flush(&self) {}
}

impl Drop for TpLogger {
    fn drop(&mut self) {
        // the writer may already be gone; nothing left to flush then
        let _ = self.sender.send(Message::Stop);
        if let Some(jh) = self.jhand.take() {
            let _ = jh.join();
        }
    }
}

pub fn init_stdout_logger(msg_buffer_size: usize, level: Level) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(TpLogger::new(msg_buffer_size, io::stdout(), level))).map(|()| {
        log::set_max_level(level.to_level_filter());
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync,
        chrono::DateTime,
        log::Log,
    };

    #[derive(Default, Clone)]
    struct TestWriter {
        content: sync::Arc<sync::Mutex<String>>,
    }

    impl io::Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.content.lock().unwrap().push_str(&String::from_utf8_lossy(buf));
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn record(level: Level, msg: &'static str, logger: &TpLogger) {
        logger.log(&Record::builder().args(format_args!("{}", msg)).level(level).build());
    }

    #[test]
    fn writes_timestamped_lines() {
        let writer = TestWriter::default();
        let spy = writer.content.clone();
        let logger = TpLogger::new(10, writer, Level::Info);
        record(Level::Info, "hello", &logger);
        drop(logger);

        let content = spy.lock().unwrap().clone();
        let (stamp, rest) = content.split_once(' ').unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
        assert_eq!(rest, "[INFO] hello\n");
    }

    #[test]
    fn drops_records_above_level() {
        let writer = TestWriter::default();
        let spy = writer.content.clone();
        let logger = TpLogger::new(10, writer, Level::Warn);
        record(Level::Debug, "noise", &logger);
        record(Level::Info, "chatter", &logger);
        record(Level::Error, "boom", &logger);
        drop(logger);

        let content = spy.lock().unwrap().clone();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with("[ERROR] boom\n"));
    }

    #[test]
    fn drop_flushes_pending_lines() {
        let writer = TestWriter::default();
        let spy = writer.content.clone();
        let logger = TpLogger::new(64, writer, Level::Trace);
        for _ in 0..50 {
            record(Level::Trace, "tick", &logger);
        }
        drop(logger);
        assert_eq!(spy.lock().unwrap().lines().count(), 50);
    }
}
