use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

/// Optional log file shared by every writer the subscriber hands out.
#[derive(Clone, Default)]
struct LogSink {
    file: Arc<Mutex<Option<File>>>,
}

impl LogSink {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writes each formatted event to stderr and, when configured, the log file.
struct TeeWriter {
    sink: LogSink,
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter { sink: self.clone() }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = io::stderr().write(buf)?;
        if let Some(file) = self.sink.lock().as_mut() {
            // best effort
            let _ = file.write_all(&buf[..written]);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.sink.lock().as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

static SINK: OnceLock<LogSink> = OnceLock::new();

/// Installs the global subscriber. `log` records are forwarded to it.
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let sink = SINK.get_or_init(LogSink::default).clone();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(sink)
        .try_init();
}

/// Starts (or stops, with `None`) teeing log output into `log_file`.
pub fn set_log_file(log_file: Option<&Path>) -> io::Result<()> {
    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Some(OpenOptions::new().create(true).append(true).open(path)?)
        }
        None => None,
    };

    let sink = SINK.get_or_init(LogSink::default);
    *sink.lock() = file;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tee_writer_copies_into_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app.log");

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();
        let sink = LogSink::default();
        *sink.lock() = Some(file);

        let mut writer = sink.make_writer();
        writer.write_all(b"hello log\n").unwrap();
        writer.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hello log\n");
    }

    #[test]
    fn set_log_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("usergroups.log");

        set_log_file(Some(&path)).unwrap();
        assert!(path.exists());
        set_log_file(None).unwrap();
    }
}
