//! Log output streams.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Where the application logger writes its lines.
#[derive(Debug, Clone, Default)]
pub enum LogStream {
    #[default]
    Stdout,
    Stderr,
    /// Opened in append mode when the logger is built.
    File(PathBuf),
    /// In-memory sink, shared with whoever holds a clone.
    Buffer(SharedBuffer),
}

impl LogStream {
    /// Parse a `[logger] stream` setting.
    ///
    /// `stdout` and `stderr` (any case) select the standard streams. Anything
    /// else is a file path, resolved against `root` when relative.
    pub fn from_setting(value: &str, root: &Path) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "stdout" => LogStream::Stdout,
            "stderr" => LogStream::Stderr,
            _ => {
                let path = Path::new(value);
                if path.is_absolute() {
                    LogStream::File(path.to_path_buf())
                } else {
                    LogStream::File(root.join(path))
                }
            }
        }
    }

    /// Open a writer for this stream.
    pub fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        match self {
            LogStream::Stdout => Ok(Box::new(io::stdout())),
            LogStream::Stderr => Ok(Box::new(io::stderr())),
            LogStream::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Box::new(file))
            }
            LogStream::Buffer(buffer) => Ok(Box::new(buffer.clone())),
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStream::Stdout => write!(f, "stdout"),
            LogStream::Stderr => write!(f, "stderr"),
            LogStream::File(path) => write!(f, "{}", path.display()),
            LogStream::Buffer(_) => write!(f, "buffer"),
        }
    }
}

/// A cloneable in-memory writer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        match self.inner.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }

    /// Non-empty lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Two handles are equal when they share storage.
    pub fn same_as(&self, other: &SharedBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
