//! Line-oriented transports: TCP socket, serial line or replay file
//!
//! The source is picked from a single argument:
//! - `ip:host:port` opens a TCP connection
//! - a character device opens a serial line
//! - anything else is replayed read-only from disk

use crate::config::Config;
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;

#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;

/// Source of newline-terminated records
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator; `None` once the source is exhausted
    ///
    /// Must be safe to cancel: bytes of a partially read line are kept and
    /// returned by the next call.
    async fn next_line(&mut self) -> std::io::Result<Option<String>>;

    /// Write an outbound control frame
    async fn send_control(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    fn is_read_only(&self) -> bool;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Tcp { host: String, port: u16 },
    Serial { path: PathBuf },
    Replay { path: PathBuf },
}

impl SourceKind {
    /// Classify a source argument, looking at the filesystem for paths
    pub fn classify(arg: &str) -> Result<Self, TransportError> {
        if let Some(address) = arg.strip_prefix("ip:") {
            let (host, port) = address
                .rsplit_once(':')
                .ok_or_else(|| TransportError::InvalidAddress(arg.to_string()))?;
            let port = port
                .parse()
                .map_err(|_| TransportError::InvalidAddress(arg.to_string()))?;
            if host.is_empty() {
                return Err(TransportError::InvalidAddress(arg.to_string()));
            }
            return Ok(SourceKind::Tcp {
                host: host.to_string(),
                port,
            });
        }

        let path = PathBuf::from(arg);
        let metadata = std::fs::metadata(&path).map_err(|reason| TransportError::Open {
            source: arg.to_string(),
            reason,
        })?;

        if is_char_device(&metadata) {
            Ok(SourceKind::Serial { path })
        } else {
            Ok(SourceKind::Replay { path })
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, SourceKind::Replay { .. })
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Tcp { host, port } => write!(f, "tcp {}:{}", host, port),
            SourceKind::Serial { path } => write!(f, "serial {}", path.display()),
            SourceKind::Replay { path } => write!(f, "replay {}", path.display()),
        }
    }
}

#[cfg(unix)]
fn is_char_device(metadata: &std::fs::Metadata) -> bool {
    metadata.file_type().is_char_device()
}

#[cfg(not(unix))]
fn is_char_device(_metadata: &std::fs::Metadata) -> bool {
    false
}

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// An opened source with a persistent partial-line buffer
pub struct Transport {
    kind: SourceKind,
    reader: BufReader<BoxedReader>,
    /// `None` for replay files
    writer: Option<BoxedWriter>,
    pending: Vec<u8>,
}

impl Transport {
    /// Classify and open a source argument
    pub async fn open(arg: &str, config: &Config) -> Result<Self, TransportError> {
        let kind = SourceKind::classify(arg)?;
        let open_error = |reason: std::io::Error| TransportError::Open {
            source: arg.to_string(),
            reason,
        };

        let (reader, writer): (BoxedReader, Option<BoxedWriter>) = match &kind {
            SourceKind::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(open_error)?;
                let (read_half, write_half) = stream.into_split();
                (Box::new(read_half), Some(Box::new(write_half)))
            }
            SourceKind::Serial { path } => {
                let port = tokio_serial::new(path.to_string_lossy(), config.serial_baud)
                    .timeout(config.serial_timeout())
                    .open_native_async()
                    .map_err(|e| open_error(e.into()))?;
                let (read_half, write_half) = tokio::io::split(port);
                (Box::new(read_half), Some(Box::new(write_half)))
            }
            SourceKind::Replay { path } => {
                let file = tokio::fs::File::open(path).await.map_err(open_error)?;
                (Box::new(file), None)
            }
        };

        log::info!("🔌 Opened {}", kind);
        Ok(Self::from_parts(kind, reader, writer))
    }

    pub fn from_parts(kind: SourceKind, reader: BoxedReader, writer: Option<BoxedWriter>) -> Self {
        Self {
            kind,
            reader: BufReader::new(reader),
            writer,
            pending: Vec::new(),
        }
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Replay a file from disk
    pub async fn replay(path: &Path) -> Result<Self, TransportError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|reason| TransportError::Open {
                source: path.display().to_string(),
                reason,
            })?;
        Ok(Self::from_parts(
            SourceKind::Replay {
                path: path.to_path_buf(),
            },
            Box::new(file),
            None,
        ))
    }
}

#[async_trait]
impl LineSource for Transport {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            let read = self.reader.read_until(b'\n', &mut self.pending).await?;
            if read == 0 && self.pending.is_empty() {
                return Ok(None);
            }

            let line = String::from_utf8_lossy(&self.pending)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            self.pending.clear();

            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(line));
        }
    }

    async fn send_control(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::ReadOnly)?;
        writer.write_all(frame).await?;
        writer.flush().await?;
        log::info!("Sent control frame {:02X?} to {}", frame, self.kind);
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.writer.is_none()
    }

    fn describe(&self) -> String {
        self.kind.to_string()
    }
}

/// Line source backed by an in-memory queue
///
/// Yields its lines in order, then reports exhaustion. Control frames are
/// recorded instead of written anywhere.
#[derive(Debug, Default)]
pub struct MemorySource {
    lines: VecDeque<String>,
    read_only: bool,
    sent: Vec<Vec<u8>>,
}

impl MemorySource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            read_only: false,
            sent: Vec::new(),
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn sent_frames(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for MemorySource {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    async fn send_control(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.read_only {
            return Err(TransportError::ReadOnly);
        }
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_classify_tcp() {
        assert_eq!(
            SourceKind::classify("ip:192.168.4.1:3333").unwrap(),
            SourceKind::Tcp {
                host: "192.168.4.1".to_string(),
                port: 3333
            }
        );
        assert!(matches!(
            SourceKind::classify("ip:host-without-port"),
            Err(TransportError::InvalidAddress(_))
        ));
        assert!(matches!(
            SourceKind::classify("ip:host:notaport"),
            Err(TransportError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_classify_files() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let kind = SourceKind::classify(temp.path().to_str().unwrap()).unwrap();
        assert!(matches!(kind, SourceKind::Replay { .. }));
        assert!(kind.is_read_only());

        assert!(matches!(
            SourceKind::classify("/definitely/not/here.jsonl"),
            Err(TransportError::Open { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_char_device() {
        let kind = SourceKind::classify("/dev/null").unwrap();
        assert!(matches!(kind, SourceKind::Serial { .. }));
    }

    #[tokio::test]
    async fn test_replay_reads_lines_then_exhausts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("capture.jsonl");

        let mut file = tokio::fs::File::create(&file_path).await.unwrap();
        file.write_all(b"first\r\n\nsecond\nthird").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        let mut transport = Transport::replay(&file_path).await.unwrap();
        assert!(transport.is_read_only());

        assert_eq!(transport.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(transport.next_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(transport.next_line().await.unwrap().as_deref(), Some("third"));
        assert_eq!(transport.next_line().await.unwrap(), None);

        assert!(matches!(
            transport.send_control(&[0x03]).await,
            Err(TransportError::ReadOnly)
        ));
    }

    #[tokio::test]
    async fn test_partial_line_survives_across_reads() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut transport = Transport::from_parts(
            SourceKind::Tcp {
                host: "test".to_string(),
                port: 0,
            },
            Box::new(server),
            None,
        );

        client.write_all(b"{\"packet\":").await.unwrap();

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            transport.next_line(),
        )
        .await;
        assert!(pending.is_err());

        client.write_all(b"{}}\n").await.unwrap();
        let line = transport.next_line().await.unwrap();
        assert_eq!(line.as_deref(), Some("{\"packet\":{}}"));
    }

    #[tokio::test]
    async fn test_memory_source_records_frames() {
        let mut source = MemorySource::new(["a", "b"]);
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("a"));
        source.send_control(&[1, 2, 3]).await.unwrap();
        assert_eq!(source.sent_frames(), [vec![1, 2, 3]]);
        assert_eq!(source.remaining(), 1);

        let mut read_only = MemorySource::new(Vec::<String>::new()).read_only();
        assert!(read_only.send_control(&[1]).await.is_err());
        assert_eq!(read_only.next_line().await.unwrap(), None);
    }
}
