use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use domain::alert::entity::AlertRecord;
use domain::alert::error::AlertError;
use ports::secondary::metrics_port::MetricsPort;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::json_decoder::JsonAlertDecoder;

/// Result of one read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Record(AlertRecord),
    /// No complete line is available yet.
    Empty,
    /// A complete line that failed to decode.
    Malformed { line: String, reason: String },
}

/// Device and inode of an open file, used to notice that the path now names
/// a different file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(_meta: &Metadata) -> Option<Self> {
        None
    }
}

/// Follows a newline-delimited JSON alert log as the detection engine
/// appends to it.
///
/// Reading starts at the end of the file, so alerts already present at
/// startup are never replayed. A file that does not exist yet is read from
/// its first byte once it appears. When the file shrinks below the read
/// offset (truncation or copy-truncate rotation) reading restarts at 0.
///
/// On Unix, rename rotation is detected by the path resolving to a new
/// inode: the old handle is read to EOF, then the new file is followed
/// from its first byte.
pub struct AlertFileTailer {
    path: PathBuf,
    decoder: JsonAlertDecoder,
    reader: Option<BufReader<File>>,
    identity: Option<FileIdentity>,
    offset: u64,
    /// Bytes of a line whose newline has not been written yet.
    pending: Vec<u8>,
    metrics: Option<Arc<dyn MetricsPort>>,
}

impl AlertFileTailer {
    pub fn open(path: impl AsRef<Path>, decoder: JsonAlertDecoder) -> Result<Self, AlertError> {
        let path = path.as_ref().to_path_buf();
        let (reader, identity, offset) = match File::open(&path) {
            Ok(mut file) => {
                let end = file
                    .seek(SeekFrom::End(0))
                    .map_err(|e| AlertError::Io(format!("{}: {e}", path.display())))?;
                let identity = file.metadata().ok().as_ref().and_then(FileIdentity::of);
                info!(path = %path.display(), offset = end, "tailing alert log");
                (Some(BufReader::new(file)), identity, end)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "alert log does not exist yet, waiting for it");
                (None, None, 0)
            }
            Err(e) => return Err(AlertError::Io(format!("{}: {e}", path.display()))),
        };

        Ok(Self {
            path,
            decoder,
            reader,
            identity,
            offset,
            pending: Vec::new(),
            metrics: None,
        })
    }

    /// Count malformed lines in `malformed_alerts`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsPort>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next complete line, if any.
    ///
    /// Blank lines are skipped. EOF is reported as [`ReadOutcome::Empty`];
    /// only I/O failures on an open file are errors.
    pub fn next_record(&mut self) -> Result<ReadOutcome, AlertError> {
        if !self.ensure_open()? {
            return Ok(ReadOutcome::Empty);
        }
        self.check_truncation()?;

        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(ReadOutcome::Empty);
            };

            let mut chunk = Vec::new();
            let n = reader
                .read_until(b'\n', &mut chunk)
                .map_err(|e| AlertError::Io(format!("{}: {e}", self.path.display())))?;
            if n == 0 {
                if self.reopen_if_replaced()? {
                    continue;
                }
                return Ok(ReadOutcome::Empty);
            }
            self.offset += n as u64;
            self.pending.extend_from_slice(&chunk);

            if !chunk.ends_with(b"\n") {
                return Ok(ReadOutcome::Empty);
            }

            let bytes = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&bytes);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return Ok(match self.decoder.decode(line) {
                Ok(record) => ReadOutcome::Record(record),
                Err(e) => {
                    if let Some(ref metrics) = self.metrics {
                        metrics.record_malformed_alert();
                    }
                    ReadOutcome::Malformed {
                        line: line.to_string(),
                        reason: e.to_string(),
                    }
                }
            });
        }
    }

    /// Open whatever file the path names now, positioned at its first byte.
    /// Returns `false` if the path does not exist.
    fn open_at_start(&mut self) -> Result<bool, AlertError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(AlertError::Io(format!("{}: {e}", self.path.display()))),
        };
        self.identity = file.metadata().ok().as_ref().and_then(FileIdentity::of);
        self.reader = Some(BufReader::new(file));
        self.offset = 0;
        self.pending.clear();
        Ok(true)
    }

    /// Metadata of the file the path names now, `None` if it is gone.
    fn current_metadata(&self) -> Result<Option<Metadata>, AlertError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AlertError::Io(format!("{}: {e}", self.path.display()))),
        }
    }

    fn is_replaced(&self, meta: &Metadata) -> bool {
        match (self.identity, FileIdentity::of(meta)) {
            (Some(open), Some(current)) => open != current,
            _ => false,
        }
    }

    /// Open the file if it was missing. Returns whether a reader exists.
    fn ensure_open(&mut self) -> Result<bool, AlertError> {
        if self.reader.is_some() {
            return Ok(true);
        }
        let opened = self.open_at_start()?;
        if opened {
            info!(path = %self.path.display(), "alert log appeared, reading from start");
        }
        Ok(opened)
    }

    fn check_truncation(&mut self) -> Result<(), AlertError> {
        // Moved away and not recreated yet: keep draining the old handle.
        let Some(meta) = self.current_metadata()? else {
            return Ok(());
        };
        // A different file at the path is picked up once the old one hits EOF.
        if self.is_replaced(&meta) || meta.len() >= self.offset {
            return Ok(());
        }

        info!(
            path = %self.path.display(),
            previous_offset = self.offset,
            len = meta.len(),
            "alert log truncated, restarting from beginning"
        );
        self.open_at_start()?;
        Ok(())
    }

    /// At EOF, switch to the file now at the path if it is not the one
    /// being read.
    fn reopen_if_replaced(&mut self) -> Result<bool, AlertError> {
        let Some(meta) = self.current_metadata()? else {
            return Ok(false);
        };
        if !self.is_replaced(&meta) {
            return Ok(false);
        }
        info!(
            path = %self.path.display(),
            previous_offset = self.offset,
            "alert log rotated, following new file"
        );
        self.open_at_start()
    }

    /// Forward decoded alerts into `tx` until cancelled or the receiver
    /// is dropped.
    pub async fn run(
        mut self,
        tx: mpsc::Sender<AlertRecord>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut forwarded: u64 = 0;
        let mut malformed: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.next_record() {
                Ok(ReadOutcome::Record(record)) => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        sent = tx.send(record) => {
                            if sent.is_err() {
                                info!("alert channel closed, stopping tailer");
                                break;
                            }
                            forwarded += 1;
                        }
                    }
                }
                Ok(ReadOutcome::Malformed { line, reason }) => {
                    malformed += 1;
                    warn!(line = %line, reason = %reason, "skipping malformed alert");
                }
                Ok(ReadOutcome::Empty) => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(poll_interval) => {}
                    }
                }
                Err(e) => {
                    warn!(error = %e, "alert log read failed, retrying");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        debug!(offset = self.offset, "alert tailer position at shutdown");
        info!(forwarded, malformed, "alert tailer stopped");
    }
}
