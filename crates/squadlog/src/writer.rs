//! Buffered, rotating file writer.
//!
//! This module provides:
//! - [`Writer`] - in-memory line queue drained to disk by a background thread
//! - [`WriterConfig`] - rotation mode, directory, file template and interval
//! - [`FileOpener`] / [`LogFile`] - the filesystem seam, with [`FsOpener`] as
//!   the real implementation
//!
//! Producers only touch the queue lock. The file handle lives behind a
//! separate sink lock held for a whole flush cycle. Lock order is always
//! sink, then queue.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::error::{LogError, Result};
use crate::naming::{resolve_file_name, DEFAULT_FILE_FORMAT};
use crate::types::Mode;

/// Default pause between flush cycles.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(3);

/// An open, append-only log file.
pub trait LogFile: Write + Send {
    /// Forces written data down to the storage device.
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Opens log files for appending.
pub trait FileOpener: Send + Sync + fmt::Debug {
    /// Opens `path` in create-append mode.
    fn open(&self, path: &Path) -> io::Result<Box<dyn LogFile>>;
}

/// Opens real files, creating missing parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl FileOpener for FsOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn LogFile>> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(file))
    }
}

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Rotation granularity.
    pub mode: Mode,
    /// Directory holding the log files.
    pub dir: PathBuf,
    /// File name template.
    pub file_format: String,
    /// Pause between background flush cycles.
    pub flush_interval: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            dir: PathBuf::from("logs"),
            file_format: DEFAULT_FILE_FORMAT.to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

/// File handle state, guarded by the sink lock.
#[derive(Default)]
struct Sink {
    file: Option<Box<dyn LogFile>>,
    name: Option<String>,
    path: Option<PathBuf>,
}

struct Flusher {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Buffered line writer with time-based file rotation.
pub struct Writer {
    config: WriterConfig,
    clock: Arc<dyn Clock>,
    opener: Arc<dyn FileOpener>,
    writing: AtomicBool,
    booted: AtomicBool,
    ready: AtomicBool,
    queue: Mutex<VecDeque<String>>,
    sink: Mutex<Sink>,
    flusher: Mutex<Option<Flusher>>,
}

impl fmt::Debug for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("config", &self.config)
            .field("writing", &self.is_writing())
            .field("ready", &self.is_ready())
            .field("queued", &self.queue.lock().len())
            .finish_non_exhaustive()
    }
}

impl Writer {
    /// Creates an inert writer. Nothing is opened until [`Writer::boot`].
    #[must_use]
    pub fn new(
        config: WriterConfig,
        writing: bool,
        clock: Arc<dyn Clock>,
        opener: Arc<dyn FileOpener>,
    ) -> Self {
        Self {
            config,
            clock,
            opener,
            writing: AtomicBool::new(writing),
            booted: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            queue: Mutex::new(VecDeque::new()),
            sink: Mutex::new(Sink::default()),
            flusher: Mutex::new(None),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Returns true once booted successfully and until shutdown.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Returns true if file writing is on.
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.writing.load(Ordering::Acquire)
    }

    /// Turns file writing on. Queued lines are kept either way.
    pub fn start_writing(&self) {
        self.writing.store(true, Ordering::Release);
    }

    /// Turns file writing off. Queued lines stay queued.
    pub fn stop_writing(&self) {
        self.writing.store(false, Ordering::Release);
    }

    /// Number of lines waiting to be flushed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Path of the open log file, if any.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.sink.lock().path.clone()
    }

    /// Returns true while a background flusher is attached.
    #[must_use]
    pub fn has_flusher(&self) -> bool {
        self.flusher.lock().is_some()
    }

    /// Opens the first file and starts the background flusher.
    ///
    /// Only the first call does anything. A failed first call still counts:
    /// the error is returned, no flusher is started and the writer stays not
    /// ready, so later writes are refused instead of piling up.
    pub fn boot(self: &Arc<Self>) -> Result<()> {
        if self.booted.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.rotate(&mut self.sink.lock())?;
        self.spawn_flusher()?;
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Queues a rendered line.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WritingDisabled`] when writing is off and
    /// [`LogError::NotReady`] before [`Writer::boot`]. Empty lines are
    /// accepted and dropped.
    pub fn write(&self, line: &str) -> Result<()> {
        if !self.is_writing() {
            return Err(LogError::WritingDisabled);
        }
        if line.is_empty() {
            return if self.is_ready() { Ok(()) } else { Err(LogError::NotReady) };
        }

        // readiness is read under the queue lock, pairs with `shutdown`
        let mut queue = self.queue.lock();
        if !self.is_ready() {
            return Err(LogError::NotReady);
        }
        queue.push_back(line.to_string());
        Ok(())
    }

    /// Runs one flush cycle: rotate if due, drain the queue, write, sync.
    ///
    /// Returns the number of lines persisted. Lines that could not be
    /// persisted go back to the front of the queue.
    pub fn flush(&self) -> Result<usize> {
        if !self.is_writing() {
            return Ok(0);
        }

        let mut sink = self.sink.lock();
        self.rotate(&mut sink)?;

        let batch: Vec<String> = std::mem::take(&mut *self.queue.lock()).into();
        if batch.is_empty() {
            return Ok(0);
        }

        let Some(file) = sink.file.as_mut() else {
            self.restore(batch.into_iter());
            return Err(LogError::NoOpenFile);
        };

        if let Err((index, err)) = write_batch(file.as_mut(), &batch) {
            warn!(error = %err, path = ?sink.path, "failed writing log line");
            self.reopen(&mut sink);
            self.restore(batch.into_iter().skip(index));
            return Err(err.into());
        }

        if let Err(err) = file.sync() {
            warn!(error = %err, path = ?sink.path, "failed syncing log file");
            self.restore(batch.into_iter());
            return Err(err.into());
        }

        Ok(batch.len())
    }

    /// Marks the writer not ready, stops the flusher and runs a final flush.
    ///
    /// Waits for at most the cycle in flight. Writes racing with shutdown
    /// either land in the final flush or get [`LogError::NotReady`].
    pub fn shutdown(&self) -> Result<usize> {
        {
            let _queue = self.queue.lock();
            self.ready.store(false, Ordering::Release);
        }

        let flusher = self.flusher.lock().take();
        if let Some(flusher) = flusher {
            let _ = flusher.stop.send(());
            if flusher.handle.join().is_err() {
                error!("log flusher thread panicked");
            }
        }

        let result = self.flush();
        *self.sink.lock() = Sink::default();
        result
    }

    /// Re-resolves the file name and switches files when it changed.
    fn rotate(&self, sink: &mut Sink) -> Result<()> {
        if !self.is_writing() {
            return Ok(());
        }

        let name = resolve_file_name(&self.config.file_format, self.config.mode, &self.clock.now());
        if sink.file.is_some() && sink.name.as_deref() == Some(name.as_str()) {
            return Ok(());
        }

        let path = self.config.dir.join(&name);
        let file = self.opener.open(&path)?;
        debug!(path = %path.display(), "opened log file");

        sink.file = Some(file);
        sink.name = Some(name);
        sink.path = Some(path);
        Ok(())
    }

    fn reopen(&self, sink: &mut Sink) {
        let Some(path) = sink.path.clone() else {
            return;
        };

        sink.file = None;
        match self.opener.open(&path) {
            Ok(file) => sink.file = Some(file),
            Err(err) => {
                error!(error = %err, path = %path.display(), "failed to re-open log file");
                sink.name = None;
            }
        }
    }

    /// Puts unwritten lines back ahead of anything queued meanwhile.
    fn restore(&self, lines: impl DoubleEndedIterator<Item = String>) {
        let mut queue = self.queue.lock();
        for line in lines.rev() {
            queue.push_front(line);
        }
    }

    fn spawn_flusher(self: &Arc<Self>) -> Result<()> {
        let (stop, signal) = mpsc::channel::<()>();
        let weak: Weak<Self> = Arc::downgrade(self);
        let interval = self.config.flush_interval;

        let handle = thread::Builder::new()
            .name("squadlog-flusher".to_string())
            .spawn(move || {
                debug!(?interval, "log flusher started");
                loop {
                    match signal.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let Some(writer) = weak.upgrade() else {
                                break;
                            };
                            if let Err(e) = writer.flush() {
                                debug!(error = %e, "flush cycle failed");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("log flusher stopped");
            })
            .map_err(|e| LogError::FlusherSpawn(e.to_string()))?;

        *self.flusher.lock() = Some(Flusher { stop, handle });
        Ok(())
    }
}

/// Writes each line newline-terminated. On failure returns the index of the
/// first line that did not make it.
fn write_batch(file: &mut dyn LogFile, batch: &[String]) -> std::result::Result<(), (usize, io::Error)> {
    for (index, line) in batch.iter().enumerate() {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes()).map_err(|e| (index, e))?;
    }
    Ok(())
}
