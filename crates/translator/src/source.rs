//! Landmark sources.
//!
//! A source stands in for the pose-estimation collaborator: it yields one
//! [`TimedFrame`] per camera frame. [`JsonlSource`] replays frames recorded
//! as JSON lines, one frame per line, with blank and `#` lines ignored.
//! [`BackgroundSource`] moves a blocking source onto its own thread.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use handsign_common::error::{HandsignError, HandsignResult};
use handsign_sign_model::landmark::{parse_frame_line, TimedFrame};

/// Result of polling a source once.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePoll {
    /// The next frame.
    Frame(TimedFrame),
    /// No frame is ready yet.
    Idle,
    /// The source has no more frames.
    Finished,
}

/// Trait for pose-estimation collaborators.
pub trait LandmarkSource: Send {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Acquire the underlying device or stream. Failure here is the
    /// "camera unavailable" case surfaced to the user.
    fn start(&mut self) -> HandsignResult<()>;

    /// Poll for the next frame.
    fn poll(&mut self) -> HandsignResult<SourcePoll>;

    /// Release the source. Later polls report [`SourcePoll::Finished`].
    fn stop(&mut self);
}

type Opener<R> = Box<dyn FnOnce() -> HandsignResult<R> + Send>;

/// Replays JSONL-encoded frames from any buffered reader.
pub struct JsonlSource<R> {
    name: String,
    opener: Option<Opener<R>>,
    reader: Option<R>,
    line_number: usize,
    finished: bool,
}

impl JsonlSource<BufReader<File>> {
    /// Source reading from a file. The file is opened on [`LandmarkSource::start`].
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        let opener: Opener<BufReader<File>> = Box::new(move || {
            if !path.exists() {
                return Err(HandsignError::FileNotFound { path });
            }
            let file = File::open(&path).map_err(|e| {
                HandsignError::pose_source(format!("Failed to open {}: {e}", path.display()))
            })?;
            Ok(BufReader::new(file))
        });

        Self {
            name,
            opener: Some(opener),
            reader: None,
            line_number: 0,
            finished: false,
        }
    }
}

impl JsonlSource<BufReader<std::io::Stdin>> {
    /// Source reading from standard input.
    pub fn stdin() -> Self {
        Self::from_reader("stdin", BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead + Send> JsonlSource<R> {
    /// Source reading from an already open reader.
    pub fn from_reader(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            opener: None,
            reader: Some(reader),
            line_number: 0,
            finished: false,
        }
    }

    /// Lines consumed so far, including skipped ones.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead + Send> LandmarkSource for JsonlSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> HandsignResult<()> {
        if let Some(open) = self.opener.take() {
            self.reader = Some(open()?);
        }
        if self.reader.is_none() {
            return Err(HandsignError::pose_source(format!(
                "Source '{}' cannot be restarted",
                self.name
            )));
        }
        self.finished = false;
        tracing::debug!(source = %self.name, "JSONL landmark source started");
        Ok(())
    }

    fn poll(&mut self) -> HandsignResult<SourcePoll> {
        if self.finished {
            return Ok(SourcePoll::Finished);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Err(HandsignError::pose_source(format!(
                "Source '{}' polled before start",
                self.name
            )));
        };

        let mut line = String::new();
        loop {
            line.clear();
            let read = match reader.read_line(&mut line) {
                Ok(read) => read,
                Err(e) => {
                    self.finished = true;
                    return Err(HandsignError::pose_source(format!(
                        "{}: read failed after line {}: {e}",
                        self.name, self.line_number
                    )));
                }
            };
            if read == 0 {
                self.finished = true;
                return Ok(SourcePoll::Finished);
            }
            self.line_number += 1;

            match parse_frame_line(&line) {
                None => continue,
                Some(Ok(frame)) => return Ok(SourcePoll::Frame(frame)),
                Some(Err(e)) => {
                    return Err(HandsignError::pose_source(format!(
                        "{}:{}: malformed frame: {e}",
                        self.name, self.line_number
                    )));
                }
            }
        }
    }

    fn stop(&mut self) {
        self.finished = true;
        self.reader = None;
        tracing::debug!(source = %self.name, lines = self.line_number, "JSONL landmark source stopped");
    }
}

/// Frames buffered ahead of the consumer before the reader thread waits.
const BACKGROUND_BACKLOG: usize = 256;

/// Polls a blocking source on a dedicated thread.
///
/// Frames cross a bounded channel; while none is waiting, polls report
/// [`SourcePoll::Idle`]. The thread is detached rather than joined on stop,
/// since a read on a quiet pipe may never return.
pub struct BackgroundSource {
    name: String,
    inner: Option<Box<dyn LandmarkSource>>,
    receiver: Option<Receiver<HandsignResult<SourcePoll>>>,
    stop: Arc<AtomicBool>,
    finished: bool,
}

impl BackgroundSource {
    pub fn new(inner: Box<dyn LandmarkSource>) -> Self {
        Self {
            name: inner.name().to_string(),
            inner: Some(inner),
            receiver: None,
            stop: Arc::new(AtomicBool::new(false)),
            finished: false,
        }
    }
}

impl LandmarkSource for BackgroundSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> HandsignResult<()> {
        let Some(mut inner) = self.inner.take() else {
            return Err(HandsignError::pose_source(format!(
                "Source '{}' cannot be restarted",
                self.name
            )));
        };
        if let Err(e) = inner.start() {
            self.inner = Some(inner);
            return Err(e);
        }

        let (tx, rx) = mpsc::sync_channel(BACKGROUND_BACKLOG);
        let stop = self.stop.clone();
        std::thread::Builder::new()
            .name(format!("source-{}", self.name))
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    match inner.poll() {
                        Ok(SourcePoll::Idle) => std::thread::sleep(Duration::from_millis(1)),
                        Ok(SourcePoll::Finished) => break,
                        polled => {
                            if tx.send(polled).is_err() {
                                break;
                            }
                        }
                    }
                }
                inner.stop();
            })
            .map_err(|e| {
                HandsignError::pose_source(format!(
                    "Failed to spawn reader for '{}': {e}",
                    self.name
                ))
            })?;

        self.receiver = Some(rx);
        tracing::debug!(source = %self.name, "Background landmark source started");
        Ok(())
    }

    fn poll(&mut self) -> HandsignResult<SourcePoll> {
        if self.finished {
            return Ok(SourcePoll::Finished);
        }
        let Some(receiver) = self.receiver.as_ref() else {
            return Err(HandsignError::pose_source(format!(
                "Source '{}' polled before start",
                self.name
            )));
        };

        match receiver.try_recv() {
            Ok(polled) => polled,
            Err(TryRecvError::Empty) => Ok(SourcePoll::Idle),
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Ok(SourcePoll::Finished)
            }
        }
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.receiver = None;
        self.finished = true;
        tracing::debug!(source = %self.name, "Background landmark source stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::time::Instant;

    /// Reader that blocks until bytes arrive, like a quiet pipe.
    struct PipeReader {
        rx: mpsc::Receiver<Vec<u8>>,
        pending: Vec<u8>,
    }

    impl Read for PipeReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pending.is_empty() {
                match self.rx.recv() {
                    Ok(bytes) => self.pending = bytes,
                    Err(_) => return Ok(0),
                }
            }
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    fn pipe() -> (mpsc::Sender<Vec<u8>>, BufReader<PipeReader>) {
        let (tx, rx) = mpsc::channel();
        let reader = PipeReader {
            rx,
            pending: Vec::new(),
        };
        (tx, BufReader::new(reader))
    }

    fn poll_until_ready(src: &mut BackgroundSource) -> SourcePoll {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match src.poll().unwrap() {
                SourcePoll::Idle if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(1))
                }
                other => return other,
            }
        }
    }

    fn source(text: &str) -> JsonlSource<Cursor<Vec<u8>>> {
        JsonlSource::from_reader("test", Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let mut src = source("# header\n\n{\"t\":5,\"hands\":[]}\n# trailing\n");
        src.start().unwrap();
        match src.poll().unwrap() {
            SourcePoll::Frame(frame) => {
                assert_eq!(frame.timestamp_ns, Some(5));
                assert!(!frame.hands.has_hands());
            }
            other => panic!("unexpected poll {other:?}"),
        }
        assert_eq!(src.poll().unwrap(), SourcePoll::Finished);
        assert_eq!(src.line_number(), 4);
    }

    #[test]
    fn test_malformed_line_is_reported_and_skipped() {
        let mut src = source("{\"t\":1,\"hands\":[]}\nnot json\n{\"t\":3,\"hands\":[]}\n");
        src.start().unwrap();
        assert!(matches!(src.poll().unwrap(), SourcePoll::Frame(_)));

        let err = src.poll().unwrap_err();
        assert!(err.to_string().contains("test:2"), "{err}");

        assert!(matches!(src.poll().unwrap(), SourcePoll::Frame(_)));
        assert_eq!(src.poll().unwrap(), SourcePoll::Finished);
    }

    #[test]
    fn test_poll_before_start_fails() {
        let mut src = JsonlSource::from_path("/nonexistent/frames.jsonl");
        assert!(src.poll().is_err());
    }

    #[test]
    fn test_missing_file_fails_to_start() {
        let mut src = JsonlSource::from_path("/nonexistent/frames.jsonl");
        let err = src.start().unwrap_err();
        assert!(matches!(err, HandsignError::FileNotFound { .. }));
    }

    #[test]
    fn test_background_source_is_idle_while_the_pipe_is_quiet() {
        let (tx, reader) = pipe();
        let mut src = BackgroundSource::new(Box::new(JsonlSource::from_reader("pipe", reader)));
        src.start().unwrap();
        assert_eq!(src.name(), "pipe");

        assert_eq!(src.poll().unwrap(), SourcePoll::Idle);

        tx.send(b"{\"t\":7,\"hands\":[]}\n".to_vec()).unwrap();
        match poll_until_ready(&mut src) {
            SourcePoll::Frame(frame) => assert_eq!(frame.timestamp_ns, Some(7)),
            other => panic!("unexpected poll {other:?}"),
        }

        // Stopping does not wait for the blocked read.
        src.stop();
        assert_eq!(src.poll().unwrap(), SourcePoll::Finished);
        drop(tx);
    }

    #[test]
    fn test_background_source_forwards_frames_errors_and_end() {
        let inner = source("{\"t\":1,\"hands\":[]}\nnot json\n{\"t\":3,\"hands\":[]}\n");
        let mut src = BackgroundSource::new(Box::new(inner));
        src.start().unwrap();

        assert!(matches!(poll_until_ready(&mut src), SourcePoll::Frame(_)));
        let err = loop {
            match src.poll() {
                Ok(SourcePoll::Idle) => std::thread::sleep(Duration::from_millis(1)),
                Ok(other) => panic!("unexpected poll {other:?}"),
                Err(e) => break e,
            }
        };
        assert!(err.to_string().contains("test:2"), "{err}");
        assert!(matches!(poll_until_ready(&mut src), SourcePoll::Frame(_)));
        assert_eq!(poll_until_ready(&mut src), SourcePoll::Finished);
        assert!(src.start().is_err());
    }

    #[test]
    fn test_background_source_surfaces_start_failure() {
        let mut src =
            BackgroundSource::new(Box::new(JsonlSource::from_path("/nonexistent/frames.jsonl")));
        let err = src.start().unwrap_err();
        assert!(matches!(err, HandsignError::FileNotFound { .. }));
        assert!(src.poll().is_err());
    }

    #[test]
    fn test_stopped_source_is_finished() {
        let mut src = source("{\"hands\":[]}\n");
        src.start().unwrap();
        src.stop();
        assert_eq!(src.poll().unwrap(), SourcePoll::Finished);
        assert!(src.start().is_err());
    }
}
