//! Top-level NMEA line-stream reader.
//!
//! Ties the layers together: the [`Connector`] establishes a
//! [`Session`], the [`ChunkReader`] pulls bytes out of it with bounded
//! retry, and the [`LineBuffer`] turns those bytes into discrete
//! sentences. One reader owns one session; calls are serialized by the
//! `&mut self` receivers, and nothing here spawns tasks - every wait is a
//! backoff sleep inside the current call.

use std::time::Duration;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::chunk::{ChunkReader, ReadOutcome, DEFAULT_READ_SIZE};
use crate::connector::{Connector, DEFAULT_CONNECT_POLL_INTERVAL};
use crate::error::{AiswireError, Result};
use crate::line_buffer::LineBuffer;
use crate::retry::{RetryPolicy, RetryState};
use crate::session::{ConnectionStatus, Session};

/// Tuning knobs for one reader.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// Upper bound per read attempt.
    pub read_size: usize,
    /// Retry ceiling and backoff delays for transient read conditions.
    pub retry: RetryPolicy,
    /// Interval between finish-connect polls.
    pub connect_poll_interval: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            retry: RetryPolicy::default(),
            connect_poll_interval: DEFAULT_CONNECT_POLL_INTERVAL,
        }
    }
}

/// Reads newline-terminated NMEA sentences from a non-blocking TCP stream.
///
/// Single logical reader per session: one in-flight
/// [`read_line`](Self::read_line) at a time (enforced by `&mut self`).
/// Termination is idempotent - a fatal condition surfaces once, as either
/// a final best-effort line or `None`, and every later call returns
/// `Ok(None)`.
pub struct NmeaStreamReader {
    config: ReaderConfig,
    chunks: ChunkReader,
    lines: LineBuffer,
    retry: RetryState,
    session: Option<Session>,
    status: ConnectionStatus,
}

impl NmeaStreamReader {
    /// Create a reader with default configuration.
    pub fn new() -> Self {
        Self::with_config(ReaderConfig::default())
    }

    /// Create a reader with custom configuration.
    pub fn with_config(config: ReaderConfig) -> Self {
        Self {
            config,
            chunks: ChunkReader::with_config(config.read_size, config.retry),
            lines: LineBuffer::new(),
            retry: RetryState::new(),
            session: None,
            status: ConnectionStatus::Disconnected,
        }
    }

    /// Connect to `host:port`.
    ///
    /// The reader is single-use per connection: any previous session is
    /// disposed first, and previously buffered bytes are dropped with it.
    ///
    /// # Errors
    ///
    /// See [`Connector::connect`].
    pub async fn connect(&mut self, host: &str, port: u16, cancel: &CancelToken) -> Result<()> {
        self.dispose();
        self.lines = LineBuffer::new();
        self.retry.reset();
        self.status = ConnectionStatus::Connecting;

        let connector = Connector::with_poll_interval(self.config.connect_poll_interval);
        match connector.connect(host, port, cancel).await {
            Ok(session) => {
                self.attach(session);
                Ok(())
            }
            Err(e) => {
                self.status = ConnectionStatus::Disconnected;
                Err(e)
            }
        }
    }

    /// Adopt an already-established session, e.g. one produced by
    /// [`Connector::establish`] over a custom
    /// [`PollSocket`](crate::transport::PollSocket) substrate.
    ///
    /// Buffered bytes and retry state from any previous session are
    /// discarded.
    pub fn attach(&mut self, session: Session) {
        self.session = Some(session);
        self.lines = LineBuffer::new();
        self.retry.reset();
        self.status = ConnectionStatus::Connected;
    }

    /// Current connection status.
    #[inline]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Whether the session is usable for reads.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Best-effort probe: whether [`read_line`](Self::read_line) is likely
    /// to produce a line without waiting.
    ///
    /// Non-authoritative in both directions; never use it as a
    /// precondition for reading.
    pub fn is_data_available(&mut self) -> bool {
        !self.lines.is_empty()
            || self
                .session
                .as_mut()
                .map(Session::data_available)
                .unwrap_or(false)
    }

    /// Read the next line.
    ///
    /// Returns `Ok(Some(line))` for each complete (or final best-effort)
    /// line, and `Ok(None)` once the stream has ended. Transient
    /// would-block conditions never surface here - they only cost latency.
    ///
    /// # Errors
    ///
    /// [`AiswireError::Canceled`] if `cancel` fires at a suspension point;
    /// buffered bytes are kept for the next call.
    pub async fn read_line(&mut self, cancel: &CancelToken) -> Result<Option<String>> {
        loop {
            // Serve already-buffered lines before any further I/O.
            if let Some(line) = self.lines.take_line() {
                return Ok(Some(line));
            }

            if cancel.is_canceled() {
                return Err(AiswireError::Canceled);
            }

            let Some(session) = self.session.as_mut() else {
                return Ok(None);
            };

            match self
                .chunks
                .read_chunk(session, &mut self.retry, cancel)
                .await
            {
                ReadOutcome::Data(bytes) => self.lines.push(&bytes),
                ReadOutcome::Retry(_) => continue,
                ReadOutcome::Fatal { reason, leftover } => {
                    debug!(%reason, "stream ended");
                    self.status = ConnectionStatus::Disconnected;
                    if !leftover.is_empty() {
                        self.lines.push(&leftover);
                    }
                    return Ok(self.lines.flush_remainder());
                }
            }
        }
    }

    /// Release the session and both its stream directions.
    ///
    /// Safe to call repeatedly; later calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.dispose();
        }
        self.status = ConnectionStatus::Disconnected;
    }
}

impl Default for NmeaStreamReader {
    fn default() -> Self {
        Self::new()
    }
}
