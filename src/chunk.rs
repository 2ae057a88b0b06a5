//! Chunked reads with bounded retry and backoff.
//!
//! One call to [`ChunkReader::read_chunk`] is one logical "read more
//! bytes" operation. A non-blocking read surfaces three expected, frequent
//! conditions that are not errors in any useful sense - data, "no data
//! right now", and would-block - so the outcome is an explicit tri-state
//! [`ReadOutcome`] returned by value instead of error-signaling machinery:
//!
//! - [`ReadOutcome::Data`] - fresh bytes, retry counter reset
//! - [`ReadOutcome::Retry`] - nothing yet; one bounded backoff sleep has
//!   already been performed, call again
//! - [`ReadOutcome::Fatal`] - the session is gone; stop
//!
//! Both transient conditions carry a hard ceiling
//! ([`RetryPolicy::max_retries`]) so a peer that has gone silent
//! permanently cannot turn the retry loop into an unbounded spin.

use std::fmt;
use std::io;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::retry::{RetryPolicy, RetryState};
use crate::session::Session;
use crate::transport::ReadSignal;

/// Default bounded read size per attempt.
pub const DEFAULT_READ_SIZE: usize = 4096;

/// Why a read attempt produced nothing yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The read succeeded with zero bytes.
    Empty,
    /// The socket reported would-block.
    WouldBlock,
}

/// Why the session stopped being usable.
#[derive(Debug)]
pub enum FatalReason {
    /// The session was already disconnected when the read was requested.
    ConnectionLost,
    /// Zero-byte reads persisted past the retry limit.
    NoDataAfterRetries,
    /// Would-block persisted past the retry limit.
    RetriesExhausted,
    /// The peer closed the stream or the stream itself failed.
    StreamTerminated(Option<io::Error>),
}

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalReason::ConnectionLost => write!(f, "connection lost"),
            FatalReason::NoDataAfterRetries => write!(f, "no data after max retries"),
            FatalReason::RetriesExhausted => {
                write!(f, "max retries exceeded waiting for data")
            }
            FatalReason::StreamTerminated(None) => write!(f, "stream terminated"),
            FatalReason::StreamTerminated(Some(e)) => write!(f, "stream terminated: {e}"),
        }
    }
}

/// Outcome of one logical "read more bytes" operation.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Fresh bytes, never empty; the retry counter has been reset.
    Data(Bytes),
    /// Nothing yet, not fatal. One backoff sleep already happened inside
    /// the call; the caller should simply try again.
    Retry(RetryReason),
    /// The session is no longer usable. `leftover` carries bytes that
    /// arrived together with the terminal condition and must still be
    /// delivered before giving up.
    Fatal {
        reason: FatalReason,
        leftover: Bytes,
    },
}

/// Performs single bounded reads against an established session.
pub struct ChunkReader {
    read_size: usize,
    policy: RetryPolicy,
}

impl ChunkReader {
    /// Create a reader with the default read size and retry policy.
    pub fn new() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            policy: RetryPolicy::default(),
        }
    }

    /// Create a reader with a custom read size and retry policy.
    pub fn with_config(read_size: usize, policy: RetryPolicy) -> Self {
        Self { read_size, policy }
    }

    /// One read attempt against `session`.
    ///
    /// Transient signals increment `retry` and sleep once before asking
    /// the caller to come back; terminal signals disconnect the session.
    /// Cancellation only shortens the sleep - the decision to abort is the
    /// caller's, taken between attempts.
    pub async fn read_chunk(
        &self,
        session: &mut Session,
        retry: &mut RetryState,
        cancel: &CancelToken,
    ) -> ReadOutcome {
        if !session.is_connected() {
            return ReadOutcome::Fatal {
                reason: FatalReason::ConnectionLost,
                leftover: Bytes::new(),
            };
        }

        match session.read(self.read_size) {
            ReadSignal::Data(bytes) => {
                retry.reset();
                ReadOutcome::Data(bytes)
            }
            ReadSignal::Empty => {
                if retry.record_attempt(&self.policy) {
                    warn!(
                        attempts = retry.attempts(),
                        "no data received after max retries"
                    );
                    session.mark_disconnected();
                    return ReadOutcome::Fatal {
                        reason: FatalReason::NoDataAfterRetries,
                        leftover: Bytes::new(),
                    };
                }
                cancel.sleep(self.policy.initial_delay).await;
                ReadOutcome::Retry(RetryReason::Empty)
            }
            ReadSignal::WouldBlock => {
                if retry.record_attempt(&self.policy) {
                    warn!(
                        attempts = retry.attempts(),
                        "max retries exceeded while waiting for data"
                    );
                    session.mark_disconnected();
                    return ReadOutcome::Fatal {
                        reason: FatalReason::RetriesExhausted,
                        leftover: Bytes::new(),
                    };
                }
                let delay = self.policy.delay_for(retry.attempts());
                debug!(attempt = retry.attempts(), ?delay, "waiting for more data");
                cancel.sleep(delay).await;
                ReadOutcome::Retry(RetryReason::WouldBlock)
            }
            ReadSignal::Closed { trailing, error } => {
                match &error {
                    Some(e) => warn!(error = %e, "stream error"),
                    None => debug!("stream closed by peer"),
                }
                session.mark_disconnected();
                ReadOutcome::Fatal {
                    reason: FatalReason::StreamTerminated(error),
                    leftover: trailing,
                }
            }
        }
    }
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}
