//! Non-blocking socket contract for the connector and chunk reader.
//!
//! The contract is deliberately narrow: a split connect (start + poll), a
//! bounded read that never blocks indefinitely, a best-effort availability
//! probe and an idempotent shutdown. Everything above it - retry ceilings,
//! backoff, line extraction - is substrate-independent, which is what makes
//! the upper layers testable against a scripted implementation.

use std::io;
use std::net::SocketAddrV4;

use bytes::Bytes;

/// Progress of an in-flight connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPoll {
    /// The connection is established; the socket is usable.
    Connected,
    /// The connect has not resolved yet; poll again later.
    Pending,
}

/// Result of one bounded non-blocking read.
///
/// "No data right now" ([`Empty`](Self::Empty)) and "not ready"
/// ([`WouldBlock`](Self::WouldBlock)) are distinct signals on purpose:
/// both are retryable, but they follow different backoff rules upstream.
#[derive(Debug)]
pub enum ReadSignal {
    /// 1..=max bytes were ready.
    Data(Bytes),
    /// The read succeeded but produced no bytes.
    Empty,
    /// The socket is not ready; the operation would have blocked.
    WouldBlock,
    /// The stream is finished. `trailing` carries any bytes the substrate
    /// delivered together with the close; `error` is `None` for an orderly
    /// close notification.
    Closed {
        trailing: Bytes,
        error: Option<io::Error>,
    },
}

/// Non-blocking socket primitive underneath a [`Session`](crate::Session).
///
/// Implementations must never block: `read` returns whatever is ready
/// (possibly nothing) and reports would-block explicitly, and the connect
/// is split into a start call plus a finish poll.
pub trait PollSocket: Send {
    /// Begin a non-blocking connect to `addr`.
    fn start_connect(&mut self, addr: SocketAddrV4) -> io::Result<()>;

    /// Poll a connect started by [`start_connect`](Self::start_connect).
    ///
    /// # Errors
    ///
    /// A returned error is terminal for the attempt; the socket must be
    /// shut down and discarded.
    fn finish_connect(&mut self) -> io::Result<ConnectPoll>;

    /// Read up to `max` bytes without blocking.
    fn read(&mut self, max: usize) -> ReadSignal;

    /// Best-effort probe: whether at least one byte is ready to read.
    ///
    /// A `false` here is not authoritative and must never gate a read.
    fn data_available(&mut self) -> bool;

    /// Release both stream directions. Safe to call more than once.
    fn shutdown(&mut self);
}
