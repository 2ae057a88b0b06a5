//! Established connection state.

use crate::transport::{PollSocket, ReadSignal};

/// Connection lifecycle of one session.
///
/// A single explicit status replaces "is the socket field set" checks:
/// `Disconnected` covers both "not yet connected" and "lost after
/// failure", and either way the remedy is a fresh connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Connect polling is in progress.
    Connecting,
    /// The session is usable for reads.
    Connected,
    /// No valid session; a fresh connect is required.
    Disconnected,
}

/// One established connection: the socket handle plus its status.
///
/// A session is exclusively owned by a single reader; reads are never
/// issued from more than one caller at a time. Disposal releases both
/// stream directions and is safe to call more than once.
pub struct Session {
    socket: Box<dyn PollSocket>,
    status: ConnectionStatus,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wrap an already-established socket.
    pub(crate) fn new(socket: Box<dyn PollSocket>) -> Self {
        Self {
            socket,
            status: ConnectionStatus::Connected,
        }
    }

    /// Current status.
    #[inline]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Whether the session is usable for reads.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// One bounded non-blocking read against the socket.
    pub(crate) fn read(&mut self, max: usize) -> ReadSignal {
        self.socket.read(max)
    }

    /// Drop the session after a fatal condition: both stream directions
    /// are released and the status flips to `Disconnected`.
    pub(crate) fn mark_disconnected(&mut self) {
        self.socket.shutdown();
        self.status = ConnectionStatus::Disconnected;
    }

    /// Best-effort probe: whether at least one byte is ready.
    ///
    /// Never authoritative; a `false` must not gate a read.
    pub fn data_available(&mut self) -> bool {
        self.is_connected() && self.socket.data_available()
    }

    /// Release both stream directions. Second call is a no-op.
    pub fn dispose(&mut self) {
        self.mark_disconnected();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}
