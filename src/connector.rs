//! Connection establishment over a non-blocking socket primitive.
//!
//! A non-blocking connect does not finish in one call: the socket reports
//! "in progress" until the handshake resolves. The connector owns that
//! poll loop - start the connect, then poll completion on a fixed interval
//! until the socket is usable, the attempt fails, or cancellation fires.
//! Connect polling has no retry ceiling of its own; the caller's
//! cancellation token is the only way to bound it.

use std::net::{SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{AiswireError, Result};
use crate::session::Session;
use crate::transport::{ConnectPoll, PollSocket, TcpPollSocket};

/// Default interval between finish-connect polls.
pub const DEFAULT_CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Establishes one session against a remote endpoint.
///
/// Single-use per session: construct a fresh connector (or at least a
/// fresh socket) for every connection attempt.
pub struct Connector {
    poll_interval: Duration,
}

impl Connector {
    /// Create a connector with the default poll interval.
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_CONNECT_POLL_INTERVAL,
        }
    }

    /// Create a connector with a custom poll interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Connect to `host:port`, polling until the connect resolves.
    ///
    /// `host` may be an IPv4 literal or a name; whatever it is, it must
    /// resolve to an IPv4 endpoint.
    ///
    /// # Errors
    ///
    /// - [`AiswireError::UnsupportedAddressFamily`] if nothing IPv4 comes
    ///   out of resolution.
    /// - [`AiswireError::ConnectCanceled`] if `cancel` fires mid-poll.
    /// - [`AiswireError::ConnectionFailed`] for any primitive failure.
    pub async fn connect(&self, host: &str, port: u16, cancel: &CancelToken) -> Result<Session> {
        let addr = resolve_ipv4(host, port)?;
        let socket = TcpPollSocket::new().map_err(AiswireError::ConnectionFailed)?;
        self.establish(Box::new(socket), addr, cancel).await
    }

    /// Drive the start/finish-connect poll loop over an arbitrary socket.
    ///
    /// This is the substrate-independent entry: anything implementing
    /// [`PollSocket`] can be connected through it.
    pub async fn establish(
        &self,
        mut socket: Box<dyn PollSocket>,
        addr: SocketAddrV4,
        cancel: &CancelToken,
    ) -> Result<Session> {
        debug!(%addr, "starting connect");
        if let Err(e) = socket.start_connect(addr) {
            socket.shutdown();
            return Err(AiswireError::ConnectionFailed(e));
        }

        loop {
            if cancel.is_canceled() {
                socket.shutdown();
                return Err(AiswireError::ConnectCanceled);
            }

            match socket.finish_connect() {
                Ok(ConnectPoll::Connected) => {
                    debug!(%addr, "connection established");
                    return Ok(Session::new(socket));
                }
                Ok(ConnectPoll::Pending) => {
                    if cancel.sleep(self.poll_interval).await {
                        socket.shutdown();
                        return Err(AiswireError::ConnectCanceled);
                    }
                }
                Err(e) => {
                    warn!(%addr, error = %e, "connect failed");
                    socket.shutdown();
                    return Err(AiswireError::ConnectionFailed(e));
                }
            }
        }
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `host:port` to the first IPv4 endpoint it yields.
fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddrV4> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(AiswireError::ConnectionFailed)?;
    for addr in addrs {
        if let SocketAddr::V4(v4) = addr {
            return Ok(v4);
        }
    }
    Err(AiswireError::UnsupportedAddressFamily)
}
