//! Non-blocking TCP socket built on `socket2`.
//!
//! `socket2` exposes the raw connect sequence the [`PollSocket`] contract
//! needs: a non-blocking `connect` that returns "in progress", followed by
//! polling for completion. Once established, the socket is converted into
//! a `std::net::TcpStream` (still non-blocking) for reads.

use std::io::{self, Read};
use std::net::{Shutdown, SocketAddrV4, TcpStream};

use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};

use super::socket::{ConnectPoll, PollSocket, ReadSignal};

enum State {
    /// Socket created, connect not yet started.
    Idle(Socket),
    /// `connect` issued, completion not yet observed.
    Connecting(Socket),
    /// Established stream, non-blocking mode.
    Connected(TcpStream),
    /// Shut down or consumed by a failed transition.
    Closed,
}

/// A non-blocking IPv4 TCP socket.
pub struct TcpPollSocket {
    state: State,
}

impl TcpPollSocket {
    /// Create a fresh non-blocking IPv4 socket.
    pub fn new() -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            state: State::Idle(socket),
        })
    }
}

/// Whether a `connect` error means "still in progress" rather than failure.
fn connect_in_progress(e: &io::Error) -> bool {
    #[cfg(unix)]
    if e.raw_os_error() == Some(libc::EINPROGRESS) {
        return true;
    }
    // Windows reports WSAEWOULDBLOCK for an in-flight non-blocking connect.
    e.kind() == io::ErrorKind::WouldBlock
}

impl PollSocket for TcpPollSocket {
    fn start_connect(&mut self, addr: SocketAddrV4) -> io::Result<()> {
        let socket = match std::mem::replace(&mut self.state, State::Closed) {
            State::Idle(socket) => socket,
            other => {
                self.state = other;
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "connect already started",
                ));
            }
        };

        match socket.connect(&addr.into()) {
            Ok(()) => {}
            Err(ref e) if connect_in_progress(e) => {}
            Err(e) => return Err(e),
        }

        self.state = State::Connecting(socket);
        Ok(())
    }

    fn finish_connect(&mut self) -> io::Result<ConnectPoll> {
        let socket = match std::mem::replace(&mut self.state, State::Closed) {
            State::Connecting(socket) => socket,
            State::Connected(stream) => {
                self.state = State::Connected(stream);
                return Ok(ConnectPoll::Connected);
            }
            other => {
                self.state = other;
                return Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "connect not started",
                ));
            }
        };

        // A failed non-blocking connect parks its error in SO_ERROR.
        if let Some(err) = socket.take_error()? {
            return Err(err);
        }

        match socket.peer_addr() {
            Ok(_) => {
                let stream: TcpStream = socket.into();
                self.state = State::Connected(stream);
                Ok(ConnectPoll::Connected)
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotConnected => {
                self.state = State::Connecting(socket);
                Ok(ConnectPoll::Pending)
            }
            Err(e) => Err(e),
        }
    }

    fn read(&mut self, max: usize) -> ReadSignal {
        let State::Connected(stream) = &mut self.state else {
            return ReadSignal::Closed {
                trailing: Bytes::new(),
                error: None,
            };
        };

        let mut buf = vec![0u8; max];
        match stream.read(&mut buf) {
            Ok(0) => ReadSignal::Empty,
            Ok(n) => {
                buf.truncate(n);
                ReadSignal::Data(Bytes::from(buf))
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                ReadSignal::WouldBlock
            }
            Err(e) => ReadSignal::Closed {
                trailing: Bytes::new(),
                error: Some(e),
            },
        }
    }

    fn data_available(&mut self) -> bool {
        let State::Connected(stream) = &mut self.state else {
            return false;
        };
        let mut probe = [0u8; 1];
        matches!(stream.peek(&mut probe), Ok(n) if n > 0)
    }

    fn shutdown(&mut self) {
        if let State::Connected(stream) = &self.state {
            let _ = stream.shutdown(Shutdown::Both);
        }
        // Replacing the state drops any Idle/Connecting socket handle.
        self.state = State::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    fn local_listener() -> (TcpListener, SocketAddrV4) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = match listener.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        (listener, addr)
    }

    #[test]
    fn test_connect_to_local_listener_completes() {
        let (listener, addr) = local_listener();
        let mut socket = TcpPollSocket::new().unwrap();
        socket.start_connect(addr).unwrap();

        // Loopback connects resolve quickly; bound the polling anyway.
        let mut connected = false;
        for _ in 0..100 {
            match socket.finish_connect().unwrap() {
                ConnectPoll::Connected => {
                    connected = true;
                    break;
                }
                ConnectPoll::Pending => std::thread::sleep(std::time::Duration::from_millis(10)),
            }
        }
        assert!(connected);
        drop(listener);
    }

    #[test]
    fn test_read_reports_would_block_on_idle_peer() {
        let (listener, addr) = local_listener();
        let mut socket = TcpPollSocket::new().unwrap();
        socket.start_connect(addr).unwrap();
        while matches!(socket.finish_connect().unwrap(), ConnectPoll::Pending) {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        let (_peer, _) = listener.accept().unwrap();

        assert!(matches!(socket.read(1024), ReadSignal::WouldBlock));
        assert!(!socket.data_available());
    }

    #[test]
    fn test_read_after_peer_write_returns_data() {
        use std::io::Write;

        let (listener, addr) = local_listener();
        let mut socket = TcpPollSocket::new().unwrap();
        socket.start_connect(addr).unwrap();
        while matches!(socket.finish_connect().unwrap(), ConnectPoll::Pending) {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        let (mut peer, _) = listener.accept().unwrap();
        peer.write_all(b"!AIVDM,1,1,,A,x\n").unwrap();

        // Give loopback delivery a moment.
        let mut got = None;
        for _ in 0..100 {
            match socket.read(1024) {
                ReadSignal::Data(bytes) => {
                    got = Some(bytes);
                    break;
                }
                ReadSignal::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(10))
                }
                other => panic!("unexpected signal: {other:?}"),
            }
        }
        assert_eq!(got.unwrap().as_ref(), b"!AIVDM,1,1,,A,x\n");
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut socket = TcpPollSocket::new().unwrap();
        socket.shutdown();
        socket.shutdown();
        assert!(matches!(
            socket.read(16),
            ReadSignal::Closed { error: None, .. }
        ));
    }
}
