//! Scripted socket for exercising the connector and reader without a
//! network. Each test queues the exact sequence of connect polls and read
//! signals the substrate should produce; running past the script is a test
//! bug and panics.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddrV4;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::socket::{ConnectPoll, PollSocket, ReadSignal};

#[derive(Default)]
struct Inner {
    connect_polls: VecDeque<io::Result<ConnectPoll>>,
    reads: VecDeque<ReadSignal>,
    start_connect_error: Option<io::Error>,
    reads_made: usize,
    finish_polls_made: usize,
    shutdowns: usize,
}

/// A [`PollSocket`] that replays a scripted signal sequence.
///
/// Clones share the script and the observation counters, so a test can
/// keep one clone for assertions after handing the other to a session.
#[derive(Clone)]
pub(crate) struct MockSocket {
    inner: Arc<Mutex<Inner>>,
}

impl MockSocket {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Queue `n` pending polls followed by a successful connect.
    pub(crate) fn connect_after(self, n: usize) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            for _ in 0..n {
                inner.connect_polls.push_back(Ok(ConnectPoll::Pending));
            }
            inner.connect_polls.push_back(Ok(ConnectPoll::Connected));
        }
        self
    }

    /// Make `start_connect` itself fail.
    pub(crate) fn fail_start(self, error: io::Error) -> Self {
        self.inner.lock().unwrap().start_connect_error = Some(error);
        self
    }

    /// Queue a terminal connect-poll error.
    pub(crate) fn fail_connect(self, error: io::Error) -> Self {
        self.inner
            .lock()
            .unwrap()
            .connect_polls
            .push_back(Err(error));
        self
    }

    /// Queue pending connect polls forever (the script never resolves).
    pub(crate) fn connect_never(self) -> Self {
        let mut inner = self.inner.lock().unwrap();
        for _ in 0..1024 {
            inner.connect_polls.push_back(Ok(ConnectPoll::Pending));
        }
        drop(inner);
        self
    }

    pub(crate) fn push_read(self, signal: ReadSignal) -> Self {
        self.inner.lock().unwrap().reads.push_back(signal);
        self
    }

    pub(crate) fn push_data(self, data: &[u8]) -> Self {
        self.push_read(ReadSignal::Data(Bytes::copy_from_slice(data)))
    }

    pub(crate) fn push_would_block(self, n: usize) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            for _ in 0..n {
                inner.reads.push_back(ReadSignal::WouldBlock);
            }
        }
        self
    }

    pub(crate) fn push_empty(self, n: usize) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            for _ in 0..n {
                inner.reads.push_back(ReadSignal::Empty);
            }
        }
        self
    }

    pub(crate) fn push_closed(self, trailing: &[u8], error: Option<io::Error>) -> Self {
        self.push_read(ReadSignal::Closed {
            trailing: Bytes::copy_from_slice(trailing),
            error,
        })
    }

    pub(crate) fn reads_made(&self) -> usize {
        self.inner.lock().unwrap().reads_made
    }

    pub(crate) fn finish_polls_made(&self) -> usize {
        self.inner.lock().unwrap().finish_polls_made
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.inner.lock().unwrap().shutdowns
    }
}

impl PollSocket for MockSocket {
    fn start_connect(&mut self, _addr: SocketAddrV4) -> io::Result<()> {
        match self.inner.lock().unwrap().start_connect_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn finish_connect(&mut self) -> io::Result<ConnectPoll> {
        let mut inner = self.inner.lock().unwrap();
        inner.finish_polls_made += 1;
        inner
            .connect_polls
            .pop_front()
            .expect("mock socket: no scripted connect poll left")
    }

    fn read(&mut self, _max: usize) -> ReadSignal {
        let mut inner = self.inner.lock().unwrap();
        inner.reads_made += 1;
        inner
            .reads
            .pop_front()
            .expect("mock socket: no scripted read left")
    }

    fn data_available(&mut self) -> bool {
        let inner = self.inner.lock().unwrap();
        matches!(inner.reads.front(), Some(ReadSignal::Data(_)))
    }

    fn shutdown(&mut self) {
        self.inner.lock().unwrap().shutdowns += 1;
    }
}
