//! # aiswire
//!
//! Transport layer for AIS receivers: turns a byte-oriented, non-blocking
//! TCP stream into discrete, newline-terminated NMEA sentences.
//!
//! Non-blocking sockets fail in characteristic ways - spurious would-block
//! signals, partial reads, stream errors, silent peers - and this crate's
//! job is to absorb all of them below the line-oriented surface. Decoding
//! sentence content is left to the layers above.
//!
//! ## Architecture
//!
//! Three layers, bottom-up:
//!
//! - **Connector** ([`Connector`]): establishes a [`Session`] by polling a
//!   split non-blocking connect until it resolves.
//! - **ChunkReader** ([`ChunkReader`]): one bounded read per call,
//!   classifying the result as `Data | Retry | Fatal` with bounded
//!   exponential backoff for the transient cases.
//! - **LineBuffer** ([`LineBuffer`]): accumulates chunks and serves exactly
//!   one complete line per call, keeping unconsumed bytes for the next.
//!
//! [`NmeaStreamReader`] composes the three behind the surface the decoding
//! layers consume: `connect`, `read_line`, `is_connected`,
//! `is_data_available`, `dispose`. All waiting happens at backoff sleeps
//! inside the current call; no background tasks are spawned, and
//! cancellation ([`CancelToken`]) is observed cooperatively between retry
//! iterations.
//!
//! ## Example
//!
//! ```ignore
//! use aiswire::{CancelSource, NmeaStreamReader};
//!
//! #[tokio::main]
//! async fn main() -> aiswire::Result<()> {
//!     let (_cancel, token) = CancelSource::new();
//!     let mut reader = NmeaStreamReader::new();
//!     reader.connect("153.44.253.27", 5631, &token).await?;
//!
//!     while let Some(sentence) = reader.read_line(&token).await? {
//!         println!("{sentence}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod chunk;
pub mod connector;
pub mod error;
pub mod line_buffer;
pub mod retry;
pub mod session;
pub mod transport;

mod reader;

pub use cancel::{CancelSource, CancelToken};
pub use chunk::{ChunkReader, FatalReason, ReadOutcome, RetryReason};
pub use connector::Connector;
pub use error::{AiswireError, Result};
pub use line_buffer::LineBuffer;
pub use reader::{NmeaStreamReader, ReaderConfig};
pub use retry::{RetryPolicy, RetryState};
pub use session::{ConnectionStatus, Session};
