//! TCP transport for session streams

use super::framed::{FramedReader, FramedWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::warn;

/// TCP read half with framing
pub type TcpReader = FramedReader<OwnedReadHalf>;

/// TCP write half with framing
pub type TcpWriter = FramedWriter<OwnedWriteHalf>;

/// Split a connected socket into framed halves
pub fn split(stream: TcpStream, max_frame_len: usize) -> (TcpReader, TcpWriter) {
    // Disable Nagle's algorithm, responses are small and latency bound
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY: {}", e);
    }
    let (read_half, write_half) = stream.into_split();
    (
        FramedReader::with_limit(read_half, max_frame_len),
        FramedWriter::new(write_half),
    )
}
