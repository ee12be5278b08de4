//! Stream transport abstractions
//!
//! A session only needs an ordered, reliable, bidirectional message channel.
//! `MessageReader`/`MessageWriter` hide how frames travel.

pub mod framed;
pub mod tcp;

use async_trait::async_trait;
use sponsor_core::Result;

pub use framed::{FramedReader, FramedWriter, MAX_FRAME_LEN};

/// Trait for async reading from a transport
#[async_trait]
pub trait MessageReader: Send {
    /// Read one complete message.
    ///
    /// Returns `Ok(None)` when the peer closed the stream between messages.
    async fn read_message(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Trait for async writing to a transport
#[async_trait]
pub trait MessageWriter: Send {
    /// Write one complete message and flush it
    async fn write_message(&mut self, data: &[u8]) -> Result<()>;
}
