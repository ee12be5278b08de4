//! Length-prefixed framing over any byte stream
//!
//! Frame format: 4-byte little-endian length + JSON payload.

use super::{MessageReader, MessageWriter};
use async_trait::async_trait;
use sponsor_core::{Result, SponsorError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted frame (64MB)
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Reads length-prefixed frames
pub struct FramedReader<R> {
    inner: R,
    max_len: usize,
}

impl<R> FramedReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_FRAME_LEN)
    }

    pub fn with_limit(inner: R, max_len: usize) -> Self {
        Self { inner, max_len }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> MessageReader for FramedReader<R> {
    async fn read_message(&mut self) -> Result<Option<Vec<u8>>> {
        // Read 4-byte length prefix, telling a clean close from a torn frame
        let mut len_bytes = [0u8; 4];
        let mut filled = 0;
        while filled < len_bytes.len() {
            let n = self
                .inner
                .read(&mut len_bytes[filled..])
                .await
                .map_err(|e| SponsorError::Transport(format!("Read length failed: {}", e)))?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(SponsorError::Transport(
                    "Stream closed inside frame header".into(),
                ));
            }
            filled += n;
        }
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > self.max_len {
            return Err(SponsorError::Transport(format!(
                "Message too large: {} bytes",
                len
            )));
        }

        let mut data = vec![0u8; len];
        self.inner
            .read_exact(&mut data)
            .await
            .map_err(|e| SponsorError::Transport(format!("Read data failed: {}", e)))?;

        Ok(Some(data))
    }
}

/// Writes length-prefixed frames
pub struct FramedWriter<W> {
    inner: W,
}

impl<W> FramedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: AsyncWrite + Unpin + Send> FramedWriter<W> {
    /// Close the write direction so the peer reads end-of-stream
    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| SponsorError::Transport(format!("Shutdown failed: {}", e)))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageWriter for FramedWriter<W> {
    async fn write_message(&mut self, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len())
            .map_err(|_| SponsorError::Transport(format!("Message too large: {} bytes", data.len())))?
            .to_le_bytes();
        self.inner
            .write_all(&len)
            .await
            .map_err(|e| SponsorError::Transport(format!("Write length failed: {}", e)))?;
        self.inner
            .write_all(data)
            .await
            .map_err(|e| SponsorError::Transport(format!("Write data failed: {}", e)))?;
        self.inner
            .flush()
            .await
            .map_err(|e| SponsorError::Transport(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}
