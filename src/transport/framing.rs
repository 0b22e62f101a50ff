//! Newline-delimited framing.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::utils::{BrokerError, Result};

/// Splits a byte stream into `\n`-terminated frames of bounded length.
///
/// `next_frame` is cancel safe: bytes of a partially read line stay buffered
/// and the next call continues where the cancelled one stopped.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_len: usize,
    ready: bool,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(inner: R, max_len: usize) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            max_len,
            ready: false,
        }
    }

    /// Returns the next frame without its `\n` or `\r\n` terminator, or
    /// `None` once the stream has ended.
    ///
    /// A final line without a terminator still counts as a frame. A line
    /// longer than `max_len` bytes is an error, after which the stream cannot
    /// be resynchronized.
    pub async fn next_frame(&mut self) -> Result<Option<&[u8]>> {
        if self.ready {
            self.buf.clear();
            self.ready = false;
        }

        let remaining = self.max_len.saturating_add(1).saturating_sub(self.buf.len()) as u64;
        let n = (&mut self.inner)
            .take(remaining)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
            self.ready = true;
            return Ok(Some(&self.buf));
        }

        if self.buf.len() > self.max_len {
            return Err(BrokerError::FrameTooLong {
                limit: self.max_len,
            });
        }

        if n == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        self.ready = true;
        Ok(Some(&self.buf))
    }
}
