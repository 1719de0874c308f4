//! Stream demultiplexer for the worker's stdout and stderr.
//!
//! Each non-empty read becomes one [`OutputChunk`]. There is no line
//! reassembly: prompt matching works on whatever the pipe delivered. The only
//! thing carried across reads is an incomplete UTF-8 sequence at the tail of
//! a buffer.

use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio_stream::Stream;

const READ_BUF_SIZE: usize = 4096;

/// Which pipe a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// stdout, where prompts and progress lines appear.
    Primary,
    /// stderr.
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: StreamKind,
    pub text: String,
}

impl OutputChunk {
    pub fn primary(text: impl Into<String>) -> Self {
        Self {
            stream: StreamKind::Primary,
            text: text.into(),
        }
    }

    pub fn diagnostic(text: impl Into<String>) -> Self {
        Self {
            stream: StreamKind::Diagnostic,
            text: text.into(),
        }
    }
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = OutputChunk> + Send>>;

type Pipe = Pin<Box<dyn AsyncRead + Send>>;

/// Decodes bytes to text, holding back a trailing partial UTF-8 sequence
/// until the next read completes it.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let keep_from = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // error_len() == None means the input ended mid-sequence.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => incomplete_tail_start(&self.pending),
        };
        let tail = self.pending.split_off(keep_from);
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending = tail;
        text
    }

    fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }
}

/// Start of an unfinished multibyte sequence in the last three bytes, or the
/// buffer length if the buffer ends cleanly.
fn incomplete_tail_start(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=3.min(len) {
        let idx = len - back;
        let byte = bytes[idx];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { idx } else { len };
    }
    len
}

async fn read_some(reader: &mut Option<Pipe>, buf: &mut [u8]) -> std::io::Result<usize> {
    match reader.as_mut() {
        Some(r) => r.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Merges both pipes into one stream of tagged chunks.
///
/// Order is preserved within each pipe. The stream ends once both pipes have
/// reached EOF or failed.
pub fn chunks<O, E>(stdout: O, stderr: E) -> ChunkStream
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut out: Option<Pipe> = Some(Box::pin(stdout));
        let mut err: Option<Pipe> = Some(Box::pin(stderr));
        let mut out_buf = vec![0u8; READ_BUF_SIZE];
        let mut err_buf = vec![0u8; READ_BUF_SIZE];
        let mut out_carry = Utf8Carry::default();
        let mut err_carry = Utf8Carry::default();

        while out.is_some() || err.is_some() {
            let (kind, read) = tokio::select! {
                r = read_some(&mut out, &mut out_buf), if out.is_some() => (StreamKind::Primary, r),
                r = read_some(&mut err, &mut err_buf), if err.is_some() => (StreamKind::Diagnostic, r),
                else => break,
            };

            let (reader_closed, carry, buf) = match kind {
                StreamKind::Primary => (&mut out, &mut out_carry, &out_buf),
                StreamKind::Diagnostic => (&mut err, &mut err_carry, &err_buf),
            };

            let text = match read {
                Ok(0) => {
                    *reader_closed = None;
                    carry.flush()
                }
                Ok(n) => Some(carry.decode(&buf[..n])),
                Err(e) => {
                    tracing::debug!(stream = ?kind, error = %e, "Worker pipe read failed");
                    *reader_closed = None;
                    carry.flush()
                }
            };

            if let Some(text) = text.filter(|t| !t.is_empty()) {
                yield OutputChunk { stream: kind, text };
            }
        }
    };

    Box::pin(stream)
}
