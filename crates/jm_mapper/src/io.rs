//! Stream plumbing: buffering, transcoding and the flush guard.

use core::str;
use std::borrow::Cow;
use std::io::{self, BufWriter, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{BufferStrategy, Encoding, MapperConfig, MapperError};

/// Buffers kept by a pool; extra returns are dropped.
const POOL_LIMIT: usize = 16;

// -----------------------------------------------------------------------------
// BufferPool

/// A bounded pool of byte buffers shared by the clones of a mapper.
#[derive(Debug, Default)]
pub(crate) struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// A cleared buffer with at least `capacity` bytes reserved.
    pub fn take(&self, capacity: usize) -> Vec<u8> {
        let pooled = self.buffers.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let mut buffer = pooled.unwrap_or_default();
        buffer.reserve(capacity);
        buffer
    }

    pub fn give(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        if buffers.len() < POOL_LIMIT {
            buffers.push(buffer);
        }
    }

    /// Number of idle buffers.
    pub fn len(&self) -> usize {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A write buffer borrowed from a [`BufferPool`] and returned on drop.
pub(crate) struct PooledWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    capacity: usize,
    pool: Arc<BufferPool>,
}

impl<W: Write> PooledWriter<W> {
    pub fn new(inner: W, capacity: usize, pool: Arc<BufferPool>) -> Self {
        Self {
            inner,
            buffer: pool.take(capacity),
            capacity,
            pool,
        }
    }

    fn drain(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.inner.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }
}

impl<W: Write> Write for PooledWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.buffer.len() + buf.len() > self.capacity {
            self.drain()?;
        }
        if buf.len() >= self.capacity {
            return self.inner.write(buf);
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for PooledWriter<W> {
    fn drop(&mut self) {
        self.pool.give(core::mem::take(&mut self.buffer));
    }
}

// -----------------------------------------------------------------------------
// Transcoding

fn invalid_data(err: impl core::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

/// Re-encodes the UTF-8 produced by the serializer as UTF-16.
///
/// A character split across two writes is held back until it is complete.
pub(crate) struct Utf16Writer<W: Write> {
    inner: W,
    big_endian: bool,
    pending: Vec<u8>,
}

impl<W: Write> Utf16Writer<W> {
    #[inline]
    pub fn new(inner: W, big_endian: bool) -> Self {
        Self {
            inner,
            big_endian,
            pending: Vec::new(),
        }
    }
}

impl<W: Write> Write for Utf16Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        let complete = match str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => return Err(invalid_data(err)),
        };
        let text = str::from_utf8(&self.pending[..complete]).map_err(invalid_data)?;
        let mut encoded = Vec::with_capacity(text.len() * 2);
        for unit in text.encode_utf16() {
            let bytes = if self.big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() };
            encoded.extend_from_slice(&bytes);
        }
        self.inner.write_all(&encoded)?;
        self.pending.drain(..complete);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            return Err(invalid_data("incomplete UTF-8 sequence"));
        }
        self.inner.flush()
    }
}

/// Decodes a document, honouring a byte order mark over `encoding`.
pub(crate) fn decode(bytes: &[u8], encoding: Encoding) -> Result<Cow<'_, str>, MapperError> {
    let (bytes, encoding) = match bytes {
        [0xef, 0xbb, 0xbf, rest @ ..] => (rest, Encoding::Utf8),
        [0xff, 0xfe, rest @ ..] => (rest, Encoding::Utf16Le),
        [0xfe, 0xff, rest @ ..] => (rest, Encoding::Utf16Be),
        _ => (bytes, encoding),
    };
    match encoding {
        Encoding::Utf8 => Ok(Cow::Borrowed(str::from_utf8(bytes).map_err(invalid_data)?)),
        Encoding::Utf16Le | Encoding::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err(invalid_data("odd number of bytes in UTF-16 input").into());
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| match encoding {
                    Encoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
                    _ => u16::from_le_bytes([pair[0], pair[1]]),
                })
                .collect();
            Ok(Cow::Owned(String::from_utf16(&units).map_err(invalid_data)?))
        }
    }
}

/// Reads a whole stream through a buffer of the configured size.
///
/// A pooled buffer goes back to the pool when the read fails.
pub(crate) fn read_all<R: Read>(reader: R, config: &MapperConfig, pool: &BufferPool) -> Result<Vec<u8>, MapperError> {
    let mut reader = io::BufReader::with_capacity(config.buffer_size(), reader);
    let strategy = config.buffer_strategy();
    let mut bytes = match strategy {
        BufferStrategy::PerCall => Vec::with_capacity(config.buffer_size()),
        BufferStrategy::Pooled => pool.take(config.buffer_size()),
    };
    match reader.read_to_end(&mut bytes) {
        Ok(_) => Ok(bytes),
        Err(err) => {
            if strategy == BufferStrategy::Pooled {
                pool.give(bytes);
            }
            Err(err.into())
        }
    }
}

// -----------------------------------------------------------------------------
// Output

/// The buffering layer chosen by the [`BufferStrategy`].
pub(crate) enum Buffered<W: Write> {
    PerCall(BufWriter<W>),
    Pooled(PooledWriter<W>),
}

impl<W: Write> Write for Buffered<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::PerCall(writer) => writer.write(buf),
            Self::Pooled(writer) => writer.write(buf),
        }
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::PerCall(writer) => writer.flush(),
            Self::Pooled(writer) => writer.flush(),
        }
    }
}

/// The buffered and transcoded sink a document is written to.
pub(crate) enum Output<W: Write> {
    Utf8(Buffered<W>),
    Utf16(Utf16Writer<Buffered<W>>),
}

impl<W: Write> Output<W> {
    pub fn new(writer: W, config: &MapperConfig, pool: &Arc<BufferPool>) -> Self {
        let size = config.buffer_size();
        let buffered = match config.buffer_strategy() {
            BufferStrategy::PerCall => Buffered::PerCall(BufWriter::with_capacity(size, writer)),
            BufferStrategy::Pooled => Buffered::Pooled(PooledWriter::new(writer, size, pool.clone())),
        };
        match config.encoding() {
            Encoding::Utf8 => Self::Utf8(buffered),
            Encoding::Utf16Le => Self::Utf16(Utf16Writer::new(buffered, false)),
            Encoding::Utf16Be => Self::Utf16(Utf16Writer::new(buffered, true)),
        }
    }
}

impl<W: Write> Write for Output<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Utf8(writer) => writer.write(buf),
            Self::Utf16(writer) => writer.write(buf),
        }
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Utf8(writer) => writer.flush(),
            Self::Utf16(writer) => writer.flush(),
        }
    }
}

/// Flushes the sink on every exit path.
///
/// [`finish`](Self::finish) reports the flush error; a guard dropped
/// without it (an error or a panic unwinding) flushes quietly. With `close`
/// on, the sink and the stream it owns are released right after the final
/// flush. A caller keeps its stream open by handing in `&mut W`.
pub(crate) struct OutputGuard<W: Write> {
    output: Option<W>,
    close: bool,
    flushed: bool,
}

impl<W: Write> OutputGuard<W> {
    #[inline]
    pub fn new(output: W, close: bool) -> Self {
        Self {
            output: Some(output),
            close,
            flushed: false,
        }
    }

    /// The sink; `None` once a closing guard has finished.
    #[inline]
    pub fn get(&mut self) -> Option<&mut W> {
        self.output.as_mut()
    }

    pub fn finish(mut self) -> Result<(), MapperError> {
        if let Some(output) = self.output.as_mut() {
            output.flush()?;
        }
        self.flushed = true;
        if self.close {
            self.output = None;
        }
        Ok(())
    }
}

impl<W: Write> Drop for OutputGuard<W> {
    fn drop(&mut self) {
        if !self.flushed
            && let Some(output) = self.output.as_mut()
            && let Err(err) = output.flush()
        {
            log::debug!("flush after a failed write also failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::{BufferPool, PooledWriter, Utf16Writer, decode};
    use crate::Encoding;

    #[test]
    fn split_characters_are_transcoded_once_complete() {
        let mut out = Vec::new();
        let mut writer = Utf16Writer::new(&mut out, false);
        let snowman = "\"\u{2603}\"".as_bytes();
        writer.write_all(&snowman[..2]).unwrap();
        writer.write_all(&snowman[2..]).unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert_eq!(out, [b'"', 0, 0x03, 0x26, b'"', 0]);
        assert_eq!(decode(&out, Encoding::Utf16Le).unwrap(), "\"\u{2603}\"");
    }

    #[test]
    fn byte_order_marks_win_over_the_configured_encoding() {
        let be = [0xfe, 0xff, 0, b'{', 0, b'}'];
        assert_eq!(decode(&be, Encoding::Utf8).unwrap(), "{}");
        let utf8 = [0xef, 0xbb, 0xbf, b'1'];
        assert_eq!(decode(&utf8, Encoding::Utf16Le).unwrap(), "1");
        assert!(decode(&[0, b'1', 0], Encoding::Utf16Be).is_err());
    }

    #[test]
    fn pooled_buffers_are_recycled() {
        let pool = Arc::new(BufferPool::default());
        let mut out = Vec::new();
        {
            let mut writer = PooledWriter::new(&mut out, 4, pool.clone());
            writer.write_all(b"ab").unwrap();
            writer.write_all(b"cdef").unwrap();
            writer.write_all(b"g").unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(out, b"abcdefg");
        assert_eq!(pool.len(), 1);
        assert!(pool.take(4).is_empty());
    }
}
