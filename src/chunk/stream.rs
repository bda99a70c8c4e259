//! Chunk stream reader with strict byte accounting.

use tracing::trace;

use super::format::HEADER_SIZE;
use crate::util::{Error, Result};

/// One open chunk: id, declared total length (header included) and the
/// number of bytes consumed so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkState {
    pub id: u16,
    pub length: u32,
    pub consumed: u32,
}

impl ChunkState {
    /// Bytes of this chunk not yet consumed.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.length.saturating_sub(self.consumed)
    }
}

/// Cursor over a raw 3DS byte buffer.
///
/// Maintains an explicit stack of open chunks. Every primitive read is
/// charged to the innermost open chunk only; when a chunk is released its
/// full declared length is charged to its parent in one step, keeping the
/// bookkeeping O(depth) rather than O(bytes x depth).
pub struct ChunkStream<'a> {
    data: &'a [u8],
    pos: usize,
    stack: Vec<ChunkState>,
}

impl<'a> ChunkStream<'a> {
    /// Create a stream over a complete 3DS byte buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, stack: Vec::new() }
    }

    /// Current byte offset in the underlying buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether the underlying buffer is exhausted.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The innermost open chunk, if any.
    #[inline]
    pub fn current_chunk(&self) -> Option<&ChunkState> {
        self.stack.last()
    }

    /// Depth of the open-chunk stack.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Advance without charging any open chunk. Used for chunk headers,
    /// whose six bytes count toward the new chunk rather than its parent.
    fn take_raw(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(Error::UnexpectedEof(self.data.len()));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Advance and charge the innermost open chunk.
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self.take_raw(len)?;
        if let Some(top) = self.stack.last_mut() {
            top.consumed += len as u32;
        }
        Ok(bytes)
    }

    /// Read a 6-byte chunk header and push the chunk onto the stack.
    ///
    /// Fails with [`Error::MalformedChunk`] when the declared length is
    /// smaller than the header itself.
    pub fn read_chunk_header(&mut self) -> Result<ChunkState> {
        let bytes = self.take_raw(HEADER_SIZE as usize)?;
        let id = u16::from_le_bytes([bytes[0], bytes[1]]);
        let length = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        if length < HEADER_SIZE {
            return Err(Error::MalformedChunk { id, length });
        }
        let chunk = ChunkState { id, length, consumed: HEADER_SIZE };
        trace!(id = format_args!("{:#06x}", id), length, "open chunk");
        self.stack.push(chunk);
        Ok(chunk)
    }

    /// Pop the innermost chunk, enforcing that it was fully and exactly
    /// consumed, and charge its total length to the enclosing chunk.
    pub fn release_chunk(&mut self) -> Result<ChunkState> {
        let chunk = self
            .stack
            .pop()
            .ok_or_else(|| Error::other("release_chunk called with no open chunk"))?;
        if chunk.consumed != chunk.length {
            return Err(Error::ChunkLengthMismatch {
                id: chunk.id,
                expected: chunk.length,
                actual: chunk.consumed,
            });
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.consumed += chunk.length;
        }
        Ok(chunk)
    }

    /// Whether the innermost open chunk has consumed its declared length.
    pub fn is_chunk_end_reached(&self) -> bool {
        self.stack.last().is_some_and(|c| c.consumed >= c.length)
    }

    /// Discard the remaining bytes of the innermost open chunk. Used to
    /// skip unrecognized or intentionally ignored sub-chunks.
    pub fn read_until_chunk_end(&mut self) -> Result<()> {
        let remaining = self
            .stack
            .last()
            .map(|c| c.remaining())
            .ok_or_else(|| Error::other("read_until_chunk_end called with no open chunk"))?;
        self.take(remaining as usize)?;
        Ok(())
    }

    /// Read an unsigned byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian signed 16-bit integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read an IEEE-754 float by reinterpreting the little-endian 32-bit
    /// pattern. Bit-exact, no rounding.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read three consecutive floats as a vector.
    pub fn read_vec3(&mut self) -> Result<glam::Vec3> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(glam::Vec3::new(x, y, z))
    }

    /// Read a NUL-terminated string. 3DS names use an 8-bit charset, so
    /// each byte is decoded as ISO-8859-1. A missing terminator before the
    /// end of the buffer is [`Error::UnexpectedEof`].
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let nul = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::UnexpectedEof(self.data.len()))?;
        let bytes = self.take(nul + 1)?;
        Ok(bytes[..nul].iter().map(|&b| b as char).collect())
    }
}
