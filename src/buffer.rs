//! Shared backing storage and bounded zero-copy views over it.
//!
//! A [Buffer] is a reference-counted handle: cloning it yields another handle
//! to the same bytes. A [ByteView] addresses a sub-range of a buffer without
//! copying and is the base every record view is built on.

use std::{fmt::Write as _, sync::Arc};

use parking_lot::RwLock;

use crate::errors::{Error, Result};

/// Shared, fixed-size byte storage.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl Buffer {
    /// Creates a zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self::from(vec![0u8; len])
    }

    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the current contents out of the buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    pub(crate) fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.bytes.read())
    }

    pub(crate) fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.bytes.write())
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(value: Vec<u8>) -> Self {
        Buffer {
            bytes: Arc::new(RwLock::new(value)),
        }
    }
}

impl From<&[u8]> for Buffer {
    fn from(value: &[u8]) -> Self {
        Self::from(value.to_vec())
    }
}

/// What a view can be bound to: raw storage or an existing bounded view.
#[derive(Debug, Clone)]
pub enum BufferSource {
    Buffer(Buffer),
    View(ByteView),
}

impl From<Buffer> for BufferSource {
    fn from(value: Buffer) -> Self {
        BufferSource::Buffer(value)
    }
}

impl From<&Buffer> for BufferSource {
    fn from(value: &Buffer) -> Self {
        BufferSource::Buffer(value.clone())
    }
}

impl From<ByteView> for BufferSource {
    fn from(value: ByteView) -> Self {
        BufferSource::View(value)
    }
}

impl From<&ByteView> for BufferSource {
    fn from(value: &ByteView) -> Self {
        BufferSource::View(value.clone())
    }
}

impl From<Vec<u8>> for BufferSource {
    fn from(value: Vec<u8>) -> Self {
        BufferSource::Buffer(value.into())
    }
}

/// Bounded, zero-copy window `[byte_offset, byte_offset + byte_length)` of a
/// [Buffer].
#[derive(Debug, Clone)]
pub struct ByteView {
    buffer: Buffer,
    byte_offset: usize,
    byte_length: usize,
}

impl ByteView {
    /// Binds a view to `source`. When `source` is itself a view the offset is
    /// relative to that view's start, and the bounds check is made against the
    /// whole backing buffer.
    pub fn new(source: impl Into<BufferSource>, byte_offset: usize, byte_length: usize) -> Result<Self> {
        let (buffer, base) = match source.into() {
            BufferSource::Buffer(buffer) => (buffer, 0),
            BufferSource::View(view) => (view.buffer, view.byte_offset),
        };

        let available = buffer.len();
        let effective = base.checked_add(byte_offset);
        let fits = effective
            .and_then(|start| start.checked_add(byte_length))
            .is_some_and(|end| end <= available);

        if !fits {
            return Err(Error::Bounds {
                byte_offset: effective.unwrap_or(usize::MAX),
                byte_length,
                available,
            });
        }

        Ok(ByteView {
            buffer,
            byte_offset: base + byte_offset,
            byte_length,
        })
    }

    /// View covering the whole of `buffer`.
    pub fn whole(buffer: Buffer) -> Self {
        let byte_length = buffer.len();
        ByteView {
            buffer,
            byte_offset: 0,
            byte_length,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Narrows this view to `[offset, offset + length)` relative to its start.
    pub fn subview(&self, offset: usize, length: usize) -> Result<ByteView> {
        if offset.checked_add(length).is_none_or(|end| end > self.byte_length) {
            return Err(Error::Bounds {
                byte_offset: self.byte_offset.saturating_add(offset),
                byte_length: length,
                available: self.byte_length,
            });
        }

        Ok(ByteView {
            buffer: self.buffer.clone(),
            byte_offset: self.byte_offset + offset,
            byte_length: length,
        })
    }

    /// Runs `f` over the bytes covered by this view.
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let range = self.range();
        self.buffer.with_bytes(|bytes| f(&bytes[range]))
    }

    /// Runs `f` over the bytes covered by this view, mutably.
    pub fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let range = self.range();
        self.buffer.with_bytes_mut(|bytes| f(&mut bytes[range]))
    }

    /// Copies the covered bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.read(|bytes| bytes.to_vec())
    }

    /// Lowercase hex dump of the covered bytes.
    pub fn to_hex(&self) -> String {
        self.read(|bytes| {
            let mut out = String::with_capacity(bytes.len() * 2);
            for b in bytes {
                let _ = write!(out, "{:02x}", b);
            }
            out
        })
    }

    fn range(&self) -> std::ops::Range<usize> {
        self.byte_offset..self.byte_offset + self.byte_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_over_buffer() {
        let buffer = Buffer::from(vec![1, 2, 3, 4]);
        let view = ByteView::new(&buffer, 1, 2).unwrap();
        assert_eq!(view.to_vec(), vec![2, 3]);
        assert_eq!(view.to_hex(), "0203");
    }

    #[test]
    fn test_view_is_zero_copy() {
        let buffer = Buffer::new(4);
        let view = ByteView::new(&buffer, 2, 2).unwrap();
        view.write(|bytes| bytes[0] = 0xab);
        assert_eq!(buffer.to_vec(), vec![0, 0, 0xab, 0]);
    }

    #[test]
    fn test_view_over_view_resolves_backing() {
        let buffer = Buffer::from(vec![0, 1, 2, 3, 4, 5]);
        let outer = ByteView::new(&buffer, 2, 4).unwrap();
        let inner = ByteView::new(&outer, 1, 2).unwrap();
        assert_eq!(inner.byte_offset(), 3);
        assert!(inner.buffer().ptr_eq(&buffer));
        assert_eq!(inner.to_vec(), vec![3, 4]);
    }

    #[test]
    fn test_view_out_of_bounds() {
        let buffer = Buffer::new(4);
        assert_eq!(
            ByteView::new(&buffer, 2, 3).unwrap_err(),
            Error::Bounds {
                byte_offset: 2,
                byte_length: 3,
                available: 4
            }
        );
    }

    #[test]
    fn test_view_offset_overflow() {
        let buffer = Buffer::new(4);
        assert!(ByteView::new(&buffer, usize::MAX, 1).is_err());
    }

    #[test]
    fn test_subview_bounds() {
        let buffer = Buffer::new(8);
        let view = ByteView::new(&buffer, 2, 4).unwrap();
        assert!(view.subview(2, 2).is_ok());
        assert!(view.subview(3, 2).is_err());
    }

    #[test]
    fn test_empty_view() {
        let buffer = Buffer::new(0);
        let view = ByteView::new(&buffer, 0, 0).unwrap();
        assert_eq!(view.to_hex(), "");
    }
}
