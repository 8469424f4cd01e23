//! Buffers handed to the inspection engine and their release tracking

use bytes::{BufMut, Bytes, BytesMut};
use std::borrow::Cow;
use tracing::debug;

/// A marshalled copy of data passed to the engine.
///
/// Text is stored NUL-terminated, the way the engine's calling convention
/// expects strings. Cloning is cheap and shares the allocation, so the
/// engine may keep a clone for as long as the transaction lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedBuffer {
    data: Bytes,
    terminated: bool,
}

impl TrackedBuffer {
    /// Marshal a string, appending the NUL terminator
    pub fn text(value: &str) -> Self {
        let mut buf = BytesMut::with_capacity(value.len() + 1);
        buf.put_slice(value.as_bytes());
        buf.put_u8(0);
        Self {
            data: buf.freeze(),
            terminated: true,
        }
    }

    /// Marshal raw body bytes verbatim
    pub fn bytes(value: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(value),
            terminated: false,
        }
    }

    /// Payload without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        if self.terminated {
            &self.data[..self.data.len() - 1]
        } else {
            &self.data
        }
    }

    /// Payload as text (lossy for non UTF-8 bodies)
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// The full buffer as laid out for the engine, terminator included
    pub fn raw(&self) -> &Bytes {
        &self.data
    }

    /// Payload length, terminator excluded
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns every buffer created for one transaction until cleanup.
///
/// Buffers are never released by the phase that created them. They are
/// dropped together by [`ResourceTracker::release_all`], which drains the
/// list so a second call releases nothing.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    pending: Vec<TrackedBuffer>,
    released: usize,
}

impl ResourceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register buffers for release at cleanup
    pub fn track<I>(&mut self, buffers: I)
    where
        I: IntoIterator<Item = TrackedBuffer>,
    {
        self.pending.extend(buffers);
    }

    /// Marshal a string, register it and hand back the engine's copy
    pub fn text(&mut self, value: &str) -> TrackedBuffer {
        let buffer = TrackedBuffer::text(value);
        self.pending.push(buffer.clone());
        buffer
    }

    /// Marshal body bytes, register them and hand back the engine's copy
    pub fn bytes(&mut self, value: &[u8]) -> TrackedBuffer {
        let buffer = TrackedBuffer::bytes(value);
        self.pending.push(buffer.clone());
        buffer
    }

    /// Release every pending buffer, returning how many were released
    pub fn release_all(&mut self) -> usize {
        let count = self.pending.len();
        if count > 0 {
            let bytes: usize = self.pending.iter().map(|b| b.raw().len()).sum();
            self.pending.clear();
            self.released += count;
            debug!("Released {} buffers ({} bytes)", count, bytes);
        }
        count
    }

    /// Buffers awaiting release
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is awaiting release
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Buffers released so far
    pub fn released(&self) -> usize {
        self.released
    }

    /// Pending buffers in registration order
    pub fn pending(&self) -> &[TrackedBuffer] {
        &self.pending
    }
}
