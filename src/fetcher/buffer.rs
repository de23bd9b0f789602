use std::borrow::Cow;

/// Initial capacity of the response buffer; it doubles whenever it fills.
pub const INITIAL_CAPACITY: usize = 16384;

/// Growable byte arena that receives a whole response or file.
///
/// The arena is zero-filled up to its capacity and always keeps at least
/// one free byte (`capacity() > len()`).
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    data: Vec<u8>,
    len: usize,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity.max(2)],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Unfilled tail of the arena.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.len..]
    }

    /// Mark `n` more bytes of the spare region as filled, doubling the
    /// arena when no free byte would remain.
    pub fn advance(&mut self, n: usize) {
        self.len = (self.len + n).min(self.data.len());
        if self.len == self.data.len() {
            self.grow();
        }
    }

    /// Double the capacity; the new region is zero-filled.
    pub fn grow(&mut self) {
        let new_capacity = self.data.len() * 2;
        self.data.resize(new_capacity, 0);
    }

    /// Forget the previous content without shrinking the arena.
    pub fn clear(&mut self) {
        self.data[..self.len].fill(0);
        self.len = 0;
    }
}

/// Byte range inside a [`ResponseBuffer`].
///
/// Stored as an offset rather than a reference so it stays meaningful when
/// the arena is reallocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bytes this span covers; empty when it lies outside `buf`.
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        buf.get(self.start..self.end()).unwrap_or(&[])
    }

    pub fn text<'a>(&self, buf: &'a [u8]) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes(buf))
    }
}
