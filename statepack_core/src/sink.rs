use crate::format::{padding_for, SINK_CHUNK_SIZE};

/// Append-only byte buffer used while encoding.
///
/// # Storage
/// Bytes accumulate in a current chunk of `SINK_CHUNK_SIZE` capacity. When it
/// fills up it is moved to the list of sealed chunks and a fresh one is
/// started, so a write never copies what was written before it.
///
/// # Single-shot
/// [`into_bytes`] consumes the sink. There is no way to keep writing after
/// the buffer has been finalized.
///
/// [`into_bytes`]: Sink::into_bytes
#[derive(Debug, Default)]
pub struct Sink {
    sealed: Vec<Vec<u8>>,
    current: Vec<u8>,
    /// Total bytes across `sealed` and `current`.
    len: usize,
}

impl Sink {
    pub fn new() -> Self {
        Self {
            sealed: Vec::new(),
            current: Vec::with_capacity(SINK_CHUNK_SIZE),
            len: 0,
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        if self.current.len() == SINK_CHUNK_SIZE {
            self.seal_current();
        }
        self.current.push(byte);
        self.len += 1;
    }

    /// Append a slice, splitting it across chunks as needed.
    pub fn write_bytes(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            if self.current.len() == SINK_CHUNK_SIZE {
                self.seal_current();
            }
            let room = SINK_CHUNK_SIZE - self.current.len();
            let take = room.min(bytes.len());
            self.current.extend_from_slice(&bytes[..take]);
            self.len += take;
            bytes = &bytes[take..];
        }
    }

    /// Zero-pad until `len() % align == 0`, then append `bytes`.
    pub fn write_aligned(&mut self, bytes: &[u8], align: usize) {
        self.pad_to(align);
        self.write_bytes(bytes);
    }

    /// Concatenate every chunk into one contiguous buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        if self.sealed.is_empty() {
            return self.current;
        }
        let mut out = Vec::with_capacity(self.len);
        for chunk in self.sealed.drain(..) {
            out.extend_from_slice(&chunk);
        }
        out.extend_from_slice(&self.current);
        out
    }

    fn pad_to(&mut self, align: usize) {
        for _ in 0..padding_for(self.len, align) {
            self.write_byte(0);
        }
    }

    fn seal_current(&mut self) {
        let full = std::mem::replace(&mut self.current, Vec::with_capacity(SINK_CHUNK_SIZE));
        self.sealed.push(full);
    }
}
