//! Frame type delivered to viewers

use bytes::Bytes;

/// One complete still image reassembled from the capture stream
///
/// This is designed to be cheap to clone due to `Bytes` reference counting:
/// fanning a frame out to many viewers shares a single allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    /// Create a frame from reassembled bytes
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Frame length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the frame payload
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consume the frame, returning its payload
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}
