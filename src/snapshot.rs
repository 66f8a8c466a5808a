use bytes::Bytes;

/// One undecoded capture of a GTFS-RT feed.
///
/// Cheap to clone; the underlying buffer is shared and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot(Bytes);

impl FeedSnapshot {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for FeedSnapshot {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<Bytes> for FeedSnapshot {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}
