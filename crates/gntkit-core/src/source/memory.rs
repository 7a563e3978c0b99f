use std::io::Cursor;
use std::sync::Arc;

use super::{MemberSource, SourceError};

/// An in-memory member, e.g. an archive entry already read by the caller.
///
/// The buffer is shared, so reopening does not copy it.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl MemberSource for MemorySource {
    type Reader = Cursor<Arc<[u8]>>;

    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Self::Reader, SourceError> {
        Ok(Cursor::new(Arc::clone(&self.bytes)))
    }
}
