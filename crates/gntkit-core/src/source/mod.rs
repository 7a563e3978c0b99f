//! Byte sources for GNT members.
//!
//! A member is a named, openable byte stream (one `.gnt` file, or an
//! in-memory buffer). Opening is deferred until the corpus iterator reaches
//! the member, and the returned reader is owned by that iteration, so it is
//! closed as soon as the member is drained, fails, or is abandoned.

mod file;
mod memory;

pub use file::{GntFileSource, discover_gnt_files, is_gnt_path};
pub use memory::MemorySource;

use std::io::Read;
use std::path::PathBuf;

use thiserror::Error;

/// A named byte source that can be opened, possibly more than once.
pub trait MemberSource {
    type Reader: Read;

    /// Identity used in diagnostics.
    fn name(&self) -> &str;

    fn open(&self) -> Result<Self::Reader, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
