use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{MemberSource, SourceError};
use crate::format::{DecoderOptions, RecordDecoder};

const GNT_EXTENSION: &str = "gnt";

/// A `.gnt` file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GntFileSource {
    path: PathBuf,
    name: String,
}

impl GntFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and wrap it in a decoder.
    pub fn decoder(
        &self,
        options: DecoderOptions,
    ) -> Result<RecordDecoder<BufReader<File>>, SourceError> {
        Ok(RecordDecoder::with_options(self.open()?, options))
    }
}

impl MemberSource for GntFileSource {
    type Reader = BufReader<File>;

    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Self::Reader, SourceError> {
        let file = File::open(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "opened GNT member");
        Ok(BufReader::new(file))
    }
}

/// List the `.gnt` files directly under `dir`, sorted by path.
///
/// The extension match is case-insensitive; subdirectories are not visited.
pub fn discover_gnt_files(dir: &Path) -> Result<Vec<GntFileSource>, SourceError> {
    if !dir.is_dir() {
        return Err(SourceError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_gnt_path(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    debug!(dir = %dir.display(), members = paths.len(), "discovered GNT members");
    Ok(paths.into_iter().map(GntFileSource::new).collect())
}

/// Whether `path` carries a `.gnt` extension, in any letter case.
pub fn is_gnt_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(GNT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::{GntFileSource, discover_gnt_files, is_gnt_path};
    use crate::source::{MemberSource, SourceError};
    use std::fs;
    use std::path::Path;

    #[test]
    fn gnt_extension_is_case_insensitive() {
        assert!(is_gnt_path(Path::new("a/1001-c.gnt")));
        assert!(is_gnt_path(Path::new("1001-c.GNT")));
        assert!(!is_gnt_path(Path::new("1001-c.dgr")));
        assert!(!is_gnt_path(Path::new("gnt")));
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.gnt"), b"").unwrap();
        fs::write(dir.path().join("a.GNT"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("nested.gnt")).unwrap();

        let members = discover_gnt_files(dir.path()).unwrap();
        let names: Vec<_> = members
            .iter()
            .map(|m| m.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.GNT", "b.gnt"]);
    }

    #[test]
    fn discover_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.gnt");
        fs::write(&file, b"").unwrap();
        let err = discover_gnt_files(&file).unwrap_err();
        assert!(matches!(err, SourceError::NotADirectory { .. }));
    }

    #[test]
    fn open_missing_file_names_path() {
        let source = GntFileSource::new("/definitely/missing/1001-c.gnt");
        let err = source.open().unwrap_err();
        assert!(err.to_string().contains("1001-c.gnt"));
    }
}
