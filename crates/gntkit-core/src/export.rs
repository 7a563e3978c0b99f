//! Re-encoding samples as standard raster images.
//!
//! `PngDirectorySink` reproduces the browsable layout of the dataset tools:
//! one directory per label, files numbered per label starting at 1.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{ColorType, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::LabelCount;
use crate::corpus::{Corpus, CorpusError, ErrorPolicy};
use crate::format::Sample;
use crate::source::MemberSource;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("image encoding failed for {path}: {message}")]
    Image { path: PathBuf, message: String },
    #[error("pixel buffer holds {actual} bytes, {width}x{height} requires {expected}")]
    PixelCountMismatch {
        width: u16,
        height: u16,
        expected: usize,
        actual: usize,
    },
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),
}

/// Destination for decoded rasters.
pub trait RasterSink {
    /// `index` is the 1-based count of samples seen so far with this label.
    fn write_sample(&mut self, sample: &Sample, index: u64) -> Result<(), ExportError>;
}

/// Writes `<root>/<label>/<label>_<index>.png` as 8-bit grayscale PNG.
#[derive(Debug, Clone)]
pub struct PngDirectorySink {
    root: PathBuf,
}

impl PngDirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target path for the `index`-th sample of `label`.
    pub fn sample_path(&self, label: char, index: u64) -> PathBuf {
        self.root
            .join(label.to_string())
            .join(format!("{label}_{index}.png"))
    }
}

impl RasterSink for PngDirectorySink {
    fn write_sample(&mut self, sample: &Sample, index: u64) -> Result<(), ExportError> {
        let expected = sample.pixel_count();
        if sample.pixels.len() != expected {
            return Err(ExportError::PixelCountMismatch {
                width: sample.width,
                height: sample.height,
                expected,
                actual: sample.pixels.len(),
            });
        }

        let path = self.sample_path(sample.label, index);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ExportError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        image::save_buffer_with_format(
            &path,
            &sample.pixels,
            sample.width as u32,
            sample.height as u32,
            ColorType::L8,
            ImageFormat::Png,
        )
        .map_err(|err| ExportError::Image {
            path: path.clone(),
            message: err.to_string(),
        })?;
        debug!(path = %path.display(), "wrote sample");
        Ok(())
    }
}

/// Result of an export run, with labels in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub samples_written: u64,
    pub labels: Vec<LabelCount>,
    /// Members skipped under `ErrorPolicy::SkipSource`, with their error.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_members: Vec<String>,
}

impl ExportSummary {
    /// Fold another run into this one; label counts are summed per label.
    pub fn merge(&mut self, other: ExportSummary) {
        let mut counts: BTreeMap<char, u64> = self
            .labels
            .drain(..)
            .map(|entry| (entry.label, entry.count))
            .collect();
        for entry in other.labels {
            *counts.entry(entry.label).or_default() += entry.count;
        }
        self.labels = counts
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect();
        self.samples_written += other.samples_written;
        self.failed_members.extend(other.failed_members);
    }
}

/// Drain `corpus` into `sink`.
///
/// Under `ErrorPolicy::AbortCorpus` the first corpus error is returned; under
/// `ErrorPolicy::SkipSource` it is recorded in the summary. Sink errors always
/// end the export.
pub fn export_corpus<M, S>(corpus: &Corpus<M>, sink: &mut S) -> Result<ExportSummary, ExportError>
where
    M: MemberSource,
    S: RasterSink + ?Sized,
{
    let mut counts: BTreeMap<char, u64> = BTreeMap::new();
    let mut summary = ExportSummary::default();

    for result in corpus {
        let sample = match result {
            Ok(sample) => sample,
            Err(err) => match corpus.policy() {
                ErrorPolicy::AbortCorpus => return Err(err.into()),
                ErrorPolicy::SkipSource => {
                    warn!(error = %err, "member skipped during export");
                    summary.failed_members.push(err.to_string());
                    continue;
                }
            },
        };
        let count = counts.entry(sample.label).or_default();
        *count += 1;
        sink.write_sample(&sample, *count)?;
        summary.samples_written += 1;
    }

    summary.labels = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{ExportError, PngDirectorySink, RasterSink, export_corpus};
    use crate::corpus::{Corpus, ErrorPolicy};
    use crate::format::{Sample, record_bytes};
    use crate::source::MemorySource;
    use std::path::Path;

    #[derive(Default)]
    struct Collect {
        written: Vec<(char, u64, usize)>,
    }

    impl RasterSink for Collect {
        fn write_sample(&mut self, sample: &Sample, index: u64) -> Result<(), ExportError> {
            self.written
                .push((sample.label, index, sample.pixels.len()));
            Ok(())
        }
    }

    fn member(name: &str, labels: &[char]) -> MemorySource {
        let bytes: Vec<u8> = labels
            .iter()
            .flat_map(|&label| {
                record_bytes(&Sample {
                    label,
                    width: 2,
                    height: 2,
                    pixels: vec![0x80; 4],
                })
                .unwrap()
            })
            .collect();
        MemorySource::new(name, bytes)
    }

    #[test]
    fn numbers_samples_per_label() {
        let corpus = Corpus::new(vec![
            member("a", &['中', '文', '中']),
            member("b", &['中']),
        ]);
        let mut sink = Collect::default();
        let summary = export_corpus(&corpus, &mut sink).unwrap();

        assert_eq!(
            sink.written,
            vec![('中', 1, 4), ('文', 1, 4), ('中', 2, 4), ('中', 3, 4)]
        );
        assert_eq!(summary.samples_written, 4);
        assert_eq!(summary.labels.len(), 2);
        assert_eq!(summary.labels[0].label, '中');
        assert_eq!(summary.labels[0].count, 3);
    }

    #[test]
    fn abort_policy_returns_corpus_error() {
        let corpus = Corpus::new(vec![MemorySource::new("bad", vec![1u8, 2])]);
        let err = export_corpus(&corpus, &mut Collect::default()).unwrap_err();
        assert!(matches!(err, ExportError::Corpus(_)));
    }

    #[test]
    fn skip_policy_records_failed_members() {
        let corpus = Corpus::new(vec![
            MemorySource::new("bad", vec![1u8, 2]),
            member("good", &['文']),
        ])
        .with_policy(ErrorPolicy::SkipSource);
        let summary = export_corpus(&corpus, &mut Collect::default()).unwrap();
        assert_eq!(summary.samples_written, 1);
        assert_eq!(summary.failed_members.len(), 1);
        assert!(summary.failed_members[0].starts_with("bad:"));
    }

    #[test]
    fn merged_summaries_sum_label_counts() {
        let mut total = export_corpus(
            &Corpus::new(vec![member("trn", &['文', '中'])]),
            &mut Collect::default(),
        )
        .unwrap();
        let other = export_corpus(
            &Corpus::new(vec![member("tst", &['中', '啊'])]),
            &mut Collect::default(),
        )
        .unwrap();
        total.merge(other);

        assert_eq!(total.samples_written, 4);
        let labels: Vec<_> = total.labels.iter().map(|c| (c.label, c.count)).collect();
        assert_eq!(labels, vec![('中', 2), ('啊', 1), ('文', 1)]);
    }

    #[test]
    fn sample_path_uses_label_directory() {
        let sink = PngDirectorySink::new("/out");
        assert_eq!(
            sink.sample_path('中', 7),
            Path::new("/out").join("中").join("中_7.png")
        );
    }

    #[test]
    fn png_sink_writes_grayscale_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngDirectorySink::new(dir.path());
        let sample = Sample {
            label: '文',
            width: 3,
            height: 2,
            pixels: vec![0, 50, 100, 150, 200, 250],
        };
        sink.write_sample(&sample, 1).unwrap();

        let path = sink.sample_path('文', 1);
        let decoded = image::open(&path).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.into_raw(), sample.pixels);
    }

    #[test]
    fn png_sink_rejects_short_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngDirectorySink::new(dir.path());
        let sample = Sample {
            label: '文',
            width: 3,
            height: 2,
            pixels: vec![0; 5],
        };
        let err = sink.write_sample(&sample, 1).unwrap_err();
        assert!(matches!(err, ExportError::PixelCountMismatch { .. }));
    }
}
