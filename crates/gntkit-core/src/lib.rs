//! gntkit core library for CASIA handwriting sample archives.
//!
//! The crate decodes GNT members (back-to-back binary records of one GB2312
//! label plus an 8-bit grayscale raster) into [`Sample`]s. Decoding is
//! byte-oriented and side-effect free; file access is isolated in `source`.
//! The corpus layer flattens many members into one lazy stream, and the
//! `analysis` and `export` layers consume that stream.
//!
//! Invariants:
//! - A decoded sample always holds exactly `width * height` pixels.
//! - The record boundary comes from the header, never from the declared
//!   length prefix.
//! - Decode errors carry the byte offset within the member; corpus errors add
//!   the member's name.
//! - Report outputs are deterministic and stable across runs.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use gntkit_core::{Corpus, ErrorPolicy, discover_gnt_files};
//!
//! let members = discover_gnt_files(Path::new("HWDB1.1tst_gnt"))?;
//! let corpus = Corpus::new(members).with_policy(ErrorPolicy::SkipSource);
//! for sample in &corpus {
//!     match sample {
//!         Ok(sample) => println!("{} {}x{}", sample.label, sample.width, sample.height),
//!         Err(err) => eprintln!("skipped: {err}"),
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod corpus;
pub mod export;
pub mod format;
mod registry;
mod source;

pub use analysis::{AnalysisError, analyze_corpus, analyze_gnt_files};
pub use corpus::{
    Corpus, CorpusError, CorpusErrorKind, CorpusIter, CorpusWarning, ErrorPolicy, MemberOutcome,
};
pub use export::{ExportError, ExportSummary, PngDirectorySink, RasterSink, export_corpus};
pub use format::{
    DecodeError, DecoderOptions, EncodeError, LengthCheck, RecordDecoder, Sample, decode_next,
    encode_record,
};
pub use registry::{DatasetEntry, DatasetKind, DatasetRegistry, RegistryError};
pub use source::{
    GntFileSource, MemberSource, MemorySource, SourceError, discover_gnt_files, is_gnt_path,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used until the caller stamps the report.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Corpus summary with deterministic ordering.
///
/// # Examples
/// ```
/// use gntkit_core::make_stub_report;
///
/// let report = make_stub_report();
/// assert_eq!(report.report_version, gntkit_core::REPORT_VERSION);
/// assert!(report.labels.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    /// Samples decoded across all members.
    pub samples_total: u64,
    /// Distinct labels seen.
    pub labels_total: u64,
    /// Per-label sample counts, sorted by code point.
    pub labels: Vec<LabelCount>,
    /// Raster size statistics (absent when no sample was decoded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<DimensionSummary>,
    /// Members in traversal order.
    pub members: Vec<MemberSummary>,
    /// Non-fatal decoder warnings, formatted as `member: message`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "gntkit").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Number of samples carrying one label.
///
/// # Examples
/// ```
/// use gntkit_core::LabelCount;
///
/// let count = LabelCount { label: '中', count: 3 };
/// assert_eq!(serde_json::to_string(&count)?, r#"{"label":"中","count":3}"#);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: char,
    pub count: u64,
}

/// Raster size statistics over decoded samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSummary {
    pub width_min: u16,
    pub width_max: u16,
    pub height_min: u16,
    pub height_max: u16,
    pub width_mean: f64,
    pub height_mean: f64,
    /// Total pixel bytes decoded.
    pub pixels_total: u64,
}

/// How one member of the corpus ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    /// Member identity (file path or buffer name).
    pub name: String,
    /// Samples decoded from this member.
    pub samples: u64,
    /// `ok` or `failed`.
    pub status: String,
    /// Error that ended the member, when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build a report with base fields filled and empty aggregates.
pub fn make_stub_report() -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "gntkit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        samples_total: 0,
        labels_total: 0,
        labels: vec![],
        dimensions: None,
        members: vec![],
        warnings: vec![],
    }
}
