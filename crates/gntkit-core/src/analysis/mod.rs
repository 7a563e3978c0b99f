use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::corpus::{Corpus, CorpusError, ErrorPolicy};
use crate::format::DecoderOptions;
use crate::source::{GntFileSource, MemberSource};
use crate::{MemberSummary, Report, make_stub_report};

mod stats;

use stats::{DimensionStats, LabelStats};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),
}

/// Summarize a set of `.gnt` files.
pub fn analyze_gnt_files(
    paths: &[PathBuf],
    policy: ErrorPolicy,
    options: DecoderOptions,
) -> Result<Report, AnalysisError> {
    let members = paths.iter().cloned().map(GntFileSource::new).collect();
    let corpus = Corpus::new(members)
        .with_policy(policy)
        .with_decoder_options(options);
    analyze_corpus(&corpus)
}

/// Drain `corpus` and build a deterministic summary report.
///
/// Under `ErrorPolicy::AbortCorpus` the first member error is returned.
/// Under `ErrorPolicy::SkipSource` failed members are listed in the report
/// with their error and whatever samples preceded it are counted.
pub fn analyze_corpus<M: MemberSource>(corpus: &Corpus<M>) -> Result<Report, AnalysisError> {
    let mut labels = LabelStats::default();
    let mut dimensions = DimensionStats::default();
    let mut samples_total = 0u64;

    let mut iter = corpus.iter();
    for result in iter.by_ref() {
        match result {
            Ok(sample) => {
                samples_total += 1;
                labels.add(sample.label);
                dimensions.add(&sample);
            }
            Err(err) => {
                if corpus.policy() == ErrorPolicy::AbortCorpus {
                    return Err(err.into());
                }
            }
        }
    }

    let mut report = make_stub_report();
    report.samples_total = samples_total;
    report.labels = labels.build();
    report.labels_total = report.labels.len() as u64;
    report.dimensions = dimensions.build();
    report.members = iter
        .outcomes()
        .iter()
        .map(|outcome| MemberSummary {
            name: outcome.member.clone(),
            samples: outcome.samples,
            status: if outcome.error.is_some() {
                "failed".to_string()
            } else {
                "ok".to_string()
            },
            error: outcome.error.clone(),
        })
        .collect();
    report.warnings = iter
        .warnings()
        .iter()
        .map(|w| format!("{}: {}", w.member, w.warning))
        .collect();

    info!(
        members = report.members.len(),
        samples = report.samples_total,
        labels = report.labels_total,
        "corpus analysed"
    );
    Ok(report)
}
