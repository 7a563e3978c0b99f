//! Flat sample stream over an ordered set of GNT members.
//!
//! Members are opened one at a time and drained before the next one is
//! touched. A failure is yielded with the member's name attached; whether the
//! iteration then stops or moves on is controlled by [`ErrorPolicy`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::format::{DecodeError, DecoderOptions, RecordDecoder, Sample};
use crate::source::{MemberSource, SourceError};

/// What the corpus iterator does after a member fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Yield the error, then end the whole iteration.
    #[default]
    AbortCorpus,
    /// Yield the error, then continue with the next member.
    SkipSource,
}

#[derive(Debug, Error)]
pub enum CorpusErrorKind {
    #[error("{0}")]
    Open(SourceError),
    #[error("{0}")]
    Decode(DecodeError),
}

/// A member failure, tagged with the member's identity.
#[derive(Debug, Error)]
#[error("{member}: {kind}")]
pub struct CorpusError {
    pub member: String,
    pub kind: CorpusErrorKind,
}

impl CorpusError {
    /// Offset within the member, for decode failures.
    pub fn offset(&self) -> Option<u64> {
        match &self.kind {
            CorpusErrorKind::Decode(err) => Some(err.offset()),
            CorpusErrorKind::Open(_) => None,
        }
    }
}

/// Non-fatal decoder warning, tagged with the member it came from.
#[derive(Debug)]
pub struct CorpusWarning {
    pub member: String,
    pub warning: DecodeError,
}

/// How a member ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOutcome {
    pub member: String,
    pub samples: u64,
    /// `None` when the member was drained to a clean end-of-stream.
    pub error: Option<String>,
}

/// Ordered set of members plus the decoding configuration.
///
/// # Examples
/// ```
/// use gntkit_core::{Corpus, ErrorPolicy, MemorySource};
///
/// let record = vec![11, 0, 0, 0, 0xb0, 0xa1, 1, 0, 1, 0, 255];
/// let corpus = Corpus::new(vec![
///     MemorySource::new("a.gnt", record.clone()),
///     MemorySource::new("b.gnt", record),
/// ])
/// .with_policy(ErrorPolicy::SkipSource);
///
/// let labels: Vec<char> = corpus.iter().map(|s| s.unwrap().label).collect();
/// assert_eq!(labels, vec!['啊', '啊']);
/// ```
#[derive(Debug, Clone)]
pub struct Corpus<M> {
    members: Vec<M>,
    policy: ErrorPolicy,
    options: DecoderOptions,
}

impl<M: MemberSource> Corpus<M> {
    pub fn new(members: Vec<M>) -> Self {
        Self {
            members,
            policy: ErrorPolicy::default(),
            options: DecoderOptions::default(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_decoder_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Start a traversal from the first member. Each call reopens members.
    pub fn iter(&self) -> CorpusIter<'_, M> {
        CorpusIter {
            members: &self.members,
            policy: self.policy,
            options: self.options,
            index: 0,
            current: None,
            current_samples: 0,
            exhausted: false,
            outcomes: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<'a, M: MemberSource> IntoIterator for &'a Corpus<M> {
    type Item = Result<Sample, CorpusError>;
    type IntoIter = CorpusIter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy traversal over a [`Corpus`].
pub struct CorpusIter<'a, M: MemberSource> {
    members: &'a [M],
    policy: ErrorPolicy,
    options: DecoderOptions,
    index: usize,
    current: Option<RecordDecoder<M::Reader>>,
    current_samples: u64,
    exhausted: bool,
    outcomes: Vec<MemberOutcome>,
    warnings: Vec<CorpusWarning>,
}

impl<M: MemberSource> CorpusIter<'_, M> {
    /// Name of the member being decoded, if one is open.
    pub fn current_member(&self) -> Option<&str> {
        self.current.as_ref()?;
        self.members.get(self.index).map(|m| m.name())
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Members that have ended so far, in traversal order.
    pub fn outcomes(&self) -> &[MemberOutcome] {
        &self.outcomes
    }

    /// Length warnings from members that have ended so far.
    pub fn warnings(&self) -> &[CorpusWarning] {
        &self.warnings
    }

    fn finish_member(&mut self, name: &str, error: Option<String>) {
        if let Some(mut decoder) = self.current.take() {
            self.warnings
                .extend(decoder.take_warnings().into_iter().map(|warning| CorpusWarning {
                    member: name.to_string(),
                    warning,
                }));
        }
        self.outcomes.push(MemberOutcome {
            member: name.to_string(),
            samples: self.current_samples,
            error,
        });
        self.current_samples = 0;
        self.index += 1;
    }

    fn fail(&mut self, name: &str, kind: CorpusErrorKind) -> CorpusError {
        let error = CorpusError {
            member: name.to_string(),
            kind,
        };
        self.finish_member(name, Some(error.kind.to_string()));
        match self.policy {
            ErrorPolicy::AbortCorpus => self.exhausted = true,
            ErrorPolicy::SkipSource => warn!(member = name, error = %error.kind, "skipping member"),
        }
        error
    }
}

impl<M: MemberSource> Iterator for CorpusIter<'_, M> {
    type Item = Result<Sample, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        let members = self.members;
        loop {
            if self.exhausted {
                return None;
            }
            let Some(member) = members.get(self.index) else {
                self.exhausted = true;
                return None;
            };

            let result = match self.current.as_mut() {
                Some(decoder) => decoder.decode_next(),
                None => {
                    match member.open() {
                        Ok(reader) => {
                            self.current = Some(RecordDecoder::with_options(reader, self.options));
                        }
                        Err(err) => {
                            return Some(Err(self.fail(member.name(), CorpusErrorKind::Open(err))));
                        }
                    }
                    continue;
                }
            };

            match result {
                Ok(Some(sample)) => {
                    self.current_samples += 1;
                    return Some(Ok(sample));
                }
                Ok(None) => {
                    debug!(
                        member = member.name(),
                        samples = self.current_samples,
                        "member drained"
                    );
                    self.finish_member(member.name(), None);
                }
                Err(err) => {
                    return Some(Err(self.fail(member.name(), CorpusErrorKind::Decode(err))));
                }
            }
        }
    }
}

impl<M: MemberSource> std::iter::FusedIterator for CorpusIter<'_, M> {}
