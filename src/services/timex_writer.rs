//! Time mention renderer.
//!
//! Writes every sentence that contains at least one time mention, with each
//! mention replaced by `<timex>VALUE</timex>` when it normalizes and removed
//! entirely when it does not. Sentence numbers count every sentence in the
//! document, so skipped sentences leave gaps in the numbering.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Document, Span};
use crate::services::annotation::{AnnotationError, AnnotationOutput, Annotator};
use crate::services::timenorm::{ReferenceInstant, TemporalNormalizer};

/// Inline tag wrapped around normalized values.
pub const TIMEX_TAG: &str = "timex";

/// Appended to the document id to name the output file.
pub const OUTPUT_SUFFIX: &str = "_time_mentions.txt";

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A sentence with its 1-based position and the mentions it contains,
/// sorted by begin offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceGroup {
    pub index: usize,
    pub sentence: Span,
    pub mentions: Vec<Span>,
}

/// Assign time mentions to sentences.
///
/// Sentences are numbered by their position in begin order. A mention goes to
/// the first sentence that fully covers it; mentions outside every sentence
/// are dropped. Only sentences with at least one mention are returned.
pub fn group_by_sentence(doc: &Document) -> Vec<SentenceGroup> {
    let mut sentences = doc.sentences().to_vec();
    sentences.sort_by_key(|s| s.begin);

    let mut groups: Vec<SentenceGroup> = sentences
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| SentenceGroup {
            index: i + 1,
            sentence,
            mentions: Vec::new(),
        })
        .collect();

    for mention in doc.time_mentions() {
        match groups.iter_mut().find(|g| g.sentence.covers(mention)) {
            Some(group) => group.mentions.push(*mention),
            None => debug!("Time mention {} is outside every sentence, skipping", mention),
        }
    }

    groups.retain(|g| !g.mentions.is_empty());
    for group in &mut groups {
        group.mentions.sort_by_key(|m| m.begin);
    }
    groups
}

/// Renders time mentions to `<output_dir>/<id>_time_mentions.txt`.
pub struct TimexTextWriter {
    normalizer: Arc<dyn TemporalNormalizer>,
    reference: ReferenceInstant,
    output_dir: PathBuf,
}

impl TimexTextWriter {
    pub fn new(normalizer: Arc<dyn TemporalNormalizer>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            normalizer,
            reference: ReferenceInstant::Unanchored,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output file for a document.
    pub fn output_path(&self, doc: &Document) -> PathBuf {
        self.output_dir.join(format!("{}{}", doc.id(), OUTPUT_SUFFIX))
    }

    /// Sentence text with every mention spliced out or replaced by its tag.
    ///
    /// Newlines in the sentence become spaces. Mentions must be sorted by
    /// begin. Text before a mention is only copied when the cursor is behind
    /// it, and the cursor always moves to the mention's end, so the tail of
    /// an outer mention is copied again after a nested one.
    pub fn tagged_sentence(&self, doc: &Document, sentence: &Span, mentions: &[Span]) -> String {
        let text = doc.covered_text(sentence).replace('\n', " ");
        let base = doc.byte_offset(sentence.begin).unwrap_or(0);
        let local = |offset: usize| {
            doc.byte_offset(offset)
                .map(|b| b.saturating_sub(base).min(text.len()))
                .unwrap_or(text.len())
        };

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for mention in mentions {
            let begin = local(mention.begin);
            let end = local(mention.end);
            if cursor < begin {
                out.push_str(&text[cursor..begin]);
            }

            let raw = doc.covered_text(mention);
            match self.normalizer.normalize(raw, &self.reference) {
                Some(value) => {
                    out.push_str(&format!("<{tag}>{value}</{tag}>", tag = TIMEX_TAG));
                }
                None => debug!("Could not normalize {:?}, dropping it", raw),
            }
            cursor = end;
        }

        if cursor < text.len() {
            out.push_str(&text[cursor..]);
        }
        out
    }

    /// Write the rendered blocks for `doc` to `out`.
    pub fn render<W: Write>(&self, doc: &Document, out: &mut W) -> io::Result<()> {
        for group in group_by_sentence(doc) {
            write!(out, "\nSentence: {}\n\n", group.index)?;
            out.write_all(
                self.tagged_sentence(doc, &group.sentence, &group.mentions)
                    .as_bytes(),
            )?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Render `doc` into its output file.
    ///
    /// Content goes to a temporary file in the output directory that is only
    /// moved into place once fully written and flushed.
    pub fn write_file(&self, doc: &Document) -> Result<PathBuf, WriterError> {
        let path = self.output_path(doc);
        info!("Writing time mentions for {} to {}", doc.id(), path.display());

        fs::create_dir_all(&self.output_dir).map_err(|source| WriterError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let write_err = |source: io::Error| WriterError::Write {
            path: path.clone(),
            source,
        };

        let tmp = NamedTempFile::new_in(&self.output_dir).map_err(write_err)?;
        let mut writer = BufWriter::new(tmp);
        self.render(doc, &mut writer).map_err(write_err)?;
        let tmp = writer.into_inner().map_err(|e| write_err(e.into_error()))?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        info!("Finished writing {}", path.display());
        Ok(path)
    }
}

impl Annotator for TimexTextWriter {
    fn annotation_type(&self) -> &str {
        "timex"
    }

    fn display_name(&self) -> &str {
        "Timex Writer"
    }

    fn annotate(&self, doc: &mut Document) -> Result<AnnotationOutput, AnnotationError> {
        let path = self.write_file(doc)?;
        Ok(AnnotationOutput::Data(path.display().to_string()))
    }
}
