//! Annotated document model.
//!
//! A document is the note text plus the span layers an upstream pipeline
//! attached to it (sentences, event mentions, time mentions) and a single
//! source-metadata record that carries the resolved document creation time.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::span::{Span, SpanKind};

/// Errors raised while building, loading or saving a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{kind} span {begin}..{end} is outside the document text (length {len})")]
    SpanOutOfBounds {
        kind: SpanKind,
        begin: usize,
        end: usize,
        len: usize,
    },

    #[error("Failed to read or write document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid document JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-document source metadata. Holds the normalized `YYYY-MM-DD` DCT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_date: Option<String>,
}

/// On-disk JSON shape of an annotated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFile {
    pub source_uri: PathBuf,
    pub text: String,
    #[serde(default)]
    pub sentences: Vec<Span>,
    #[serde(default)]
    pub event_mentions: Vec<Span>,
    #[serde(default)]
    pub time_mentions: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_metadata: Option<SourceMetadata>,
}

/// A single annotated document.
///
/// All spans held by a `Document` are guaranteed to lie inside its text, so
/// `covered_text` never has to re-check bounds for them.
#[derive(Debug, Clone)]
pub struct Document {
    source_uri: PathBuf,
    text: String,
    /// Byte offset of every char boundary; `len() == char count + 1`.
    boundaries: Vec<usize>,
    source_metadata: Option<SourceMetadata>,
    sentences: Vec<Span>,
    event_mentions: Vec<Span>,
    time_mentions: Vec<Span>,
}

impl Document {
    /// Create a document with no annotations.
    pub fn new(source_uri: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let boundaries = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        Self {
            source_uri: source_uri.into(),
            text,
            boundaries,
            source_metadata: None,
            sentences: Vec::new(),
            event_mentions: Vec::new(),
            time_mentions: Vec::new(),
        }
    }

    /// Load a document from its JSON file.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: DocumentFile = serde_json::from_str(&raw).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(file)
    }

    /// Save the document (including any resolved metadata) as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let json = serde_json::to_string_pretty(&self.to_file()).map_err(|source| {
            DocumentError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, json).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(file: DocumentFile) -> Result<Self, DocumentError> {
        let mut doc = Self::new(file.source_uri, file.text);
        doc.source_metadata = file.source_metadata;
        for span in file.sentences {
            doc.add_sentence(span)?;
        }
        for span in file.event_mentions {
            doc.add_event_mention(span)?;
        }
        for span in file.time_mentions {
            doc.add_time_mention(span)?;
        }
        Ok(doc)
    }

    pub fn to_file(&self) -> DocumentFile {
        DocumentFile {
            source_uri: self.source_uri.clone(),
            text: self.text.clone(),
            sentences: self.sentences.clone(),
            event_mentions: self.event_mentions.clone(),
            time_mentions: self.time_mentions.clone(),
            source_metadata: self.source_metadata.clone(),
        }
    }

    /// Document identifier: the source file name without directory or extension.
    pub fn id(&self) -> String {
        base_name(&self.source_uri)
    }

    pub fn source_uri(&self) -> &Path {
        &self.source_uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte offset of a character offset, if it lies within the text.
    pub fn byte_offset(&self, char_offset: usize) -> Option<usize> {
        self.boundaries.get(char_offset).copied()
    }

    /// Text covered by a span. Spans outside the text cover nothing.
    pub fn covered_text(&self, span: &Span) -> &str {
        match (self.byte_offset(span.begin), self.byte_offset(span.end)) {
            (Some(begin), Some(end)) if begin <= end => &self.text[begin..end],
            _ => "",
        }
    }

    pub fn sentences(&self) -> &[Span] {
        &self.sentences
    }

    pub fn event_mentions(&self) -> &[Span] {
        &self.event_mentions
    }

    pub fn time_mentions(&self) -> &[Span] {
        &self.time_mentions
    }

    pub fn add_sentence(&mut self, span: Span) -> Result<(), DocumentError> {
        self.check_bounds(SpanKind::Sentence, &span)?;
        self.sentences.push(span);
        Ok(())
    }

    pub fn add_event_mention(&mut self, span: Span) -> Result<(), DocumentError> {
        self.check_bounds(SpanKind::EventMention, &span)?;
        self.event_mentions.push(span);
        Ok(())
    }

    pub fn add_time_mention(&mut self, span: Span) -> Result<(), DocumentError> {
        self.check_bounds(SpanKind::TimeMention, &span)?;
        self.time_mentions.push(span);
        Ok(())
    }

    /// Swap in a new event mention collection, returning the previous one.
    pub fn replace_event_mentions(&mut self, mentions: Vec<Span>) -> Result<Vec<Span>, DocumentError> {
        for span in &mentions {
            self.check_bounds(SpanKind::EventMention, span)?;
        }
        Ok(std::mem::replace(&mut self.event_mentions, mentions))
    }

    pub fn source_metadata(&self) -> Option<&SourceMetadata> {
        self.source_metadata.as_ref()
    }

    /// Metadata record, created on first access.
    pub fn source_metadata_mut(&mut self) -> &mut SourceMetadata {
        self.source_metadata.get_or_insert_with(SourceMetadata::default)
    }

    /// The resolved document creation time, if any pass has set one.
    pub fn original_date(&self) -> Option<&str> {
        self.source_metadata
            .as_ref()
            .and_then(|m| m.original_date.as_deref())
    }

    fn check_bounds(&self, kind: SpanKind, span: &Span) -> Result<(), DocumentError> {
        let len = self.char_len();
        if span.begin > span.end || span.end > len {
            return Err(DocumentError::SpanOutOfBounds {
                kind,
                begin: span.begin,
                end: span.end,
                len,
            });
        }
        Ok(())
    }
}

/// File name with directory and final extension removed.
pub(crate) fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
