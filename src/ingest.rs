//! Corpus loading.
//!
//! Record numbers in [`AnalysisError::Ingest`] are 1-based data rows;
//! `0` points at the header.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::vectorizer::corpus::{Corpus, Document};

/// Anything that can produce a corpus.
pub trait CorpusSource {
    fn load(&self) -> Result<Corpus>;
}

impl CorpusSource for Corpus {
    fn load(&self) -> Result<Corpus> {
        Ok(self.clone())
    }
}

/// CSV file with a header row, one trail description per record.
#[derive(Debug, Clone)]
pub struct CsvCorpusSource {
    pub path: PathBuf,
    /// text that gets vectorized, required on every record
    pub lemmatized_column: String,
    /// document id; the record number when unset
    pub id_column: Option<String>,
    /// untouched description, read when the column exists
    pub text_column: String,
}

impl CsvCorpusSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lemmatized_column: "lemmatized_text".to_string(),
            id_column: None,
            text_column: "description".to_string(),
        }
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    pub fn with_lemmatized_column(mut self, column: impl Into<String>) -> Self {
        self.lemmatized_column = column.into();
        self
    }

    /// Parse CSV from any reader using this source's column layout.
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Corpus> {
        let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let lemma_idx = require_column(&headers, &self.lemmatized_column)?;
        let id_idx = match &self.id_column {
            Some(name) => Some(require_column(&headers, name)?),
            None => None,
        };
        let text_idx = column(&headers, &self.text_column);
        debug!(?lemma_idx, ?id_idx, ?text_idx, "Resolved CSV columns");

        let mut corpus = Corpus::new();
        for (i, record) in rdr.records().enumerate() {
            let row = i + 1;
            let record = record?;
            let lemmatized = field(&record, lemma_idx, row, &self.lemmatized_column)?;
            if lemmatized.trim().is_empty() {
                return Err(AnalysisError::Ingest {
                    row,
                    message: format!("empty '{}' field", self.lemmatized_column),
                });
            }
            let id = match (id_idx, &self.id_column) {
                (Some(idx), Some(name)) => field(&record, idx, row, name)?.to_string(),
                _ => i.to_string(),
            };

            let mut document = Document::new(id, lemmatized);
            if let Some(raw) = text_idx.and_then(|idx| record.get(idx)) {
                document = document.with_raw_text(raw);
            }
            corpus.push(document);
        }
        Ok(corpus)
    }
}

impl CorpusSource for CsvCorpusSource {
    fn load(&self) -> Result<Corpus> {
        let corpus = self.load_from_reader(File::open(&self.path)?)?;
        info!(path = %self.path.display(), documents = corpus.len(), "Loaded corpus");
        Ok(corpus)
    }
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn require_column(headers: &StringRecord, name: &str) -> Result<usize> {
    column(headers, name).ok_or_else(|| AnalysisError::Ingest {
        row: 0,
        message: format!("missing column '{name}'"),
    })
}

fn field<'r>(record: &'r StringRecord, idx: usize, row: usize, name: &str) -> Result<&'r str> {
    record.get(idx).ok_or_else(|| AnalysisError::Ingest {
        row,
        message: format!("record has no '{name}' field"),
    })
}
