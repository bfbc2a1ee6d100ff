pub mod frequency;

use serde::{Deserialize, Serialize};

pub use frequency::DocumentFrequency;

/// One trail description.
/// `lemmatized_text` is what gets vectorized; `raw_text` is carried for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub raw_text: Option<String>,
    pub lemmatized_text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, lemmatized_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: None,
            lemmatized_text: lemmatized_text.into(),
        }
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = Some(raw_text.into());
        self
    }
}

/// Ordered collection of documents.
/// A document's position is its row in every matrix built from the corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Build from bare lemmatized texts, ids are the row numbers.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Document::new(i.to_string(), text))
            .collect()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, row: usize) -> Option<&Document> {
        self.documents.get(row)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.documents.iter().map(|d| d.id.as_str())
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.documents.iter().map(|d| d.lemmatized_text.as_str())
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}
