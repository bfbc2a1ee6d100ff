use std::collections::HashSet;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::vectorizer::term::TermFrequency;

/// Stopword set handed to the vectorizer.
/// Words are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one word per line.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut words = HashSet::new();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            words.insert(word.to_lowercase());
        }
        Ok(Self { words })
    }

    pub fn insert(&mut self, word: &str) -> bool {
        self.words.insert(word.to_lowercase())
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }
}

/// Word tokenizer.
/// Splits on every character that is neither alphanumeric nor `_`
/// and keeps tokens of at least two characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    pub lowercase: bool,
    pub min_chars: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            lowercase: true,
            min_chars: 2,
        }
    }
}

impl Tokenizer {
    pub fn new(lowercase: bool) -> Self {
        Self {
            lowercase,
            ..Self::default()
        }
    }

    #[inline]
    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Tokenize `text`, dropping stopwords.
    pub fn tokenize(&self, text: &str, stop_words: &StopWords) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        text.split(|c: char| !Self::is_word_char(c))
            .filter(|tok| tok.chars().count() >= self.min_chars)
            .filter(|tok| !stop_words.contains(tok))
            .map(str::to_string)
            .collect()
    }

    /// Tokenize `text` straight into term counts.
    pub fn term_frequency(&self, text: &str, stop_words: &StopWords) -> TermFrequency {
        let mut freq = TermFrequency::new();
        freq.add_terms(&self.tokenize(text, stop_words));
        freq
    }
}
