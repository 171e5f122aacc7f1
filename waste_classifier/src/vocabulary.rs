use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead},
    path::Path,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("failed to read labels: {0}")]
    Io(#[from] io::Error),
    #[error("labels file contains no labels")]
    Empty,
    #[error("duplicate label `{0}`")]
    Duplicate(String),
}

/// Ordered class labels; position `i` names output `i` of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<String>,
}

impl Vocabulary {
    pub fn new(labels: Vec<String>) -> Result<Self, VocabularyError> {
        if labels.is_empty() {
            return Err(VocabularyError::Empty);
        }
        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(VocabularyError::Duplicate(label.clone()));
            }
        }
        Ok(Self { labels })
    }

    /// One label per line, blank lines skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, VocabularyError> {
        let mut labels = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let label = line.trim();
            if !label.is_empty() {
                labels.push(label.to_string());
            }
        }
        Self::new(labels)
    }

    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let file = File::open(path)?;
        Self::from_reader(io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_reader_keeps_file_order() {
        let vocab = Vocabulary::from_reader(Cursor::new("cardboard\nglass\n\n  metal  \n")).unwrap();

        assert_eq!(vocab.labels(), &["cardboard", "glass", "metal"]);
        assert_eq!(vocab.get(2), Some("metal"));
        assert_eq!(vocab.get(3), None);
    }

    #[test]
    fn test_empty_and_duplicate_labels_are_rejected() {
        assert!(matches!(
            Vocabulary::from_reader(Cursor::new("\n\n")),
            Err(VocabularyError::Empty)
        ));
        assert!(matches!(
            Vocabulary::from_reader(Cursor::new("paper\npaper\n")),
            Err(VocabularyError::Duplicate(label)) if label == "paper"
        ));
    }
}
