use crate::{
    classifier::Classifier,
    config::ModelConfig,
    ort_service::OrtModelService,
    preprocess::Preprocessor,
    vocabulary::{Vocabulary, VocabularyError},
};
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("labels not found: {}", .0.display())]
    LabelsNotFound(PathBuf),
    #[error("failed to load labels: {0}")]
    Vocabulary(#[from] VocabularyError),
    #[error("failed to load model: {0}")]
    InvalidModel(#[from] ort::Error),
}

/// Reads the classifier artifact described by `config`. Nothing is retried.
pub fn load_classifier(config: &ModelConfig) -> Result<Classifier, LoadError> {
    let model_path = config.get_model_path();
    if !model_path.exists() {
        return Err(LoadError::ModelNotFound(model_path));
    }

    let labels_path = config.get_labels_path();
    if !labels_path.exists() {
        return Err(LoadError::LabelsNotFound(labels_path));
    }

    let vocabulary = Vocabulary::load(&labels_path)?;
    let model = OrtModelService::new(config)?;

    tracing::info!(
        "Loaded classifier with {} labels: {}",
        vocabulary.len(),
        vocabulary.labels().join(", ")
    );

    Ok(Classifier::new(
        Arc::new(model),
        vocabulary,
        Preprocessor::from_config(config),
        config.apply_softmax,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_model_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("labels.txt"), "cardboard\nglass\n").unwrap();
        let config = ModelConfig::new(dir.path(), "best_model.onnx");

        match load_classifier(&config) {
            Err(LoadError::ModelNotFound(path)) => {
                assert_eq!(path, dir.path().join("best_model.onnx"))
            }
            other => panic!("expected ModelNotFound, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_labels_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("best_model.onnx"), b"weights").unwrap();
        let config = ModelConfig::new(dir.path(), "best_model.onnx");

        assert!(matches!(
            load_classifier(&config),
            Err(LoadError::LabelsNotFound(_))
        ));
    }

    #[test]
    fn test_empty_labels_are_reported_before_the_model_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("best_model.onnx"), b"weights").unwrap();
        fs::write(dir.path().join("labels.txt"), "\n").unwrap();
        let config = ModelConfig::new(dir.path(), "best_model.onnx");

        assert!(matches!(
            load_classifier(&config),
            Err(LoadError::Vocabulary(VocabularyError::Empty))
        ));
    }

    #[test]
    fn test_corrupt_model_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("best_model.onnx"), b"\x00\x01corrupt").unwrap();
        fs::write(dir.path().join("labels.txt"), "cardboard\nglass\n").unwrap();
        let config = ModelConfig::new(dir.path(), "best_model.onnx");

        let err = load_classifier(&config).err().unwrap();

        assert!(matches!(err, LoadError::InvalidModel(_)));
        assert!(err.to_string().starts_with("failed to load model"));
    }
}
