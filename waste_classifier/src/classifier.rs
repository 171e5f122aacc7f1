use crate::{
    model_service::{ModelError, ModelService},
    preprocess::Preprocessor,
    vocabulary::Vocabulary,
};
use image::RgbImage;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model returned {got} scores for a vocabulary of {expected} labels")]
    VocabularyMismatch { expected: usize, got: usize },
    #[error("model returned non-finite scores")]
    InvalidScores,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub index: usize,
    /// Aligned with the vocabulary order.
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// `None` when `index` does not point into `probabilities`.
    pub fn top_probability(&self) -> Option<f32> {
        self.probabilities.get(self.index).copied()
    }
}

pub struct Classifier {
    model: Arc<dyn ModelService>,
    vocabulary: Vocabulary,
    preprocessor: Preprocessor,
    apply_softmax: bool,
}

impl Classifier {
    pub fn new(
        model: Arc<dyn ModelService>,
        vocabulary: Vocabulary,
        preprocessor: Preprocessor,
        apply_softmax: bool,
    ) -> Self {
        Self {
            model,
            vocabulary,
            preprocessor,
            apply_softmax,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn predict(&self, image: &RgbImage) -> Result<Prediction, PredictError> {
        let input = self.preprocessor.to_tensor(image);
        let scores = self.model.infer(&input)?;

        if scores.len() != self.vocabulary.len() {
            return Err(PredictError::VocabularyMismatch {
                expected: self.vocabulary.len(),
                got: scores.len(),
            });
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(PredictError::InvalidScores);
        }

        let probabilities = if self.apply_softmax {
            softmax(&scores)
        } else {
            normalize(&scores).ok_or(PredictError::InvalidScores)?
        };
        let index = argmax(&probabilities).ok_or(PredictError::InvalidScores)?;
        let label = self
            .vocabulary
            .get(index)
            .ok_or(PredictError::InvalidScores)?
            .to_string();

        tracing::debug!(
            "Predicted {} (index {}) with probability {:.4}",
            label,
            index,
            probabilities[index]
        );

        Ok(Prediction {
            label,
            index,
            probabilities,
        })
    }
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Rescales scores that are already probabilities so they sum to one.
fn normalize(scores: &[f32]) -> Option<Vec<f32>> {
    if scores.iter().any(|s| *s < 0.0) {
        return None;
    }
    let sum: f32 = scores.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    Some(scores.iter().map(|s| s / sum).collect())
}

/// First index of the largest value.
fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .map(|(index, _)| index)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use ndarray::Array4;

    pub(crate) struct FixedScores(pub Vec<f32>);

    impl ModelService for FixedScores {
        fn infer(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
            assert_eq!(input.shape()[..2], [1, 3]);
            Ok(self.0.clone())
        }
    }

    pub(crate) fn waste_vocabulary() -> Vocabulary {
        Vocabulary::new(
            ["cardboard", "glass", "metal", "paper", "plastic", "trash"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    pub(crate) fn classifier_with_scores(scores: Vec<f32>) -> Classifier {
        Classifier::new(
            Arc::new(FixedScores(scores)),
            waste_vocabulary(),
            Preprocessor::new(8, [0.485, 0.456, 0.406], [0.229, 0.224, 0.225]),
            true,
        )
    }

    fn sample_image() -> RgbImage {
        ImageBuffer::from_pixel(16, 16, Rgb([120, 90, 60]))
    }

    #[test]
    fn test_predict_reports_argmax_and_full_distribution() {
        let classifier = classifier_with_scores(vec![4.0, 0.5, -1.0, 2.0, 1.0, 0.0]);

        let prediction = classifier.predict(&sample_image()).unwrap();

        assert_eq!(prediction.label, "cardboard");
        assert_eq!(prediction.index, 0);
        assert_eq!(prediction.probabilities.len(), 6);
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        let max = prediction
            .probabilities
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(prediction.top_probability(), Some(max));
    }

    #[test]
    fn test_predict_without_softmax_renormalizes() {
        let classifier = Classifier::new(
            Arc::new(FixedScores(vec![0.1, 0.1, 0.2, 0.2, 0.6, 0.8])),
            waste_vocabulary(),
            Preprocessor::new(8, [0.0; 3], [1.0; 3]),
            false,
        );

        let prediction = classifier.predict(&sample_image()).unwrap();

        assert_eq!(prediction.label, "trash");
        assert!((prediction.top_probability().unwrap() - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_predict_rejects_mismatched_output() {
        let classifier = classifier_with_scores(vec![1.0, 2.0]);

        assert!(matches!(
            classifier.predict(&sample_image()),
            Err(PredictError::VocabularyMismatch {
                expected: 6,
                got: 2
            })
        ));
    }

    #[test]
    fn test_predict_rejects_nan_scores() {
        let classifier = classifier_with_scores(vec![1.0, f32::NAN, 0.0, 0.0, 0.0, 0.0]);

        assert!(matches!(
            classifier.predict(&sample_image()),
            Err(PredictError::InvalidScores)
        ));
    }

    #[test]
    fn test_top_probability_out_of_range_is_none() {
        let prediction = Prediction {
            label: "glass".into(),
            index: 3,
            probabilities: vec![0.5, 0.5],
        };

        assert_eq!(prediction.top_probability(), None);
    }

    #[test]
    fn test_argmax_ties_resolve_to_first_index() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_softmax_is_stable_for_large_scores() {
        let probs = softmax(&[1000.0, 1000.0]);

        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }
}
