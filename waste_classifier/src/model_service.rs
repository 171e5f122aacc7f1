use ndarray::Array4;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("session mutex poisoned: {0}")]
    Poisoned(String),
    #[error("failed to build tensor: {0}")]
    Tensor(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("failed to extract output `{0}`: {1}")]
    Output(String, String),
}

/// Runs the classifier graph on one preprocessed image and returns one raw
/// score per class, in vocabulary order.
pub trait ModelService: Send + Sync + 'static {
    fn infer(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError>;
}
