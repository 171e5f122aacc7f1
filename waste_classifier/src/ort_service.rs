use crate::{
    config::ModelConfig,
    model_service::{ModelError, ModelService},
};
use ndarray::Array4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::{path::Path, sync::Mutex};

pub struct OrtModelService {
    session: Mutex<Session>,
    output_name: String,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ort::Error> {
        let session = Self::build_session(&model_config.get_model_path())?;

        tracing::info!(
            "Created ONNX session from {}",
            model_config.get_model_path().display()
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name: model_config.output_name.clone(),
        })
    }

    fn build_session(path: &Path) -> Result<Session, ort::Error> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;
        Ok(session)
    }
}

impl ModelService for OrtModelService {
    fn infer(&self, input: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Poisoned(e.to_string()))?;

        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| ModelError::Tensor(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| ModelError::Output(self.output_name.clone(), "missing".into()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Output(self.output_name.clone(), e.to_string()))?;

        tracing::debug!("Model output shape {:?}", shape);

        Ok(data.to_vec())
    }
}

