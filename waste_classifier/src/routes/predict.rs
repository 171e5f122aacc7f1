use crate::{
    advice::handling_tip,
    classifier::{Classifier, PredictError, Prediction},
    preprocess::{decode_upload, PreprocessError},
    server::{ModelStatus, SharedState},
    view::{Page, Preview, ResultView},
};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
        Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use thiserror::Error;
use tracing::instrument;

const IMAGE_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum PredictImageError {
    #[error("{0}")]
    ModelUnavailable(String),
    #[error(transparent)]
    Upload(#[from] PreprocessError),
    #[error("invalid form data: {0}")]
    Form(String),
    #[error("upload is too large: {0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Prediction(#[from] PredictError),
    #[error("prediction task failed: {0}")]
    Task(String),
}

impl From<MultipartError> for PredictImageError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            PredictImageError::PayloadTooLarge(err.body_text())
        } else {
            PredictImageError::Form(err.body_text())
        }
    }
}

impl From<MultipartRejection> for PredictImageError {
    fn from(rejection: MultipartRejection) -> Self {
        PredictImageError::Form(rejection.body_text())
    }
}

impl From<BytesRejection> for PredictImageError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            PredictImageError::PayloadTooLarge(rejection.body_text())
        } else {
            PredictImageError::Form(rejection.body_text())
        }
    }
}

impl PredictImageError {
    fn status(&self) -> StatusCode {
        match self {
            PredictImageError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PredictImageError::Upload(PreprocessError::EmptyUpload) => StatusCode::BAD_REQUEST,
            PredictImageError::Upload(PreprocessError::UnsupportedFormat) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            PredictImageError::Upload(PreprocessError::Decode(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictImageError::Form(_) => StatusCode::BAD_REQUEST,
            PredictImageError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PredictImageError::Prediction(_) | PredictImageError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn user_message(&self) -> String {
        format!("An error occurred during prediction: {}", self)
    }
}

#[derive(Error, Debug)]
#[error("failed to render page: {0}")]
pub struct RenderError(#[from] minijinja::Error);

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for PredictImageError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.user_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct LabelProbability {
    pub label: String,
    pub probability: f32,
}

#[derive(Serialize)]
pub struct PredictionResponse {
    pub label: String,
    pub index: usize,
    pub probability: Option<f32>,
    pub probabilities: Vec<LabelProbability>,
    pub tip: &'static str,
}

impl PredictionResponse {
    fn new(prediction: Prediction, classifier: &Classifier) -> Self {
        let probabilities = classifier
            .vocabulary()
            .labels()
            .iter()
            .zip(&prediction.probabilities)
            .map(|(label, probability)| LabelProbability {
                label: label.clone(),
                probability: *probability,
            })
            .collect();

        Self {
            probability: prediction.top_probability(),
            tip: handling_tip(&prediction.label),
            index: prediction.index,
            label: prediction.label,
            probabilities,
        }
    }
}

/// Decodes the upload and runs the classifier on the blocking pool.
async fn classify(
    state: &SharedState,
    image_data: Bytes,
) -> Result<(Arc<Classifier>, Prediction), PredictImageError> {
    let classifier = match &state.model {
        ModelStatus::Ready(classifier) => classifier.clone(),
        ModelStatus::Unavailable(reason) => {
            return Err(PredictImageError::ModelUnavailable(reason.to_string()))
        }
    };

    let started = Instant::now();
    let task_classifier = classifier.clone();
    let prediction = tokio::task::spawn_blocking(move || {
        let image = decode_upload(&image_data)?;
        Ok::<_, PredictImageError>(task_classifier.predict(&image)?)
    })
    .await
    .map_err(|e| PredictImageError::Task(e.to_string()))??;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    state.metrics.record_prediction(&prediction.label, elapsed_ms);
    tracing::info!(
        label = %prediction.label,
        probability = prediction.top_probability().unwrap_or_default(),
        elapsed_ms,
        "Image classified"
    );

    Ok((classifier, prediction))
}

async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Bytes, PredictImageError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(PreprocessError::EmptyUpload.into())
}

fn preview_of(image_data: &[u8]) -> Option<Preview> {
    let format = image::guess_format(image_data).ok()?;
    Some(Preview::new(format.to_mime_type(), image_data))
}

/// Form submission from the page. Errors are rendered inline so a new image
/// can be uploaded right away.
#[instrument(skip(state, multipart))]
pub async fn predict_form(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RenderError> {
    let mut preview = None;
    let outcome = match read_image_field(multipart).await {
        Ok(image_data) => {
            preview = preview_of(&image_data);
            classify(&state, image_data).await
        }
        Err(err) => Err(err),
    };

    let (status, page) = match outcome {
        Ok((classifier, prediction)) => (
            StatusCode::OK,
            Page {
                result: Some(ResultView::new(&prediction, classifier.vocabulary())),
                preview,
                ..Default::default()
            },
        ),
        Err(PredictImageError::ModelUnavailable(reason)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Page {
                model_error: Some(reason),
                ..Default::default()
            },
        ),
        Err(err) => {
            tracing::warn!("Prediction failed: {}", err);
            state.metrics.record_failure("/predict");
            (
                err.status(),
                Page {
                    upload_error: Some(err.user_message()),
                    preview,
                    ..Default::default()
                },
            )
        }
    };

    let html = state.views.render(&page)?;
    Ok((status, Html(html)).into_response())
}

#[instrument(skip(state, image_data))]
pub async fn predict_api(
    State(state): State<SharedState>,
    image_data: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>, PredictImageError> {
    let outcome = match image_data {
        Ok(image_data) => classify(&state, image_data).await,
        Err(rejection) => Err(rejection.into()),
    };

    match outcome {
        Ok((classifier, prediction)) => Ok(Json(PredictionResponse::new(prediction, &classifier))),
        Err(err) => {
            tracing::warn!("Prediction failed: {}", err);
            state.metrics.record_failure("/api/predict");
            Err(err)
        }
    }
}
