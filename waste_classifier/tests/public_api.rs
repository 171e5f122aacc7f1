use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use ndarray::Array4;
use std::sync::Arc;
use tower::ServiceExt;
use waste_classifier::{
    classifier::Classifier,
    model_service::{ModelError, ModelService},
    preprocess::Preprocessor,
    server::{build_router, ModelStatus, SharedState},
    telemetry::Metrics,
    view::Views,
    vocabulary::Vocabulary,
};

struct ConstantModel;

impl ModelService for ConstantModel {
    fn infer(&self, _input: &Array4<f32>) -> Result<Vec<f32>, ModelError> {
        Ok(vec![0.0, 3.0])
    }
}

fn shared_state(model: ModelStatus) -> SharedState {
    SharedState {
        model,
        views: Arc::new(Views::new().unwrap()),
        metrics: Arc::new(Metrics::new().unwrap()),
    }
}

#[tokio::test]
async fn router_can_be_assembled_from_the_public_api() {
    let vocabulary = Vocabulary::new(vec!["glass".into(), "metal".into()]).unwrap();
    let classifier = Classifier::new(
        Arc::new(ConstantModel),
        vocabulary,
        Preprocessor::new(8, [0.485, 0.456, 0.406], [0.229, 0.224, 0.225]),
        true,
    );
    let router = build_router(shared_state(ModelStatus::Ready(Arc::new(classifier))), 1024);

    let response = router
        .oneshot(Request::get("/api/labels").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["labels"], serde_json::json!(["glass", "metal"]));
}

#[tokio::test]
async fn unavailable_model_reports_unhealthy() {
    let router = build_router(
        shared_state(ModelStatus::Unavailable(Arc::from("model not found"))),
        1024,
    );

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["model_loaded"], false);
}
