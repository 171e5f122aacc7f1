use super::predict::RenderError;
use crate::{
    server::{ModelStatus, SharedState},
    view::Page,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::Serialize;

pub async fn index(State(state): State<SharedState>) -> Result<Response, RenderError> {
    let (status, page) = match &state.model {
        ModelStatus::Ready(_) => (StatusCode::OK, Page::default()),
        ModelStatus::Unavailable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Page {
                model_error: Some(reason.to_string()),
                ..Default::default()
            },
        ),
    };

    let html = state.views.render(&page)?;
    Ok((status, Html(html)).into_response())
}

#[derive(Serialize)]
pub struct Labels {
    labels: Vec<String>,
}

pub async fn labels(State(state): State<SharedState>) -> Response {
    match &state.model {
        ModelStatus::Ready(classifier) => Json(Labels {
            labels: classifier.vocabulary().labels().to_vec(),
        })
        .into_response(),
        ModelStatus::Unavailable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody { error: reason }),
        )
            .into_response(),
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}
