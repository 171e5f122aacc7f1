use crate::server::SharedState;
use axum::{extract::State, response::IntoResponse, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Status {
    status: String,
    model_loaded: bool,
}

pub async fn healthcheck(State(state): State<SharedState>) -> impl IntoResponse {
    let model_loaded = state.model.is_ready();
    let status = if model_loaded { "Available" } else { "Unavailable" };

    Json(Status {
        status: status.into(),
        model_loaded,
    })
}
