mod ort_service;
mod routes;

pub mod advice;
pub mod app;
pub mod classifier;
pub mod config;
pub mod loader;
pub mod model_service;
pub mod preprocess;
pub mod server;
pub mod telemetry;
pub mod view;
pub mod vocabulary;

pub use app::start_app;
