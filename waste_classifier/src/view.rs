use crate::{advice::handling_tip, classifier::Prediction, vocabulary::Vocabulary};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use minijinja::{context, Environment};
use serde::Serialize;

pub const TITLE: &str = "Waste Type Detection";
pub const DESCRIPTION: &str =
    "Upload a photo of waste to classify it and get tips on how to handle it.";

const INDEX_TEMPLATE: &str = "index.html";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassProbability {
    pub label: String,
    pub probability: String,
}

/// Prediction formatted for the result section of the page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultView {
    pub label: String,
    pub top_probability: String,
    pub probabilities: Vec<ClassProbability>,
    pub tip: &'static str,
}

impl ResultView {
    pub fn new(prediction: &Prediction, vocabulary: &Vocabulary) -> Self {
        let probabilities = vocabulary
            .labels()
            .iter()
            .zip(&prediction.probabilities)
            .map(|(label, probability)| ClassProbability {
                label: label.clone(),
                probability: format!("{:.4}", probability),
            })
            .collect();

        Self {
            label: prediction.label.clone(),
            top_probability: prediction
                .top_probability()
                .map(|p| format!("{:.4}", p))
                .unwrap_or_else(|| "n/a".to_string()),
            probabilities,
            tip: handling_tip(&prediction.label),
        }
    }
}

/// The uploaded image, embedded back into the page as a data URL.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub data_url: String,
}

impl Preview {
    pub fn new(mime: &str, bytes: &[u8]) -> Self {
        Self {
            data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        }
    }
}

/// Everything the page can show. Fields left `None` are not rendered.
#[derive(Debug, Default)]
pub struct Page {
    pub model_error: Option<String>,
    pub upload_error: Option<String>,
    pub preview: Option<Preview>,
    pub result: Option<ResultView>,
}

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, page: &Page) -> Result<String, minijinja::Error> {
        self.env.get_template(INDEX_TEMPLATE)?.render(context! {
            title => TITLE,
            description => DESCRIPTION,
            model_error => page.model_error,
            upload_error => page.upload_error,
            preview => page.preview,
            result => page.result,
        })
    }
}
