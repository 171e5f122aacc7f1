use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub model: ModelConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Location of the classifier artifact and the preprocessing it expects.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub onnx_file: String,
    #[serde(default = "default_labels_file")]
    pub labels_file: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_mean")]
    pub mean: [f32; 3],
    #[serde(default = "default_std")]
    pub std: [f32; 3],
    /// Set to false when the graph already ends with a softmax layer.
    #[serde(default = "default_apply_softmax")]
    pub apply_softmax: bool,
}

fn default_labels_file() -> String {
    "labels.txt".into()
}

fn default_output_name() -> String {
    "output".into()
}

fn default_input_size() -> u32 {
    224
}

fn default_mean() -> [f32; 3] {
    [0.485, 0.456, 0.406]
}

fn default_std() -> [f32; 3] {
    [0.229, 0.224, 0.225]
}

fn default_apply_softmax() -> bool {
    true
}

impl ModelConfig {
    pub fn new(model_dir: impl AsRef<Path>, onnx_file: &str) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            onnx_file: onnx_file.to_string(),
            labels_file: default_labels_file(),
            output_name: default_output_name(),
            input_size: default_input_size(),
            mean: default_mean(),
            std: default_std(),
            apply_softmax: default_apply_softmax(),
        }
    }

    pub fn get_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.onnx_file)
    }

    pub fn get_labels_path(&self) -> PathBuf {
        self.model_dir.join(&self.labels_file)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.input_size == 0 {
            return Err("model.input_size must be greater than 0".to_string());
        }
        if let Some(s) = self.std.iter().find(|s| **s <= 0.0 || !s.is_finite()) {
            return Err(format!("model.std values must be positive, got {}", s));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("model.mean values must be finite".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no working directory: {}", e)))?;

    load_configuration(&base_path.join("configuration"))
}

/// Layers `base.yaml`, the `APP_ENVIRONMENT` file and `APP_*` overrides.
pub fn load_configuration(configuration_directory: &Path) -> Result<Config, config::ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;
    config.model.validate().map_err(config::ConfigError::Message)?;

    Ok(config)
}
