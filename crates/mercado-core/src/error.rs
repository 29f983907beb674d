use thiserror::Error;

/// Errors raised while loading configuration or fixture files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file: {0}")]
    SeedFileParse(#[from] serde_yaml::Error),

    #[error("seed validation failed: {0}")]
    Validation(String),
}

/// Domain validation errors for values crossing into the core types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("unknown product category: {0}")]
    UnknownCategory(String),

    #[error("unknown user role: {0}")]
    UnknownRole(String),

    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),
}
