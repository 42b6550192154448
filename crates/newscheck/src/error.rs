use std::path::PathBuf;

use newscheck_preprocessing::PreprocessingError;
use thiserror::Error;

use crate::pipeline::Classification;

pub type Result<T> = std::result::Result<T, NewsCheckError>;

#[derive(Error, Debug)]
pub enum NewsCheckError {
    /// Blank or whitespace-only text submitted for classification.
    #[error("Empty input")]
    EmptyInput,

    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error("Failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid label {value:?} on line {line}: expected 0, 1, \"fake\" or \"real\"")]
    InvalidLabel { line: u64, value: String },

    #[error("Got {texts} texts but {labels} labels")]
    LengthMismatch { texts: usize, labels: usize },

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Dataset too small to split: {0} record(s), need at least 2")]
    DatasetTooSmall(usize),

    #[error("Training split only contains {0} examples; both classes are required")]
    SingleClass(Classification),

    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("Model fitting failed: {0}")]
    Fit(String),

    #[error(
        "Artifact mismatch: vectorizer produces {vectorizer_features} features but the classifier expects {model_features}"
    )]
    ArtifactMismatch {
        vectorizer_features: usize,
        model_features: usize,
    },

    #[error("Failed to encode artifact: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode artifact: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl NewsCheckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
