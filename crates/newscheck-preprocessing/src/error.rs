use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreprocessingError>;

#[derive(Error, Debug)]
pub enum PreprocessingError {
    #[error("Invalid vectorizer parameters: {0}")]
    InvalidParams(String),

    /// Every term was pruned by the document-frequency bounds, or the corpus
    /// contained no tokens at all.
    #[error("Empty vocabulary: no terms remain after pruning (documents may only contain stopwords)")]
    EmptyVocabulary,

    #[cfg(feature = "bincode")]
    #[error("Failed to encode vectorizer: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[cfg(feature = "bincode")]
    #[error("Failed to decode vectorizer: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
