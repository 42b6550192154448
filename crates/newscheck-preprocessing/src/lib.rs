//! Text normalization and TF-IDF vectorization shared by newscheck training
//! and inference.

mod error;
pub mod pre_processor;

pub use error::{PreprocessingError, Result};
pub use pre_processor::{
    TfidfVectorizer, VectorizerParams, preprocess_text, progress_bar_setup,
};
