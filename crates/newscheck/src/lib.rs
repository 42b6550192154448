//! # newscheck
//!
//! A small fake-news classifier: texts are normalized, turned into TF-IDF
//! features and scored by a logistic regression trained offline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use newscheck::Predictor;
//!
//! let predictor = Predictor::load("model_artifacts")?;
//!
//! let prediction = predictor.predict("Scientists confirm the moon is made of cheese")?;
//! println!(
//!     "{} ({:.2}%)",
//!     prediction.classification(predictor.threshold()),
//!     prediction.confidence(predictor.threshold())
//! );
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Training
//!
//! ```rust,no_run
//! use newscheck::{Dataset, training::{self, TrainingConfig}};
//!
//! let dataset = Dataset::from_csv("dataset.csv")?;
//! let trained = training::train(&dataset, &TrainingConfig::default())?;
//! println!("{}", trained.report);
//! trained.artifacts.save("model_artifacts")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "server")]
pub mod server;

mod data_loader;
mod error;
mod model;
mod pipeline;
pub mod training;

use std::path::Path;

pub use data_loader::Dataset;
pub use error::{NewsCheckError, Result};
pub use model::{
    Artifacts, CLASSIFICATION_THRESHOLD, CLASSIFIER_FILENAME, LinearModel, LogisticParams,
    VECTORIZER_FILENAME,
};
pub use newscheck_preprocessing::{TfidfVectorizer, VectorizerParams, preprocess_text};
pub use pipeline::{Classification, Prediction};

/// Loaded artifacts plus a decision threshold.
///
/// Immutable after construction, so a single instance can be shared across
/// request handlers behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Predictor {
    artifacts: Artifacts,
    threshold: f64,
}

impl Predictor {
    /// Create a predictor with the default classification threshold.
    #[must_use]
    pub fn new(artifacts: Artifacts) -> Self {
        Self {
            artifacts,
            threshold: CLASSIFICATION_THRESHOLD,
        }
    }

    /// Load artifacts from `dir` (see [`VECTORIZER_FILENAME`] and [`CLASSIFIER_FILENAME`]).
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        Artifacts::load(dir).map(Self::new)
    }

    /// Set a custom classification threshold.
    ///
    /// - If P(real) > threshold: classified as real
    /// - Otherwise: classified as fake
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Predict probabilities for a single text.
    ///
    /// Blank or whitespace-only text is rejected with [`NewsCheckError::EmptyInput`].
    pub fn predict<T: AsRef<str> + Sync>(&self, text: T) -> Result<Prediction> {
        if text.as_ref().trim().is_empty() {
            return Err(NewsCheckError::EmptyInput);
        }
        Ok(pipeline::predict(&self.artifacts, text))
    }

    /// Predict probabilities for multiple texts; fails if any of them is blank.
    pub fn predict_batch<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Result<Vec<Prediction>> {
        if texts.iter().any(|text| text.as_ref().trim().is_empty()) {
            return Err(NewsCheckError::EmptyInput);
        }
        Ok(pipeline::predict_batch(&self.artifacts, texts))
    }

    /// Classify a single text using the configured threshold.
    pub fn classify<T: AsRef<str> + Sync>(&self, text: T) -> Result<Classification> {
        self.predict(text)
            .map(|pred| pred.classification(self.threshold))
    }

    /// Classify multiple texts using the configured threshold.
    pub fn classify_batch<T: AsRef<str> + Sync>(
        &self,
        texts: &[T],
    ) -> Result<Vec<Classification>> {
        self.predict_batch(texts).map(|preds| {
            preds
                .into_iter()
                .map(|pred| pred.classification(self.threshold))
                .collect()
        })
    }
}
