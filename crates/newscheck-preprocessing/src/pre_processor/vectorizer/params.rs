use std::ops::RangeInclusive;

use crate::error::{PreprocessingError, Result};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorizerParams {
    ngram_range: Vec<usize>,
    /// Minimum document frequency for filtering vocabulary.
    /// - If `min_df` is in (0.0, 1.0), it's a proportion of documents
    /// - If `min_df` >= 1.0, it's an absolute document count
    min_df: f64,
    /// Maximum document frequency for filtering vocabulary.
    /// - If `max_df` is in (0.0, 1.0], it's a proportion of documents
    /// - If `max_df` > 1.0, it's an absolute document count
    max_df: f64,
    /// Apply sublinear tf scaling: replace term frequency `tf` with `1 + log(tf)`.
    /// This reduces the impact of terms that occur many times in a document.
    sublinear_tf: bool,
    /// Keep only the `max_features` terms with the highest corpus frequency.
    max_features: Option<usize>,
}

impl VectorizerParams {
    pub fn new(
        ngram_range: impl Into<RangeInclusive<usize>>,
        min_df: f64,
        max_df: f64,
        sublinear_tf: bool,
    ) -> Result<Self> {
        let params = Self {
            ngram_range: ngram_range.into().collect(),
            min_df,
            max_df,
            sublinear_tf,
            max_features: None,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check every field; run again when a vectorizer is fitted.
    pub fn validate(&self) -> Result<()> {
        if self.ngram_range.first().is_none_or(|&n| n == 0) {
            return Err(PreprocessingError::InvalidParams(
                "ngram_range must be non-empty and start at 1 or above".to_string(),
            ));
        }
        if !(self.min_df > 0.0) {
            return Err(PreprocessingError::InvalidParams(format!(
                "min_df must be positive (proportion in (0.0, 1.0) or absolute count >= 1.0), got {}",
                self.min_df
            )));
        }
        if !(self.max_df > 0.0) {
            return Err(PreprocessingError::InvalidParams(format!(
                "max_df must be positive (proportion in (0.0, 1.0] or absolute count > 1.0), got {}",
                self.max_df
            )));
        }
        if self.max_features == Some(0) {
            return Err(PreprocessingError::InvalidParams(
                "max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the maximum document frequency. Checked by [`Self::validate`] at fit time.
    #[must_use]
    pub fn with_max_df(mut self, max_df: f64) -> Self {
        self.max_df = max_df;
        self
    }

    /// Cap the vocabulary at `max_features` terms.
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Result<Self> {
        self.max_features = max_features;
        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn ngram_counts(&self) -> &[usize] {
        &self.ngram_range
    }

    #[must_use]
    pub fn ngram_range(&self) -> (usize, usize) {
        // Non-empty by construction.
        (
            self.ngram_range[0],
            self.ngram_range[self.ngram_range.len() - 1],
        )
    }

    #[must_use]
    pub fn min_df(&self) -> f64 {
        self.min_df
    }

    #[must_use]
    pub fn max_df(&self) -> f64 {
        self.max_df
    }

    #[must_use]
    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }

    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Resolve `(min_df, max_df)` into inclusive absolute document counts for a
    /// corpus of `n_docs` documents.
    #[must_use]
    pub fn document_frequency_bounds(&self, n_docs: usize) -> (f64, f64) {
        let n_docs = n_docs as f64;
        let min_count = if self.min_df < 1.0 {
            self.min_df * n_docs
        } else {
            self.min_df
        };
        let max_count = if self.max_df <= 1.0 {
            self.max_df * n_docs
        } else {
            self.max_df
        };
        (min_count, max_count)
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram_range: vec![1],
            min_df: 1.0,
            max_df: 1.0,
            sublinear_tf: false,
            max_features: None,
        }
    }
}
