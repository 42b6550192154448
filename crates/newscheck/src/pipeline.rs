use core::fmt;

use newscheck_preprocessing::preprocess_text;
use tracing::debug;

use crate::model::Artifacts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Classification {
    Fake,
    Real,
}

impl Classification {
    /// Human-readable label returned by the HTTP endpoint.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fake => "FAKE NEWS",
            Self::Real => "REAL NEWS",
        }
    }

    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real)
    }

    #[must_use]
    pub fn is_fake(&self) -> bool {
        matches!(self, Self::Fake)
    }

    /// Parse a dataset label: `0`/`1` or `fake`/`real` in any case.
    #[must_use]
    pub fn from_label_str(value: &str) -> Option<Self> {
        let value = value.trim();
        if value == "0" || value.eq_ignore_ascii_case("fake") {
            Some(Self::Fake)
        } else if value == "1" || value.eq_ignore_ascii_case("real") {
            Some(Self::Real)
        } else {
            None
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Classification> for usize {
    fn from(class: Classification) -> Self {
        match class {
            Classification::Fake => 0,
            Classification::Real => 1,
        }
    }
}

/// Struct to hold prediction probabilities
/// 0: P(fake), 1: P(real)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction(f64, f64);

impl Prediction {
    #[must_use]
    pub fn from_real_probability(real_prob: f64) -> Self {
        let real_prob = real_prob.clamp(0.0, 1.0);
        Self(1.0 - real_prob, real_prob)
    }

    #[must_use]
    pub fn fake_probability(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn real_probability(&self) -> f64 {
        self.1
    }

    #[must_use]
    pub fn probability_of(&self, class: Classification) -> f64 {
        match class {
            Classification::Fake => self.0,
            Classification::Real => self.1,
        }
    }

    #[inline]
    #[must_use]
    pub fn classification(&self, threshold: f64) -> Classification {
        if self.1 > threshold {
            Classification::Real
        } else {
            Classification::Fake
        }
    }

    /// Probability of the class chosen at `threshold`, as a percentage rounded
    /// to two decimals.
    #[must_use]
    pub fn confidence(&self, threshold: f64) -> f64 {
        let prob = self.probability_of(self.classification(threshold));
        (prob * 100.0 * 100.0).round() / 100.0
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P(fake)={:.3}, P(real)={:.3}", self.0, self.1)
    }
}

pub fn predict<T: AsRef<str> + Sync>(artifacts: &Artifacts, input: T) -> Prediction {
    predict_batch(artifacts, &[input])
        .pop()
        .unwrap_or_else(|| Prediction::from_real_probability(0.5))
}

pub fn predict_batch<T: AsRef<str> + Sync>(artifacts: &Artifacts, inputs: &[T]) -> Vec<Prediction> {
    let processed = inputs
        .iter()
        .map(|text| preprocess_text(text.as_ref()))
        .collect::<Vec<_>>();
    let features = artifacts.vectorizer().transform(&processed);
    debug!(
        num_texts = inputs.len(),
        non_zero = features.nnz(),
        "Scoring vectorized texts"
    );
    artifacts
        .model()
        .predict_probabilities(&features)
        .into_iter()
        .map(Prediction::from_real_probability)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Classification::Real.to_string(), "REAL NEWS");
        assert_eq!(Classification::Fake.to_string(), "FAKE NEWS");
        assert_eq!(usize::from(Classification::Real), 1);
        assert_eq!(usize::from(Classification::Fake), 0);
    }

    #[test]
    fn test_parse_dataset_labels() {
        assert_eq!(Classification::from_label_str("1"), Some(Classification::Real));
        assert_eq!(Classification::from_label_str(" 0 "), Some(Classification::Fake));
        assert_eq!(Classification::from_label_str("REAL"), Some(Classification::Real));
        assert_eq!(Classification::from_label_str("Fake"), Some(Classification::Fake));
        assert_eq!(Classification::from_label_str("2"), None);
        assert_eq!(Classification::from_label_str(""), None);
    }

    #[test]
    fn test_classification_threshold_is_strict() {
        assert_eq!(
            Prediction::from_real_probability(0.5).classification(0.5),
            Classification::Fake
        );
        assert_eq!(
            Prediction::from_real_probability(0.51).classification(0.5),
            Classification::Real
        );
        assert_eq!(
            Prediction::from_real_probability(0.8).classification(0.9),
            Classification::Fake
        );
    }

    #[test]
    fn test_confidence_rounds_to_two_decimals() {
        let prediction = Prediction::from_real_probability(0.876_54);
        assert!((prediction.confidence(0.5) - 87.65).abs() < 1e-9);
        let prediction = Prediction::from_real_probability(0.123_456);
        assert!((prediction.confidence(0.5) - 87.65).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_always_within_bounds() {
        for i in 0..=1000 {
            let p = f64::from(i) / 1000.0;
            for threshold in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let confidence = Prediction::from_real_probability(p).confidence(threshold);
                assert!((0.0..=100.0).contains(&confidence), "{confidence}");
            }
        }
        let clamped = Prediction::from_real_probability(1.7);
        assert!((clamped.real_probability() - 1.0).abs() < f64::EPSILON);
    }
}
