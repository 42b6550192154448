//! Offline training: preprocess, vectorize, split, fit, evaluate.

use core::fmt;

use indicatif::ParallelProgressIterator;
use newscheck_preprocessing::{
    TfidfVectorizer, VectorizerParams, preprocess_text, progress_bar_setup,
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;
use sprs::CsMat;
use tracing::{debug, info};

use crate::{
    data_loader::Dataset,
    error::{NewsCheckError, Result},
    model::{Artifacts, CLASSIFICATION_THRESHOLD, LinearModel, LogisticParams},
    pipeline::{Classification, Prediction},
};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_MAX_DF: f64 = 0.7;

#[derive(Clone, Debug)]
pub struct TrainingConfig {
    pub vectorizer: VectorizerParams,
    pub logistic: LogisticParams,
    /// Fraction of records held out for evaluation, in (0, 1).
    pub test_size: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerParams::default().with_max_df(DEFAULT_MAX_DF),
            logistic: LogisticParams::default(),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

/// Held-out evaluation of a fitted model; "positive" means real news.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EvaluationReport {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl EvaluationReport {
    pub fn from_predictions(truth: &[Classification], predicted: &[Classification]) -> Self {
        let mut report = Self::default();
        for (actual, guess) in truth.iter().zip(predicted) {
            match (actual, guess) {
                (Classification::Real, Classification::Real) => report.true_positive += 1,
                (Classification::Fake, Classification::Real) => report.false_positive += 1,
                (Classification::Fake, Classification::Fake) => report.true_negative += 1,
                (Classification::Real, Classification::Fake) => report.false_negative += 1,
            }
        }
        report
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (precision, recall) = (self.precision(), self.recall());
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model Accuracy: {}", self.accuracy())?;
        writeln!(
            f,
            "Precision: {:.4}  Recall: {:.4}  F1: {:.4}",
            self.precision(),
            self.recall(),
            self.f1()
        )?;
        write!(
            f,
            "Confusion (real=positive): TP={} FP={} TN={} FN={}",
            self.true_positive, self.false_positive, self.true_negative, self.false_negative
        )
    }
}

/// Result of a training run.
#[derive(Clone, Debug)]
pub struct TrainedClassifier {
    pub artifacts: Artifacts,
    pub report: EvaluationReport,
    pub train_size: usize,
    pub test_size: usize,
}

/// Shuffle `0..n` with a seeded RNG and split it into `(train, test)` indices.
///
/// The test split holds `ceil(n * test_size)` rows, clamped so both splits are
/// non-empty.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(NewsCheckError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    if n < 2 {
        return Err(NewsCheckError::DatasetTooSmall(n));
    }
    let n_test = ((n as f64 * test_size).ceil() as usize).clamp(1, n - 1);

    let mut indices = (0..n).collect::<Vec<_>>();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Copy the given rows of a CSR matrix, in order, into a new matrix.
pub fn select_rows(matrix: &CsMat<f64>, rows: &[usize]) -> CsMat<f64> {
    let mut indptr = Vec::with_capacity(rows.len() + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);
    for &row in rows {
        if let Some(view) = matrix.outer_view(row) {
            for (col_idx, &value) in view.iter() {
                indices.push(col_idx);
                data.push(value);
            }
        }
        indptr.push(indices.len());
    }
    CsMat::new((rows.len(), matrix.cols()), indptr, indices, data)
}

fn preprocess_corpus(texts: &[String]) -> Vec<String> {
    let pb = progress_bar_setup(texts.len(), "Preprocessing texts");
    let processed = texts
        .par_iter()
        .progress_with(pb.clone())
        .map(|text| preprocess_text(text))
        .collect();
    pb.finish_with_message("Preprocessing complete");
    processed
}

/// Fit the vectorizer and classifier on `dataset` and evaluate on a held-out split.
pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainedClassifier> {
    if dataset.is_empty() {
        return Err(NewsCheckError::EmptyDataset);
    }
    let (fake, real) = dataset.class_counts();
    info!(records = dataset.len(), fake, real, "Starting training");

    let processed = preprocess_corpus(dataset.texts());
    let (vectorizer, features) = TfidfVectorizer::fit_transform(&processed, config.vectorizer.clone())?;
    info!(num_features = vectorizer.num_features(), "Vectorizer fitted");

    let (train_rows, test_rows) = train_test_split(dataset.len(), config.test_size, config.seed)?;
    debug!(
        train = train_rows.len(),
        test = test_rows.len(),
        seed = config.seed,
        "Split dataset"
    );

    let labels = dataset.labels();
    let train_labels = train_rows.iter().map(|&i| labels[i]).collect::<Vec<_>>();

    let model = LinearModel::fit(
        &select_rows(&features, &train_rows),
        &train_labels,
        config.logistic,
    )?;

    let test_labels = test_rows.iter().map(|&i| labels[i]).collect::<Vec<_>>();
    let predicted = model
        .predict_probabilities(&select_rows(&features, &test_rows))
        .into_iter()
        .map(|p| Prediction::from_real_probability(p).classification(CLASSIFICATION_THRESHOLD))
        .collect::<Vec<_>>();
    let report = EvaluationReport::from_predictions(&test_labels, &predicted);
    info!(accuracy = report.accuracy(), f1 = report.f1(), "Evaluation complete");

    Ok(TrainedClassifier {
        artifacts: Artifacts::new(vectorizer, model)?,
        report,
        train_size: train_rows.len(),
        test_size: test_rows.len(),
    })
}
