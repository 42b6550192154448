use std::path::Path;

use argmin::{
    core::{CostFunction, Error as ArgminError, Executor, Gradient, State},
    solver::{linesearch::MoreThuenteLineSearch, quasinewton::LBFGS},
};
use sprs::{CsMat, CsVecView};
use tracing::{debug, info};

use crate::{
    error::{NewsCheckError, Result},
    pipeline::Classification,
};

/// Number of correction pairs kept by L-BFGS.
const LBFGS_HISTORY: usize = 7;
/// Stop once the gradient norm falls below this.
const GRADIENT_TOLERANCE: f64 = 1e-6;
/// Stop once an iteration improves the loss by less than this.
const COST_TOLERANCE: f64 = 1e-12;

/// Logistic regression hyper-parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogisticParams {
    /// L2 regularization strength.
    pub alpha: f64,
    pub max_iterations: u64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iterations: 100,
        }
    }
}

/// A fitted binary linear classifier over TF-IDF features.
///
/// `probability` is always P(real).
#[derive(Clone, Debug, PartialEq, bincode::Encode, bincode::Decode)]
pub struct LinearModel {
    weights: Vec<f64>,
    intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^x)` without overflow.
fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// L2-regularized log loss over the rows of a CSR matrix.
///
/// The parameter vector is the weights followed by the intercept, which is
/// not regularized. Targets are `+1` for real and `-1` for fake.
struct LogisticLoss<'a> {
    features: &'a CsMat<f64>,
    targets: Vec<f64>,
    alpha: f64,
}

impl LogisticLoss<'_> {
    fn margins(&self, params: &[f64]) -> Vec<f64> {
        let (weights, intercept) = params.split_at(self.features.cols());
        let intercept = intercept.first().copied().unwrap_or(0.0);
        self.features
            .outer_iterator()
            .zip(&self.targets)
            .map(|(row, &y)| {
                let z = row.iter().map(|(col, &x)| weights[col] * x).sum::<f64>() + intercept;
                y * z
            })
            .collect()
    }
}

impl CostFunction for LogisticLoss<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        let data_loss = self.margins(params).into_iter().map(|m| softplus(-m)).sum::<f64>();
        let penalty = params[..self.features.cols()].iter().map(|w| w * w).sum::<f64>();
        Ok(data_loss + 0.5 * self.alpha * penalty)
    }
}

impl Gradient for LogisticLoss<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> std::result::Result<Self::Gradient, ArgminError> {
        let n_features = self.features.cols();
        let mut grad = params.iter().map(|p| self.alpha * p).collect::<Vec<_>>();
        grad[n_features] = 0.0;

        for ((row, &y), margin) in self
            .features
            .outer_iterator()
            .zip(&self.targets)
            .zip(self.margins(params))
        {
            let coef = -y * sigmoid(-margin);
            for (col, &x) in row.iter() {
                grad[col] += coef * x;
            }
            grad[n_features] += coef;
        }
        Ok(grad)
    }
}

impl LinearModel {
    #[must_use]
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Fit an L2-regularized logistic regression on the rows of a CSR matrix.
    ///
    /// Loss and gradient are evaluated on the sparse rows directly, so memory
    /// grows with the number of non-zeros plus one weight per feature.
    pub fn fit(
        features: &CsMat<f64>,
        labels: &[Classification],
        params: LogisticParams,
    ) -> Result<Self> {
        if features.rows() != labels.len() {
            return Err(NewsCheckError::LengthMismatch {
                texts: features.rows(),
                labels: labels.len(),
            });
        }
        if !features.is_csr() {
            return Err(NewsCheckError::Fit("feature matrix must be CSR".to_string()));
        }
        if let Some(&only) = labels.first() {
            if labels.iter().all(|&label| label == only) {
                return Err(NewsCheckError::SingleClass(only));
            }
        } else {
            return Err(NewsCheckError::EmptyDataset);
        }
        debug!(
            rows = features.rows(),
            cols = features.cols(),
            nnz = features.nnz(),
            alpha = params.alpha,
            max_iterations = params.max_iterations,
            "Fitting logistic regression"
        );

        let n_features = features.cols();
        let loss = LogisticLoss {
            features,
            targets: labels
                .iter()
                .map(|label| if label.is_real() { 1.0 } else { -1.0 })
                .collect(),
            alpha: params.alpha,
        };
        let solver = LBFGS::new(MoreThuenteLineSearch::new(), LBFGS_HISTORY)
            .with_tolerance_grad(GRADIENT_TOLERANCE)
            .and_then(|solver| solver.with_tolerance_cost(COST_TOLERANCE))
            .map_err(|e| NewsCheckError::Fit(e.to_string()))?;
        let result = Executor::new(loss, solver)
            .configure(|state| {
                state
                    .param(vec![0.0; n_features + 1])
                    .max_iters(params.max_iterations)
            })
            .run()
            .map_err(|e| NewsCheckError::Fit(e.to_string()))?;

        let state = result.state();
        let mut weights = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| NewsCheckError::Fit("solver returned no parameters".to_string()))?;
        let intercept = weights.pop().unwrap_or(0.0);
        info!(
            num_features = weights.len(),
            intercept,
            iterations = state.get_iter(),
            loss = state.get_best_cost(),
            "Logistic regression fitted"
        );

        Ok(Self { weights, intercept })
    }

    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Raw linear score `w · x + b` of one sparse row.
    pub fn decision_function(&self, row: CsVecView<'_, f64>) -> f64 {
        row.iter()
            .map(|(col_idx, &value)| self.weights.get(col_idx).map_or(0.0, |w| w * value))
            .sum::<f64>()
            + self.intercept
    }

    /// P(real) for one sparse row, in `[0, 1]`.
    pub fn probability(&self, row: CsVecView<'_, f64>) -> f64 {
        sigmoid(self.decision_function(row))
    }

    /// P(real) for every row of `features`.
    pub fn predict_probabilities(&self, features: &CsMat<f64>) -> Vec<f64> {
        features
            .outer_iterator()
            .map(|row| self.probability(row))
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (model, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?).map_err(|e| NewsCheckError::io(path, e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| NewsCheckError::io(path, e))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_matrix(rows: &[&[(usize, f64)]], cols: usize) -> CsMat<f64> {
        let mut tri = sprs::TriMat::new((rows.len(), cols));
        for (r, entries) in rows.iter().enumerate() {
            for &(c, v) in entries.iter() {
                tri.add_triplet(r, c, v);
            }
        }
        tri.to_csr()
    }

    #[test]
    fn test_sigmoid_is_bounded_and_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!(sigmoid(-745.0) >= 0.0);
    }

    #[test]
    fn test_probability_uses_weights_and_intercept() {
        let model = LinearModel::new(vec![2.0, -1.0, 0.5], -0.25);
        let x = row_matrix(&[&[(0, 1.0), (2, 0.5)]], 3);
        let z: f64 = 2.0 + 0.25 - 0.25;
        let p = model.probability(x.outer_view(0).unwrap());
        assert!((p - 1.0 / (1.0 + (-z).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_empty_row_scores_intercept_only() {
        let model = LinearModel::new(vec![3.0, 3.0], 0.0);
        let x = row_matrix(&[&[]], 2);
        assert!((model.predict_probabilities(&x)[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_fit_separates_classes() {
        // column 0 marks real, column 1 marks fake
        let mut rows: Vec<&[(usize, f64)]> = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..10 {
            rows.push(&[(0, 1.0), (2, 0.2)]);
            labels.push(Classification::Real);
            rows.push(&[(1, 1.0), (2, 0.2)]);
            labels.push(Classification::Fake);
        }
        let x = row_matrix(&rows, 3);
        let model = LinearModel::fit(&x, &labels, LogisticParams::default()).unwrap();
        assert_eq!(model.num_features(), 3);
        assert!(model.weights()[0] > model.weights()[1]);

        let probs = model.predict_probabilities(&x);
        for (p, label) in probs.iter().zip(&labels) {
            match label {
                Classification::Real => assert!(*p > 0.5),
                Classification::Fake => assert!(*p < 0.5),
            }
        }
    }

    #[test]
    fn test_fit_rejects_single_class() {
        let x = row_matrix(&[&[(0, 1.0)], &[(0, 0.5)]], 1);
        let labels = [Classification::Fake, Classification::Fake];
        assert!(matches!(
            LinearModel::fit(&x, &labels, LogisticParams::default()),
            Err(NewsCheckError::SingleClass(Classification::Fake))
        ));
        assert!(matches!(
            LinearModel::fit(&x, &labels[..1], LogisticParams::default()),
            Err(NewsCheckError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_fit_scales_to_wide_sparse_matrices() {
        // 2 marker columns plus one private column per row; a dense copy would
        // need rows * cols * 8 bytes
        let rows = 400;
        let cols = 200_000;
        let mut tri = sprs::TriMat::new((rows, cols));
        let mut labels = Vec::with_capacity(rows);
        for r in 0..rows {
            let label = if r % 2 == 0 {
                Classification::Real
            } else {
                Classification::Fake
            };
            tri.add_triplet(r, usize::from(label), 0.8);
            tri.add_triplet(r, 2 + r * 97, 0.6);
            labels.push(label);
        }
        let x: CsMat<f64> = tri.to_csr();

        let model = LinearModel::fit(&x, &labels, LogisticParams::default()).unwrap();
        assert_eq!(model.num_features(), cols);
        let probs = model.predict_probabilities(&x);
        let correct = probs
            .iter()
            .zip(&labels)
            .filter(|(p, label)| (**p > 0.5) == label.is_real())
            .count();
        assert_eq!(correct, rows);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let x = row_matrix(&[&[(0, 1.0), (1, 0.5)], &[(1, 1.0)], &[(0, 0.3)]], 2);
        let loss = LogisticLoss {
            features: &x,
            targets: vec![1.0, -1.0, 1.0],
            alpha: 0.5,
        };
        let params = vec![0.2, -0.4, 0.1];
        let grad = loss.gradient(&params).unwrap();
        let eps = 1e-6;
        for i in 0..params.len() {
            let mut up = params.clone();
            up[i] += eps;
            let mut down = params.clone();
            down[i] -= eps;
            let numeric = (loss.cost(&up).unwrap() - loss.cost(&down).unwrap()) / (2.0 * eps);
            assert!((numeric - grad[i]).abs() < 1e-5, "param {i}: {numeric} vs {}", grad[i]);
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news_classifier.bin");
        let model = LinearModel::new(vec![0.1, -0.2, 0.3], 0.05);
        model.save(&path).unwrap();
        assert_eq!(LinearModel::load(&path).unwrap(), model);
        assert!(matches!(
            LinearModel::load(dir.path().join("missing.bin")),
            Err(NewsCheckError::Io { .. })
        ));
    }
}
