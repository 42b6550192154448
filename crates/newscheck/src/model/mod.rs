use std::path::Path;

use newscheck_preprocessing::TfidfVectorizer;
use tracing::info;

use crate::error::{NewsCheckError, Result};

mod linear;
mod threshold;

pub use linear::{LinearModel, LogisticParams};
pub use threshold::CLASSIFICATION_THRESHOLD;

pub const VECTORIZER_FILENAME: &str = "tfidf_vectorizer.bin";
pub const CLASSIFIER_FILENAME: &str = "news_classifier.bin";

/// The fitted vectorizer and classifier, always dimensionally consistent.
#[derive(Clone, Debug)]
pub struct Artifacts {
    vectorizer: TfidfVectorizer,
    model: LinearModel,
}

impl Artifacts {
    pub fn new(vectorizer: TfidfVectorizer, model: LinearModel) -> Result<Self> {
        if vectorizer.num_features() != model.num_features() {
            return Err(NewsCheckError::ArtifactMismatch {
                vectorizer_features: vectorizer.num_features(),
                model_features: model.num_features(),
            });
        }
        Ok(Self { vectorizer, model })
    }

    /// Load both artifacts from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let vectorizer_path = dir.join(VECTORIZER_FILENAME);
        let bytes =
            std::fs::read(&vectorizer_path).map_err(|e| NewsCheckError::io(&vectorizer_path, e))?;
        let vectorizer = TfidfVectorizer::from_bytes(&bytes)?;
        let model = LinearModel::load(dir.join(CLASSIFIER_FILENAME))?;
        info!(
            dir = %dir.display(),
            num_features = vectorizer.num_features(),
            "Loaded model artifacts"
        );
        Self::new(vectorizer, model)
    }

    /// Write both artifacts into `dir`, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| NewsCheckError::io(dir, e))?;
        let vectorizer_path = dir.join(VECTORIZER_FILENAME);
        std::fs::write(&vectorizer_path, self.vectorizer.to_bytes()?)
            .map_err(|e| NewsCheckError::io(&vectorizer_path, e))?;
        self.model.save(dir.join(CLASSIFIER_FILENAME))?;
        info!(dir = %dir.display(), "Saved model artifacts");
        Ok(())
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }
}
