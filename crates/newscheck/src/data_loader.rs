use std::{io::Read, path::Path};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::{NewsCheckError, Result},
    pipeline::Classification,
};

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    text: String,
    label: String,
}

/// Labeled news articles held fully in memory.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    texts: Vec<String>,
    labels: Vec<Classification>,
}

impl Dataset {
    /// Pair each text with its label; both vectors must have the same length.
    pub fn new(texts: Vec<String>, labels: Vec<Classification>) -> Result<Self> {
        if texts.len() != labels.len() {
            return Err(NewsCheckError::LengthMismatch {
                texts: texts.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { texts, labels })
    }

    /// Load a CSV file with a header row containing `text` and `label`.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| NewsCheckError::io(path, e))?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            records = dataset.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers()?.clone();

        let mut texts = Vec::new();
        let mut labels = Vec::new();
        for result in reader.records() {
            let row = result?;
            let line = row.position().map_or(0, csv::Position::line);
            let record: Record = row.deserialize(Some(&headers))?;
            let label = Classification::from_label_str(&record.label).ok_or_else(|| {
                NewsCheckError::InvalidLabel {
                    line,
                    value: record.label.clone(),
                }
            })?;
            if record.text.trim().is_empty() {
                warn!(line, "Record has empty text");
            }
            texts.push(record.text);
            labels.push(label);
        }
        Ok(Self { texts, labels })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn labels(&self) -> &[Classification] {
        &self.labels
    }

    /// Number of `(fake, real)` records.
    pub fn class_counts(&self) -> (usize, usize) {
        let real = self.labels.iter().filter(|label| label.is_real()).count();
        (self.labels.len() - real, real)
    }
}
