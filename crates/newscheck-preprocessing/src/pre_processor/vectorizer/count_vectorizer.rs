use ahash::HashMap;
use rayon::prelude::*;
use sprs::CsMat;
use tracing::debug;

use super::{
    ngrams::{self, NgramKey},
    params::VectorizerParams,
    tokenizer,
};
use crate::error::{PreprocessingError, Result};

/// Fitting walks the whole corpus; transforming serves requests and stays on
/// the calling thread without a progress bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Fit,
    Transform,
}

impl Phase {
    fn is_parallel<T: AsRef<str>>(self, texts: &[T]) -> bool {
        self == Self::Fit && tokenizer::should_use_parallel(texts)
    }
}

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    /// Vocabulary mapping n-gram to feature index, indices assigned in sorted term order
    vocab: HashMap<NgramKey, usize>,
}

impl CountVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Result<Self> {
        debug!(num_texts = texts.len(), "Fitting CountVectorizer");
        params.validate()?;
        let ngram_maps = Self::count_documents(texts, &params, Phase::Fit);
        Self::fit_from_counts(&ngram_maps, params)
    }

    /// Tokenize and count n-grams for every document.
    fn count_documents<T: AsRef<str> + Sync>(
        texts: &[T],
        params: &VectorizerParams,
        phase: Phase,
    ) -> Vec<HashMap<NgramKey, usize>> {
        let parallel = phase.is_parallel(texts);
        let tokenized_texts = tokenizer::tokenize(texts, parallel);
        let ngram_range = params.ngram_counts();
        if parallel {
            tokenized_texts
                .par_iter()
                .map(|tokens| ngrams::count_ngrams(tokens, ngram_range))
                .collect()
        } else {
            tokenized_texts
                .iter()
                .map(|tokens| ngrams::count_ngrams(tokens, ngram_range))
                .collect()
        }
    }

    /// Build the vocabulary from per-document n-gram counts.
    fn fit_from_counts(
        ngram_maps: &[HashMap<NgramKey, usize>],
        params: VectorizerParams,
    ) -> Result<Self> {
        debug!("Building vocabulary from n-gram counts");
        let vocab_stats = ngrams::build_vocabulary(ngram_maps);
        let vocab_size = vocab_stats.len();

        let (min_count, max_count) = params.document_frequency_bounds(ngram_maps.len());
        debug!(min_count, max_count, "Applying document frequency filtering");
        let mut kept = vocab_stats
            .into_iter()
            .filter(|(_, stats)| {
                let df = stats.doc_freq as f64;
                df >= min_count && df <= max_count
            })
            .collect::<Vec<_>>();
        debug!(
            original_size = vocab_size,
            filtered_size = kept.len(),
            "Vocabulary filtered by document frequency"
        );

        if let Some(max_features) = params.max_features() {
            if kept.len() > max_features {
                kept.sort_by(|(a_term, a), (b_term, b)| {
                    b.term_freq.cmp(&a.term_freq).then_with(|| a_term.cmp(b_term))
                });
                kept.truncate(max_features);
                debug!(max_features, "Vocabulary truncated to most frequent terms");
            }
        }

        if kept.is_empty() {
            return Err(PreprocessingError::EmptyVocabulary);
        }

        let mut sorted_terms = kept.into_iter().map(|(term, _)| term).collect::<Vec<_>>();
        sorted_terms.sort();
        let vocab = sorted_terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect::<HashMap<NgramKey, usize>>();

        debug!(vocab_size = vocab.len(), "CountVectorizer fitting complete");

        Ok(Self { params, vocab })
    }

    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let ngram_maps = Self::count_documents(texts, &self.params, Phase::Transform);
        self.transform_from_counts(&ngram_maps)
    }

    /// Assemble a CSR count matrix from per-document n-gram counts.
    fn transform_from_counts(&self, ngram_maps: &[HashMap<NgramKey, usize>]) -> CsMat<f64> {
        let mut indptr = Vec::with_capacity(ngram_maps.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);

        for ngrams in ngram_maps {
            let mut row_entries = ngrams
                .iter()
                .filter_map(|(ngram_key, &count)| {
                    self.vocab
                        .get(ngram_key)
                        .map(|&col_idx| (col_idx, count as f64))
                })
                .collect::<Vec<_>>();

            row_entries.sort_by_key(|(col_idx, _)| *col_idx);
            for (col_idx, count) in row_entries {
                indices.push(col_idx);
                data.push(count);
            }
            indptr.push(indices.len());
        }

        debug!(
            non_zero_entries = data.len(),
            "Text transformation complete"
        );
        CsMat::new(
            (ngram_maps.len(), self.num_features()),
            indptr,
            indices,
            data,
        )
    }

    /// Fit and transform while counting n-grams only once.
    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<(Self, CsMat<f64>)> {
        debug!(
            num_texts = texts.len(),
            "fit_transform: tokenizing and computing n-grams once"
        );
        params.validate()?;
        let ngram_maps = Self::count_documents(texts, &params, Phase::Fit);
        let vectorizer = Self::fit_from_counts(&ngram_maps, params)?;
        let transformed = vectorizer.transform_from_counts(&ngram_maps);
        Ok((vectorizer, transformed))
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    /// Mapping of term to feature index.
    pub fn vocabulary(&self) -> &HashMap<NgramKey, usize> {
        &self.vocab
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }
}
