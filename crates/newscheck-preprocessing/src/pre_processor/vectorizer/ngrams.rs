use ahash::HashMap;
use dashmap::DashMap;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

/// Vocabulary key: the n-gram's tokens joined by a single space.
pub type NgramKey = String;

/// Corpus-level statistics for a single vocabulary term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TermStats {
    /// Number of documents containing the term.
    pub doc_freq: usize,
    /// Total occurrences across the corpus.
    pub term_freq: usize,
}

pub fn count_ngrams(tokens: &[&str], ngram_range: &[usize]) -> HashMap<NgramKey, usize> {
    let mut ngram_counter = HashMap::default();

    for &n in ngram_range {
        for window in tokens.windows(n) {
            *ngram_counter.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    ngram_counter
}

pub fn build_vocabulary(
    ngram_maps: &[HashMap<NgramKey, usize>],
) -> DashMap<NgramKey, TermStats, ahash::RandomState> {
    let vocab_stats = DashMap::with_hasher(ahash::RandomState::default());

    ngram_maps.par_iter().progress().for_each(|ngrams| {
        for (ngram, &count) in ngrams {
            let mut stats = vocab_stats.entry(ngram.clone()).or_insert_with(TermStats::default);
            stats.doc_freq += 1;
            stats.term_freq += count;
        }
    });
    vocab_stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_unigrams_and_bigrams() {
        let tokens = ["fake", "news", "fake", "news"];
        let counts = count_ngrams(&tokens, &[1, 2]);
        assert_eq!(counts["fake"], 2);
        assert_eq!(counts["news"], 2);
        assert_eq!(counts["fake news"], 2);
        assert_eq!(counts["news fake"], 1);
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_ngram_longer_than_document_is_skipped() {
        let counts = count_ngrams(&["solo"], &[2]);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_build_vocabulary_tracks_document_and_term_frequency() {
        let docs = [
            count_ngrams(&["senate", "vote", "vote"], &[1]),
            count_ngrams(&["vote", "hoax"], &[1]),
        ];
        let vocab = build_vocabulary(&docs);
        assert_eq!(
            *vocab.get("vote").unwrap(),
            TermStats {
                doc_freq: 2,
                term_freq: 3
            }
        );
        assert_eq!(vocab.get("hoax").unwrap().doc_freq, 1);
        assert_eq!(vocab.len(), 3);
    }
}
