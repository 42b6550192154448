use std::borrow::Cow;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::debug;

/// Minimum number of texts to consider parallelization
const MIN_TEXTS_FOR_PARALLEL: usize = 100;

/// Minimum total character count to consider parallelization
const MIN_CHARS_FOR_PARALLEL: usize = 10_000;

/// Progress bar in the style used for every long-running corpus pass.
pub fn progress_bar_setup(len: usize, message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb
}

fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn tokenize_texts_par<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<Vec<&str>> {
    debug!(num_texts = texts.len(), "Using parallel tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts in parallel");
    let result = texts
        .par_iter()
        .progress_with(pb.clone())
        .map(|text| split_words(text.as_ref()))
        .collect();
    pb.finish_with_message("Parallel tokenization complete");
    result
}

fn tokenize_texts<T: AsRef<str>>(texts: &[T]) -> Vec<Vec<&str>> {
    debug!(num_texts = texts.len(), "Using sequential tokenization");
    texts.iter().map(|text| split_words(text.as_ref())).collect()
}

/// Determine if parallel processing should be used based on workload characteristics.
///
/// Parallelization is beneficial when:
/// - There are many texts (>= 100), OR
/// - The total character count is large (>= 10,000 chars)
#[inline]
pub(super) fn should_use_parallel<T: AsRef<str>>(texts: &[T]) -> bool {
    let num_texts = texts.len();

    if num_texts >= MIN_TEXTS_FOR_PARALLEL {
        return true;
    }

    // Estimate from the first 20 texts when there are more than that
    let total_chars: usize = if num_texts > 20 {
        let sample_chars: usize = texts.iter().take(20).map(|s| s.as_ref().len()).sum();
        (sample_chars * num_texts) / 20
    } else {
        texts.iter().map(|s| s.as_ref().len()).sum()
    };

    total_chars >= MIN_CHARS_FOR_PARALLEL
}

/// Split already-normalized texts into word tokens.
///
/// Only corpus-sized workloads with `parallel` set fan out to rayon and show a
/// progress bar.
pub fn tokenize<T: AsRef<str> + Sync>(texts: &[T], parallel: bool) -> Vec<Vec<&str>> {
    if parallel {
        tokenize_texts_par(texts)
    } else {
        tokenize_texts(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_on_whitespace() {
        let texts = ["senator election  fraud", "", "vaccine"];
        let tokens = tokenize(&texts, false);
        assert_eq!(
            tokens,
            vec![vec!["senator", "election", "fraud"], vec![], vec!["vaccine"]]
        );
    }

    #[test]
    fn test_parallel_heuristic() {
        let few = vec!["short"; 5];
        assert!(!should_use_parallel(&few));
        let many = vec!["short"; MIN_TEXTS_FOR_PARALLEL];
        assert!(should_use_parallel(&many));
        let long = vec!["x".repeat(MIN_CHARS_FOR_PARALLEL)];
        assert!(should_use_parallel(&long));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let texts: Vec<String> = (0..150).map(|i| format!("term{} shared", i % 7)).collect();
        assert_eq!(tokenize_texts_par(&texts), tokenize_texts(&texts));
    }
}
