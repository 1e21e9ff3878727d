use std::borrow::Cow;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator, ProgressStyle};
use rayon::prelude::*;
use tracing::debug;

/// Minimum number of texts to consider parallelization
const MIN_TEXTS_FOR_PARALLEL: usize = 100;

/// Minimum total character count to consider parallelization
const MIN_CHARS_FOR_PARALLEL: usize = 10_000;

fn progress_bar_setup(len: usize, message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb
}

/// Lower-cases the document, treats every non-alphabetic character as
/// whitespace, and splits into word tokens.
fn tokenize_document(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

fn tokenize_texts_par<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using parallel tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts in parallel");
    let result = texts
        .par_iter()
        .progress_with(pb.clone())
        .map(|text| tokenize_document(text.as_ref()))
        .collect();
    pb.finish_with_message("Parallel tokenization complete");
    result
}

fn tokenize_texts<T: AsRef<str>>(texts: &[T]) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using sequential tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts");
    let result = texts
        .iter()
        .progress_with(pb.clone())
        .map(|text| tokenize_document(text.as_ref()))
        .collect();
    pb.finish_with_message("Tokenization complete");
    result
}

/// Determine if parallel processing should be used based on workload characteristics.
///
/// Parallelization is beneficial when:
/// - There are many texts (>= 100), OR
/// - The total character count is large (>= 10,000 chars)
///
/// This heuristic balances thread spawning overhead against tokenization work.
#[inline]
fn should_use_parallel<T: AsRef<str>>(texts: &[T]) -> bool {
    let num_texts = texts.len();

    // If we have many texts, always parallelize
    if num_texts >= MIN_TEXTS_FOR_PARALLEL {
        return true;
    }

    // For fewer texts, check total workload
    // Sample first few to estimate average length if we have many
    let total_chars: usize = if num_texts > 20 {
        // Estimate based on first 20 texts to avoid iterating all
        let sample_chars: usize = texts.iter().take(20).map(|s| s.as_ref().len()).sum();
        (sample_chars * num_texts) / 20 // estimated total
    } else {
        texts.iter().map(|s| s.as_ref().len()).sum()
    };

    total_chars >= MIN_CHARS_FOR_PARALLEL
}

pub fn tokenize<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<Vec<String>> {
    if should_use_parallel(texts) {
        tokenize_texts_par(texts)
    } else {
        tokenize_texts(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_non_alphabetic() {
        assert_eq!(
            tokenize_document("The CAT, sat; on 3 mats!"),
            vec!["the", "cat", "sat", "on", "mats"]
        );
    }

    #[test]
    fn digits_and_punctuation_become_separators() {
        assert_eq!(tokenize_document("a1b2c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize_document("don't"), vec!["don", "t"]);
    }

    #[test]
    fn empty_and_symbol_only_documents_yield_no_tokens() {
        assert!(tokenize_document("").is_empty());
        assert!(tokenize_document("123 !?$ 456").is_empty());
    }

    #[test]
    fn batch_tokenization_preserves_document_order() {
        let texts = ["one two", "", "Three"];
        assert_eq!(
            tokenize(&texts),
            vec![vec!["one".to_string(), "two".to_string()], vec![], vec!["three".to_string()]]
        );
    }
}
