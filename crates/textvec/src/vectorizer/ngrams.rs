use ahash::AHashMap as HashMap;
use dashmap::DashMap;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

/// Count every n-gram of the configured lengths in one tokenized document.
/// N-grams are space-joined token runs; windows longer than the document
/// produce nothing.
pub fn count_ngrams(tokens: &[String], ngram_range: (usize, usize)) -> HashMap<String, usize> {
    let (min_n, max_n) = ngram_range;
    let mut ngram_counter = HashMap::new();

    for n in min_n..=max_n {
        for window in tokens.windows(n) {
            *ngram_counter.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    ngram_counter
}

/// Build the document frequency table over a tokenized corpus: for each
/// n-gram, the number of documents containing it at least once.
pub fn document_frequencies(
    tokenized_texts: &[Vec<String>],
    ngram_range: (usize, usize),
) -> DashMap<String, usize, ahash::RandomState> {
    let vocab_df = DashMap::with_hasher(ahash::RandomState::default());

    tokenized_texts.par_iter().progress().for_each(|tokens| {
        for ngram in count_ngrams(tokens, ngram_range).into_keys() {
            vocab_df
                .entry(ngram)
                .and_modify(|df| *df += 1)
                .or_insert(1usize);
        }
    });
    vocab_df
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn unigram_counts() {
        let counts = count_ngrams(&toks("a b a"), (1, 1));
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn mixed_range_produces_unigrams_and_bigrams() {
        let counts = count_ngrams(&toks("a b c"), (1, 2));
        assert_eq!(counts.get("a b"), Some(&1));
        assert_eq!(counts.get("b c"), Some(&1));
        assert_eq!(counts.get("b"), Some(&1));
        assert_eq!(counts.len(), 5);
    }

    #[test]
    fn window_longer_than_document_is_empty() {
        assert!(count_ngrams(&toks("a b"), (3, 3)).is_empty());
    }

    #[test]
    fn document_frequency_counts_presence_not_occurrences() {
        let corpus = vec![toks("a a a b"), toks("a c"), toks("c")];
        let df = document_frequencies(&corpus, (1, 1));
        assert_eq!(*df.get("a").unwrap(), 2);
        assert_eq!(*df.get("b").unwrap(), 1);
        assert_eq!(*df.get("c").unwrap(), 2);
    }
}
