use std::collections::HashSet;

use crate::error::{Error, Result};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct VectorizerParams {
    /// Inclusive (min_n, max_n) range of n-gram lengths.
    ngram_range: (usize, usize),
    /// Minimum document frequency for keeping a token in the vocabulary.
    /// - If `min_df` is in [0.0, 1.0), it's a proportion of documents
    /// - If `min_df` >= 1.0, it's an absolute document count
    min_df: f64,
    /// Maximum document frequency for keeping a token in the vocabulary.
    /// - If `max_df` is in (0.0, 1.0], it's a proportion of documents
    /// - If `max_df` > 1.0, it's an absolute document count
    max_df: f64,
    /// Cap on vocabulary size, keeping the most frequent qualifying tokens.
    max_features: Option<usize>,
    /// Tokens always excluded from the token stream.
    stop_words: Option<HashSet<String>>,
}

impl VectorizerParams {
    pub fn new(ngram_range: (usize, usize), min_df: f64, max_df: f64) -> Self {
        Self {
            ngram_range,
            min_df,
            max_df,
            max_features: None,
            stop_words: None,
        }
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    #[must_use]
    pub fn with_stop_words<T: Into<String>>(mut self, stop_words: impl IntoIterator<Item = T>) -> Self {
        self.stop_words = Some(stop_words.into_iter().map(Into::into).collect());
        self
    }

    /// Check the options that do not depend on the corpus size.
    pub(crate) fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || max_n == 0 || min_n > max_n {
            return Err(Error::InvalidNgramRange {
                min: min_n,
                max: max_n,
            });
        }
        if self.min_df < 0.0 || self.max_df <= 0.0 || !self.min_df.is_finite() || !self.max_df.is_finite() {
            return Err(Error::InvalidDocumentFrequencies {
                min_df: self.min_df,
                max_df: self.max_df,
            });
        }
        Ok(())
    }

    /// Resolve the configured bounds into absolute document counts for a
    /// corpus of `n_docs` documents. Fails when the bounds cross over after
    /// normalization.
    pub(crate) fn df_bounds(&self, n_docs: usize) -> Result<(f64, f64)> {
        let n = n_docs as f64;
        let min_docs = if self.min_df < 1.0 {
            self.min_df * n
        } else {
            self.min_df
        };
        let max_docs = if self.max_df <= 1.0 {
            self.max_df * n
        } else {
            self.max_df
        };
        if min_docs > max_docs {
            return Err(Error::FlippedDocumentFrequencies {
                min_docs,
                max_docs,
                n_docs,
            });
        }
        Ok((min_docs, max_docs))
    }

    #[must_use]
    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    #[must_use]
    pub fn min_df(&self) -> f64 {
        self.min_df
    }

    #[must_use]
    pub fn max_df(&self) -> f64 {
        self.max_df
    }

    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    #[must_use]
    pub fn stop_words(&self) -> Option<&HashSet<String>> {
        self.stop_words.as_ref()
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram_range: (1, 1),
            min_df: 1.0,
            max_df: 1.0,
            max_features: None,
            stop_words: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_or_flipped_ngram_bounds() {
        assert!(VectorizerParams::new((0, 1), 1.0, 1.0).validate().is_err());
        assert!(VectorizerParams::new((1, 0), 1.0, 1.0).validate().is_err());
        assert!(VectorizerParams::new((3, 2), 1.0, 1.0).validate().is_err());
        assert!(VectorizerParams::new((1, 2), 1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn rejects_negative_frequencies() {
        assert!(VectorizerParams::new((1, 1), -0.1, 1.0).validate().is_err());
        assert!(VectorizerParams::new((1, 1), 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn normalizes_fractional_bounds_against_corpus_size() {
        let params = VectorizerParams::new((1, 1), 0.25, 0.75);
        let (min_docs, max_docs) = params.df_bounds(8).unwrap();
        assert!((min_docs - 2.0).abs() < f64::EPSILON);
        assert!((max_docs - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn absolute_and_fractional_bounds_mix() {
        // min_df 3 documents, max_df half the corpus of 4 -> flipped
        let params = VectorizerParams::new((1, 1), 3.0, 0.5);
        assert!(params.df_bounds(4).is_err());
        assert!(params.df_bounds(10).is_ok());
    }
}
