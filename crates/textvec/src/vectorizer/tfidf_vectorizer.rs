use sprs::{CsMat, CsVecView};
use tracing::debug;

use super::{count_vectorizer::CountVectorizer, params::VectorizerParams};
use crate::error::{Error, Result};

/// TF-IDF vectorizer: a fitted [`CountVectorizer`] plus smoothed inverse
/// document frequencies, with L2-normalized output rows.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Result<Self> {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, _) = CountVectorizer::fit_transform(texts, params)?;
        Self::from_counts(count_vectorizer)
    }

    /// Derive IDF weights from an already fitted [`CountVectorizer`].
    ///
    /// Fails with [`Error::NotFitted`] when the vectorizer carries no
    /// document frequency table (it was built from a user-supplied
    /// vocabulary rather than fitted on a corpus).
    pub fn from_counts(count_vectorizer: CountVectorizer) -> Result<Self> {
        let df = count_vectorizer
            .document_frequencies()
            .ok_or(Error::NotFitted)?;

        debug!(num_features = df.len(), "Calculating IDF values");
        // Smoothed IDF: ln((1 + n_docs) / (1 + df)) + 1. The +1 terms keep
        // the quotient finite for df = 0 and df = n_docs.
        let n_docs = count_vectorizer.n_docs() as f64;
        let idf = df
            .iter()
            .map(|&doc_freq| ((n_docs + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0)
            .collect();
        debug!("IDF calculation complete");

        Ok(Self {
            count_vectorizer,
            idf,
        })
    }

    /// Weight counts by IDF and L2-normalize each document row. Rows with no
    /// in-vocabulary token stay all zero.
    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        let mut tf_matrix = self.count_vectorizer.transform(texts);

        for mut row_vec in tf_matrix.outer_iterator_mut() {
            // Apply IDF
            for (col_idx, val) in row_vec.iter_mut() {
                *val *= self.idf[col_idx];
            }
            // Normalize row vector (L2 norm)
            let norm = row_vec.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, val) in row_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }
        tf_matrix
    }

    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<(Self, CsMat<f64>)> {
        let vectorizer = Self::fit(texts, params)?;
        let transformed = vectorizer.transform(texts);
        Ok((vectorizer, transformed))
    }

    /// The `k` highest-weighted (token, weight) pairs of one document row,
    /// in descending weight order with ties broken by lexicographic token
    /// order ascending. Summarizes the dominant terms of a document.
    pub fn top_terms(&self, row: CsVecView<'_, f64>, k: usize) -> Vec<(String, f64)> {
        let vocabulary = self.count_vectorizer.vocabulary();
        let mut terms = row
            .iter()
            .map(|(col_idx, &weight)| (vocabulary[col_idx].as_str(), weight))
            .collect::<Vec<_>>();
        terms.sort_by(|(token_a, weight_a), (token_b, weight_b)| {
            weight_b
                .total_cmp(weight_a)
                .then_with(|| token_a.cmp(token_b))
        });
        terms.truncate(k);
        terms
            .into_iter()
            .map(|(token, weight)| (token.to_string(), weight))
            .collect()
    }

    pub fn num_features(&self) -> usize {
        self.count_vectorizer.num_features()
    }

    pub fn vocabulary(&self) -> &[String] {
        self.count_vectorizer.vocabulary()
    }

    /// Smoothed IDF weight per column.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn feature_labels(&self, prefix: &str) -> Vec<String> {
        self.count_vectorizer.feature_labels(prefix)
    }

    pub fn params(&self) -> &VectorizerParams {
        self.count_vectorizer.params()
    }
}

#[cfg(feature = "bincode")]
impl TfidfVectorizer {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (vectorizer, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(vectorizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn fit(corpus: &[&str]) -> TfidfVectorizer {
        TfidfVectorizer::fit(corpus, VectorizerParams::new((1, 1), 0.0, 1.0)).unwrap()
    }

    #[test]
    fn idf_follows_smoothed_formula() {
        let vectorizer = fit(&["the cat sat", "the dog sat"]);
        // vocabulary: cat, dog, sat, the with df 1, 1, 2, 2 over n = 2
        let expected = [
            (3.0_f64 / 2.0).ln() + 1.0,
            (3.0_f64 / 2.0).ln() + 1.0,
            1.0,
            1.0,
        ];
        for (idf, expected) in vectorizer.idf().iter().zip(expected) {
            assert!((idf - expected).abs() < TOLERANCE);
        }
    }

    #[test]
    fn rows_are_l2_normalized() {
        let vectorizer = fit(&["the cat sat", "the dog sat"]);
        let matrix = vectorizer.transform(&["the cat sat", "dog dog"]);
        for row in matrix.outer_iterator() {
            let norm = row.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn out_of_vocabulary_rows_stay_zero() {
        let vectorizer = fit(&["the cat sat", "the dog sat"]);
        let matrix = vectorizer.transform(&["zebra quokka", ""]);
        for row in matrix.outer_iterator() {
            assert_eq!(row.nnz(), 0);
        }
    }

    #[test]
    fn rarer_terms_outweigh_common_ones() {
        let vectorizer = fit(&["the cat sat", "the dog sat", "the bird flew"]);
        let matrix = vectorizer.transform(&["the cat"]);
        let row = matrix.outer_view(0).unwrap();
        let terms = vectorizer.top_terms(row, 2);
        assert_eq!(terms[0].0, "cat");
        assert_eq!(terms[1].0, "the");
        assert!(terms[0].1 > terms[1].1);
    }

    #[test]
    fn top_terms_breaks_weight_ties_lexicographically() {
        // "cat" and "dog" have identical df and counts, so identical weight
        let vectorizer = fit(&["cat dog mouse", "cat dog", "mouse"]);
        let matrix = vectorizer.transform(&["dog cat"]);
        let row = matrix.outer_view(0).unwrap();
        let terms = vectorizer.top_terms(row, 5);
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].0, "cat");
        assert_eq!(terms[1].0, "dog");
        assert!((terms[0].1 - terms[1].1).abs() < TOLERANCE);
    }

    #[test]
    fn weighting_requires_a_df_table() {
        let counts = CountVectorizer::from_vocabulary(["alpha", "beta"], VectorizerParams::default())
            .unwrap();
        assert!(matches!(
            TfidfVectorizer::from_counts(counts),
            Err(Error::NotFitted)
        ));
    }
}
