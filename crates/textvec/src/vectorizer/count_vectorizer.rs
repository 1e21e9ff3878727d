use ahash::{AHashMap, HashMap, HashMapExt};
use sprs::CsMat;
use tracing::debug;

use super::{ngrams, params::VectorizerParams, tokenizer};
use crate::error::{Error, Result};

/// Bag-of-words vectorizer.
///
/// A constructed value is always fitted: the vocabulary and the document
/// frequency table are built once by [`CountVectorizer::fit`] and are
/// immutable afterwards, so [`CountVectorizer::transform`] is side-effect
/// free and may run concurrently over independent document batches.
/// Re-fitting means constructing a new independent instance; matrices issued
/// against the old vocabulary stay valid.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    /// Vocabulary mapping n-gram to feature (column) index
    vocab: HashMap<String, usize>,
    /// Inverse mapping: tokens in column order (lexicographically sorted)
    tokens: Vec<String>,
    /// Document frequency per column over the fitting corpus.
    /// `None` when the vocabulary was supplied by the caller instead of
    /// being learned from a corpus.
    df: Option<Vec<usize>>,
    /// Number of documents in the fitting corpus
    n_docs: usize,
}

impl CountVectorizer {
    /// Learn a vocabulary and document frequency table from `texts`.
    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Result<Self> {
        debug!(num_texts = texts.len(), "Fitting CountVectorizer");
        params.validate()?;
        if texts.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let tokenized_texts = tokenize_and_filter(texts, &params);
        Self::fit_from_tokenized(&tokenized_texts, params, None)
    }

    /// Internal method to fit from pre-tokenized texts.
    /// Used by `fit_transform` to avoid double tokenization.
    fn fit_from_tokenized(
        tokenized_texts: &[Vec<String>],
        params: VectorizerParams,
        precomputed_ngrams: Option<&[AHashMap<String, usize>]>,
    ) -> Result<Self> {
        debug!("Building vocabulary from tokenized texts");

        // Resolve df bounds up front so a contradictory configuration
        // aborts before any vocabulary work happens
        let n_docs = tokenized_texts.len();
        let (min_docs, max_docs) = params.df_bounds(n_docs)?;

        // Use pre-computed n-grams if available, otherwise compute them
        let vocab_df = precomputed_ngrams.map_or_else(
            || ngrams::document_frequencies(tokenized_texts, params.ngram_range()),
            |ngram_maps| {
                // Fast path: reuse pre-computed n-grams
                debug!("Using pre-computed n-grams for vocabulary building");
                let vocab_df = dashmap::DashMap::with_hasher(ahash::RandomState::default());
                for ngram_map in ngram_maps {
                    for ngram in ngram_map.keys() {
                        vocab_df
                            .entry(ngram.clone())
                            .and_modify(|df| *df += 1)
                            .or_insert(1usize);
                    }
                }
                vocab_df
            },
        );

        let raw_size = vocab_df.len();

        debug!(min_docs, max_docs, "Applying document frequency filtering");
        let mut candidates = vocab_df
            .into_iter()
            .filter(|(_, df)| {
                let df = *df as f64;
                df >= min_docs && df <= max_docs
            })
            .collect::<Vec<_>>();
        debug!(
            original_size = raw_size,
            filtered_size = candidates.len(),
            "Vocabulary filtered by document frequency"
        );

        if let Some(cap) = params.max_features() {
            if candidates.len() > cap {
                // Keep the highest document frequencies; lexicographic
                // ascending order breaks ties deterministically.
                candidates.sort_by(|(token_a, df_a), (token_b, df_b)| {
                    df_b.cmp(df_a).then_with(|| token_a.cmp(token_b))
                });
                candidates.truncate(cap);
                debug!(max_features = cap, "Vocabulary truncated to most frequent tokens");
            }
        }

        if candidates.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        // Column order is the lexicographic token order
        candidates.sort_by(|(token_a, _), (token_b, _)| token_a.cmp(token_b));

        let mut vocab = HashMap::with_capacity(candidates.len());
        let mut tokens = Vec::with_capacity(candidates.len());
        let mut df = Vec::with_capacity(candidates.len());
        for (idx, (token, doc_freq)) in candidates.into_iter().enumerate() {
            vocab.insert(token.clone(), idx);
            tokens.push(token);
            df.push(doc_freq);
        }

        debug!(vocab_size = tokens.len(), "CountVectorizer fitting complete");

        Ok(Self {
            params,
            vocab,
            tokens,
            df: Some(df),
            n_docs,
        })
    }

    /// Build a vectorizer around a caller-supplied vocabulary.
    ///
    /// Tokens are deduplicated and sorted lexicographically to assign column
    /// indices. No document frequency table is recorded, so the result can
    /// count but not derive TF-IDF weights.
    pub fn from_vocabulary<T: Into<String>>(
        vocabulary: impl IntoIterator<Item = T>,
        params: VectorizerParams,
    ) -> Result<Self> {
        params.validate()?;
        let mut tokens: Vec<String> = vocabulary.into_iter().map(Into::into).collect();
        tokens.sort();
        tokens.dedup();
        if tokens.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        let vocab = tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| (token.clone(), idx))
            .collect();
        Ok(Self {
            params,
            vocab,
            tokens,
            df: None,
            n_docs: 0,
        })
    }

    /// Count vocabulary occurrences in `texts`, producing an
    /// N x `num_features` CSR matrix. Tokens outside the vocabulary
    /// contribute nothing: no error, no new column.
    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let tokenized_texts = tokenize_and_filter(texts, &self.params);
        self.transform_from_tokenized(&tokenized_texts, None)
    }

    /// Internal method to transform from pre-tokenized texts.
    /// Used by `fit_transform` to avoid double tokenization and n-gram
    /// computation.
    fn transform_from_tokenized(
        &self,
        tokenized_texts: &[Vec<String>],
        precomputed_ngrams: Option<&[AHashMap<String, usize>]>,
    ) -> CsMat<f64> {
        let num_texts = tokenized_texts.len();

        // Build CSR format directly
        let mut indptr = Vec::with_capacity(num_texts + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);

        for (doc_idx, tokens) in tokenized_texts.iter().enumerate() {
            let computed;
            let ngram_counts = if let Some(ngram_maps) = precomputed_ngrams {
                &ngram_maps[doc_idx]
            } else {
                computed = ngrams::count_ngrams(tokens, self.params.ngram_range());
                &computed
            };

            let mut row_entries = ngram_counts
                .iter()
                .filter_map(|(ngram, &count)| {
                    self.vocab.get(ngram).map(|&col_idx| (col_idx, count as f64))
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
        CsMat::new((num_texts, self.num_features()), indptr, indices, data)
    }

    /// Optimized `fit_transform` that computes n-grams only once.
    ///
    /// Tokenizes once, computes n-grams once, then reuses them for both
    /// vocabulary building and transformation, achieving ~2x speedup over
    /// calling `fit()` followed by `transform()`.
    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<(Self, CsMat<f64>)> {
        debug!(
            num_texts = texts.len(),
            "Optimized fit_transform: tokenizing and computing n-grams once"
        );
        params.validate()?;
        if texts.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let tokenized_texts = tokenize_and_filter(texts, &params);

        debug!("Computing n-grams for all documents");
        let ngram_maps: Vec<_> = tokenized_texts
            .iter()
            .map(|tokens| ngrams::count_ngrams(tokens, params.ngram_range()))
            .collect();

        let vectorizer = Self::fit_from_tokenized(&tokenized_texts, params, Some(&ngram_maps[..]))?;
        let transformed = vectorizer.transform_from_tokenized(&tokenized_texts, Some(&ngram_maps[..]));

        debug!("fit_transform complete with single n-gram computation");
        Ok((vectorizer, transformed))
    }

    pub fn num_features(&self) -> usize {
        self.tokens.len()
    }

    /// Vocabulary tokens in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.tokens
    }

    /// Per-column document frequencies over the fitting corpus, when the
    /// vocabulary was learned from one.
    pub fn document_frequencies(&self) -> Option<&[usize]> {
        self.df.as_deref()
    }

    /// Number of documents in the fitting corpus.
    pub fn n_docs(&self) -> usize {
        self.n_docs
    }

    /// Column labels for downstream tabular combination, e.g.
    /// `feature_labels("Counts_")` yields `Counts_cat`, `Counts_dog`, ...
    pub fn feature_labels(&self, prefix: &str) -> Vec<String> {
        self.tokens
            .iter()
            .map(|token| format!("{prefix}{token}"))
            .collect()
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }
}

#[cfg(feature = "bincode")]
impl CountVectorizer {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (vectorizer, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(vectorizer)
    }
}

/// Tokenize a batch and drop configured stop words from the token stream
/// before any n-gram is formed.
fn tokenize_and_filter<T: AsRef<str> + Sync>(
    texts: &[T],
    params: &VectorizerParams,
) -> Vec<Vec<String>> {
    let mut tokenized_texts = tokenizer::tokenize(texts);
    if let Some(stop_words) = params.stop_words() {
        for tokens in &mut tokenized_texts {
            tokens.retain(|token| !stop_words.contains(token));
        }
    }
    tokenized_texts
}
