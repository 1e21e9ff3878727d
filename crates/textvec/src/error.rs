use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by fitting, weighting, and artifact loading.
///
/// Configuration problems abort the fit before any vocabulary is built, so a
/// failed fit never leaves partial state behind.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid n-gram range ({min}, {max}): bounds must be >= 1 and min <= max")]
    InvalidNgramRange { min: usize, max: usize },

    #[error("invalid document frequency bounds (min_df={min_df}, max_df={max_df})")]
    InvalidDocumentFrequencies { min_df: f64, max_df: f64 },

    #[error(
        "min_df resolves to {min_docs} documents but max_df to {max_docs} \
         over a corpus of {n_docs}"
    )]
    FlippedDocumentFrequencies {
        min_docs: f64,
        max_docs: f64,
        n_docs: usize,
    },

    #[error("cannot fit on an empty corpus")]
    EmptyCorpus,

    #[error("no token survived vocabulary filtering")]
    EmptyVocabulary,

    /// The vectorizer has no document frequency table, so IDF weights cannot
    /// be derived. Happens when a vectorizer built from a user-supplied
    /// vocabulary is asked to do TF-IDF weighting.
    #[error("no document frequency table recorded; fit on a corpus before weighting")]
    NotFitted,

    #[cfg(feature = "bincode")]
    #[error("failed to encode vectorizer artifact")]
    Encode(#[from] bincode::error::EncodeError),

    #[cfg(feature = "bincode")]
    #[error("failed to decode vectorizer artifact")]
    Decode(#[from] bincode::error::DecodeError),
}
