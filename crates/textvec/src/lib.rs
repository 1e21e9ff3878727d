//! # textvec
//!
//! Convert a collection of documents into fixed-width numeric feature
//! vectors using raw term counts or TF-IDF weights.
//!
//! The vocabulary is learned once at fit time, with configurable
//! document-frequency thresholds, n-gram range, stop-word removal, and a
//! feature cap; it is immutable afterwards, so a fitted vectorizer can be
//! applied to any other corpus (unseen tokens are dropped silently) and
//! shared freely across threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use textvec::{TfidfVectorizer, VectorizerParams};
//!
//! let corpus = ["the cat sat on the mat", "the dog sat on the log"];
//! let vectorizer = TfidfVectorizer::fit(&corpus, VectorizerParams::default())?;
//!
//! // Apply the learned vocabulary to new documents
//! let matrix = vectorizer.transform(&["the cat barked"]);
//! assert_eq!(matrix.cols(), vectorizer.num_features());
//!
//! // Dominant terms of the first document
//! let row = matrix.outer_view(0).expect("row exists");
//! for (token, weight) in vectorizer.top_terms(row, 3) {
//!     println!("{token}: {weight:.3}");
//! }
//! # Ok::<(), textvec::Error>(())
//! ```
//!
//! ## Counts only
//!
//! ```rust
//! use textvec::{CountVectorizer, VectorizerParams};
//!
//! let params = VectorizerParams::new((1, 2), 0.0, 1.0).with_max_features(1000);
//! let (vectorizer, counts) = CountVectorizer::fit_transform(&["a b", "b c"], params)?;
//! assert_eq!(counts.rows(), 2);
//! # Ok::<(), textvec::Error>(())
//! ```

mod error;
mod vectorizer;

pub use error::{Error, Result};
pub use vectorizer::{CountVectorizer, TfidfVectorizer, VectorizerParams};
