//! # synpair
//!
//! Span-pair feature encoding and classification primitives for synonym
//! and word-in-context detection.
//!
//! Given pairs of sentences, each with a marked target span and a marked
//! candidate-synonym span, synpair produces fixed-length feature records
//! for an external transformer encoder and defines how the encoder's
//! per-token hidden states are pooled per span, merged per pair, and
//! classified.
//!
//! ## Pipeline
//!
//! ```text
//! PairExample ──► FeatureBuilder ──► PairFeature (ids, mask, positions)
//!                                          │
//!                              external encoder (hidden states)
//!                                          │
//!                 pool_span ──► merge_spans ──► ClassificationHead ──► training_loss
//! ```
//!
//! The encoder itself (weights, attention) and the sub-word vocabulary are
//! external collaborators, consumed through the [`SubwordTokenizer`] trait
//! and a `[seq_len, hidden]` matrix per example.
//!
//! ## Quick Start
//!
//! ```rust
//! use synpair::{
//!     EncodingConfig, FeatureBuilder, LossKind, MergeType, PairExample,
//!     PairLabel, PoolType, WhitespaceTokenizer,
//! };
//!
//! let config = EncodingConfig {
//!     model_name: "xlm-roberta-base".into(),
//!     max_seq_len: 16,
//!     pool_type: PoolType::First,
//!     target_embeddings: MergeType::Concat,
//!     mask_syns: false,
//!     symmetric: false,
//!     train_scd: false,
//!     loss: LossKind::CrossentropyLoss,
//!     roles: vec!["Target".into(), "Synonym".into()],
//! };
//!
//! let tokenizer = WhitespaceTokenizer;
//! let builder = FeatureBuilder::new(&config, &tokenizer).unwrap();
//! let example = PairExample::new("The cat sat", (4, 7), "A dog ran", (2, 5), PairLabel::True);
//! let (features, stats) = builder.convert(&[example]).unwrap();
//! assert_eq!(features.len(), 1);
//! assert_eq!(stats.too_long, 0);
//! ```
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! synpair = "0.1"                                      # core, test tokenizer
//! synpair = { version = "0.1", features = ["hf-tokenizers"] } # HuggingFace tokenizers
//! ```
//!
//! ## Design Notes
//!
//! - Strategy selection (`pool_type`, `target_embeddings`, `loss`) is a
//!   closed enum; unknown tags fail at configuration time, never silently
//!   at dispatch time.
//! - The feature builder recovers from oversized examples by dropping the
//!   offending orientation and counting it; it never emits a record with an
//!   out-of-range span position.
//! - All per-example work is independent; parallelize at the corpus
//!   boundary if throughput matters.

#![warn(missing_docs)]

pub mod config;
pub mod corpus;
mod error;
pub mod example;
pub mod features;
pub mod head;
pub mod loss;
pub mod pooling;
pub mod tokenizer;

pub use config::{EncodingConfig, LossKind, MergeType, PoolType, SYNONYM_ROLE, TARGET_ROLE};
pub use corpus::{CorpusReader, TsvCorpus};
pub use error::{Error, Result};
pub use example::{PairExample, PairLabel};
pub use features::{EncodingStats, FeatureBuilder, FeatureLabel, PairFeature};
pub use head::{ClassificationHead, Dense};
pub use loss::{mean_training_loss, training_loss};
pub use pooling::{extract_pair_feature, merge_spans, pool_span};
pub use tokenizer::{SubwordTokenizer, WhitespaceTokenizer};

#[cfg(feature = "hf-tokenizers")]
pub use tokenizer::{HfTokenizer, SpecialTokens};
