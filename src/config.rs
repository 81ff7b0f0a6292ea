//! Encoding and model configuration.
//!
//! All knobs live in one explicit, immutable [`EncodingConfig`] value that is
//! constructed once (usually deserialized from a config file) and passed by
//! reference to each component. Strategy selection is a closed enum rather
//! than a free-form string: an unknown tag is a configuration error naming
//! the allowed set, never a silent fall-through at dispatch time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Role name for the first marked span of an example.
pub const TARGET_ROLE: &str = "Target";
/// Role name for the second marked span of an example.
pub const SYNONYM_ROLE: &str = "Synonym";

/// How the hidden states inside one span are reduced to a single vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    /// Element-wise average over the span.
    Mean,
    /// Element-wise maximum over the span.
    Max,
    /// The hidden vector of the first sub-token only.
    First,
    /// `[mean, max, first]` concatenated; triples the output width.
    Combined,
}

impl PoolType {
    /// Width multiplier relative to the encoder hidden size.
    #[must_use]
    pub const fn width_factor(&self) -> usize {
        match self {
            PoolType::Combined => 3,
            _ => 1,
        }
    }
}

impl FromStr for PoolType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(PoolType::Mean),
            "max" => Ok(PoolType::Max),
            "first" => Ok(PoolType::First),
            "combined" => Ok(PoolType::Combined),
            other => Err(Error::invalid_config(format!(
                "unknown pool_type '{other}', expected one of: mean, max, first, combined"
            ))),
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolType::Mean => write!(f, "mean"),
            PoolType::Max => write!(f, "max"),
            PoolType::First => write!(f, "first"),
            PoolType::Combined => write!(f, "combined"),
        }
    }
}

/// How the two pooled span vectors of an example are merged into one
/// feature vector for the classification head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeType {
    /// Element-wise product; requires equal widths.
    FeatwiseMul,
    /// `[emb1, emb2]`; doubles the width.
    Concat,
    /// Element-wise product of the two unit-normalized vectors.
    FeatwiseMulNorm,
    /// `[emb1, emb2, emb1 * emb2]`; triples the width.
    Combined,
}

impl MergeType {
    /// Width multiplier relative to the pooled vector width.
    #[must_use]
    pub const fn width_factor(&self) -> usize {
        match self {
            MergeType::FeatwiseMul | MergeType::FeatwiseMulNorm => 1,
            MergeType::Concat => 2,
            MergeType::Combined => 3,
        }
    }
}

impl FromStr for MergeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "featwise_mul" => Ok(MergeType::FeatwiseMul),
            "concat" => Ok(MergeType::Concat),
            "featwise_mul_norm" => Ok(MergeType::FeatwiseMulNorm),
            "combined" => Ok(MergeType::Combined),
            other => Err(Error::invalid_config(format!(
                "unknown target_embeddings '{other}', expected one of: \
                 featwise_mul, concat, featwise_mul_norm, combined"
            ))),
        }
    }
}

impl fmt::Display for MergeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeType::FeatwiseMul => write!(f, "featwise_mul"),
            MergeType::Concat => write!(f, "concat"),
            MergeType::FeatwiseMulNorm => write!(f, "featwise_mul_norm"),
            MergeType::Combined => write!(f, "combined"),
        }
    }
}

/// Training loss; also fixes the classification head output width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// Mean-squared error against a continuous score (head width 1).
    MseLoss,
    /// Cross-entropy against a binary label (head width 2).
    CrossentropyLoss,
}

impl LossKind {
    /// Output width of the classification head for this loss.
    #[must_use]
    pub const fn num_classes(&self) -> usize {
        match self {
            LossKind::MseLoss => 1,
            LossKind::CrossentropyLoss => 2,
        }
    }
}

impl FromStr for LossKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mse_loss" => Ok(LossKind::MseLoss),
            "crossentropy_loss" => Ok(LossKind::CrossentropyLoss),
            other => Err(Error::invalid_config(format!(
                "unknown loss '{other}', expected one of: mse_loss, crossentropy_loss"
            ))),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossKind::MseLoss => write!(f, "mse_loss"),
            LossKind::CrossentropyLoss => write!(f, "crossentropy_loss"),
        }
    }
}

/// Configuration for encoding span-pair examples into feature records.
///
/// No hidden defaults: every field is required, and [`EncodingConfig::validate`]
/// must pass before any example is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Encoder/tokenizer identifier (e.g. a HuggingFace model id).
    pub model_name: String,
    /// Fixed length of every emitted token-id sequence.
    pub max_seq_len: usize,
    /// Span pooling strategy.
    pub pool_type: PoolType,
    /// Span-pair merge strategy.
    pub target_embeddings: MergeType,
    /// Replace span sub-tokens with a run of mask tokens of equal length.
    pub mask_syns: bool,
    /// Also emit the role-swapped orientation of every example.
    pub symmetric: bool,
    /// Train on the continuous score instead of the binary label.
    pub train_scd: bool,
    /// Training loss (fixes the head output width).
    pub loss: LossKind,
    /// Ordered role names; must contain "Target" and "Synonym". The role's
    /// index here selects its slot pair in the position table.
    pub roles: Vec<String>,
}

impl EncodingConfig {
    /// Check cross-field invariants. Run before building any feature record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `max_seq_len` is zero, when a
    /// required role is missing, or when `train_scd` is combined with a
    /// non-regression loss.
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_len == 0 {
            return Err(Error::invalid_config("max_seq_len must be positive"));
        }
        for role in [TARGET_ROLE, SYNONYM_ROLE] {
            if !self.roles.iter().any(|r| r == role) {
                return Err(Error::invalid_config(format!(
                    "roles must contain '{role}', got {:?}",
                    self.roles
                )));
            }
        }
        if self.train_scd && self.loss != LossKind::MseLoss {
            return Err(Error::invalid_config(
                "train_scd requires loss = mse_loss (regression target)",
            ));
        }
        Ok(())
    }

    /// Slot index of `role` in the position table, if configured.
    #[must_use]
    pub fn role_slot(&self, role: &str) -> Option<usize> {
        self.roles.iter().position(|r| r == role)
    }

    /// Width of the merged feature vector fed to the classification head,
    /// given the encoder hidden size.
    ///
    /// # Examples
    ///
    /// ```
    /// use synpair::{EncodingConfig, LossKind, MergeType, PoolType};
    ///
    /// let config = EncodingConfig {
    ///     model_name: "xlm-roberta-base".into(),
    ///     max_seq_len: 128,
    ///     pool_type: PoolType::Combined,
    ///     target_embeddings: MergeType::Combined,
    ///     mask_syns: false,
    ///     symmetric: false,
    ///     train_scd: false,
    ///     loss: LossKind::CrossentropyLoss,
    ///     roles: vec!["Target".into(), "Synonym".into()],
    /// };
    /// assert_eq!(config.head_input_size(768), 6912);
    /// ```
    #[must_use]
    pub fn head_input_size(&self, hidden_size: usize) -> usize {
        hidden_size * self.pool_type.width_factor() * self.target_embeddings.width_factor()
    }
}
