//! Feature builder: span-pair examples → fixed-length feature records.
//!
//! Each example contributes one record per orientation. The token sequence
//! is assembled left to right around the two marked spans, span positions
//! are recorded in token space at the moment of insertion, and the id
//! sequence is truncated and padded to exactly `max_seq_len`. An orientation
//! whose span positions would fall past the end of the padded sequence is
//! dropped rather than emitted with out-of-range positions; drops are
//! counted, never raised.

use serde::{Deserialize, Serialize};

use crate::config::{EncodingConfig, SYNONYM_ROLE, TARGET_ROLE};
use crate::example::PairExample;
use crate::tokenizer::SubwordTokenizer;
use crate::{Error, Result};

/// Number of examples rendered at debug level at the start of a pass.
const SAMPLE_LOG_COUNT: usize = 10;

/// Ground truth attached to one feature record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureLabel {
    /// Categorical class id (True → 1, False → 0).
    Class(i64),
    /// Continuous score for regression training.
    Score(f32),
}

impl FeatureLabel {
    /// The label as a float, casting categorical ids.
    #[must_use]
    pub fn as_f32(&self) -> f32 {
        match self {
            FeatureLabel::Class(id) => *id as f32,
            FeatureLabel::Score(score) => *score,
        }
    }
}

/// One encoded orientation of one example. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFeature {
    /// Token ids, exactly `max_seq_len` long, right-padded with the pad id.
    pub input_ids: Vec<i64>,
    /// Attention mask parallel to `input_ids`: 1 for real tokens, 0 for pad.
    pub input_mask: Vec<i64>,
    /// Segment ids, constant 0 for this single-segment encoding.
    pub token_type_ids: Vec<i64>,
    /// Ground truth for the configured training mode.
    pub label: FeatureLabel,
    /// Slot `2k` / `2k + 1` hold the start/end token offset of role `k`.
    pub positions: Vec<usize>,
    /// The source example, kept for provenance and debugging.
    pub example: PairExample,
}

impl PairFeature {
    /// Token range `[start, end)` of the role in slot `slot`.
    #[must_use]
    pub fn span_range(&self, slot: usize) -> (usize, usize) {
        (self.positions[slot * 2], self.positions[slot * 2 + 1])
    }
}

/// Counters accumulated over one encoding pass. Logging is the caller's
/// concern; the builder only reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingStats {
    /// Source examples consumed.
    pub examples_seen: usize,
    /// Feature records emitted (≥ examples in symmetric mode, minus drops).
    pub records_emitted: usize,
    /// Orientations whose id sequence was truncated to `max_seq_len`.
    pub too_long: usize,
    /// Orientations discarded because a span position fell out of range.
    /// A drop can happen without truncation when an untruncated sequence's
    /// last span ends exactly at the sequence boundary, so `dropped` and
    /// `too_long` move independently.
    pub dropped: usize,
}

impl EncodingStats {
    /// Percentage of emitted records that were truncated; 0.0 when nothing
    /// was emitted.
    #[must_use]
    pub fn too_long_pct(&self) -> f64 {
        if self.records_emitted == 0 {
            0.0
        } else {
            self.too_long as f64 / self.records_emitted as f64 * 100.0
        }
    }
}

/// Builds [`PairFeature`]s from examples under a fixed configuration.
pub struct FeatureBuilder<'a, T: SubwordTokenizer> {
    config: &'a EncodingConfig,
    tokenizer: &'a T,
}

impl<'a, T: SubwordTokenizer> FeatureBuilder<'a, T> {
    /// Create a builder over a validated configuration and a tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails
    /// [`EncodingConfig::validate`], before any example is touched.
    pub fn new(config: &'a EncodingConfig, tokenizer: &'a T) -> Result<Self> {
        config.validate()?;
        Ok(FeatureBuilder { config, tokenizer })
    }

    /// Encode every example, returning the records and the pass counters.
    ///
    /// Symmetric mode emits both orientations (first sentence in the
    /// Target slot, then swapped); otherwise only the as-given orientation.
    pub fn convert(&self, examples: &[PairExample]) -> Result<(Vec<PairFeature>, EncodingStats)> {
        let first_slot = self.slot(TARGET_ROLE)?;
        let second_slot = self.slot(SYNONYM_ROLE)?;

        let mut features = Vec::new();
        let mut stats = EncodingStats::default();

        for (ex_index, ex) in examples.iter().enumerate() {
            stats.examples_seen += 1;

            let forward = Orientation {
                text_1: &ex.text_1,
                span_1: (ex.start_1, ex.end_1),
                text_2: &ex.text_2,
                span_2: (ex.start_2, ex.end_2),
            };
            let mut orientations = vec![forward];
            if self.config.symmetric {
                orientations.push(forward.swapped());
            }

            for orientation in orientations {
                let sample = ex_index < SAMPLE_LOG_COUNT;
                if let Some(feature) =
                    self.encode_orientation(ex, orientation, first_slot, second_slot, sample, &mut stats)?
                {
                    stats.records_emitted += 1;
                    features.push(feature);
                }
            }
        }

        log::debug!(
            "encoded {} examples into {} records ({} truncated, {} dropped, {:.2}% too long)",
            stats.examples_seen,
            stats.records_emitted,
            stats.too_long,
            stats.dropped,
            stats.too_long_pct()
        );
        Ok((features, stats))
    }

    fn slot(&self, role: &str) -> Result<usize> {
        self.config
            .role_slot(role)
            .ok_or_else(|| Error::invalid_config(format!("roles must contain '{role}'")))
    }

    fn encode_orientation(
        &self,
        ex: &PairExample,
        orientation: Orientation<'_>,
        first_slot: usize,
        second_slot: usize,
        sample: bool,
        stats: &mut EncodingStats,
    ) -> Result<Option<PairFeature>> {
        let max_seq_len = self.config.max_seq_len;
        let (left_1, span_1, right_1) =
            segment(orientation.text_1, orientation.span_1, &ex.id)?;
        let (left_2, span_2, right_2) =
            segment(orientation.text_2, orientation.span_2, &ex.id)?;

        let mut tokens = vec![self.tokenizer.cls_token().to_string()];
        let mut positions = vec![0usize; 2 * self.config.roles.len()];

        // First sentence: prefix, span (position recorded around insertion),
        // suffix + separator.
        if !left_1.is_empty() {
            tokens.extend(self.tokenizer.tokenize(left_1));
        }
        positions[first_slot * 2] = tokens.len();
        self.push_span_tokens(&mut tokens, span_1, &ex.id)?;
        positions[first_slot * 2 + 1] = tokens.len();
        if !right_1.is_empty() {
            tokens.extend(self.tokenizer.tokenize(right_1));
            tokens.push(self.tokenizer.sep_token().to_string());
        }

        // Second sentence, identically.
        if !left_2.is_empty() {
            tokens.extend(self.tokenizer.tokenize(left_2));
        }
        positions[second_slot * 2] = tokens.len();
        self.push_span_tokens(&mut tokens, span_2, &ex.id)?;
        positions[second_slot * 2 + 1] = tokens.len();
        if !right_2.is_empty() {
            tokens.extend(self.tokenizer.tokenize(right_2));
            tokens.push(self.tokenizer.sep_token().to_string());
        }

        let mut input_ids = self.tokenizer.convert_tokens_to_ids(&tokens);
        if input_ids.len() > max_seq_len {
            input_ids.truncate(max_seq_len);
            stats.too_long += 1;
        }

        // No emitted record may reference a token offset past the padded
        // sequence, whether truncation caused it or the span simply ends at
        // the boundary.
        if positions.iter().copied().max().unwrap_or(0) > max_seq_len - 1 {
            stats.dropped += 1;
            return Ok(None);
        }

        let mut input_mask = vec![1i64; input_ids.len()];
        input_ids.resize(max_seq_len, self.tokenizer.pad_id());
        input_mask.resize(max_seq_len, 0);
        let token_type_ids = vec![0i64; max_seq_len];

        let label = if self.config.train_scd {
            let score = ex.score.ok_or_else(|| {
                Error::dataset(format!(
                    "example {}: train_scd requires a continuous score",
                    ex.id
                ))
            })?;
            FeatureLabel::Score(score)
        } else {
            FeatureLabel::Class(ex.label.class_id())
        };

        if sample {
            self.log_sample(ex, &tokens, &positions, &label);
        }

        Ok(Some(PairFeature {
            input_ids,
            input_mask,
            token_type_ids,
            label,
            positions,
            example: ex.clone(),
        }))
    }

    // A span that tokenizes to nothing would emit a record with
    // start == end, an empty range the pooler cannot reduce.
    fn push_span_tokens(&self, tokens: &mut Vec<String>, span_text: &str, id: &str) -> Result<()> {
        let span_tokens = self.tokenizer.tokenize(span_text);
        if span_tokens.is_empty() {
            return Err(Error::dataset(format!(
                "example {id}: span {span_text:?} yields no sub-tokens"
            )));
        }
        if self.config.mask_syns {
            let mask = self.tokenizer.mask_token().to_string();
            tokens.extend(std::iter::repeat(mask).take(span_tokens.len()));
        } else {
            tokens.extend(span_tokens);
        }
        Ok(())
    }

    fn log_sample(
        &self,
        ex: &PairExample,
        tokens: &[String],
        positions: &[usize],
        label: &FeatureLabel,
    ) {
        log::debug!("*** example {} ***", ex.id);
        log::debug!("subtokens: {}", tokens.join(" "));
        log::debug!("label: {label:?}");
        for (slot, role) in self.config.roles.iter().enumerate() {
            let (start, end) = (positions[slot * 2], positions[slot * 2 + 1]);
            if start < end && end <= tokens.len() {
                log::debug!("{role}: {}", tokens[start..end].join(" "));
            }
        }
    }
}

#[derive(Clone, Copy)]
struct Orientation<'a> {
    text_1: &'a str,
    span_1: (usize, usize),
    text_2: &'a str,
    span_2: (usize, usize),
}

impl<'a> Orientation<'a> {
    fn swapped(self) -> Self {
        Orientation {
            text_1: self.text_2,
            span_1: self.span_2,
            text_2: self.text_1,
            span_2: self.span_1,
        }
    }
}

/// Split a sentence into (prefix, span, suffix) around a byte-offset span.
fn segment<'t>(text: &'t str, (start, end): (usize, usize), id: &str) -> Result<(&'t str, &'t str, &'t str)> {
    if start > end
        || end > text.len()
        || !text.is_char_boundary(start)
        || !text.is_char_boundary(end)
    {
        return Err(Error::dataset(format!(
            "example {id}: span [{start}, {end}) is out of range or splits a character in {text:?}"
        )));
    }
    Ok((&text[..start], &text[start..end], &text[end..]))
}
