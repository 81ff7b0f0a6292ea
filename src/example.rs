//! Source examples: sentence pairs with marked spans.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Error, Result};

/// Binary ground-truth label for a span pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairLabel {
    /// The two spans are synonymous in context.
    #[serde(rename = "T")]
    True,
    /// The two spans are not synonymous in context.
    #[serde(rename = "F")]
    False,
}

impl PairLabel {
    /// Categorical class id (True → 1, False → 0).
    #[must_use]
    pub const fn class_id(&self) -> i64 {
        match self {
            PairLabel::True => 1,
            PairLabel::False => 0,
        }
    }
}

impl FromStr for PairLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "T" => Ok(PairLabel::True),
            "F" => Ok(PairLabel::False),
            other => Err(Error::dataset(format!(
                "unknown label '{other}', expected 'T' or 'F'"
            ))),
        }
    }
}

/// One source example: two sentences, each with a marked span, plus the
/// ground truth. Spans are byte offsets into the sentence and must fall on
/// UTF-8 character boundaries. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairExample {
    /// Stable identifier, used for provenance and debug rendering.
    pub id: String,
    /// First sentence.
    pub text_1: String,
    /// Span start in `text_1` (byte offset, inclusive).
    pub start_1: usize,
    /// Span end in `text_1` (byte offset, exclusive).
    pub end_1: usize,
    /// Second sentence.
    pub text_2: String,
    /// Span start in `text_2`.
    pub start_2: usize,
    /// Span end in `text_2`.
    pub end_2: usize,
    /// Categorical label.
    pub label: PairLabel,
    /// Continuous score, present for graded (SCD-style) data.
    pub score: Option<f32>,
}

impl PairExample {
    /// Build an example with a generated id and no continuous score.
    #[must_use]
    pub fn new(
        text_1: impl Into<String>,
        span_1: (usize, usize),
        text_2: impl Into<String>,
        span_2: (usize, usize),
        label: PairLabel,
    ) -> Self {
        PairExample {
            id: String::new(),
            text_1: text_1.into(),
            start_1: span_1.0,
            end_1: span_1.1,
            text_2: text_2.into(),
            start_2: span_2.0,
            end_2: span_2.1,
            label,
            score: None,
        }
    }

    /// Attach a continuous score.
    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// The marked span text of the first sentence, if offsets are valid.
    #[must_use]
    pub fn span_1(&self) -> Option<&str> {
        self.text_1.get(self.start_1..self.end_1)
    }

    /// The marked span text of the second sentence, if offsets are valid.
    #[must_use]
    pub fn span_2(&self) -> Option<&str> {
        self.text_2.get(self.start_2..self.end_2)
    }
}
