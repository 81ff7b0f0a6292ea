//! Sub-word tokenizer adapter.
//!
//! The encoder's tokenizer is consumed as an opaque service: text in,
//! sub-tokens out, plus an id mapping and the four special tokens the
//! encoding algorithm needs (cls, sep, pad, mask). The vocabulary and the
//! sub-word algorithm are never inspected.
//!
//! Two implementations:
//!
//! - [`HfTokenizer`] (feature `hf-tokenizers`): wraps a HuggingFace
//!   `tokenizers::Tokenizer`, loadable from a local `tokenizer.json` or
//!   downloaded from the hub. Special tokens default to the XLM-R markers
//!   and are overridable per vocabulary (`SpecialTokens`); each one is
//!   checked against the vocabulary at construction.
//! - [`WhitespaceTokenizer`]: a deterministic, vocabulary-free double for
//!   tests and offline pipelines. One sub-token per whitespace-separated
//!   word, ids derived from a stable byte hash.

#[cfg(feature = "hf-tokenizers")]
use crate::Result;

/// Tokenize text into sub-tokens and map them to encoder vocabulary ids.
pub trait SubwordTokenizer {
    /// Tokenize raw text into sub-tokens (no special tokens added).
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Map sub-tokens to vocabulary ids, preserving order and length.
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64>;

    /// Sequence-start token (`<s>` / `[CLS]`).
    fn cls_token(&self) -> &str;

    /// Separator token (`</s>` / `[SEP]`).
    fn sep_token(&self) -> &str;

    /// Padding token.
    fn pad_token(&self) -> &str;

    /// Mask token.
    fn mask_token(&self) -> &str;

    /// Vocabulary id of the padding token.
    fn pad_id(&self) -> i64 {
        self.convert_tokens_to_ids(&[self.pad_token().to_string()])
            .first()
            .copied()
            .unwrap_or(0)
    }
}

// XLM-R special-token conventions, shared by both implementations.
const CLS: &str = "<s>";
const SEP: &str = "</s>";
const PAD: &str = "<pad>";
const MASK: &str = "<mask>";
const UNK: &str = "<unk>";

/// Deterministic, vocabulary-free tokenizer for tests and dry runs.
///
/// Splits on whitespace (one sub-token per word) and derives ids from an
/// FNV-1a hash of the token bytes, so identical input always yields
/// identical ids within and across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    // Special tokens get the XLM-R id block; everything else hashes into
    // the range [16, 16 + ID_SPACE).
    const ID_SPACE: u64 = 200_000;

    fn token_id(token: &str) -> i64 {
        match token {
            CLS => 0,
            PAD => 1,
            SEP => 2,
            UNK => 3,
            MASK => 4,
            _ => {
                let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
                for byte in token.as_bytes() {
                    hash ^= u64::from(*byte);
                    hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
                }
                16 + (hash % Self::ID_SPACE) as i64
            }
        }
    }
}

impl SubwordTokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        tokens.iter().map(|t| Self::token_id(t)).collect()
    }

    fn cls_token(&self) -> &str {
        CLS
    }

    fn sep_token(&self) -> &str {
        SEP
    }

    fn pad_token(&self) -> &str {
        PAD
    }

    fn mask_token(&self) -> &str {
        MASK
    }
}

/// The four special tokens the encoding algorithm needs, plus the unknown
/// token used as the fallback id. Defaults are the XLM-R conventions;
/// override for vocabularies with different markers (e.g. BERT's
/// `[CLS]`/`[SEP]`/`[PAD]`/`[MASK]`/`[UNK]`).
#[cfg(feature = "hf-tokenizers")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTokens {
    /// Sequence-start token.
    pub cls: String,
    /// Separator token.
    pub sep: String,
    /// Padding token.
    pub pad: String,
    /// Mask token.
    pub mask: String,
    /// Unknown token, used when a sub-token has no vocabulary id.
    pub unk: String,
}

#[cfg(feature = "hf-tokenizers")]
impl Default for SpecialTokens {
    fn default() -> Self {
        SpecialTokens {
            cls: CLS.to_string(),
            sep: SEP.to_string(),
            pad: PAD.to_string(),
            mask: MASK.to_string(),
            unk: UNK.to_string(),
        }
    }
}

#[cfg(feature = "hf-tokenizers")]
impl SpecialTokens {
    /// BERT/WordPiece conventions.
    #[must_use]
    pub fn bert() -> Self {
        SpecialTokens {
            cls: "[CLS]".to_string(),
            sep: "[SEP]".to_string(),
            pad: "[PAD]".to_string(),
            mask: "[MASK]".to_string(),
            unk: "[UNK]".to_string(),
        }
    }
}

/// HuggingFace tokenizer adapter.
///
/// Every configured special token is resolved against the vocabulary at
/// construction time; a marker the vocabulary does not know is a loud
/// [`Error::Tokenizer`](crate::Error::Tokenizer), never a silent unk id in
/// the emitted records.
#[cfg(feature = "hf-tokenizers")]
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    special: SpecialTokens,
    unk_id: i64,
}

#[cfg(feature = "hf-tokenizers")]
impl HfTokenizer {
    /// Load from a local `tokenizer.json` with XLM-R special tokens.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::from_file_with(path, SpecialTokens::default())
    }

    /// Load from a local `tokenizer.json` with explicit special tokens.
    pub fn from_file_with(
        path: impl AsRef<std::path::Path>,
        special: SpecialTokens,
    ) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path.as_ref())
            .map_err(|e| crate::Error::tokenizer(format!("failed to load tokenizer: {e}")))?;
        Self::from_tokenizer(inner, special)
    }

    /// Download `tokenizer.json` for `model_name` from the HuggingFace hub,
    /// with XLM-R special tokens.
    pub fn from_pretrained(model_name: &str) -> Result<Self> {
        Self::from_pretrained_with(model_name, SpecialTokens::default())
    }

    /// Download `tokenizer.json` for `model_name` from the HuggingFace hub,
    /// with explicit special tokens.
    pub fn from_pretrained_with(model_name: &str, special: SpecialTokens) -> Result<Self> {
        use hf_hub::api::sync::Api;

        let api = Api::new().map_err(|e| {
            crate::Error::retrieval(format!("failed to initialize HuggingFace API: {e}"))
        })?;
        let path = api
            .model(model_name.to_string())
            .get("tokenizer.json")
            .map_err(|e| {
                crate::Error::retrieval(format!("failed to download tokenizer.json: {e}"))
            })?;
        Self::from_file_with(path, special)
    }

    /// Wrap an already-loaded tokenizer, checking every special token
    /// against its vocabulary.
    pub fn from_tokenizer(inner: tokenizers::Tokenizer, special: SpecialTokens) -> Result<Self> {
        for (name, token) in [
            ("cls", &special.cls),
            ("sep", &special.sep),
            ("pad", &special.pad),
            ("mask", &special.mask),
            ("unk", &special.unk),
        ] {
            if inner.token_to_id(token).is_none() {
                return Err(crate::Error::tokenizer(format!(
                    "{name} token '{token}' is not in the vocabulary; \
                     configure the tokenizer's special tokens explicitly"
                )));
            }
        }
        let unk_id = inner.token_to_id(&special.unk).map_or(0, i64::from);
        Ok(HfTokenizer {
            inner,
            special,
            unk_id,
        })
    }
}

#[cfg(feature = "hf-tokenizers")]
impl SubwordTokenizer for HfTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        // Encoding without special tokens; errors degrade to an empty
        // sub-token sequence, which the feature builder treats as an
        // empty segment.
        match self.inner.encode(text, false) {
            Ok(encoding) => encoding.get_tokens().to_vec(),
            Err(e) => {
                log::warn!("tokenization failed: {e}");
                Vec::new()
            }
        }
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<i64> {
        tokens
            .iter()
            .map(|t| self.inner.token_to_id(t).map_or(self.unk_id, i64::from))
            .collect()
    }

    fn cls_token(&self) -> &str {
        &self.special.cls
    }

    fn sep_token(&self) -> &str {
        &self.special.sep
    }

    fn pad_token(&self) -> &str {
        &self.special.pad
    }

    fn mask_token(&self) -> &str {
        &self.special.mask
    }
}
