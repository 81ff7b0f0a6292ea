//! Classification head: merged feature vector → class scores.
//!
//! Two dense layers with a tanh in between and dropout after it. The output
//! width is fixed at construction from the configured loss (1 for
//! regression, 2 for binary classification), never inferred per call.
//! Dropout only applies on the training entry point; evaluation is
//! deterministic.

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

use crate::config::EncodingConfig;
use crate::{Error, Result};

/// One dense layer, `weight` laid out `[out, in]`.
#[derive(Debug, Clone)]
pub struct Dense {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl Dense {
    /// Build from explicit weights (deterministic, used in tests and when
    /// loading trained parameters).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the bias width does not match the
    /// weight's output dimension.
    pub fn from_weights(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self> {
        if weight.nrows() != bias.len() {
            return Err(Error::invalid_input(format!(
                "bias width {} does not match weight output dimension {}",
                bias.len(),
                weight.nrows()
            )));
        }
        Ok(Dense { weight, bias })
    }

    /// Xavier-uniform initialized layer.
    pub fn init(input: usize, output: usize, rng: &mut impl Rng) -> Self {
        let bound = (6.0 / (input + output) as f32).sqrt();
        let weight =
            Array2::from_shape_fn((output, input), |_| rng.gen_range(-bound..bound));
        Dense {
            weight,
            bias: Array1::zeros(output),
        }
    }

    fn forward(&self, x: ArrayView1<'_, f32>) -> Result<Array1<f32>> {
        if x.len() != self.weight.ncols() {
            return Err(Error::invalid_input(format!(
                "input width {} does not match layer input dimension {}",
                x.len(),
                self.weight.ncols()
            )));
        }
        Ok(self.weight.dot(&x) + &self.bias)
    }

    /// Input width.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.weight.ncols()
    }

    /// Output width.
    #[must_use]
    pub fn output_size(&self) -> usize {
        self.weight.nrows()
    }
}

/// Two-layer projection head over the merged span-pair feature vector.
#[derive(Debug, Clone)]
pub struct ClassificationHead {
    dense: Dense,
    out_proj: Dense,
    dropout: f32,
}

impl ClassificationHead {
    /// Randomly initialized head: `input_size → hidden_size → num_classes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `dropout` is outside `[0, 1)` or
    /// any dimension is zero.
    pub fn new(
        input_size: usize,
        hidden_size: usize,
        num_classes: usize,
        dropout: f32,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if input_size == 0 || hidden_size == 0 || num_classes == 0 {
            return Err(Error::invalid_config("head dimensions must be positive"));
        }
        if !(0.0..1.0).contains(&dropout) {
            return Err(Error::invalid_config(format!(
                "dropout must be in [0, 1), got {dropout}"
            )));
        }
        Ok(ClassificationHead {
            dense: Dense::init(input_size, hidden_size, rng),
            out_proj: Dense::init(hidden_size, num_classes, rng),
            dropout,
        })
    }

    /// Head sized for a configuration: input width from pooling/merge
    /// strategies, output width from the loss (1 for mse, 2 for
    /// cross-entropy).
    pub fn for_config(
        config: &EncodingConfig,
        hidden_size: usize,
        dropout: f32,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.head_input_size(hidden_size),
            hidden_size,
            config.loss.num_classes(),
            dropout,
            rng,
        )
    }

    /// Build from explicit layers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the layer widths do not chain.
    pub fn from_layers(dense: Dense, out_proj: Dense, dropout: f32) -> Result<Self> {
        if dense.output_size() != out_proj.input_size() {
            return Err(Error::invalid_input(format!(
                "dense output {} does not feed out_proj input {}",
                dense.output_size(),
                out_proj.input_size()
            )));
        }
        Ok(ClassificationHead {
            dense,
            out_proj,
            dropout,
        })
    }

    /// Evaluation forward pass: dense → tanh → out_proj. Deterministic;
    /// dropout is the identity here.
    pub fn forward(&self, features: ArrayView1<'_, f32>) -> Result<Array1<f32>> {
        let hidden = self.dense.forward(features)?.mapv(f32::tanh);
        self.out_proj.forward(hidden.view())
    }

    /// Training forward pass: dense → tanh → inverted dropout → out_proj.
    pub fn forward_train(
        &self,
        features: ArrayView1<'_, f32>,
        rng: &mut impl Rng,
    ) -> Result<Array1<f32>> {
        let mut hidden = self.dense.forward(features)?.mapv(f32::tanh);
        if self.dropout > 0.0 {
            let keep = 1.0 - self.dropout;
            hidden.mapv_inplace(|x| {
                if rng.gen::<f32>() < keep {
                    x / keep
                } else {
                    0.0
                }
            });
        }
        self.out_proj.forward(hidden.view())
    }

    /// Width of the head output (1 or 2 in this crate's configurations).
    #[must_use]
    pub fn output_size(&self) -> usize {
        self.out_proj.output_size()
    }

    /// Width of the merged feature vector this head expects.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.dense.input_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LossKind, MergeType, PoolType};
    use ndarray::{arr1, arr2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity_head(dropout: f32) -> ClassificationHead {
        // dense: 2 → 2 identity, out_proj: 2 → 1 summing layer
        let dense = Dense::from_weights(
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr1(&[0.0, 0.0]),
        )
        .unwrap();
        let out_proj = Dense::from_weights(arr2(&[[1.0, 1.0]]), arr1(&[0.5])).unwrap();
        ClassificationHead::from_layers(dense, out_proj, dropout).unwrap()
    }

    #[test]
    fn test_forward_applies_tanh_then_projection() {
        let head = identity_head(0.5);
        let out = head.forward(arr1(&[0.0, 1000.0]).view()).unwrap();
        // tanh(0) + tanh(1000) + bias = 0 + 1 + 0.5
        assert_eq!(out.len(), 1);
        assert!((out[0] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let head = ClassificationHead::new(4, 3, 2, 0.5, &mut rng).unwrap();
        let x = arr1(&[0.1, -0.2, 0.3, 0.4]);
        let a = head.forward(x.view()).unwrap();
        let b = head.forward(x.view()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_zero_dropout_training_matches_eval() {
        let head = identity_head(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let x = arr1(&[0.3, -0.7]);
        let train = head.forward_train(x.view(), &mut rng).unwrap();
        let eval = head.forward(x.view()).unwrap();
        assert_eq!(train, eval);
    }

    #[test]
    fn test_dropout_zeroes_or_scales() {
        // dense 1 → 1 identity so the single hidden unit is observable.
        let dense = Dense::from_weights(arr2(&[[1.0]]), arr1(&[0.0])).unwrap();
        let out_proj = Dense::from_weights(arr2(&[[1.0]]), arr1(&[0.0])).unwrap();
        let head = ClassificationHead::from_layers(dense, out_proj, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let x = arr1(&[0.5]);
        let expected_kept = 0.5f32.tanh() / 0.5;
        for _ in 0..32 {
            let out = head.forward_train(x.view(), &mut rng).unwrap();
            assert!(out[0] == 0.0 || (out[0] - expected_kept).abs() < 1e-6);
        }
    }

    #[test]
    fn test_for_config_sizes() {
        let config = EncodingConfig {
            model_name: "test".into(),
            max_seq_len: 32,
            pool_type: PoolType::Combined,
            target_embeddings: MergeType::Concat,
            mask_syns: false,
            symmetric: false,
            train_scd: false,
            loss: LossKind::CrossentropyLoss,
            roles: vec!["Target".into(), "Synonym".into()],
        };
        let mut rng = StdRng::seed_from_u64(0);
        let head = ClassificationHead::for_config(&config, 8, 0.1, &mut rng).unwrap();
        assert_eq!(head.input_size(), 8 * 3 * 2);
        assert_eq!(head.output_size(), 2);
    }

    #[test]
    fn test_width_mismatch_is_an_error() {
        let head = identity_head(0.0);
        assert!(head.forward(arr1(&[1.0, 2.0, 3.0]).view()).is_err());
    }

    #[test]
    fn test_invalid_dropout_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(ClassificationHead::new(2, 2, 2, 1.0, &mut rng).is_err());
        assert!(ClassificationHead::new(2, 2, 2, -0.1, &mut rng).is_err());
        assert!(ClassificationHead::new(0, 2, 2, 0.1, &mut rng).is_err());
    }
}
