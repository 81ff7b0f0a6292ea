//! Loss selection over the classification head output.
//!
//! The head output width decides the loss: width 1 means regression
//! (mean-squared error against the float-cast label), anything wider means
//! classification (cross-entropy against the categorical id). No other loss
//! terms are combined here.

use ndarray::ArrayView1;

use crate::features::FeatureLabel;
use crate::{Error, Result};

/// Scalar training loss for one example.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the head output is empty, when a
/// continuous score meets a classification-width output, or when a class id
/// is out of range.
pub fn training_loss(logits: ArrayView1<'_, f32>, label: &FeatureLabel) -> Result<f32> {
    match logits.len() {
        0 => Err(Error::invalid_input("empty head output")),
        1 => Ok((logits[0] - label.as_f32()).powi(2)),
        width => {
            let class = match label {
                FeatureLabel::Class(id) => *id,
                FeatureLabel::Score(_) => {
                    return Err(Error::invalid_input(
                        "continuous score with a classification head; \
                         train_scd requires mse_loss",
                    ));
                }
            };
            if class < 0 || class as usize >= width {
                return Err(Error::invalid_input(format!(
                    "class id {class} out of range for {width} classes"
                )));
            }
            Ok(log_sum_exp(logits) - logits[class as usize])
        }
    }
}

/// Mean scalar loss over a batch of (head output, label) pairs.
///
/// # Errors
///
/// Propagates the first per-example error; an empty batch is an error
/// rather than a NaN.
pub fn mean_training_loss(
    batch: &[(ArrayView1<'_, f32>, FeatureLabel)],
) -> Result<f32> {
    if batch.is_empty() {
        return Err(Error::invalid_input("empty batch"));
    }
    let mut total = 0.0;
    for (logits, label) in batch {
        total += training_loss(*logits, label)?;
    }
    Ok(total / batch.len() as f32)
}

/// Numerically stable `log(sum(exp(x)))`.
fn log_sum_exp(x: ArrayView1<'_, f32>) -> f32 {
    let max = x.fold(f32::NEG_INFINITY, |acc, v| acc.max(*v));
    max + x.iter().map(|v| (v - max).exp()).sum::<f32>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_mse_against_score() {
        let logits = arr1(&[0.3]);
        let loss = training_loss(logits.view(), &FeatureLabel::Score(0.8)).unwrap();
        assert!((loss - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_mse_casts_class_label() {
        let logits = arr1(&[0.0]);
        let loss = training_loss(logits.view(), &FeatureLabel::Class(1)).unwrap();
        assert!((loss - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_entropy_uniform_is_ln2() {
        let logits = arr1(&[0.0, 0.0]);
        let loss = training_loss(logits.view(), &FeatureLabel::Class(0)).unwrap();
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn test_cross_entropy_prefers_correct_class() {
        let logits = arr1(&[4.0, -4.0]);
        let right = training_loss(logits.view(), &FeatureLabel::Class(0)).unwrap();
        let wrong = training_loss(logits.view(), &FeatureLabel::Class(1)).unwrap();
        assert!(right < wrong);
        assert!(right < 0.01);
    }

    #[test]
    fn test_cross_entropy_shift_invariant() {
        let a = arr1(&[1.0, -1.0]);
        let b = arr1(&[101.0, 99.0]);
        let la = training_loss(a.view(), &FeatureLabel::Class(1)).unwrap();
        let lb = training_loss(b.view(), &FeatureLabel::Class(1)).unwrap();
        assert!((la - lb).abs() < 1e-4);
    }

    #[test]
    fn test_score_with_classification_head_rejected() {
        let logits = arr1(&[0.1, 0.2]);
        assert!(training_loss(logits.view(), &FeatureLabel::Score(0.5)).is_err());
    }

    #[test]
    fn test_class_out_of_range_rejected() {
        let logits = arr1(&[0.1, 0.2]);
        assert!(training_loss(logits.view(), &FeatureLabel::Class(2)).is_err());
        assert!(training_loss(logits.view(), &FeatureLabel::Class(-1)).is_err());
    }

    #[test]
    fn test_mean_over_batch() {
        let a = arr1(&[0.0]);
        let b = arr1(&[1.0]);
        let batch = [
            (a.view(), FeatureLabel::Score(0.0)),
            (b.view(), FeatureLabel::Score(0.0)),
        ];
        let loss = mean_training_loss(&batch).unwrap();
        assert!((loss - 0.5).abs() < 1e-6);
        assert!(mean_training_loss(&[]).is_err());
    }
}
