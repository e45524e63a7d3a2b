//! Metrics for evaluating binary predictions.
use crate::error::{NetworkError, Result};
use ndarray::Array2;

fn check_shapes(prediction: &Array2<f64>, labels: &Array2<f64>) -> Result<()> {
    if prediction.dim() != labels.dim() {
        return Err(NetworkError::invalid(format!(
            "predictions {:?} and labels {:?} differ in shape",
            prediction.dim(),
            labels.dim()
        )));
    }
    if prediction.is_empty() {
        return Err(NetworkError::invalid("no predictions to score"));
    }
    Ok(())
}

/// Fraction of predictions equal to their label. Both matrices hold 0/1
/// values in the same, non-empty shape.
pub fn accuracy(prediction: &Array2<f64>, labels: &Array2<f64>) -> Result<f64> {
    check_shapes(prediction, labels)?;
    let correct = prediction
        .iter()
        .zip(labels.iter())
        .filter(|(p, t)| p == t)
        .count();
    Ok(correct as f64 / prediction.len() as f64)
}

/// 2x2 confusion matrix indexed `[true_class][pred_class]`.
pub fn confusion_matrix(prediction: &Array2<f64>, labels: &Array2<f64>) -> Result<[[usize; 2]; 2]> {
    check_shapes(prediction, labels)?;
    let mut cm = [[0; 2]; 2];
    for (&p, &t) in prediction.iter().zip(labels.iter()) {
        cm[(t >= 0.5) as usize][(p >= 0.5) as usize] += 1;
    }
    Ok(cm)
}
