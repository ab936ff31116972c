use ndarray::{Array1, Array2};
use serde::Deserialize;

use crate::error::{ArtifactError, PredictError};
use crate::features::FeatureRecord;

/// Qualifying positions covered by the sweep chart. Wider than the form's
/// 1..=20 selector: the chart also shows back-of-grid starts.
pub const SWEEP_POSITIONS: std::ops::RangeInclusive<i32> = 1..=22;

/// Positions selectable for a single prediction.
pub const QUALI_POSITIONS: std::ops::RangeInclusive<i32> = 1..=20;

// ---------- On-disk parameter schema ----------

#[derive(Debug, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LayerParams {
    /// Row-major, one row per output unit.
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NetworkParams {
    pub layers: Vec<LayerParams>,
}

// ---------- In-memory model ----------

struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    fn transform(&self, x: &Array1<f64>) -> Array1<f64> {
        (x - &self.mean) / &self.scale
    }
}

struct Layer {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

/// Pre-fit standard scaler plus a pre-fit dense feed-forward regressor
/// (ReLU hidden layers, identity output). Inference is deterministic:
/// same scaled input, same output.
pub struct Predictor {
    scaler: Scaler,
    layers: Vec<Layer>,
    in_dim: usize,
}

impl Predictor {
    /// Validate parameter shapes and build the predictor. A mismatch between
    /// the scaler, the layer chain, and `in_dim` means the artifact does not
    /// belong to this code and is a fatal load error.
    pub fn from_params(
        scaler: ScalerParams,
        network: NetworkParams,
        in_dim: usize,
    ) -> Result<Self, ArtifactError> {
        if scaler.mean.len() != in_dim || scaler.scale.len() != in_dim {
            return Err(ArtifactError::Shape(format!(
                "scaler has {} means / {} scales for {} features",
                scaler.mean.len(),
                scaler.scale.len(),
                in_dim
            )));
        }
        if let Some(i) = scaler.scale.iter().position(|s| *s == 0.0) {
            return Err(ArtifactError::Shape(format!("scaler scale[{i}] is zero")));
        }
        if network.layers.is_empty() {
            return Err(ArtifactError::Shape("network has no layers".to_string()));
        }

        let mut layers = Vec::with_capacity(network.layers.len());
        let mut prev_dim = in_dim;
        for (li, layer) in network.layers.into_iter().enumerate() {
            let rows = layer.weights.len();
            if rows == 0 || rows != layer.biases.len() {
                return Err(ArtifactError::Shape(format!(
                    "layer {li} has {rows} weight rows and {} biases",
                    layer.biases.len()
                )));
            }
            let mut flat = Vec::with_capacity(rows * prev_dim);
            for (ri, row) in layer.weights.iter().enumerate() {
                if row.len() != prev_dim {
                    return Err(ArtifactError::Shape(format!(
                        "layer {li} row {ri} has {} weights, expected {prev_dim}",
                        row.len()
                    )));
                }
                flat.extend_from_slice(row);
            }
            let weights = Array2::from_shape_vec((rows, prev_dim), flat)
                .map_err(|e| ArtifactError::Shape(format!("layer {li}: {e}")))?;
            layers.push(Layer {
                weights,
                biases: Array1::from_vec(layer.biases),
            });
            prev_dim = rows;
        }
        if prev_dim != 1 {
            return Err(ArtifactError::Shape(format!(
                "network output dimension is {prev_dim}, expected 1"
            )));
        }

        Ok(Self {
            scaler: Scaler {
                mean: Array1::from_vec(scaler.mean),
                scale: Array1::from_vec(scaler.scale),
            },
            layers,
            in_dim,
        })
    }

    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Scale, then run the forward pass. Raw (untruncated) model output.
    pub fn predict_raw(&self, features: &[f64]) -> Result<f64, PredictError> {
        if features.len() != self.in_dim {
            return Err(PredictError::FeatureLength {
                got: features.len(),
                expected: self.in_dim,
            });
        }
        let x = Array1::from_vec(features.to_vec());
        let mut h = self.scaler.transform(&x);
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            h = layer.weights.dot(&h) + &layer.biases;
            if i != last {
                h.mapv_inplace(|v| v.max(0.0));
            }
        }
        Ok(h[0])
    }

    /// Predicted final grid position, truncated toward zero.
    pub fn predict_position(&self, features: &[f64]) -> Result<i32, PredictError> {
        Ok(self.predict_raw(features)?.trunc() as i32)
    }
}

/// Re-run inference for every qualifying position in `SWEEP_POSITIONS`,
/// holding everything else in `base` fixed. Output is ordered by
/// qualifying position.
pub fn sweep(
    predictor: &Predictor,
    feature_names: &[String],
    base: FeatureRecord,
) -> Result<Vec<(i32, i32)>, PredictError> {
    let mut points = Vec::with_capacity(22);
    for quali_pos in SWEEP_POSITIONS {
        let features = base.with_quali_pos(quali_pos).ordered(feature_names)?;
        points.push((quali_pos, predictor.predict_position(&features)?));
    }
    Ok(points)
}
