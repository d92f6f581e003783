//! Estimator implementations
//!
//! Linear models are evaluated directly from their coefficients. Anything
//! else is exported to ONNX and run with tract.

use super::Estimator;
use crate::models::FeatureVector;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

fn check_input_len(expected: usize, features: &FeatureVector) -> Result<()> {
    if features.len() != expected {
        anyhow::bail!(
            "Shape mismatch: model expects {} features, got {}",
            expected,
            features.len()
        );
    }
    Ok(())
}

fn check_finite(value: f64) -> Result<f64> {
    if !value.is_finite() {
        anyhow::bail!("Model produced a non-finite value ({})", value);
    }
    Ok(value)
}

/// Ordinary least squares style model: `intercept + coefficients · x`
#[derive(Debug, Clone)]
pub struct LinearEstimator {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearEstimator {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }
}

impl Estimator for LinearEstimator {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        check_input_len(self.coefficients.len(), features)?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.as_slice())
            .map(|(c, x)| c * x)
            .sum();
        check_finite(self.intercept + dot)
    }

    fn input_len(&self) -> usize {
        self.coefficients.len()
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

/// ONNX graph executed with tract
pub struct OnnxEstimator {
    model: TractModel,
    num_features: usize,
}

impl OnnxEstimator {
    /// Parse and optimize an ONNX graph taking a `(1, num_features)` f32 input
    pub fn from_bytes(model_bytes: &[u8], num_features: usize) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        Ok(Self {
            model,
            num_features,
        })
    }

    fn features_to_tensor(&self, features: &FeatureVector) -> Result<Tensor> {
        let data: Vec<f32> = features.as_slice().iter().map(|&v| v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, self.num_features), data)
            .context("Failed to shape input tensor")?;
        Ok(array.into())
    }

}

impl Estimator for OnnxEstimator {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        check_input_len(self.num_features, features)?;
        let start = Instant::now();

        let input = self.features_to_tensor(features)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let value = output
            .to_array_view::<f32>()
            .context("Model output is not f32")?
            .iter()
            .next()
            .copied()
            .context("Model output is empty")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        check_finite(value as f64)
    }

    fn input_len(&self) -> usize {
        self.num_features
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}


/// Hand-encoded ONNX graphs for tests
#[cfg(test)]
pub(crate) mod fixtures {
    fn varint(mut value: u64, out: &mut Vec<u8>) {
        while value >= 0x80 {
            out.push((value as u8) | 0x80);
            value >>= 7;
        }
        out.push(value as u8);
    }

    fn field_varint(out: &mut Vec<u8>, field: u64, value: u64) {
        varint(field << 3, out);
        varint(value, out);
    }

    fn field_bytes(out: &mut Vec<u8>, field: u64, bytes: &[u8]) {
        varint((field << 3) | 2, out);
        varint(bytes.len() as u64, out);
        out.extend_from_slice(bytes);
    }

    const FLOAT: u64 = 1;

    fn tensor(name: &str, dims: &[u64], values: &[f32]) -> Vec<u8> {
        let mut out = Vec::new();
        for &d in dims {
            field_varint(&mut out, 1, d);
        }
        field_varint(&mut out, 2, FLOAT);
        field_bytes(&mut out, 8, name.as_bytes());
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        field_bytes(&mut out, 9, &raw);
        out
    }

    fn value_info(name: &str, dims: &[u64]) -> Vec<u8> {
        let mut shape = Vec::new();
        for &d in dims {
            let mut dim = Vec::new();
            field_varint(&mut dim, 1, d);
            field_bytes(&mut shape, 1, &dim);
        }
        let mut tensor_type = Vec::new();
        field_varint(&mut tensor_type, 1, FLOAT);
        field_bytes(&mut tensor_type, 2, &shape);
        let mut type_proto = Vec::new();
        field_bytes(&mut type_proto, 1, &tensor_type);

        let mut out = Vec::new();
        field_bytes(&mut out, 1, name.as_bytes());
        field_bytes(&mut out, 2, &type_proto);
        out
    }

    fn node(inputs: &[&str], output: &str, op_type: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for input in inputs {
            field_bytes(&mut out, 1, input.as_bytes());
        }
        field_bytes(&mut out, 2, output.as_bytes());
        field_bytes(&mut out, 4, op_type.as_bytes());
        out
    }

    /// `y = x · w + b` for an input of shape `(1, weights.len())`
    pub(crate) fn linear_graph(weights: &[f32], bias: f32) -> Vec<u8> {
        let n = weights.len() as u64;
        let mut graph = Vec::new();
        field_bytes(&mut graph, 1, &node(&["x", "w"], "xw", "MatMul"));
        field_bytes(&mut graph, 1, &node(&["xw", "b"], "y", "Add"));
        field_bytes(&mut graph, 2, b"linear");
        field_bytes(&mut graph, 5, &tensor("w", &[n, 1], weights));
        field_bytes(&mut graph, 5, &tensor("b", &[1], &[bias]));
        field_bytes(&mut graph, 11, &value_info("x", &[1, n]));
        field_bytes(&mut graph, 12, &value_info("y", &[1, 1]));

        let mut opset = Vec::new();
        field_varint(&mut opset, 2, 13);

        let mut model = Vec::new();
        field_varint(&mut model, 1, 7);
        field_bytes(&mut model, 7, &graph);
        field_bytes(&mut model, 8, &opset);
        model
    }
}
