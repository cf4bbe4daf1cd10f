use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Version written into every serialized model.
pub const MODEL_VERSION: i64 = 1;
const IMAGE_SHAPE: [usize; 3] = [28, 28, 1];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Sigmoid,
    Linear,
}

impl Activation {
    pub fn apply(self, value: f32) -> f32 {
        match self {
            Activation::Relu => value.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-value).exp()),
            Activation::Linear => value,
        }
    }

    /// Derivative expressed in terms of the activation's own output.
    pub fn derivative(self, output: f32) -> f32 {
        match self {
            Activation::Relu => {
                if output > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => output * (1.0 - output),
            Activation::Linear => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Linear => "linear",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseLayer {
    pub input_size: usize,
    pub output_size: usize,
    pub activation: Activation,
    /// Row-major `[input_size, output_size]`.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    /// He-uniform weights, zero bias.
    pub fn he_uniform<R: Rng>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / input_size.max(1) as f32).sqrt();
        let weights = (0..input_size * output_size)
            .map(|_| rng.random_range(-limit..limit))
            .collect();
        Self {
            input_size,
            output_size,
            activation,
            weights,
            bias: vec![0.0; output_size],
        }
    }

    pub fn param_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    pub fn weight_view(&self) -> Result<ArrayView2<'_, f32>, String> {
        ArrayView2::from_shape((self.input_size, self.output_size), &self.weights)
            .map_err(|err| format!("weights do not match {}x{}: {err}", self.input_size, self.output_size))
    }

    /// Apply the layer to a `[batch, input_size]` matrix.
    pub fn forward(&self, input: &ArrayView2<'_, f32>) -> Result<Array2<f32>, String> {
        let mut out = input.dot(&self.weight_view()?);
        out += &ArrayView1::from(&self.bias[..]);
        let activation = self.activation;
        out.mapv_inplace(|v| activation.apply(v));
        Ok(out)
    }
}

/// A stack of dense layers fed with a flattened image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequentialModel {
    pub model_version: i64,
    /// `[rows, cols, channels]` of the expected input image.
    pub input_shape: [usize; 3],
    pub layers: Vec<DenseLayer>,
}

impl SequentialModel {
    pub const KIND: &'static str = "Sequential";

    /// Flatten(784) -> Dense(300, relu) -> Dense(100, relu) -> Dense(10, sigmoid).
    pub fn default_architecture(seed: u64) -> Self {
        Self::with_layers(
            IMAGE_SHAPE,
            &[
                (300, Activation::Relu),
                (100, Activation::Relu),
                (10, Activation::Sigmoid),
            ],
            seed,
        )
    }

    /// Build a freshly initialized model from `(units, activation)` pairs.
    pub fn with_layers(input_shape: [usize; 3], layers: &[(usize, Activation)], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut input_size = input_shape.iter().product();
        let layers = layers
            .iter()
            .map(|&(units, activation)| {
                let layer = DenseLayer::he_uniform(input_size, units, activation, &mut rng);
                input_size = units;
                layer
            })
            .collect();
        Self {
            model_version: MODEL_VERSION,
            input_shape,
            layers,
        }
    }

    pub fn kind(&self) -> &'static str {
        Self::KIND
    }

    pub fn input_len(&self) -> usize {
        self.input_shape.iter().product()
    }

    pub fn output_len(&self) -> usize {
        self.layers.last().map(|l| l.output_size).unwrap_or(0)
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(DenseLayer::param_count).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {})",
                self.model_version, MODEL_VERSION
            ));
        }
        if self.input_len() == 0 {
            return Err("input_shape must be non-zero".to_string());
        }
        if self.layers.is_empty() {
            return Err("model has no layers".to_string());
        }
        let mut expected_input = self.input_len();
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.input_size != expected_input {
                return Err(format!(
                    "layer {idx} expects {} inputs but receives {expected_input}",
                    layer.input_size
                ));
            }
            if layer.output_size == 0 {
                return Err(format!("layer {idx} has no units"));
            }
            if layer.weights.len() != layer.input_size * layer.output_size {
                return Err(format!("layer {idx} weights length mismatch"));
            }
            if layer.bias.len() != layer.output_size {
                return Err(format!("layer {idx} bias length mismatch"));
            }
            if layer.weights.iter().chain(&layer.bias).any(|v| !v.is_finite()) {
                return Err(format!("layer {idx} contains non-finite parameters"));
            }
            expected_input = layer.output_size;
        }
        Ok(())
    }

    /// Human-readable layer table.
    pub fn summary(&self) -> String {
        let mut out = format!("Model: {}\n", self.kind());
        out.push_str(&format!("{:<24}{:<16}{:>10}\n", "Layer (type)", "Output shape", "Param #"));
        out.push_str(&format!(
            "{:<24}{:<16}{:>10}\n",
            "flatten (Flatten)",
            format!("(None, {})", self.input_len()),
            0
        ));
        for (idx, layer) in self.layers.iter().enumerate() {
            out.push_str(&format!(
                "{:<24}{:<16}{:>10}\n",
                format!("dense_{} ({})", idx + 1, layer.activation.name()),
                format!("(None, {})", layer.output_size),
                layer.param_count()
            ));
        }
        out.push_str(&format!("Total params: {}\n", self.param_count()));
        out
    }

    /// Run a `[batch, input_len]` matrix through every layer.
    pub fn forward_batch(&self, input: ArrayView2<'_, f32>) -> Result<Array2<f32>, String> {
        if input.ncols() != self.input_len() {
            return Err(format!(
                "expected {} input features, got {}",
                self.input_len(),
                input.ncols()
            ));
        }
        let mut current = input.to_owned();
        for layer in &self.layers {
            current = layer.forward(&current.view())?;
        }
        Ok(current)
    }

    /// Raw output of the final layer for one flattened image.
    pub fn predict_logits(&self, features: &[f32]) -> Vec<f32> {
        let Ok(input) = ArrayView2::from_shape((1, features.len()), features) else {
            return Vec::new();
        };
        match self.forward_batch(input) {
            Ok(out) => out.iter().copied().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        softmax(&self.predict_logits(features))
    }

    pub fn predict_class_index(&self, features: &[f32]) -> Option<usize> {
        argmax(&self.predict_proba(features))
    }
}

/// Compute a numerically-stable softmax for a set of logits.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if best.is_none_or(|(_, best_val)| v > best_val) {
            best = Some((idx, v));
        }
    }
    best.map(|(idx, _)| idx)
}
