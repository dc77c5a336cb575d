//! Small dense feed-forward network trained with mini-batch Adam.
//!
//! Only what the triage classifier needs: ReLU hidden layers, a softmax output and
//! categorical cross-entropy.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Softmax,
}

impl Activation {
    fn forward(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Softmax => softmax_rows(z),
        }
    }
}

/// Row-wise softmax, shifted by the row maximum for numerical stability.
fn softmax_rows(z: &Array2<f64>) -> Array2<f64> {
    let mut out = z.clone();
    for mut row in out.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Adam moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
struct AdamState<D> {
    m: D,
    v: D,
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
    pub activation: Activation,
    weight_moments: AdamState<Array2<f64>>,
    bias_moments: AdamState<Array1<f64>>,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero biases.
    pub fn new(inputs: usize, outputs: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = Array2::from_shape_fn((inputs, outputs), |_| rng.random_range(-limit..limit));
        Self {
            weights,
            biases: Array1::zeros(outputs),
            activation,
            weight_moments: AdamState {
                m: Array2::zeros((inputs, outputs)),
                v: Array2::zeros((inputs, outputs)),
            },
            bias_moments: AdamState {
                m: Array1::zeros(outputs),
                v: Array1::zeros(outputs),
            },
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn outputs(&self) -> usize {
        self.weights.ncols()
    }

    /// Returns (pre-activation, activation).
    fn forward(&self, input: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        let z = input.dot(&self.weights) + &self.biases;
        let a = self.activation.forward(&z);
        (z, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedForwardNetwork {
    layers: Vec<DenseLayer>,
    optimizer: AdamConfig,
    step: i32,
}

impl FeedForwardNetwork {
    /// `sizes` lists every layer width including the input; `activations` has one entry
    /// per weight layer. Softmax is only accepted on the output layer.
    pub fn new(sizes: &[usize], activations: &[Activation], rng: &mut StdRng) -> Self {
        assert_eq!(
            sizes.len(),
            activations.len() + 1,
            "one activation per weight layer"
        );
        if let Some((_, hidden)) = activations.split_last() {
            assert!(
                hidden.iter().all(|activation| matches!(activation, Activation::Relu)),
                "softmax is only supported on the output layer"
            );
        }
        let layers = sizes
            .windows(2)
            .zip(activations)
            .map(|(pair, activation)| DenseLayer::new(pair[0], pair[1], *activation, rng))
            .collect();
        Self {
            layers,
            optimizer: AdamConfig::default(),
            step: 0,
        }
    }

    pub fn with_optimizer(mut self, optimizer: AdamConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map(DenseLayer::inputs).unwrap_or(0)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map(DenseLayer::outputs).unwrap_or(0)
    }

    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    pub fn predict(&self, input: &Array2<f64>) -> Array2<f64> {
        self.layers
            .iter()
            .fold(input.clone(), |activation, layer| layer.forward(&activation).1)
    }

    /// Mean categorical cross-entropy.
    pub fn loss(predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
        let epsilon = 1e-12;
        let clipped = predictions.mapv(|p| p.clamp(epsilon, 1.0 - epsilon));
        -(targets * &clipped.mapv(f64::ln)).sum() / predictions.nrows().max(1) as f64
    }

    /// One pass over the data in shuffled mini-batches; returns the mean batch loss.
    pub fn train_epoch(
        &mut self,
        features: &Array2<f64>,
        targets: &Array2<f64>,
        batch_size: usize,
        rng: &mut StdRng,
    ) -> f64 {
        let samples = features.nrows();
        if samples == 0 {
            return 0.0;
        }
        let batch_size = batch_size.max(1);
        let mut indices: Vec<usize> = (0..samples).collect();
        indices.shuffle(rng);

        let mut total = 0.0;
        let mut batches = 0;
        for chunk in indices.chunks(batch_size) {
            let x = features.select(Axis(0), chunk);
            let y = targets.select(Axis(0), chunk);
            total += self.train_batch(&x, &y);
            batches += 1;
        }
        total / batches as f64
    }

    fn train_batch(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> f64 {
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut activation = x.clone();
        for layer in &self.layers {
            let (z, a) = layer.forward(&activation);
            inputs.push(activation);
            pre_activations.push(z);
            activation = a;
        }
        let loss = Self::loss(&activation, y);

        // Softmax followed by cross-entropy has gradient (p - y) / n at the logits.
        let mut delta = (&activation - y) / x.nrows() as f64;
        self.step += 1;
        for index in (0..self.layers.len()).rev() {
            let weight_gradient = inputs[index].t().dot(&delta);
            let bias_gradient = delta.sum_axis(Axis(0));
            let upstream = delta.dot(&self.layers[index].weights.t());

            self.apply_adam(index, &weight_gradient, &bias_gradient);

            if index > 0 {
                let below = &pre_activations[index - 1];
                delta = match self.layers[index - 1].activation {
                    Activation::Relu => upstream * &below.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
                    Activation::Softmax => unreachable!("hidden layers are relu"),
                };
            }
        }
        loss
    }

    fn apply_adam(&mut self, index: usize, weight_gradient: &Array2<f64>, bias_gradient: &Array1<f64>) {
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.optimizer;
        let correction1 = 1.0 - beta1.powi(self.step);
        let correction2 = 1.0 - beta2.powi(self.step);
        let layer = &mut self.layers[index];

        let moments = &mut layer.weight_moments;
        moments.m = &moments.m * beta1 + weight_gradient * (1.0 - beta1);
        moments.v = &moments.v * beta2 + &weight_gradient.mapv(|g| g * g) * (1.0 - beta2);
        let update = (&moments.m / correction1)
            / ((&moments.v / correction2).mapv(f64::sqrt) + epsilon);
        layer.weights = &layer.weights - &(update * learning_rate);

        let moments = &mut layer.bias_moments;
        moments.m = &moments.m * beta1 + bias_gradient * (1.0 - beta1);
        moments.v = &moments.v * beta2 + &bias_gradient.mapv(|g| g * g) * (1.0 - beta2);
        let update = (&moments.m / correction1)
            / ((&moments.v / correction2).mapv(f64::sqrt) + epsilon);
        layer.biases = &layer.biases - &(update * learning_rate);
    }
}
