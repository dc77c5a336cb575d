//! Lazily trained statistical classifier over engineered case features.

mod features;
mod network;

pub use features::{Featurize, FEATURE_WIDTH};
pub use network::{Activation, AdamConfig, DenseLayer, FeedForwardNetwork};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use super::corpus::{CaseCorpusReader, CorpusError};
use super::domain::{IncidentPayload, PredictedRisk};
use super::taxonomy::legacy_to_index;

/// Most recent cases read for one training run.
pub const TRAINING_CORPUS_LIMIT: usize = 500;
pub const EPOCHS: usize = 25;
pub const BATCH_SIZE: usize = 16;
const HIDDEN_WIDTHS: [usize; 2] = [32, 16];
const CLASSES: usize = 4;

/// A trained network plus the facts needed to audit it.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    network: FeedForwardNetwork,
    pub sample_count: usize,
    pub last_trained_at: DateTime<Utc>,
    pub final_loss: f64,
}

impl TrainedModel {
    pub fn new(network: FeedForwardNetwork, sample_count: usize, final_loss: f64) -> Self {
        Self {
            network,
            sample_count,
            last_trained_at: Utc::now(),
            final_loss,
        }
    }

    pub fn network(&self) -> &FeedForwardNetwork {
        &self.network
    }
}

/// Trains on the case corpus; holds no model state between calls.
#[derive(Clone)]
pub struct TrainableClassifier {
    cases: Arc<dyn CaseCorpusReader>,
    seed: Option<u64>,
}

impl TrainableClassifier {
    pub fn new(cases: Arc<dyn CaseCorpusReader>) -> Self {
        Self { cases, seed: None }
    }

    /// Fixes weight initialisation and shuffling.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// `Ok(None)` when the corpus holds fewer than `min_samples` cases.
    pub async fn train(&self, min_samples: usize) -> Result<Option<TrainedModel>, ClassifierError> {
        let records = self.cases.find_recent(TRAINING_CORPUS_LIMIT).await?;
        if records.len() < min_samples {
            info!(
                available = records.len(),
                required = min_samples,
                "not enough cases to train the classifier"
            );
            return Ok(None);
        }

        let samples = records.len();
        let mut features = Array2::zeros((samples, FEATURE_WIDTH));
        let mut targets = Array2::zeros((samples, CLASSES));
        for (row, record) in records.iter().enumerate() {
            for (column, value) in record.features().into_iter().enumerate() {
                features[[row, column]] = value;
            }
            let label = legacy_to_index(record.risk_level.as_deref(), &record.incident_type);
            targets[[row, label.index()]] = 1.0;
        }

        let seed = self.seed;
        info!(samples, epochs = EPOCHS, "training classifier");
        let model = tokio::task::spawn_blocking(move || fit(&features, &targets, seed))
            .await
            .map_err(|error| ClassifierError::Training(error.to_string()))?;
        info!(
            samples = model.sample_count,
            loss = model.final_loss,
            "classifier trained"
        );
        Ok(Some(model))
    }

    /// Probability vector in canonical class order.
    pub fn predict(
        model: &TrainedModel,
        payload: &IncidentPayload,
    ) -> Result<[f64; CLASSES], ClassifierError> {
        let network = model.network();
        if network.input_width() != FEATURE_WIDTH || network.output_width() != CLASSES {
            return Err(ClassifierError::OutputShape {
                inputs: network.input_width(),
                outputs: network.output_width(),
            });
        }

        let input = Array2::from_shape_vec((1, FEATURE_WIDTH), payload.features().to_vec())
            .map_err(|error| ClassifierError::Training(error.to_string()))?;
        let output = network.predict(&input);

        let mut probabilities = [0.0; CLASSES];
        for (slot, value) in output.row(0).iter().enumerate() {
            if !value.is_finite() {
                return Err(ClassifierError::NonFinite);
            }
            probabilities[slot] = *value;
        }
        Ok(probabilities)
    }
}

fn fit(features: &Array2<f64>, targets: &Array2<f64>, seed: Option<u64>) -> TrainedModel {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let sizes = [FEATURE_WIDTH, HIDDEN_WIDTHS[0], HIDDEN_WIDTHS[1], CLASSES];
    let activations = [Activation::Relu, Activation::Relu, Activation::Softmax];
    let mut network = FeedForwardNetwork::new(&sizes, &activations, &mut rng);

    let mut loss = f64::NAN;
    for _ in 0..EPOCHS {
        loss = network.train_epoch(features, targets, BATCH_SIZE, &mut rng);
    }
    TrainedModel::new(network, features.nrows(), loss)
}

/// First maximal slot wins ties.
pub fn argmax(probabilities: &[f64]) -> PredictedRisk {
    let mut best = 0;
    for (slot, value) in probabilities.iter().enumerate() {
        if *value > probabilities[best] {
            best = slot;
        }
    }
    PredictedRisk::from_index(best).unwrap_or(PredictedRisk::Economic)
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error("model has {inputs} inputs and {outputs} outputs; expected 8 and 4")]
    OutputShape { inputs: usize, outputs: usize },
    #[error("model produced a non-finite probability")]
    NonFinite,
    #[error("training failed: {0}")]
    Training(String),
}
