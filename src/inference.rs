//! Turns a raw message into a label and its probability.

use std::sync::Arc;

use crate::error::PredictError;
use crate::models::Prediction;
use crate::store::ModelArtifacts;

#[derive(Debug, Clone)]
pub struct InferenceAdapter {
    models: Arc<ModelArtifacts>,
    max_message_chars: usize,
}

impl InferenceAdapter {
    pub fn new(models: Arc<ModelArtifacts>, max_message_chars: usize) -> Self {
        Self {
            models,
            max_message_chars,
        }
    }

    pub fn models(&self) -> &ModelArtifacts {
        &self.models
    }

    pub fn predict(&self, message: &str) -> Result<Prediction, PredictError> {
        if message.trim().is_empty() {
            return Err(PredictError::invalid_input("message cannot be empty"));
        }
        let chars = message.chars().count();
        if chars > self.max_message_chars {
            return Err(PredictError::invalid_input(format!(
                "message is {chars} characters, limit is {}",
                self.max_message_chars
            )));
        }

        let x = self.models.vectorizer.transform(message);
        let classifier = &self.models.classifier;
        let label = classifier.predict(&x);
        let probs = classifier.predict_proba(&x);

        // Look the column up by label; labels need not be 0- or 1-based.
        let column = classifier
            .classes()
            .iter()
            .position(|&c| c == label)
            .ok_or_else(|| {
                PredictError::inference(format!("label {label} has no probability column"))
            })?;
        let probability = probs[column];
        if !probability.is_finite() {
            return Err(PredictError::inference(format!(
                "non-finite probability for label {label}"
            )));
        }

        Ok(Prediction {
            label,
            probability: round2(probability.clamp(0.0, 1.0)),
        })
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
