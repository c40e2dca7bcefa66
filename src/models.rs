use serde::{Deserialize, Serialize};

/// Body of `POST /predict`.
#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: i64,
    /// Probability of `label`, rounded to 2 decimals.
    pub probability: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub classes: Vec<i64>,
    pub n_features: usize,
}
