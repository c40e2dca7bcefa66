//! Multinomial naive Bayes classifier restored from a fitted artifact.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::ModelLoadError;
use crate::store::FORMAT_VERSION;

/// On-disk form of a fitted classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    /// Known labels, in the column order of `class_log_prior` and `feature_log_prob`.
    pub classes: Vec<i64>,
    pub class_log_prior: Vec<f64>,
    /// One row per class, one column per feature.
    pub feature_log_prob: Vec<Vec<f64>>,
}

#[derive(Debug)]
pub struct MultinomialNb {
    classes: Vec<i64>,
    class_log_prior: Array1<f64>,
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    pub fn from_artifact(
        artifact: ClassifierArtifact,
        path: &Path,
    ) -> Result<Self, ModelLoadError> {
        if artifact.format_version != FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                found: artifact.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let n_classes = artifact.classes.len();
        if n_classes == 0 {
            return Err(ModelLoadError::invalid(path, "no classes"));
        }
        let unique: HashSet<_> = artifact.classes.iter().collect();
        if unique.len() != n_classes {
            return Err(ModelLoadError::invalid(path, "duplicate class labels"));
        }
        if artifact.class_log_prior.len() != n_classes {
            return Err(ModelLoadError::invalid(
                path,
                format!(
                    "{} classes but {} class priors",
                    n_classes,
                    artifact.class_log_prior.len()
                ),
            ));
        }
        if artifact.feature_log_prob.len() != n_classes {
            return Err(ModelLoadError::invalid(
                path,
                format!(
                    "{} classes but {} feature_log_prob rows",
                    n_classes,
                    artifact.feature_log_prob.len()
                ),
            ));
        }

        let n_features = artifact.feature_log_prob[0].len();
        if n_features == 0 {
            return Err(ModelLoadError::invalid(path, "classifier has no features"));
        }
        if artifact
            .feature_log_prob
            .iter()
            .any(|row| row.len() != n_features)
        {
            return Err(ModelLoadError::invalid(path, "ragged feature_log_prob rows"));
        }

        let flat: Vec<f64> = artifact.feature_log_prob.into_iter().flatten().collect();
        if flat
            .iter()
            .chain(artifact.class_log_prior.iter())
            .any(|v| !v.is_finite())
        {
            return Err(ModelLoadError::invalid(path, "non-finite log probabilities"));
        }
        let feature_log_prob = Array2::from_shape_vec((n_classes, n_features), flat)
            .map_err(|e| ModelLoadError::invalid(path, e.to_string()))?;

        Ok(Self {
            classes: artifact.classes,
            class_log_prior: Array1::from(artifact.class_log_prior),
            feature_log_prob,
        })
    }

    /// Labels in probability column order.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    /// Unnormalised log posterior per class.
    fn joint_log_likelihood(&self, x: &Array1<f64>) -> Array1<f64> {
        self.feature_log_prob.dot(x) + &self.class_log_prior
    }

    /// Label with the highest posterior; the earlier column wins ties.
    pub fn predict(&self, x: &Array1<f64>) -> i64 {
        let jll = self.joint_log_likelihood(x);
        let mut best = 0;
        for (i, &v) in jll.iter().enumerate() {
            if v > jll[best] {
                best = i;
            }
        }
        self.classes[best]
    }

    /// Posterior distribution over `classes()`, in the same order.
    pub fn predict_proba(&self, x: &Array1<f64>) -> Array1<f64> {
        let jll = self.joint_log_likelihood(x);
        let max = jll.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let log_norm = max + jll.mapv(|v| (v - max).exp()).sum().ln();
        jll.mapv(|v| (v - log_norm).exp())
    }
}
