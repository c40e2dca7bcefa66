//! TF-IDF vectorizer restored from a fitted artifact.

use ndarray::Array1;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::ModelLoadError;
use crate::store::FORMAT_VERSION;

const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk form of a fitted vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub format_version: u32,
    /// Term to feature column.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature column.
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default)]
    pub sublinear_tf: bool,
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

#[derive(Debug)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
    lowercase: bool,
    token_pattern: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    norm: Option<Norm>,
    sublinear_tf: bool,
}

impl TfidfVectorizer {
    /// Validates an artifact and compiles it into a usable vectorizer.
    ///
    /// `path` is only used for error messages.
    pub fn from_artifact(
        artifact: VectorizerArtifact,
        path: &Path,
    ) -> Result<Self, ModelLoadError> {
        if artifact.format_version != FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                found: artifact.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let n_features = artifact.idf.len();
        if n_features == 0 {
            return Err(ModelLoadError::invalid(path, "empty vocabulary"));
        }
        if artifact.vocabulary.len() != n_features {
            return Err(ModelLoadError::invalid(
                path,
                format!(
                    "vocabulary has {} terms but idf has {} entries",
                    artifact.vocabulary.len(),
                    n_features
                ),
            ));
        }

        let mut seen = vec![false; n_features];
        for (term, &column) in &artifact.vocabulary {
            match seen.get_mut(column) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(ModelLoadError::invalid(
                        path,
                        format!("column {column} is assigned twice (at `{term}`)"),
                    ))
                }
                None => {
                    return Err(ModelLoadError::invalid(
                        path,
                        format!("term `{term}` maps to column {column}, outside 0..{n_features}"),
                    ))
                }
            }
        }

        if artifact.idf.iter().any(|w| !w.is_finite()) {
            return Err(ModelLoadError::invalid(path, "idf contains non-finite weights"));
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelLoadError::invalid(
                path,
                format!("bad ngram_range ({min_n}, {max_n})"),
            ));
        }

        let token_pattern = Regex::new(&artifact.token_pattern).map_err(|e| {
            ModelLoadError::invalid(path, format!("bad token_pattern: {e}"))
        })?;

        // Matched against tokens after lowercasing, exactly as listed
        let stop_words = artifact.stop_words.unwrap_or_default().into_iter().collect();

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: Array1::from(artifact.idf),
            lowercase: artifact.lowercase,
            token_pattern,
            ngram_range: artifact.ngram_range,
            stop_words,
            norm: artifact.norm,
            sublinear_tf: artifact.sublinear_tf,
        })
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Splits a document into the terms the vocabulary is keyed by.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let doc = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&doc)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Maps a document onto the fitted feature space.
    ///
    /// Terms outside the vocabulary are dropped. A document with no known
    /// terms yields the zero vector.
    pub fn transform(&self, text: &str) -> Array1<f64> {
        let mut features = Array1::<f64>::zeros(self.n_features());
        for term in self.analyze(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                features[column] += 1.0;
            }
        }

        if self.sublinear_tf {
            features.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }
        features *= &self.idf;

        let scale = match self.norm {
            Some(Norm::L2) => features.dot(&features).sqrt(),
            Some(Norm::L1) => features.iter().map(|v| v.abs()).sum(),
            None => 1.0,
        };
        if scale > 0.0 {
            features /= scale;
        }
        features
    }
}
