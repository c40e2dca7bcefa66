//! Loads the vectorizer and classifier artifacts from disk.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use crate::classifier::{ClassifierArtifact, MultinomialNb};
use crate::error::ModelLoadError;
use crate::vectorizer::{TfidfVectorizer, VectorizerArtifact};

/// Artifact format version understood by this build.
pub const FORMAT_VERSION: u32 = 1;

/// A vectorizer and classifier known to be fitted together.
///
/// Immutable once loaded; share it behind an `Arc`.
#[derive(Debug)]
pub struct ModelArtifacts {
    pub vectorizer: TfidfVectorizer,
    pub classifier: MultinomialNb,
}

pub struct ModelStore;

impl ModelStore {
    /// Reads both artifacts and checks that their feature spaces agree.
    pub fn load(
        vectorizer_path: impl AsRef<Path>,
        classifier_path: impl AsRef<Path>,
    ) -> Result<ModelArtifacts, ModelLoadError> {
        let vectorizer_path = vectorizer_path.as_ref();
        let classifier_path = classifier_path.as_ref();

        let artifact: VectorizerArtifact = read_json(vectorizer_path)?;
        let vectorizer = TfidfVectorizer::from_artifact(artifact, vectorizer_path)?;
        debug!(
            path = %vectorizer_path.display(),
            n_features = vectorizer.n_features(),
            "vectorizer loaded"
        );

        let artifact: ClassifierArtifact = read_json(classifier_path)?;
        let classifier = MultinomialNb::from_artifact(artifact, classifier_path)?;
        debug!(
            path = %classifier_path.display(),
            classes = ?classifier.classes(),
            "classifier loaded"
        );

        ModelArtifacts::new(vectorizer, classifier)
    }
}

impl ModelArtifacts {
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: MultinomialNb,
    ) -> Result<Self, ModelLoadError> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(ModelLoadError::Incompatible {
                vectorizer: vectorizer.n_features(),
                classifier: classifier.n_features(),
            });
        }
        info!(
            n_features = vectorizer.n_features(),
            n_classes = classifier.classes().len(),
            "model artifacts ready"
        );
        Ok(Self {
            vectorizer,
            classifier,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelLoadError> {
    let file = File::open(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ModelLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{classifier, vectorizer};
    use std::io::Write;
    use tempfile::TempDir;

    /// Writes a small spam/ham artifact pair, returning the vectorizer and classifier paths.
    pub(crate) fn write_spam_ham(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let vec_path = dir.path().join("tfidf_vec.json");
        let nb_path = dir.path().join("nb_model.json");

        let v = vectorizer::tests::artifact(&["free", "money", "now", "lunch", "meeting"]);
        let c = classifier::tests::artifact(
            vec![0, 1],
            vec![0.6, 0.4],
            vec![
                vec![0.05, 0.05, 0.2, 0.35, 0.35],
                vec![0.4, 0.35, 0.15, 0.05, 0.05],
            ],
        );
        std::fs::write(&vec_path, serde_json::to_vec(&v).unwrap()).unwrap();
        std::fs::write(&nb_path, serde_json::to_vec(&c).unwrap()).unwrap();
        (vec_path, nb_path)
    }

    #[test]
    fn loads_a_compatible_pair() {
        let dir = TempDir::new().unwrap();
        let (v, c) = write_spam_ham(&dir);
        let models = ModelStore::load(&v, &c).unwrap();
        assert_eq!(models.vectorizer.n_features(), 5);
        assert_eq!(models.classifier.classes(), &[0, 1]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let (v, _) = write_spam_ham(&dir);
        let err = ModelStore::load(&v, dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn corrupt_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let (v, c) = write_spam_ham(&dir);
        let mut f = File::create(&c).unwrap();
        f.write_all(b"\x80\x04\x95 not json").unwrap();
        let err = ModelStore::load(&v, &c).unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse { .. }));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let dir = TempDir::new().unwrap();
        let (v, c) = write_spam_ham(&dir);
        let narrow = vectorizer::tests::artifact(&["free", "money"]);
        std::fs::write(&v, serde_json::to_vec(&narrow).unwrap()).unwrap();
        let err = ModelStore::load(&v, &c).unwrap_err();
        assert!(matches!(
            err,
            ModelLoadError::Incompatible {
                vectorizer: 2,
                classifier: 5
            }
        ));
    }
}
