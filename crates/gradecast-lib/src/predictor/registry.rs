//! Model registry
//!
//! Loads model collections from an artifact store and caches them for the
//! lifetime of the registry. Each artifact path is loaded at most once: the
//! first caller takes a per-path lock and decodes the artifact while
//! concurrent callers for the same path wait for it. Failed loads leave the
//! slot empty so a later request can retry.

use super::{Estimator, LinearEstimator, OnnxEstimator};
use crate::error::{ForecastError, Result};
use crate::observability::ForecastMetrics;
use dashmap::DashMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Opaque storage holding serialized model artifacts
pub trait ArtifactStore: Send + Sync {
    /// Read the full artifact at `path`.
    ///
    /// Must return [`ForecastError::ArtifactNotFound`] when nothing is stored
    /// at that location.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Artifacts stored as plain files
#[derive(Debug, Clone, Default)]
pub struct FsArtifactStore;

impl ArtifactStore for FsArtifactStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ForecastError::ArtifactNotFound {
                path: path.to_path_buf(),
            },
            _ => ForecastError::corrupt(path, e),
        })
    }
}

/// Artifacts held in memory, counting every read
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<PathBuf, Vec<u8>>>,
    reads: AtomicU64,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), bytes.into());
    }

    /// Number of reads served so far, including misses
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| ForecastError::ArtifactNotFound {
                path: path.to_path_buf(),
            })
    }
}

/// On-disk description of a model collection
#[derive(Debug, Deserialize)]
struct CollectionManifest {
    models: BTreeMap<String, EstimatorSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum EstimatorSpec {
    Linear {
        #[serde(default)]
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Onnx {
        /// Relative to the manifest's directory
        file: PathBuf,
        features: usize,
    },
}

/// Estimators of one model family, keyed by group
pub struct ModelCollection {
    path: PathBuf,
    checksum: String,
    estimators: BTreeMap<String, Arc<dyn Estimator>>,
}

impl ModelCollection {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA-256 of the manifest bytes, hex encoded
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Group keys in sorted order
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.estimators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty()
    }

    /// Look up the estimator of a group
    pub fn resolve(&self, group: &str) -> Result<Arc<dyn Estimator>> {
        self.estimators
            .get(group)
            .cloned()
            .ok_or_else(|| ForecastError::UnknownModelGroup {
                group: group.to_string(),
                path: self.path.clone(),
            })
    }
}

impl fmt::Debug for ModelCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCollection")
            .field("path", &self.path)
            .field("checksum", &self.checksum)
            .field("groups", &self.estimators.keys().collect::<Vec<_>>())
            .finish()
    }
}

type CacheSlot = Arc<Mutex<Option<Arc<ModelCollection>>>>;

/// Cached access to model collections
pub struct ModelRegistry {
    store: Arc<dyn ArtifactStore>,
    cache: DashMap<PathBuf, CacheSlot>,
    artifact_loads: AtomicU64,
    cache_hits: AtomicU64,
    metrics: ForecastMetrics,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            artifact_loads: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            metrics: ForecastMetrics::new(),
        }
    }

    /// Registry reading artifacts from the local filesystem
    pub fn with_fs_store() -> Self {
        Self::new(Arc::new(FsArtifactStore))
    }

    /// Load the collection at `path`, reading storage only on first use
    pub fn load_collection(&self, path: &Path) -> Result<Arc<ModelCollection>> {
        // Clone the slot out so the map shard is not locked during I/O
        let slot: CacheSlot = Arc::clone(&self.cache.entry(path.to_path_buf()).or_default());
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(collection) = cached.as_ref() {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            self.metrics.inc_cache_hits();
            debug!(path = %path.display(), "Model collection served from cache");
            return Ok(Arc::clone(collection));
        }

        self.artifact_loads.fetch_add(1, Ordering::Relaxed);
        self.metrics.inc_artifact_loads();

        let collection = match self.decode(path) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load model collection");
                return Err(e);
            }
        };

        info!(
            path = %path.display(),
            groups = collection.len(),
            checksum = %collection.checksum(),
            "Model collection loaded"
        );

        *cached = Some(Arc::clone(&collection));
        Ok(collection)
    }

    /// Look up a group in a loaded collection
    pub fn resolve(&self, collection: &ModelCollection, group: &str) -> Result<Arc<dyn Estimator>> {
        let estimator = collection.resolve(group)?;
        debug!(
            path = %collection.path().display(),
            group = %group,
            kind = estimator.kind(),
            "Resolved estimator"
        );
        Ok(estimator)
    }

    fn decode(&self, path: &Path) -> Result<ModelCollection> {
        let bytes = self.store.read(path)?;
        let checksum = compute_checksum(&bytes);

        let manifest: CollectionManifest =
            serde_json::from_slice(&bytes).map_err(|e| ForecastError::corrupt(path, e))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut estimators = BTreeMap::new();
        for (group, spec) in manifest.models {
            let estimator = self.build_estimator(path, base, &group, spec)?;
            estimators.insert(group, estimator);
        }

        Ok(ModelCollection {
            path: path.to_path_buf(),
            checksum,
            estimators,
        })
    }

    fn build_estimator(
        &self,
        manifest_path: &Path,
        base: &Path,
        group: &str,
        spec: EstimatorSpec,
    ) -> Result<Arc<dyn Estimator>> {
        match spec {
            EstimatorSpec::Linear {
                intercept,
                coefficients,
            } => {
                check_feature_count(manifest_path, group, coefficients.len())?;
                Ok(Arc::new(LinearEstimator::new(intercept, coefficients)))
            }
            EstimatorSpec::Onnx { file, features } => {
                check_feature_count(manifest_path, group, features)?;
                let graph_path = base.join(file);
                let bytes = self.store.read(&graph_path)?;
                let estimator = OnnxEstimator::from_bytes(&bytes, features)
                    .map_err(|e| ForecastError::corrupt(&graph_path, format!("{:#}", e)))?;
                Ok(Arc::new(estimator))
            }
        }
    }

    /// Registry counters
    pub fn stats(&self) -> RegistryStats {
        let cached_collections = self
            .cache
            .iter()
            .filter(|slot| {
                slot.value()
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count();

        RegistryStats {
            artifact_loads: self.artifact_loads.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cached_collections,
        }
    }
}

/// Models consume grade/credit pairs, so the input width is even and non-zero
fn check_feature_count(path: &Path, group: &str, count: usize) -> Result<()> {
    if count == 0 || count % 2 != 0 {
        return Err(ForecastError::corrupt(
            path,
            format!(
                "model '{}' takes {} features, expected a positive even count",
                group, count
            ),
        ));
    }
    Ok(())
}

/// Compute SHA256 checksum of data
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    /// Reads of collection manifests from the store
    pub artifact_loads: u64,
    pub cache_hits: u64,
    pub cached_collections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::features::build_vector;
    use crate::predictor::inference;
    use std::thread;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "models": {
            "GPA_TC_1": { "type": "linear", "intercept": 0.5, "coefficients": [0.8, 0.01] },
            "GPA_TC_1_2": { "type": "linear", "intercept": 0.2, "coefficients": [0.4, 0.0, 0.5, 0.0] }
        }
    }"#;

    fn memory_registry() -> (Arc<MemoryArtifactStore>, ModelRegistry) {
        let store = Arc::new(MemoryArtifactStore::new());
        store.insert("models/final_cpa_8_ki.json", MANIFEST);
        let registry = ModelRegistry::new(store.clone());
        (store, registry)
    }

    #[test]
    fn test_load_and_resolve() {
        let (_store, registry) = memory_registry();
        let collection = registry
            .load_collection(Path::new("models/final_cpa_8_ki.json"))
            .unwrap();

        assert_eq!(collection.groups().collect::<Vec<_>>(), vec!["GPA_TC_1", "GPA_TC_1_2"]);
        assert_eq!(collection.checksum().len(), 64);

        let estimator = registry.resolve(&collection, "GPA_TC_1").unwrap();
        assert_eq!(estimator.kind(), "linear");
        let value = estimator
            .predict(&build_vector(&[3.0], &[15.0]).unwrap())
            .unwrap();
        assert!((value - 3.05).abs() < 1e-9);
    }

    #[test]
    fn test_second_load_is_cached() {
        let (store, registry) = memory_registry();
        let path = Path::new("models/final_cpa_8_ki.json");

        let first = registry.load_collection(path).unwrap();
        let second = registry.load_collection(path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.reads(), 1);
        assert_eq!(
            registry.stats(),
            RegistryStats {
                artifact_loads: 1,
                cache_hits: 1,
                cached_collections: 1
            }
        );
    }

    #[test]
    fn test_concurrent_first_load_reads_once() {
        let (store, registry) = memory_registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry
                        .load_collection(Path::new("models/final_cpa_8_ki.json"))
                        .unwrap()
                })
            })
            .collect();

        let collections: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(store.reads(), 1);
        assert!(collections.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_missing_artifact() {
        let (store, registry) = memory_registry();
        let err = registry
            .load_collection(Path::new("models/next_gpa_8_ki.json"))
            .unwrap_err();
        assert!(matches!(err, ForecastError::ArtifactNotFound { .. }));

        // Failures are not cached
        let _ = registry.load_collection(Path::new("models/next_gpa_8_ki.json"));
        assert_eq!(store.reads(), 2);
        assert_eq!(registry.stats().cached_collections, 0);
    }

    #[test]
    fn test_unknown_group() {
        let (_store, registry) = memory_registry();
        let collection = registry
            .load_collection(Path::new("models/final_cpa_8_ki.json"))
            .unwrap();
        // Estimators are not Debug, so match instead of unwrap_err
        match registry.resolve(&collection, "GPA_TC_1_5") {
            Err(ForecastError::UnknownModelGroup { group, path }) => {
                assert_eq!(group, "GPA_TC_1_5");
                assert_eq!(path, PathBuf::from("models/final_cpa_8_ki.json"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("GPA_TC_1_5 is not in the collection"),
        }
    }

    #[test]
    fn test_malformed_manifest() {
        let store = Arc::new(MemoryArtifactStore::new());
        store.insert("bad.json", "{ not json");
        store.insert(
            "odd.json",
            r#"{ "models": { "GPA_2": { "type": "linear", "coefficients": [1.0, 2.0, 3.0] } } }"#,
        );
        let registry = ModelRegistry::new(store);

        let err = registry.load_collection(Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, ForecastError::ArtifactCorrupt { .. }));

        let err = registry.load_collection(Path::new("odd.json")).unwrap_err();
        assert!(err.to_string().contains("positive even count"));
    }

    #[test]
    fn test_onnx_graph_missing() {
        let store = Arc::new(MemoryArtifactStore::new());
        store.insert(
            "models/next_gpa_10_ki.json",
            r#"{ "models": { "GPA_2": { "type": "onnx", "file": "next/GPA_2.onnx", "features": 2 } } }"#,
        );
        let registry = ModelRegistry::new(store);

        let err = registry
            .load_collection(Path::new("models/next_gpa_10_ki.json"))
            .unwrap_err();
        match err {
            ForecastError::ArtifactNotFound { path } => {
                assert_eq!(path, PathBuf::from("models/next/GPA_2.onnx"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_onnx_graph_loaded_and_run() {
        let store = Arc::new(MemoryArtifactStore::new());
        store.insert(
            "models/next_gpa_8_ki.json",
            r#"{ "models": { "GPA_2": { "type": "onnx", "file": "next/GPA_2.onnx", "features": 2 } } }"#,
        );
        store.insert(
            "models/next/GPA_2.onnx",
            inference::fixtures::linear_graph(&[0.5, 0.01], 1.0),
        );
        let registry = ModelRegistry::new(store.clone());

        let collection = registry
            .load_collection(Path::new("models/next_gpa_8_ki.json"))
            .unwrap();
        let estimator = registry.resolve(&collection, "GPA_2").unwrap();
        assert_eq!(estimator.kind(), "onnx");

        let value = estimator
            .predict(&build_vector(&[3.5], &[15.0]).unwrap())
            .unwrap();
        assert!((value - 2.9).abs() < 1e-5, "got {}", value);
        // Manifest plus graph
        assert_eq!(store.reads(), 2);
    }

    #[test]
    fn test_onnx_graph_corrupt() {
        let store = Arc::new(MemoryArtifactStore::new());
        store.insert(
            "m/next.json",
            r#"{ "models": { "GPA_2": { "type": "onnx", "file": "g.onnx", "features": 2 } } }"#,
        );
        store.insert("m/g.onnx", b"garbage".to_vec());
        let registry = ModelRegistry::new(store);

        let err = registry.load_collection(Path::new("m/next.json")).unwrap_err();
        assert!(matches!(err, ForecastError::ArtifactCorrupt { .. }));
    }

    #[test]
    fn test_fs_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("final_cpa_8_ki.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let registry = ModelRegistry::with_fs_store();
        let collection = registry.load_collection(&path).unwrap();
        assert_eq!(collection.len(), 2);

        let missing = temp_dir.path().join("next_gpa_8_ki.json");
        assert!(matches!(
            registry.load_collection(&missing),
            Err(ForecastError::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"test model weights");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"test model weights"));
    }
}
