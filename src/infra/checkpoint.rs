// ============================================================
// Layer 6 — Checkpoint Store
// ============================================================
// Saves and restores the encoder and decoder parameter maps.
//
// What gets saved per training run:
//   1. encoder_checkpoint.pt — encoder StateDict (bincode)
//   2. decoder_checkpoint.pt — decoder StateDict (bincode)
//   3. train_config.json     — the run configuration, so an
//                              inference-only process can rebuild
//                              the exact topology before loading
//
// File layout:
//   checkpoint/
//     encoder_checkpoint.pt
//     decoder_checkpoint.pt
//     train_config.json
//
// Writes go to a temporary sibling first and are renamed into
// place, so a crash never leaves a half-written checkpoint.
//
// Loading is non-strict (see ml::state). A missing file is an
// error carrying the path, never a silent fresh network.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            bincode documentation

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{EmbedError, Result};
use crate::ml::state::{LoadReport, NamedParameters, StateDict};

pub const DEFAULT_DIR: &str = "checkpoint";
pub const CONFIG_FILE: &str = "train_config.json";

/// Which half of the autoencoder a checkpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Encoder,
    Decoder,
}

impl Component {
    pub fn file_name(&self) -> &'static str {
        match self {
            Component::Encoder => "encoder_checkpoint.pt",
            Component::Decoder => "decoder_checkpoint.pt",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Encoder => f.write_str("encoder"),
            Component::Decoder => f.write_str("decoder"),
        }
    }
}

/// Manages checkpoint files inside one directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// The directory is created lazily on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, component: Component) -> PathBuf {
        self.dir.join(component.file_name())
    }

    // ─── Networks ─────────────────────────────────────────────────────────────

    pub fn save<M: NamedParameters>(&self, component: Component, network: &M) -> Result<PathBuf> {
        let path = self.path_for(component);
        save_state_dict(&network.state_dict()?, &path)?;
        tracing::debug!("Saved {} checkpoint to '{}'", component, path.display());
        Ok(path)
    }

    pub fn load<M: NamedParameters>(&self, component: Component, network: M) -> Result<(M, LoadReport)> {
        let path = self.path_for(component);
        let dict = load_state_dict(&path)?;
        let (network, report) = network.load_state_dict(&dict)?;

        if !report.missing.is_empty() {
            tracing::warn!(
                "{} checkpoint lacks {} tensor(s), keeping initial values: {:?}",
                component, report.missing.len(), report.missing
            );
        }
        if !report.unexpected.is_empty() {
            tracing::warn!(
                "{} checkpoint has {} unused tensor(s): {:?}",
                component, report.unexpected.len(), report.unexpected
            );
        }
        tracing::info!(
            "Restored {} tensor(s) into the {} from '{}'",
            report.restored.len(), component, path.display()
        );
        Ok((network, report))
    }

    // ─── Run configuration ────────────────────────────────────────────────────

    pub fn save_config<C: Serialize>(&self, cfg: &C) -> Result<PathBuf> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)
            .map_err(|e| EmbedError::Serialization(e.to_string()))?;
        write_atomic(&path, json.as_bytes())?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(path)
    }

    pub fn load_config<C: DeserializeOwned>(&self) -> Result<C> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).map_err(|e| EmbedError::io(&path, e))?;
        serde_json::from_str(&json)
            .map_err(|e| EmbedError::Serialization(format!("{}: {e}", path.display())))
    }
}

// ─── Raw StateDict files ──────────────────────────────────────────────────────

pub fn save_state_dict(dict: &StateDict, path: &Path) -> Result<()> {
    let bytes = bincode::serialize(dict).map_err(|e| EmbedError::Serialization(e.to_string()))?;
    write_atomic(path, &bytes)
}

pub fn load_state_dict(path: &Path) -> Result<StateDict> {
    let bytes = fs::read(path).map_err(|e| EmbedError::io(path, e))?;
    bincode::deserialize(&bytes)
        .map_err(|e| EmbedError::Serialization(format!("corrupt checkpoint '{}': {e}", path.display())))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EmbedError::io(parent, e))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| EmbedError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| EmbedError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{Encoder, EncoderConfig};
    use burn::backend::NdArray;
    use burn::prelude::*;
    use burn::tensor::TensorData;
    use serde::Deserialize;

    type TestBackend = NdArray;

    fn encoder(input: usize) -> Encoder<TestBackend> {
        EncoderConfig::new(input, 8, 3).init(&Default::default())
    }

    #[test]
    fn test_round_trip_gives_identical_outputs() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint"));
        let device = Default::default();

        let original = encoder(4);
        let path = store.save(Component::Encoder, &original).unwrap();
        assert!(path.ends_with("encoder_checkpoint.pt"));

        let (restored, report) = store.load(Component::Encoder, encoder(4)).unwrap();
        assert!(report.is_complete());

        let x = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.1f32, 0.7, 0.3, 0.9, 0.5, 0.2, 0.8, 0.4], [2, 4]),
            &device,
        );
        let before = original.forward(x.clone()).unwrap().into_data();
        let after  = restored.forward(x).unwrap().into_data();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let err = store.load(Component::Decoder, encoder(4)).unwrap_err();
        match err {
            EmbedError::Io { path, .. } => assert!(path.ends_with("decoder_checkpoint.pt")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        fs::write(store.path_for(Component::Encoder), b"not a checkpoint").unwrap();

        let err = store.load(Component::Encoder, encoder(4)).unwrap_err();
        assert!(matches!(err, EmbedError::Serialization(_)));
    }

    #[test]
    fn test_shape_change_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save(Component::Encoder, &encoder(4)).unwrap();

        let err = store.load(Component::Encoder, encoder(5)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Cfg {
            epochs: usize,
            name:   String,
        }

        let dir   = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let cfg = Cfg { epochs: 3, name: "run".into() };

        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config::<Cfg>().unwrap(), cfg);
    }
}
