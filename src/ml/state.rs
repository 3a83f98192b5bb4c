// ============================================================
// Layer 5 — Named Parameter Maps
// ============================================================
// Flattens a network into a map of tensor name → values so it
// can be written to disk and read back into a network whose
// topology may have changed in the meantime.
//
// Names follow the field layout of the modules:
//
//   input_proj.weight          input_proj.bias
//   input_norm.gamma           input_norm.beta
//   input_norm.running_mean    input_norm.running_var
//   latent_proj.weight         ...
//
// Restoring is non-strict:
//   - a name the network has but the map lacks keeps its
//     current value (reported as "missing")
//   - a name the map has but the network lacks is ignored
//     (reported as "unexpected")
//   - a name both have with different shapes is an error
//
// Running statistics are not learnable, but they are part of
// the evaluate-mode behaviour, so they travel with the weights.
// They are read with `value_sync`, which folds in the updates
// made by train-mode forward passes.

use std::collections::{BTreeMap, BTreeSet};

use burn::{
    module::{Param, RunningState},
    nn::{BatchNorm, Linear},
    prelude::*,
    tensor::TensorData,
};
use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, Result};
use crate::ml::model::{Decoder, Encoder};

/// One stored tensor: its shape and row-major f32 values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTensor {
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

pub type StateDict = BTreeMap<String, StoredTensor>;

/// What a non-strict restore actually did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub restored:   Vec<String>,
    pub missing:    Vec<String>,
    pub unexpected: Vec<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Networks that can be flattened into / restored from a StateDict.
pub trait NamedParameters: Sized {
    fn state_dict(&self) -> Result<StateDict>;

    fn load_state_dict(self, dict: &StateDict) -> Result<(Self, LoadReport)>;
}

/// First tensor holding a NaN or infinite value, with that value.
pub fn first_non_finite(dict: &StateDict) -> Option<(&str, f32)> {
    dict.iter().find_map(|(name, tensor)| {
        tensor
            .values
            .iter()
            .find(|v| !v.is_finite())
            .map(|v| (name.as_str(), *v))
    })
}

// ─── Tensor conversion ────────────────────────────────────────────────────────

fn store<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<StoredTensor> {
    let shape = tensor.dims().to_vec();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| EmbedError::Tensor(format!("{e:?}")))?;
    Ok(StoredTensor { shape, values })
}

/// Restores `name` into `current` if the dict has it; otherwise
/// returns `current` untouched. Shape disagreement is fatal.
struct Restorer<'a> {
    dict:   &'a StateDict,
    seen:   BTreeSet<String>,
    report: LoadReport,
}

impl<'a> Restorer<'a> {
    fn new(dict: &'a StateDict) -> Self {
        Self { dict, seen: BTreeSet::new(), report: LoadReport::default() }
    }

    fn tensor<B: Backend, const D: usize>(&mut self, name: String, current: Tensor<B, D>) -> Result<Tensor<B, D>> {
        let Some(stored) = self.dict.get(&name) else {
            self.report.missing.push(name);
            return Ok(current);
        };

        let expected = current.dims().to_vec();
        if stored.shape != expected {
            return Err(EmbedError::config(format!(
                "checkpoint tensor '{name}' has shape {:?}, network expects {:?}",
                stored.shape, expected
            )));
        }

        let device = current.device();
        let data   = TensorData::new(stored.values.clone(), stored.shape.clone());
        self.seen.insert(name.clone());
        self.report.restored.push(name);
        Ok(Tensor::from_data(data, &device))
    }

    fn param<B: Backend, const D: usize>(&mut self, name: String, param: Param<Tensor<B, D>>) -> Result<Param<Tensor<B, D>>> {
        let restored = self.tensor(name.clone(), param.val())?;
        if self.seen.contains(&name) {
            Ok(Param::from_tensor(restored))
        } else {
            Ok(param)
        }
    }

    fn finish(mut self) -> LoadReport {
        self.report.unexpected = self
            .dict
            .keys()
            .filter(|k| !self.seen.contains(*k))
            .cloned()
            .collect();
        self.report
    }
}

// ─── Layer helpers ────────────────────────────────────────────────────────────

fn export_linear<B: Backend>(prefix: &str, layer: &Linear<B>, dict: &mut StateDict) -> Result<()> {
    dict.insert(format!("{prefix}.weight"), store(layer.weight.val())?);
    if let Some(bias) = &layer.bias {
        dict.insert(format!("{prefix}.bias"), store(bias.val())?);
    }
    Ok(())
}

fn import_linear<B: Backend>(prefix: &str, mut layer: Linear<B>, r: &mut Restorer) -> Result<Linear<B>> {
    layer.weight = r.param(format!("{prefix}.weight"), layer.weight)?;
    layer.bias = match layer.bias {
        Some(bias) => Some(r.param(format!("{prefix}.bias"), bias)?),
        None       => None,
    };
    Ok(layer)
}

fn export_norm<B: Backend>(prefix: &str, norm: &Option<BatchNorm<B, 0>>, dict: &mut StateDict) -> Result<()> {
    let Some(norm) = norm else { return Ok(()) };
    dict.insert(format!("{prefix}.gamma"), store(norm.gamma.val())?);
    dict.insert(format!("{prefix}.beta"), store(norm.beta.val())?);
    // value_sync: training updates sit in per-thread state until synced
    dict.insert(format!("{prefix}.running_mean"), store(norm.running_mean.value_sync())?);
    dict.insert(format!("{prefix}.running_var"), store(norm.running_var.value_sync())?);
    Ok(())
}

fn import_norm<B: Backend>(
    prefix: &str,
    norm:   Option<BatchNorm<B, 0>>,
    r:      &mut Restorer,
) -> Result<Option<BatchNorm<B, 0>>> {
    let Some(mut norm) = norm else { return Ok(None) };
    norm.gamma = r.param(format!("{prefix}.gamma"), norm.gamma)?;
    norm.beta  = r.param(format!("{prefix}.beta"), norm.beta)?;

    let mean = r.tensor(format!("{prefix}.running_mean"), norm.running_mean.value())?;
    norm.running_mean = RunningState::new(mean);
    let var = r.tensor(format!("{prefix}.running_var"), norm.running_var.value())?;
    norm.running_var = RunningState::new(var);
    Ok(Some(norm))
}

// ─── Networks ─────────────────────────────────────────────────────────────────

impl<B: Backend> NamedParameters for Encoder<B> {
    fn state_dict(&self) -> Result<StateDict> {
        let mut dict = StateDict::new();
        export_linear("input_proj", &self.input_proj, &mut dict)?;
        export_norm("input_norm", &self.input_norm, &mut dict)?;
        export_linear("latent_proj", &self.latent_proj, &mut dict)?;
        export_norm("latent_norm", &self.latent_norm, &mut dict)?;
        Ok(dict)
    }

    fn load_state_dict(mut self, dict: &StateDict) -> Result<(Self, LoadReport)> {
        let mut r = Restorer::new(dict);
        self.input_proj  = import_linear("input_proj", self.input_proj, &mut r)?;
        self.input_norm  = import_norm("input_norm", self.input_norm, &mut r)?;
        self.latent_proj = import_linear("latent_proj", self.latent_proj, &mut r)?;
        self.latent_norm = import_norm("latent_norm", self.latent_norm, &mut r)?;
        Ok((self, r.finish()))
    }
}

impl<B: Backend> NamedParameters for Decoder<B> {
    fn state_dict(&self) -> Result<StateDict> {
        let mut dict = StateDict::new();
        export_linear("hidden_proj", &self.hidden_proj, &mut dict)?;
        export_norm("hidden_norm", &self.hidden_norm, &mut dict)?;
        export_linear("output_proj", &self.output_proj, &mut dict)?;
        export_norm("output_norm", &self.output_norm, &mut dict)?;
        Ok(dict)
    }

    fn load_state_dict(mut self, dict: &StateDict) -> Result<(Self, LoadReport)> {
        let mut r = Restorer::new(dict);
        self.hidden_proj = import_linear("hidden_proj", self.hidden_proj, &mut r)?;
        self.hidden_norm = import_norm("hidden_norm", self.hidden_norm, &mut r)?;
        self.output_proj = import_linear("output_proj", self.output_proj, &mut r)?;
        self.output_norm = import_norm("output_norm", self.output_norm, &mut r)?;
        Ok((self, r.finish()))
    }
}
