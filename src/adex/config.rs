//! Configuration of AdEx layers, with parameters shared by all neurons or given per neuron.
use log;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::neuron::{AdExNeuron, AdExParams};
use crate::core::layer::{Layer, LayerOptions};
use crate::core::params::Param;
use crate::core::weights::Weights;
use crate::error::SNNError;

/// The parameters of a population of AdEx neurons.
/// Missing fields take the default AdEx values.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdExConfig {
    pub a: Param,
    pub b: Param,
    pub cm: Param,
    pub v_rest: Param,
    pub tau_m: Param,
    pub tau_w: Param,
    pub v_thresh: Param,
    #[serde(alias = "delta_T")]
    pub delta_t: Param,
    pub v_reset: Param,
    #[serde(alias = "I")]
    pub i_background: Param,
    pub spike_delta: Param,
}

impl Default for AdExConfig {
    fn default() -> Self {
        let params = AdExParams::default();
        AdExConfig {
            a: params.a.into(),
            b: params.b.into(),
            cm: params.cm.into(),
            v_rest: params.v_rest.into(),
            tau_m: params.tau_m.into(),
            tau_w: params.tau_w.into(),
            v_thresh: params.v_thresh.into(),
            delta_t: params.delta_t.into(),
            v_reset: params.v_reset.into(),
            i_background: params.i_background.into(),
            spike_delta: params.spike_delta.into(),
        }
    }
}

impl AdExConfig {
    /// Returns the parameters of each of the `num_neurons` neurons.
    /// Scalars are shared by all neurons, arrays must provide exactly one value per neuron.
    pub fn params(&self, num_neurons: usize) -> Result<Vec<AdExParams>, SNNError> {
        let a = self.a.broadcast("a", num_neurons)?;
        let b = self.b.broadcast("b", num_neurons)?;
        let cm = self.cm.broadcast("cm", num_neurons)?;
        let v_rest = self.v_rest.broadcast("v_rest", num_neurons)?;
        let tau_m = self.tau_m.broadcast("tau_m", num_neurons)?;
        let tau_w = self.tau_w.broadcast("tau_w", num_neurons)?;
        let v_thresh = self.v_thresh.broadcast("v_thresh", num_neurons)?;
        let delta_t = self.delta_t.broadcast("delta_t", num_neurons)?;
        let v_reset = self.v_reset.broadcast("v_reset", num_neurons)?;
        let i_background = self.i_background.broadcast("i_background", num_neurons)?;
        let spike_delta = self.spike_delta.broadcast("spike_delta", num_neurons)?;

        Ok((0..num_neurons)
            .map(|i| AdExParams {
                a: a[i],
                b: b[i],
                cm: cm[i],
                v_rest: v_rest[i],
                tau_m: tau_m[i],
                tau_w: tau_w[i],
                v_thresh: v_thresh[i],
                delta_t: delta_t[i],
                v_reset: v_reset[i],
                i_background: i_background[i],
                spike_delta: spike_delta[i],
            })
            .collect())
    }

    /// Create `num_neurons` neurons at rest.
    /// The function returns an error if an array has the wrong length or a parameter is invalid.
    pub fn build(&self, num_neurons: usize) -> Result<Vec<AdExNeuron>, SNNError> {
        self.params(num_neurons)?
            .into_iter()
            .enumerate()
            .map(|(i, params)| {
                AdExNeuron::build(params).map_err(|e| {
                    SNNError::InvalidParameter(format!("Neuron {}: {}", i, e))
                })
            })
            .collect()
    }

    /// Create a layer with one neuron per row of the weights.
    pub fn build_layer(
        &self,
        weights: Weights,
        options: LayerOptions,
    ) -> Result<Layer<AdExNeuron>, SNNError> {
        let neurons = self.build(weights.nrows())?;
        Layer::build(neurons, weights, options)
    }

    /// Save the configuration to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SNNError> {
        let file = File::create(path).map_err(|e| SNNError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| SNNError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| SNNError::IOError(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SNNError> {
        let path = path.as_ref();
        log::info!("Loading AdEx configuration from {}", path.display());
        let file = File::open(path).map_err(|e| SNNError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| SNNError::IOError(e.to_string()))
    }
}
