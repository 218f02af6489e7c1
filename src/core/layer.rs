//! Layers of neurons fed through a synaptic weight matrix.
use itertools::izip;
use log;
use rayon::prelude::*;

use crate::core::neuron::Neuron;
use crate::core::weights::Weights;
use crate::core::MIN_PARALLEL_NEURONS;
use crate::error::SNNError;

/// Optional features of a layer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LayerOptions {
    /// Square weights feeding the layer's output of the previous step back into its own input.
    pub recurrent: Option<Weights>,
}

impl LayerOptions {
    /// Options of a layer with self-recurrence through the provided weights.
    pub fn recurrent(weights: Weights) -> Self {
        LayerOptions {
            recurrent: Some(weights),
        }
    }
}

/// A collection of neurons sharing a weight matrix.
/// The synaptic input and output buffers are allocated once and overwritten at every step.
#[derive(Debug, Clone)]
pub struct Layer<N: Neuron> {
    neurons: Vec<N>,
    weights: Weights,
    recurrent: Option<Weights>,
    synaptic_input: Vec<f64>,
    output: Vec<f64>,
}

impl<N: Neuron> Layer<N> {
    /// Create a layer from its neurons, its input weights (one row per neuron) and options.
    /// The function returns an error if the shapes are inconsistent.
    pub fn build(
        neurons: Vec<N>,
        weights: Weights,
        options: LayerOptions,
    ) -> Result<Self, SNNError> {
        let num_neurons = neurons.len();
        if num_neurons == 0 {
            return Err(SNNError::DimensionMismatch(
                "A layer must contain at least one neuron".to_string(),
            ));
        }

        weights.validate()?;
        if weights.nrows() != num_neurons {
            return Err(SNNError::DimensionMismatch(format!(
                "The weights have {} rows for {} neurons",
                weights.nrows(),
                num_neurons
            )));
        }

        if let Some(recurrent) = &options.recurrent {
            recurrent.validate()?;
            if recurrent.shape() != (num_neurons, num_neurons) {
                return Err(SNNError::DimensionMismatch(format!(
                    "The recurrent weights are {}x{} for {} neurons",
                    recurrent.nrows(),
                    recurrent.ncols(),
                    num_neurons
                )));
            }
        }

        log::debug!(
            "New layer with {} neurons, {} inputs, recurrent: {}",
            num_neurons,
            weights.ncols(),
            options.recurrent.is_some()
        );

        Ok(Layer {
            neurons,
            weights,
            recurrent: options.recurrent,
            synaptic_input: vec![0.0; num_neurons],
            output: vec![0.0; num_neurons],
        })
    }

    /// Advance all neurons by one step given the layer input and returns their spikes (0 or 1).
    /// A recurrent layer also receives its own output of the previous step.
    pub fn step(&mut self, input: &[f64], dt: f64, t: f64) -> Result<&[f64], SNNError> {
        if input.len() != self.input_dim() {
            return Err(SNNError::DimensionMismatch(format!(
                "The layer expects {} inputs, got {}",
                self.input_dim(),
                input.len()
            )));
        }

        self.weights.mul_into(input, &mut self.synaptic_input);
        if let Some(recurrent) = &self.recurrent {
            // The output buffer still holds the spikes of the previous step.
            recurrent.mul_add_into(&self.output, &mut self.synaptic_input);
        }

        let result = if self.neurons.len() >= MIN_PARALLEL_NEURONS {
            self.neurons
                .par_iter_mut()
                .zip(self.synaptic_input.par_iter())
                .zip(self.output.par_iter_mut())
                .try_for_each(|((neuron, &input), out)| {
                    *out = spike_indicator(neuron.update(input, dt, t)?);
                    Ok::<(), SNNError>(())
                })
        } else {
            izip!(
                self.neurons.iter_mut(),
                self.synaptic_input.iter(),
                self.output.iter_mut()
            )
            .try_for_each(|(neuron, &input, out)| {
                *out = spike_indicator(neuron.update(input, dt, t)?);
                Ok::<(), SNNError>(())
            })
        };

        if let Err(e) = result {
            log::warn!("Layer step failed at t={}: {}", t, e);
            return Err(e);
        }

        Ok(&self.output)
    }

    /// Reset all neurons to their initial state and clear the buffers.
    pub fn reset(&mut self) {
        self.neurons.iter_mut().for_each(|neuron| neuron.reset());
        self.synaptic_input.fill(0.0);
        self.output.fill(0.0);
    }

    /// Returns the number of neurons in the layer.
    pub fn num_neurons(&self) -> usize {
        self.neurons.len()
    }

    /// Returns the expected length of the layer input.
    pub fn input_dim(&self) -> usize {
        self.weights.ncols()
    }

    /// Returns true if the layer feeds its output back into itself.
    pub fn is_recurrent(&self) -> bool {
        self.recurrent.is_some()
    }

    /// Returns the spikes of the last step.
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Returns the synaptic input received by each neuron at the last step.
    pub fn synaptic_input(&self) -> &[f64] {
        &self.synaptic_input
    }

    /// Returns the input weights.
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Returns the recurrent weights, if any.
    pub fn recurrent_weights(&self) -> Option<&Weights> {
        self.recurrent.as_ref()
    }

    /// Returns a slice of the neurons of the layer.
    pub fn neurons(&self) -> &[N] {
        &self.neurons
    }

    /// Returns the (v, w) state of a neuron, if it exists.
    pub fn get_state(&self, neuron_id: usize) -> Option<(f64, f64)> {
        self.neurons.get(neuron_id).map(|neuron| neuron.get_state())
    }

    /// Force a neuron to reset on the next step, as if it had just fired.
    pub fn force_spike(&mut self, neuron_id: usize) -> Result<(), SNNError> {
        match self.neurons.get_mut(neuron_id) {
            Some(neuron) => {
                neuron.force_spike();
                Ok(())
            }
            None => Err(SNNError::DimensionMismatch(format!(
                "Neuron {} not found in a layer of {} neurons",
                neuron_id,
                self.neurons.len()
            ))),
        }
    }
}

fn spike_indicator(spiked: bool) -> f64 {
    match spiked {
        true => 1.0,
        false => 0.0,
    }
}
