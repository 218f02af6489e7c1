//! LIF neuron parameters, state and dynamics.
use serde::{Deserialize, Serialize};

use crate::adex::PA_PER_NF_TO_MV_PER_MS;
use crate::core::neuron::{check_finite, check_positive, step_in_ms, Neuron};
use crate::error::SNNError;

/// The constants of a LIF neuron.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LifParams {
    /// Membrane capacitance (nF).
    pub cm: f64,
    /// Resting potential (mV).
    pub v_rest: f64,
    /// Membrane time constant (ms).
    pub tau_m: f64,
    /// Firing threshold (mV).
    pub v_thresh: f64,
    /// Reset potential (mV).
    pub v_reset: f64,
    /// Background current (pA).
    pub i_background: f64,
    /// Potential at the peak of a spike (mV).
    pub spike_delta: f64,
}

impl Default for LifParams {
    fn default() -> Self {
        LifParams {
            cm: 0.281,
            v_rest: -70.6,
            tau_m: 9.3667,
            v_thresh: -50.4,
            v_reset: -70.6,
            i_background: 25.0,
            spike_delta: 20.0,
        }
    }
}

impl LifParams {
    pub fn validate(&self) -> Result<(), SNNError> {
        check_positive("cm", self.cm)?;
        check_positive("tau_m", self.tau_m)?;
        check_finite("v_rest", self.v_rest)?;
        check_finite("v_thresh", self.v_thresh)?;
        check_finite("v_reset", self.v_reset)?;
        check_finite("i_background", self.i_background)?;
        check_finite("spike_delta", self.spike_delta)?;
        if self.v_reset >= self.v_thresh || self.spike_delta <= self.v_thresh {
            return Err(SNNError::InvalidParameter(format!(
                "Expected v_reset < v_thresh < spike_delta, got {} / {} / {}",
                self.v_reset, self.v_thresh, self.spike_delta
            )));
        }
        Ok(())
    }
}

/// A leaky integrate-and-fire neuron.
/// It has no adaptation: the second state variable is always zero.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct LifNeuron {
    params: LifParams,
    v: f64,
    spiked: bool,
    #[serde(skip)]
    forced: bool,
}

impl<'de> Deserialize<'de> for LifNeuron {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct LifNeuronData {
            params: LifParams,
            v: f64,
            spiked: bool,
        }

        let data = LifNeuronData::deserialize(deserializer)?;
        data.params.validate().map_err(serde::de::Error::custom)?;
        Ok(LifNeuron {
            params: data.params,
            v: data.v,
            spiked: data.spiked,
            forced: false,
        })
    }
}

impl LifNeuron {
    /// Create a neuron at rest with the provided parameters.
    pub fn build(params: LifParams) -> Result<Self, SNNError> {
        params.validate()?;
        Ok(LifNeuron {
            v: params.v_rest,
            params,
            spiked: false,
            forced: false,
        })
    }

    pub fn params(&self) -> &LifParams {
        &self.params
    }
}

impl Default for LifNeuron {
    fn default() -> Self {
        let params = LifParams::default();
        LifNeuron {
            v: params.v_rest,
            params,
            spiked: false,
            forced: false,
        }
    }
}

impl Neuron for LifNeuron {
    fn update(&mut self, input: f64, dt: f64, _t: f64) -> Result<bool, SNNError> {
        let dt = step_in_ms(dt)?;
        if !input.is_finite() {
            return Err(SNNError::NumericalError(format!(
                "Non-finite synaptic input {}",
                input
            )));
        }
        let p = &self.params;

        let mut v = self.v + input;
        if self.spiked || self.forced {
            v = p.v_reset;
        }
        let dv = (p.v_rest - v) / p.tau_m + p.i_background / p.cm * PA_PER_NF_TO_MV_PER_MS;
        let v = v + dv * dt;
        if !v.is_finite() {
            return Err(SNNError::NumericalError(format!(
                "Non-finite potential after integration (v={})",
                v
            )));
        }

        self.forced = false;
        self.spiked = v > p.v_thresh;
        self.v = match self.spiked {
            true => p.spike_delta,
            false => v,
        };
        Ok(self.spiked)
    }

    fn reset(&mut self) {
        self.v = self.params.v_rest;
        self.spiked = false;
        self.forced = false;
    }

    fn get_state(&self) -> (f64, f64) {
        (self.v, 0.0)
    }

    fn force_spike(&mut self) {
        self.forced = true;
    }

    fn output(&self) -> f64 {
        match self.spiked {
            true => 1.0,
            false => 0.0,
        }
    }
}
