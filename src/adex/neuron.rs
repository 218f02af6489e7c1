//! AdEx neuron parameters, state and dynamics.
use serde::{Deserialize, Serialize};

use super::{PA_PER_NA, PA_PER_NF_TO_MV_PER_MS};
use crate::core::neuron::{check_finite, check_positive, step_in_ms, Neuron};
use crate::error::SNNError;

/// The biophysical constants of an AdEx neuron.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AdExParams {
    /// Subthreshold adaptation (nS).
    pub a: f64,
    /// Spike-triggered adaptation increment (nA).
    pub b: f64,
    /// Membrane capacitance (nF).
    pub cm: f64,
    /// Resting potential (mV).
    pub v_rest: f64,
    /// Membrane time constant (ms).
    pub tau_m: f64,
    /// Adaptation time constant (ms).
    pub tau_w: f64,
    /// Spike initiation threshold (mV).
    pub v_thresh: f64,
    /// Slope factor of the exponential term (mV).
    pub delta_t: f64,
    /// Reset potential (mV).
    pub v_reset: f64,
    /// Background current (pA).
    pub i_background: f64,
    /// Potential at the peak of a spike (mV).
    pub spike_delta: f64,
}

impl Default for AdExParams {
    fn default() -> Self {
        AdExParams {
            a: 4.0,
            b: 0.0805,
            cm: 0.281,
            v_rest: -70.6,
            tau_m: 9.3667,
            tau_w: 144.0,
            v_thresh: -50.4,
            delta_t: 2.0,
            v_reset: -70.6,
            i_background: 25.0,
            spike_delta: 20.0,
        }
    }
}

/// The dynamical state of an AdEx neuron.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct AdExState {
    /// Membrane potential (mV).
    pub v: f64,
    /// Adaptation current (pA).
    pub w: f64,
    /// Whether the neuron spiked at the last step, in which case it resets at the next one.
    pub spiked: bool,
}

impl AdExParams {
    /// Check that all parameters are finite, that time constants, capacitance and slope factor
    /// are positive, and that reset, threshold and spike peak are ordered.
    pub fn validate(&self) -> Result<(), SNNError> {
        check_positive("cm", self.cm)?;
        check_positive("tau_m", self.tau_m)?;
        check_positive("tau_w", self.tau_w)?;
        check_positive("delta_t", self.delta_t)?;
        check_finite("a", self.a)?;
        check_finite("b", self.b)?;
        check_finite("v_rest", self.v_rest)?;
        check_finite("v_thresh", self.v_thresh)?;
        check_finite("v_reset", self.v_reset)?;
        check_finite("i_background", self.i_background)?;
        check_finite("spike_delta", self.spike_delta)?;

        if self.v_reset >= self.v_thresh {
            return Err(SNNError::InvalidParameter(format!(
                "The reset potential ({}) must be below the threshold ({})",
                self.v_reset, self.v_thresh
            )));
        }
        if self.spike_delta <= self.v_thresh {
            return Err(SNNError::InvalidParameter(format!(
                "The spike peak ({}) must be above the threshold ({})",
                self.spike_delta, self.v_thresh
            )));
        }
        Ok(())
    }

    /// The state at construction: at rest, without adaptation and not spiking.
    pub fn initial_state(&self) -> AdExState {
        AdExState {
            v: self.v_rest,
            w: 0.0,
            spiked: false,
        }
    }

    /// Returns the state after one Euler step of `dt` seconds, and whether the neuron spiked.
    ///
    /// The synaptic input is added to the potential first. If the neuron spiked at the previous
    /// step (or `force_reset` is set), its potential is clamped to `v_reset` and its adaptation
    /// is increased by `b`.
    /// When the integrated potential exceeds `v_thresh`, the neuron spikes: its potential is set to
    /// `spike_delta` and the reset is carried by the returned state to the next step.
    pub fn integrate(
        &self,
        state: &AdExState,
        input: f64,
        dt: f64,
        _t: f64,
        force_reset: bool,
    ) -> Result<(bool, AdExState), SNNError> {
        let dt = step_in_ms(dt)?;
        if !input.is_finite() {
            return Err(SNNError::NumericalError(format!(
                "Non-finite synaptic input {}",
                input
            )));
        }

        let mut v = state.v + input;
        let mut w = state.w;
        if state.spiked || force_reset {
            v = self.v_reset;
            w += self.b * PA_PER_NA;
        }

        let dv = ((self.v_rest - v) + self.delta_t * ((v - self.v_thresh) / self.delta_t).exp())
            / self.tau_m
            + (self.i_background - w) / self.cm * PA_PER_NF_TO_MV_PER_MS;
        let dw = (self.a * (v - self.v_rest) - w) / self.tau_w;

        let v = v + dv * dt;
        let w = w + dw * dt;
        if !(v.is_finite() && w.is_finite()) {
            return Err(SNNError::NumericalError(format!(
                "Non-finite state after integration (v={}, w={})",
                v, w
            )));
        }

        match v > self.v_thresh {
            true => Ok((
                true,
                AdExState {
                    v: self.spike_delta,
                    w,
                    spiked: true,
                },
            )),
            false => Ok((false, AdExState { v, w, spiked: false })),
        }
    }
}

/// A spiking neuron following the AdEx dynamics.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct AdExNeuron {
    params: AdExParams,
    state: AdExState,
    #[serde(skip)]
    forced: bool,
}

impl<'de> Deserialize<'de> for AdExNeuron {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct AdExNeuronData {
            params: AdExParams,
            state: AdExState,
        }

        let data = AdExNeuronData::deserialize(deserializer)?;
        data.params.validate().map_err(serde::de::Error::custom)?;
        Ok(AdExNeuron {
            params: data.params,
            state: data.state,
            forced: false,
        })
    }
}

impl AdExNeuron {
    /// Create a neuron at rest with the provided parameters.
    /// The function returns an error if the parameters are invalid.
    pub fn build(params: AdExParams) -> Result<Self, SNNError> {
        params.validate()?;
        Ok(AdExNeuron {
            state: params.initial_state(),
            params,
            forced: false,
        })
    }

    /// Returns the neuron parameters.
    pub fn params(&self) -> &AdExParams {
        &self.params
    }

    /// Returns the full dynamical state.
    pub fn state(&self) -> &AdExState {
        &self.state
    }
}

impl Default for AdExNeuron {
    fn default() -> Self {
        let params = AdExParams::default();
        AdExNeuron {
            state: params.initial_state(),
            params,
            forced: false,
        }
    }
}

impl Neuron for AdExNeuron {
    fn update(&mut self, input: f64, dt: f64, t: f64) -> Result<bool, SNNError> {
        let (spiked, state) = self
            .params
            .integrate(&self.state, input, dt, t, self.forced)?;
        self.state = state;
        self.forced = false;
        Ok(spiked)
    }

    fn reset(&mut self) {
        self.state = self.params.initial_state();
        self.forced = false;
    }

    fn get_state(&self) -> (f64, f64) {
        (self.state.v, self.state.w)
    }

    fn force_spike(&mut self) {
        self.forced = true;
    }

    fn output(&self) -> f64 {
        match self.state.spiked {
            true => 1.0,
            false => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_params_validate() {
        assert_eq!(AdExParams::default().validate(), Ok(()));

        let params = AdExParams {
            tau_m: 0.0,
            ..AdExParams::default()
        };
        assert!(matches!(params.validate(), Err(SNNError::InvalidParameter(_))));

        let params = AdExParams {
            delta_t: -2.0,
            ..AdExParams::default()
        };
        assert!(matches!(params.validate(), Err(SNNError::InvalidParameter(_))));

        let params = AdExParams {
            a: f64::NAN,
            ..AdExParams::default()
        };
        assert!(matches!(params.validate(), Err(SNNError::InvalidParameter(_))));

        let params = AdExParams {
            v_reset: -40.0,
            ..AdExParams::default()
        };
        assert!(matches!(params.validate(), Err(SNNError::InvalidParameter(_))));

        let params = AdExParams {
            spike_delta: -60.0,
            ..AdExParams::default()
        };
        assert!(matches!(AdExNeuron::build(params), Err(SNNError::InvalidParameter(_))));
    }

    #[test]
    fn test_single_step_at_rest() {
        let mut neuron = AdExNeuron::default();
        let spiked = neuron.update(0.0, 0.001, 0.0).unwrap();
        let (v, w) = neuron.get_state();
        assert!(!spiked);
        assert!(v > -70.6);
        assert_relative_eq!(v, -70.51102325706569, epsilon = 1e-9);
        assert_eq!(w, 0.0);
        assert_eq!(neuron.output(), 0.0);
    }

    #[test]
    fn test_step_is_in_milliseconds() {
        let params = AdExParams::default();
        let state = AdExState {
            v: -65.0,
            w: 10.0,
            spiked: false,
        };

        // Hand-computed Euler step with an effective step of 1 ms.
        let exp_term = 2.0 * ((-65.0_f64 + 50.4) / 2.0).exp();
        let dv = (-70.6 + 65.0 + exp_term) / 9.3667 + (25.0 - 10.0) / 0.281 * 1e-3;
        let dw = (4.0 * (-65.0 + 70.6) - 10.0) / 144.0;

        let (spiked, next) = params.integrate(&state, 0.0, 0.001, 0.0, false).unwrap();
        assert!(!spiked);
        assert_relative_eq!(next.v, -65.0 + dv, epsilon = 1e-12);
        assert_relative_eq!(next.w, 10.0 + dw, epsilon = 1e-12);

        // Half the step, half the increment.
        let (_, half) = params.integrate(&state, 0.0, 0.0005, 0.0, false).unwrap();
        assert_relative_eq!(half.v, -65.0 + 0.5 * dv, epsilon = 1e-12);
        assert_relative_eq!(half.w, 10.0 + 0.5 * dw, epsilon = 1e-12);
    }

    #[test]
    fn test_integrate_is_pure() {
        let params = AdExParams::default();
        let state = params.initial_state();
        let first = params.integrate(&state, 3.0, 0.001, 0.0, false).unwrap();
        let second = params.integrate(&state, 3.0, 0.001, 0.5, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(state, params.initial_state());
    }

    #[test]
    fn test_spike_then_reset_next_step() {
        let params = AdExParams::default();
        let mut neuron = AdExNeuron::build(params.clone()).unwrap();

        // A strong input crosses the threshold within the step.
        assert!(neuron.update(40.0, 0.001, 0.0).unwrap());
        let (v, w_spike) = neuron.get_state();
        assert_eq!(v, params.spike_delta);
        assert_eq!(neuron.output(), 1.0);

        // The reset happens at the next step, with the adaptation increment.
        let state = *neuron.state();
        assert!(!neuron.update(0.0, 0.001, 0.001).unwrap());
        let (v, w) = neuron.get_state();
        let w_reset = w_spike + params.b * PA_PER_NA;
        let dv = (params.delta_t * ((params.v_reset - params.v_thresh) / params.delta_t).exp())
            / params.tau_m
            + (params.i_background - w_reset) / params.cm * 1e-3;
        assert_relative_eq!(v, params.v_reset + dv, epsilon = 1e-12);
        assert_relative_eq!(w, w_reset - w_reset / params.tau_w, epsilon = 1e-12);
        assert!(state.spiked);
        assert_eq!(neuron.output(), 0.0);
    }

    #[test]
    fn test_force_spike() {
        let mut forced = AdExNeuron::default();
        let mut free = AdExNeuron::default();
        forced.force_spike();

        forced.update(0.0, 0.001, 0.0).unwrap();
        free.update(0.0, 0.001, 0.0).unwrap();
        assert!(forced.get_state().1 > free.get_state().1);

        // The override only applies once.
        let w = forced.get_state().1;
        forced.update(0.0, 0.001, 0.001).unwrap();
        assert!(forced.get_state().1 < w);
    }

    #[test]
    fn test_reset() {
        let mut neuron = AdExNeuron::default();
        let initial = neuron.get_state();
        for step in 0..50 {
            let input = if step % 5 == 0 { 35.0 } else { 0.0 };
            neuron.update(input, 0.001, step as f64 * 0.001).unwrap();
        }
        assert_ne!(neuron.get_state(), initial);

        neuron.force_spike();
        neuron.reset();
        assert_eq!(neuron.get_state(), initial);
        assert_eq!(neuron.get_state(), (-70.6, 0.0));
        assert_eq!(neuron.output(), 0.0);
        assert_eq!(*neuron.state(), neuron.params().initial_state());
    }

    #[test]
    fn test_deterministic_construction() {
        let params = AdExParams {
            v_rest: -65.0,
            ..AdExParams::default()
        };
        assert_eq!(
            AdExNeuron::build(params.clone()).unwrap(),
            AdExNeuron::build(params).unwrap()
        );
    }

    #[test]
    fn test_deserialize_validates_params() {
        let neuron = AdExNeuron::default();
        let json = serde_json::to_string(&neuron).unwrap();
        assert_eq!(serde_json::from_str::<AdExNeuron>(&json).unwrap(), neuron);

        let mut json = serde_json::to_value(&neuron).unwrap();
        json["params"]["tau_m"] = serde_json::json!(0.0);
        assert!(serde_json::from_value::<AdExNeuron>(json).is_err());
    }

    #[test]
    fn test_numerical_error() {
        let mut neuron = AdExNeuron::default();
        // Far above threshold, the exponential term overflows.
        assert!(matches!(
            neuron.update(2000.0, 0.001, 0.0),
            Err(SNNError::NumericalError(_))
        ));

        let mut neuron = AdExNeuron::default();
        assert!(matches!(
            neuron.update(f64::NAN, 0.001, 0.0),
            Err(SNNError::NumericalError(_))
        ));
    }

    #[test]
    fn test_invalid_step() {
        let mut neuron = AdExNeuron::default();
        assert!(matches!(
            neuron.update(0.0, 0.0, 0.0),
            Err(SNNError::InvalidParameter(_))
        ));
        assert_eq!(neuron.get_state(), (-70.6, 0.0));
    }
}
