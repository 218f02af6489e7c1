//! Module defining the capability shared by all neuron models.
use crate::core::MS_PER_SECOND;
use crate::error::SNNError;

/// A spiking neuron advanced in discrete time steps.
///
/// Implementors split their immutable parameters from their mutable state;
/// every piece of history the dynamics depend on (e.g., a pending reset) lives in that state.
pub trait Neuron: Send + Sync {
    /// Advance the neuron by one step of `dt` seconds, starting at time `t`,
    /// given the synaptic input increment.
    /// Returns whether the neuron spiked during the step.
    fn update(&mut self, input: f64, dt: f64, t: f64) -> Result<bool, SNNError>;

    /// Restore the state the neuron had right after construction.
    fn reset(&mut self);

    /// Returns the membrane potential and the adaptation variable.
    fn get_state(&self) -> (f64, f64);

    /// Force the neuron to behave on its next update as if it fired on the previous one.
    fn force_spike(&mut self);

    /// Returns the spike indicator (0 or 1) of the last update.
    fn output(&self) -> f64;
}

impl<N: Neuron + ?Sized> Neuron for Box<N> {
    fn update(&mut self, input: f64, dt: f64, t: f64) -> Result<bool, SNNError> {
        (**self).update(input, dt, t)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn get_state(&self) -> (f64, f64) {
        (**self).get_state()
    }

    fn force_spike(&mut self) {
        (**self).force_spike()
    }

    fn output(&self) -> f64 {
        (**self).output()
    }
}

/// Convert a step duration in seconds to milliseconds.
/// Returns an error if the duration is not positive and finite.
pub fn step_in_ms(dt: f64) -> Result<f64, SNNError> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(SNNError::InvalidParameter(format!(
            "The time step must be positive and finite, got {}",
            dt
        )));
    }
    Ok(dt * MS_PER_SECOND)
}

/// Check that a parameter is finite.
pub(crate) fn check_finite(name: &str, value: f64) -> Result<(), SNNError> {
    if !value.is_finite() {
        return Err(SNNError::InvalidParameter(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Check that a parameter is positive and finite, e.g., a time constant or a capacitance.
pub(crate) fn check_positive(name: &str, value: f64) -> Result<(), SNNError> {
    check_finite(name, value)?;
    if value <= 0.0 {
        return Err(SNNError::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}
