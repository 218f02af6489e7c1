//! Adaptive exponential integrate-and-fire (AdEx) neurons.
//!
//! Units: potentials in mV, time in ms, capacitance in nF, currents in pA,
//! subthreshold adaptation `a` in nS and spike-triggered adaptation `b` in nA.
pub mod config;
pub mod neuron;

/// Conversion factor from a current in pA divided by a capacitance in nF to mV/ms.
pub const PA_PER_NF_TO_MV_PER_MS: f64 = 1e-3;
/// Number of pA in a nA.
pub const PA_PER_NA: f64 = 1e3;
