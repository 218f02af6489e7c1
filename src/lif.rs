//! Leaky integrate-and-fire (LIF) neurons, sharing the units of the AdEx module.
pub mod neuron;
