//! Core module defining the main components of the library.
//!
//! - [`neuron`]: the capability every neuron model implements
//! - [`params`]: scalar-or-array parameters broadcast over a layer
//! - [`weights`]: dense and block-sparse synaptic weight matrices
//! - [`layer`]: a batch of neurons behind a weight matrix
//! - [`network`]: layers chained together and driven over time
pub mod layer;
pub mod network;
pub mod neuron;
pub mod params;
pub mod weights;

/// Number of milliseconds in a second.
/// Callers provide `dt` in seconds, the models integrate in milliseconds.
pub const MS_PER_SECOND: f64 = 1000.0;
/// Minimum number of neurons in a layer to update them in parallel.
pub const MIN_PARALLEL_NEURONS: usize = 100;
