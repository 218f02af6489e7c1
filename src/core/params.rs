//! Parameters given either once for a whole layer or once per neuron.
use serde::{Deserialize, Serialize};

use crate::error::SNNError;

/// A neuron parameter, shared by all neurons of a layer or given individually.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    /// The same value for every neuron.
    Scalar(f64),
    /// One value per neuron.
    PerNeuron(Vec<f64>),
}

impl Param {
    /// Returns exactly `num_neurons` values.
    /// Scalars are replicated, arrays must have the right length.
    pub fn broadcast(&self, name: &str, num_neurons: usize) -> Result<Vec<f64>, SNNError> {
        match self {
            Param::Scalar(value) => Ok(vec![*value; num_neurons]),
            Param::PerNeuron(values) if values.len() == num_neurons => Ok(values.clone()),
            Param::PerNeuron(values) => Err(SNNError::DimensionMismatch(format!(
                "Parameter {} has {} values for {} neurons",
                name,
                values.len(),
                num_neurons
            ))),
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Scalar(value)
    }
}

impl From<Vec<f64>> for Param {
    fn from(values: Vec<f64>) -> Self {
        Param::PerNeuron(values)
    }
}
