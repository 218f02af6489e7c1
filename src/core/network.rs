//! Networks of layers driven over time.
//!
//! Within a step, layers are evaluated in order: layer 0 receives the external input and
//! layer k receives the spikes layer k-1 emitted during the same step.
//! A recurrent layer additionally receives its own spikes of the previous step.
use log;

use crate::core::layer::Layer;
use crate::core::neuron::Neuron;
use crate::error::SNNError;

/// A feed-forward chain of layers, each of them possibly recurrent.
#[derive(Debug, Clone)]
pub struct Network<N: Neuron> {
    layers: Vec<Layer<N>>,
    num_steps: usize,
}

/// The result of one simulation step.
#[derive(Debug, PartialEq, Clone)]
pub struct StepOutput {
    /// Time at the start of the step (in seconds).
    pub t: f64,
    /// Spikes of the last layer.
    pub output: Vec<f64>,
    /// Spikes of every layer, when recorded.
    pub layers: Option<Vec<Vec<f64>>>,
}

impl<N: Neuron> Network<N> {
    /// Create a network chaining the provided layers.
    /// The function returns an error if the network is empty or if the input dimension of a layer
    /// differs from the number of neurons of the previous one.
    pub fn build(layers: Vec<Layer<N>>) -> Result<Self, SNNError> {
        if layers.is_empty() {
            return Err(SNNError::DimensionMismatch(
                "A network must contain at least one layer".to_string(),
            ));
        }

        for (k, pair) in layers.windows(2).enumerate() {
            if pair[1].input_dim() != pair[0].num_neurons() {
                return Err(SNNError::DimensionMismatch(format!(
                    "Layer {} expects {} inputs but layer {} has {} neurons",
                    k + 1,
                    pair[1].input_dim(),
                    k,
                    pair[0].num_neurons()
                )));
            }
        }

        log::info!(
            "New network with {} layers and {} neurons",
            layers.len(),
            layers.iter().map(|layer| layer.num_neurons()).sum::<usize>()
        );

        Ok(Network {
            layers,
            num_steps: 0,
        })
    }

    /// Advance every layer by one step and returns the spikes of the last layer.
    pub fn step(&mut self, input: &[f64], dt: f64, t: f64) -> Result<&[f64], SNNError> {
        self.layers[0].step(input, dt, t)?;
        for k in 1..self.layers.len() {
            let (upstream, downstream) = self.layers.split_at_mut(k);
            downstream[0].step(upstream[k - 1].output(), dt, t)?;
        }
        self.num_steps += 1;
        Ok(self.output())
    }

    /// Lazily simulate the network over a sequence of inputs, one per step of `dt` seconds.
    /// The simulation continues from the current state of the network;
    /// use [`Network::reset`] to restart it.
    pub fn simulate<I>(&mut self, inputs: I, dt: f64) -> Simulation<'_, N, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<[f64]>,
    {
        Simulation {
            network: self,
            inputs: inputs.into_iter(),
            dt,
            record_layers: false,
            failed: false,
        }
    }

    /// Same as [`Network::simulate`], also recording the spikes of every layer.
    pub fn simulate_recorded<I>(&mut self, inputs: I, dt: f64) -> Simulation<'_, N, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<[f64]>,
    {
        Simulation {
            network: self,
            inputs: inputs.into_iter(),
            dt,
            record_layers: true,
            failed: false,
        }
    }

    /// Simulate the network over all inputs and returns the spikes of the last layer at each step.
    pub fn run<I>(&mut self, inputs: I, dt: f64) -> Result<Vec<Vec<f64>>, SNNError>
    where
        I: IntoIterator,
        I::Item: AsRef<[f64]>,
    {
        self.simulate(inputs, dt)
            .map(|step| step.map(|step| step.output))
            .collect()
    }

    /// Reset every neuron of every layer and the step counter.
    pub fn reset(&mut self) {
        self.layers.iter_mut().for_each(|layer| layer.reset());
        self.num_steps = 0;
    }

    /// Returns the spikes of the last layer at the last step.
    pub fn output(&self) -> &[f64] {
        self.layers[self.layers.len() - 1].output()
    }

    /// Returns the expected length of the external input.
    pub fn input_dim(&self) -> usize {
        self.layers[0].input_dim()
    }

    /// Returns the number of neurons of the last layer.
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].num_neurons()
    }

    /// Returns a slice of the layers of the network.
    pub fn layers(&self) -> &[Layer<N>] {
        &self.layers
    }

    /// A mutable reference to a specific layer of the network.
    /// Returns `None` if the layer is not found.
    pub fn layer_mut(&mut self, layer_id: usize) -> Option<&mut Layer<N>> {
        self.layers.get_mut(layer_id)
    }

    /// Returns the number of steps since construction or the last reset.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }
}

/// A lazy simulation, producing the network output for each input.
/// After an error, the simulation stops.
pub struct Simulation<'a, N: Neuron, I> {
    network: &'a mut Network<N>,
    inputs: I,
    dt: f64,
    record_layers: bool,
    failed: bool,
}

impl<'a, N, I> Iterator for Simulation<'a, N, I>
where
    N: Neuron,
    I: Iterator,
    I::Item: AsRef<[f64]>,
{
    type Item = Result<StepOutput, SNNError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let input = self.inputs.next()?;
        let t = self.network.num_steps as f64 * self.dt;

        let output = match self.network.step(input.as_ref(), self.dt, t) {
            Ok(output) => output.to_vec(),
            Err(e) => {
                log::warn!("Simulation stopped at t={}: {}", t, e);
                self.failed = true;
                return Some(Err(e));
            }
        };

        let layers = match self.record_layers {
            true => Some(
                self.network
                    .layers
                    .iter()
                    .map(|layer| layer.output().to_vec())
                    .collect(),
            ),
            false => None,
        };

        Some(Ok(StepOutput { t, output, layers }))
    }
}
