//! This crate provides tools for simulating layered spiking neural networks (SNNs) in Rust,
//! with adaptive exponential integrate-and-fire (AdEx) neurons integrated by Euler steps.
//!
//! Time steps are given in seconds; the neuron models integrate their dynamics in milliseconds.
//!
//! # Creating Layers
//!
//! ```rust
//! use adex_snn::adex::config::AdExConfig;
//! use adex_snn::core::layer::LayerOptions;
//! use adex_snn::core::params::Param;
//! use adex_snn::core::weights::Weights;
//!
//! // Three neurons with individual resting potentials, fed by the identity
//! let config = AdExConfig {
//!     v_rest: Param::PerNeuron(vec![-70.6, -68.0, -65.0]),
//!     ..AdExConfig::default()
//! };
//! let layer = config.build_layer(Weights::identity(3), LayerOptions::default()).unwrap();
//!
//! assert_eq!(layer.num_neurons(), 3);
//! assert_eq!(layer.get_state(2), Some((-65.0, 0.0)));
//! ```
//!
//! # Simulating Networks
//!
//! ```rust
//! use adex_snn::adex::config::AdExConfig;
//! use adex_snn::core::layer::LayerOptions;
//! use adex_snn::core::network::Network;
//! use adex_snn::core::weights::Weights;
//!
//! let config = AdExConfig::default();
//! let hidden = config
//!     .build_layer(Weights::rand(8, 2, (0.0, 1.0), 42).unwrap(), LayerOptions::default())
//!     .unwrap();
//! let output = config
//!     .build_layer(Weights::rand(1, 8, (0.0, 10.0), 7).unwrap(), LayerOptions::default())
//!     .unwrap();
//! let mut network = Network::build(vec![hidden, output]).unwrap();
//!
//! // One input vector per step of 1 ms
//! let inputs = vec![vec![10.0, 30.0]; 20];
//! let spikes = network.run(&inputs, 0.001).unwrap();
//!
//! assert_eq!(spikes.len(), 20);
//! assert!(spikes.iter().all(|step| step.len() == 1));
//! ```

pub mod adex;
pub mod core;
pub mod error;
pub mod lif;
