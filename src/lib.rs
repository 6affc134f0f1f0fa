//! This crate provides a discrete-event simulator for networks of leaky neurons in Rust.
//!
//! Neurons hold a potential that decays exponentially in logical time and fire when it
//! exceeds their threshold. They are joined by delayed synapses of two kinds: primary
//! synapses deliver charge to a neuron, secondary synapses adjust the strength of a
//! primary synapse each time they fire.
//!
//! # Describing Networks
//!
//! Networks are described by a small declaration language, one declaration per line.
//!
//! ```text
//! neuron X 1.0 2.0
//! neuron Y 1.0 0.0
//! synapse p1 X Y 1.0 0.6
//! output 1.0 10.0
//! ```
//!
//! # Simulating Networks
//!
//! ```rust
//! use rusty_neuronet::simulation::Simulation;
//!
//! let source = "neuron X 1.0 2.0\nneuron Y 1.0 0.0\nsynapse - X Y 1.0 0.6\n";
//! let mut simulation = Simulation::from_source(source, Vec::<u8>::new());
//! assert!(simulation.diagnostics().is_clean());
//!
//! simulation.run().unwrap();
//!
//! let y = simulation.network().find_neuron("Y").unwrap();
//! assert!((simulation.network().neuron(y).potential() - 0.6).abs() < 1e-12);
//! ```
//!
//! # Malformed Input
//!
//! Malformed declarations never abort the assembly: each bad field is replaced by a
//! sentinel value and reported as a warning. A network assembled with warnings is not
//! simulated; it is printed instead so that the problems can be inspected.

pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod network;
pub mod neuron;
pub mod output;
pub mod parser;
pub mod scheduler;
pub mod simulation;
pub mod synapse;

/// The value substituted for any malformed or illegal numeric field.
pub const SENTINEL: f64 = 99.99;
/// The token marking an anonymous synapse.
pub const ANONYMOUS: &str = "-";
/// The token printed in place of an unresolved neuron or synapse reference.
pub const UNRESOLVED: &str = "---";
