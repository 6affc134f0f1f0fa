//! This module provides the `Neuron` structure which composes the `Network` structure.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::synapse::SynapseId;

/// Handle of a neuron in its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NeuronId(usize);

impl NeuronId {
    pub fn new(index: usize) -> Self {
        NeuronId(index)
    }

    /// Returns the position of the neuron in its network.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Represents a leaky integrate-and-fire neuron.
///
/// The potential decays exponentially with unit time constant between two updates.
/// The neuron does not own its outgoing synapses; it only keeps their handles.
#[derive(Debug, PartialEq, Clone)]
pub struct Neuron {
    // The neuron name, unique among neurons and synapses of a network.
    name: String,
    // The firing threshold of the neuron.
    threshold: f64,
    // The potential at the time of the last update.
    potential: f64,
    // The time of the last update.
    time: f64,
    // The number of firings since the last read.
    fire_count: u32,
    // The outgoing synapses, in order of declaration.
    outputs: Vec<SynapseId>,
}

impl Neuron {
    /// Create a new neuron at rest at time zero.
    pub fn new(name: impl Into<String>, threshold: f64, potential: f64) -> Self {
        Neuron {
            name: name.into(),
            threshold,
            potential,
            time: 0.0,
            fire_count: 0,
            outputs: vec![],
        }
    }

    /// Returns the neuron name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the neuron firing threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the neuron potential at the time of its last update.
    pub fn potential(&self) -> f64 {
        self.potential
    }

    /// Returns the time of the last update.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns the number of firings since the last read, without resetting it.
    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }

    /// Returns the outgoing synapses of the neuron.
    pub fn outputs(&self) -> &[SynapseId] {
        &self.outputs
    }

    /// Returns true if the potential strictly exceeds the threshold.
    pub fn is_above_threshold(&self) -> bool {
        self.potential > self.threshold
    }

    pub(crate) fn add_output(&mut self, synapse_id: SynapseId) {
        self.outputs.push(synapse_id);
    }

    /// Decay the potential from the last update to `time`, then add `strength`.
    /// Returns true if the neuron must fire, i.e., the new potential strictly exceeds the threshold.
    ///
    /// Firing itself is left to the caller, which knows where to schedule the outgoing spikes
    /// (see [`crate::network::Network::kick`]).
    pub fn kick(&mut self, time: f64, strength: f64) -> bool {
        self.potential = self.potential * (self.time - time).exp() + strength;
        self.time = time;
        self.is_above_threshold()
    }

    /// Count one firing and reset the potential.
    /// The time of the last update is left untouched.
    pub fn fire(&mut self) {
        self.fire_count = self.fire_count.saturating_add(1);
        self.potential = 0.0;
    }

    /// Returns the number of firings since the last read and resets it.
    pub fn read_and_reset_fire_count(&mut self) -> u32 {
        std::mem::take(&mut self.fire_count)
    }
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "neuron {} {:?} {:?}",
            self.name, self.threshold, self.potential
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kick_without_elapsed_time() {
        let mut neuron = Neuron::new("A", 10.0, 0.25);
        assert!(!neuron.kick(0.0, 0.5));
        assert_eq!(neuron.potential(), 0.75);
        assert_eq!(neuron.time(), 0.0);
    }

    #[test]
    fn test_kick_decay() {
        let mut neuron = Neuron::new("A", 10.0, 2.0);
        neuron.kick(1.0, 0.0);
        assert!((neuron.potential() - 2.0 * (-1.0_f64).exp()).abs() < 1e-12);
        assert_eq!(neuron.time(), 1.0);

        neuron.kick(3.0, 1.0);
        let expected = 2.0 * (-3.0_f64).exp() + 1.0;
        assert!((neuron.potential() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_kick_threshold_is_strict() {
        let mut neuron = Neuron::new("A", 1.0, 0.0);
        assert!(!neuron.kick(0.0, 1.0));
        assert!(neuron.kick(0.0, 0.5));
    }

    #[test]
    fn test_fire_resets_potential() {
        let mut neuron = Neuron::new("A", 1.0, 5.0);
        neuron.kick(2.0, 0.0);
        neuron.fire();
        assert_eq!(neuron.potential(), 0.0);
        assert_eq!(neuron.fire_count(), 1);
        assert_eq!(neuron.time(), 2.0);

        neuron.fire();
        assert_eq!(neuron.fire_count(), 2);
    }

    #[test]
    fn test_read_and_reset_fire_count() {
        let mut neuron = Neuron::new("A", 1.0, 0.0);
        neuron.fire();
        neuron.fire();
        neuron.fire();
        assert_eq!(neuron.read_and_reset_fire_count(), 3);
        assert_eq!(neuron.read_and_reset_fire_count(), 0);
        assert_eq!(neuron.fire_count(), 0);
    }

    #[test]
    fn test_fire_count_saturates() {
        let mut neuron = Neuron::new("A", 1.0, 0.0);
        neuron.fire_count = u32::MAX - 1;
        neuron.fire();
        neuron.fire();
        assert_eq!(neuron.fire_count(), u32::MAX);
        assert_eq!(neuron.potential(), 0.0);
    }

    #[test]
    fn test_display() {
        let neuron = Neuron::new("A", 1.0, 0.5);
        assert_eq!(neuron.to_string(), "neuron A 1.0 0.5");
    }
}
