//! Module implementing the synapses joining the neurons of a network.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NetError;
use crate::neuron::NeuronId;

/// Handle of a synapse in its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SynapseId(usize);

impl SynapseId {
    pub fn new(index: usize) -> Self {
        SynapseId(index)
    }

    /// Returns the position of the synapse in its network.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// The destination of a synapse, which determines what firing does.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SynapseKind {
    /// Delivers its strength to a neuron.
    Primary { target: Option<NeuronId> },
    /// Adds its strength to the strength of a primary synapse.
    Secondary { target: Option<SynapseId> },
}

/// Represents a delayed, weighted synapse.
///
/// Unresolved references are kept as `None`; the network reports them when the synapse fires.
#[derive(Debug, PartialEq, Clone)]
pub struct Synapse {
    /// Optional name, unique among neurons and synapses
    name: Option<String>,
    /// Source neuron
    source: Option<NeuronId>,
    /// Propagation delay (non-negative)
    delay: f64,
    /// Strength, of any sign
    strength: f64,
    kind: SynapseKind,
}

impl Synapse {
    /// Create a new synapse with the specified parameters.
    /// Returns an error if the delay is negative or not finite.
    pub fn build(
        name: Option<String>,
        source: Option<NeuronId>,
        kind: SynapseKind,
        delay: f64,
        strength: f64,
    ) -> Result<Self, NetError> {
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(NetError::InvalidParameter(format!(
                "Synapse delay must be finite and non-negative, got {}",
                delay
            )));
        }

        Ok(Synapse::new(name, source, kind, delay, strength))
    }

    pub(crate) fn new(
        name: Option<String>,
        source: Option<NeuronId>,
        kind: SynapseKind,
        delay: f64,
        strength: f64,
    ) -> Self {
        Synapse {
            name,
            source,
            delay,
            strength,
            kind,
        }
    }

    /// Returns the name of the synapse, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the source neuron, if resolved.
    pub fn source(&self) -> Option<NeuronId> {
        self.source
    }

    /// Returns the delay of the synapse.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Returns the strength of the synapse.
    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn kind(&self) -> SynapseKind {
        self.kind
    }

    /// Returns true for a synapse delivering charge to a neuron.
    pub fn is_primary(&self) -> bool {
        matches!(self.kind, SynapseKind::Primary { .. })
    }

    /// Add `delta` to the strength of the synapse.
    /// There is no bound on the accumulated strength.
    pub fn strengthen(&mut self, delta: f64) {
        self.strength += delta;
    }
}
